//! SQLite storage backend
//!
//! The relationship query runs as a single parameterised join between the
//! relationship table and the entity table. Table names carry an optional
//! prefix so the store can share a database with its host.

use crate::error::{StorageError, StorageResult};
use crate::migration::{Migratable, SchemaVersion};
use crate::traits::{EntityDirectory, StorageBackend};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kinship_core::limits::{sanitize_relationship, validate_relationship, MAX_QUERY_LIMIT};
use kinship_core::{
    AccessId, Direction, EdgeId, EdgeRecord, Entity, EntityType, Guid, OrderColumn, QueryContext,
    RelationshipQuery, Ulid,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct Tables {
    edges: String,
    entities: String,
    subtypes: String,
    schema: String,
}

impl Tables {
    fn new(prefix: &str) -> StorageResult<Self> {
        if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(StorageError::InvalidPrefix(prefix.to_string()));
        }
        Ok(Self {
            edges: format!("{}entity_relationships", prefix),
            entities: format!("{}entities", prefix),
            subtypes: format!("{}entity_subtypes", prefix),
            schema: format!("{}schema_version", prefix),
        })
    }
}

type EdgeRow = (i64, i64, String, i64, i64);
type EntityRow = (i64, String, String, Option<String>, i64, i64, i64);

fn read_edge_row(row: &Row<'_>) -> rusqlite::Result<EdgeRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn read_entity_row(row: &Row<'_>) -> rusqlite::Result<EntityRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn to_micros(time: &DateTime<Utc>) -> i64 {
    time.timestamp_micros()
}

fn from_micros(micros: i64) -> StorageResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros).ok_or_else(|| StorageError::invalid_timestamp(micros))
}

fn edge_from_row((id, guid_one, relationship, guid_two, time_created): EdgeRow) -> StorageResult<EdgeRecord> {
    Ok(EdgeRecord {
        id: Some(EdgeId(id)),
        guid_one: Guid(guid_one),
        relationship,
        guid_two: Guid(guid_two),
        time_created: from_micros(time_created)?,
        attributes: BTreeMap::new(),
    })
}

fn entity_from_row(
    (guid, uid, entity_type, subtype, owner_guid, access_id, time_created): EntityRow,
) -> StorageResult<Entity> {
    let uid = Ulid::from_string(&uid)
        .map_err(|e| StorageError::Database(format!("Invalid uid '{}': {}", uid, e)))?;
    Ok(Entity {
        guid: Guid(guid),
        uid,
        entity_type: EntityType::new(entity_type),
        subtype,
        owner_guid: Guid(owner_guid),
        access_id: AccessId(access_id),
        time_created: from_micros(time_created)?,
    })
}

/// SQLite reads a negative OFFSET as 0, so large counts saturate instead of wrapping
fn sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn order_column(column: OrderColumn) -> &'static str {
    match column {
        OrderColumn::TimeCreated => "e.time_created",
        OrderColumn::Guid => "e.guid",
        OrderColumn::Type => "e.type",
        OrderColumn::OwnerGuid => "e.owner_guid",
        OrderColumn::EdgeTimeCreated => "r.time_created",
        OrderColumn::EdgeId => "r.id",
    }
}

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    tables: Tables,
}

impl SqliteStorage {
    /// Open or create a SQLite database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_prefix(path, "")
    }

    /// Open a database whose tables are named `<prefix>entity_relationships` etc.
    pub fn open_with_prefix(path: impl AsRef<Path>, prefix: &str) -> StorageResult<Self> {
        let tables = Tables::new(prefix)?;
        let conn = Connection::open(path).map_err(|e| StorageError::Connection(e.to_string()))?;
        Self::with_connection(conn, tables)
    }

    /// Create an in-memory SQLite database (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        Self::in_memory_with_prefix("")
    }

    pub fn in_memory_with_prefix(prefix: &str) -> StorageResult<Self> {
        let tables = Tables::new(prefix)?;
        let conn = Connection::open_in_memory().map_err(|e| StorageError::Connection(e.to_string()))?;
        Self::with_connection(conn, tables)
    }

    fn with_connection(conn: Connection, tables: Tables) -> StorageResult<Self> {
        let storage = Self {
            conn: Mutex::new(conn),
            tables,
        };
        storage.migrate_to_latest()?;
        Ok(storage)
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(StorageError::lock)
    }

    fn entity_select(&self) -> String {
        format!(
            "SELECT e.guid, e.uid, e.type, s.subtype, e.owner_guid, e.access_id, e.time_created \
             FROM {} e LEFT JOIN {} s ON s.id = e.subtype",
            self.tables.entities, self.tables.subtypes
        )
    }

    fn query_entity(&self, clause: &str, value: Value) -> StorageResult<Option<Entity>> {
        let conn = self.conn()?;
        let sql = format!("{} WHERE {}", self.entity_select(), clause);
        let row = conn.query_row(&sql, [value], read_entity_row).optional()?;
        row.map(entity_from_row).transpose()
    }

    /// Build the relationship join and its bound values
    fn relationship_sql(&self, query: &RelationshipQuery, ctx: &QueryContext) -> (String, Vec<Value>) {
        let join_on = if query.inverse {
            "e.guid = r.guid_one"
        } else {
            "e.guid = r.guid_two"
        };

        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if !query.relationship.is_empty() {
            clauses.push("r.relationship = ?".into());
            values.push(Value::Text(query.relationship.clone()));
        }
        if let Some(guid) = query.relationship_guid {
            let anchor = if query.inverse { "r.guid_two = ?" } else { "r.guid_one = ?" };
            clauses.push(anchor.into());
            values.push(Value::Integer(guid.0));
        }
        if let Some(ref entity_type) = query.entity_type {
            clauses.push("e.type = ?".into());
            values.push(Value::Text(entity_type.clone()));
        }
        if let Some(ref subtype) = query.subtype {
            match query.entity_type {
                Some(ref entity_type) => {
                    clauses.push(format!(
                        "e.subtype IN (SELECT id FROM {} WHERE subtype = ? AND type = ?)",
                        self.tables.subtypes
                    ));
                    values.push(Value::Text(subtype.clone()));
                    values.push(Value::Text(entity_type.clone()));
                }
                None => {
                    clauses.push(format!(
                        "e.subtype IN (SELECT id FROM {} WHERE subtype = ?)",
                        self.tables.subtypes
                    ));
                    values.push(Value::Text(subtype.clone()));
                }
            }
        }
        if let Some(owner) = query.owner_guid {
            clauses.push("e.owner_guid = ?".into());
            values.push(Value::Integer(owner.0));
        }

        // Visibility
        let mut access: Vec<String> = Vec::new();
        if !ctx.visibility.is_empty() {
            let marks = vec!["?"; ctx.visibility.len()].join(", ");
            access.push(format!("e.access_id IN ({})", marks));
            values.extend(ctx.visibility.iter().map(|a| Value::Integer(a.0)));
        }
        if ctx.identity.is_set() {
            access.push("(e.access_id = ? AND e.owner_guid = ?)".into());
            values.push(Value::Integer(AccessId::UNRESTRICTED.0));
            values.push(Value::Integer(ctx.identity.0));
        }
        if access.is_empty() {
            clauses.push("0".into());
        } else {
            clauses.push(format!("({})", access.join(" OR ")));
        }

        let direction = query.order_by.direction.as_str();
        let sql = format!(
            "SELECT e.guid, e.uid, e.type, s.subtype, e.owner_guid, e.access_id, e.time_created \
             FROM {entities} e \
             JOIN {edges} r ON {join_on} \
             LEFT JOIN {subtypes} s ON s.id = e.subtype \
             WHERE {filter} \
             ORDER BY {column} {direction}, e.guid {direction}, r.id {direction} \
             LIMIT ? OFFSET ?",
            entities = self.tables.entities,
            edges = self.tables.edges,
            subtypes = self.tables.subtypes,
            join_on = join_on,
            filter = clauses.join(" AND "),
            column = order_column(query.order_by.column),
            direction = direction,
        );
        values.push(Value::Integer(sql_count(query.limit.min(MAX_QUERY_LIMIT))));
        values.push(Value::Integer(sql_count(query.offset)));

        (sql, values)
    }
}

impl Migratable for SqliteStorage {
    fn get_schema_version(&self) -> StorageResult<u32> {
        let conn = self.conn()?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (version INTEGER NOT NULL)",
            self.tables.schema
        ))?;
        let version: Option<i64> = conn.query_row(
            &format!("SELECT MAX(version) FROM {}", self.tables.schema),
            [],
            |row| row.get(0),
        )?;
        Ok(version.unwrap_or(0) as u32)
    }

    fn set_schema_version(&self, version: u32) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT INTO {} (version) VALUES (?1)", self.tables.schema),
            params![version as i64],
        )?;
        Ok(())
    }

    fn apply_migration(&self, step: &SchemaVersion) -> StorageResult<()> {
        let t = &self.tables;
        let sql = match step.version {
            1 => format!(
                r#"
                CREATE TABLE IF NOT EXISTS {edges} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    guid_one INTEGER NOT NULL,
                    relationship TEXT NOT NULL,
                    guid_two INTEGER NOT NULL,
                    time_created INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS {subtypes} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    type TEXT NOT NULL,
                    subtype TEXT NOT NULL,
                    UNIQUE (type, subtype)
                );

                CREATE TABLE IF NOT EXISTS {entities} (
                    guid INTEGER PRIMARY KEY,
                    uid TEXT NOT NULL UNIQUE,
                    type TEXT NOT NULL,
                    subtype INTEGER NOT NULL DEFAULT 0,
                    owner_guid INTEGER NOT NULL DEFAULT 0,
                    access_id INTEGER NOT NULL DEFAULT 0,
                    time_created INTEGER NOT NULL
                );
                "#,
                edges = t.edges,
                subtypes = t.subtypes,
                entities = t.entities,
            ),
            2 => format!(
                r#"
                CREATE INDEX IF NOT EXISTS idx_{edges}_one ON {edges}(guid_one, relationship);
                CREATE INDEX IF NOT EXISTS idx_{edges}_two ON {edges}(guid_two, relationship);
                CREATE INDEX IF NOT EXISTS idx_{entities}_type ON {entities}(type, subtype);
                "#,
                edges = t.edges,
                entities = t.entities,
            ),
            other => {
                return Err(StorageError::Migration(format!("Unknown schema version {}", other)));
            }
        };

        let conn = self.conn()?;
        conn.execute_batch(&sql)
            .map_err(|e| StorageError::Migration(format!("v{}: {}", step.version, e)))?;
        Ok(())
    }
}

#[async_trait]
impl EntityDirectory for SqliteStorage {
    async fn get_entity(&self, guid: Guid) -> StorageResult<Option<Entity>> {
        self.query_entity("e.guid = ?1", Value::Integer(guid.0))
    }

    async fn get_entity_by_uid(&self, uid: &Ulid) -> StorageResult<Option<Entity>> {
        self.query_entity("e.uid = ?1", Value::Text(uid.to_string()))
    }
}

#[async_trait]
impl StorageBackend for SqliteStorage {
    async fn initialize(&self) -> StorageResult<()> {
        self.migrate_to_latest()
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        let conn = self.conn()?;
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
        Ok(one == 1)
    }

    async fn get_edge(&self, id: EdgeId) -> StorageResult<Option<EdgeRecord>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT id, guid_one, relationship, guid_two, time_created FROM {} WHERE id = ?1",
                    self.tables.edges
                ),
                params![id.0],
                read_edge_row,
            )
            .optional()?;
        row.map(edge_from_row).transpose()
    }

    async fn add_edge(&self, guid_one: Guid, relationship: &str, guid_two: Guid) -> StorageResult<EdgeId> {
        let relationship = validate_relationship(relationship)?;
        let conn = self.conn()?;

        conn.execute(
            &format!(
                "INSERT INTO {} (guid_one, relationship, guid_two, time_created) VALUES (?1, ?2, ?3, ?4)",
                self.tables.edges
            ),
            params![guid_one.0, relationship, guid_two.0, to_micros(&Utc::now())],
        )?;

        let id = EdgeId(conn.last_insert_rowid());
        tracing::debug!("Added edge {}: {} -[{}]-> {}", id, guid_one, relationship, guid_two);
        Ok(id)
    }

    async fn edge_exists(&self, guid_one: Guid, relationship: &str, guid_two: Guid) -> StorageResult<bool> {
        let relationship = sanitize_relationship(relationship);
        let conn = self.conn()?;

        let found = conn
            .query_row(
                &format!(
                    "SELECT 1 FROM {} WHERE guid_one = ?1 AND relationship = ?2 AND guid_two = ?3 LIMIT 1",
                    self.tables.edges
                ),
                params![guid_one.0, relationship, guid_two.0],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        Ok(found.is_some())
    }

    async fn remove_edge(&self, guid_one: Guid, relationship: &str, guid_two: Guid) -> StorageResult<bool> {
        let relationship = sanitize_relationship(relationship);
        let conn = self.conn()?;

        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE guid_one = ?1 AND relationship = ?2 AND guid_two = ?3",
                self.tables.edges
            ),
            params![guid_one.0, relationship, guid_two.0],
        )?;

        tracing::debug!("Removed {} edge(s): {} -[{}]-> {}", removed, guid_one, relationship, guid_two);
        Ok(removed > 0)
    }

    async fn delete_edge_by_id(&self, id: EdgeId) -> StorageResult<Option<EdgeRecord>> {
        let conn = self.conn()?;

        let row = conn
            .query_row(
                &format!(
                    "SELECT id, guid_one, relationship, guid_two, time_created FROM {} WHERE id = ?1",
                    self.tables.edges
                ),
                params![id.0],
                read_edge_row,
            )
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        conn.execute(&format!("DELETE FROM {} WHERE id = ?1", self.tables.edges), params![id.0])?;
        edge_from_row(row).map(Some)
    }

    async fn save_edge(&self, record: &mut EdgeRecord) -> StorageResult<EdgeId> {
        let relationship = validate_relationship(&record.relationship)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        if let Some(old) = record.id.filter(EdgeId::is_persisted) {
            let removed = tx.execute(&format!("DELETE FROM {} WHERE id = ?1", self.tables.edges), params![old.0])?;
            if removed == 0 {
                tracing::debug!("No existing row for edge {}, inserting fresh", old);
            }
        }

        tx.execute(
            &format!(
                "INSERT INTO {} (guid_one, relationship, guid_two, time_created) VALUES (?1, ?2, ?3, ?4)",
                self.tables.edges
            ),
            params![
                record.guid_one.0,
                relationship,
                record.guid_two.0,
                to_micros(&record.time_created)
            ],
        )
        .map_err(|e| StorageError::SaveFailed(e.to_string()))?;

        let id = EdgeId(tx.last_insert_rowid());
        tx.commit().map_err(|e| StorageError::SaveFailed(e.to_string()))?;

        record.id = Some(id);
        record.relationship = relationship;
        tracing::debug!("Saved edge {}: {}", id, record);
        Ok(id)
    }

    async fn get_edges(&self, guid: Guid, direction: Direction) -> StorageResult<Vec<EdgeRecord>> {
        let filter = match direction {
            Direction::Outgoing => "guid_one = ?1",
            Direction::Incoming => "guid_two = ?1",
            Direction::Both => "(guid_one = ?1 OR guid_two = ?1)",
        };
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT id, guid_one, relationship, guid_two, time_created FROM {} WHERE {} ORDER BY id",
            self.tables.edges, filter
        ))?;

        let rows = stmt.query_map(params![guid.0], read_edge_row)?;

        let mut edges = Vec::new();
        for row in rows {
            edges.push(edge_from_row(row?)?);
        }

        Ok(edges)
    }

    async fn save_entity(&self, entity: &Entity) -> StorageResult<()> {
        let uid = entity.uid.to_string();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let bound: Option<i64> = tx
            .query_row(
                &format!("SELECT guid FROM {} WHERE uid = ?1", self.tables.entities),
                params![uid],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(other) = bound.filter(|g| *g != entity.guid.0) {
            return Err(StorageError::uid_conflict(entity, other));
        }

        let subtype_id: i64 = match entity.subtype {
            Some(ref subtype) => {
                tx.execute(
                    &format!("INSERT OR IGNORE INTO {} (type, subtype) VALUES (?1, ?2)", self.tables.subtypes),
                    params![entity.entity_type.as_str(), subtype],
                )?;
                tx.query_row(
                    &format!("SELECT id FROM {} WHERE type = ?1 AND subtype = ?2", self.tables.subtypes),
                    params![entity.entity_type.as_str(), subtype],
                    |row| row.get(0),
                )?
            }
            None => 0,
        };

        tx.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (guid, uid, type, subtype, owner_guid, access_id, time_created) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                self.tables.entities
            ),
            params![
                entity.guid.0,
                uid,
                entity.entity_type.as_str(),
                subtype_id,
                entity.owner_guid.0,
                entity.access_id.0,
                to_micros(&entity.time_created)
            ],
        )?;
        tx.commit()?;

        Ok(())
    }

    async fn find_entities_by_relationship(
        &self,
        query: &RelationshipQuery,
        ctx: &QueryContext,
    ) -> StorageResult<Vec<Entity>> {
        let (sql, values) = self.relationship_sql(query, ctx);
        tracing::debug!("Relationship query: {}", sql);

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), read_entity_row)?;

        let mut entities = Vec::new();
        for row in rows {
            entities.push(entity_from_row(row?)?);
        }

        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinship_core::OrderBy;

    #[tokio::test]
    async fn test_sqlite_edges() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.initialize().await.unwrap();

        let id = storage.add_edge(Guid(1), "friend", Guid(2)).await.unwrap();
        let edge = storage.get_edge(id).await.unwrap().unwrap();
        assert_eq!(edge.triple(), (Guid(1), "friend", Guid(2)));

        assert!(storage.edge_exists(Guid(1), "friend", Guid(2)).await.unwrap());
        assert!(!storage.edge_exists(Guid(2), "friend", Guid(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_table_prefix() {
        let storage = SqliteStorage::in_memory_with_prefix("app_").unwrap();
        storage.add_edge(Guid(1), "owns", Guid(2)).await.unwrap();

        let conn = storage.conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM app_entity_relationships", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        let result = SqliteStorage::in_memory_with_prefix("x; DROP TABLE y; --");
        assert!(matches!(result, Err(StorageError::InvalidPrefix(_))));
    }

    #[test]
    fn test_schema_version() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert_eq!(storage.get_schema_version().unwrap(), crate::CURRENT_VERSION);

        // Re-running is a no-op
        storage.migrate_to_latest().unwrap();
        assert_eq!(storage.get_schema_version().unwrap(), crate::CURRENT_VERSION);
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.set_schema_version(crate::CURRENT_VERSION + 1).unwrap();

        assert!(matches!(storage.migrate_to_latest(), Err(StorageError::Migration(_))));
    }

    #[tokio::test]
    async fn test_subtype_resolution() {
        let storage = SqliteStorage::in_memory().unwrap();
        let ctx = QueryContext::new(Guid(1)).with_access(AccessId(2));

        storage
            .save_entity(&Entity::new(Guid(10), "group").with_subtype("club").with_access(AccessId(2)))
            .await
            .unwrap();
        storage
            .save_entity(&Entity::new(Guid(11), "group").with_subtype("team").with_access(AccessId(2)))
            .await
            .unwrap();
        storage.add_edge(Guid(1), "member_of", Guid(10)).await.unwrap();
        storage.add_edge(Guid(1), "member_of", Guid(11)).await.unwrap();

        let query = RelationshipQuery::new("member_of", Guid(1))
            .with_type("group")
            .with_subtype("club");
        let found = storage.find_entities_by_relationship(&query, &ctx).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].guid, Guid(10));
        assert_eq!(found[0].subtype.as_deref(), Some("club"));

        let unknown = RelationshipQuery::new("member_of", Guid(1)).with_subtype("guild");
        assert!(storage.find_entities_by_relationship(&unknown, &ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entity_lookup_by_uid() {
        let storage = SqliteStorage::in_memory().unwrap();
        let entity = Entity::new(Guid(5), "user").with_owner(Guid(5));
        storage.save_entity(&entity).await.unwrap();

        let found = storage.get_entity_by_uid(&entity.uid).await.unwrap().unwrap();
        assert_eq!(found.guid, Guid(5));
        assert_eq!(storage.guid_to_uid(Guid(5)).await.unwrap(), Some(entity.uid));
        assert!(storage.get_entity(Guid(6)).await.unwrap().is_none());
    }

    #[test]
    fn test_order_by_is_bound_to_known_columns() {
        let storage = SqliteStorage::in_memory().unwrap();
        let query = RelationshipQuery::new("friend", Guid(1)).order_by(OrderBy::asc(OrderColumn::EdgeId));
        let (sql, values) = storage.relationship_sql(&query, &QueryContext::default());

        assert!(sql.contains("ORDER BY r.id asc, e.guid asc, r.id asc"));
        assert!(sql.contains("AND 0"));
        assert_eq!(sql.matches('?').count(), values.len());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kinship.db");

        let id = {
            let storage = SqliteStorage::open(&path).unwrap();
            storage.add_edge(Guid(3), "follows", Guid(4)).await.unwrap()
        };

        let storage = SqliteStorage::open(&path).unwrap();
        let edge = storage.get_edge(id).await.unwrap().unwrap();
        assert_eq!(edge.relationship, "follows");
    }
}
