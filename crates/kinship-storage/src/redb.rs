//! ReDB storage backend

use crate::error::{StorageError, StorageResult};
use crate::traits::{EntityDirectory, StorageBackend};
use ::redb::{Database, ReadableTable, TableDefinition};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kinship_core::limits::{sanitize_relationship, validate_relationship};
use kinship_core::{
    Direction, EdgeId, EdgeRecord, Entity, Guid, QueryContext, RelationshipQuery, Ulid,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

// Table definitions
const EDGES: TableDefinition<i64, &[u8]> = TableDefinition::new("entity_relationships");
const ENTITIES: TableDefinition<i64, &[u8]> = TableDefinition::new("entities");
const ENTITY_UIDS: TableDefinition<&str, i64> = TableDefinition::new("entity_uids");
const META: TableDefinition<&str, i64> = TableDefinition::new("meta");

const LAST_EDGE_ID: &str = "last_edge_id";

/// Persisted edge columns; the id is the table key
#[derive(Serialize, Deserialize)]
struct EdgeRow {
    guid_one: Guid,
    relationship: String,
    guid_two: Guid,
    time_created: DateTime<Utc>,
}

impl EdgeRow {
    fn into_record(self, id: i64) -> EdgeRecord {
        EdgeRecord {
            id: Some(EdgeId(id)),
            guid_one: self.guid_one,
            relationship: self.relationship,
            guid_two: self.guid_two,
            time_created: self.time_created,
            attributes: BTreeMap::new(),
        }
    }
}

fn decode_edge(id: i64, bytes: &[u8]) -> StorageResult<EdgeRecord> {
    let row: EdgeRow = serde_json::from_slice(bytes)?;
    Ok(row.into_record(id))
}

/// ReDB storage backend
pub struct RedbStorage {
    db: Mutex<Database>,
}

impl RedbStorage {
    /// Open or create a ReDB database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path).map_err(|e| StorageError::Database(e.to_string()))?;

        // Initialize tables
        {
            let write_txn = db.begin_write()?;
            {
                write_txn.open_table(EDGES)?;
                write_txn.open_table(ENTITIES)?;
                write_txn.open_table(ENTITY_UIDS)?;
                write_txn.open_table(META)?;
            }
            write_txn.commit()?;
        }

        Ok(Self { db: Mutex::new(db) })
    }

    /// Insert a row under the next id inside an open write transaction
    fn insert_edge(
        write_txn: &::redb::WriteTransaction,
        guid_one: Guid,
        relationship: String,
        guid_two: Guid,
        time_created: DateTime<Utc>,
    ) -> StorageResult<EdgeId> {
        let id = {
            let mut meta = write_txn.open_table(META)?;
            let next = meta.get(LAST_EDGE_ID)?.map(|g| g.value()).unwrap_or(0) + 1;
            meta.insert(LAST_EDGE_ID, next)?;
            next
        };

        let row = EdgeRow {
            guid_one,
            relationship,
            guid_two,
            time_created,
        };
        let value = serde_json::to_vec(&row)?;

        let mut table = write_txn.open_table(EDGES)?;
        table.insert(id, value.as_slice())?;
        Ok(EdgeId(id))
    }

    /// Collect edges passing `keep` from a read transaction
    fn scan_edges(&self, keep: impl Fn(&EdgeRecord) -> bool) -> StorageResult<Vec<EdgeRecord>> {
        let db = self.db.lock().map_err(StorageError::lock)?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(EDGES)?;

        let mut edges = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let edge = decode_edge(key.value(), value.value())?;
            if keep(&edge) {
                edges.push(edge);
            }
        }

        Ok(edges)
    }
}

#[async_trait]
impl EntityDirectory for RedbStorage {
    async fn get_entity(&self, guid: Guid) -> StorageResult<Option<Entity>> {
        let db = self.db.lock().map_err(StorageError::lock)?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(ENTITIES)?;

        if let Some(value) = table.get(guid.0)? {
            let entity: Entity = serde_json::from_slice(value.value())?;
            Ok(Some(entity))
        } else {
            Ok(None)
        }
    }

    async fn get_entity_by_uid(&self, uid: &Ulid) -> StorageResult<Option<Entity>> {
        let guid = {
            let db = self.db.lock().map_err(StorageError::lock)?;
            let read_txn = db.begin_read()?;
            let uids = read_txn.open_table(ENTITY_UIDS)?;
            let key = uid.to_string();
            let guid = uids.get(key.as_str())?.map(|g| g.value());
            guid
        };

        match guid {
            Some(guid) => self.get_entity(Guid(guid)).await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StorageBackend for RedbStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        let db = self.db.lock().map_err(StorageError::lock)?;
        db.begin_read()?;
        Ok(true)
    }

    async fn get_edge(&self, id: EdgeId) -> StorageResult<Option<EdgeRecord>> {
        let db = self.db.lock().map_err(StorageError::lock)?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(EDGES)?;

        let edge = match table.get(id.0)? {
            Some(value) => Some(decode_edge(id.0, value.value())?),
            None => None,
        };
        Ok(edge)
    }

    async fn add_edge(&self, guid_one: Guid, relationship: &str, guid_two: Guid) -> StorageResult<EdgeId> {
        let relationship = validate_relationship(relationship)?;

        let db = self.db.lock().map_err(StorageError::lock)?;
        let write_txn = db.begin_write()?;
        let id = Self::insert_edge(&write_txn, guid_one, relationship, guid_two, Utc::now())?;
        write_txn.commit()?;

        tracing::debug!("Added edge {}", id);
        Ok(id)
    }

    async fn edge_exists(&self, guid_one: Guid, relationship: &str, guid_two: Guid) -> StorageResult<bool> {
        let relationship = sanitize_relationship(relationship);

        let db = self.db.lock().map_err(StorageError::lock)?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(EDGES)?;

        for entry in table.iter()? {
            let (key, value) = entry?;
            if decode_edge(key.value(), value.value())?.matches(guid_one, &relationship, guid_two) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn remove_edge(&self, guid_one: Guid, relationship: &str, guid_two: Guid) -> StorageResult<bool> {
        let relationship = sanitize_relationship(relationship);

        let db = self.db.lock().map_err(StorageError::lock)?;
        let write_txn = db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(EDGES)?;

            let mut doomed = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                let edge = decode_edge(key.value(), value.value())?;
                if edge.matches(guid_one, &relationship, guid_two) {
                    doomed.push(key.value());
                }
            }

            for id in &doomed {
                table.remove(*id)?;
            }
            doomed.len()
        };
        write_txn.commit()?;

        tracing::debug!("Removed {} edge(s): {} -[{}]-> {}", removed, guid_one, relationship, guid_two);
        Ok(removed > 0)
    }

    async fn delete_edge_by_id(&self, id: EdgeId) -> StorageResult<Option<EdgeRecord>> {
        let db = self.db.lock().map_err(StorageError::lock)?;
        let write_txn = db.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(EDGES)?;
            let removed = table.remove(id.0)?;
            match removed {
                Some(value) => Some(decode_edge(id.0, value.value())?),
                None => None,
            }
        };
        write_txn.commit()?;

        Ok(deleted)
    }

    async fn save_edge(&self, record: &mut EdgeRecord) -> StorageResult<EdgeId> {
        let relationship = validate_relationship(&record.relationship)?;

        let db = self.db.lock().map_err(StorageError::lock)?;
        let write_txn = db.begin_write()?;

        if let Some(old) = record.id.filter(EdgeId::is_persisted) {
            let mut table = write_txn.open_table(EDGES)?;
            if table.remove(old.0)?.is_none() {
                tracing::debug!("No existing row for edge {}, inserting fresh", old);
            }
        }

        let id = Self::insert_edge(
            &write_txn,
            record.guid_one,
            relationship.clone(),
            record.guid_two,
            record.time_created,
        )
        .map_err(|e| StorageError::SaveFailed(e.to_string()))?;
        write_txn
            .commit()
            .map_err(|e| StorageError::SaveFailed(e.to_string()))?;

        record.id = Some(id);
        record.relationship = relationship;
        Ok(id)
    }

    async fn get_edges(&self, guid: Guid, direction: Direction) -> StorageResult<Vec<EdgeRecord>> {
        self.scan_edges(|e| e.touches(guid, direction))
    }

    async fn save_entity(&self, entity: &Entity) -> StorageResult<()> {
        let value = serde_json::to_vec(entity)?;
        let uid = entity.uid.to_string();

        let db = self.db.lock().map_err(StorageError::lock)?;
        let write_txn = db.begin_write()?;
        let bound = {
            let uids = write_txn.open_table(ENTITY_UIDS)?;
            let guid = uids.get(uid.as_str())?.map(|g| g.value());
            guid
        };
        if let Some(other) = bound.filter(|g| *g != entity.guid.0) {
            write_txn.abort()?;
            return Err(StorageError::uid_conflict(entity, other));
        }

        {
            let mut table = write_txn.open_table(ENTITIES)?;
            let previous: Option<Entity> = match table.get(entity.guid.0)? {
                Some(row) => Some(serde_json::from_slice(row.value())?),
                None => None,
            };
            table.insert(entity.guid.0, value.as_slice())?;

            let mut uids = write_txn.open_table(ENTITY_UIDS)?;
            if let Some(previous) = previous.filter(|p| p.uid != entity.uid) {
                uids.remove(previous.uid.to_string().as_str())?;
            }
            uids.insert(uid.as_str(), entity.guid.0)?;
        }
        write_txn.commit()?;

        Ok(())
    }

    async fn find_entities_by_relationship(
        &self,
        query: &RelationshipQuery,
        ctx: &QueryContext,
    ) -> StorageResult<Vec<Entity>> {
        let edges = self.scan_edges(|e| query.matches_edge(e))?;

        let db = self.db.lock().map_err(StorageError::lock)?;
        let read_txn = db.begin_read()?;
        let entities = read_txn.open_table(ENTITIES)?;

        query.evaluate(ctx, &edges, |guid| -> StorageResult<Option<Entity>> {
            match entities.get(guid.0)? {
                Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
                None => Ok(None),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_redb_edges() {
        let dir = tempfile::tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("kinship.redb")).unwrap();

        let a = storage.add_edge(Guid(1), "friend", Guid(2)).await.unwrap();
        let b = storage.add_edge(Guid(1), "friend", Guid(2)).await.unwrap();
        assert_ne!(a, b);

        let edges = storage.get_edges(Guid(1), Direction::Outgoing).await.unwrap();
        assert_eq!(edges.len(), 2);

        assert!(storage.remove_edge(Guid(1), "friend", Guid(2)).await.unwrap());
        assert!(storage.get_edges(Guid(2), Direction::Both).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_redb_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kinship.redb");

        let entity = Entity::new(Guid(9), "group");
        let id = {
            let storage = RedbStorage::open(&path).unwrap();
            storage.save_entity(&entity).await.unwrap();
            storage.add_edge(Guid(1), "member_of", Guid(9)).await.unwrap()
        };

        let storage = RedbStorage::open(&path).unwrap();
        assert_eq!(storage.get_edge(id).await.unwrap().unwrap().guid_two, Guid(9));
        assert_eq!(storage.guid_to_uid(Guid(9)).await.unwrap(), Some(entity.uid));

        // Ids keep counting after reopen
        let next = storage.add_edge(Guid(1), "member_of", Guid(9)).await.unwrap();
        assert!(next > id);
    }
}
