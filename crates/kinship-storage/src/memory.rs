//! In-memory storage backend for testing

use crate::error::{StorageError, StorageResult};
use crate::traits::{EntityDirectory, StorageBackend};
use async_trait::async_trait;
use kinship_core::limits::{sanitize_relationship, validate_relationship};
use kinship_core::{
    Direction, EdgeId, EdgeRecord, Entity, Guid, QueryContext, RelationshipQuery, Ulid,
};
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::sync::RwLock;

#[derive(Default)]
struct EdgeTable {
    rows: BTreeMap<EdgeId, EdgeRecord>,
    last_id: i64,
}

impl EdgeTable {
    /// Insert a detached copy of `edge` under a fresh id
    fn insert(&mut self, edge: &EdgeRecord) -> EdgeId {
        self.last_id += 1;
        let id = EdgeId(self.last_id);
        let row = EdgeRecord {
            id: Some(id),
            attributes: BTreeMap::new(),
            ..edge.clone()
        };
        self.rows.insert(id, row);
        id
    }
}

/// In-memory storage backend
///
/// Useful for testing and temporary storage. Surrogate ids are never reused.
pub struct MemoryStorage {
    edges: RwLock<EdgeTable>,
    entities: RwLock<HashMap<Guid, Entity>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            edges: RwLock::new(EdgeTable::default()),
            entities: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityDirectory for MemoryStorage {
    async fn get_entity(&self, guid: Guid) -> StorageResult<Option<Entity>> {
        let entities = self.entities.read().map_err(StorageError::lock)?;
        Ok(entities.get(&guid).cloned())
    }

    async fn get_entity_by_uid(&self, uid: &Ulid) -> StorageResult<Option<Entity>> {
        let entities = self.entities.read().map_err(StorageError::lock)?;
        Ok(entities.values().find(|e| e.uid == *uid).cloned())
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        Ok(true)
    }

    // Edge operations

    async fn get_edge(&self, id: EdgeId) -> StorageResult<Option<EdgeRecord>> {
        let edges = self.edges.read().map_err(StorageError::lock)?;
        Ok(edges.rows.get(&id).cloned())
    }

    async fn add_edge(&self, guid_one: Guid, relationship: &str, guid_two: Guid) -> StorageResult<EdgeId> {
        let relationship = validate_relationship(relationship)?;
        let mut edges = self.edges.write().map_err(StorageError::lock)?;

        let id = edges.insert(&EdgeRecord::new(guid_one, relationship, guid_two));
        tracing::debug!("Added edge {}", id);
        Ok(id)
    }

    async fn edge_exists(&self, guid_one: Guid, relationship: &str, guid_two: Guid) -> StorageResult<bool> {
        let relationship = sanitize_relationship(relationship);
        let edges = self.edges.read().map_err(StorageError::lock)?;
        Ok(edges
            .rows
            .values()
            .any(|e| e.matches(guid_one, &relationship, guid_two)))
    }

    async fn remove_edge(&self, guid_one: Guid, relationship: &str, guid_two: Guid) -> StorageResult<bool> {
        let relationship = sanitize_relationship(relationship);
        let mut edges = self.edges.write().map_err(StorageError::lock)?;

        let before = edges.rows.len();
        edges.rows.retain(|_, e| !e.matches(guid_one, &relationship, guid_two));
        Ok(edges.rows.len() < before)
    }

    async fn delete_edge_by_id(&self, id: EdgeId) -> StorageResult<Option<EdgeRecord>> {
        let mut edges = self.edges.write().map_err(StorageError::lock)?;
        Ok(edges.rows.remove(&id))
    }

    async fn save_edge(&self, record: &mut EdgeRecord) -> StorageResult<EdgeId> {
        let relationship = validate_relationship(&record.relationship)?;
        let mut edges = self.edges.write().map_err(StorageError::lock)?;

        if let Some(old) = record.id.filter(EdgeId::is_persisted) {
            edges.rows.remove(&old);
        }

        record.relationship = relationship;
        let id = edges.insert(record);
        record.id = Some(id);
        Ok(id)
    }

    async fn get_edges(&self, guid: Guid, direction: Direction) -> StorageResult<Vec<EdgeRecord>> {
        let edges = self.edges.read().map_err(StorageError::lock)?;
        Ok(edges
            .rows
            .values()
            .filter(|e| e.touches(guid, direction))
            .cloned()
            .collect())
    }

    // Entity operations

    async fn save_entity(&self, entity: &Entity) -> StorageResult<()> {
        let mut entities = self.entities.write().map_err(StorageError::lock)?;
        if let Some(other) = entities
            .values()
            .find(|e| e.uid == entity.uid && e.guid != entity.guid)
        {
            return Err(StorageError::uid_conflict(entity, other.guid.0));
        }
        entities.insert(entity.guid, entity.clone());
        Ok(())
    }

    // Query operations

    async fn find_entities_by_relationship(
        &self,
        query: &RelationshipQuery,
        ctx: &QueryContext,
    ) -> StorageResult<Vec<Entity>> {
        let edges = self.edges.read().map_err(StorageError::lock)?;
        let entities = self.entities.read().map_err(StorageError::lock)?;

        let found = query
            .evaluate(ctx, edges.rows.values(), |guid| {
                Ok::<_, Infallible>(entities.get(&guid).cloned())
            })
            .unwrap_or_else(|never| match never {});
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinship_core::AccessId;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.initialize().await.unwrap();

        let id = storage.add_edge(Guid(1), "friend", Guid(2)).await.unwrap();
        assert!(storage.edge_exists(Guid(1), "friend", Guid(2)).await.unwrap());

        let deleted = storage.delete_edge_by_id(id).await.unwrap().unwrap();
        assert_eq!(deleted.id, Some(id));
        assert!(!storage.edge_exists(Guid(1), "friend", Guid(2)).await.unwrap());
        assert!(storage.delete_edge_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let storage = MemoryStorage::new();
        let first = storage.add_edge(Guid(1), "friend", Guid(2)).await.unwrap();
        storage.delete_edge_by_id(first).await.unwrap();

        let second = storage.add_edge(Guid(1), "friend", Guid(2)).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_attributes_are_not_persisted() {
        let storage = MemoryStorage::new();
        let mut record = EdgeRecord::new(Guid(1), "friend", Guid(2)).with_attribute("note", "x");
        let id = storage.save_edge(&mut record).await.unwrap();

        // The caller's copy keeps its attributes; the stored row does not
        assert_eq!(record.attributes.len(), 1);
        assert!(storage.get_edge(id).await.unwrap().unwrap().attributes.is_empty());
    }

    #[tokio::test]
    async fn test_query_sees_saved_entities() {
        let storage = MemoryStorage::new();
        storage
            .save_entity(&Entity::new(Guid(2), "user").with_access(AccessId(1)))
            .await
            .unwrap();
        storage.add_edge(Guid(1), "friend", Guid(2)).await.unwrap();

        let ctx = QueryContext::new(Guid(1)).with_access(AccessId(1));
        let found = storage
            .find_entities_by_relationship(&RelationshipQuery::new("friend", Guid(1)), &ctx)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].guid, Guid(2));
    }
}
