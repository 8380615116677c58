//! Storage backend trait definitions

use crate::error::StorageResult;
use async_trait::async_trait;
use kinship_core::{
    Direction, EdgeId, EdgeRecord, Entity, Guid, QueryContext, RelationshipQuery, Ulid,
};

/// Read contract on the host's entity collection
#[async_trait]
pub trait EntityDirectory: Send + Sync {
    /// Get an entity by guid
    async fn get_entity(&self, guid: Guid) -> StorageResult<Option<Entity>>;

    /// Get an entity by its portable unique identifier
    async fn get_entity_by_uid(&self, uid: &Ulid) -> StorageResult<Option<Entity>>;

    /// Resolve a guid to its portable unique identifier
    async fn guid_to_uid(&self, guid: Guid) -> StorageResult<Option<Ulid>> {
        Ok(self.get_entity(guid).await?.map(|e| e.uid))
    }
}

/// Trait for storage backend implementations
///
/// The edge table is owned by the backend. Entity rows are read through
/// [`EntityDirectory`]; `save_entity` exists so a standalone store can be
/// seeded without a host application.
#[async_trait]
pub trait StorageBackend: EntityDirectory {
    /// Initialize the storage (create tables, etc.)
    async fn initialize(&self) -> StorageResult<()>;

    /// Close the storage connection
    async fn close(&self) -> StorageResult<()>;

    /// Health check
    async fn health_check(&self) -> StorageResult<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Edge Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get an edge by surrogate id
    async fn get_edge(&self, id: EdgeId) -> StorageResult<Option<EdgeRecord>>;

    /// Insert a new edge unconditionally; duplicates of an existing triple get a new id
    async fn add_edge(&self, guid_one: Guid, relationship: &str, guid_two: Guid)
        -> StorageResult<EdgeId>;

    /// Whether at least one edge matches the triple
    async fn edge_exists(&self, guid_one: Guid, relationship: &str, guid_two: Guid)
        -> StorageResult<bool>;

    /// Delete every edge matching the triple, returning whether any were removed
    async fn remove_edge(&self, guid_one: Guid, relationship: &str, guid_two: Guid)
        -> StorageResult<bool>;

    /// Delete an edge by id and return the deleted row
    async fn delete_edge_by_id(&self, id: EdgeId) -> StorageResult<Option<EdgeRecord>>;

    /// Replace-or-insert a record.
    ///
    /// A record with a persisted id has that row deleted first; a new row is
    /// then inserted from the record's fields and its id written back to the
    /// record. Both steps happen atomically.
    async fn save_edge(&self, record: &mut EdgeRecord) -> StorageResult<EdgeId>;

    /// List raw edges touching an entity
    async fn get_edges(&self, guid: Guid, direction: Direction) -> StorageResult<Vec<EdgeRecord>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Entity Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or replace an entity row.
    ///
    /// A portable identifier names at most one entity. Saving a uid already
    /// held by another guid fails with [`crate::StorageError::UidConflict`];
    /// a uid replaced on re-save no longer resolves.
    async fn save_entity(&self, entity: &Entity) -> StorageResult<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Entities related to the query's anchor, filtered, visible to `ctx`,
    /// ordered and paginated
    async fn find_entities_by_relationship(
        &self,
        query: &RelationshipQuery,
        ctx: &QueryContext,
    ) -> StorageResult<Vec<Entity>>;
}
