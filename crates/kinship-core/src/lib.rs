//! Kinship Core - Edge and query types for the relationship graph store
//!
//! This crate provides the value types shared by every Kinship crate: the
//! edge record, the entity row read from the host's entity collection, and
//! the relationship query with its in-process evaluator.

pub mod edge;
pub mod entity;
pub mod error;
pub mod limits;
pub mod query;

pub use edge::{Direction, EdgeId, EdgeRecord};
pub use entity::{AccessId, Entity, EntityType, Guid};
pub use error::{Error, Result};
pub use limits::ValidationError;
pub use query::{OrderBy, OrderColumn, QueryContext, RelationshipQuery, SortDirection};

// Re-exported so downstream crates name portable identifiers without a direct dependency
pub use ulid::Ulid;
