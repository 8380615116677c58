//! Entity identifiers and the entity row read from the host's entity collection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Integer identifier shared with the external entity store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(pub i64);

impl Guid {
    /// Zero and negative guids never name an entity
    pub fn is_set(&self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Guid {
    fn from(guid: i64) -> Self {
        Self(guid)
    }
}

/// Access-control marker on an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessId(pub i64);

impl AccessId {
    /// Entities carrying this marker are always visible to their owner
    pub const UNRESTRICTED: AccessId = AccessId(0);
}

impl std::fmt::Display for AccessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AccessId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Entity type classification (e.g., "user", "group", "object")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(pub String);

impl EntityType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An entity row as exposed by the host's entity collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Local identifier
    pub guid: Guid,

    /// Portable unique identifier, stable across storage instances
    pub uid: Ulid,

    /// Entity type
    #[serde(rename = "type")]
    pub entity_type: EntityType,

    /// Optional subtype within the type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// Owning entity
    pub owner_guid: Guid,

    /// Access-control marker
    pub access_id: AccessId,

    /// Creation timestamp
    pub time_created: DateTime<Utc>,
}

impl Entity {
    /// Create a new entity with a fresh portable identifier
    pub fn new(guid: Guid, entity_type: impl Into<EntityType>) -> Self {
        Self {
            guid,
            uid: Ulid::new(),
            entity_type: entity_type.into(),
            subtype: None,
            owner_guid: Guid::default(),
            access_id: AccessId::UNRESTRICTED,
            time_created: Utc::now(),
        }
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn with_owner(mut self, owner_guid: Guid) -> Self {
        self.owner_guid = owner_guid;
        self
    }

    pub fn with_access(mut self, access_id: AccessId) -> Self {
        self.access_id = access_id;
        self
    }

    pub fn with_uid(mut self, uid: Ulid) -> Self {
        self.uid = uid;
        self
    }

    pub fn created_at(mut self, time_created: DateTime<Utc>) -> Self {
        self.time_created = time_created;
        self
    }
}
