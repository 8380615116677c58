//! Edge (relationship) types

use crate::entity::Guid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Store-assigned surrogate identifier for an edge row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub i64);

impl EdgeId {
    /// Whether this id refers to a persisted row (ids start at 1)
    pub fn is_persisted(&self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EdgeId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Direction for listing raw edges around an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Edges where the entity is `guid_one`
    #[default]
    Outgoing,
    /// Edges where the entity is `guid_two`
    Incoming,
    Both,
}

impl std::str::FromStr for Direction {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "outgoing" | "out" => Ok(Self::Outgoing),
            "incoming" | "in" => Ok(Self::Incoming),
            "both" => Ok(Self::Both),
            other => Err(crate::Error::Validation(format!("unknown direction '{}'", other))),
        }
    }
}

/// A directed, labeled edge: `guid_one --relationship--> guid_two`
///
/// Records handed out by a store are detached copies; changing one has no
/// effect on storage until it is passed back to `save_edge`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Surrogate id, `None` until the record has been stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EdgeId>,

    /// Source entity
    pub guid_one: Guid,

    /// Edge label (e.g., "friend", "member_of"), case-sensitive
    pub relationship: String,

    /// Target entity
    pub guid_two: Guid,

    /// Creation timestamp
    pub time_created: DateTime<Utc>,

    /// Extension attributes carried alongside the canonical fields
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl EdgeRecord {
    /// Create an unsaved edge
    pub fn new(guid_one: Guid, relationship: impl Into<String>, guid_two: Guid) -> Self {
        Self {
            id: None,
            guid_one,
            relationship: relationship.into(),
            guid_two,
            time_created: Utc::now(),
            attributes: BTreeMap::new(),
        }
    }

    /// Attach an extension attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Whether this record carries a persisted id
    pub fn is_saved(&self) -> bool {
        self.id.map(|id| id.is_persisted()).unwrap_or(false)
    }

    /// Natural key used for existence checks
    pub fn triple(&self) -> (Guid, &str, Guid) {
        (self.guid_one, self.relationship.as_str(), self.guid_two)
    }

    /// Whether this edge matches the given triple exactly
    pub fn matches(&self, guid_one: Guid, relationship: &str, guid_two: Guid) -> bool {
        self.guid_one == guid_one && self.relationship == relationship && self.guid_two == guid_two
    }

    /// Whether this edge touches `guid` in the given direction
    pub fn touches(&self, guid: Guid, direction: Direction) -> bool {
        match direction {
            Direction::Outgoing => self.guid_one == guid,
            Direction::Incoming => self.guid_two == guid,
            Direction::Both => self.guid_one == guid || self.guid_two == guid,
        }
    }
}

impl std::fmt::Display for EdgeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -[{}]-> {}", self.guid_one, self.relationship, self.guid_two)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_creation() {
        let edge = EdgeRecord::new(Guid(42), "member_of", Guid(7));

        assert_eq!(edge.guid_one, Guid(42));
        assert_eq!(edge.relationship, "member_of");
        assert_eq!(edge.guid_two, Guid(7));
        assert!(edge.id.is_none());
        assert!(!edge.is_saved());
        assert!(edge.attributes.is_empty());
    }

    #[test]
    fn test_edge_saved_state() {
        let mut edge = EdgeRecord::new(Guid(1), "friend", Guid(2));
        edge.id = Some(EdgeId(0));
        assert!(!edge.is_saved());

        edge.id = Some(EdgeId(-3));
        assert!(!edge.is_saved());

        edge.id = Some(EdgeId(9));
        assert!(edge.is_saved());
    }

    #[test]
    fn test_edge_matching() {
        let edge = EdgeRecord::new(Guid(1), "friend", Guid(2)).with_attribute("note", "met at work");

        assert!(edge.matches(Guid(1), "friend", Guid(2)));
        assert!(!edge.matches(Guid(1), "Friend", Guid(2)));
        assert!(!edge.matches(Guid(2), "friend", Guid(1)));

        assert!(edge.touches(Guid(1), Direction::Outgoing));
        assert!(!edge.touches(Guid(1), Direction::Incoming));
        assert!(edge.touches(Guid(2), Direction::Both));
        assert_eq!(edge.attributes.get("note").map(String::as_str), Some("met at work"));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("in".parse::<Direction>().unwrap(), Direction::Incoming);
        assert_eq!("Outgoing".parse::<Direction>().unwrap(), Direction::Outgoing);
        assert!("sideways".parse::<Direction>().is_err());
    }
}
