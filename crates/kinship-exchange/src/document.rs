//! Portable document shape for exchanged relationships
//!
//! A document is a named element holding a flat list of `(name, text)`
//! attributes. Relationship documents are named [`RELATIONSHIP_ELEMENT`].

use serde::{Deserialize, Serialize};

/// The only import version understood by this crate
pub const IMPORT_VERSION: u32 = 1;

/// Element name carried by relationship documents
pub const RELATIONSHIP_ELEMENT: &str = "relationship";

/// Attribute names with fixed meaning in a relationship document
pub mod fields {
    pub const ID: &str = "id";
    pub const GUID_ONE: &str = "guid_one";
    pub const RELATIONSHIP: &str = "relationship";
    pub const GUID_TWO: &str = "guid_two";
    pub const TIME_CREATED: &str = "time_created";
    pub const UUID_ONE: &str = "uuid_one";
    pub const UUID_TWO: &str = "uuid_two";
    pub const ENTITY_UUID: &str = "entity_uuid";
}

/// A single named attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub text: String,
}

/// An exchanged element with flattened attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub elements: Vec<Attribute>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
        }
    }

    /// An empty relationship document
    pub fn relationship() -> Self {
        Self::new(RELATIONSHIP_ELEMENT)
    }

    pub fn push(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.elements.push(Attribute {
            name: name.into(),
            text: text.into(),
        });
    }

    pub fn with(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.push(name, text);
        self
    }

    /// First attribute with the given name, compared case-insensitively
    pub fn get(&self, name: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.text.as_str())
    }

    pub fn is_relationship(&self) -> bool {
        self.name.eq_ignore_ascii_case(RELATIONSHIP_ELEMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_json_shape() {
        let doc = Document::relationship()
            .with("relationship", "friend")
            .with("uuid_one", "a");

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["name"], "relationship");
        assert_eq!(json["elements"][0]["name"], "relationship");
        assert_eq!(json["elements"][1]["text"], "a");

        let parsed: Document = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_lookup_ignores_case() {
        let doc = Document::new("Relationship").with("UUID_One", "x");
        assert!(doc.is_relationship());
        assert_eq!(doc.get("uuid_one"), Some("x"));
        assert_eq!(doc.get("uuid_two"), None);
    }

    #[test]
    fn test_elements_default_to_empty() {
        let doc: Document = serde_json::from_str(r#"{"name":"relationship"}"#).unwrap();
        assert!(doc.elements.is_empty());
    }
}
