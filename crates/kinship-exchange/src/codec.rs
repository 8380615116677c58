//! Relationship import/export codec

use crate::document::{fields, Document, IMPORT_VERSION};
use crate::error::{ExchangeError, ExchangeResult};
use async_trait::async_trait;
use kinship_core::{Direction, EdgeRecord, Entity, Guid, Ulid};
use kinship_storage::StorageBackend;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Typed export/import interface a host composes into its own pipeline
#[async_trait]
pub trait EdgeExchange: Send + Sync {
    /// One document per edge whose `guid_one` is `guid`
    async fn export_edges(&self, guid: Guid) -> ExchangeResult<Vec<Document>>;

    /// Import one relationship document.
    ///
    /// Returns `Ok(None)` when either endpoint does not resolve to a local entity.
    async fn import_edge(&self, document: &Document, version: u32) -> ExchangeResult<Option<EdgeRecord>>;
}

/// Codec bound to an edge store
pub struct RelationshipExchange<S: StorageBackend + ?Sized> {
    store: Arc<S>,
}

impl<S: StorageBackend + ?Sized> RelationshipExchange<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Raw edge rows rooted at `guid`
    pub async fn export_rows(&self, guid: Guid) -> ExchangeResult<Vec<EdgeRecord>> {
        Ok(self.store.get_edges(guid, Direction::Outgoing).await?)
    }

    /// Document for a single edge, with portable identifiers for both endpoints
    pub async fn export_edge(&self, edge: &EdgeRecord) -> ExchangeResult<Document> {
        let mut doc = Document::relationship();
        if let Some(id) = edge.id {
            doc.push(fields::ID, id.to_string());
        }
        doc.push(fields::GUID_ONE, edge.guid_one.to_string());
        doc.push(fields::RELATIONSHIP, edge.relationship.as_str());
        doc.push(fields::GUID_TWO, edge.guid_two.to_string());
        doc.push(fields::TIME_CREATED, edge.time_created.to_rfc3339());
        for (name, text) in &edge.attributes {
            doc.push(name.as_str(), text.as_str());
        }

        for (field, guid) in [(fields::UUID_ONE, edge.guid_one), (fields::UUID_TWO, edge.guid_two)] {
            match self.store.guid_to_uid(guid).await? {
                Some(uid) => doc.push(field, uid.to_string()),
                None => tracing::warn!("Edge {} has no entity at endpoint {}", edge, guid),
            }
        }

        Ok(doc)
    }

    async fn resolve(&self, field: &str, uid: Option<&str>) -> ExchangeResult<Option<Entity>> {
        let Some(text) = uid else {
            tracing::warn!("Relationship document has no {}", field);
            return Ok(None);
        };
        let Ok(uid) = Ulid::from_string(text) else {
            tracing::warn!("Unreadable {} '{}'", field, text);
            return Ok(None);
        };
        Ok(self.store.get_entity_by_uid(&uid).await?)
    }
}

/// Fields read out of a version 1 document
#[derive(Default)]
struct Parsed {
    relationship: Option<String>,
    uuid_one: Option<String>,
    uuid_two: Option<String>,
    entity_uuid: Option<String>,
    attributes: BTreeMap<String, String>,
}

fn parse_v1(document: &Document) -> Parsed {
    let mut parsed = Parsed::default();
    for attr in &document.elements {
        let name = attr.name.to_lowercase();
        let text = attr.text.clone();
        match name.as_str() {
            fields::ID => {}
            // Foreign guids and times are replaced locally
            fields::GUID_ONE | fields::GUID_TWO | fields::TIME_CREATED => {}
            fields::ENTITY_UUID => parsed.entity_uuid = Some(text),
            fields::UUID_ONE => parsed.uuid_one = Some(text),
            fields::UUID_TWO => parsed.uuid_two = Some(text),
            fields::RELATIONSHIP => parsed.relationship = Some(text),
            _ => {
                parsed.attributes.insert(name, text);
            }
        }
    }
    parsed
}

#[async_trait]
impl<S: StorageBackend + ?Sized> EdgeExchange for RelationshipExchange<S> {
    async fn export_edges(&self, guid: Guid) -> ExchangeResult<Vec<Document>> {
        let mut documents = Vec::new();
        for edge in self.export_rows(guid).await? {
            documents.push(self.export_edge(&edge).await?);
        }
        Ok(documents)
    }

    async fn import_edge(&self, document: &Document, version: u32) -> ExchangeResult<Option<EdgeRecord>> {
        if version != IMPORT_VERSION {
            return Err(ExchangeError::UnsupportedVersion(version));
        }
        if !document.is_relationship() {
            return Err(ExchangeError::MalformedDocument(format!(
                "expected a relationship element, got '{}'",
                document.name
            )));
        }

        let parsed = parse_v1(document);
        let relationship = parsed
            .relationship
            .ok_or_else(|| ExchangeError::MalformedDocument("missing relationship".to_string()))?;
        if let Some(ref entity_uuid) = parsed.entity_uuid {
            tracing::debug!("Ignoring entity_uuid {}", entity_uuid);
        }

        let one = self.resolve(fields::UUID_ONE, parsed.uuid_one.as_deref()).await?;
        let two = self.resolve(fields::UUID_TWO, parsed.uuid_two.as_deref()).await?;
        let (Some(one), Some(two)) = (one, two) else {
            tracing::warn!("Skipping '{}' relationship with an unknown endpoint", relationship);
            return Ok(None);
        };

        let mut record = EdgeRecord::new(one.guid, relationship, two.guid);
        record.attributes = parsed.attributes;
        self.store
            .save_edge(&mut record)
            .await
            .map_err(|e| ExchangeError::SaveFailed(e.to_string()))?;

        tracing::debug!("Imported edge {}", record);
        Ok(Some(record))
    }
}
