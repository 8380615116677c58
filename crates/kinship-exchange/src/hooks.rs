//! Hook adapters between a host's generic event dispatch and the codec
//!
//! Hosts that dispatch import/export through named events implement
//! [`HookHost`]; [`register_relationship_hooks`] installs the relationship
//! handlers on it. [`HookTable`] is a ready-made host.

use crate::codec::{EdgeExchange, RelationshipExchange};
use crate::document::{Document, IMPORT_VERSION, RELATIONSHIP_ELEMENT};
use crate::error::{ExchangeError, ExchangeResult};
use async_trait::async_trait;
use kinship_core::Guid;
use kinship_storage::StorageBackend;
use serde_json::Value;
use std::sync::Arc;

/// Element type that matches every dispatch
pub const ALL_ELEMENTS: &str = "all";

/// Priority the relationship handlers are registered at
pub const RELATIONSHIP_HOOK_PRIORITY: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    Import,
    Export,
}

impl HookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Export => "export",
        }
    }
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A handler in the host's event contract.
///
/// Receives the value accumulated so far and the caller's parameters.
/// Returning `None` leaves the accumulated value unchanged.
#[async_trait]
pub trait HookHandler: Send + Sync {
    async fn handle(
        &self,
        event: HookEvent,
        element_type: &str,
        value: &Value,
        params: &Value,
    ) -> ExchangeResult<Option<Value>>;
}

/// Anything that can hold hook registrations
pub trait HookHost {
    fn register(
        &mut self,
        event: HookEvent,
        element_type: &str,
        handler: Arc<dyn HookHandler>,
        priority: i32,
    );
}

struct Registration {
    event: HookEvent,
    element_type: String,
    priority: i32,
    handler: Arc<dyn HookHandler>,
}

/// In-process hook host dispatching by ascending priority, then registration order
#[derive(Default)]
pub struct HookTable {
    registrations: Vec<Registration>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Run every handler registered for `event` on `element_type` (or on all
    /// elements), threading `initial` through them
    pub async fn trigger(
        &self,
        event: HookEvent,
        element_type: &str,
        params: &Value,
        initial: Value,
    ) -> ExchangeResult<Value> {
        let mut value = initial;
        for reg in self.registrations.iter().filter(|r| {
            r.event == event && (r.element_type == ALL_ELEMENTS || r.element_type == element_type)
        }) {
            if let Some(next) = reg.handler.handle(event, element_type, &value, params).await? {
                value = next;
            }
        }
        Ok(value)
    }
}

impl HookHost for HookTable {
    fn register(
        &mut self,
        event: HookEvent,
        element_type: &str,
        handler: Arc<dyn HookHandler>,
        priority: i32,
    ) {
        let reg = Registration {
            event,
            element_type: element_type.to_string(),
            priority,
            handler,
        };
        // Stable: equal priorities keep registration order
        let at = self.registrations.partition_point(|r| r.priority <= priority);
        self.registrations.insert(at, reg);
    }
}

/// Builds relationship records from import documents
pub struct ImportHook<E> {
    exchange: Arc<E>,
}

#[async_trait]
impl<E: EdgeExchange + 'static> HookHandler for ImportHook<E> {
    async fn handle(
        &self,
        _event: HookEvent,
        _element_type: &str,
        _value: &Value,
        params: &Value,
    ) -> ExchangeResult<Option<Value>> {
        let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
        if !name.eq_ignore_ascii_case(RELATIONSHIP_ELEMENT) {
            return Ok(None);
        }

        let element = params
            .get("element")
            .ok_or_else(|| ExchangeError::InvalidParameter("import requires an element".to_string()))?;
        let document: Document = serde_json::from_value(element.clone())?;

        let version = match params.get("version") {
            None | Some(Value::Null) => IMPORT_VERSION,
            Some(v) => v
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| ExchangeError::InvalidParameter(format!("bad version: {}", v)))?,
        };

        match self.exchange.import_edge(&document, version).await? {
            Some(record) => Ok(Some(serde_json::to_value(record)?)),
            None => Ok(Some(Value::Bool(false))),
        }
    }
}

/// Appends raw relationship rows to the host's export accumulator
pub struct ExportHook<S: StorageBackend + ?Sized> {
    exchange: Arc<RelationshipExchange<S>>,
}

#[async_trait]
impl<S: StorageBackend + ?Sized + 'static> HookHandler for ExportHook<S> {
    async fn handle(
        &self,
        _event: HookEvent,
        _element_type: &str,
        value: &Value,
        params: &Value,
    ) -> ExchangeResult<Option<Value>> {
        let guid = params.get("guid").and_then(Value::as_i64).ok_or_else(|| {
            ExchangeError::InvalidParameter("GUID has not been specified during export".to_string())
        })?;
        let Value::Array(rows) = value else {
            return Err(ExchangeError::InvalidParameter(
                "export accumulator is not an array".to_string(),
            ));
        };

        let mut rows = rows.clone();
        for edge in self.exchange.export_rows(Guid(guid)).await? {
            rows.push(serde_json::to_value(edge)?);
        }
        Ok(Some(Value::Array(rows)))
    }
}

/// Register the relationship import and export handlers on `host`
pub fn register_relationship_hooks<H, S>(host: &mut H, exchange: Arc<RelationshipExchange<S>>)
where
    H: HookHost + ?Sized,
    S: StorageBackend + ?Sized + 'static,
{
    host.register(
        HookEvent::Import,
        ALL_ELEMENTS,
        Arc::new(ImportHook {
            exchange: exchange.clone(),
        }),
        RELATIONSHIP_HOOK_PRIORITY,
    );
    host.register(
        HookEvent::Export,
        ALL_ELEMENTS,
        Arc::new(ExportHook { exchange }),
        RELATIONSHIP_HOOK_PRIORITY,
    );
}
