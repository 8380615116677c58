//! Kinship Exchange - Portable import and export of relationships
//!
//! Exported relationships name their endpoints by portable identifier so a
//! document can be imported into a different store. Import only creates an
//! edge when both endpoints already exist locally.

#![allow(clippy::result_large_err)]

pub mod codec;
pub mod document;
pub mod error;
pub mod hooks;

pub use codec::{EdgeExchange, RelationshipExchange};
pub use document::{Attribute, Document, IMPORT_VERSION, RELATIONSHIP_ELEMENT};
pub use error::{ExchangeError, ExchangeResult};
pub use hooks::{
    register_relationship_hooks, HookEvent, HookHandler, HookHost, HookTable, ALL_ELEMENTS,
};
