//! CLI command implementations

pub mod completions;
pub mod config;
pub mod edge;
pub mod entity;
pub mod io;
pub mod query;

use kinship_core::Guid;

/// Parse a guid argument, rejecting zero and negative values
pub fn parse_guid(s: &str) -> Result<Guid, String> {
    let guid: i64 = s.parse().map_err(|_| format!("'{}' is not an integer guid", s))?;
    let guid = Guid(guid);
    if !guid.is_set() {
        return Err(format!("guid must be positive, got {}", s));
    }
    Ok(guid)
}
