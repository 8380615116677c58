//! Output formatting utilities

use clap::ValueEnum;
use serde::Serialize;

use kinship_core::{EdgeRecord, Entity};

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Print `data` as pretty JSON, or as text produced by `table`
pub fn emit<T: Serialize + ?Sized>(
    data: &T,
    format: OutputFormat,
    table: impl FnOnce(&T) -> String,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Table => println!("{}", table(data)),
    }
    Ok(())
}

pub fn edge_line(edge: &EdgeRecord) -> String {
    let id = edge.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
    format!("{:>6}  {}  {}", id, edge, edge.time_created.to_rfc3339())
}

pub fn edge_table(edges: &[EdgeRecord]) -> String {
    if edges.is_empty() {
        return "No edges found".to_string();
    }
    let mut lines = vec![format!("{:>6}  {}", "ID", "EDGE")];
    lines.extend(edges.iter().map(edge_line));
    lines.join("\n")
}

pub fn entity_line(entity: &Entity) -> String {
    let kind = match entity.subtype {
        Some(ref subtype) => format!("{}/{}", entity.entity_type.as_str(), subtype),
        None => entity.entity_type.as_str().to_string(),
    };
    format!(
        "{:>6}  {:<20}  owner={} access={}  {}",
        entity.guid.0, kind, entity.owner_guid, entity.access_id, entity.uid
    )
}

pub fn entity_table(entities: &[Entity]) -> String {
    if entities.is_empty() {
        return "No entities found".to_string();
    }
    let mut lines = vec![format!("{:>6}  {:<20}", "GUID", "TYPE")];
    lines.extend(entities.iter().map(entity_line));
    lines.join("\n")
}
