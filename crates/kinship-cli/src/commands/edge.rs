//! Edge commands

use clap::{Args, Subcommand};
use serde_json::json;

use crate::commands::parse_guid;
use crate::output::{edge_line, edge_table, emit};
use crate::{AppContext, Cli};
use kinship_core::{Direction, EdgeId, EdgeRecord, Guid};

#[derive(Args)]
pub struct EdgeArgs {
    #[command(subcommand)]
    pub command: EdgeCommands,
}

#[derive(Subcommand)]
pub enum EdgeCommands {
    /// Add a new edge (duplicates are allowed)
    Add {
        /// Source entity guid
        #[arg(value_parser = parse_guid)]
        guid_one: Guid,
        /// Relationship label
        relationship: String,
        /// Target entity guid
        #[arg(value_parser = parse_guid)]
        guid_two: Guid,
    },
    /// Show an edge by id
    Get {
        /// Edge id
        id: i64,
    },
    /// Check whether an edge exists
    Exists {
        #[arg(value_parser = parse_guid)]
        guid_one: Guid,
        relationship: String,
        #[arg(value_parser = parse_guid)]
        guid_two: Guid,
    },
    /// Remove every edge matching a triple
    Remove {
        #[arg(value_parser = parse_guid)]
        guid_one: Guid,
        relationship: String,
        #[arg(value_parser = parse_guid)]
        guid_two: Guid,
    },
    /// Delete an edge by id
    Delete {
        /// Edge id
        id: i64,
    },
    /// Save an edge, replacing the row with --id if given
    Save {
        #[arg(value_parser = parse_guid)]
        guid_one: Guid,
        relationship: String,
        #[arg(value_parser = parse_guid)]
        guid_two: Guid,
        /// Existing edge id to replace
        #[arg(long)]
        id: Option<i64>,
    },
    /// List edges touching an entity
    List {
        #[arg(value_parser = parse_guid)]
        guid: Guid,
        /// Direction: outgoing, incoming, both
        #[arg(long, default_value = "outgoing")]
        direction: Direction,
    },
}

pub async fn run(args: &EdgeArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    match &args.command {
        EdgeCommands::Add {
            guid_one,
            relationship,
            guid_two,
        } => {
            let id = ctx.storage.add_edge(*guid_one, relationship, *guid_two).await?;
            tracing::info!("Added edge {}", id);
            emit(&json!({ "id": id }), cli.format, |_| format!("Added edge {}", id))?;
        }
        EdgeCommands::Get { id } => {
            let Some(edge) = ctx.storage.get_edge(EdgeId(*id)).await? else {
                anyhow::bail!("Edge {} not found", id);
            };
            emit(&edge, cli.format, edge_line)?;
        }
        EdgeCommands::Exists {
            guid_one,
            relationship,
            guid_two,
        } => {
            let exists = ctx.storage.edge_exists(*guid_one, relationship, *guid_two).await?;
            emit(&json!({ "exists": exists }), cli.format, |_| exists.to_string())?;
        }
        EdgeCommands::Remove {
            guid_one,
            relationship,
            guid_two,
        } => {
            let removed = ctx.storage.remove_edge(*guid_one, relationship, *guid_two).await?;
            if removed {
                tracing::info!("Removed {} -[{}]-> {}", guid_one, relationship, guid_two);
            }
            emit(&json!({ "removed": removed }), cli.format, |_| {
                if removed {
                    format!("Removed {} -[{}]-> {}", guid_one, relationship, guid_two)
                } else {
                    "No matching edge".to_string()
                }
            })?;
        }
        EdgeCommands::Delete { id } => {
            let Some(edge) = ctx.storage.delete_edge_by_id(EdgeId(*id)).await? else {
                anyhow::bail!("Edge {} not found", id);
            };
            tracing::info!("Deleted edge {}", edge);
            emit(&edge, cli.format, |e| format!("Deleted {}", edge_line(e)))?;
        }
        EdgeCommands::Save {
            guid_one,
            relationship,
            guid_two,
            id,
        } => {
            let mut record = EdgeRecord::new(*guid_one, relationship.as_str(), *guid_two);
            record.id = id.map(EdgeId);
            let saved = ctx.storage.save_edge(&mut record).await?;
            tracing::info!("Saved edge {}", saved);
            emit(&record, cli.format, |_| format!("Saved edge {}", saved))?;
        }
        EdgeCommands::List { guid, direction } => {
            let edges = ctx.storage.get_edges(*guid, *direction).await?;
            emit(edges.as_slice(), cli.format, edge_table)?;
        }
    }

    Ok(())
}
