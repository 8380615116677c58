//! Import/Export commands

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use clap::Args;
use serde_json::{json, Value};

use crate::commands::parse_guid;
use crate::output::emit;
use crate::{AppContext, Cli};
use kinship_core::Guid;
use kinship_exchange::{
    register_relationship_hooks, EdgeExchange, HookEvent, HookTable, RelationshipExchange, ALL_ELEMENTS,
    IMPORT_VERSION, RELATIONSHIP_ELEMENT,
};
use kinship_storage::StorageBackend;

#[derive(Args)]
pub struct ExportArgs {
    /// Entity whose outgoing relationships are exported
    #[arg(value_parser = parse_guid)]
    pub guid: Guid,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export raw rows instead of portable documents
    #[arg(long)]
    pub rows: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Input file: a JSON document or an array of documents
    pub file: PathBuf,

    /// Document format version
    #[arg(long = "version", default_value_t = IMPORT_VERSION)]
    pub format_version: u32,
}

fn hooks(ctx: &AppContext) -> HookTable {
    let mut table = HookTable::new();
    register_relationship_hooks(&mut table, exchange(ctx));
    table
}

fn exchange(ctx: &AppContext) -> Arc<RelationshipExchange<dyn StorageBackend>> {
    Arc::new(RelationshipExchange::new(ctx.storage.clone()))
}

pub async fn run_export(args: &ExportArgs, _cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    tracing::info!("Exporting relationships of {}", args.guid);

    let exported = if args.rows {
        hooks(ctx)
            .trigger(HookEvent::Export, ALL_ELEMENTS, &json!({ "guid": args.guid }), json!([]))
            .await?
    } else {
        serde_json::to_value(exchange(ctx).export_edges(args.guid).await?)?
    };
    let count = exported.as_array().map(Vec::len).unwrap_or_default();
    let content = serde_json::to_string_pretty(&exported)?;

    if let Some(ref path) = args.output {
        write_private(path, &content)?;
        println!("Exported {} relationship(s) to {:?}", count, path);
    } else {
        println!("{}", content);
    }

    Ok(())
}

/// Write with secure permissions (0o600 = owner read/write only)
fn write_private(path: &Path, content: &str) -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(content.as_bytes())?;
    }
    #[cfg(not(unix))]
    {
        std::fs::write(path, content)?;
    }
    Ok(())
}

pub async fn run_import(args: &ImportArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    tracing::info!("Importing from {:?}", args.file);

    let content = std::fs::read_to_string(&args.file)?;
    let documents = match serde_json::from_str::<Value>(&content)? {
        Value::Array(items) => items,
        single @ Value::Object(_) => vec![single],
        _ => anyhow::bail!("{:?} does not contain a document or an array of documents", args.file),
    };

    let table = hooks(ctx);
    let mut imported = Vec::new();
    let mut skipped = 0usize;

    for element in documents {
        let name = element
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(RELATIONSHIP_ELEMENT)
            .to_string();
        let params = json!({ "name": name, "element": element, "version": args.format_version });

        match table.trigger(HookEvent::Import, &name, &params, Value::Null).await? {
            Value::Null | Value::Bool(false) => skipped += 1,
            record => imported.push(record),
        }
    }

    let count = imported.len();
    tracing::info!("Imported {} relationship(s), skipped {}", count, skipped);
    let summary = json!({ "imported": imported, "skipped": skipped });
    emit(&summary, cli.format, |_| {
        format!("Imported {} relationship(s), skipped {}", count, skipped)
    })?;

    Ok(())
}
