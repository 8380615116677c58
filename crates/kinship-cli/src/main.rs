//! Kinship CLI - Command line interface for the relationship graph store

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{completions, config as config_cmd, edge, entity, io, query};
use config::{BackendKind, Config};
use kinship_storage::{MemoryStorage, StorageBackend};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "kinship")]
#[command(author, version, about = "Directed, labeled relationships between entities")]
pub struct Cli {
    /// Data directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Storage backend
    #[arg(short, long, global = true)]
    pub backend: Option<BackendKind>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage edges
    Edge(edge::EdgeArgs),
    /// Manage entity rows
    Entity(entity::EntityArgs),
    /// Find entities related to an entity
    Query(query::QueryArgs),
    /// Export relationships rooted at an entity
    Export(io::ExportArgs),
    /// Import relationship documents
    Import(io::ImportArgs),
    /// Manage configuration
    Config(config_cmd::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Application context with storage backend
pub struct AppContext {
    pub storage: Arc<dyn StorageBackend>,
    pub config: Config,
}

impl AppContext {
    pub async fn new(cli: &Cli, config: Config) -> anyhow::Result<Self> {
        let backend = cli.backend.unwrap_or(config.backend);
        let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.data_dir.clone());

        let storage: Arc<dyn StorageBackend> = match backend {
            BackendKind::Memory => Arc::new(MemoryStorage::new()),
            BackendKind::Sqlite => {
                std::fs::create_dir_all(&data_dir)?;
                let db_path = data_dir.join("kinship.db");
                tracing::debug!("Using database at: {:?}", db_path);
                open_sqlite(&db_path, &config.table_prefix)?
            }
            BackendKind::Redb => {
                std::fs::create_dir_all(&data_dir)?;
                let db_path = data_dir.join("kinship.redb");
                tracing::debug!("Using database at: {:?}", db_path);
                open_redb(&db_path)?
            }
        };
        storage.initialize().await?;

        Ok(Self { storage, config })
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(path: &std::path::Path, prefix: &str) -> anyhow::Result<Arc<dyn StorageBackend>> {
    Ok(Arc::new(kinship_storage::SqliteStorage::open_with_prefix(path, prefix)?))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_path: &std::path::Path, _prefix: &str) -> anyhow::Result<Arc<dyn StorageBackend>> {
    anyhow::bail!("SQLite backend not enabled. Rebuild with --features sqlite")
}

#[cfg(feature = "redb")]
fn open_redb(path: &std::path::Path) -> anyhow::Result<Arc<dyn StorageBackend>> {
    Ok(Arc::new(kinship_storage::RedbStorage::open(path)?))
}

#[cfg(not(feature = "redb"))]
fn open_redb(_path: &std::path::Path) -> anyhow::Result<Arc<dyn StorageBackend>> {
    anyhow::bail!("ReDB backend not enabled. Rebuild with --features redb")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting kinship CLI");

    // These never touch storage
    match &cli.command {
        Commands::Config(args) => return config_cmd::run(args),
        Commands::Completions(args) => return completions::run(args),
        _ => {}
    }

    let config = Config::load()?;
    let ctx = AppContext::new(&cli, config).await?;

    match &cli.command {
        Commands::Edge(args) => edge::run(args, &cli, &ctx).await?,
        Commands::Entity(args) => entity::run(args, &cli, &ctx).await?,
        Commands::Query(args) => query::run(args, &cli, &ctx).await?,
        Commands::Export(args) => io::run_export(args, &cli, &ctx).await?,
        Commands::Import(args) => io::run_import(args, &cli, &ctx).await?,
        Commands::Config(_) | Commands::Completions(_) => {}
    }

    ctx.storage.close().await?;
    Ok(())
}
