//! Entity commands
//!
//! Entity rows normally belong to the host application; these commands seed
//! and inspect them when the store is used standalone.

use clap::{Args, Subcommand};

use crate::commands::parse_guid;
use crate::output::{emit, entity_line};
use crate::{AppContext, Cli};
use kinship_core::{AccessId, Entity, Guid, Ulid};

#[derive(Args)]
pub struct EntityArgs {
    #[command(subcommand)]
    pub command: EntityCommands,
}

#[derive(Subcommand)]
pub enum EntityCommands {
    /// Insert or replace an entity row
    Put {
        /// Entity guid
        #[arg(value_parser = parse_guid)]
        guid: Guid,
        /// Entity type
        #[arg(short = 't', long = "type")]
        entity_type: String,
        /// Entity subtype
        #[arg(short, long)]
        subtype: Option<String>,
        /// Owning entity guid
        #[arg(short, long, default_value_t = 0)]
        owner: i64,
        /// Access id
        #[arg(short, long, default_value_t = 0)]
        access: i64,
        /// Portable identifier (generated if omitted)
        #[arg(short, long)]
        uid: Option<Ulid>,
    },
    /// Show an entity by guid or portable identifier
    Get {
        /// Entity guid
        #[arg(value_parser = parse_guid, required_unless_present = "uid")]
        guid: Option<Guid>,
        /// Look up by portable identifier instead
        #[arg(short, long, conflicts_with = "guid")]
        uid: Option<Ulid>,
    },
}

pub async fn run(args: &EntityArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    match &args.command {
        EntityCommands::Put {
            guid,
            entity_type,
            subtype,
            owner,
            access,
            uid,
        } => {
            let mut entity = Entity::new(*guid, entity_type.as_str())
                .with_owner(Guid(*owner))
                .with_access(AccessId(*access));
            if let Some(subtype) = subtype {
                entity = entity.with_subtype(subtype.as_str());
            }
            if let Some(uid) = uid {
                entity = entity.with_uid(*uid);
            }

            ctx.storage.save_entity(&entity).await?;
            tracing::info!("Saved entity {} ({})", entity.guid, entity.uid);
            emit(&entity, cli.format, |e| format!("Saved entity {}", entity_line(e)))?;
        }
        EntityCommands::Get { guid, uid } => {
            let found = match (guid, uid) {
                (_, Some(uid)) => ctx.storage.get_entity_by_uid(uid).await?,
                (Some(guid), None) => ctx.storage.get_entity(*guid).await?,
                (None, None) => anyhow::bail!("Provide a guid or --uid"),
            };
            let Some(entity) = found else {
                anyhow::bail!("Entity not found");
            };
            emit(&entity, cli.format, entity_line)?;
        }
    }

    Ok(())
}
