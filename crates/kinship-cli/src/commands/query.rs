//! Relationship query command

use clap::Args;

use crate::output::{emit, entity_table};
use crate::{AppContext, Cli};
use kinship_core::limits::validate_query_limit;
use kinship_core::{AccessId, Guid, OrderBy, QueryContext, RelationshipQuery};

#[derive(Args)]
pub struct QueryArgs {
    /// Relationship label ("" matches any)
    pub relationship: String,

    /// Anchor entity guid (0 matches any)
    pub guid: i64,

    /// Return the guid_one side of edges pointing at the anchor
    #[arg(short, long)]
    pub inverse: bool,

    /// Filter by entity type
    #[arg(short = 't', long = "type")]
    pub entity_type: Option<String>,

    /// Filter by entity subtype
    #[arg(short, long)]
    pub subtype: Option<String>,

    /// Filter by owner guid
    #[arg(long)]
    pub owner: Option<i64>,

    /// Ordering, e.g. "time_created desc"
    #[arg(long, default_value_t = OrderBy::default())]
    pub order: OrderBy,

    /// Maximum results (defaults to the configured limit)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Results to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Requesting identity (defaults to the configured identity)
    #[arg(long)]
    pub identity: Option<i64>,

    /// Visible access ids (defaults to the configured visibility)
    #[arg(short, long = "access")]
    pub access: Vec<i64>,
}

impl QueryArgs {
    fn build(&self, ctx: &AppContext) -> anyhow::Result<(RelationshipQuery, QueryContext)> {
        let limit = self.limit.unwrap_or(ctx.config.default_limit);
        validate_query_limit(limit)?;

        let mut query = RelationshipQuery::new(&self.relationship, Guid(self.guid))
            .inverse(self.inverse)
            .order_by(self.order)
            .with_limit(limit)
            .with_offset(self.offset);
        if let Some(ref t) = self.entity_type {
            query = query.with_type(t);
        }
        if let Some(ref s) = self.subtype {
            query = query.with_subtype(s);
        }
        if let Some(owner) = self.owner {
            query = query.owned_by(Guid(owner));
        }

        let access = if self.access.is_empty() {
            &ctx.config.visibility
        } else {
            &self.access
        };
        let scope = QueryContext::new(Guid(self.identity.unwrap_or(ctx.config.identity)))
            .with_visibility(access.iter().copied().map(AccessId));

        Ok((query, scope))
    }
}

pub async fn run(args: &QueryArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let (query, scope) = args.build(ctx)?;
    tracing::debug!(
        "Query '{}' from {} (inverse: {}, order: {})",
        query.relationship,
        args.guid,
        query.inverse,
        query.order_by
    );

    let entities = ctx.storage.find_entities_by_relationship(&query, &scope).await?;
    tracing::info!("Found {} entities", entities.len());

    emit(entities.as_slice(), cli.format, entity_table)
}
