//! Relationship query types and in-process evaluation

use crate::edge::{EdgeId, EdgeRecord};
use crate::entity::{AccessId, Entity, Guid};
use crate::error::Error;
use crate::limits::{sanitize_relationship, DEFAULT_QUERY_LIMIT, MAX_QUERY_LIMIT};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Columns a relationship query may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderColumn {
    /// Entity creation time
    #[default]
    TimeCreated,
    /// Entity guid
    Guid,
    /// Entity type
    Type,
    /// Entity owner
    OwnerGuid,
    /// Edge creation time
    EdgeTimeCreated,
    /// Edge surrogate id
    EdgeId,
}

impl OrderColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeCreated => "time_created",
            Self::Guid => "guid",
            Self::Type => "type",
            Self::OwnerGuid => "owner_guid",
            Self::EdgeTimeCreated => "r.time_created",
            Self::EdgeId => "r.id",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        let column = match s.to_ascii_lowercase().as_str() {
            "time_created" | "e.time_created" => Self::TimeCreated,
            "guid" | "e.guid" => Self::Guid,
            "type" | "e.type" => Self::Type,
            "owner_guid" | "e.owner_guid" => Self::OwnerGuid,
            "r.time_created" | "edge_time_created" => Self::EdgeTimeCreated,
            "r.id" | "edge_id" => Self::EdgeId,
            _ => return None,
        };
        Some(column)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Ordering for relationship queries, restricted to known columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: OrderColumn,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn new(column: OrderColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    pub fn asc(column: OrderColumn) -> Self {
        Self::new(column, SortDirection::Asc)
    }

    pub fn desc(column: OrderColumn) -> Self {
        Self::new(column, SortDirection::Desc)
    }
}

impl std::fmt::Display for OrderBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.column.as_str(), self.direction.as_str())
    }
}

impl std::str::FromStr for OrderBy {
    type Err = Error;

    /// Parse `"<column> [asc|desc]"`; anything else is rejected
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let column = parts
            .next()
            .and_then(OrderColumn::parse)
            .ok_or_else(|| Error::InvalidOrder(s.to_string()))?;

        let direction = match parts.next().map(|d| d.to_ascii_lowercase()) {
            None => SortDirection::Asc,
            Some(d) if d == "asc" => SortDirection::Asc,
            Some(d) if d == "desc" => SortDirection::Desc,
            Some(_) => return Err(Error::InvalidOrder(s.to_string())),
        };

        if parts.next().is_some() {
            return Err(Error::InvalidOrder(s.to_string()));
        }

        Ok(Self { column, direction })
    }
}

/// Query for entities related to an anchor entity by a labeled edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipQuery {
    /// Edge label; empty matches any label
    #[serde(default)]
    pub relationship: String,

    /// Anchor entity; `None` matches edges from any entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_guid: Option<Guid>,

    /// When false the anchor is `guid_one` and results are `guid_two` entities;
    /// when true the roles are swapped
    #[serde(default)]
    pub inverse: bool,

    /// Filter by entity type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    /// Filter by entity subtype
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// Filter by entity owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_guid: Option<Guid>,

    #[serde(default)]
    pub order_by: OrderBy,

    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    DEFAULT_QUERY_LIMIT
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

impl Default for RelationshipQuery {
    fn default() -> Self {
        Self {
            relationship: String::new(),
            relationship_guid: None,
            inverse: false,
            entity_type: None,
            subtype: None,
            owner_guid: None,
            order_by: OrderBy::default(),
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl RelationshipQuery {
    /// Query entities related to `guid` by `relationship`
    pub fn new(relationship: &str, guid: Guid) -> Self {
        Self {
            relationship: sanitize_relationship(relationship),
            relationship_guid: Some(guid).filter(Guid::is_set),
            ..Default::default()
        }
    }

    /// Swap the roles of the anchor and the result endpoints
    pub fn inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }

    pub fn with_type(mut self, entity_type: &str) -> Self {
        self.entity_type = non_empty(entity_type);
        self
    }

    pub fn with_subtype(mut self, subtype: &str) -> Self {
        self.subtype = non_empty(subtype);
        self
    }

    pub fn owned_by(mut self, owner_guid: Guid) -> Self {
        self.owner_guid = Some(owner_guid).filter(Guid::is_set);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    /// Set the page size (capped at [`MAX_QUERY_LIMIT`])
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_QUERY_LIMIT);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Endpoint compared against the anchor guid
    pub fn anchor_of(&self, edge: &EdgeRecord) -> Guid {
        if self.inverse {
            edge.guid_two
        } else {
            edge.guid_one
        }
    }

    /// Endpoint whose entity is returned
    pub fn target_of(&self, edge: &EdgeRecord) -> Guid {
        if self.inverse {
            edge.guid_one
        } else {
            edge.guid_two
        }
    }

    /// Label and anchor terms
    pub fn matches_edge(&self, edge: &EdgeRecord) -> bool {
        if !self.relationship.is_empty() && edge.relationship != self.relationship {
            return false;
        }
        match self.relationship_guid {
            Some(guid) => self.anchor_of(edge) == guid,
            None => true,
        }
    }

    /// Type, subtype and owner terms
    pub fn matches_entity(&self, entity: &Entity) -> bool {
        if let Some(ref t) = self.entity_type {
            if entity.entity_type.as_str() != t {
                return false;
            }
        }
        if let Some(ref s) = self.subtype {
            if entity.subtype.as_deref() != Some(s.as_str()) {
                return false;
            }
        }
        if let Some(owner) = self.owner_guid {
            if entity.owner_guid != owner {
                return false;
            }
        }
        true
    }

    fn compare(&self, a: &(EdgeRecord, Entity), b: &(EdgeRecord, Entity)) -> Ordering {
        let primary = match self.order_by.column {
            OrderColumn::TimeCreated => a.1.time_created.cmp(&b.1.time_created),
            OrderColumn::Guid => a.1.guid.cmp(&b.1.guid),
            OrderColumn::Type => a.1.entity_type.cmp(&b.1.entity_type),
            OrderColumn::OwnerGuid => a.1.owner_guid.cmp(&b.1.owner_guid),
            OrderColumn::EdgeTimeCreated => a.0.time_created.cmp(&b.0.time_created),
            OrderColumn::EdgeId => a.0.id.cmp(&b.0.id),
        };
        let ordering = primary
            .then_with(|| a.1.guid.cmp(&b.1.guid))
            .then_with(|| a.0.id.unwrap_or(EdgeId(0)).cmp(&b.0.id.unwrap_or(EdgeId(0))));

        match self.order_by.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// Evaluate the query over a set of edges.
    ///
    /// `lookup` resolves a guid to a live entity; edges whose result endpoint
    /// does not resolve are dropped, as an inner join would drop them. One
    /// entity is returned per matching edge.
    pub fn evaluate<'a, I, F, E>(&self, ctx: &QueryContext, edges: I, mut lookup: F) -> Result<Vec<Entity>, E>
    where
        I: IntoIterator<Item = &'a EdgeRecord>,
        F: FnMut(Guid) -> Result<Option<Entity>, E>,
    {
        let mut rows = Vec::new();
        for edge in edges.into_iter().filter(|e| self.matches_edge(e)) {
            let Some(entity) = lookup(self.target_of(edge))? else {
                continue;
            };
            if self.matches_entity(&entity) && ctx.can_see(&entity) {
                rows.push((edge.clone(), entity));
            }
        }

        rows.sort_by(|a, b| self.compare(a, b));

        Ok(rows
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .map(|(_, entity)| entity)
            .collect())
    }
}

/// Caller scope for queries: the visibility set and the requesting identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    #[serde(default)]
    pub visibility: BTreeSet<AccessId>,
    #[serde(default)]
    pub identity: Guid,
}

impl QueryContext {
    pub fn new(identity: Guid) -> Self {
        Self {
            visibility: BTreeSet::new(),
            identity,
        }
    }

    pub fn with_access(mut self, access_id: AccessId) -> Self {
        self.visibility.insert(access_id);
        self
    }

    pub fn with_visibility(mut self, access_ids: impl IntoIterator<Item = AccessId>) -> Self {
        self.visibility.extend(access_ids);
        self
    }

    /// Inside the visibility set, or unrestricted and owned by the requester
    pub fn can_see(&self, entity: &Entity) -> bool {
        self.visibility.contains(&entity.access_id)
            || (entity.access_id == AccessId::UNRESTRICTED
                && self.identity.is_set()
                && entity.owner_guid == self.identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;
    use std::convert::Infallible;

    fn edge(id: i64, one: i64, rel: &str, two: i64) -> EdgeRecord {
        let mut e = EdgeRecord::new(Guid(one), rel, Guid(two));
        e.id = Some(EdgeId(id));
        e
    }

    fn fixture() -> (Vec<EdgeRecord>, HashMap<Guid, Entity>) {
        let base = Utc::now();
        let entities = [
            Entity::new(Guid(10), "group").with_access(AccessId(2)).created_at(base),
            Entity::new(Guid(11), "group")
                .with_access(AccessId(2))
                .created_at(base + Duration::seconds(5)),
            Entity::new(Guid(12), "user").with_access(AccessId(2)).created_at(base),
            Entity::new(Guid(13), "group").with_access(AccessId(9)).created_at(base),
            Entity::new(Guid(14), "group")
                .with_access(AccessId::UNRESTRICTED)
                .with_owner(Guid(42))
                .created_at(base + Duration::seconds(1)),
            Entity::new(Guid(42), "user").with_access(AccessId(2)).created_at(base),
        ];
        let edges = vec![
            edge(1, 42, "member_of", 10),
            edge(2, 42, "member_of", 11),
            edge(3, 42, "member_of", 12),
            edge(4, 42, "member_of", 13),
            edge(5, 42, "member_of", 14),
            edge(6, 42, "friend", 10),
            edge(7, 42, "member_of", 999),
            edge(8, 10, "member_of", 42),
        ];
        (edges, entities.into_iter().map(|e| (e.guid, e)).collect())
    }

    fn run(query: &RelationshipQuery, ctx: &QueryContext) -> Vec<i64> {
        let (edges, entities) = fixture();
        query
            .evaluate(ctx, &edges, |g| Ok::<_, Infallible>(entities.get(&g).cloned()))
            .unwrap()
            .into_iter()
            .map(|e| e.guid.0)
            .collect()
    }

    #[test]
    fn test_order_by_parse() {
        let order: OrderBy = "time_created desc".parse().unwrap();
        assert_eq!(order, OrderBy::desc(OrderColumn::TimeCreated));

        let order: OrderBy = "GUID".parse().unwrap();
        assert_eq!(order, OrderBy::asc(OrderColumn::Guid));

        let order: OrderBy = "r.time_created ASC".parse().unwrap();
        assert_eq!(order, OrderBy::asc(OrderColumn::EdgeTimeCreated));
    }

    #[test]
    fn test_order_by_rejects_expressions() {
        assert!("time_created desc; drop table x".parse::<OrderBy>().is_err());
        assert!("(select 1)".parse::<OrderBy>().is_err());
        assert!("guid sideways".parse::<OrderBy>().is_err());
        assert!("".parse::<OrderBy>().is_err());
    }

    #[test]
    fn test_order_by_display_round_trip() {
        let order = OrderBy::desc(OrderColumn::OwnerGuid);
        assert_eq!(order.to_string().parse::<OrderBy>().unwrap(), order);
    }

    #[test]
    fn test_query_builder_skips_empty_terms() {
        let query = RelationshipQuery::new("", Guid(0))
            .with_type("")
            .with_subtype("  ")
            .owned_by(Guid(0))
            .with_limit(5000);

        assert!(query.relationship.is_empty());
        assert!(query.relationship_guid.is_none());
        assert!(query.entity_type.is_none());
        assert!(query.subtype.is_none());
        assert!(query.owner_guid.is_none());
        assert_eq!(query.limit, MAX_QUERY_LIMIT);
    }

    #[test]
    fn test_type_filters_are_only_trimmed() {
        let long = "s".repeat(80);
        let query = RelationshipQuery::new("friend", Guid(1))
            .with_type(" group ")
            .with_subtype(&long);

        assert_eq!(query.entity_type.as_deref(), Some("group"));
        assert_eq!(query.subtype.as_deref(), Some(long.as_str()));
    }

    #[test]
    fn test_forward_query() {
        let ctx = QueryContext::new(Guid(42)).with_access(AccessId(2));
        let query = RelationshipQuery::new("member_of", Guid(42)).with_type("group");

        // 13 is outside the visibility set, 999 is dangling, 12 is a user
        assert_eq!(run(&query, &ctx), vec![11, 14, 10]);
    }

    #[test]
    fn test_inverse_query() {
        let ctx = QueryContext::new(Guid(42)).with_access(AccessId(2));
        let query = RelationshipQuery::new("member_of", Guid(42)).inverse(true);

        assert_eq!(run(&query, &ctx), vec![10]);
    }

    #[test]
    fn test_empty_relationship_matches_any_label() {
        let ctx = QueryContext::new(Guid(42)).with_access(AccessId(2));
        let query = RelationshipQuery::new("", Guid(42))
            .with_type("group")
            .order_by(OrderBy::asc(OrderColumn::EdgeId))
            .with_limit(100);

        assert_eq!(run(&query, &ctx), vec![10, 11, 14, 10]);
    }

    #[test]
    fn test_unrestricted_needs_owner_match() {
        let query = RelationshipQuery::new("member_of", Guid(42)).with_type("group");

        let stranger = QueryContext::new(Guid(77)).with_access(AccessId(2));
        assert_eq!(run(&query, &stranger), vec![11, 10]);

        let anonymous = QueryContext::default();
        assert!(run(&query, &anonymous).is_empty());
    }

    #[test]
    fn test_pagination() {
        let ctx = QueryContext::new(Guid(42)).with_access(AccessId(2));
        let query = RelationshipQuery::new("member_of", Guid(42))
            .order_by(OrderBy::asc(OrderColumn::Guid))
            .with_limit(2)
            .with_offset(1);

        assert_eq!(run(&query, &ctx), vec![11, 12]);
    }

    #[test]
    fn test_owner_and_subtype_filters() {
        let ctx = QueryContext::new(Guid(42)).with_access(AccessId(2));

        let owned = RelationshipQuery::new("member_of", Guid(42)).owned_by(Guid(42));
        assert_eq!(run(&owned, &ctx), vec![14]);

        let club = RelationshipQuery::new("member_of", Guid(42)).with_subtype("club");
        assert!(run(&club, &ctx).is_empty());
    }

    #[test]
    fn test_lookup_errors_propagate() {
        let (edges, _) = fixture();
        let ctx = QueryContext::new(Guid(42));
        let query = RelationshipQuery::new("member_of", Guid(42));

        let result = query.evaluate(&ctx, &edges, |_| Err::<Option<Entity>, _>("boom"));
        assert_eq!(result, Err("boom"));
    }
}
