//! Relay connection resolvers.
//!
//! Implements the instrumented plural root fields such as
//! `users(first: 10, after: "...", filter: {...}, orderBy: ["name desc"])`
//! and to-many relationship fields backed by a connection. Cursors encode
//! the row offset (`arrayconnection:{offset}`), so pages are sliced the way
//! the Relay array connection does it.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext, ValueAccessor};
use async_graphql::indexmap::IndexMap;
use async_graphql::{Name, Value};
use ormgraph_storage::Row;
use tracing::{debug, warn};

use super::{
    SchemaIndex, get_graphql_context, parent_row, storage_error_to_graphql, value_accessor_to_json,
};
use crate::config::GraphQLConfig;
use crate::error::GraphQLError;
use crate::query::{QueryArgs, convert_to_query};
use crate::types::{cursor_to_offset, offset_to_cursor};

/// Pagination arguments with cursors decoded to offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageArgs {
    pub first: Option<usize>,
    pub last: Option<usize>,
    pub before: Option<usize>,
    pub after: Option<usize>,
}

impl PageArgs {
    /// Reads `first`, `last`, `before` and `after` from the field arguments.
    ///
    /// When neither `first` nor `last` is given, `first` defaults to the
    /// configured page size.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::Validation` for negative counts, counts above
    /// the configured maximum and malformed cursors.
    pub fn from_context(ctx: &ResolverContext<'_>, config: &GraphQLConfig) -> crate::Result<Self> {
        let mut args = Self {
            first: count_arg(ctx, "first", config.max_page_size)?,
            last: count_arg(ctx, "last", config.max_page_size)?,
            before: cursor_arg(ctx, "before")?,
            after: cursor_arg(ctx, "after")?,
        };
        if args.first.is_none() && args.last.is_none() {
            args.first = Some(config.default_page_size);
        }
        Ok(args)
    }
}

fn present<'a>(ctx: &'a ResolverContext<'_>, name: &str) -> Option<ValueAccessor<'a>> {
    ctx.args.get(name).filter(|value| !value.is_null())
}

fn count_arg(ctx: &ResolverContext<'_>, name: &str, max: usize) -> crate::Result<Option<usize>> {
    let Some(value) = present(ctx, name) else {
        return Ok(None);
    };
    let count = value
        .i64()
        .ok()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            GraphQLError::Validation(format!("Argument {name} must be a non-negative integer"))
        })?;
    if count > max {
        return Err(GraphQLError::Validation(format!(
            "Argument {name} must not exceed {max}, got {count}"
        )));
    }
    Ok(Some(count))
}

fn cursor_arg(ctx: &ResolverContext<'_>, name: &str) -> crate::Result<Option<usize>> {
    let Some(value) = present(ctx, name) else {
        return Ok(None);
    };
    let offset = value
        .string()
        .ok()
        .and_then(cursor_to_offset)
        .ok_or_else(|| GraphQLError::Validation(format!("Argument {name} is not a valid cursor")))?;
    Ok(Some(offset))
}

/// The window `[start, end)` of a list selected by [`PageArgs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    pub start: usize,
    pub end: usize,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl PageSlice {
    /// Computes the window over a list of `total` rows.
    #[must_use]
    pub fn compute(args: &PageArgs, total: usize) -> Self {
        let lower_bound = args.after.map_or(0, |after| after.saturating_add(1));
        let upper_bound = args.before.map_or(total, |before| before.min(total));

        let start = lower_bound.min(total);
        let mut end = upper_bound.max(start);
        if let Some(first) = args.first {
            end = end.min(start.saturating_add(first));
        }
        let mut start = start;
        if let Some(last) = args.last {
            start = start.max(end.saturating_sub(last));
        }

        Self {
            start,
            end,
            has_previous_page: args.last.is_some() && start > lower_bound,
            has_next_page: args.first.is_some() && end < upper_bound,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One resolved page of a connection, the parent value of
/// `{Type}Connection` fields.
#[derive(Debug, Clone)]
pub struct ConnectionPage {
    pub rows: Vec<Row>,
    pub slice: PageSlice,
    pub total: usize,
}

impl ConnectionPage {
    /// Builds a page from all rows of a list.
    #[must_use]
    pub fn from_all(mut rows: Vec<Row>, args: &PageArgs) -> Self {
        let total = rows.len();
        let slice = PageSlice::compute(args, total);
        rows.truncate(slice.end);
        let rows = rows.split_off(slice.start);
        Self { rows, slice, total }
    }

    /// Returns the `(cursor, row)` pairs of the page.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.rows.iter().enumerate().map(|(i, row)| Edge {
            cursor: offset_to_cursor(self.slice.start + i),
            node: row.clone(),
        })
    }

    /// The `PageInfo` value of the page.
    #[must_use]
    pub fn page_info(&self) -> Value {
        let cursor = |offset: usize| Value::String(offset_to_cursor(offset));
        let (start_cursor, end_cursor) = if self.slice.is_empty() {
            (Value::Null, Value::Null)
        } else {
            (cursor(self.slice.start), cursor(self.slice.end - 1))
        };

        let mut info = IndexMap::new();
        info.insert(Name::new("hasNextPage"), Value::Boolean(self.slice.has_next_page));
        info.insert(Name::new("hasPreviousPage"), Value::Boolean(self.slice.has_previous_page));
        info.insert(Name::new("startCursor"), start_cursor);
        info.insert(Name::new("endCursor"), end_cursor);
        Value::Object(info)
    }
}

/// The parent value of `{Type}Edge` fields.
#[derive(Debug, Clone)]
pub struct Edge {
    pub cursor: String,
    pub node: Row,
}

/// Resolver for connection fields.
pub struct ConnectionResolver;

impl ConnectionResolver {
    /// Creates the resolver of a plural root field over `model`.
    pub fn resolve(
        index: Arc<SchemaIndex>,
        model: String,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let index = Arc::clone(&index);
            let model = model.clone();
            FieldFuture::new(async move {
                let gql_ctx = get_graphql_context(&ctx)?;
                let request_id = gql_ctx.request_id.as_str();
                debug!(request_id = %request_id, model = %model, "Resolving connection query");

                let page_args = PageArgs::from_context(&ctx, &index.config)
                    .map_err(GraphQLError::into_graphql_error)?;
                let query = convert_to_query(&index, &model, &query_args(&ctx)?)
                    .map_err(GraphQLError::into_graphql_error)?;

                // A zero-row query yields the match count.
                let total = gql_ctx
                    .store
                    .query(&model, &query.clone().with_limit(0))
                    .await
                    .map_err(|e| {
                        warn!(
                            request_id = %request_id,
                            error = %e,
                            model = %model,
                            "Storage error during count"
                        );
                        storage_error_to_graphql(e)
                    })?
                    .total;

                let slice = PageSlice::compute(&page_args, total);
                let rows = if slice.is_empty() {
                    Vec::new()
                } else {
                    gql_ctx
                        .store
                        .query(&model, &query.with_offset(slice.start).with_limit(slice.len()))
                        .await
                        .map_err(|e| {
                            warn!(
                                request_id = %request_id,
                                error = %e,
                                model = %model,
                                "Storage error during page query"
                            );
                            storage_error_to_graphql(e)
                        })?
                        .rows
                };

                debug!(
                    request_id = %request_id,
                    model = %model,
                    total = total,
                    start = slice.start,
                    returned = rows.len(),
                    "Connection query complete"
                );

                Ok(Some(FieldValue::owned_any(ConnectionPage { rows, slice, total })))
            })
        }
    }

    /// Creates the resolver of a to-many relationship field rendered as a
    /// connection. Related rows are loaded in full and sliced in memory.
    pub fn related(
        index: Arc<SchemaIndex>,
        model: String,
        relationship: String,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let index = Arc::clone(&index);
            let model = model.clone();
            let relationship = relationship.clone();
            FieldFuture::new(async move {
                let gql_ctx = get_graphql_context(&ctx)?;
                let row = parent_row(&ctx)?;
                let page_args = PageArgs::from_context(&ctx, &index.config)
                    .map_err(GraphQLError::into_graphql_error)?;

                let rows = gql_ctx
                    .store
                    .related(&model, row, &relationship)
                    .await
                    .map_err(storage_error_to_graphql)?;

                Ok(Some(FieldValue::owned_any(ConnectionPage::from_all(rows, &page_args))))
            })
        }
    }

    /// Resolver of `{Type}Connection.edges`.
    pub fn edges(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
        FieldFuture::new(async move {
            let page = page(&ctx)?;
            let edges: Vec<_> = page.edges().map(FieldValue::owned_any).collect();
            Ok(Some(FieldValue::list(edges)))
        })
    }

    /// Resolver of `{Type}Connection.pageInfo`.
    pub fn page_info(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
        FieldFuture::new(async move { Ok(Some(FieldValue::value(page(&ctx)?.page_info()))) })
    }

    /// Resolver of `{Type}Connection.totalCount`.
    pub fn total_count(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
        FieldFuture::new(async move {
            let total = i64::try_from(page(&ctx)?.total).unwrap_or(i64::MAX);
            Ok(Some(FieldValue::value(Value::from(total))))
        })
    }

    /// Resolver of `{Type}Edge.node`.
    pub fn edge_node(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
        FieldFuture::new(async move { Ok(Some(FieldValue::owned_any(edge(&ctx)?.node.clone()))) })
    }

    /// Resolver of `{Type}Edge.cursor`.
    pub fn edge_cursor(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
        FieldFuture::new(async move {
            Ok(Some(FieldValue::value(Value::String(edge(&ctx)?.cursor.clone()))))
        })
    }
}

fn page<'a>(ctx: &'a ResolverContext<'_>) -> Result<&'a ConnectionPage, async_graphql::Error> {
    ctx.parent_value
        .try_downcast_ref::<ConnectionPage>()
        .map_err(|_| async_graphql::Error::new("Parent value is not a connection page"))
}

fn edge<'a>(ctx: &'a ResolverContext<'_>) -> Result<&'a Edge, async_graphql::Error> {
    ctx.parent_value
        .try_downcast_ref::<Edge>()
        .map_err(|_| async_graphql::Error::new("Parent value is not an edge"))
}

/// Reads `filter`, `filterBy` and `orderBy` from the field arguments.
fn query_args(ctx: &ResolverContext<'_>) -> Result<QueryArgs, async_graphql::Error> {
    type JsonObject = serde_json::Map<String, serde_json::Value>;
    let object = |name: &str| -> Result<Option<JsonObject>, async_graphql::Error> {
        match present(ctx, name).map(|value| value_accessor_to_json(&value)) {
            None => Ok(None),
            Some(serde_json::Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(async_graphql::Error::new(format!(
                "Argument {name} must be an input object"
            ))),
        }
    };

    let order_by = match present(ctx, "orderBy") {
        None => Vec::new(),
        Some(value) => match value_accessor_to_json(&value) {
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            serde_json::Value::String(single) => vec![single],
            _ => Vec::new(),
        },
    };

    Ok(QueryArgs {
        filter: object("filter")?,
        filter_by: object("filterBy")?,
        order_by,
    })
}
