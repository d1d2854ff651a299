//! Data types exchanged with a [`crate::ModelStore`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored row: column name to JSON value.
pub type Row = Map<String, Value>;

/// Primary key of a row.
///
/// `values` holds one entry per primary key column, in the model's column
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowKey {
    pub model: String,
    pub values: Vec<Value>,
}

impl RowKey {
    pub fn new(model: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            values,
        }
    }

    /// Renders the key values the way they appear in error messages: a
    /// single value as itself, several as a JSON array.
    #[must_use]
    pub fn id(&self) -> String {
        match self.values.as_slice() {
            [single] => render_value(single),
            many => Value::Array(many.to_vec()).to_string(),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.model, self.id())
    }
}

/// Renders a scalar without JSON string quotes.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A row to insert together with related rows created in the same call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance {
    pub model: String,
    pub values: Row,
    /// Related rows, keyed by relationship name on `model`.
    pub children: Vec<Attached>,
}

/// A related instance attached through a relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct Attached {
    pub relationship: String,
    pub instance: Instance,
}

impl Instance {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            values: Row::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, column: impl Into<String>, value: Value) -> Self {
        self.values.insert(column.into(), value);
        self
    }

    #[must_use]
    pub fn with_values(mut self, values: Row) -> Self {
        self.values.extend(values);
        self
    }

    #[must_use]
    pub fn attach(mut self, relationship: impl Into<String>, instance: Instance) -> Self {
        self.children.push(Attached {
            relationship: relationship.into(),
            instance,
        });
        self
    }
}

/// Comparison applied to a column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// Value is a JSON array of candidates.
    In,
    /// Value is a boolean: `true` matches NULL, `false` matches non-NULL.
    IsNull,
    /// SQL `LIKE` with `%` and `_` wildcards.
    Like,
}

/// A row predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// All of the nested filters hold. An empty list always holds.
    And(Vec<Filter>),
    /// A column comparison.
    Compare {
        column: String,
        op: Comparator,
        value: Value,
    },
    /// Some row reached through `relationship` satisfies `filter`.
    Related {
        relationship: String,
        filter: Box<Filter>,
    },
}

impl Filter {
    pub fn compare(column: impl Into<String>, op: Comparator, value: Value) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            value,
        }
    }

    pub fn related(relationship: impl Into<String>, filter: Filter) -> Self {
        Self::Related {
            relationship: relationship.into(),
            filter: Box::new(filter),
        }
    }

    /// Combines filters with `And`, flattening trivial cases.
    #[must_use]
    pub fn all(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            filters.remove(0)
        } else {
            Self::And(filters)
        }
    }
}

/// Sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// A query over the rows of one model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Column equality constraints.
    pub filter_by: Row,
    pub filter: Option<Filter>,
    pub order_by: Vec<OrderBy>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_filter_by(mut self, column: impl Into<String>, value: Value) -> Self {
        self.filter_by.insert(column.into(), value);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Rows returned by a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// The requested page.
    pub rows: Vec<Row>,
    /// Number of rows matching the query before offset and limit.
    pub total: usize,
}

impl QueryResult {
    #[must_use]
    pub fn new(rows: Vec<Row>, total: usize) -> Self {
        Self { rows, total }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_row_key_display() {
        let key = RowKey::new("User", vec![json!(3)]);
        assert_eq!(key.to_string(), "User/3");

        let key = RowKey::new("Tag", vec![json!("rust")]);
        assert_eq!(key.id(), "rust");

        let key = RowKey::new("Membership", vec![json!(1), json!("admin")]);
        assert_eq!(key.id(), r#"[1,"admin"]"#);
    }

    #[test]
    fn test_filter_all() {
        let single = Filter::all(vec![Filter::compare("age", Comparator::Gt, json!(3))]);
        assert!(matches!(single, Filter::Compare { .. }));

        let empty = Filter::all(Vec::new());
        assert_eq!(empty, Filter::And(Vec::new()));
    }

    #[test]
    fn test_instance_builder() {
        let post = Instance::new("Post")
            .with_value("title", json!("Hello"))
            .attach("author", Instance::new("User").with_value("name", json!("Ann")));

        assert_eq!(post.values.get("title"), Some(&json!("Hello")));
        assert_eq!(post.children.len(), 1);
        assert_eq!(post.children[0].relationship, "author");
    }
}
