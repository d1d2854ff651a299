//! Column metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::SqlType;

/// A reference from a column to a column of another model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Referenced model name.
    pub model: String,
    /// Referenced column name.
    pub column: String,
}

/// A mapped table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,

    #[serde(rename = "type")]
    pub sql_type: SqlType,

    #[serde(default)]
    pub primary_key: bool,

    /// Whether the database generates values for an integer primary key.
    #[serde(default = "default_autoincrement")]
    pub autoincrement: bool,

    /// Explicit nullability. When unset, primary keys are not nullable and
    /// every other column is.
    #[serde(default)]
    pub nullable: Option<bool>,

    /// MySQL `UNSIGNED` attribute for integer columns.
    #[serde(default)]
    pub unsigned: bool,

    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,

    /// SQL expression evaluated by the database on insert (`now()`, ...).
    #[serde(default)]
    pub server_default: Option<String>,

    /// Client-side default value applied on insert.
    #[serde(default)]
    pub default: Option<Value>,

    #[serde(default)]
    pub doc: Option<String>,
}

fn default_autoincrement() -> bool {
    true
}

impl Column {
    /// Creates a nullable, non-key column.
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            primary_key: false,
            autoincrement: true,
            nullable: None,
            unsigned: false,
            foreign_keys: Vec::new(),
            server_default: None,
            default: None,
            doc: None,
        }
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = Some(false);
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    #[must_use]
    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    #[must_use]
    pub fn no_autoincrement(mut self) -> Self {
        self.autoincrement = false;
        self
    }

    /// Adds a foreign key to `model.column`.
    #[must_use]
    pub fn foreign_key(mut self, model: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_keys.push(ForeignKey {
            model: model.into(),
            column: column.into(),
        });
        self
    }

    #[must_use]
    pub fn server_default(mut self, expr: impl Into<String>) -> Self {
        self.server_default = Some(expr.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Returns whether the column accepts NULL.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(!self.primary_key)
    }

    /// Returns whether the column is a primary key or carries a foreign key.
    #[must_use]
    pub fn is_key(&self) -> bool {
        self.primary_key || !self.foreign_keys.is_empty()
    }

    #[must_use]
    pub fn is_foreign_key(&self) -> bool {
        !self.foreign_keys.is_empty()
    }

    /// Returns whether a value is supplied when the column is omitted on
    /// insert.
    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default.is_some() || self.server_default.is_some()
    }

    /// Returns whether the database generates this column's value: an
    /// autoincrement integer primary key that is not also a foreign key.
    #[must_use]
    pub fn is_autoincrement_pk(&self) -> bool {
        self.primary_key
            && self.autoincrement
            && self.foreign_keys.is_empty()
            && self.sql_type.is_integer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullability_defaults() {
        let id = Column::new("id", SqlType::Integer).primary_key();
        assert!(!id.is_nullable());

        let name = Column::new("name", SqlType::String);
        assert!(name.is_nullable());

        let name = name.not_null();
        assert!(!name.is_nullable());
    }

    #[test]
    fn test_key_columns() {
        let author = Column::new("author_id", SqlType::Integer).foreign_key("User", "id");
        assert!(author.is_key());
        assert!(author.is_foreign_key());
        assert!(!author.is_autoincrement_pk());

        let id = Column::new("id", SqlType::Integer).primary_key();
        assert!(id.is_autoincrement_pk());

        let code = Column::new("code", SqlType::String).primary_key();
        assert!(!code.is_autoincrement_pk());

        let manual = Column::new("id", SqlType::Integer)
            .primary_key()
            .no_autoincrement();
        assert!(!manual.is_autoincrement_pk());
    }

    #[test]
    fn test_deserialize_column() {
        let column: Column = toml::from_str(
            r#"
            name = "created_at"
            type = "date_time"
            nullable = false
            server_default = "now()"
            "#,
        )
        .unwrap();

        assert_eq!(column.sql_type, SqlType::DateTime);
        assert!(column.autoincrement);
        assert!(!column.is_nullable());
        assert!(column.has_default());
    }
}
