//! Per-family naming, field selection and nullability.
//!
//! Every [`FamilyKind`] has one [`FamilyStrategy`]. The trait's default
//! methods describe the plain `Object`/`Input` behavior; the derived families
//! override only the hooks they change.

use std::sync::Arc;

use ormgraph_model::{Column, Model, OrmProperty};

use crate::config::GraphQLConfig;
use crate::convert::FamilyKind;
use crate::types::{DATABASE_ID, NODE};

/// Connection flavor of an object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// `edges` and `pageInfo`.
    Plain,
    /// `Plain` plus `totalCount`.
    Countable,
}

/// Options for generating one schema type.
#[derive(Debug, Clone, Default)]
pub struct TypeOptions {
    /// Type name. Defaults to the model name plus the family suffix.
    pub name: Option<String>,
    /// Type description. Defaults to the model doc.
    pub description: Option<String>,
    /// When non-empty, only these properties become fields.
    pub only_fields: Vec<String>,
    /// Properties left out.
    pub exclude_fields: Vec<String>,
    /// Interfaces implemented by an object type.
    pub interfaces: Vec<String>,
    /// Whether the object type gets a connection. Defaults to `true` when
    /// `Node` is one of its interfaces.
    pub use_connection: Option<bool>,
    /// Connection flavor. Defaults to the family's.
    pub connection: Option<ConnectionKind>,
}

impl TypeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn only_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn exclude_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    #[must_use]
    pub fn use_connection(mut self, use_connection: bool) -> Self {
        self.use_connection = Some(use_connection);
        self
    }

    #[must_use]
    pub fn connection(mut self, connection: ConnectionKind) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Returns whether `only_fields`/`exclude_fields` drop `property`.
    #[must_use]
    pub fn filters_out(&self, property: &str) -> bool {
        (!self.only_fields.is_empty() && !self.only_fields.iter().any(|f| f == property))
            || self.exclude_fields.iter().any(|f| f == property)
    }

    fn has_node(&self) -> bool {
        self.interfaces.iter().any(|i| i == NODE)
    }
}

/// Naming, selection and nullability hooks of one family.
pub trait FamilyStrategy: Send + Sync {
    /// The family this strategy generates.
    fn kind(&self) -> FamilyKind;

    fn type_name(&self, model: &Model, options: &TypeOptions) -> String {
        options
            .name
            .clone()
            .unwrap_or_else(|| format!("{}{}", model.name, self.kind().suffix()))
    }

    /// Returns whether `property` is left out of the type.
    fn ignore_field(
        &self,
        _model: &Model,
        property: &OrmProperty<'_>,
        options: &TypeOptions,
    ) -> bool {
        options.filters_out(property.name())
    }

    /// Returns the field name before camel casing.
    fn field_name(&self, _model: &Model, property: &OrmProperty<'_>) -> String {
        property.name().to_string()
    }

    fn is_nullable(&self, property: &OrmProperty<'_>) -> bool {
        match property {
            OrmProperty::Column(column) => column.is_nullable(),
            _ => true,
        }
    }

    fn interfaces(&self, options: &TypeOptions) -> Vec<String> {
        options.interfaces.clone()
    }

    fn connection(&self, _options: &TypeOptions) -> Option<ConnectionKind> {
        None
    }
}

/// Shared strategy handle.
pub type DynStrategy = Arc<dyn FamilyStrategy>;

/// Builds the strategy of every family.
#[must_use]
pub fn default_strategies(config: &GraphQLConfig) -> Vec<DynStrategy> {
    let auto_fields = config.auto_timestamp_fields.clone();
    vec![
        Arc::new(ObjectStrategy),
        Arc::new(FilterObjectStrategy),
        Arc::new(InputStrategy),
        Arc::new(CreateInputStrategy {
            auto_fields: auto_fields.clone(),
        }),
        Arc::new(EditInputStrategy { auto_fields }),
        Arc::new(KeysInputStrategy {
            kind: FamilyKind::KeysInput,
        }),
        Arc::new(KeysInputStrategy {
            kind: FamilyKind::DeleteInput,
        }),
        Arc::new(FilterInputStrategy),
        Arc::new(FilterByInputStrategy),
    ]
}

/// Object types.
#[derive(Debug, Clone, Copy)]
pub struct ObjectStrategy;

impl FamilyStrategy for ObjectStrategy {
    fn kind(&self) -> FamilyKind {
        FamilyKind::Object
    }

    fn connection(&self, options: &TypeOptions) -> Option<ConnectionKind> {
        options
            .use_connection
            .unwrap_or_else(|| options.has_node())
            .then(|| options.connection.unwrap_or(ConnectionKind::Plain))
    }
}

/// Object types exposing the database id as `db_id` next to the global id.
///
/// They implement `Node` and `DatabaseId`.
#[derive(Debug, Clone, Copy)]
pub struct FilterObjectStrategy;

impl FamilyStrategy for FilterObjectStrategy {
    fn kind(&self) -> FamilyKind {
        FamilyKind::FilterObject
    }

    fn field_name(&self, _model: &Model, property: &OrmProperty<'_>) -> String {
        match property {
            OrmProperty::Column(column) if column.name == "id" && column.is_autoincrement_pk() => {
                "db_id".to_string()
            }
            other => other.name().to_string(),
        }
    }

    fn interfaces(&self, options: &TypeOptions) -> Vec<String> {
        let mut interfaces = options.interfaces.clone();
        for required in [NODE, DATABASE_ID] {
            if !interfaces.iter().any(|i| i == required) {
                interfaces.push(required.to_string());
            }
        }
        interfaces
    }

    fn connection(&self, options: &TypeOptions) -> Option<ConnectionKind> {
        options
            .use_connection
            .unwrap_or(true)
            .then(|| options.connection.unwrap_or(ConnectionKind::Countable))
    }
}

/// Plain input objects.
#[derive(Debug, Clone, Copy)]
pub struct InputStrategy;

impl FamilyStrategy for InputStrategy {
    fn kind(&self) -> FamilyKind {
        FamilyKind::Input
    }

    fn ignore_field(
        &self,
        _model: &Model,
        property: &OrmProperty<'_>,
        options: &TypeOptions,
    ) -> bool {
        matches!(property, OrmProperty::Computed(_)) || options.filters_out(property.name())
    }
}

/// Fields generated by the database are left out of create and edit inputs.
fn is_generated(column: &Column, auto_fields: &[String]) -> bool {
    column.is_autoincrement_pk()
        || (column.server_default.is_some() && auto_fields.iter().any(|f| *f == column.name))
}

fn ignore_writable(
    property: &OrmProperty<'_>,
    options: &TypeOptions,
    auto_fields: &[String],
) -> bool {
    match property {
        OrmProperty::Computed(_) => true,
        OrmProperty::Column(column) if is_generated(column, auto_fields) => true,
        other => options.filters_out(other.name()),
    }
}

/// `attach_to_{relationship}` for foreign keys and `create_and_attach_to_{key}`
/// for relationships.
fn writable_field_name(model: &Model, property: &OrmProperty<'_>) -> String {
    match property {
        OrmProperty::Column(column) if column.is_foreign_key() => {
            let target = model
                .relationship_for_column(&column.name)
                .map(|rel| rel.key.as_str())
                .unwrap_or_else(|| column.name.strip_suffix("_id").unwrap_or(&column.name));
            format!("attach_to_{target}")
        }
        OrmProperty::Relationship(rel) => format!("create_and_attach_to_{}", rel.key),
        other => other.name().to_string(),
    }
}

/// Create inputs.
#[derive(Debug, Clone)]
pub struct CreateInputStrategy {
    pub auto_fields: Vec<String>,
}

impl FamilyStrategy for CreateInputStrategy {
    fn kind(&self) -> FamilyKind {
        FamilyKind::CreateInput
    }

    fn ignore_field(
        &self,
        _model: &Model,
        property: &OrmProperty<'_>,
        options: &TypeOptions,
    ) -> bool {
        ignore_writable(property, options, &self.auto_fields)
    }

    fn field_name(&self, model: &Model, property: &OrmProperty<'_>) -> String {
        writable_field_name(model, property)
    }

    fn is_nullable(&self, property: &OrmProperty<'_>) -> bool {
        match property {
            OrmProperty::Column(column) => {
                column.is_foreign_key() || column.has_default() || column.is_nullable()
            }
            _ => true,
        }
    }
}

/// Edit inputs. Every field is optional.
#[derive(Debug, Clone)]
pub struct EditInputStrategy {
    pub auto_fields: Vec<String>,
}

impl FamilyStrategy for EditInputStrategy {
    fn kind(&self) -> FamilyKind {
        FamilyKind::EditInput
    }

    fn ignore_field(
        &self,
        _model: &Model,
        property: &OrmProperty<'_>,
        options: &TypeOptions,
    ) -> bool {
        ignore_writable(property, options, &self.auto_fields)
    }

    fn field_name(&self, model: &Model, property: &OrmProperty<'_>) -> String {
        writable_field_name(model, property)
    }

    fn is_nullable(&self, _property: &OrmProperty<'_>) -> bool {
        true
    }
}

/// Primary key inputs, shared by the keys and delete families.
#[derive(Debug, Clone, Copy)]
pub struct KeysInputStrategy {
    kind: FamilyKind,
}

impl FamilyStrategy for KeysInputStrategy {
    fn kind(&self) -> FamilyKind {
        self.kind
    }

    fn ignore_field(
        &self,
        _model: &Model,
        property: &OrmProperty<'_>,
        options: &TypeOptions,
    ) -> bool {
        !matches!(property, OrmProperty::Column(column) if column.primary_key)
            || options.filters_out(property.name())
    }
}

/// Comparator filters.
#[derive(Debug, Clone, Copy)]
pub struct FilterInputStrategy;

impl FamilyStrategy for FilterInputStrategy {
    fn kind(&self) -> FamilyKind {
        FamilyKind::FilterInput
    }

    fn ignore_field(
        &self,
        _model: &Model,
        property: &OrmProperty<'_>,
        options: &TypeOptions,
    ) -> bool {
        match property {
            OrmProperty::Column(column) if column.is_foreign_key() => true,
            OrmProperty::Composite(_) | OrmProperty::Computed(_) => true,
            other => options.filters_out(other.name()),
        }
    }

    fn is_nullable(&self, _property: &OrmProperty<'_>) -> bool {
        true
    }
}

/// Equality filters.
#[derive(Debug, Clone, Copy)]
pub struct FilterByInputStrategy;

impl FamilyStrategy for FilterByInputStrategy {
    fn kind(&self) -> FamilyKind {
        FamilyKind::FilterByInput
    }

    fn ignore_field(
        &self,
        _model: &Model,
        property: &OrmProperty<'_>,
        options: &TypeOptions,
    ) -> bool {
        match property {
            OrmProperty::Relationship(_)
            | OrmProperty::Composite(_)
            | OrmProperty::Computed(_) => true,
            other => options.filters_out(other.name()),
        }
    }

    fn is_nullable(&self, _property: &OrmProperty<'_>) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormgraph_model::{Relationship, SqlType};

    fn post() -> Model {
        Model::new("Post", "posts")
            .column(Column::new("id", SqlType::Integer).primary_key())
            .column(Column::new("title", SqlType::String).not_null())
            .column(Column::new("views", SqlType::Integer).not_null().default_value(0.into()))
            .column(Column::new("author_id", SqlType::Integer).not_null().foreign_key("User", "id"))
            .column(Column::new("editor_id", SqlType::Integer).foreign_key("User", "id"))
            .column(
                Column::new("created_at", SqlType::DateTime)
                    .not_null()
                    .server_default("now()"),
            )
            .computed("summary", None)
            .relationship(Relationship::many_to_one("author", "User").join(["author_id"], ["id"]))
    }

    fn property<'a>(model: &'a Model, name: &str) -> OrmProperty<'a> {
        model.properties().find(|p| p.name() == name).unwrap()
    }

    #[test]
    fn test_type_names() {
        let model = post();
        let options = TypeOptions::new();
        assert_eq!(ObjectStrategy.type_name(&model, &options), "Post");
        assert_eq!(FilterInputStrategy.type_name(&model, &options), "PostFilterInput");
        let keys = KeysInputStrategy {
            kind: FamilyKind::DeleteInput,
        };
        assert_eq!(keys.type_name(&model, &options), "PostDeleteInput");
        assert_eq!(
            ObjectStrategy.type_name(&model, &TypeOptions::new().name("Article")),
            "Article"
        );
    }

    #[test]
    fn test_only_and_exclude() {
        let model = post();
        let only = TypeOptions::new().only_fields(["title"]);
        assert!(ObjectStrategy.ignore_field(&model, &property(&model, "views"), &only));
        assert!(!ObjectStrategy.ignore_field(&model, &property(&model, "title"), &only));

        let exclude = TypeOptions::new().exclude_fields(["title"]);
        assert!(ObjectStrategy.ignore_field(&model, &property(&model, "title"), &exclude));
    }

    #[test]
    fn test_create_input_rules() {
        let model = post();
        let create = CreateInputStrategy {
            auto_fields: vec!["created_at".into(), "updated_at".into()],
        };
        let options = TypeOptions::new();

        assert!(create.ignore_field(&model, &property(&model, "id"), &options));
        assert!(create.ignore_field(&model, &property(&model, "created_at"), &options));
        assert!(create.ignore_field(&model, &property(&model, "summary"), &options));
        assert!(!create.ignore_field(&model, &property(&model, "author_id"), &options));

        assert_eq!(create.field_name(&model, &property(&model, "author_id")), "attach_to_author");
        assert_eq!(create.field_name(&model, &property(&model, "editor_id")), "attach_to_editor");
        assert_eq!(
            create.field_name(&model, &property(&model, "author")),
            "create_and_attach_to_author"
        );

        assert!(!create.is_nullable(&property(&model, "title")));
        assert!(create.is_nullable(&property(&model, "views")));
        assert!(create.is_nullable(&property(&model, "author_id")));
    }

    #[test]
    fn test_edit_input_is_optional() {
        let model = post();
        let edit = EditInputStrategy { auto_fields: vec![] };
        assert!(edit.is_nullable(&property(&model, "title")));
        // Without auto fields the timestamp stays editable.
        assert!(!edit.ignore_field(&model, &property(&model, "created_at"), &TypeOptions::new()));
    }

    #[test]
    fn test_keys_and_filters() {
        let model = post();
        let options = TypeOptions::new();
        let keys = KeysInputStrategy {
            kind: FamilyKind::KeysInput,
        };
        assert!(!keys.ignore_field(&model, &property(&model, "id"), &options));
        assert!(keys.ignore_field(&model, &property(&model, "title"), &options));

        assert!(FilterInputStrategy.ignore_field(&model, &property(&model, "author_id"), &options));
        assert!(!FilterInputStrategy.ignore_field(&model, &property(&model, "author"), &options));
        assert!(FilterByInputStrategy.ignore_field(&model, &property(&model, "author"), &options));
        let author_id = property(&model, "author_id");
        assert!(!FilterByInputStrategy.ignore_field(&model, &author_id, &options));
    }

    #[test]
    fn test_object_connections() {
        let plain = TypeOptions::new();
        assert_eq!(ObjectStrategy.connection(&plain), None);

        let node = TypeOptions::new().interface(NODE);
        assert_eq!(ObjectStrategy.connection(&node), Some(ConnectionKind::Plain));

        let countable = TypeOptions::new()
            .use_connection(true)
            .connection(ConnectionKind::Countable);
        assert_eq!(ObjectStrategy.connection(&countable), Some(ConnectionKind::Countable));

        assert_eq!(FilterObjectStrategy.connection(&plain), Some(ConnectionKind::Countable));
        assert_eq!(
            FilterObjectStrategy.interfaces(&plain),
            vec![NODE.to_string(), DATABASE_ID.to_string()]
        );
        assert_eq!(
            FilterObjectStrategy.interfaces(&node),
            vec![NODE.to_string(), DATABASE_ID.to_string()]
        );
    }

    #[test]
    fn test_filter_object_db_id() {
        let model = post();
        assert_eq!(FilterObjectStrategy.field_name(&model, &property(&model, "id")), "db_id");
        assert_eq!(FilterObjectStrategy.field_name(&model, &property(&model, "title")), "title");
    }
}
