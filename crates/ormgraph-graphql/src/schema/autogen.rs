//! Automatically generated root fields.
//!
//! For every model that is not excluded, the query root gets a singular
//! field (`user(id: ID!)`) and a plural connection field
//! (`users(first, after, last, before, filter, filterBy, orderBy)`). The
//! mutation root gets `create{Model}`, `edit{Model}` and `delete{Model}`.

use std::collections::HashSet;
use std::sync::Arc;

use async_graphql::dynamic::{Field, InputValue, Object, TypeRef};
use inflector::Inflector;
use tracing::{debug, warn};

use crate::convert::FamilyKind;
use crate::resolvers::{
    ConnectionResolver, CreateResolver, DeleteResolver, NodeResolver, ReadResolver, SchemaIndex,
    UpdateResolver,
};
use crate::schema::context::SchemaContext;
use crate::schema::object_type::connection_args;
use crate::schema::strategy::{ConnectionKind, TypeOptions};
use crate::types::NODE;

/// Input families generated for every model.
const INPUT_FAMILIES: [FamilyKind; 7] = [
    FamilyKind::Input,
    FamilyKind::CreateInput,
    FamilyKind::EditInput,
    FamilyKind::KeysInput,
    FamilyKind::DeleteInput,
    FamilyKind::FilterInput,
    FamilyKind::FilterByInput,
];

/// Root field names of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootNames {
    pub singular: String,
    pub plural: String,
}

impl RootNames {
    /// Derives the names from the model name: `BlogPost` gives `blogPost`
    /// and `blogPosts`.
    #[must_use]
    pub fn of(model: &str) -> Self {
        let snake = model.to_snake_case();
        Self {
            singular: snake.to_singular().to_camel_case(),
            plural: snake.to_plural().to_camel_case(),
        }
    }
}

/// Generates the output type and all input types of every included model.
///
/// Types registered on the context beforehand are kept as they are.
/// Returns the included model names in catalog order.
pub(crate) fn generate_types(ctx: &mut SchemaContext) -> crate::Result<Vec<String>> {
    let models: Vec<String> = ctx
        .catalog()
        .names()
        .filter(|name| !ctx.config().is_excluded(name))
        .map(str::to_string)
        .collect();

    let (output_family, output_options) = if ctx.config().filter_objects {
        (FamilyKind::FilterObject, TypeOptions::new())
    } else {
        let mut options = TypeOptions::new()
            .use_connection(true)
            .connection(ConnectionKind::Countable);
        if ctx.config().relay_node {
            options = options.interface(NODE);
        }
        (FamilyKind::Object, options)
    };

    for model in &models {
        ctx.generate(model, output_family, &output_options)?;
        for family in INPUT_FAMILIES {
            ctx.generate(model, family, &TypeOptions::new())?;
        }
    }

    debug!(models = models.len(), types = ctx.registry().len(), "Generated model types");
    Ok(models)
}

/// Builds the `Query` root.
pub(crate) fn query_type(
    index: &Arc<SchemaIndex>,
    models: &[String],
    available: &HashSet<(FamilyKind, String)>,
) -> Object {
    let mut names = HashSet::new();
    let mut query = Object::new("Query");

    let has_nodes = index.registry.types(index.output_family()).any(|ty| ty.is_node());
    if index.config.relay_node && has_nodes {
        names.insert("node".to_string());
        query = query.field(
            Field::new("node", TypeRef::named(NODE), NodeResolver::resolve(Arc::clone(index)))
                .description("Fetches an object given its ID")
                .argument(
                    InputValue::new("id", TypeRef::named_nn(TypeRef::ID))
                        .description("The ID of the object"),
                ),
        );
    }

    for model in models {
        let Some(ty) = index.registry.get(index.output_family(), model) else {
            continue;
        };
        let root = RootNames::of(model);

        if claim(&mut names, &root.singular, model) {
            query = query.field(
                Field::new(
                    &root.singular,
                    TypeRef::named(&ty.name),
                    ReadResolver::resolve(Arc::clone(index), model.clone()),
                )
                .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::ID))),
            );
        }

        if ty.connection.is_none() {
            warn!(model = %model, "Output type has no connection, skipping plural field");
            continue;
        }
        if !claim(&mut names, &root.plural, model) {
            continue;
        }

        let mut field = connection_args(Field::new(
            &root.plural,
            TypeRef::named(ty.connection_name()),
            ConnectionResolver::resolve(Arc::clone(index), model.clone()),
        ));
        let filters = [
            ("filter", FamilyKind::FilterInput),
            ("filterBy", FamilyKind::FilterByInput),
        ];
        for (argument, family) in filters {
            if let Some(input) = index.registry.get(family, model)
                && available.contains(&(family, model.clone()))
            {
                field = field.argument(InputValue::new(argument, TypeRef::named(&input.name)));
            }
        }
        field = field.argument(InputValue::new("orderBy", TypeRef::named_list(TypeRef::STRING)));
        query = query.field(field);
    }

    query
}

/// Builds the `Mutation` root, or `None` when there is nothing to mutate.
pub(crate) fn mutation_type(
    index: &Arc<SchemaIndex>,
    models: &[String],
    available: &HashSet<(FamilyKind, String)>,
) -> Option<Object> {
    if !index.config.mutations {
        return None;
    }

    let input = |family: FamilyKind, model: &String| {
        index
            .registry
            .get(family, model)
            .filter(|_| available.contains(&(family, model.clone())))
    };

    let mut names = HashSet::new();
    let mut mutation = Object::new("Mutation");
    let mut fields = 0;

    for model in models {
        let Some(ty) = index.registry.get(index.output_family(), model) else {
            continue;
        };

        if let Some(create) = input(FamilyKind::CreateInput, model)
            && claim(&mut names, &format!("create{model}"), model)
        {
            mutation = mutation.field(
                Field::new(
                    format!("create{model}"),
                    TypeRef::named(&ty.name),
                    CreateResolver::resolve(Arc::clone(index), model.clone()),
                )
                .argument(InputValue::new("input", TypeRef::named_nn(&create.name))),
            );
            fields += 1;
        }

        if let Some(edit) = input(FamilyKind::EditInput, model)
            && claim(&mut names, &format!("edit{model}"), model)
        {
            mutation = mutation.field(
                Field::new(
                    format!("edit{model}"),
                    TypeRef::named(&ty.name),
                    UpdateResolver::resolve(Arc::clone(index), model.clone()),
                )
                .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::ID)))
                .argument(InputValue::new("input", TypeRef::named_nn(&edit.name))),
            );
            fields += 1;
        }

        if claim(&mut names, &format!("delete{model}"), model) {
            let mut field = Field::new(
                format!("delete{model}"),
                TypeRef::named(&ty.name),
                DeleteResolver::resolve(Arc::clone(index), model.clone()),
            )
            .argument(InputValue::new("id", TypeRef::named(TypeRef::ID)));
            if let Some(keys) = input(FamilyKind::KeysInput, model) {
                field = field.argument(InputValue::new("keys", TypeRef::named(&keys.name)));
            }
            mutation = mutation.field(field);
            fields += 1;
        }
    }

    (fields > 0).then_some(mutation)
}

/// Reserves a root field name. Existing names are never overwritten.
fn claim(names: &mut HashSet<String>, name: &str, model: &str) -> bool {
    if names.insert(name.to_string()) {
        true
    } else {
        warn!(name = %name, model = %model, "Root field name already taken");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphQLConfig;
    use crate::test_support::post_catalog;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_root_names() {
        assert_eq!(
            RootNames::of("User"),
            RootNames {
                singular: "user".into(),
                plural: "users".into(),
            }
        );
        assert_eq!(RootNames::of("BlogPost").plural, "blogPosts");
        assert_eq!(RootNames::of("Category").plural, "categories");
    }

    #[test]
    fn test_generate_types_for_all_families() {
        let mut ctx = SchemaContext::new(post_catalog(), GraphQLConfig::default());
        let models = generate_types(&mut ctx).unwrap();

        assert_eq!(models, vec!["User", "Post"]);
        assert_eq!(ctx.registry().len(), 2 * 8);
        let user = ctx.registry().get(FamilyKind::Object, "User").unwrap();
        assert!(user.is_node());
        assert_eq!(user.connection, Some(ConnectionKind::Countable));
    }

    #[test]
    fn test_excluded_models_and_custom_types() {
        let config = GraphQLConfig {
            exclude_models: vec!["Post".into()],
            relay_node: false,
            ..Default::default()
        };
        let mut ctx = SchemaContext::new(post_catalog(), config);
        let options = TypeOptions::new().name("Member").use_connection(true);
        ctx.generate("User", FamilyKind::Object, &options).unwrap();

        let models = generate_types(&mut ctx).unwrap();
        assert_eq!(models, vec!["User"]);

        let user = ctx.registry().get(FamilyKind::Object, "User").unwrap();
        assert_eq!(user.name, "Member");
        assert!(!user.is_node());
        assert!(ctx.registry().get(FamilyKind::CreateInput, "Post").is_none());
    }
}
