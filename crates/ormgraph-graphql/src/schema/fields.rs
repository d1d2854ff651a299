//! Field construction from ORM properties.

use inflector::Inflector;
use ormgraph_model::{Model, OrmProperty};
use tracing::trace;

use crate::convert::FieldType;
use crate::error::GraphQLError;
use crate::schema::context::SchemaContext;
use crate::schema::registry::{Cardinality, FieldShape, FieldSpec, ValueKind};
use crate::schema::strategy::{FamilyStrategy, TypeOptions};

/// Builds the ordered field specs of `model` for `strategy`'s family.
///
/// Properties are visited in [`Model::properties`] order. Relationship
/// fields are returned as deferred references to the target model.
///
/// # Errors
///
/// Returns `GraphQLError::NoConversionRule` for unconvertible columns and
/// `GraphQLError::UnknownComposite` for composites without a converter.
pub fn construct_fields(
    ctx: &mut SchemaContext,
    model: &Model,
    strategy: &dyn FamilyStrategy,
    options: &TypeOptions,
) -> crate::Result<Vec<FieldSpec>> {
    let family = strategy.kind();
    let mut fields = Vec::new();

    for property in model.properties() {
        if strategy.ignore_field(model, &property, options) {
            trace!(
                model = %model.name,
                family = %family,
                property = property.name(),
                "Ignoring property"
            );
            continue;
        }

        let shape = match property {
            OrmProperty::Column(column) => {
                let ty = ctx.conversions.convert(model, column, family, &mut ctx.enums)?;
                let value = ValueKind::of(&ty, |name| ctx.enums.contains(name));
                FieldShape::Scalar { ty, value }
            }
            OrmProperty::Composite(composite) => {
                let converter = ctx.composites.get(&composite.class_name).ok_or_else(|| {
                    GraphQLError::UnknownComposite {
                        model: model.name.clone(),
                        property: composite.name.clone(),
                        class_name: composite.class_name.clone(),
                    }
                })?;
                FieldShape::Scalar {
                    ty: (**converter)(composite, family)?,
                    value: ValueKind::Composite(composite.columns.clone()),
                }
            }
            OrmProperty::Computed(_) => FieldShape::Scalar {
                ty: FieldType::named("String"),
                value: ValueKind::Plain,
            },
            OrmProperty::Relationship(rel) => FieldShape::Relationship {
                target: rel.target.clone(),
                cardinality: if rel.uses_list() {
                    Cardinality::Many
                } else {
                    Cardinality::Single
                },
            },
        };

        let mut name = strategy.field_name(model, &property);
        if ctx.config.auto_camelcase {
            name = name.to_camel_case();
        }

        fields.push(FieldSpec {
            name,
            property: property.name().to_string(),
            kind: property.kind(),
            shape,
            nullable: strategy.is_nullable(&property),
            description: property.doc().map(str::to_string),
        });
    }

    Ok(fields)
}
