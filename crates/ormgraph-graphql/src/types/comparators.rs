//! Comparator input objects used by filter arguments.
//!
//! ```graphql
//! input StringFilterInput {
//!   equalTo: String
//!   inList: [String]
//!   isNull: Boolean
//!   isLike: String
//!   notEqualTo: String
//! }
//! ```

use async_graphql::dynamic::{InputObject, InputValue, TypeRef};
use ormgraph_storage::Comparator;

use super::{
    BOOLEAN_FILTER_INPUT, DATE_TIME, DATE_TIME_FILTER_INPUT, FLOAT_FILTER_INPUT,
    SIGNED_INT32_FILTER_INPUT, STRING_FILTER_INPUT,
};

/// One comparator input type and the scalar it compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparatorSet {
    pub name: &'static str,
    pub scalar: &'static str,
    /// Whether `greaterThan` and friends are offered.
    pub ordered: bool,
    /// Whether `isLike` is offered.
    pub like: bool,
}

impl ComparatorSet {
    pub const ALL: [ComparatorSet; 5] = [
        ComparatorSet {
            name: STRING_FILTER_INPUT,
            scalar: TypeRef::STRING,
            ordered: false,
            like: true,
        },
        ComparatorSet {
            name: BOOLEAN_FILTER_INPUT,
            scalar: TypeRef::BOOLEAN,
            ordered: false,
            like: false,
        },
        ComparatorSet {
            name: DATE_TIME_FILTER_INPUT,
            scalar: DATE_TIME,
            ordered: true,
            like: false,
        },
        ComparatorSet {
            name: SIGNED_INT32_FILTER_INPUT,
            scalar: "SignedInt32",
            ordered: true,
            like: false,
        },
        ComparatorSet {
            name: FLOAT_FILTER_INPUT,
            scalar: TypeRef::FLOAT,
            ordered: true,
            like: false,
        },
    ];

    /// Looks up a comparator input by type name.
    #[must_use]
    pub fn get(name: &str) -> Option<&'static ComparatorSet> {
        Self::ALL.iter().find(|set| set.name == name)
    }

    /// Field names in schema order.
    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = vec!["equalTo"];
        if self.ordered {
            fields.extend(["greaterThan", "greaterThanOrEqualTo"]);
        }
        if self.scalar != TypeRef::BOOLEAN {
            fields.push("inList");
        }
        fields.push("isNull");
        if self.like {
            fields.push("isLike");
        }
        if self.ordered {
            fields.extend(["lessThan", "lessThanOrEqualTo"]);
        }
        fields.push("notEqualTo");
        fields
    }

    fn to_input_object(self) -> InputObject {
        let fields = self.fields();
        let input = InputObject::new(self.name)
            .description(format!("Conditions on a {} value", self.scalar));
        fields.into_iter().fold(input, |object, field| {
            let ty = match field {
                "inList" => TypeRef::List(Box::new(TypeRef::named(self.scalar))),
                "isNull" => TypeRef::named(TypeRef::BOOLEAN),
                "isLike" => TypeRef::named(TypeRef::STRING),
                _ => TypeRef::named(self.scalar),
            };
            object.field(InputValue::new(field, ty))
        })
    }
}

/// Builds every comparator input object.
#[must_use]
pub fn comparator_inputs() -> Vec<InputObject> {
    ComparatorSet::ALL
        .iter()
        .map(|set| set.to_input_object())
        .collect()
}

/// Maps a comparator field name to the storage comparator.
#[must_use]
pub fn comparator_op(field: &str) -> Option<Comparator> {
    let op = match field {
        "equalTo" => Comparator::Eq,
        "notEqualTo" => Comparator::Ne,
        "greaterThan" => Comparator::Gt,
        "greaterThanOrEqualTo" => Comparator::Ge,
        "lessThan" => Comparator::Lt,
        "lessThanOrEqualTo" => Comparator::Le,
        "inList" => Comparator::In,
        "isNull" => Comparator::IsNull,
        "isLike" => Comparator::Like,
        _ => return None,
    };
    Some(op)
}
