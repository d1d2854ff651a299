//! Shared GraphQL types.
//!
//! This module provides the types every generated schema contains regardless
//! of the models:
//!
//! - Bounded integer scalars: `SignedInt8` .. `SignedInt32`,
//!   `UnsignedInt8` .. `UnsignedInt32`
//! - `DateTime` and `JSONString` scalars
//! - Comparator inputs used by filter arguments (`StringFilterInput`, ...)
//! - The Relay `Node` interface, `PageInfo` and global ids

mod comparators;
mod node;
mod scalars;

pub use comparators::{ComparatorSet, comparator_inputs, comparator_op};
pub use node::{
    cursor_to_offset, database_id_interface, decode_global_id, encode_global_id, node_interface,
    offset_to_cursor, page_info_type,
};
pub use scalars::{
    DateTime, JsonString, SignedInt8, SignedInt16, SignedInt24, SignedInt32, UnsignedInt8,
    UnsignedInt16, UnsignedInt24, UnsignedInt32, coerce_int, register_scalars,
};

use ormgraph_model::IntWidth;

/// Name of the date-time scalar.
pub const DATE_TIME: &str = "DateTime";

/// Name of the JSON scalar. Values are JSON documents serialized to strings.
pub const JSON_STRING: &str = "JSONString";

pub const STRING_FILTER_INPUT: &str = "StringFilterInput";
pub const BOOLEAN_FILTER_INPUT: &str = "BooleanFilterInput";
pub const SIGNED_INT32_FILTER_INPUT: &str = "SignedInt32FilterInput";
pub const FLOAT_FILTER_INPUT: &str = "FloatFilterInput";
pub const DATE_TIME_FILTER_INPUT: &str = "DateTimeFilterInput";

/// Name of the Relay node interface.
pub const NODE: &str = "Node";

/// Name of the interface exposing the raw primary key as `dbId`.
pub const DATABASE_ID: &str = "DatabaseId";

/// Name of the shared connection page info type.
pub const PAGE_INFO: &str = "PageInfo";

/// Returns the scalar name for a bounded integer column.
#[must_use]
pub fn bounded_int_name(width: IntWidth, unsigned: bool) -> &'static str {
    match (width, unsigned) {
        (IntWidth::Int8, false) => "SignedInt8",
        (IntWidth::Int16, false) => "SignedInt16",
        (IntWidth::Int24, false) => "SignedInt24",
        (IntWidth::Int32, false) => "SignedInt32",
        (IntWidth::Int8, true) => "UnsignedInt8",
        (IntWidth::Int16, true) => "UnsignedInt16",
        (IntWidth::Int24, true) => "UnsignedInt24",
        (IntWidth::Int32, true) => "UnsignedInt32",
    }
}

/// Parses a bounded integer scalar name back into its width and sign.
#[must_use]
pub fn parse_bounded_int_name(name: &str) -> Option<(IntWidth, bool)> {
    let (unsigned, bits) = if let Some(bits) = name.strip_prefix("SignedInt") {
        (false, bits)
    } else if let Some(bits) = name.strip_prefix("UnsignedInt") {
        (true, bits)
    } else {
        return None;
    };

    let width = match bits {
        "8" => IntWidth::Int8,
        "16" => IntWidth::Int16,
        "24" => IntWidth::Int24,
        "32" => IntWidth::Int32,
        _ => return None,
    };
    Some((width, unsigned))
}
