//! Relay `Node` interface, global ids and connection cursors.

use async_graphql::dynamic::{Interface, InterfaceField, Object, TypeRef};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::{DATABASE_ID, NODE, PAGE_INFO};
use crate::resolvers::value_field;

const CURSOR_PREFIX: &str = "arrayconnection:";

/// Encodes a global id: `base64("{type_name}:{id}")`.
#[must_use]
pub fn encode_global_id(type_name: &str, id: &str) -> String {
    STANDARD.encode(format!("{type_name}:{id}"))
}

/// Decodes a global id into `(type_name, id)`.
///
/// Returns `None` when the value is not base64 or lacks the separator.
#[must_use]
pub fn decode_global_id(global_id: &str) -> Option<(String, String)> {
    let bytes = STANDARD.decode(global_id).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    let (type_name, id) = decoded.split_once(':')?;
    if type_name.is_empty() {
        return None;
    }
    Some((type_name.to_string(), id.to_string()))
}

/// Encodes the cursor of the row at `offset`.
#[must_use]
pub fn offset_to_cursor(offset: usize) -> String {
    STANDARD.encode(format!("{CURSOR_PREFIX}{offset}"))
}

/// Decodes a cursor produced by [`offset_to_cursor`].
#[must_use]
pub fn cursor_to_offset(cursor: &str) -> Option<usize> {
    let bytes = STANDARD.decode(cursor).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    decoded.strip_prefix(CURSOR_PREFIX)?.parse().ok()
}

/// The `Node` interface implemented by object types with a global id.
#[must_use]
pub fn node_interface() -> Interface {
    Interface::new(NODE)
        .description("An object with an ID")
        .field(
            InterfaceField::new("id", TypeRef::named_nn(TypeRef::ID))
                .description("The ID of the object"),
        )
}

/// The `DatabaseId` interface of filter object types.
///
/// `dbId` is the primary key as stored. Composite keys render as a JSON
/// array such as `[1,"admin"]`.
#[must_use]
pub fn database_id_interface() -> Interface {
    Interface::new(DATABASE_ID)
        .description("An object with a database primary key")
        .field(
            InterfaceField::new("dbId", TypeRef::named_nn(TypeRef::ID))
                .description("The primary key of the row"),
        )
}

/// The `PageInfo` type shared by all connections.
#[must_use]
pub fn page_info_type() -> Object {
    Object::new(PAGE_INFO)
        .description("Information about pagination in a connection")
        .field(
            value_field("hasNextPage", TypeRef::named_nn(TypeRef::BOOLEAN))
                .description("When paginating forwards, are there more items?"),
        )
        .field(
            value_field("hasPreviousPage", TypeRef::named_nn(TypeRef::BOOLEAN))
                .description("When paginating backwards, are there more items?"),
        )
        .field(
            value_field("startCursor", TypeRef::named(TypeRef::STRING))
                .description("When paginating backwards, the cursor to continue"),
        )
        .field(
            value_field("endCursor", TypeRef::named(TypeRef::STRING))
                .description("When paginating forwards, the cursor to continue"),
        )
}
