//! Schema module
//!
//! Provides the introspected type map used to decide which root fields
//! can paginate.
//!
//! # Features
//!
//! - **Introspection**: Fetches `__schema` through the transport
//! - **Type Map**: Case-insensitive lookup by type name
//! - **Capability Detection**: `pageInfo` plus `cursor`/`limit` slots
//! - **Caching**: Fetch once, shared by concurrent callers

mod introspection;
mod types;

pub use introspection::{fetch_type_map, SchemaCache, INTROSPECTION_OPERATION, INTROSPECTION_QUERY};
pub use types::{
    ArgumentSlot, FieldDef, InputValue, IntrospectionSchema, IntrospectionType, SchemaTypeMap,
    TypeKind, TypeRef, CURSOR_ARGUMENT, LIMIT_ARGUMENT, NEXT_CURSOR_FIELD, PAGE_INFO_FIELD,
    PREV_CURSOR_FIELD,
};
