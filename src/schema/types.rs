//! Introspection types and the schema type map
//!
//! Only the parts of an introspection result needed to decide whether a
//! root field can paginate are modelled: type kinds, field and argument
//! types, and input object fields.

use crate::error::{Error, Result};
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the page-info selection on a paginated field
pub const PAGE_INFO_FIELD: &str = "pageInfo";
/// Page-info member holding the forward cursor
pub const NEXT_CURSOR_FIELD: &str = "nextCursor";
/// Page-info member holding the backward cursor
pub const PREV_CURSOR_FIELD: &str = "prevCursor";
/// Argument (or input field) receiving the cursor
pub const CURSOR_ARGUMENT: &str = "cursor";
/// Argument (or input field) receiving the page size
pub const LIMIT_ARGUMENT: &str = "limit";

/// `__TypeKind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

/// Possibly wrapped reference to a named type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub of_type: Option<Box<TypeRef>>,
}

impl TypeRef {
    /// Reference to a named type
    pub fn named(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            of_type: None,
        }
    }

    /// Wrap in `NON_NULL`
    #[must_use]
    pub fn non_null(self) -> Self {
        Self {
            kind: TypeKind::NonNull,
            name: None,
            of_type: Some(Box::new(self)),
        }
    }

    /// Wrap in `LIST`
    #[must_use]
    pub fn list(self) -> Self {
        Self {
            kind: TypeKind::List,
            name: None,
            of_type: Some(Box::new(self)),
        }
    }

    /// Name of the innermost named type
    pub fn named_type(&self) -> Option<&str> {
        match (&self.name, &self.of_type) {
            (Some(name), _) => Some(name),
            (None, Some(inner)) => inner.named_type(),
            (None, None) => None,
        }
    }
}

/// `__InputValue`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputValue {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

/// `__Field`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub args: Vec<InputValue>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

/// `__Type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionType {
    pub kind: TypeKind,
    pub name: String,
    #[serde(default)]
    pub fields: Option<Vec<FieldDef>>,
    #[serde(default)]
    pub input_fields: Option<Vec<InputValue>>,
}

impl IntrospectionType {
    /// Look up an output field by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.as_deref()?.iter().find(|f| f.name == name)
    }

    /// Check for an input field by name
    pub fn has_input_field(&self, name: &str) -> bool {
        self.input_fields
            .as_deref()
            .is_some_and(|fields| fields.iter().any(|f| f.name == name))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamedRef {
    name: String,
}

/// `__Schema`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionSchema {
    #[serde(default)]
    query_type: Option<NamedRef>,
    pub types: Vec<IntrospectionType>,
}

/// Where a paginated field takes its `cursor` and `limit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentSlot {
    /// Direct field arguments: `field(limit: 10, cursor: $c)`
    Argument,
    /// Fields of an input object argument: `field(input: {limit: 10, cursor: $c})`
    InputField {
        /// Name of the input object argument
        argument: String,
    },
}

/// Lower-cased type name to introspected type
#[derive(Debug, Clone, Default)]
pub struct SchemaTypeMap {
    types: HashMap<String, IntrospectionType>,
    query_type: Option<String>,
}

impl SchemaTypeMap {
    /// Build from a decoded `__schema`
    pub fn from_schema(schema: IntrospectionSchema) -> Self {
        let query_type = schema.query_type.map(|q| q.name);
        Self::from_types(schema.types, query_type)
    }

    /// Build from a list of types and the query root name
    pub fn from_types(
        types: impl IntoIterator<Item = IntrospectionType>,
        query_type: Option<String>,
    ) -> Self {
        Self {
            types: types
                .into_iter()
                .map(|t| (t.name.to_lowercase(), t))
                .collect(),
            query_type,
        }
    }

    /// Build from introspection `data` (`{"__schema": {...}}`) or a bare `__schema`
    pub fn from_introspection(data: &JsonValue) -> Result<Self> {
        let schema = data.get("__schema").unwrap_or(data);
        if schema.get("types").is_none() {
            return Err(Error::introspection("missing __schema.types"));
        }
        let schema = IntrospectionSchema::deserialize(schema)?;
        Ok(Self::from_schema(schema))
    }

    /// Look up a type by name, case-insensitively
    pub fn get(&self, name: &str) -> Option<&IntrospectionType> {
        self.types.get(&name.to_lowercase())
    }

    /// Number of types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the map holds no types
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Field of the query root type
    pub fn root_field(&self, name: &str) -> Option<&FieldDef> {
        self.get(self.query_type.as_deref().unwrap_or("Query"))?
            .field(name)
    }

    /// How a root field takes cursor and limit, if it can paginate at all
    ///
    /// A field paginates when its return type exposes `pageInfo { nextCursor
    /// prevCursor }` and it accepts both `cursor` and `limit`, either as
    /// arguments or as fields of one input object argument.
    pub fn pagination_slot(&self, field_name: &str) -> Option<ArgumentSlot> {
        let field = self.root_field(field_name)?;
        if !self.exposes_page_info(&field.ty) {
            return None;
        }

        let has_arg = |name: &str| field.args.iter().any(|a| a.name == name);
        if has_arg(CURSOR_ARGUMENT) && has_arg(LIMIT_ARGUMENT) {
            return Some(ArgumentSlot::Argument);
        }

        field.args.iter().find_map(|arg| {
            let input = self.get(arg.ty.named_type()?)?;
            (input.has_input_field(CURSOR_ARGUMENT) && input.has_input_field(LIMIT_ARGUMENT))
                .then(|| ArgumentSlot::InputField {
                    argument: arg.name.clone(),
                })
        })
    }

    fn exposes_page_info(&self, ty: &TypeRef) -> bool {
        let page_info = ty
            .named_type()
            .and_then(|name| self.get(name))
            .and_then(|output| output.field(PAGE_INFO_FIELD))
            .and_then(|field| field.ty.named_type())
            .and_then(|name| self.get(name));

        page_info.is_some_and(|t| {
            t.field(NEXT_CURSOR_FIELD).is_some() && t.field(PREV_CURSOR_FIELD).is_some()
        })
    }
}
