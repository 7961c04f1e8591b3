use serde::Deserialize;

use super::reference::{RefOr, StrMap};

/// A reference or inline schema.
pub type SchemaOrRef = RefOr<Box<Schema>>;

/// A JSON Schema type keyword value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

/// The `type` field can be a single type or (3.1) an array of types.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(SchemaType),
    Multiple(Vec<SchemaType>),
}

/// `additionalProperties` can be a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaOrRef>),
}

/// A JSON Schema object as used by OpenAPI 3.0 and 3.1.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: Option<TypeSet>,

    pub format: Option<String>,

    pub title: Option<String>,

    pub description: Option<String>,

    #[serde(rename = "default")]
    pub default_value: Option<serde_json::Value>,

    pub nullable: Option<bool>,

    // Object properties
    #[serde(default)]
    pub properties: StrMap<SchemaOrRef>,

    #[serde(default)]
    pub required: Vec<String>,

    #[serde(rename = "additionalProperties")]
    pub additional_properties: Option<AdditionalProperties>,

    // Array items
    pub items: Option<Box<SchemaOrRef>>,

    // Composition
    #[serde(rename = "allOf", default)]
    pub all_of: Vec<SchemaOrRef>,

    #[serde(rename = "oneOf", default)]
    pub one_of: Vec<SchemaOrRef>,

    #[serde(rename = "anyOf", default)]
    pub any_of: Vec<SchemaOrRef>,

    #[serde(rename = "enum", default)]
    pub enum_values: Vec<serde_json::Value>,

    #[serde(rename = "const")]
    pub const_value: Option<serde_json::Value>,

    #[serde(rename = "readOnly")]
    pub read_only: Option<bool>,

    #[serde(rename = "writeOnly")]
    pub write_only: Option<bool>,

    pub deprecated: Option<bool>,

    pub example: Option<serde_json::Value>,
}

impl Schema {
    /// Whether the schema admits `null` via `nullable` or a 3.1 type array.
    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(false)
            || match &self.schema_type {
                Some(TypeSet::Single(t)) => *t == SchemaType::Null,
                Some(TypeSet::Multiple(types)) => types.contains(&SchemaType::Null),
                None => false,
            }
    }

    /// Non-null entries of the `type` keyword, in declared order.
    pub fn declared_types(&self) -> Vec<SchemaType> {
        match &self.schema_type {
            Some(TypeSet::Single(SchemaType::Null)) => Vec::new(),
            Some(TypeSet::Single(t)) => vec![*t],
            Some(TypeSet::Multiple(types)) => types
                .iter()
                .copied()
                .filter(|t| *t != SchemaType::Null)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Whether `null` is the only admitted value.
    pub fn is_null_only(&self) -> bool {
        self.schema_type.is_some() && self.declared_types().is_empty()
    }

    /// Whether the schema describes a record shape (declared object or bare properties).
    pub fn is_object_like(&self) -> bool {
        !self.properties.is_empty() || self.declared_types() == [SchemaType::Object]
    }
}
