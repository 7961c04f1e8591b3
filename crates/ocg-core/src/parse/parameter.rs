use serde::Deserialize;

use super::reference::RefOr;
use super::schema::SchemaOrRef;

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

/// An API parameter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(rename = "allowEmptyValue", default)]
    pub allow_empty_value: bool,

    pub style: Option<String>,

    pub explode: Option<bool>,

    pub schema: Option<SchemaOrRef>,

    pub example: Option<serde_json::Value>,
}

/// A response or encoding header: a parameter without `name` and `in`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Header {
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub deprecated: bool,

    pub style: Option<String>,

    pub explode: Option<bool>,

    pub schema: Option<SchemaOrRef>,
}

pub type ParameterOrRef = RefOr<Parameter>;
pub type HeaderOrRef = RefOr<Header>;
