use serde::Deserialize;

use super::parameter::HeaderOrRef;
use super::reference::{RefOr, StrMap};
use super::schema::SchemaOrRef;

/// Encoding object for multipart and form requests.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Encoding {
    #[serde(rename = "contentType")]
    pub content_type: Option<String>,

    #[serde(default)]
    pub headers: StrMap<HeaderOrRef>,

    pub style: Option<String>,

    #[serde(default)]
    pub explode: bool,

    #[serde(rename = "allowReserved", default)]
    pub allow_reserved: bool,
}

/// A named example value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Example {
    pub summary: Option<String>,

    pub description: Option<String>,

    pub value: Option<serde_json::Value>,

    #[serde(rename = "externalValue")]
    pub external_value: Option<String>,
}

pub type ExampleOrRef = RefOr<Example>;

/// A media type object.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MediaType {
    pub schema: Option<SchemaOrRef>,

    pub example: Option<serde_json::Value>,

    #[serde(default)]
    pub examples: StrMap<ExampleOrRef>,

    #[serde(default)]
    pub encoding: StrMap<Encoding>,
}
