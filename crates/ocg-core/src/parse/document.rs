use serde::Deserialize;

use super::components::Components;
use super::operation::PathItem;
use super::reference::StrMap;
use super::schema::SchemaOrRef;
use super::security::SecurityRequirement;
use super::server::Server;

/// Info object describing the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Info {
    pub title: String,

    pub description: Option<String>,

    #[serde(rename = "termsOfService")]
    pub terms_of_service: Option<String>,

    pub contact: Option<Contact>,

    pub license: Option<License>,

    pub version: String,
}

/// Contact information.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Contact {
    pub name: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
}

/// License information.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct License {
    pub name: String,
    pub url: Option<String>,
}

/// Pointer to documentation hosted elsewhere.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExternalDocs {
    pub url: String,
    pub description: Option<String>,
}

/// Tag definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tag {
    pub name: String,

    pub description: Option<String>,

    #[serde(rename = "externalDocs")]
    pub external_docs: Option<ExternalDocs>,
}

/// Top-level OpenAPI 3.x document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,

    pub info: Info,

    #[serde(default)]
    pub servers: Vec<Server>,

    #[serde(default)]
    pub paths: StrMap<PathItem>,

    #[serde(default)]
    pub components: Components,

    #[serde(default)]
    pub security: Vec<SecurityRequirement>,

    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(rename = "externalDocs")]
    pub external_docs: Option<ExternalDocs>,

    /// Schemas addressed by local pointers outside `#/components/<kind>/<name>`,
    /// keyed by the pointer exactly as written in `$ref`.
    #[serde(skip)]
    pub pointer_targets: StrMap<SchemaOrRef>,
}
