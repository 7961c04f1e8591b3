use serde::Deserialize;

use super::media_type::MediaType;
use super::parameter::HeaderOrRef;
use super::reference::{RefOr, StrMap};
use super::server::Server;

/// A design-time link from a response to another operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Link {
    #[serde(rename = "operationRef")]
    pub operation_ref: Option<String>,

    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,

    /// Constants or runtime expressions, kept verbatim.
    #[serde(default)]
    pub parameters: StrMap<serde_json::Value>,

    #[serde(rename = "requestBody")]
    pub request_body: Option<serde_json::Value>,

    pub description: Option<String>,

    pub server: Option<Server>,
}

pub type LinkOrRef = RefOr<Link>;

/// A response definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Response {
    pub description: String,

    #[serde(default)]
    pub headers: StrMap<HeaderOrRef>,

    #[serde(default)]
    pub content: StrMap<MediaType>,

    #[serde(default)]
    pub links: StrMap<LinkOrRef>,
}

pub type ResponseOrRef = RefOr<Response>;
