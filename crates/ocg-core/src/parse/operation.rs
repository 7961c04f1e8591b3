use serde::Deserialize;

use super::document::ExternalDocs;
use super::parameter::ParameterOrRef;
use super::reference::{RefOr, StrMap};
use super::request_body::RequestBodyOrRef;
use super::response::ResponseOrRef;
use super::security::SecurityRequirement;
use super::server::Server;

/// A callback: runtime expression → path item.
pub type Callback = StrMap<PathItem>;
pub type CallbackOrRef = RefOr<Callback>;

/// An API operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub tags: Vec<String>,

    pub summary: Option<String>,

    pub description: Option<String>,

    #[serde(rename = "externalDocs")]
    pub external_docs: Option<ExternalDocs>,

    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,

    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,

    #[serde(rename = "requestBody")]
    pub request_body: Option<RequestBodyOrRef>,

    #[serde(default)]
    pub responses: StrMap<ResponseOrRef>,

    #[serde(default)]
    pub callbacks: StrMap<CallbackOrRef>,

    #[serde(default)]
    pub deprecated: bool,

    pub security: Option<Vec<SecurityRequirement>>,

    #[serde(default)]
    pub servers: Vec<Server>,
}

/// HTTP methods in the order operations are emitted for a path.
pub const METHOD_ORDER: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// A path item, containing operations keyed by HTTP method.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PathItem {
    pub summary: Option<String>,

    pub description: Option<String>,

    #[serde(default)]
    pub servers: Vec<Server>,

    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,

    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    pub trace: Option<Operation>,
}

impl PathItem {
    /// Operations present on this path, as `(method, operation)` in
    /// [`METHOD_ORDER`].
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        let slots = [
            &self.get,
            &self.put,
            &self.post,
            &self.delete,
            &self.options,
            &self.head,
            &self.patch,
            &self.trace,
        ];
        METHOD_ORDER
            .into_iter()
            .zip(slots)
            .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}
