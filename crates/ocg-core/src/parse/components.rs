use serde::Deserialize;

use super::media_type::ExampleOrRef;
use super::operation::CallbackOrRef;
use super::parameter::{HeaderOrRef, ParameterOrRef};
use super::reference::StrMap;
use super::request_body::RequestBodyOrRef;
use super::response::{LinkOrRef, ResponseOrRef};
use super::schema::SchemaOrRef;
use super::security::SecuritySchemeOrRef;

/// Components object holding reusable definitions.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: StrMap<SchemaOrRef>,

    #[serde(default)]
    pub responses: StrMap<ResponseOrRef>,

    #[serde(default)]
    pub parameters: StrMap<ParameterOrRef>,

    #[serde(default)]
    pub examples: StrMap<ExampleOrRef>,

    #[serde(rename = "requestBodies", default)]
    pub request_bodies: StrMap<RequestBodyOrRef>,

    #[serde(default)]
    pub headers: StrMap<HeaderOrRef>,

    #[serde(rename = "securitySchemes", default)]
    pub security_schemes: StrMap<SecuritySchemeOrRef>,

    #[serde(default)]
    pub links: StrMap<LinkOrRef>,

    #[serde(default)]
    pub callbacks: StrMap<CallbackOrRef>,
}
