use serde::Deserialize;

use super::reference::{RefOr, StrMap};

/// A security scheme type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SecuritySchemeType {
    #[serde(rename = "apiKey")]
    ApiKey,
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "oauth2")]
    OAuth2,
    #[serde(rename = "openIdConnect")]
    OpenIdConnect,
    #[serde(rename = "mutualTLS")]
    MutualTls,
}

/// Location of an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Query,
    Header,
    Cookie,
}

/// OAuth2 flows configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OAuthFlows {
    pub implicit: Option<OAuthFlow>,
    pub password: Option<OAuthFlow>,
    #[serde(rename = "clientCredentials")]
    pub client_credentials: Option<OAuthFlow>,
    #[serde(rename = "authorizationCode")]
    pub authorization_code: Option<OAuthFlow>,
}

/// A single OAuth2 flow.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OAuthFlow {
    #[serde(rename = "authorizationUrl")]
    pub authorization_url: Option<String>,
    #[serde(rename = "tokenUrl")]
    pub token_url: Option<String>,
    #[serde(rename = "refreshUrl")]
    pub refresh_url: Option<String>,
    #[serde(default)]
    pub scopes: StrMap<String>,
}

/// A security scheme definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: SecuritySchemeType,

    pub description: Option<String>,

    pub name: Option<String>,

    #[serde(rename = "in")]
    pub location: Option<ApiKeyLocation>,

    pub scheme: Option<String>,

    #[serde(rename = "bearerFormat")]
    pub bearer_format: Option<String>,

    pub flows: Option<OAuthFlows>,

    #[serde(rename = "openIdConnectUrl")]
    pub open_id_connect_url: Option<String>,
}

pub type SecuritySchemeOrRef = RefOr<SecurityScheme>;

/// A security requirement: map of scheme name → required scopes.
pub type SecurityRequirement = StrMap<Vec<String>>;
