use super::schemas::TypeRef;
use super::types::NormalizedName;

/// HTTP method, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Parse a lowercase path-item key.
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "get" => HttpMethod::Get,
            "put" => HttpMethod::Put,
            "post" => HttpMethod::Post,
            "delete" => HttpMethod::Delete,
            "options" => HttpMethod::Options,
            "head" => HttpMethod::Head,
            "patch" => HttpMethod::Patch,
            "trace" => HttpMethod::Trace,
            _ => return None,
        })
    }
}

/// A fully resolved API operation.
#[derive(Debug, Clone)]
pub struct IrOperation {
    pub name: NormalizedName,
    /// The declared `operationId`, if any.
    pub operation_id: Option<String>,
    pub method: HttpMethod,
    pub path: String,
    /// Breadcrumb of the operation, e.g. `paths./pets.get`.
    pub location: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Merged path-level and operation-level parameters.
    pub parameters: Vec<IrParameter>,
    pub request_body: Option<IrRequestBody>,
    /// Responses in declared order.
    pub responses: Vec<IrResponse>,
    /// Status of the response that decides the return type.
    pub success_status: Option<String>,
    pub return_type: IrReturnType,
    pub deprecated: bool,
}

impl IrOperation {
    /// The response that decides the return type.
    pub fn success_response(&self) -> Option<&IrResponse> {
        let status = self.success_status.as_deref()?;
        self.responses.iter().find(|r| r.status == status)
    }
}

/// A resolved path/query/header/cookie parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct IrParameter {
    pub name: NormalizedName,
    pub original_name: String,
    pub location: IrParameterLocation,
    pub param_type: TypeRef,
    pub required: bool,
    pub description: Option<String>,
    pub deprecated: bool,
}

impl IrParameter {
    /// Identity used for merging and for the common-parameter intersection.
    pub fn key(&self) -> (&str, IrParameterLocation) {
        (&self.original_name, self.location)
    }
}

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// How a body is carried.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyBinding {
    /// A JSON payload mapped to a generated type.
    Json(TypeRef),
    /// Opaque `text/*` content.
    Text,
    /// Any other opaque content.
    Binary,
}

/// A resolved request body.
#[derive(Debug, Clone)]
pub struct IrRequestBody {
    pub content_type: String,
    pub binding: BodyBinding,
    pub required: bool,
    pub description: Option<String>,
}

/// A header declared on a response.
#[derive(Debug, Clone)]
pub struct IrResponseHeader {
    pub name: String,
    pub header_type: TypeRef,
    pub required: bool,
    pub description: Option<String>,
}

/// One entry of an operation's responses.
#[derive(Debug, Clone)]
pub struct IrResponse {
    /// Status code, `2XX`-style range or `default`.
    pub status: String,
    pub description: Option<String>,
    pub content_type: Option<String>,
    /// `None` when the response has no content.
    pub binding: Option<BodyBinding>,
    pub headers: Vec<IrResponseHeader>,
}

/// What an operation returns.
#[derive(Debug, Clone, PartialEq)]
pub enum IrReturnType {
    /// The success response carries a body.
    Body(BodyBinding),
    /// No response body (204, etc).
    Void,
}
