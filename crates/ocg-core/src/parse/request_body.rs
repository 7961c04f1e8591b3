use serde::Deserialize;

use super::media_type::MediaType;
use super::reference::{RefOr, StrMap};

/// A request body definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestBody {
    pub description: Option<String>,

    pub content: StrMap<MediaType>,

    #[serde(default)]
    pub required: bool,
}

pub type RequestBodyOrRef = RefOr<RequestBody>;
