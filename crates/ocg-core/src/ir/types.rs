use std::fmt;

use crate::error::Diagnostic;
use crate::parse::security::SecurityRequirement;

use super::operations::{IrOperation, IrParameter};
use super::schemas::TypeTable;

/// The normalized, fully resolved model of one API, ready for synthesis.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub info: IrInfo,
    /// First server URL with its variables substituted.
    pub base_url: Option<String>,
    pub servers: Vec<IrServer>,
    /// Document-level security requirements, carried for documentation.
    pub security: Vec<SecurityRequirement>,
    /// Header parameters shared identically by every operation.
    pub common_headers: Vec<IrParameter>,
    /// Query and cookie parameters shared identically by every operation.
    pub common_params: Vec<IrParameter>,
    pub operations: Vec<IrOperation>,
    pub types: TypeTable,
    /// Non-fatal problems, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    pub fn api_title(&self) -> &str {
        &self.info.title
    }

    pub fn api_version(&self) -> &str {
        &self.info.version
    }

    /// Whether some type or operation was left out.
    pub fn is_partial(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_skip)
    }
}

/// API metadata.
#[derive(Debug, Clone)]
pub struct IrInfo {
    pub title: String,
    pub description: Option<String>,
    pub version: String,
}

/// A server URL.
#[derive(Debug, Clone)]
pub struct IrServer {
    pub url: String,
    pub description: Option<String>,
}

/// A name with multiple casing variants pre-computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedName {
    pub original: String,
    pub pascal_case: String,
    pub camel_case: String,
    pub snake_case: String,
    pub screaming_snake: String,
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}
