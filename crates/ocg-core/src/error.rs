use std::fmt;

use thiserror::Error;

/// Failures while turning input text into an [`OpenApiDocument`](crate::parse::document::OpenApiDocument).
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to decode schema document: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid schema document at `{path}`: {message}")]
    Validation { path: String, message: String },

    #[error("unsupported OpenAPI version `{0}` at `openapi`: only 3.x documents are supported")]
    UnsupportedVersion(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unresolved reference `{pointer}` at `{location}`: target does not exist")]
    Unresolved { pointer: String, location: String },

    #[error("invalid reference `{pointer}` at `{location}`: {reason}")]
    InvalidPointer {
        pointer: String,
        location: String,
        reason: String,
    },

    #[error("external reference `{pointer}` at `{location}` is not supported")]
    External { pointer: String, location: String },

    #[error("reference cycle without a concrete target: {}", chain.join(" -> "))]
    AliasCycle { chain: Vec<String> },
}

/// The suffix budget for a generated type name ran out.
#[derive(Debug, Error)]
#[error("no free type name for `{base}` (declared at `{location}`) after {budget} suffixes")]
pub struct NameCollisionError {
    pub base: String,
    pub location: String,
    pub budget: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    NameCollision(#[from] NameCollisionError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

/// Errors raised by a [`CodeGenerator`](crate::CodeGenerator) backend.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("template error: {0}")]
    Template(String),

    #[error(transparent)]
    NameCollision(#[from] NameCollisionError),

    #[error("generator failed: {0}")]
    Other(String),
}

/// A non-fatal problem recorded while the run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A schema feature or body shape that cannot be represented. The affected
    /// type or operation is skipped.
    UnsupportedConstruct { location: String, reason: String },

    /// Two operations share an `operationId`; the later one was renamed.
    DuplicateOperationId {
        operation_id: String,
        first: String,
        second: String,
        renamed_to: String,
    },
}

impl Diagnostic {
    /// Whether the diagnostic means something was left out of the output.
    pub fn is_skip(&self) -> bool {
        matches!(self, Diagnostic::UnsupportedConstruct { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnsupportedConstruct { location, reason } => {
                write!(f, "unsupported construct at `{location}`: {reason}")
            }
            Diagnostic::DuplicateOperationId {
                operation_id,
                first,
                second,
                renamed_to,
            } => write!(
                f,
                "duplicate operationId `{operation_id}` at `{first}` and `{second}`; \
                 the second is generated as `{renamed_to}`"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_carries_breadcrumb() {
        let err = ParseError::Validation {
            path: "components.schemas.Pet.properties.id".to_string(),
            message: "unknown variant `int`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid schema document at `components.schemas.Pet.properties.id`: unknown variant `int`"
        );
    }

    #[test]
    fn test_alias_cycle_message() {
        let err = ResolveError::AliasCycle {
            chain: vec!["#/components/schemas/A".into(), "#/components/schemas/B".into()],
        };
        assert_eq!(
            err.to_string(),
            "reference cycle without a concrete target: #/components/schemas/A -> #/components/schemas/B"
        );
    }
}
