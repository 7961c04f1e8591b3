pub mod components;
pub mod document;
pub mod media_type;
pub mod operation;
pub mod parameter;
pub mod reference;
pub mod request_body;
pub mod response;
pub mod schema;
pub mod security;
pub mod server;

use log::debug;
use serde_json::Value;

use crate::error::ParseError;
use document::OpenApiDocument;
use reference::{StrMap, unfold_breadcrumb};

/// Prefix shared by every pointer into the components registries.
pub const COMPONENTS_PREFIX: &str = "#/components/";

/// Parse an OpenAPI 3.x document from JSON text.
///
/// Decoding failures (`ParseError::Decode`) are kept apart from grammar
/// violations (`ParseError::Validation`), which carry a dotted breadcrumb.
pub fn from_json(input: &str) -> Result<OpenApiDocument, ParseError> {
    let raw: Value = serde_json::from_str(input).map_err(ParseError::Decode)?;
    from_value(raw)
}

/// Validate an already decoded JSON value against the OpenAPI grammar.
pub fn from_value(raw: Value) -> Result<OpenApiDocument, ParseError> {
    let mut document: OpenApiDocument =
        serde_path_to_error::deserialize(&raw).map_err(|err| {
            let path = err.path().to_string();
            let (path, message) = unfold_breadcrumb(path, err.into_inner().to_string());
            ParseError::Validation { path, message }
        })?;

    validate_version(&document)?;
    validate_responses(&document)?;

    document.pointer_targets = collect_pointer_targets(&raw);
    debug!(
        "parsed `{}` {}: {} paths, {} component schemas",
        document.info.title,
        document.info.version,
        document.paths.len(),
        document.components.schemas.len()
    );
    Ok(document)
}

fn validate_version(document: &OpenApiDocument) -> Result<(), ParseError> {
    if !document.openapi.starts_with("3.") {
        return Err(ParseError::UnsupportedVersion(document.openapi.clone()));
    }
    Ok(())
}

/// OpenAPI 3.0 requires a non-empty `responses` object; 3.1 relaxed it.
fn validate_responses(document: &OpenApiDocument) -> Result<(), ParseError> {
    if !document.openapi.starts_with("3.0") {
        return Ok(());
    }
    for (path, item) in &document.paths {
        for (method, op) in item.operations() {
            if op.responses.is_empty() {
                return Err(ParseError::Validation {
                    path: format!("paths.{path}.{method}.responses"),
                    message: "an operation must declare at least one response".to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Whether `pointer` names a whole registry entry such as `#/components/schemas/Pet`.
pub fn is_component_pointer(pointer: &str) -> bool {
    pointer
        .strip_prefix(COMPONENTS_PREFIX)
        .and_then(|rest| rest.split_once('/'))
        .is_some_and(|(_, name)| !name.is_empty() && !name.contains('/'))
}

/// Materialise every local `$ref` target that is not a registry entry.
fn collect_pointer_targets(raw: &Value) -> StrMap<schema::SchemaOrRef> {
    let mut pointers = Vec::new();
    collect_refs(raw, &mut pointers);

    let mut targets = StrMap::new();
    for pointer in pointers {
        if targets.contains_key(&pointer) || is_component_pointer(&pointer) {
            continue;
        }
        let Some(fragment) = pointer.strip_prefix('#') else {
            continue;
        };
        let Some(target) = raw.pointer(fragment) else {
            continue;
        };
        if let Ok(schema) = serde_json::from_value(target.clone()) {
            targets.insert(pointer, schema);
        }
    }
    targets
}

fn collect_refs(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "$ref"
                    && let Some(pointer) = child.as_str()
                {
                    out.push(pointer.to_string());
                } else {
                    collect_refs(child, out);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_pointer_detection() {
        assert!(is_component_pointer("#/components/schemas/Pet"));
        assert!(is_component_pointer("#/components/parameters/limit"));
        assert!(!is_component_pointer("#/components/schemas/Pet/properties/id"));
        assert!(!is_component_pointer("#/paths/~1pets/get"));
        assert!(!is_component_pointer("#/components/schemas/"));
    }

    #[test]
    fn test_pointer_targets_materialised() {
        let doc = from_json(
            r##"{
                "openapi": "3.0.3",
                "info": {"title": "T", "version": "1"},
                "paths": {},
                "components": {
                    "schemas": {
                        "Pet": {
                            "type": "object",
                            "properties": {"tag": {"type": "string"}}
                        },
                        "Tag": {"$ref": "#/components/schemas/Pet/properties/tag"}
                    }
                }
            }"##,
        )
        .unwrap();
        assert_eq!(doc.pointer_targets.len(), 1);
        assert!(
            doc.pointer_targets
                .contains_key("#/components/schemas/Pet/properties/tag")
        );
    }
}
