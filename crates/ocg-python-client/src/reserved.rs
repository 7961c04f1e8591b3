//! Python identifier rules for generated names.

use heck::ToSnakeCase;

/// Python hard and soft keywords.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "case", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "match", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "type", "while", "with", "yield",
];

/// Attributes a field on a `BaseModel` subclass may not shadow.
const MODEL_ATTRIBUTES: &[&str] = &[
    "construct",
    "copy",
    "dict",
    "fields",
    "json",
    "parse_file",
    "parse_obj",
    "parse_raw",
    "schema",
    "schema_json",
    "update_forward_refs",
    "validate",
];

/// Names the generated modules import or define at module level.
const MODULE_NAMES: &[&str] = &[
    "Any",
    "AnyUrl",
    "BaseModel",
    "ConfigDict",
    "EmailStr",
    "Enum",
    "Field",
    "Literal",
    "Optional",
    "TypeAdapter",
    "TypeAlias",
    "UUID",
    "Union",
    "annotations",
    "date",
    "datetime",
    "httpx",
    "time",
];

pub fn is_keyword(name: &str) -> bool {
    PYTHON_KEYWORDS.contains(&name)
}

/// Whether a model class name would shadow something the module needs.
pub fn is_reserved_type_name(name: &str) -> bool {
    is_keyword(name) || MODULE_NAMES.contains(&name)
}

/// A snake_case Python identifier for a wire name, safe to use as a field
/// or parameter.
///
/// The result still has to be made unique by the caller.
pub fn field_identifier(wire_name: &str) -> String {
    let mut name: String = wire_name
        .to_snake_case()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() {
        name = "field".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name = format!("field_{name}");
    }
    // Leading underscores make pydantic treat the attribute as private.
    let trimmed = name.trim_start_matches('_');
    if trimmed.len() != name.len() {
        name = if trimmed.is_empty() {
            "field".to_string()
        } else {
            trimmed.to_string()
        };
    }
    // A class attribute named like an imported type hides it from the
    // annotations that follow.
    if is_keyword(&name)
        || MODEL_ATTRIBUTES.contains(&name.as_str())
        || MODULE_NAMES.contains(&name.as_str())
        || name.starts_with("model_")
    {
        name.push('_');
    }
    name
}
