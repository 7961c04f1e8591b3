use std::collections::HashSet;

use heck::{ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase};
use serde_json::Value;

use crate::error::NameCollisionError;
use crate::ir::NormalizedName;

/// Largest numeric suffix tried before a name is declared unavailable.
pub const MAX_NAME_SUFFIX: usize = 999;

/// Create a `NormalizedName` from an arbitrary string, computing all casing variants.
pub fn normalize_name(name: &str) -> NormalizedName {
    let sanitized = sanitize_identifier(name);

    NormalizedName {
        original: name.to_string(),
        pascal_case: sanitized.to_pascal_case(),
        camel_case: sanitized.to_lower_camel_case(),
        snake_case: sanitized.to_snake_case(),
        screaming_snake: sanitized.to_shouty_snake_case(),
    }
}

/// PascalCase type identifier for an arbitrary base name.
///
/// Names that already are capitalized alphanumeric identifiers are kept as-is
/// so registry keys such as `HTTPError` survive unchanged.
pub fn type_name(raw: &str) -> String {
    let mut chars = raw.chars();
    if chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric())
    {
        return raw.to_string();
    }
    let name = sanitize_identifier(raw).to_pascal_case();
    match name.chars().next() {
        None => "Unnamed".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{name}"),
        Some(_) => name,
    }
}

/// SCREAMING_SNAKE member identifier for an enum value.
pub fn member_name(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Null => return "NONE".to_string(),
        Value::Bool(true) => return "TRUE".to_string(),
        Value::Bool(false) => return "FALSE".to_string(),
        Value::Number(n) => {
            let text = n.to_string().replace('-', "minus_").replace('.', "_");
            return format!("VALUE_{text}").to_shouty_snake_case();
        }
        other => other.to_string(),
    };
    let name = sanitize_identifier(&raw).to_shouty_snake_case();
    match name.chars().next() {
        None => "EMPTY".to_string(),
        Some(c) if c.is_ascii_digit() => format!("VALUE_{name}"),
        Some(_) => name,
    }
}

/// Derive a camelCase operation name from HTTP method + path.
///
/// Examples:
/// - `GET /users` → `listUsers`
/// - `POST /users` → `createUsers`
/// - `GET /users/{userId}` → `getUser`
/// - `PUT /users/{userId}` → `updateUser`
/// - `DELETE /users/{userId}` → `deleteUser`
/// - `GET /users/{userId}/messages` → `listUsersMessages`
pub fn route_to_name(method: &str, path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // Collect non-parameter segments and track whether the path ends with a param
    let mut resource_parts: Vec<String> = Vec::new();
    let mut ends_with_param = false;

    for seg in &segments {
        if seg.starts_with('{') && seg.ends_with('}') {
            ends_with_param = true;
        } else {
            resource_parts.push(seg.to_string());
            ends_with_param = false;
        }
    }

    let method_upper = method.to_uppercase();
    let prefix = match method_upper.as_str() {
        "GET" if ends_with_param => "get",
        "GET" => "list",
        "POST" => "create",
        "PUT" => "update",
        "DELETE" => "delete",
        "PATCH" => "patch",
        "OPTIONS" => "options",
        "HEAD" => "head",
        "TRACE" => "trace",
        other => other,
    };

    if resource_parts.is_empty() {
        return prefix.to_lowercase();
    }

    let mut pascal_parts = String::new();
    for (i, part) in resource_parts.iter().enumerate() {
        let is_last = i == resource_parts.len() - 1;
        let word = if is_last && ends_with_param {
            singularize(part)
        } else {
            part.to_string()
        };
        pascal_parts.push_str(&sanitize_identifier(&word).to_pascal_case());
    }

    format!("{prefix}{pascal_parts}")
}

/// Naive singularization: strips trailing 's' if present.
fn singularize(word: &str) -> String {
    if word.ends_with("ies") && word.len() > 3 {
        format!("{}y", &word[..word.len() - 3])
    } else if word.ends_with("ses") || word.ends_with("xes") || word.ends_with("zes") {
        word[..word.len() - 2].to_string()
    } else if word.ends_with('s') && !word.ends_with("ss") && word.len() > 1 {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Sanitize a string to be a valid identifier.
fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_was_separator = false;

    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if prev_was_separator && !result.is_empty() {
                result.push('_');
            }
            result.push(ch);
            prev_was_separator = false;
        } else {
            prev_was_separator = true;
        }
    }

    result
}

/// Registry of claimed identifiers in one namespace.
#[derive(Debug, Default)]
pub struct TypeNames {
    used: HashSet<String>,
}

impl TypeNames {
    /// Claim `base`, or `base1`, `base2`, ... in first-come order.
    pub fn claim(&mut self, base: &str, location: &str) -> Result<String, NameCollisionError> {
        if self.used.insert(base.to_string()) {
            return Ok(base.to_string());
        }
        for suffix in 1..=MAX_NAME_SUFFIX {
            let candidate = format!("{base}{suffix}");
            if self.used.insert(candidate.clone()) {
                return Ok(candidate);
            }
        }
        Err(NameCollisionError {
            base: base.to_string(),
            location: location.to_string(),
            budget: MAX_NAME_SUFFIX,
        })
    }

    /// Mark a name as taken without suffixing.
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        let n = normalize_name("listPets");
        assert_eq!(n.pascal_case, "ListPets");
        assert_eq!(n.camel_case, "listPets");
        assert_eq!(n.snake_case, "list_pets");
        assert_eq!(n.screaming_snake, "LIST_PETS");
    }

    #[test]
    fn test_kebab_case() {
        let n = normalize_name("pet-store");
        assert_eq!(n.pascal_case, "PetStore");
        assert_eq!(n.snake_case, "pet_store");
    }

    #[test]
    fn test_special_chars() {
        assert_eq!(normalize_name("application/json").pascal_case, "ApplicationJson");
        assert_eq!(normalize_name("X-Request-ID").snake_case, "x_request_id");
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name("pet_store"), "PetStore");
        assert_eq!(type_name("HTTPError"), "HTTPError");
        assert_eq!(type_name("Pet.Status"), "PetStatus");
        assert_eq!(type_name("3dModel"), "_3dModel");
        assert_eq!(type_name("$$$"), "Unnamed");
    }

    #[test]
    fn test_member_names() {
        assert_eq!(member_name(&Value::from("in-progress")), "IN_PROGRESS");
        assert_eq!(member_name(&Value::from("2fa")), "VALUE_2FA");
        assert_eq!(member_name(&Value::from(-1)), "VALUE_MINUS_1");
        assert_eq!(member_name(&Value::from("")), "EMPTY");
        assert_eq!(member_name(&Value::Null), "NONE");
    }

    #[test]
    fn test_route_to_name_list() {
        assert_eq!(route_to_name("get", "/pets"), "listPets");
    }

    #[test]
    fn test_route_to_name_get_single() {
        assert_eq!(route_to_name("get", "/pets/{id}"), "getPet");
    }

    #[test]
    fn test_route_to_name_create() {
        assert_eq!(route_to_name("post", "/pets"), "createPets");
    }

    #[test]
    fn test_route_to_name_nested_single() {
        assert_eq!(
            route_to_name("delete", "/users/{userId}/messages/{messageId}"),
            "deleteUsersMessage"
        );
    }

    #[test]
    fn test_route_to_name_root() {
        assert_eq!(route_to_name("get", "/"), "list");
    }

    #[test]
    fn test_claim_suffixes_in_order() {
        let mut names = TypeNames::default();
        assert_eq!(names.claim("Pet", "a").unwrap(), "Pet");
        assert_eq!(names.claim("Pet", "b").unwrap(), "Pet1");
        assert_eq!(names.claim("Pet", "c").unwrap(), "Pet2");
    }

    #[test]
    fn test_claim_budget_exhausted() {
        let mut names = TypeNames::default();
        names.reserve("Pet");
        for i in 1..=MAX_NAME_SUFFIX {
            names.reserve(&format!("Pet{i}"));
        }
        let err = names.claim("Pet", "components.schemas.Pet").unwrap_err();
        assert_eq!(err.budget, MAX_NAME_SUFFIX);
        assert_eq!(err.location, "components.schemas.Pet");
    }
}
