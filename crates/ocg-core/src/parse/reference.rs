use indexmap::IndexMap;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};

/// Ordered, string-keyed mapping used for every named registry in the document.
pub type StrMap<T> = IndexMap<String, T>;

/// Separator used to carry a nested breadcrumb inside a deserialization error
/// message until the top-level parser unfolds it.
pub(crate) const NESTED_PATH_MARK: char = '\u{1f}';

/// A `$ref` pointer or an inline object.
#[derive(Debug, Clone, PartialEq)]
pub enum RefOr<T> {
    Ref { ref_path: String },
    Item(T),
}

impl<T> RefOr<T> {
    /// The pointer, when this is a reference.
    pub fn ref_path(&self) -> Option<&str> {
        match self {
            RefOr::Ref { ref_path } => Some(ref_path),
            RefOr::Item(_) => None,
        }
    }

    pub fn as_item(&self) -> Option<&T> {
        match self {
            RefOr::Item(item) => Some(item),
            RefOr::Ref { .. } => None,
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for RefOr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;

        if let Some(pointer) = value.as_object().and_then(|obj| obj.get("$ref")) {
            return match pointer.as_str() {
                Some(ref_path) => Ok(RefOr::Ref {
                    ref_path: ref_path.to_string(),
                }),
                None => Err(D::Error::custom(nest(
                    "$ref",
                    "expected a string pointer".to_string(),
                ))),
            };
        }

        serde_path_to_error::deserialize(value)
            .map(RefOr::Item)
            .map_err(|err| {
                let path = err.path().to_string();
                D::Error::custom(nest(&path, err.into_inner().to_string()))
            })
    }
}

/// Prefix `message` with the breadcrumb it was raised at, unless it was raised
/// at the root of the buffered value.
fn nest(path: &str, message: String) -> String {
    if path == "." {
        message
    } else {
        format!("{NESTED_PATH_MARK}{path}{NESTED_PATH_MARK}{message}")
    }
}

/// Unfold nested breadcrumbs carried in `message` onto `path`.
pub(crate) fn unfold_breadcrumb(mut path: String, mut message: String) -> (String, String) {
    while let Some(rest) = message.strip_prefix(NESTED_PATH_MARK) {
        let Some((segment, tail)) = rest.split_once(NESTED_PATH_MARK) else {
            break;
        };
        if path.is_empty() || path == "." {
            path = segment.to_string();
        } else {
            path = format!("{path}.{segment}");
        }
        message = tail.to_string();
    }
    (path, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        name: String,
    }

    #[test]
    fn test_ref_variant() {
        let parsed: RefOr<Named> =
            serde_json::from_str(r##"{"$ref": "#/components/schemas/Pet"}"##).unwrap();
        assert_eq!(parsed.ref_path(), Some("#/components/schemas/Pet"));
    }

    #[test]
    fn test_item_variant() {
        let parsed: RefOr<Named> = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        assert_eq!(
            parsed.as_item(),
            Some(&Named {
                name: "x".to_string()
            })
        );
    }

    #[test]
    fn test_unfold_nested_breadcrumb() {
        let message = format!(
            "{m}properties.id{m}{m}type{m}unknown variant",
            m = NESTED_PATH_MARK
        );
        let (path, message) = unfold_breadcrumb("components.schemas.Pet".to_string(), message);
        assert_eq!(path, "components.schemas.Pet.properties.id.type");
        assert_eq!(message, "unknown variant");
    }
}
