use serde::Deserialize;

use super::reference::StrMap;

/// A server variable for URL templates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerVariable {
    pub default: String,

    pub description: Option<String>,

    #[serde(rename = "enum", default)]
    pub enum_values: Vec<String>,
}

/// A server URL definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Server {
    pub url: String,

    pub description: Option<String>,

    #[serde(default)]
    pub variables: StrMap<ServerVariable>,
}

impl Server {
    /// The server URL with every `{variable}` replaced by its default.
    pub fn default_url(&self) -> String {
        self.variables
            .iter()
            .fold(self.url.clone(), |url, (name, variable)| {
                url.replace(&format!("{{{name}}}"), &variable.default)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url_substitutes_variables() {
        let server: Server = serde_json::from_str(
            r#"{
                "url": "https://{region}.example.com/{version}",
                "variables": {
                    "region": {"default": "eu", "enum": ["eu", "us"]},
                    "version": {"default": "v2"}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(server.default_url(), "https://eu.example.com/v2");
    }
}
