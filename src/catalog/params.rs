//! Path templates and declared parameters

use std::collections::BTreeMap;
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Characters `encodeURIComponent` leaves alone
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Where a parameter travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// `{name}` in the path template
    Path,
    /// URL query string
    Query,
    /// Request header
    Header,
    /// Cookie
    Cookie,
}

/// A declared operation parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Whether the backend requires it
    #[serde(default)]
    pub required: bool,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Declared example value
    #[serde(default)]
    pub example: Option<Value>,
    /// Parameter schema (unresolved)
    #[serde(default)]
    pub schema: Option<Value>,
}

/// Placeholder names in a path template, in declaration order
#[must_use]
pub fn path_params(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Substitute every placeholder with its percent-encoded value.
///
/// A placeholder without a value is replaced by the empty string.
#[must_use]
pub fn build_path(template: &str, params: &BTreeMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let value = params.get(&caps[1]).map_or("", String::as_str);
            utf8_percent_encode(value, COMPONENT).to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_params_in_order() {
        assert_eq!(
            path_params("/decks/{deckId}/cards/{card_id}"),
            vec!["deckId".to_string(), "card_id".to_string()]
        );
        assert!(path_params("/vocab").is_empty());
    }

    #[test]
    fn test_build_path_encodes_values() {
        let mut params = BTreeMap::new();
        params.insert("id".to_string(), "a b/c?d".to_string());
        assert_eq!(build_path("/vocab/{id}", &params), "/vocab/a%20b%2Fc%3Fd");
    }

    #[test]
    fn test_build_path_keeps_unreserved() {
        let mut params = BTreeMap::new();
        params.insert("id".to_string(), "it's-ok_(1).~*!".to_string());
        assert_eq!(build_path("/vocab/{id}", &params), "/vocab/it's-ok_(1).~*!");
    }

    #[test]
    fn test_build_path_missing_value_is_empty() {
        let params = BTreeMap::new();
        assert_eq!(build_path("/vocab/{id}/logs", &params), "/vocab//logs");
    }

    #[test]
    fn test_parameter_deserializes_openapi_shape() {
        let param: Parameter = serde_json::from_value(serde_json::json!({
            "name": "limit",
            "in": "query",
            "schema": {"type": "integer"},
            "example": 30
        }))
        .unwrap();
        assert_eq!(param.location, ParameterLocation::Query);
        assert!(!param.required);
        assert_eq!(param.example, Some(serde_json::json!(30)));
    }
}
