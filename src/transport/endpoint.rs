//! Request URL construction

use serde_json::Value;
use url::Url;

use super::Query;
use crate::{Error, Result};

/// Trim whitespace and a single trailing slash from a base URL
#[must_use]
pub fn normalize_base_url(base_url: &str) -> &str {
    let trimmed = base_url.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed)
}

/// Join base URL, path and query into a request URL.
///
/// Query entries whose value is `null` or `""` are skipped; arrays become
/// one repeated key per element.
pub fn build_url(base_url: &str, path: &str, query: &Query) -> Result<String> {
    let root = normalize_base_url(base_url);
    let joined = if path.starts_with('/') {
        format!("{root}{path}")
    } else {
        format!("{root}/{path}")
    };

    let mut url =
        Url::parse(&joined).map_err(|e| Error::Config(format!("Invalid URL '{joined}': {e}")))?;

    let pairs = query_pairs(query);
    if !pairs.is_empty() {
        let mut serializer = url.query_pairs_mut();
        for (key, value) in &pairs {
            serializer.append_pair(key, value);
        }
    }

    Ok(url.to_string())
}

fn query_pairs(query: &Query) -> Vec<(&str, String)> {
    let mut pairs = Vec::new();
    for (key, value) in query {
        match value {
            Value::Array(items) => {
                pairs.extend(
                    items
                        .iter()
                        .filter_map(query_text)
                        .map(|text| (key.as_str(), text)),
                );
            }
            other => {
                if let Some(text) = query_text(other).filter(|text| !text.is_empty()) {
                    pairs.push((key.as_str(), text));
                }
            }
        }
    }
    pairs
}

fn query_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn query(value: Value) -> Query {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_trailing_slash_and_leading_slash() {
        assert_eq!(
            build_url("http://localhost:8000/", "health", &Query::new()).unwrap(),
            "http://localhost:8000/health"
        );
        assert_eq!(
            build_url("  http://api.test/v1  ", "/vocab", &Query::new()).unwrap(),
            "http://api.test/v1/vocab"
        );
    }

    #[test]
    fn test_skips_null_and_empty_values() {
        let url = build_url(
            "http://api.test",
            "/x",
            &query(json!({"tag": null, "search": "", "page": 1, "ids": ["a", "b"]})),
        )
        .unwrap();
        assert_eq!(url, "http://api.test/x?page=1&ids=a&ids=b");
    }

    #[test]
    fn test_repeated_keys_and_scalars() {
        let url = build_url(
            "http://api.test",
            "/x",
            &query(json!({"due": true, "limit": 30, "q": "a b&c"})),
        )
        .unwrap();
        assert_eq!(url, "http://api.test/x?due=true&limit=30&q=a+b%26c");
    }

    #[test]
    fn test_empty_array_contributes_nothing() {
        let url = build_url("http://api.test", "/x", &query(json!({"ids": []}))).unwrap();
        assert_eq!(url, "http://api.test/x");
    }

    #[test]
    fn test_invalid_base_is_config_error() {
        let err = build_url("not a url", "/x", &Query::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
