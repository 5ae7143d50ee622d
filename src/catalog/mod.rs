//! Operation catalog
//!
//! Flattens the nested `paths -> method -> operation` structure of an API
//! description document into a uniform list of [`OperationRecord`]s, and
//! groups them by tag for browsing.
//!
//! Catalog order is deterministic: path keys are visited in sorted order and
//! methods in [`HttpMethod::ALL`] order. Capability discovery breaks score
//! ties by this order, so two documents declaring the same endpoints in a
//! different order discover the same winners.

mod method;
mod params;

pub use method::HttpMethod;
pub use params::{Parameter, ParameterLocation, build_path, path_params};

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::schema;
use crate::{Error, Result};

/// Tag given to operations that declare none
pub const DEFAULT_TAG: &str = "default";

/// Media types searched for a JSON request body, in order
const JSON_MEDIA_TYPES: [&str; 2] = ["application/json", "application/*+json"];

/// One HTTP endpoint declared by the description document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationRecord {
    /// Unique id within the catalog snapshot
    pub id: String,
    /// `operationId` exactly as declared
    pub operation_id: Option<String>,
    /// HTTP method
    pub method: HttpMethod,
    /// Path template, possibly containing `{name}` placeholders
    pub path: String,
    /// Tags (never empty)
    pub tags: Vec<String>,
    /// Summary, empty when absent
    pub summary: String,
    /// Description, empty when absent
    pub description: String,
    /// The untouched operation object
    #[serde(skip)]
    pub raw: Value,
}

impl OperationRecord {
    /// `"<METHOD> <path>"`, the key groups are sorted by
    #[must_use]
    pub fn sort_key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Placeholder names in the path template
    #[must_use]
    pub fn path_params(&self) -> Vec<String> {
        path_params(&self.path)
    }

    /// Lowercased text searched by free-text capability rules
    #[must_use]
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.operation_id.as_deref().unwrap_or(&self.id),
            self.summary,
            self.description,
            self.path,
            self.tags.join(" ")
        )
        .to_lowercase()
    }

    /// Declared parameters at `location`
    ///
    /// `$ref` entries are followed through `document`; entries that don't
    /// resolve or don't parse are skipped.
    #[must_use]
    pub fn parameters(&self, document: &Value, location: ParameterLocation) -> Vec<Parameter> {
        let Some(list) = self.raw.get("parameters").and_then(Value::as_array) else {
            return Vec::new();
        };

        list.iter()
            .filter_map(|entry| follow_ref(document, entry))
            .filter_map(|entry| serde_json::from_value::<Parameter>(entry.clone()).ok())
            .filter(|param| param.location == location)
            .collect()
    }

    /// Resolved JSON request-body schema, if the operation declares one
    #[must_use]
    pub fn request_body_schema(&self, document: &Value) -> Option<Value> {
        let body = follow_ref(document, self.raw.get("requestBody")?)?;
        let content = body.get("content")?;
        let raw_schema = JSON_MEDIA_TYPES
            .iter()
            .find_map(|media| content.get(*media).and_then(|m| m.get("schema")))?;
        schema::resolve(document, raw_schema)
    }
}

/// Follow a single `$ref` hop, or return the node itself
fn follow_ref<'a>(document: &'a Value, node: &'a Value) -> Option<&'a Value> {
    match node.get("$ref").and_then(Value::as_str) {
        Some(reference) => schema::dereference(document, reference),
        None => Some(node),
    }
}

/// Flatten every declared operation into a record.
///
/// A document without `paths` yields an empty catalog. Only a non-object
/// document is an error.
pub fn flatten_operations(document: &Value) -> Result<Vec<OperationRecord>> {
    let Value::Object(root) = document else {
        return Err(Error::InvalidDocument(
            "description document must be a JSON object".to_string(),
        ));
    };

    let Some(Value::Object(paths)) = root.get("paths") else {
        debug!("Description document has no paths");
        return Ok(Vec::new());
    };

    let mut entries: Vec<(&String, &Value)> = paths.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut operations = Vec::new();
    let mut seen_ids = HashSet::new();

    for (path, item) in entries {
        for method in HttpMethod::ALL {
            let Some(raw) = item.get(method.as_lower()).filter(|v| v.is_object()) else {
                continue;
            };

            let operation_id = raw
                .get("operationId")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_string);
            let id = unique_id(&mut seen_ids, operation_id.as_deref(), method, path);

            operations.push(OperationRecord {
                id,
                operation_id,
                method,
                path: path.clone(),
                tags: read_tags(raw),
                summary: read_str(raw, "summary"),
                description: read_str(raw, "description"),
                raw: raw.clone(),
            });
        }
    }

    debug!(count = operations.len(), "Flattened operations");
    Ok(operations)
}

fn unique_id(
    seen: &mut HashSet<String>,
    declared: Option<&str>,
    method: HttpMethod,
    path: &str,
) -> String {
    let synthesized = format!("{}_{}", method.as_lower(), path);

    let mut id = match declared {
        Some(declared) if !seen.contains(declared) => declared.to_string(),
        Some(declared) => {
            warn!(operation_id = %declared, %method, %path, "Duplicate operationId, using synthesized id");
            synthesized.clone()
        }
        None => synthesized.clone(),
    };

    let mut suffix = 2;
    while seen.contains(&id) {
        id = format!("{synthesized}_{suffix}");
        suffix += 1;
    }

    seen.insert(id.clone());
    id
}

fn read_tags(raw: &Value) -> Vec<String> {
    let tags: Vec<String> = raw
        .get("tags")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if tags.is_empty() {
        vec![DEFAULT_TAG.to_string()]
    } else {
        tags
    }
}

fn read_str(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Group operations by tag.
///
/// An operation with N tags appears in N groups. Each group is sorted by
/// `"<METHOD> <path>"`.
#[must_use]
pub fn group_by_tag(operations: &[OperationRecord]) -> BTreeMap<&str, Vec<&OperationRecord>> {
    let mut groups: BTreeMap<&str, Vec<&OperationRecord>> = BTreeMap::new();
    for op in operations {
        for tag in &op.tags {
            groups.entry(tag.as_str()).or_default().push(op);
        }
    }

    for group in groups.values_mut() {
        group.sort_by_cached_key(|op| op.sort_key());
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_document() -> Value {
        json!({
            "openapi": "3.1.0",
            "paths": {
                "/vocab": {
                    "post": {"operationId": "create_vocab", "tags": ["vocab"], "summary": "Create"},
                    "get": {"operationId": "list_vocab", "tags": ["vocab", "browse"]},
                    "parameters": [{"name": "x", "in": "query"}]
                },
                "/health": {
                    "get": {"summary": "Health check"}
                },
                "/vocab/{vocab_id}": {
                    "delete": {"tags": ["vocab"]},
                    "put": {"tags": []}
                }
            }
        })
    }

    #[test]
    fn test_flatten_visits_every_method() {
        let ops = flatten_operations(&sample_document()).unwrap();
        let keys: Vec<String> = ops.iter().map(OperationRecord::sort_key).collect();
        assert_eq!(
            keys,
            vec![
                "GET /health",
                "GET /vocab",
                "POST /vocab",
                "PUT /vocab/{vocab_id}",
                "DELETE /vocab/{vocab_id}",
            ]
        );
    }

    #[test]
    fn test_flatten_synthesizes_ids_and_default_tags() {
        let ops = flatten_operations(&sample_document()).unwrap();
        let health = ops.iter().find(|op| op.path == "/health").unwrap();
        assert_eq!(health.id, "get_/health");
        assert_eq!(health.operation_id, None);
        assert_eq!(health.tags, vec!["default".to_string()]);
        assert_eq!(health.summary, "Health check");

        let put = ops.iter().find(|op| op.method == HttpMethod::Put).unwrap();
        assert_eq!(put.tags, vec!["default".to_string()]);
    }

    #[test]
    fn test_flatten_missing_paths_is_empty() {
        assert!(flatten_operations(&json!({"openapi": "3.0.0"})).unwrap().is_empty());
        assert!(flatten_operations(&json!({"paths": []})).unwrap().is_empty());
    }

    #[test]
    fn test_flatten_rejects_non_object() {
        let err = flatten_operations(&json!(["not", "a", "document"])).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn test_duplicate_operation_ids_stay_unique() {
        let doc = json!({
            "paths": {
                "/a": {"get": {"operationId": "same"}},
                "/b": {"get": {"operationId": "same"}}
            }
        });
        let ops = flatten_operations(&doc).unwrap();
        assert_eq!(ops[0].id, "same");
        assert_eq!(ops[1].id, "get_/b");
        assert_eq!(ops[1].operation_id.as_deref(), Some("same"));
        assert!(ops[1].search_text().starts_with("same "));
    }

    #[test]
    fn test_group_by_tag_multi_membership_and_order() {
        let ops = flatten_operations(&sample_document()).unwrap();
        let groups = group_by_tag(&ops);

        let vocab: Vec<String> = groups["vocab"].iter().map(|op| op.sort_key()).collect();
        assert_eq!(
            vocab,
            vec!["DELETE /vocab/{vocab_id}", "GET /vocab", "POST /vocab"]
        );
        assert_eq!(groups["browse"].len(), 1);
        assert_eq!(groups["default"].len(), 2);
    }

    #[test]
    fn test_search_text_is_lowercase() {
        let ops = flatten_operations(&sample_document()).unwrap();
        let create = ops.iter().find(|op| op.id == "create_vocab").unwrap();
        assert_eq!(create.search_text(), "create_vocab create  /vocab vocab");
    }

    #[test]
    fn test_parameters_follow_refs() {
        let doc = json!({
            "components": {
                "parameters": {
                    "Limit": {"name": "limit", "in": "query", "example": 30}
                }
            },
            "paths": {
                "/session/today": {
                    "get": {
                        "parameters": [
                            {"$ref": "#/components/parameters/Limit"},
                            {"name": "X-Trace", "in": "header"},
                            {"$ref": "#/components/parameters/Missing"}
                        ]
                    }
                }
            }
        });
        let ops = flatten_operations(&doc).unwrap();
        let query = ops[0].parameters(&doc, ParameterLocation::Query);
        assert_eq!(query.len(), 1);
        assert_eq!(query[0].name, "limit");
        assert_eq!(ops[0].parameters(&doc, ParameterLocation::Header).len(), 1);
        assert!(ops[0].parameters(&doc, ParameterLocation::Path).is_empty());
    }

    #[test]
    fn test_request_body_schema_resolves_ref() {
        let doc = json!({
            "components": {
                "schemas": {
                    "VocabIn": {"type": "object", "properties": {"term": {"type": "string"}}}
                }
            },
            "paths": {
                "/vocab": {
                    "post": {
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/VocabIn"}
                                }
                            }
                        }
                    }
                }
            }
        });
        let ops = flatten_operations(&doc).unwrap();
        let schema = ops[0].request_body_schema(&doc).unwrap();
        assert_eq!(schema["properties"]["term"]["type"], "string");
    }

    #[test]
    fn test_request_body_schema_absent() {
        let doc = sample_document();
        let ops = flatten_operations(&doc).unwrap();
        assert!(ops[0].request_body_schema(&doc).is_none());
    }
}
