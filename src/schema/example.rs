//! Example payload synthesis
//!
//! Walks a resolved schema and produces a representative value used to
//! pre-fill exploratory requests.

use serde_json::{Map, Value};

use super::resolver::resolve;

/// Deepest nesting level synthesized; anything below becomes `null`
pub const MAX_EXAMPLE_DEPTH: usize = 6;

/// Synthesize an example for `schema`, starting at depth 0
#[must_use]
pub fn synthesize(schema: &Value) -> Option<Value> {
    synthesize_at(schema, 0)
}

/// Synthesize an example for a schema found at nesting level `depth`.
///
/// Returns `None` past [`MAX_EXAMPLE_DEPTH`] or for a `null` schema.
#[must_use]
pub fn synthesize_at(schema: &Value, depth: usize) -> Option<Value> {
    synthesize_node(None, schema, depth)
}

/// Like [`synthesize`], but nested `$ref`/`allOf` nodes are resolved
/// against `document` as they are reached.
///
/// The depth cap is what makes this terminate on self-referential schemas.
#[must_use]
pub fn synthesize_with(document: &Value, schema: &Value) -> Option<Value> {
    synthesize_node(Some(document), schema, 0)
}

fn synthesize_node(document: Option<&Value>, schema: &Value, depth: usize) -> Option<Value> {
    if schema.is_null() || depth > MAX_EXAMPLE_DEPTH {
        return None;
    }

    let resolved;
    let schema = match document {
        Some(doc) => {
            resolved = resolve(doc, schema)?;
            &resolved
        }
        None => schema,
    };

    if let Some(example) = schema.get("example") {
        return Some(example.clone());
    }

    if let Some(first) = schema
        .get("enum")
        .and_then(Value::as_array)
        .and_then(|values| values.first())
    {
        return Some(first.clone());
    }

    let kind = schema.get("type").and_then(Value::as_str);
    let properties = schema.get("properties");

    if kind == Some("object") || properties.is_some() {
        let mut out = Map::new();
        if let Some(props) = properties.and_then(Value::as_object) {
            for (name, prop) in props {
                let value = synthesize_node(document, prop, depth + 1).unwrap_or(Value::Null);
                out.insert(name.clone(), value);
            }
        }
        return Some(Value::Object(out));
    }

    if kind == Some("array") {
        let empty = Value::Object(Map::new());
        let items = schema.get("items").unwrap_or(&empty);
        let item = synthesize_node(document, items, depth + 1).unwrap_or(Value::Null);
        return Some(Value::Array(vec![item]));
    }

    Some(match kind {
        Some("integer" | "number") => Value::from(0),
        Some("boolean") => Value::Bool(false),
        _ => Value::String(String::new()),
    })
}
