//! `$ref` and `allOf` resolution
//!
//! Only the two constructs example synthesis needs are handled. Every other
//! node passes through unchanged; this is not a schema normalizer.

use serde_json::{Map, Value};
use tracing::trace;

/// Maximum pointer hops followed while resolving a single node.
///
/// Together with the expansion chain this keeps `A -> B -> A` reference
/// cycles from recursing forever.
pub const MAX_REF_DEPTH: usize = 32;

/// Look up a local `#/...` reference in `document`.
///
/// Returns `None` for external references, missing targets and `null`
/// targets.
#[must_use]
pub fn dereference<'a>(document: &'a Value, reference: &str) -> Option<&'a Value> {
    let pointer = reference.strip_prefix('#')?;
    let pointer = if pointer.is_empty() || pointer.starts_with('/') {
        pointer.to_string()
    } else {
        format!("/{pointer}")
    };

    document.pointer(&pointer).filter(|target| !target.is_null())
}

/// Resolve indirection and composition at the top of `node`.
///
/// An unresolvable reference yields `None`; the exploration surface then
/// simply has no example to offer. A reference that is already being
/// expanded further up (directly or through `allOf`) is unresolvable.
#[must_use]
pub fn resolve(document: &Value, node: &Value) -> Option<Value> {
    let mut chain = Vec::new();
    resolve_at(document, node, &mut chain)
}

fn resolve_at<'a>(
    document: &'a Value,
    node: &'a Value,
    chain: &mut Vec<&'a str>,
) -> Option<Value> {
    if node.is_null() {
        return None;
    }

    if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
        if chain.len() >= MAX_REF_DEPTH {
            trace!(reference, "Reference chain too deep, giving up");
            return None;
        }
        if chain.contains(&reference) {
            trace!(reference, "Reference cycle, giving up");
            return None;
        }
        let target = dereference(document, reference)?;
        chain.push(reference);
        let resolved = resolve_at(document, target, chain);
        chain.pop();
        return resolved;
    }

    if let Some(parts) = node.get("allOf").and_then(Value::as_array) {
        return Some(merge_all_of(document, parts, chain));
    }

    Some(node.clone())
}

fn merge_all_of<'a>(
    document: &'a Value,
    parts: &'a [Value],
    chain: &mut Vec<&'a str>,
) -> Value {
    let mut properties = Map::new();
    let mut required: Vec<Value> = Vec::new();

    for part in parts {
        let Some(resolved) = resolve_at(document, part, chain) else {
            continue;
        };

        if let Some(props) = resolved.get("properties").and_then(Value::as_object) {
            for (name, schema) in props {
                properties.insert(name.clone(), schema.clone());
            }
        }

        if let Some(names) = resolved.get("required").and_then(Value::as_array) {
            for name in names {
                if !required.contains(name) {
                    required.push(name.clone());
                }
            }
        }
    }

    let mut out = Map::new();
    out.insert("type".to_string(), Value::String("object".to_string()));
    out.insert("properties".to_string(), Value::Object(properties));
    out.insert("required".to_string(), Value::Array(required));
    Value::Object(out)
}
