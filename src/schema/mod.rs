//! Schema resolution and example synthesis
//!
//! The resolver eliminates `$ref` indirection and `allOf` composition; the
//! synthesizer turns the result into an example value. Together they are
//! enough to pre-fill a request for any catalog operation.

mod example;
mod resolver;

pub use example::{MAX_EXAMPLE_DEPTH, synthesize, synthesize_at, synthesize_with};
pub use resolver::{MAX_REF_DEPTH, dereference, resolve};

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::catalog::{OperationRecord, Parameter, ParameterLocation};

/// A pre-filled exploratory request for one operation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExampleRequest {
    /// Path parameter values keyed by placeholder name
    pub path_params: BTreeMap<String, String>,
    /// Query parameter values
    pub query: Map<String, Value>,
    /// Synthesized JSON body, when the operation declares one
    pub body: Option<Value>,
}

/// Build a pre-filled request from the operation's declared parameters and
/// request-body schema.
#[must_use]
pub fn example_request(document: &Value, op: &OperationRecord) -> ExampleRequest {
    let path_params = op
        .parameters(document, ParameterLocation::Path)
        .iter()
        .map(|param| (param.name.clone(), example_text(param)))
        .collect();

    let query = op
        .parameters(document, ParameterLocation::Query)
        .iter()
        .map(|param| (param.name.clone(), Value::String(example_text(param))))
        .collect();

    let body = op
        .request_body_schema(document)
        .and_then(|schema| synthesize_with(document, &schema));

    ExampleRequest {
        path_params,
        query,
        body,
    }
}

fn example_text(param: &Parameter) -> String {
    match &param.example {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
