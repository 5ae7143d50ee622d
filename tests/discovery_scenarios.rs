//! Capability discovery over realistic description documents

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use vocab_client::capability::{Capability, discover};
use vocab_client::catalog::{HttpMethod, flatten_operations};
use vocab_client::client::{ApiClient, RequestDefaults};
use vocab_client::schema::{example_request, resolve, synthesize_with};
use vocab_client::transport::{ApiRequest, RequestOutcome, Transport};
use vocab_client::{Error, Result};

/// Counts calls and answers `null`
#[derive(Default)]
struct Counting(AtomicUsize);

#[async_trait]
impl Transport for Counting {
    async fn execute(&self, request: ApiRequest) -> Result<RequestOutcome> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(RequestOutcome {
            status: 200,
            data: None,
            url: request.url()?,
            method: request.method,
        })
    }
}

/// A backend shaped like the vocab trainer's FastAPI service
fn trainer_document() -> Value {
    json!({
        "openapi": "3.1.0",
        "paths": {
            "/health": {"get": {"summary": "Health"}},
            "/vocab": {
                "get": {"tags": ["vocab"], "operationId": "list_vocab_vocab_get"},
                "post": {
                    "tags": ["vocab"],
                    "operationId": "create_vocab_vocab_post",
                    "requestBody": {"content": {"application/json": {
                        "schema": {"$ref": "#/components/schemas/VocabCreate"}
                    }}}
                }
            },
            "/vocab/upsert": {"post": {"tags": ["vocab"], "summary": "Upsert with AI"}},
            "/vocab/{vocab_id}": {
                "get": {"tags": ["vocab"]},
                "put": {"tags": ["vocab"]},
                "delete": {"tags": ["vocab"]}
            },
            "/session/today": {"get": {"tags": ["session"]}},
            "/review": {"post": {"tags": ["review"]}},
            "/review/logs": {"post": {"tags": ["review"]}},
            "/ai/enrich": {"post": {"tags": ["ai"]}},
            "/ai/judge-equivalence": {"post": {"tags": ["ai"]}},
            "/sync/export": {"get": {"tags": ["sync"]}},
            "/sync/import": {"post": {"tags": ["sync"]}}
        },
        "components": {"schemas": {
            "VocabBase": {
                "type": "object",
                "properties": {
                    "term": {"type": "string", "example": "ubiquitous"},
                    "meanings": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["term"]
            },
            "VocabCreate": {"allOf": [
                {"$ref": "#/components/schemas/VocabBase"},
                {"properties": {"inputMethod": {"enum": ["typed", "pasted"]}}, "required": ["inputMethod"]}
            ]}
        }}
    })
}

fn winner(document: &Value, capability: Capability) -> Option<(HttpMethod, String)> {
    discover(document)
        .unwrap()
        .capabilities
        .get(capability)
        .map(|op| (op.method, op.path.clone()))
}

#[test]
fn test_upsert_endpoint_is_preferred_only_for_upsert() {
    let document = json!({"paths": {
        "/vocab": {"post": {"tags": ["vocab"]}},
        "/vocab/upsert": {"post": {"tags": ["vocab"]}}
    }});

    assert_eq!(
        winner(&document, Capability::UpsertVocab),
        Some((HttpMethod::Post, "/vocab/upsert".to_string()))
    );
    assert_eq!(
        winner(&document, Capability::AddVocab),
        Some((HttpMethod::Post, "/vocab".to_string()))
    );
}

#[test]
fn test_full_backend_discovers_every_capability() {
    let discovery = discover(&trainer_document()).unwrap();
    let found: Vec<(Capability, String)> = discovery
        .capabilities
        .iter()
        .map(|(capability, op)| (capability, op.sort_key()))
        .collect();

    assert_eq!(
        found,
        vec![
            (Capability::Health, "GET /health".to_string()),
            (Capability::AddVocab, "POST /vocab".to_string()),
            (Capability::UpsertVocab, "POST /vocab/upsert".to_string()),
            (Capability::ListVocab, "GET /vocab".to_string()),
            // Either item keyword qualifies, so the collection ties and comes first
            (Capability::GetVocab, "GET /vocab".to_string()),
            (Capability::UpdateVocab, "PUT /vocab/{vocab_id}".to_string()),
            (Capability::DeleteVocab, "DELETE /vocab/{vocab_id}".to_string()),
            (Capability::SessionToday, "GET /session/today".to_string()),
            (Capability::SubmitReview, "POST /review".to_string()),
            (Capability::AiEnrich, "POST /ai/enrich".to_string()),
            (Capability::AiJudge, "POST /ai/judge-equivalence".to_string()),
            (Capability::SyncExport, "GET /sync/export".to_string()),
            (Capability::SyncImport, "POST /sync/import".to_string()),
        ]
    );
}

#[test]
fn test_discovery_is_deterministic() {
    let document = trainer_document();
    let first = discover(&document).unwrap();
    for _ in 0..5 {
        let again = discover(&document).unwrap();
        assert_eq!(again.operations, first.operations);
        for capability in Capability::ALL {
            assert_eq!(
                again.capabilities.get(capability),
                first.capabilities.get(capability)
            );
        }
    }
}

#[test]
fn test_composition_resolution_is_idempotent() {
    let document = trainer_document();
    let node = json!({"$ref": "#/components/schemas/VocabCreate"});

    let once = resolve(&document, &node).unwrap();
    let twice = resolve(&document, &once).unwrap();

    assert_eq!(once, twice);
    assert_eq!(once["required"], json!(["term", "inputMethod"]));
}

#[test]
fn test_request_example_from_composed_body() {
    let document = trainer_document();
    let operations = flatten_operations(&document).unwrap();
    let create = operations
        .iter()
        .find(|op| op.id == "create_vocab_vocab_post")
        .unwrap();

    let example = example_request(&document, create);
    assert_eq!(
        example.body,
        Some(json!({"term": "ubiquitous", "meanings": [""], "inputMethod": "typed"}))
    );
}

#[test]
fn test_request_example_from_recursive_composition() {
    let document = json!({
        "paths": {"/review": {"post": {
            "operationId": "submit_review",
            "requestBody": {"content": {"application/json": {
                "schema": {"$ref": "#/components/schemas/Review"}
            }}}
        }}},
        "components": {"schemas": {
            "Review": {"allOf": [
                {"$ref": "#/components/schemas/Review"},
                {"$ref": "#/components/schemas/Grade"},
                {"$ref": "#/components/schemas/Review"}
            ]},
            "Grade": {"allOf": [
                {"$ref": "#/components/schemas/Review"},
                {"properties": {"grade": {"type": "integer"}}, "required": ["grade"]}
            ]}
        }}
    });
    let operations = flatten_operations(&document).unwrap();

    let example = example_request(&document, &operations[0]);
    assert_eq!(example.body, Some(json!({"grade": 0})));
}

#[test]
fn test_self_referential_synthesis_terminates() {
    let document = json!({"components": {"schemas": {"Node": {
        "type": "object",
        "properties": {"next": {"$ref": "#/components/schemas/Node"}}
    }}}});

    let example = synthesize_with(&document, &json!({"$ref": "#/components/schemas/Node"})).unwrap();

    let mut depth = 0;
    let mut cursor = &example;
    while let Some(next) = cursor.get("next") {
        depth += 1;
        cursor = next;
    }
    assert_eq!(depth, 7);
    assert_eq!(*cursor, Value::Null);
}

#[tokio::test]
async fn test_empty_document_has_nothing_and_calls_nothing() {
    let transport = Arc::new(Counting::default());
    let client = ApiClient::new(
        json!({}),
        "http://localhost:8000",
        Arc::clone(&transport) as Arc<dyn Transport>,
        RequestDefaults::default(),
    )
    .unwrap();

    assert!(client.operations().is_empty());
    assert!(client.capabilities().is_empty());
    for capability in Capability::ALL {
        assert!(!client.has(capability));
    }

    let err = client.add_vocab(&json!({"term": "x"})).await.unwrap_err();
    assert!(matches!(err, Error::CapabilityUnavailable(Capability::AddVocab)));
    assert_eq!(transport.0.load(Ordering::SeqCst), 0);
}
