//! Sequential bulk save

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::ApiClient;
use crate::capability::Capability;
use crate::{Error, Result};

/// Flags merged into every upsert payload
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkOptions {
    /// Replace fields of records that already exist
    pub overwrite_existing: bool,
    /// Let the backend fill gaps with AI suggestions
    pub use_ai: bool,
}

/// One row that failed to save
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    /// 1-based position in the input
    pub row_no: usize,
    /// Term of the failed row
    pub term: String,
    /// Error message
    pub message: String,
}

/// Outcome of [`ApiClient::bulk_save`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    /// Rows attempted
    pub total: usize,
    /// Rows saved
    pub success: usize,
    /// Rows rejected
    pub failed: usize,
    /// New records
    pub created: usize,
    /// Existing records changed by an upsert
    pub updated: usize,
    /// Existing records pushed back into the review queue
    pub readded: usize,
    /// Per-row failures in input order
    pub failures: Vec<BulkFailure>,
}

fn row_term(row: &Value) -> Option<&str> {
    row.get("term")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|term| !term.is_empty())
}

fn upsert_payload(row: &Value, options: BulkOptions) -> Value {
    let mut payload = row.clone();
    if let Some(map) = payload.as_object_mut() {
        map.insert("overwriteExisting".to_string(), json!(options.overwrite_existing));
        map.insert("useAi".to_string(), json!(options.use_ai));
        map.entry("autoFixOnValidationFail").or_insert(json!(true));
        map.entry("forceAi").or_insert(json!(false));
    }
    payload
}

impl ApiClient {
    /// Save vocab rows one at a time.
    ///
    /// Uses `upsertVocab` when the backend has it, else `addVocab`. Rows
    /// without a non-blank `term` are skipped and never counted. A failed
    /// row is recorded and the loop moves on.
    pub async fn bulk_save(&self, rows: &[Value], options: BulkOptions) -> Result<BulkReport> {
        let use_upsert = self.has(Capability::UpsertVocab);
        if !use_upsert && !self.has(Capability::AddVocab) {
            return Err(Error::CapabilityUnavailable(Capability::AddVocab));
        }

        let entries: Vec<(usize, &str, &Value)> = rows
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| row_term(row).map(|term| (idx + 1, term, row)))
            .collect();

        let mut report = BulkReport {
            total: entries.len(),
            ..BulkReport::default()
        };

        for (row_no, term, row) in entries {
            let result = if use_upsert {
                self.upsert_vocab(&upsert_payload(row, options)).await
            } else {
                self.add_vocab(row).await
            };

            match result {
                Ok(saved) => {
                    report.success += 1;
                    if use_upsert {
                        match saved.get("action").and_then(Value::as_str) {
                            Some("created") => report.created += 1,
                            Some("updated") => report.updated += 1,
                            _ => {}
                        }
                    } else if saved.get("readdCount").and_then(Value::as_i64).unwrap_or(0) > 0 {
                        report.readded += 1;
                    } else {
                        report.created += 1;
                    }
                }
                Err(e) => {
                    warn!(row_no, term, error = %e, "Bulk row failed");
                    report.failed += 1;
                    report.failures.push(BulkFailure {
                        row_no,
                        term: term.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            total = report.total,
            success = report.success,
            failed = report.failed,
            "Bulk save finished"
        );
        Ok(report)
    }
}
