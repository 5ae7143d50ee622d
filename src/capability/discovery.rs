//! Best-operation selection

use serde_json::Value;
use tracing::{debug, info};

use super::{Capability, CapabilityMap, CapabilityRule, NO_MATCH};
use crate::Result;
use crate::catalog::{OperationRecord, flatten_operations};

/// Result of one discovery pass over a description document
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Every operation in catalog order
    pub operations: Vec<OperationRecord>,
    /// Winning operation per discovered capability
    pub capabilities: CapabilityMap,
}

/// Pick the operation with the highest score under any of `rules`.
///
/// Operations are visited in catalog order and rules in listed order; a
/// later pair only wins with a strictly greater score, so ties go to the
/// first operation that reached the maximum. Returns the winner and its
/// score, or `None` when every pair scored [`NO_MATCH`].
#[must_use]
pub fn find_best<'a>(
    operations: &'a [OperationRecord],
    rules: &[CapabilityRule],
) -> Option<(&'a OperationRecord, i32)> {
    let mut best = None;
    let mut best_score = NO_MATCH;

    for op in operations {
        for rule in rules {
            let score = rule.score(op);
            if score > best_score {
                best = Some(op);
                best_score = score;
            }
        }
    }

    best.map(|op| (op, best_score))
}

/// Flatten `document` and discover every capability
pub fn discover(document: &Value) -> Result<Discovery> {
    let operations = flatten_operations(document)?;
    Ok(discover_operations(operations))
}

/// Discover every capability over an already flattened catalog
#[must_use]
pub fn discover_operations(operations: Vec<OperationRecord>) -> Discovery {
    let mut capabilities = CapabilityMap::default();

    for capability in Capability::ALL {
        if let Some((op, score)) = find_best(&operations, capability.rules()) {
            debug!(
                %capability,
                method = %op.method,
                path = %op.path,
                score,
                "Capability matched"
            );
            capabilities.insert(capability, op.clone());
        }
    }

    info!(
        operations = operations.len(),
        capabilities = capabilities.len(),
        "Discovery complete"
    );

    Discovery {
        operations,
        capabilities,
    }
}
