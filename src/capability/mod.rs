//! Capability discovery
//!
//! Maps a closed set of application-level capabilities ("add a vocabulary
//! item", "submit a review", ...) onto whichever backend operations look
//! most like them.
//!
//! # Scoring
//!
//! ```text
//! ┌───────────────┐     ┌──────────────────┐     ┌────────────────┐
//! │  Operation    │────▶│  Rule table      │────▶│  CapabilityMap │
//! │  catalog      │     │  (score each op) │     │  (winners)     │
//! └───────────────┘     └──────────────────┘     └────────────────┘
//! ```
//!
//! Each rule either disqualifies an operation or yields an additive score:
//! method +3, path keyword +5, tag keyword +3, text keyword +2, exact path
//! +8, operation-id keyword +3.

mod discovery;
mod rules;

pub use discovery::{Discovery, discover, discover_operations, find_best};
pub use rules::{
    CapabilityRule, EXACT_PATH_BONUS, METHOD_WEIGHT, NO_MATCH, OPERATION_ID_BONUS, PATH_WEIGHT,
    TAG_WEIGHT, TEXT_WEIGHT,
};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::catalog::OperationRecord;

/// A named application-level operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// Backend liveness probe
    Health,
    /// Create a vocabulary item
    AddVocab,
    /// Create-or-update a vocabulary item (optionally AI-assisted)
    UpsertVocab,
    /// List vocabulary items
    ListVocab,
    /// Fetch one vocabulary item
    GetVocab,
    /// Update one vocabulary item
    UpdateVocab,
    /// Delete one vocabulary item
    DeleteVocab,
    /// Today's review session
    SessionToday,
    /// Record a review grade
    SubmitReview,
    /// AI enrichment of a term
    AiEnrich,
    /// AI judgement of a typed answer
    AiJudge,
    /// Export a full backup
    SyncExport,
    /// Import a backup
    SyncImport,
}

impl Capability {
    /// Every capability, in discovery order
    pub const ALL: [Self; 13] = [
        Self::Health,
        Self::AddVocab,
        Self::UpsertVocab,
        Self::ListVocab,
        Self::GetVocab,
        Self::UpdateVocab,
        Self::DeleteVocab,
        Self::SessionToday,
        Self::SubmitReview,
        Self::AiEnrich,
        Self::AiJudge,
        Self::SyncExport,
        Self::SyncImport,
    ];

    /// Wire name (camelCase)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::AddVocab => "addVocab",
            Self::UpsertVocab => "upsertVocab",
            Self::ListVocab => "listVocab",
            Self::GetVocab => "getVocab",
            Self::UpdateVocab => "updateVocab",
            Self::DeleteVocab => "deleteVocab",
            Self::SessionToday => "sessionToday",
            Self::SubmitReview => "submitReview",
            Self::AiEnrich => "aiEnrich",
            Self::AiJudge => "aiJudge",
            Self::SyncExport => "syncExport",
            Self::SyncImport => "syncImport",
        }
    }

    /// The ordered rule list used to discover this capability
    #[must_use]
    pub const fn rules(self) -> &'static [CapabilityRule] {
        match self {
            Self::Health => rules::HEALTH,
            Self::AddVocab => rules::ADD_VOCAB,
            Self::UpsertVocab => rules::UPSERT_VOCAB,
            Self::ListVocab => rules::LIST_VOCAB,
            Self::GetVocab => rules::GET_VOCAB,
            Self::UpdateVocab => rules::UPDATE_VOCAB,
            Self::DeleteVocab => rules::DELETE_VOCAB,
            Self::SessionToday => rules::SESSION_TODAY,
            Self::SubmitReview => rules::SUBMIT_REVIEW,
            Self::AiEnrich => rules::AI_ENRICH,
            Self::AiJudge => rules::AI_JUDGE,
            Self::SyncExport => rules::SYNC_EXPORT,
            Self::SyncImport => rules::SYNC_IMPORT,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cap| cap.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Config(format!("Unknown capability '{s}'")))
    }
}

/// Winning operation per discovered capability.
///
/// Undiscovered capabilities are simply absent; there is no "matched to
/// nothing" entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapabilityMap {
    winners: BTreeMap<Capability, OperationRecord>,
}

impl CapabilityMap {
    pub(crate) fn insert(&mut self, capability: Capability, op: OperationRecord) {
        self.winners.insert(capability, op);
    }

    /// The operation discovered for `capability`
    #[must_use]
    pub fn get(&self, capability: Capability) -> Option<&OperationRecord> {
        self.winners.get(&capability)
    }

    /// Whether `capability` was discovered
    #[must_use]
    pub fn contains(&self, capability: Capability) -> bool {
        self.winners.contains_key(&capability)
    }

    /// Discovered capabilities with their operations
    pub fn iter(&self) -> impl Iterator<Item = (Capability, &OperationRecord)> {
        self.winners.iter().map(|(cap, op)| (*cap, op))
    }

    /// Number of discovered capabilities
    #[must_use]
    pub fn len(&self) -> usize {
        self.winners.len()
    }

    /// Whether nothing was discovered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }
}
