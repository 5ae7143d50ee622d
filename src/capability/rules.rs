//! Capability scoring rules
//!
//! The rule table is plain data. Adding a capability means appending rows;
//! the scoring function itself never changes.

use crate::catalog::{HttpMethod, OperationRecord};

/// Score of an operation that violates a rule constraint
pub const NO_MATCH: i32 = -1;

/// Score added when the method matches
pub const METHOD_WEIGHT: i32 = 3;
/// Score added when a path keyword matches
pub const PATH_WEIGHT: i32 = 5;
/// Score added when a tag keyword matches
pub const TAG_WEIGHT: i32 = 3;
/// Score added when a free-text keyword matches
pub const TEXT_WEIGHT: i32 = 2;
/// Bonus for an exact (case-insensitive) path match
pub const EXACT_PATH_BONUS: i32 = 8;
/// Bonus when the operation id contains the preferred keyword
pub const OPERATION_ID_BONUS: i32 = 3;

/// One scoring rule for one capability.
///
/// Keyword lists match when ANY keyword is a case-insensitive substring of
/// the subject. A `None` list is no constraint and earns no score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityRule {
    /// Required method
    pub method: Option<HttpMethod>,
    /// Path must contain one of these
    pub path_includes: Option<&'static [&'static str]>,
    /// Path must contain none of these
    pub path_excludes: Option<&'static [&'static str]>,
    /// Space-joined tags must contain one of these
    pub tag_includes: Option<&'static [&'static str]>,
    /// Full operation text must contain one of these
    pub text_includes: Option<&'static [&'static str]>,
    /// Bonus when the path equals this
    pub prefer_path_exact: Option<&'static str>,
    /// Bonus when the operation id contains this
    pub prefer_operation_id: Option<&'static str>,
}

impl CapabilityRule {
    /// A rule with no constraints
    pub const EMPTY: Self = Self {
        method: None,
        path_includes: None,
        path_excludes: None,
        tag_includes: None,
        text_includes: None,
        prefer_path_exact: None,
        prefer_operation_id: None,
    };

    /// Score `op` against this rule: [`NO_MATCH`] or a non-negative sum
    #[must_use]
    pub fn score(&self, op: &OperationRecord) -> i32 {
        if self.method.is_some_and(|m| m != op.method) {
            return NO_MATCH;
        }
        if self.path_includes.is_some_and(|k| !includes_any(&op.path, k)) {
            return NO_MATCH;
        }
        if self.path_excludes.is_some_and(|k| includes_any(&op.path, k)) {
            return NO_MATCH;
        }
        if self
            .tag_includes
            .is_some_and(|k| !includes_any(&op.tags.join(" "), k))
        {
            return NO_MATCH;
        }
        if self
            .text_includes
            .is_some_and(|k| !includes_any(&op.search_text(), k))
        {
            return NO_MATCH;
        }

        let mut score = 0;
        if self.method.is_some() {
            score += METHOD_WEIGHT;
        }
        if self.path_includes.is_some() {
            score += PATH_WEIGHT;
        }
        if self.tag_includes.is_some() {
            score += TAG_WEIGHT;
        }
        if self.text_includes.is_some() {
            score += TEXT_WEIGHT;
        }
        if self
            .prefer_path_exact
            .is_some_and(|exact| op.path.eq_ignore_ascii_case(exact))
        {
            score += EXACT_PATH_BONUS;
        }
        if self
            .prefer_operation_id
            .is_some_and(|keyword| includes_any(&op.id, &[keyword]))
        {
            score += OPERATION_ID_BONUS;
        }
        score
    }
}

fn includes_any(text: &str, keywords: &[&str]) -> bool {
    let text = text.to_lowercase();
    keywords
        .iter()
        .any(|keyword| text.contains(&keyword.to_lowercase()))
}

const VOCAB_ITEM: &[&str] = &["/vocab", "{"];

pub(super) const HEALTH: &[CapabilityRule] = &[CapabilityRule {
    method: Some(HttpMethod::Get),
    path_includes: Some(&["health"]),
    prefer_path_exact: Some("/health"),
    ..CapabilityRule::EMPTY
}];

pub(super) const ADD_VOCAB: &[CapabilityRule] = &[
    CapabilityRule {
        method: Some(HttpMethod::Post),
        tag_includes: Some(&["vocab"]),
        path_includes: Some(&["/vocab"]),
        path_excludes: Some(&["upsert"]),
        ..CapabilityRule::EMPTY
    },
    CapabilityRule {
        method: Some(HttpMethod::Post),
        path_includes: Some(&["/vocab"]),
        path_excludes: Some(&["upsert"]),
        ..CapabilityRule::EMPTY
    },
];

pub(super) const UPSERT_VOCAB: &[CapabilityRule] = &[
    CapabilityRule {
        method: Some(HttpMethod::Post),
        tag_includes: Some(&["vocab"]),
        path_includes: Some(&["upsert"]),
        ..CapabilityRule::EMPTY
    },
    CapabilityRule {
        method: Some(HttpMethod::Post),
        text_includes: Some(&["upsert", "ai"]),
        path_includes: Some(&["vocab"]),
        ..CapabilityRule::EMPTY
    },
];

pub(super) const LIST_VOCAB: &[CapabilityRule] = &[
    CapabilityRule {
        method: Some(HttpMethod::Get),
        tag_includes: Some(&["vocab"]),
        path_includes: Some(&["/vocab"]),
        path_excludes: Some(&["{"]),
        prefer_path_exact: Some("/vocab"),
        ..CapabilityRule::EMPTY
    },
    CapabilityRule {
        method: Some(HttpMethod::Get),
        path_includes: Some(&["/vocab"]),
        path_excludes: Some(&["{"]),
        ..CapabilityRule::EMPTY
    },
];

pub(super) const GET_VOCAB: &[CapabilityRule] = &[CapabilityRule {
    method: Some(HttpMethod::Get),
    tag_includes: Some(&["vocab"]),
    path_includes: Some(VOCAB_ITEM),
    ..CapabilityRule::EMPTY
}];

pub(super) const UPDATE_VOCAB: &[CapabilityRule] = &[
    CapabilityRule {
        method: Some(HttpMethod::Put),
        tag_includes: Some(&["vocab"]),
        path_includes: Some(VOCAB_ITEM),
        ..CapabilityRule::EMPTY
    },
    CapabilityRule {
        method: Some(HttpMethod::Patch),
        tag_includes: Some(&["vocab"]),
        path_includes: Some(VOCAB_ITEM),
        ..CapabilityRule::EMPTY
    },
];

pub(super) const DELETE_VOCAB: &[CapabilityRule] = &[CapabilityRule {
    method: Some(HttpMethod::Delete),
    tag_includes: Some(&["vocab"]),
    path_includes: Some(VOCAB_ITEM),
    ..CapabilityRule::EMPTY
}];

pub(super) const SESSION_TODAY: &[CapabilityRule] = &[
    CapabilityRule {
        method: Some(HttpMethod::Get),
        path_includes: Some(&["session", "today"]),
        ..CapabilityRule::EMPTY
    },
    CapabilityRule {
        method: Some(HttpMethod::Get),
        tag_includes: Some(&["session"]),
        text_includes: Some(&["today"]),
        ..CapabilityRule::EMPTY
    },
];

pub(super) const SUBMIT_REVIEW: &[CapabilityRule] = &[CapabilityRule {
    method: Some(HttpMethod::Post),
    path_includes: Some(&["review"]),
    path_excludes: Some(&["logs"]),
    ..CapabilityRule::EMPTY
}];

pub(super) const AI_ENRICH: &[CapabilityRule] = &[
    CapabilityRule {
        method: Some(HttpMethod::Post),
        path_includes: Some(&["ai", "enrich"]),
        ..CapabilityRule::EMPTY
    },
    CapabilityRule {
        method: Some(HttpMethod::Post),
        tag_includes: Some(&["ai"]),
        text_includes: Some(&["enrich"]),
        ..CapabilityRule::EMPTY
    },
];

pub(super) const AI_JUDGE: &[CapabilityRule] = &[
    CapabilityRule {
        method: Some(HttpMethod::Post),
        path_includes: Some(&["judge"]),
        ..CapabilityRule::EMPTY
    },
    CapabilityRule {
        method: Some(HttpMethod::Post),
        tag_includes: Some(&["ai"]),
        text_includes: Some(&["equivalence", "judge"]),
        ..CapabilityRule::EMPTY
    },
];

pub(super) const SYNC_EXPORT: &[CapabilityRule] = &[CapabilityRule {
    method: Some(HttpMethod::Get),
    path_includes: Some(&["sync", "export"]),
    ..CapabilityRule::EMPTY
}];

pub(super) const SYNC_IMPORT: &[CapabilityRule] = &[CapabilityRule {
    method: Some(HttpMethod::Post),
    path_includes: Some(&["sync", "import"]),
    ..CapabilityRule::EMPTY
}];
