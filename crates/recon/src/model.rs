use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Well-known attribute keys carried on a [`NameRecord`].
pub mod attr {
    pub const SCHOOL: &str = "school";
    pub const YEAR: &str = "year";
    pub const DIETARY: &str = "dietary";
    pub const BUYER_FIRST_NAME: &str = "buyer_first_name";
    pub const BUYER_LAST_NAME: &str = "buyer_last_name";
    pub const CHECKED_IN: &str = "checked_in";
}

/// A person's name plus auxiliary identity fields, projected out of either
/// roster schema. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameRecord {
    pub full_name: String,
    /// Extra tokens used by split-name matching (e.g. the ticket buyer's surname).
    pub extra_name_tokens: Vec<String>,
    pub attributes: BTreeMap<String, String>,
}

impl NameRecord {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            extra_name_tokens: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with_extra_token(mut self, token: impl Into<String>) -> Self {
        self.extra_name_tokens.push(token.into());
        self
    }

    /// Attribute value, or `""` when absent.
    pub fn attribute(&self, key: &str) -> &str {
        self.attributes.get(key).map(String::as_str).unwrap_or("")
    }
}

/// Pre-loaded rosters for one matching run. Consumed by [`crate::run`].
#[derive(Debug, Clone, Default)]
pub struct MatchInput {
    pub survey: Vec<NameRecord>,
    pub checked_in: Vec<NameRecord>,
    pub not_checked_in: Vec<NameRecord>,
}

// ---------------------------------------------------------------------------
// Pools
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoolTag {
    CheckedIn,
    NotCheckedIn,
}

impl std::fmt::Display for PoolTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CheckedIn => write!(f, "checked-in"),
            Self::NotCheckedIn => write!(f, "not-checked-in"),
        }
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    Unmatched,
}

/// Best candidate a scorer found in one pool. Names only; never a live record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub pool: PoolTag,
    pub name: String,
    pub score: f64,
}

/// The engine's verdict for one survey record.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDecision {
    pub status: MatchStatus,
    pub matched_pool: Option<PoolTag>,
    /// The claimed registration record. Ownership moved out of its pool.
    pub winner: Option<NameRecord>,
    pub confidence: f64,
    pub reasoning: String,
    /// Set on claim-resolution and scoring failures.
    pub needs_review: bool,
    pub candidates: Vec<CandidateScore>,
}

impl MatchDecision {
    pub fn is_matched(&self) -> bool {
        self.status == MatchStatus::Matched
    }

    pub fn best_in(&self, pool: PoolTag) -> Option<&CandidateScore> {
        self.candidates.iter().find(|c| c.pool == pool)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchCategory {
    MatchedCheckedIn,
    MatchedNotCheckedIn,
    Unmatched,
}

impl std::fmt::Display for MatchCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MatchedCheckedIn => write!(f, "matched-checked-in"),
            Self::MatchedNotCheckedIn => write!(f, "matched-not-checked-in"),
            Self::Unmatched => write!(f, "unmatched"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
    None,
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
            Self::None => write!(f, "none"),
        }
    }
}

/// One output row: survey fields joined with the matched registration.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub survey_name: String,
    pub survey_school: String,
    pub survey_year: String,
    pub survey_dietary: String,
    pub attendee_name: String,
    pub attendee_school: String,
    pub attendee_year: String,
    pub attendee_dietary: String,
    pub ticket_buyer: String,
    pub checked_in: String,
    pub confidence: f64,
    pub tier: ConfidenceTier,
    pub category: MatchCategory,
    pub best_checked_in: String,
    pub best_checked_in_score: Option<f64>,
    pub best_not_checked_in: String,
    pub best_not_checked_in_score: Option<f64>,
    pub needs_review: bool,
    pub reasoning: String,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub none: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub total_surveyed: usize,
    pub matched: usize,
    pub matched_checked_in: usize,
    pub matched_not_checked_in: usize,
    pub unmatched: usize,
    pub needs_review: usize,
    pub percent_matched: f64,
    pub tiers: TierCounts,
    pub average_matched_confidence: f64,
    pub average_unmatched_confidence: f64,
    /// Checked-in registrations no survey entry claimed.
    pub unclaimed_checked_in: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchMeta {
    pub config_name: String,
    pub matcher: String,
    pub threshold: f64,
    pub engine_version: String,
    pub run_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchRun {
    pub meta: MatchMeta,
    pub summary: MatchSummary,
    pub reports: Vec<MatchReport>,
}
