use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::fuzz::{best_match, round_score, split_name_score};
use crate::model::{attr, NameRecord, PoolTag};
use crate::normalize::name_tokens;
use crate::pool::components_for;

/// How the engine presents candidates to a scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// One query per pool; the engine compares the two picks.
    PerPool,
    /// One query over both pools, checked-in records first.
    Combined,
}

/// A live pool record offered to a scorer.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub record: &'a NameRecord,
    pub pool: PoolTag,
    /// Slot index in the record's pool.
    pub slot: usize,
}

/// A scorer's verdict over one candidate list.
#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    /// Index into the candidate slice, or `None` for no match.
    pub index: Option<usize>,
    pub score: f64,
    pub reasoning: String,
}

impl Pick {
    pub fn no_match(reasoning: impl Into<String>) -> Self {
        Self {
            index: None,
            score: 0.0,
            reasoning: reasoning.into(),
        }
    }
}

/// Similarity capability used by the assignment engine.
pub trait Scorer {
    fn name(&self) -> &'static str;

    fn query_mode(&self) -> QueryMode {
        QueryMode::PerPool
    }

    fn pick(&self, query: &NameRecord, candidates: &[Candidate<'_>]) -> Result<Pick, MatchError>;
}

// ---------------------------------------------------------------------------
// Lexical
// ---------------------------------------------------------------------------

/// Weighted composite string similarity on the full name.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalScorer;

impl Scorer for LexicalScorer {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn pick(&self, query: &NameRecord, candidates: &[Candidate<'_>]) -> Result<Pick, MatchError> {
        let names: Vec<&str> = candidates.iter().map(|c| c.record.full_name.as_str()).collect();
        Ok(match best_match(&query.full_name, &names) {
            Some(best) => Pick {
                index: Some(best.index),
                score: best.score,
                reasoning: format!("lexical score {:.1} for '{}'", best.score, best.name),
            },
            None => Pick::no_match("no lexical match"),
        })
    }
}

/// Token-level similarity against each candidate's name components,
/// which include the ticket buyer's surname.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitNameScorer;

impl Scorer for SplitNameScorer {
    fn name(&self) -> &'static str {
        "split_name"
    }

    fn pick(&self, query: &NameRecord, candidates: &[Candidate<'_>]) -> Result<Pick, MatchError> {
        let tokens = name_tokens(&query.full_name);
        if tokens.is_empty() {
            return Ok(Pick::no_match("empty survey name"));
        }

        let mut best: Option<(usize, f64, Vec<String>)> = None;
        for (i, candidate) in candidates.iter().enumerate() {
            let components = components_for(candidate.record);
            let score = split_name_score(&tokens, &components);
            if score > best.as_ref().map_or(0.0, |b| b.1) {
                best = Some((i, score, components));
            }
        }

        Ok(match best {
            Some((index, score, components)) => Pick {
                index: Some(index),
                score,
                reasoning: format!(
                    "split-name score {score:.1} for '{}' (components: {})",
                    candidates[index].record.full_name,
                    components.join(" ")
                ),
            },
            None => Pick::no_match("no split-name match"),
        })
    }
}

// ---------------------------------------------------------------------------
// Semantic
// ---------------------------------------------------------------------------

/// Identity fields sent to the semantic backend for one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemanticPerson {
    pub name: String,
    pub school: String,
    pub year: String,
}

impl SemanticPerson {
    fn from_record(record: &NameRecord) -> Self {
        Self {
            name: record.full_name.clone(),
            school: record.attribute(attr::SCHOOL).to_string(),
            year: record.attribute(attr::YEAR).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemanticRequest {
    pub query: SemanticPerson,
    /// Presented to the backend numbered from 1.
    pub candidates: Vec<SemanticPerson>,
}

impl SemanticRequest {
    pub fn new(query: &NameRecord, candidates: &[Candidate<'_>]) -> Self {
        Self {
            query: SemanticPerson::from_record(query),
            candidates: candidates
                .iter()
                .map(|c| SemanticPerson::from_record(c.record))
                .collect(),
        }
    }

    /// Candidates with their 1-based list numbers.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &SemanticPerson)> {
        self.candidates.iter().enumerate().map(|(i, p)| (i + 1, p))
    }
}

/// Backend verdict. `match_index` is 1-based; 0 means no match.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SemanticResponse {
    pub match_index: u64,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// External reasoning capability. Blocking; one call per survey record.
pub trait SemanticBackend {
    fn resolve(&self, request: &SemanticRequest) -> Result<SemanticResponse, String>;
}

/// Model-assisted scorer. Backend failures degrade to a zero-confidence
/// no-match and never reach the engine as errors.
#[derive(Debug, Clone)]
pub struct SemanticScorer<B> {
    backend: B,
}

impl<B: SemanticBackend> SemanticScorer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: SemanticBackend> Scorer for SemanticScorer<B> {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn query_mode(&self) -> QueryMode {
        QueryMode::Combined
    }

    fn pick(&self, query: &NameRecord, candidates: &[Candidate<'_>]) -> Result<Pick, MatchError> {
        if candidates.is_empty() {
            return Ok(Pick::no_match("no registrations left to match"));
        }

        let request = SemanticRequest::new(query, candidates);
        let response = match self.backend.resolve(&request) {
            Ok(r) => r,
            Err(e) => {
                warn!("semantic matcher failed for '{}': {e}", query.full_name);
                return Ok(Pick::no_match(format!("semantic matcher error: {e}")));
            }
        };

        if response.match_index == 0 {
            return Ok(Pick::no_match(response.reasoning));
        }

        let confidence = if response.confidence.is_finite() {
            round_score(response.confidence.clamp(0.0, 100.0))
        } else {
            0.0
        };

        // Out-of-range indices pass through; the engine flags them for review.
        Ok(Pick {
            index: usize::try_from(response.match_index - 1).ok(),
            score: confidence,
            reasoning: response.reasoning,
        })
    }
}
