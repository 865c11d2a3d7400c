use log::{debug, info, warn};

use crate::classify::build_report;
use crate::config::MatchConfig;
use crate::error::MatchError;
use crate::model::{
    CandidateScore, MatchDecision, MatchInput, MatchMeta, MatchRun, MatchStatus, NameRecord,
    PoolTag,
};
use crate::pool::PoolSet;
use crate::scorer::{Candidate, QueryMode, Scorer};
use crate::summary::compute_summary;

/// Run matching per config. Survey records are processed strictly in order;
/// each claim shrinks the pools seen by later records.
pub fn run(config: &MatchConfig, input: MatchInput, scorer: &dyn Scorer) -> Result<MatchRun, MatchError> {
    config.validate()?;

    let MatchInput {
        survey,
        checked_in,
        not_checked_in,
    } = input;

    info!(
        "matching {} survey entries against {} checked-in / {} not-checked-in registrations ({} matcher, threshold {})",
        survey.len(),
        checked_in.len(),
        not_checked_in.len(),
        scorer.name(),
        config.threshold
    );

    let mut pools = PoolSet::new(checked_in, not_checked_in);
    let decisions = assign_all(&survey, &mut pools, scorer, config.threshold);

    let reports: Vec<_> = survey
        .iter()
        .zip(decisions)
        .map(|(record, decision)| build_report(record, decision))
        .collect();

    let unclaimed_checked_in = pools
        .checked_in
        .into_remaining()
        .into_iter()
        .map(|r| r.full_name)
        .collect();
    let summary = compute_summary(&reports, unclaimed_checked_in);

    Ok(MatchRun {
        meta: MatchMeta {
            config_name: config.name.clone(),
            matcher: scorer.name().to_string(),
            threshold: config.threshold,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now(),
        },
        summary,
        reports,
    })
}

/// Assign every survey record in order. One decision per record.
pub fn assign_all(
    survey: &[NameRecord],
    pools: &mut PoolSet,
    scorer: &dyn Scorer,
    threshold: f64,
) -> Vec<MatchDecision> {
    survey
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let decision = assign(record, pools, scorer, threshold);
            debug!(
                "survey #{} '{}': {:?} {} ({:.1})",
                i + 1,
                record.full_name,
                decision.status,
                decision
                    .winner
                    .as_ref()
                    .map_or("-", |w| w.full_name.as_str()),
                decision.confidence
            );
            decision
        })
        .collect()
}

/// A scorer pick mapped back onto its pool. Holds the name, not the record,
/// so the pool can be mutated once a winner is chosen.
#[derive(Debug, Clone)]
struct Probe {
    pool: PoolTag,
    slot: usize,
    name: String,
    score: f64,
    reasoning: String,
}

#[derive(Debug, Default)]
struct Scoring {
    probes: Vec<Probe>,
    /// Reasoning from picks that found no match.
    notes: Vec<String>,
}

/// Decide one survey record: score the live pools, compare against the
/// threshold, then claim the winner out of its pool.
///
/// Never fails. Scoring and claim-resolution failures yield an unmatched
/// decision with zero confidence flagged for review; the pools are untouched
/// in that case.
pub fn assign(survey: &NameRecord, pools: &mut PoolSet, scorer: &dyn Scorer, threshold: f64) -> MatchDecision {
    let scoring = match score(survey, pools, scorer) {
        Ok(s) => s,
        Err(e) => {
            warn!("'{}': {e}", survey.full_name);
            return review(e, Vec::new());
        }
    };

    let candidates: Vec<CandidateScore> = scoring
        .probes
        .iter()
        .map(|p| CandidateScore {
            pool: p.pool,
            name: p.name.clone(),
            score: p.score,
        })
        .collect();

    let mut winner: Option<&Probe> = None;
    for probe in scoring.probes.iter().filter(|p| p.score >= threshold) {
        let better = match winner {
            None => true,
            Some(w) => {
                probe.score > w.score
                    || (probe.score == w.score
                        && probe.pool == PoolTag::CheckedIn
                        && w.pool != PoolTag::CheckedIn)
            }
        };
        if better {
            winner = Some(probe);
        }
    }

    let Some(winner) = winner.cloned() else {
        return below_threshold(&scoring, candidates, threshold);
    };

    match claim(pools, &winner) {
        Ok(record) => MatchDecision {
            status: MatchStatus::Matched,
            matched_pool: Some(winner.pool),
            winner: Some(record),
            confidence: winner.score,
            reasoning: winner.reasoning,
            needs_review: false,
            candidates,
        },
        Err(e) => {
            warn!("'{}': {e}; flagged for manual review", survey.full_name);
            review(e, candidates)
        }
    }
}

fn score(survey: &NameRecord, pools: &PoolSet, scorer: &dyn Scorer) -> Result<Scoring, MatchError> {
    let mut scoring = Scoring::default();

    let mut query = |candidates: Vec<Candidate<'_>>| -> Result<(), MatchError> {
        let pick = scorer.pick(survey, &candidates)?;
        let Some(index) = pick.index else {
            if !pick.reasoning.is_empty() {
                scoring.notes.push(pick.reasoning);
            }
            return Ok(());
        };
        let candidate = candidates.get(index).ok_or_else(|| MatchError::ClaimResolution {
            name: format!("candidate #{}", index + 1),
            pool: match scorer.query_mode() {
                QueryMode::PerPool => candidates.first().map(|c| c.pool),
                QueryMode::Combined => None,
            },
        })?;
        scoring.probes.push(Probe {
            pool: candidate.pool,
            slot: candidate.slot,
            name: candidate.record.full_name.clone(),
            score: pick.score,
            reasoning: pick.reasoning,
        });
        Ok(())
    };

    match scorer.query_mode() {
        QueryMode::PerPool => {
            for tag in [PoolTag::CheckedIn, PoolTag::NotCheckedIn] {
                query(candidates_in(pools, tag))?;
            }
        }
        QueryMode::Combined => {
            let mut all = candidates_in(pools, PoolTag::CheckedIn);
            all.extend(candidates_in(pools, PoolTag::NotCheckedIn));
            query(all)?;
        }
    }

    Ok(scoring)
}

fn candidates_in(pools: &PoolSet, tag: PoolTag) -> Vec<Candidate<'_>> {
    pools
        .get(tag)
        .iter()
        .map(|(slot, record)| Candidate {
            record,
            pool: tag,
            slot,
        })
        .collect()
}

/// Resolve the winner's name to a live slot and remove it. The name must
/// resolve to the exact slot the scorer picked; a duplicate name that
/// resolves elsewhere is ambiguous.
fn claim(pools: &mut PoolSet, winner: &Probe) -> Result<NameRecord, MatchError> {
    let pool = pools.get_mut(winner.pool);
    match pool.find_index_by_name(&winner.name) {
        Some(index) if index == winner.slot => pool.claim(index),
        _ => Err(MatchError::ClaimResolution {
            name: winner.name.clone(),
            pool: Some(winner.pool),
        }),
    }
}

fn below_threshold(scoring: &Scoring, candidates: Vec<CandidateScore>, threshold: f64) -> MatchDecision {
    let top = candidates.iter().map(|c| c.score).fold(0.0_f64, f64::max);

    let mut parts: Vec<String> = candidates
        .iter()
        .map(|c| format!("best {} '{}' scored {:.1}", c.pool, c.name, c.score))
        .collect();
    parts.extend(scoring.notes.iter().cloned());
    parts.dedup();

    let reasoning = if candidates.is_empty() {
        match parts.is_empty() {
            true => "no candidates".to_string(),
            false => parts.join("; "),
        }
    } else {
        format!("below threshold {threshold}: {}", parts.join("; "))
    };

    MatchDecision {
        status: MatchStatus::Unmatched,
        matched_pool: None,
        winner: None,
        confidence: top,
        reasoning,
        needs_review: false,
        candidates,
    }
}

fn review(error: MatchError, candidates: Vec<CandidateScore>) -> MatchDecision {
    MatchDecision {
        status: MatchStatus::Unmatched,
        matched_pool: None,
        winner: None,
        confidence: 0.0,
        reasoning: format!("manual review required: {error}"),
        needs_review: true,
        candidates,
    }
}
