use crate::fuzz::round_score;
use crate::model::{ConfidenceTier, MatchCategory, MatchReport, MatchSummary, TierCounts};

/// Compute summary statistics from match reports.
pub fn compute_summary(reports: &[MatchReport], unclaimed_checked_in: Vec<String>) -> MatchSummary {
    let mut tiers = TierCounts::default();
    let mut matched_checked_in = 0;
    let mut matched_not_checked_in = 0;
    let mut needs_review = 0;
    let mut matched_total = 0.0;
    let mut unmatched_total = 0.0;

    for r in reports {
        match r.tier {
            ConfidenceTier::High => tiers.high += 1,
            ConfidenceTier::Medium => tiers.medium += 1,
            ConfidenceTier::Low => tiers.low += 1,
            ConfidenceTier::None => tiers.none += 1,
        }

        match r.category {
            MatchCategory::MatchedCheckedIn => matched_checked_in += 1,
            MatchCategory::MatchedNotCheckedIn => matched_not_checked_in += 1,
            MatchCategory::Unmatched => {}
        }

        if r.category == MatchCategory::Unmatched {
            unmatched_total += r.confidence;
        } else {
            matched_total += r.confidence;
        }

        if r.needs_review {
            needs_review += 1;
        }
    }

    let total = reports.len();
    let matched = matched_checked_in + matched_not_checked_in;
    let unmatched = total - matched;

    let mean = |sum: f64, n: usize| if n == 0 { 0.0 } else { round_score(sum / n as f64) };

    MatchSummary {
        total_surveyed: total,
        matched,
        matched_checked_in,
        matched_not_checked_in,
        unmatched,
        needs_review,
        percent_matched: mean(matched as f64 * 100.0, total),
        tiers,
        average_matched_confidence: mean(matched_total, matched),
        average_unmatched_confidence: mean(unmatched_total, unmatched),
        unclaimed_checked_in,
    }
}
