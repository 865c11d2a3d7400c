use crate::model::{
    attr, ConfidenceTier, MatchCategory, MatchDecision, MatchReport, NameRecord, PoolTag,
};

pub const HIGH_TIER_MIN: f64 = 90.0;
pub const MEDIUM_TIER_MIN: f64 = 70.0;

/// Bucket a confidence score. Zero (and anything below) is `None`.
pub fn tier_for(confidence: f64) -> ConfidenceTier {
    if confidence >= HIGH_TIER_MIN {
        ConfidenceTier::High
    } else if confidence >= MEDIUM_TIER_MIN {
        ConfidenceTier::Medium
    } else if confidence > 0.0 {
        ConfidenceTier::Low
    } else {
        ConfidenceTier::None
    }
}

pub fn category_for(decision: &MatchDecision) -> MatchCategory {
    match (decision.is_matched(), decision.matched_pool) {
        (true, Some(PoolTag::CheckedIn)) => MatchCategory::MatchedCheckedIn,
        (true, Some(PoolTag::NotCheckedIn)) => MatchCategory::MatchedNotCheckedIn,
        _ => MatchCategory::Unmatched,
    }
}

/// Join a survey record with its decision into one output row.
/// Attendee fields are blank when unmatched.
pub fn build_report(survey: &NameRecord, decision: MatchDecision) -> MatchReport {
    let category = category_for(&decision);
    let tier = tier_for(decision.confidence);

    let best = |pool| {
        decision
            .best_in(pool)
            .map(|c| (c.name.clone(), Some(c.score)))
            .unwrap_or_default()
    };
    let (best_checked_in, best_checked_in_score) = best(PoolTag::CheckedIn);
    let (best_not_checked_in, best_not_checked_in_score) = best(PoolTag::NotCheckedIn);

    let attendee = decision.winner.unwrap_or_else(|| NameRecord::new(""));
    let ticket_buyer = format!(
        "{} {}",
        attendee.attribute(attr::BUYER_FIRST_NAME).trim(),
        attendee.attribute(attr::BUYER_LAST_NAME).trim()
    )
    .trim()
    .to_string();

    MatchReport {
        survey_name: survey.full_name.clone(),
        survey_school: survey.attribute(attr::SCHOOL).to_string(),
        survey_year: survey.attribute(attr::YEAR).to_string(),
        survey_dietary: survey.attribute(attr::DIETARY).to_string(),
        attendee_school: attendee.attribute(attr::SCHOOL).to_string(),
        attendee_year: attendee.attribute(attr::YEAR).to_string(),
        attendee_dietary: attendee.attribute(attr::DIETARY).to_string(),
        checked_in: attendee.attribute(attr::CHECKED_IN).to_string(),
        attendee_name: attendee.full_name,
        ticket_buyer,
        confidence: decision.confidence,
        tier,
        category,
        best_checked_in,
        best_checked_in_score,
        best_not_checked_in,
        best_not_checked_in_score,
        needs_review: decision.needs_review,
        reasoning: decision.reasoning,
    }
}
