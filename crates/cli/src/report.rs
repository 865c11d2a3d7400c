//! Match report output: CSV file, JSON, and the stderr summary.

use std::path::Path;

use rollmatch_recon::model::{MatchReport, MatchRun};

use crate::CliError;

/// CSV header, in [`MatchReport`] field order.
pub const REPORT_COLUMNS: [&str; 19] = [
    "survey_name",
    "survey_school",
    "survey_year",
    "survey_dietary",
    "attendee_name",
    "attendee_school",
    "attendee_year",
    "attendee_dietary",
    "ticket_buyer",
    "checked_in",
    "confidence",
    "tier",
    "category",
    "best_checked_in",
    "best_checked_in_score",
    "best_not_checked_in",
    "best_not_checked_in_score",
    "needs_review",
    "reasoning",
];

/// Write one row per report. The header is written even when there are no rows.
pub fn write_csv<W: std::io::Write>(writer: W, reports: &[MatchReport]) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(REPORT_COLUMNS)?;
    for report in reports {
        wtr.serialize(report)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(path: &Path, reports: &[MatchReport]) -> Result<(), CliError> {
    let output_err = |e: &dyn std::fmt::Display| CliError::output(format!("cannot write {}: {e}", path.display()));
    let file = std::fs::File::create(path).map_err(|e| output_err(&e))?;
    write_csv(std::io::BufWriter::new(file), reports).map_err(|e| output_err(&e))
}

pub fn to_json(run: &MatchRun) -> Result<String, CliError> {
    serde_json::to_string_pretty(run)
        .map_err(|e| CliError::output(format!("JSON serialization error: {e}")))
}

/// Human summary lines for stderr.
pub fn summary_lines(run: &MatchRun) -> Vec<String> {
    let s = &run.summary;
    let mut lines = vec![
        format!(
            "{} matcher (threshold {}): {} surveyed, {} matched ({:.1}%) - {} checked in, {} not checked in, {} unmatched",
            run.meta.matcher,
            run.meta.threshold,
            s.total_surveyed,
            s.matched,
            s.percent_matched,
            s.matched_checked_in,
            s.matched_not_checked_in,
            s.unmatched,
        ),
        format!(
            "confidence: {} high (90-100), {} medium (70-89), {} low (1-69), {} none",
            s.tiers.high, s.tiers.medium, s.tiers.low, s.tiers.none,
        ),
        format!(
            "average confidence: {:.1} matched, {:.1} unmatched",
            s.average_matched_confidence, s.average_unmatched_confidence,
        ),
    ];

    if s.needs_review > 0 {
        lines.push(format!("{} entries flagged for manual review", s.needs_review));
    }

    if !s.unclaimed_checked_in.is_empty() {
        lines.push(format!(
            "{} checked-in attendees with no survey entry: {}",
            s.unclaimed_checked_in.len(),
            s.unclaimed_checked_in.join(", "),
        ));
    }

    lines
}
