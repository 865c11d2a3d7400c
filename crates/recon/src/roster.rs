use log::debug;

use crate::config::{RegistrationColumns, SurveyColumns};
use crate::error::MatchError;
use crate::model::{attr, NameRecord};

pub const SURVEY: &str = "survey";
pub const REGISTRATION: &str = "registration";

/// Registration roster split by check-in status, file order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationRoster {
    pub checked_in: Vec<NameRecord>,
    pub not_checked_in: Vec<NameRecord>,
}

/// Parsed CSV with header lookup.
struct Sheet {
    roster: &'static str,
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl Sheet {
    fn parse(roster: &'static str, csv_data: &str) -> Result<Self, MatchError> {
        let read_err = |e: csv::Error| MatchError::InputRead {
            roster: roster.into(),
            message: e.to_string(),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let headers = reader
            .headers()
            .map_err(read_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_err)?;

        Ok(Self {
            roster,
            headers,
            rows,
        })
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column.trim())
    }

    fn required(&self, column: &str) -> Result<usize, MatchError> {
        self.position(column).ok_or_else(|| MatchError::MissingColumn {
            roster: self.roster.into(),
            column: column.into(),
        })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        let idx = self.position(column);
        if idx.is_none() {
            debug!("{} roster: no '{column}' column, using blank values", self.roster);
        }
        idx
    }
}

fn cell(row: &csv::StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| row.get(i)).unwrap_or("").trim().to_string()
}

/// Load survey records. The name column is required.
pub fn load_survey(csv_data: &str, columns: &SurveyColumns) -> Result<Vec<NameRecord>, MatchError> {
    let sheet = Sheet::parse(SURVEY, csv_data)?;
    let name = Some(sheet.required(&columns.name)?);
    let school = sheet.optional(&columns.school);
    let year = sheet.optional(&columns.year);
    let dietary = sheet.optional(&columns.dietary);

    let records = sheet
        .rows
        .iter()
        .map(|row| {
            NameRecord::new(cell(row, name))
                .with_attribute(attr::SCHOOL, cell(row, school))
                .with_attribute(attr::YEAR, cell(row, year))
                .with_attribute(attr::DIETARY, cell(row, dietary))
        })
        .collect();
    Ok(records)
}

/// Load registration records and partition them on the check-in column.
/// A row is checked in when its value equals `checked_in_value` exactly.
pub fn load_registration(
    csv_data: &str,
    columns: &RegistrationColumns,
    checked_in_value: &str,
) -> Result<RegistrationRoster, MatchError> {
    let sheet = Sheet::parse(REGISTRATION, csv_data)?;
    let name = Some(sheet.required(&columns.name)?);
    let school = sheet.optional(&columns.school);
    let year = sheet.optional(&columns.year);
    let dietary = sheet.optional(&columns.dietary);
    let buyer_first = sheet.optional(&columns.buyer_first_name);
    let buyer_last = sheet.optional(&columns.buyer_last_name);
    let checked_in = sheet.optional(&columns.checked_in);
    let last_name = sheet.optional(&columns.last_name);

    let mut roster = RegistrationRoster::default();
    for row in &sheet.rows {
        let status = cell(row, checked_in);
        let mut record = NameRecord::new(cell(row, name))
            .with_attribute(attr::SCHOOL, cell(row, school))
            .with_attribute(attr::YEAR, cell(row, year))
            .with_attribute(attr::DIETARY, cell(row, dietary))
            .with_attribute(attr::BUYER_FIRST_NAME, cell(row, buyer_first))
            .with_attribute(attr::BUYER_LAST_NAME, cell(row, buyer_last))
            .with_attribute(attr::CHECKED_IN, status.clone());

        let surname = cell(row, last_name);
        if !surname.is_empty() {
            record = record.with_extra_token(surname);
        }

        if status == checked_in_value {
            roster.checked_in.push(record);
        } else {
            roster.not_checked_in.push(record);
        }
    }
    Ok(roster)
}
