use std::fmt;

use crate::model::PoolTag;

#[derive(Debug, Clone, PartialEq)]
pub enum MatchError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (threshold out of range, blank column, etc.).
    ConfigValidation(String),
    /// Missing required column in a roster.
    MissingColumn { roster: String, column: String },
    /// Roster could not be read or decoded as CSV.
    InputRead { roster: String, message: String },
    /// Claim against a slot that is out of range or already claimed.
    IndexOutOfRange { pool: PoolTag, index: usize },
    /// The active scorer could not produce a result.
    ScoringFailure(String),
    /// Scorer picked a winner that cannot be located in its pool.
    ClaimResolution { name: String, pool: Option<PoolTag> },
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { roster, column } => {
                write!(f, "{roster} roster: missing column '{column}'")
            }
            Self::InputRead { roster, message } => {
                write!(f, "{roster} roster: cannot read input: {message}")
            }
            Self::IndexOutOfRange { pool, index } => {
                write!(f, "{pool} pool: index {index} is out of range or already claimed")
            }
            Self::ScoringFailure(msg) => write!(f, "scoring failed: {msg}"),
            Self::ClaimResolution { name, pool: Some(pool) } => {
                write!(f, "cannot resolve '{name}' in {pool} pool")
            }
            Self::ClaimResolution { name, pool: None } => {
                write!(f, "cannot resolve '{name}' in any pool")
            }
        }
    }
}

impl std::error::Error for MatchError {}
