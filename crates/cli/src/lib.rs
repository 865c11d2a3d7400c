//! `rollmatch` CLI library: file I/O, credential lookup, the HTTP semantic
//! backend and report writing around the `rollmatch-recon` engine.

pub mod credentials;
pub mod exit_codes;
pub mod input;
pub mod report;
pub mod run;
pub mod semantic;

use rollmatch_recon::MatchError;

use exit_codes::{EXIT_ERROR, EXIT_INPUT_READ, EXIT_INVALID_CONFIG, EXIT_OUTPUT_WRITE};

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT_READ, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_INVALID_CONFIG, msg)
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self::new(EXIT_OUTPUT_WRITE, msg)
    }

    /// Map an engine error onto its exit code.
    pub fn engine(err: MatchError) -> Self {
        let code = match &err {
            MatchError::ConfigParse(_) | MatchError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
            MatchError::MissingColumn { .. } | MatchError::InputRead { .. } => EXIT_INPUT_READ,
            _ => EXIT_ERROR,
        };
        Self::new(code, err.to_string())
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
