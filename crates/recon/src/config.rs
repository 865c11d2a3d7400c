use serde::Deserialize;

use crate::error::MatchError;

pub const DEFAULT_THRESHOLD: f64 = 80.0;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Minimum score (0-100) a candidate needs to be claimed.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub matcher: MatcherKind,
    #[serde(default)]
    pub survey: SurveyConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub semantic: SemanticConfig,
}

fn default_name() -> String {
    "rollmatch".into()
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            threshold: DEFAULT_THRESHOLD,
            matcher: MatcherKind::default(),
            survey: SurveyConfig::default(),
            registration: RegistrationConfig::default(),
            semantic: SemanticConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    /// Composite string similarity on the full name.
    #[default]
    Lexical,
    /// Token-by-token similarity against name components plus buyer surname.
    SplitName,
    /// Delegates to an external reasoning model.
    Semantic,
}

impl std::fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexical => write!(f, "lexical"),
            Self::SplitName => write!(f, "split_name"),
            Self::Semantic => write!(f, "semantic"),
        }
    }
}

impl std::str::FromStr for MatcherKind {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lexical" => Ok(Self::Lexical),
            "split_name" | "split-name" => Ok(Self::SplitName),
            "semantic" => Ok(Self::Semantic),
            other => Err(MatchError::ConfigValidation(format!(
                "unknown matcher \"{other}\" (expected lexical, split_name or semantic)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurveyConfig {
    #[serde(default)]
    pub columns: SurveyColumns,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurveyColumns {
    pub name: String,
    pub school: String,
    pub year: String,
    pub dietary: String,
}

impl Default for SurveyColumns {
    fn default() -> Self {
        Self {
            name: "Full name to display on certificate".into(),
            school: "What school do you go to?".into(),
            year: "I am currently in...".into(),
            dietary: "Do you have any dietary requirements for lunch time?".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationConfig {
    /// Value of the checked-in column that marks the checked-in partition.
    #[serde(default = "default_checked_in_value")]
    pub checked_in_value: String,
    #[serde(default)]
    pub columns: RegistrationColumns,
}

fn default_checked_in_value() -> String {
    "Checked in".into()
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            checked_in_value: default_checked_in_value(),
            columns: RegistrationColumns::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrationColumns {
    pub name: String,
    pub school: String,
    pub year: String,
    pub dietary: String,
    pub buyer_first_name: String,
    pub buyer_last_name: String,
    pub checked_in: String,
    /// Ticket purchaser's surname, used as an extra matching token.
    pub last_name: String,
}

impl Default for RegistrationColumns {
    fn default() -> Self {
        Self {
            name: "Student's full name".into(),
            school: "What school does the student attend?".into(),
            year: "What year is the student in at school?".into(),
            dietary: "Dietary requirements".into(),
            buyer_first_name: "Buyer first name".into(),
            buyer_last_name: "Buyer last name".into(),
            checked_in: "Checked in".into(),
            last_name: "Last name".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Semantic matcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    Azure,
}

impl SemanticProvider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Azure => "azure",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SemanticConfig {
    pub provider: SemanticProvider,
    /// Model name, or deployment name for Azure.
    pub model: String,
    pub endpoint: Option<String>,
    /// Azure only.
    pub api_version: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            provider: SemanticProvider::OpenAI,
            model: "gpt-4o".into(),
            endpoint: None,
            api_version: "2025-01-01-preview".into(),
            timeout_secs: 60,
            max_tokens: 1000,
        }
    }
}

impl SemanticConfig {
    /// Endpoint with the provider default applied and trailing slashes removed.
    pub fn resolved_endpoint(&self) -> Option<String> {
        let endpoint = match (&self.endpoint, self.provider) {
            (Some(e), _) => e.clone(),
            (None, SemanticProvider::OpenAI) => "https://api.openai.com/v1".to_string(),
            (None, SemanticProvider::Azure) => return None,
        };
        Some(endpoint.trim_end_matches('/').to_string())
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MatchConfig {
    pub fn from_toml(input: &str) -> Result<Self, MatchError> {
        let config: MatchConfig =
            toml::from_str(input).map_err(|e| MatchError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(MatchError::ConfigValidation(format!(
                "threshold must be between 0 and 100, got {}",
                self.threshold
            )));
        }

        let s = &self.survey.columns;
        let r = &self.registration.columns;
        let columns = [
            ("survey.columns.name", &s.name),
            ("survey.columns.school", &s.school),
            ("survey.columns.year", &s.year),
            ("survey.columns.dietary", &s.dietary),
            ("registration.columns.name", &r.name),
            ("registration.columns.school", &r.school),
            ("registration.columns.year", &r.year),
            ("registration.columns.dietary", &r.dietary),
            ("registration.columns.buyer_first_name", &r.buyer_first_name),
            ("registration.columns.buyer_last_name", &r.buyer_last_name),
            ("registration.columns.checked_in", &r.checked_in),
            ("registration.columns.last_name", &r.last_name),
        ];
        for (key, value) in columns {
            if value.trim().is_empty() {
                return Err(MatchError::ConfigValidation(format!("{key} must not be blank")));
            }
        }

        if self.matcher == MatcherKind::Semantic {
            if self.semantic.resolved_endpoint().is_none() {
                return Err(MatchError::ConfigValidation(
                    "semantic.endpoint is required for provider \"azure\"".into(),
                ));
            }
            if self.semantic.model.trim().is_empty() {
                return Err(MatchError::ConfigValidation(
                    "semantic.model must not be blank".into(),
                ));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
