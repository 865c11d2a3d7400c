//! `rollmatch run` and `rollmatch validate`: config-driven roster matching.

use std::path::{Path, PathBuf};

use clap::Args;
use log::{info, warn};

use rollmatch_recon::config::{MatchConfig, MatcherKind};
use rollmatch_recon::model::{MatchInput, MatchRun};
use rollmatch_recon::roster::{load_registration, load_survey};
use rollmatch_recon::MatchError;
use rollmatch_recon::scorer::{LexicalScorer, Scorer, SemanticScorer, SplitNameScorer};

use crate::credentials::{get_api_key, missing_key_hint};
use crate::exit_codes::{EXIT_SEMANTIC_MISCONFIGURED, EXIT_SEMANTIC_MISSING_KEY, EXIT_STRICT_UNMATCHED};
use crate::input::{read_config, read_roster};
use crate::report;
use crate::semantic::ChatCompletionsBackend;
use crate::CliError;

pub const DEFAULT_OUTPUT: &str = "rollmatch_matches.csv";

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Survey roster CSV
    pub survey: PathBuf,

    /// Registration roster CSV
    pub registration: PathBuf,

    /// Match config (.toml); defaults apply when omitted
    #[arg(long, short = 'c', env = "ROLLMATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Matcher override: lexical, split_name, semantic
    #[arg(long)]
    pub matcher: Option<MatcherKind>,

    /// Claim threshold override (0-100)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Report CSV path
    #[arg(long, short = 'o', default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Also print the full run as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Exit 6 when any survey entry is unmatched
    #[arg(long)]
    pub strict: bool,
}

/// Load the config file (or defaults) and apply CLI overrides.
pub fn resolve_config(
    path: Option<&Path>,
    matcher: Option<MatcherKind>,
    threshold: Option<f64>,
) -> Result<MatchConfig, CliError> {
    let mut config = match path {
        Some(p) => MatchConfig::from_toml(&read_config(p)?)
            .map_err(|e| CliError::config(format!("{}: {e}", p.display())))?,
        None => MatchConfig::default(),
    };

    if let Some(m) = matcher {
        config.matcher = m;
    }
    if let Some(t) = threshold {
        config.threshold = t;
    }
    config.validate().map_err(CliError::engine)?;
    Ok(config)
}

fn with_path(path: &Path) -> impl Fn(MatchError) -> CliError + '_ {
    move |e| {
        let mut err = CliError::engine(e);
        err.message = format!("{}: {}", path.display(), err.message);
        err
    }
}

/// Read and parse both rosters. Errors name the offending file.
pub fn load_input(config: &MatchConfig, survey: &Path, registration: &Path) -> Result<MatchInput, CliError> {
    let survey_records = load_survey(&read_roster(survey)?, &config.survey.columns)
        .map_err(with_path(survey))?;
    let roster = load_registration(
        &read_roster(registration)?,
        &config.registration.columns,
        &config.registration.checked_in_value,
    )
    .map_err(with_path(registration))?;

    if survey_records.is_empty() {
        warn!("{} has no survey entries; the report will be empty", survey.display());
    }
    info!(
        "loaded {} survey entries, {} checked-in and {} not-checked-in registrations",
        survey_records.len(),
        roster.checked_in.len(),
        roster.not_checked_in.len()
    );

    Ok(MatchInput {
        survey: survey_records,
        checked_in: roster.checked_in,
        not_checked_in: roster.not_checked_in,
    })
}

/// Build the scorer the config selects.
pub fn build_scorer(config: &MatchConfig) -> Result<Box<dyn Scorer>, CliError> {
    Ok(match config.matcher {
        MatcherKind::Lexical => Box::new(LexicalScorer),
        MatcherKind::SplitName => Box::new(SplitNameScorer),
        MatcherKind::Semantic => {
            let provider = config.semantic.provider;
            let lookup = get_api_key(provider);
            let key = lookup.key.ok_or_else(|| {
                CliError::new(
                    EXIT_SEMANTIC_MISSING_KEY,
                    format!("no API key found for semantic provider \"{}\"", provider.name()),
                )
                .with_hint(missing_key_hint(provider))
            })?;
            info!("semantic matcher key from {}", lookup.source.as_str());

            let backend = ChatCompletionsBackend::new(&config.semantic, key)
                .map_err(|e| CliError::new(EXIT_SEMANTIC_MISCONFIGURED, e))?;
            info!("semantic matcher endpoint {}", backend.url());
            Box::new(SemanticScorer::new(backend))
        }
    })
}

pub fn execute(args: &RunArgs) -> Result<MatchRun, CliError> {
    let config = resolve_config(args.config.as_deref(), args.matcher, args.threshold)?;
    let input = load_input(&config, &args.survey, &args.registration)?;
    let scorer = build_scorer(&config)?;
    rollmatch_recon::run(&config, input, scorer.as_ref()).map_err(CliError::engine)
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let result = execute(&args)?;

    report::write_csv_file(&args.output, &result.reports)?;
    eprintln!("wrote {}", args.output.display());

    if args.json {
        println!("{}", report::to_json(&result)?);
    }

    for line in report::summary_lines(&result) {
        eprintln!("{line}");
    }

    if args.strict && result.summary.unmatched > 0 {
        return Err(CliError::new(
            EXIT_STRICT_UNMATCHED,
            format!("{} survey entries unmatched (--strict)", result.summary.unmatched),
        ));
    }

    Ok(())
}

pub fn cmd_validate(config: PathBuf) -> Result<(), CliError> {
    let config = resolve_config(Some(config.as_path()), None, None)?;
    eprintln!(
        "config ok: \"{}\" ({} matcher, threshold {})",
        config.name, config.matcher, config.threshold
    );
    Ok(())
}
