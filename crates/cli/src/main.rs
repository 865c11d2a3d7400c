// rollmatch CLI - match event survey entries to ticket registrations

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use rollmatch_cli::exit_codes::EXIT_SUCCESS;
use rollmatch_cli::run::{cmd_run, cmd_validate, RunArgs};
use rollmatch_cli::CliError;

#[derive(Parser)]
#[command(name = "rollmatch")]
#[command(about = "Match survey respondents to event registrations")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a survey roster against a registration roster
    #[command(after_help = "\
Examples:
  rollmatch run survey.csv registrations.csv
  rollmatch run survey.csv registrations.csv --config workshop.toml
  rollmatch run survey.csv registrations.csv --matcher split_name --threshold 85
  rollmatch run survey.csv registrations.csv --output matches.csv --json --strict")]
    Run(RunArgs),

    /// Validate a match config without running
    #[command(after_help = "\
Examples:
  rollmatch validate workshop.toml")]
    Validate {
        /// Path to the match config (.toml)
        config: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Validate { config } => cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
