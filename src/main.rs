use chrono::NaiveDateTime;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use user_stats::output::{JsonLayout, to_json_string};
use user_stats::record::parse_timestamp;
use user_stats::subscriber::{self, LoggingError};
use user_stats::{AppConfig, ConfigError, aggregate_users_stats, process_data};

/// CLI-specific errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Library error (wraps all user_stats errors)
    #[error(transparent)]
    Library(#[from] user_stats::Error),

    /// Configuration file error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging setup error
    #[error(transparent)]
    Logging(#[from] LoggingError),
}

#[derive(Parser)]
#[command(name = "user-stats")]
#[command(about = "Aggregate online-duration, geographic and age statistics from user records")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "USER_STATS_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fraction of users per online-duration bucket and per region
    Online {
        /// JSON file mapping user ids to records
        #[arg(short, long)]
        input: PathBuf,

        /// Report file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Also print the report to stdout
        #[arg(long)]
        print: bool,
    },

    /// Mean age per login-recency bucket plus global age statistics
    Ages {
        /// JSON file mapping user ids to records
        #[arg(short, long)]
        input: PathBuf,

        /// Report file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Reference instant, e.g. 2024-01-31 or 2024-01-31T12:00:00 (defaults to now)
        #[arg(long, value_parser = parse_now)]
        now: Option<NaiveDateTime>,

        /// Also print the report to stdout
        #[arg(long)]
        print: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn parse_now(text: &str) -> Result<NaiveDateTime, String> {
    let value = serde_json::Value::String(text.to_string());
    parse_timestamp("--now", &value).map_err(|e| e.to_string())
}

/// Format an error for display with optional hint
fn format_error(err: &AppError) -> String {
    use std::io::IsTerminal;

    let use_colors = std::io::stderr().is_terminal();

    let (red, yellow, reset) = if use_colors {
        ("\x1b[0;31m", "\x1b[0;33m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    let mut output = format!("{}Error:{} {}\n", red, reset, err);

    if let Some(hint) = get_error_hint(err) {
        output.push_str(&format!("{}Hint:{} {}\n", yellow, reset, hint));
    }

    output
}

/// Get a helpful hint for common errors
fn get_error_hint(err: &AppError) -> Option<&'static str> {
    match err {
        AppError::Library(user_stats::Error::Decode(_)) => {
            Some("The input must be a JSON object mapping user ids to objects")
        }
        AppError::Library(user_stats::Error::InvalidDate { .. }) => {
            Some("Dates must be written as YYYY-MM-DD")
        }
        AppError::Library(user_stats::Error::InvalidTimestamp { .. }) => {
            Some("Timestamps may be YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS, RFC 3339 or epoch numbers")
        }
        AppError::Library(e) if e.is_io() => {
            Some("Check that the input exists and the output directory is writable")
        }
        AppError::Config(ConfigError::Invalid(_)) => {
            Some("Thresholds must ascend (2 < 7 < month_days < six_months_days) and labels must differ")
        }
        AppError::Logging(LoggingError::InvalidFilter(_)) => {
            Some("Use a level such as 'info' or a directive such as 'user_stats=debug'")
        }
        _ => None,
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprint!("{}", format_error(&err));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    if cli.quiet {
        config.logging.level = "error".into();
    } else if cli.verbose > 0 {
        config.logging.level = match cli.verbose {
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
        .into();
    }
    subscriber::init(&config.logging)?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    let stats = &config.stats;
    match cli.command {
        Commands::Online {
            input,
            output,
            print,
        } => {
            let report = process_data(&input, &output, stats)?;
            if print {
                println!(
                    "{}",
                    to_json_string(&report, JsonLayout::Indented, stats.ensure_ascii)?
                );
            }
        }

        Commands::Ages {
            input,
            output,
            now,
            print,
        } => {
            let report = aggregate_users_stats(&input, &output, now, stats)?;
            if print {
                println!(
                    "{}",
                    to_json_string(&report, JsonLayout::Compact, stats.ensure_ascii)?
                );
            }
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
