use crate::constants::{exit_codes, verbosity};
use clap::{error::ErrorKind, CommandFactory, Parser};
use log::LevelFilter;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#;

/// CLI arguments for scriptgen.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Script files, or directories to search for scripts.
    #[arg(value_name = "SCRIPTS", required = true)]
    pub scripts: Vec<PathBuf>,

    /// Project file the scripts generate code for.
    #[arg(short, long, value_name = "FILE")]
    pub project: PathBuf,

    /// Solution file the project belongs to.
    #[arg(short, long, value_name = "FILE")]
    pub solution: Option<PathBuf>,

    /// Configuration file to use instead of the one next to the project.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cancel evaluations still running after this many seconds.
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Increase logging verbosity (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse command line arguments with custom handling for missing required inputs.
pub fn get_args() -> Args {
    Args::try_parse().unwrap_or_else(|e| {
        if e.kind() == ErrorKind::MissingRequiredArgument {
            let mut command = Args::command().help_template(HELP_TEMPLATE);
            if let Err(print_err) = command.print_help() {
                eprintln!("Failed to display help information: {print_err}");
            } else {
                println!();
            }
            std::process::exit(exit_codes::FAILURE);
        } else {
            e.exit();
        }
    })
}

/// Map `-v` counts to the appropriate log level.
pub fn get_log_level_from_verbose(verbose_count: u8) -> LevelFilter {
    match verbose_count {
        verbosity::OFF => LevelFilter::Error,
        verbosity::INFO => LevelFilter::Info,
        verbosity::DEBUG => LevelFilter::Debug,
        verbosity::TRACE.. => LevelFilter::Trace,
    }
}
