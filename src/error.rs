use crate::constants::exit_codes;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON. Original error: {0}")]
    JSONParseError(#[from] serde_json::Error),

    #[error("Failed to parse YAML. Original error: {0}")]
    YAMLParseError(#[from] serde_yaml::Error),

    #[error("Failed to parse ignore patterns. Original error: {0}")]
    GlobSetParseError(#[from] globset::Error),

    #[error("Failed to walk directory. Original error: {0}")]
    WalkDirError(#[from] walkdir::Error),

    #[error("Script error: {0}")]
    MinijinjaError(#[from] minijinja::Error),

    #[error("Configuration validation failed: {0}.")]
    ConfigValidation(String),

    /// A required path argument was empty.
    #[error("Cannot proceed: {what} path must not be empty.")]
    EmptyPath { what: &'static str },

    /// A path argument that must be absolute was relative.
    #[error("Cannot proceed: {what} path '{}' must be absolute.", .path.display())]
    RelativePath { what: &'static str, path: PathBuf },

    #[error("Cannot proceed: {what} '{}' does not exist.", .path.display())]
    MissingFile { what: &'static str, path: PathBuf },

    #[error(
        "Cannot proceed: project '{}' is not part of solution '{}'.",
        .project.display(),
        .solution.display()
    )]
    ProjectNotInSolution { project: PathBuf, solution: PathBuf },

    #[error("Output name must not be empty.")]
    EmptyBufferName,

    /// Two buffer names resolved to the same file within one evaluation.
    #[error(
        "Output '{name}' targets '{}', which is already claimed by output '{existing}'.",
        .target.display()
    )]
    DuplicateTarget { name: String, existing: String, target: PathBuf },

    #[error("Output '{name}' would overwrite the script that generates it.")]
    TargetIsScript { name: String },

    #[error("Unknown formatter '{name}'.")]
    UnknownFormatter { name: String },

    #[error("Evaluation was cancelled.")]
    Cancelled,

    /// Failures raised by a script through `raise(...)`.
    #[error("{}", .0.join("; "))]
    Raised(Vec<String>),

    #[error("Unbalanced '{delimiter}' at line {line}.")]
    UnbalancedDelimiter { line: usize, delimiter: char },

    #[error("Malformed preserved region at line {line}: {reason}.")]
    MalformedRegion { line: usize, reason: String },

    #[error("Preserved region '{id}' appears more than once.")]
    DuplicateRegion { id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience type alias for Results with scriptgen's Error as the error type.
///
/// # Type Parameters
/// * `T` - The type of the success value
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) -> ! {
    eprintln!("{err}");
    std::process::exit(exit_codes::FAILURE);
}
