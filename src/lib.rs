/// Command-line front end: argument parsing and the script runner.
pub mod cli;

/// Cooperative cancellation and timeouts.
pub mod cancel;

/// Configuration handling for scriptgen projects.
pub mod config;

/// Constants used throughout scriptgen.
pub mod constants;

/// Diagnostics and evaluation results.
pub mod diagnostic;

/// Compiles, runs and commits scripts.
pub mod engine;

/// Defines custom error types.
pub mod error;

/// Extension traits for standard library types.
pub mod ext;

/// Formatters applied to outputs before they are written.
pub mod format;

/// Processes .scriptgenignore files to exclude project files.
pub mod ignore;

/// A set of helpers for working with the file system.
pub mod ioutils;

/// Output buffers and their atomic commit.
pub mod output;

/// Project metadata exposed to scripts.
pub mod project;

/// The scripting environment and its bindings.
pub mod script;

/// Script sources.
pub mod source;

pub use diagnostic::{Diagnostic, EvaluationResult, Severity, SourceLocation};
pub use engine::{evaluate, ScriptEngine};
pub use error::{Error, Result};
pub use source::ScriptSource;
