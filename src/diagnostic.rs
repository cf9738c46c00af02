//! Uniform reporting of compile, runtime, format and I/O problems.
//!
//! Every failure that happens after an engine has been constructed ends up
//! here as a [`Diagnostic`]; an [`EvaluationResult`] is the ordered list of
//! them plus the overall verdict.

use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::source::ScriptSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Where a diagnostic points. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl SourceLocation {
    pub fn file<P: Into<PathBuf>>(file: P) -> Self {
        Self { file: file.into(), line: None, column: None }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(column) = self.column {
                write!(f, ":{column}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn error<S: Into<String>>(message: S) -> Self {
        Self { severity: Severity::Error, message: message.into(), location: None }
    }

    pub fn warning<S: Into<String>>(message: S) -> Self {
        Self { severity: Severity::Warning, message: message.into(), location: None }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// An I/O failure for a specific target file.
    pub fn io_failure(target: &Path, err: &Error) -> Self {
        Self::error(format!("failed to write '{}': {err}", target.display()))
            .with_location(SourceLocation::file(target))
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{location}: ")?;
        }
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Outcome of one evaluation: a verdict plus diagnostics in the order they were raised.
///
/// Warnings never flip `success`; any error does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl EvaluationResult {
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        let success = !diagnostics.iter().any(Diagnostic::is_error);
        Self { success, diagnostics }
    }

    pub fn succeeded() -> Self {
        Self::from_diagnostics(Vec::new())
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.success = false;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, diagnostics: I) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    /// Streams every diagnostic to the log sink at its severity.
    pub fn log(&self) {
        for diagnostic in &self.diagnostics {
            match diagnostic.severity {
                Severity::Error => log::error!("{diagnostic}"),
                Severity::Warning => log::warn!("{diagnostic}"),
            }
        }
    }
}

/// Converts a script compilation failure into diagnostics.
///
/// MiniJinja stops at the first syntax error, so this yields exactly one
/// diagnostic per reported issue.
pub fn compile_diagnostics(err: &minijinja::Error, source: &ScriptSource) -> Vec<Diagnostic> {
    vec![Diagnostic::error(describe(err)).with_location(location_of(err, source))]
}

/// Decomposes a runtime failure into one diagnostic per underlying cause.
///
/// A `raise(...)` with several messages becomes one diagnostic per message.
/// A host failure (a rejected `output.write`, an unknown formatter) is
/// reported by its own message; MiniJinja's wrapper only when there is none.
pub fn runtime_diagnostics(err: &minijinja::Error, source: &ScriptSource) -> Vec<Diagnostic> {
    let location = location_of(err, source);

    match find_cause(err) {
        Some(Error::Raised(messages)) => messages
            .iter()
            .map(|message| Diagnostic::error(message.clone()).with_location(location.clone()))
            .collect(),
        Some(cause) => vec![Diagnostic::error(cause.to_string()).with_location(location)],
        None => vec![Diagnostic::error(chain_message(err)).with_location(location)],
    }
}

fn find_cause(err: &minijinja::Error) -> Option<&Error> {
    let mut cause = err.source();
    while let Some(inner) = cause {
        if let Some(found) = inner.downcast_ref::<Error>() {
            return Some(found);
        }
        // io::Error hides a wrapped error from `source()`.
        if let Some(found) = inner
            .downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref())
            .and_then(|wrapped| wrapped.downcast_ref::<Error>())
        {
            return Some(found);
        }
        cause = inner.source();
    }
    None
}

/// The wrapper's description followed by any foreign causes, on one line.
fn chain_message(err: &minijinja::Error) -> String {
    let mut message = describe(err);
    let mut cause = err.source();
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}

fn describe(err: &minijinja::Error) -> String {
    match err.detail() {
        Some(detail) => format!("{}: {detail}", err.kind()),
        None => err.kind().to_string(),
    }
}

fn location_of(err: &minijinja::Error, source: &ScriptSource) -> SourceLocation {
    let in_script = err.name().map_or(true, |name| name == source.template_name());
    let file = match err.name() {
        Some(name) if !in_script => source.directory().join(name),
        _ => source.path().to_path_buf(),
    };
    let column = if in_script {
        err.range().map(|range| column_of(source.code(), range.start))
    } else {
        None
    };
    SourceLocation { file, line: err.line(), column }
}

/// 1-based column of a byte offset.
fn column_of(code: &str, offset: usize) -> usize {
    let prefix = code.get(..offset).unwrap_or(code);
    prefix.rsplit('\n').next().map_or(0, |line| line.chars().count()) + 1
}
