use std::path::Path;
use std::sync::PoisonError;

use crate::cancel::Cancellation;
use crate::diagnostic::{Diagnostic, EvaluationResult, SourceLocation};
use crate::error::{Error, Result};
use crate::ioutils::{read_existing, write_file_atomic};
use crate::output::locks::path_lock;
use crate::output::registry::{BufferState, OutputBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The target now holds the new content.
    Written,
    /// The target already held exactly the new content and was left untouched.
    Unchanged,
}

/// Formats buffers, prepends the preamble and writes each one atomically.
///
/// Atomicity is per file: when one buffer fails, buffers committed before it
/// stay committed.
pub struct CommitManager<'a> {
    preamble: &'a str,
    cancel: &'a Cancellation,
}

impl<'a> CommitManager<'a> {
    pub fn new(preamble: &'a str, cancel: &'a Cancellation) -> Self {
        Self { preamble, cancel }
    }

    /// Commits every buffer in order and reports what went wrong.
    pub fn commit(&self, buffers: Vec<OutputBuffer>) -> EvaluationResult {
        let mut result = EvaluationResult::succeeded();
        for mut buffer in buffers {
            match self.commit_buffer(&mut buffer, &mut result) {
                Ok(CommitOutcome::Written) => {
                    log::info!("Generated '{}'.", buffer.target().display());
                }
                Ok(CommitOutcome::Unchanged) => {
                    log::info!("'{}' is up to date.", buffer.target().display());
                }
                Err(Error::Cancelled) => {
                    result.push(
                        Diagnostic::error("evaluation was cancelled before this output was written")
                            .with_location(SourceLocation::file(buffer.target())),
                    );
                }
                Err(e) => result.push(Diagnostic::io_failure(buffer.target(), &e)),
            }
        }
        result
    }

    /// Commits one buffer. Formatter faults are recorded in `report` as
    /// warnings and the unformatted content is written instead.
    pub fn commit_buffer(
        &self,
        buffer: &mut OutputBuffer,
        report: &mut EvaluationResult,
    ) -> Result<CommitOutcome> {
        buffer.set_state(BufferState::Discarded);
        let target = buffer.target().to_path_buf();

        let lock = path_lock(&target);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let existing = read_existing(&target)?;
        let previous = match existing.as_deref().map(std::str::from_utf8) {
            Some(Ok(content)) => Some(content.strip_prefix(self.preamble).unwrap_or(content)),
            Some(Err(e)) => {
                if buffer.formatter().reads_previous() {
                    report.push(self.previous_warning(buffer, &target, &e));
                }
                None
            }
            None => None,
        };

        let body = match buffer.formatter().apply(buffer.content(), previous) {
            Ok(body) => body,
            Err(e) => {
                report.push(self.format_warning(buffer, &target, &e));
                buffer.content().to_string()
            }
        };

        let mut content = String::with_capacity(self.preamble.len() + body.len());
        content.push_str(self.preamble);
        content.push_str(&body);

        if existing.as_deref() == Some(content.as_bytes()) {
            buffer.set_state(BufferState::Committed);
            return Ok(CommitOutcome::Unchanged);
        }
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        write_file_atomic(&content, &target, self.cancel)?;
        buffer.set_state(BufferState::Committed);
        Ok(CommitOutcome::Written)
    }

    fn previous_warning(
        &self,
        buffer: &OutputBuffer,
        target: &Path,
        err: &std::str::Utf8Error,
    ) -> Diagnostic {
        Diagnostic::warning(format!(
            "previous content of output '{}' is not valid UTF-8 ({err}), formatting without it",
            buffer.name()
        ))
        .with_location(SourceLocation::file(target))
    }

    fn format_warning(&self, buffer: &OutputBuffer, target: &Path, err: &Error) -> Diagnostic {
        Diagnostic::warning(format!(
            "formatter '{}' failed for output '{}', writing it unformatted: {err}",
            buffer.formatter().name(),
            buffer.name()
        ))
        .with_location(SourceLocation::file(target))
    }
}
