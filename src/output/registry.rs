use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::diagnostic::Diagnostic;
use crate::error::{Error, Result};
use crate::ext::PathExt;
use crate::format::{Formatter, FormatterRegistry};
use crate::source::ScriptSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Open,
    Committed,
    Discarded,
}

/// In-memory content of one output file during one evaluation.
#[derive(Debug)]
pub struct OutputBuffer {
    name: String,
    target: PathBuf,
    content: String,
    formatter: Formatter,
    state: BufferState,
}

impl OutputBuffer {
    pub fn new<S: Into<String>>(name: S, target: PathBuf, formatter: Formatter) -> Self {
        Self {
            name: name.into(),
            target,
            content: String::new(),
            formatter,
            state: BufferState::Open,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    pub fn push_str(&mut self, text: &str) {
        self.content.push_str(text);
    }

    pub(crate) fn set_state(&mut self, state: BufferState) {
        self.state = state;
    }
}

/// The named buffers a running script writes into.
///
/// Nothing here touches the disk; the buffers are handed to the
/// [`CommitManager`](crate::output::CommitManager) once the script finished.
#[derive(Debug)]
pub struct OutputRegistry {
    directory: PathBuf,
    script: PathBuf,
    default_name: String,
    formatters: Arc<FormatterRegistry>,
    buffers: IndexMap<String, OutputBuffer>,
    targets: HashMap<PathBuf, String>,
    pending_formatters: IndexMap<String, Formatter>,
    body_carry: Vec<u8>,
    /// Whitespace rendered by the body before the default buffer exists.
    pending_body: String,
}

impl OutputRegistry {
    pub fn new(
        source: &ScriptSource,
        output_extension: &str,
        formatters: Arc<FormatterRegistry>,
    ) -> Self {
        Self {
            directory: source.directory().to_path_buf(),
            script: source.path().normalize_lexically(),
            default_name: source.default_output_name(output_extension),
            formatters,
            buffers: IndexMap::new(),
            targets: HashMap::new(),
            pending_formatters: IndexMap::new(),
            body_carry: Vec::new(),
            pending_body: String::new(),
        }
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn formatters(&self) -> &FormatterRegistry {
        &self.formatters
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&OutputBuffer> {
        self.buffers.get(name)
    }

    /// Appends `text` to the buffer `name` (the default buffer when `None`).
    pub fn write(&mut self, name: Option<&str>, text: &str) -> Result<()> {
        let name = name.unwrap_or(&self.default_name).to_string();
        self.buffer_mut(&name)?.push_str(text);
        Ok(())
    }

    /// Selects the formatter for `name` (the default buffer when `None`).
    ///
    /// The last call wins; it applies at commit time however it is ordered
    /// relative to the writes.
    pub fn attach_formatter(&mut self, name: Option<&str>, formatter: &str) -> Result<()> {
        let formatter = self.formatters.resolve(formatter)?;
        let name = name.unwrap_or(&self.default_name).to_string();
        if name.is_empty() {
            return Err(Error::EmptyBufferName);
        }
        match self.buffers.get_mut(&name) {
            Some(buffer) => buffer.formatter = formatter,
            None => {
                self.pending_formatters.insert(name, formatter);
            }
        }
        Ok(())
    }

    /// Appends text rendered by the script body to the default buffer.
    ///
    /// Input arrives as raw bytes; an incomplete trailing UTF-8 sequence is
    /// held back until the rest of it arrives. Whitespace alone does not
    /// create the default buffer, so it claims no target.
    pub(crate) fn append_body(&mut self, bytes: &[u8]) -> Result<()> {
        self.body_carry.extend_from_slice(bytes);
        let valid = match std::str::from_utf8(&self.body_carry) {
            Ok(text) => text.len(),
            Err(e) => e.valid_up_to(),
        };
        if valid == 0 {
            return Ok(());
        }
        let carry = std::mem::take(&mut self.body_carry);
        let text = std::str::from_utf8(&carry[..valid])
            .map_err(|e| Error::Other(anyhow::anyhow!("invalid UTF-8 in script output: {e}")))?;
        let name = self.default_name.clone();
        if !self.buffers.contains_key(&name) && text.trim().is_empty() {
            self.pending_body.push_str(text);
        } else {
            self.buffer_mut(&name)?.push_str(text);
        }
        self.body_carry = carry[valid..].to_vec();
        Ok(())
    }

    /// Finishes the evaluation's writes and hands over the buffers to commit, in creation order.
    ///
    /// Formatters attached to names that were never written produce a warning.
    pub fn into_buffers(self) -> (Vec<OutputBuffer>, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        for name in self.pending_formatters.keys() {
            diagnostics.push(Diagnostic::warning(format!(
                "a formatter was attached to output '{name}', but nothing was written to it"
            )));
        }
        if !self.body_carry.is_empty() {
            diagnostics.push(Diagnostic::warning(
                "script output ended with an incomplete UTF-8 sequence, which was dropped",
            ));
        }

        if !self.pending_body.is_empty() {
            log::debug!("Skipping output '{}': the body rendered only whitespace.", self.default_name);
        }
        (self.buffers.into_values().collect(), diagnostics)
    }

    /// Drops every buffer without committing. Returns how many were discarded.
    pub fn discard(self) -> usize {
        let count = self.buffers.len();
        if count > 0 {
            log::debug!("Discarding {count} output buffer(s).");
        }
        count
    }

    fn buffer_mut(&mut self, name: &str) -> Result<&mut OutputBuffer> {
        if !self.buffers.contains_key(name) {
            let mut buffer = self.create_buffer(name)?;
            if name == self.default_name {
                buffer.push_str(&std::mem::take(&mut self.pending_body));
            }
            self.targets.insert(buffer.target.clone(), name.to_string());
            self.buffers.insert(name.to_string(), buffer);
        }
        self.buffers
            .get_mut(name)
            .ok_or_else(|| Error::Other(anyhow::anyhow!("output '{name}' vanished")))
    }

    fn create_buffer(&mut self, name: &str) -> Result<OutputBuffer> {
        if name.trim().is_empty() {
            return Err(Error::EmptyBufferName);
        }
        let target = self.directory.join(name).normalize_lexically();
        if target == self.script {
            return Err(Error::TargetIsScript { name: name.to_string() });
        }
        if let Some(existing) = self.targets.get(&target) {
            return Err(Error::DuplicateTarget {
                name: name.to_string(),
                existing: existing.clone(),
                target,
            });
        }

        let mut buffer = OutputBuffer::new(name, target, Formatter::PassThrough);
        if let Some(formatter) = self.pending_formatters.shift_remove(name) {
            buffer.formatter = formatter;
        }
        log::debug!("Created output '{}' -> '{}'.", name, buffer.target.display());
        Ok(buffer)
    }
}
