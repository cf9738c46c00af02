//! Text transforms applied to each output before it is committed.
//!
//! A [`Formatter`] is chosen per output buffer. The built-in variants are
//! pass-through, [`CanonicalFormatter`] and [`MergeFormatter`]; hosts can
//! add their own through [`Transform`] and [`FormatterRegistry::register`].

pub mod canonical;
pub mod merge;

pub use canonical::CanonicalFormatter;
pub use merge::MergeFormatter;

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::constants::formatters;
use crate::error::{Error, Result};

/// A pluggable formatting step.
///
/// `previous` is the target file's current content without the preamble, or
/// `None` when the file does not exist yet.
pub trait Transform: Send + Sync {
    fn transform(&self, generated: &str, previous: Option<&str>) -> Result<String>;
}

#[derive(Clone)]
pub enum Formatter {
    PassThrough,
    Canonical(CanonicalFormatter),
    MergePreserving(MergeFormatter),
    Custom { name: String, transform: Arc<dyn Transform> },
}

impl Formatter {
    pub fn name(&self) -> &str {
        match self {
            Formatter::PassThrough => formatters::PASS_THROUGH,
            Formatter::Canonical(_) => formatters::CANONICAL,
            Formatter::MergePreserving(_) => formatters::MERGE,
            Formatter::Custom { name, .. } => name,
        }
    }

    /// Whether [`Formatter::apply`] looks at the target's previous content.
    pub fn reads_previous(&self) -> bool {
        matches!(self, Formatter::MergePreserving(_) | Formatter::Custom { .. })
    }

    /// Produces the final text for one buffer.
    pub fn apply(&self, generated: &str, previous: Option<&str>) -> Result<String> {
        match self {
            Formatter::PassThrough => Ok(generated.to_string()),
            Formatter::Canonical(canonical) => canonical.transform(generated, previous),
            Formatter::MergePreserving(merge) => merge.transform(generated, previous),
            Formatter::Custom { transform, .. } => transform.transform(generated, previous),
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Formatter::PassThrough
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formatter::Canonical(canonical) => f.debug_tuple("Canonical").field(canonical).finish(),
            other => write!(f, "Formatter({})", other.name()),
        }
    }
}

/// Formatters scripts can select by name.
#[derive(Debug, Clone)]
pub struct FormatterRegistry {
    formatters: IndexMap<String, Formatter>,
}

impl FormatterRegistry {
    /// The built-in formatters; `indent_width` configures the canonical one.
    pub fn new(indent_width: usize) -> Self {
        let mut formatters = IndexMap::new();
        formatters.insert(formatters::PASS_THROUGH.to_string(), Formatter::PassThrough);
        formatters.insert(
            formatters::CANONICAL.to_string(),
            Formatter::Canonical(CanonicalFormatter::new(indent_width)),
        );
        formatters
            .insert(formatters::MERGE.to_string(), Formatter::MergePreserving(MergeFormatter));
        Self { formatters }
    }

    /// Adds or replaces a formatter under `name`.
    pub fn register<S: Into<String>>(&mut self, name: S, transform: Arc<dyn Transform>) {
        let name = name.into();
        self.formatters.insert(name.clone(), Formatter::Custom { name, transform });
    }

    pub fn resolve(&self, name: &str) -> Result<Formatter> {
        self.formatters
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownFormatter { name: name.to_string() })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.formatters.keys().map(String::as_str)
    }
}
