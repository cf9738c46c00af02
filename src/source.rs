use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::ext::PathExt;

/// A script to evaluate: its absolute path (identity and diagnostics) and its full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSource {
    path: PathBuf,
    template_name: String,
    code: String,
}

impl ScriptSource {
    /// Creates a source from an absolute path and its code.
    ///
    /// # Errors
    /// * `Error::EmptyPath` / `Error::RelativePath` - `path` is empty or relative
    /// * `Error::Other` - `path` is not valid Unicode
    pub fn new<P: Into<PathBuf>, S: Into<String>>(path: P, code: S) -> Result<Self> {
        let path = path.into();
        path.require_absolute("script")?;
        let template_name = path.to_str_checked()?.to_string();
        Ok(Self { path, template_name, code: code.into() })
    }

    /// Reads the script at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        path.require_absolute("script")?;
        let code = std::fs::read_to_string(path)?;
        Self::new(path, code)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Name the script is registered under in the script environment.
    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    /// Directory containing the script. Output names resolve against it.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }

    /// File name of the script without its extension.
    pub fn stem(&self) -> &str {
        self.path.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default()
    }

    /// Name of the buffer that receives the script body and unnamed writes.
    pub fn default_output_name(&self, extension: &str) -> String {
        match self.path.file_name() {
            Some(file_name) => Path::new(file_name)
                .with_extension(extension)
                .to_string_lossy()
                .into_owned(),
            None => format!("output.{extension}"),
        }
    }
}
