use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Extension trait for Path with the checks and conversions scriptgen needs
pub trait PathExt {
    /// Converts a path to a string slice, returning an error if the path contains invalid Unicode characters.
    ///
    /// # Examples
    /// ```
    /// use scriptgen::ext::PathExt;
    /// use std::path::Path;
    ///
    /// let path = Path::new("test");
    /// assert_eq!(path.to_str_checked().unwrap(), "test");
    /// ```
    fn to_str_checked(&self) -> Result<&str>;

    /// Fails with a usage error unless the path is non-empty and absolute.
    ///
    /// `what` names the argument in the error message.
    fn require_absolute(&self, what: &'static str) -> Result<()>;

    /// Resolves `.` and `..` components without touching the file system.
    ///
    /// # Examples
    /// ```
    /// use scriptgen::ext::PathExt;
    /// use std::path::{Path, PathBuf};
    ///
    /// let path = Path::new("/work/gen/./out/../models.rs");
    /// assert_eq!(path.normalize_lexically(), PathBuf::from("/work/gen/models.rs"));
    /// ```
    fn normalize_lexically(&self) -> PathBuf;
}

impl PathExt for Path {
    fn to_str_checked(&self) -> Result<&str> {
        self.to_str().ok_or_else(|| {
            Error::Other(anyhow::anyhow!(
                "Path '{}' contains invalid Unicode characters",
                self.display()
            ))
        })
    }

    fn require_absolute(&self, what: &'static str) -> Result<()> {
        if self.as_os_str().is_empty() {
            return Err(Error::EmptyPath { what });
        }
        if !self.is_absolute() {
            return Err(Error::RelativePath { what, path: self.to_path_buf() });
        }
        Ok(())
    }

    fn normalize_lexically(&self) -> PathBuf {
        let mut normalized = PathBuf::new();
        for component in self.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    // Never pop past the root or a prefix.
                    if matches!(
                        normalized.components().next_back(),
                        Some(Component::Normal(_))
                    ) {
                        normalized.pop();
                    } else if !normalized.has_root() {
                        normalized.push("..");
                    }
                }
                other => normalized.push(other.as_os_str()),
            }
        }
        normalized
    }
}
