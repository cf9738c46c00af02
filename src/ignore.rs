use crate::constants::IGNORE_FILE;
use crate::error::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::debug;
use std::{fs::read_to_string, path::Path};

/// Default patterns never listed as project files
const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git",
    ".git/**",
    ".hg",
    ".hg/**",
    ".svn",
    ".svn/**",
    "**/.DS_Store",
    "target",
    "target/**",
    "node_modules",
    "node_modules/**",
    IGNORE_FILE,
];

/// Builds the ignore set for a project directory.
///
/// Patterns are matched against paths relative to `project_dir`: the
/// defaults above, then one glob per non-empty, non-comment line of
/// `.scriptgenignore` when present.
pub fn parse_ignore_file<P: AsRef<Path>>(project_dir: P) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let ignore_path = project_dir.as_ref().join(IGNORE_FILE);

    let mut patterns: Vec<String> =
        DEFAULT_IGNORE_PATTERNS.iter().map(|pattern| pattern.to_string()).collect();

    if let Ok(contents) = read_to_string(ignore_path) {
        patterns.extend(
            contents
                .lines()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(|line| line.trim_end_matches('/').to_string()),
        );
    } else {
        debug!("No {IGNORE_FILE} file found, using default patterns.");
    }

    for pattern in &patterns {
        builder.add(Glob::new(pattern)?);
        // A bare directory name also hides everything below it.
        if !pattern.contains('*') {
            builder.add(Glob::new(&format!("{pattern}/**"))?);
        }
    }
    debug!("Ignore patterns: {patterns:?}");
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_patterns_hide_vcs_and_build_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let set = parse_ignore_file(dir.path()).unwrap();
        assert!(set.is_match(".git/config"));
        assert!(set.is_match("target/debug/build"));
        assert!(set.is_match("nested/.DS_Store"));
        assert!(!set.is_match("src/lib.rs"));
    }

    #[test]
    fn ignore_file_adds_patterns() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(IGNORE_FILE), "# generated\n*.bak\nvendor/\n").unwrap();
        let set = parse_ignore_file(dir.path()).unwrap();
        assert!(set.is_match("old.bak"));
        assert!(set.is_match("vendor/lib/x.rs"));
        assert!(!set.is_match("src/main.rs"));
    }
}
