#![allow(dead_code)]

use log::debug;
use scriptgen::cli::{run, Args};
use scriptgen::output::preamble;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Prints a diff of files and their contents between two directories.
/// Shows files only present in one directory and content differences for files present in both.
///
/// # Arguments
/// * `dir1` - The first directory to compare (actual output).
/// * `dir2` - The second directory to compare (expected output).
pub fn print_dir_diff(dir1: &Path, dir2: &Path) {
    let files1 = relative_files(dir1);
    let files2 = relative_files(dir2);

    println!("\n=== Directory Comparison ===");
    println!("Actual output:   {:?}", dir1);
    println!("Expected output: {:?}", dir2);
    println!();

    for file in files1.difference(&files2) {
        println!("  + {:?} (only in actual)", file);
    }
    for file in files2.difference(&files1) {
        println!("  - {:?} (only in expected)", file);
    }

    for file in files1.intersection(&files2) {
        let content1 = fs::read(dir1.join(file)).unwrap();
        let content2 = fs::read(dir2.join(file)).unwrap();
        if content1 != content2 {
            println!("\n  File: {:?}", file);
            println!("  --- Actual content:");
            println!("{}", String::from_utf8_lossy(&content1));
            println!("  --- Expected content:");
            println!("{}", String::from_utf8_lossy(&content2));
        }
    }
    println!("=== End of Comparison ===\n");
}

fn relative_files(dir: &Path) -> std::collections::BTreeSet<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect()
}

/// Copies every file below `from` into `to`, creating directories as needed.
pub fn copy_tree(from: &Path, to: &Path) {
    for file in relative_files(from) {
        let dest = to.join(&file);
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::copy(from.join(&file), dest).unwrap();
    }
}

/// Builds CLI arguments for a project inside `root`.
pub fn args(root: &Path, project: &str, scripts: &[&str]) -> Args {
    Args {
        scripts: scripts.iter().map(|s| root.join(s)).collect(),
        project: root.join(project),
        solution: None,
        config: None,
        timeout: None,
        verbose: 2,
    }
}

/// Copies `fixture` to a temporary directory, runs the CLI on it and asserts
/// that the result is identical to `expected_dir`.
pub fn run_and_assert(fixture: &str, expected_dir: &str, project: &str, scripts: &[&str]) {
    let tmp_dir = tempfile::tempdir().unwrap();
    copy_tree(Path::new(fixture), tmp_dir.path());

    let succeeded = run(args(tmp_dir.path(), project, scripts)).unwrap();
    assert!(succeeded, "generation reported failure");

    match dir_diff::is_different(tmp_dir.path(), expected_dir) {
        Ok(true) => {
            print_dir_diff(tmp_dir.path(), expected_dir.as_ref());
            panic!("Directories differ. See above for details.");
        }
        Ok(false) => {}
        Err(e) => debug!("Error comparing directories: {e}"),
    }
    assert!(!dir_diff::is_different(tmp_dir.path(), expected_dir).unwrap());
}

/// A temporary project with a manifest, ready for scripts.
pub struct Workspace {
    pub dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("shop.yaml"),
            "name: shop\nentities:\n  - Order\n  - Customer\n",
        )
        .unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn project(&self) -> PathBuf {
        self.root().join("shop.yaml")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).unwrap()
    }

    /// Content of a generated file after its preamble.
    pub fn body(&self, name: &str) -> String {
        let content = self.read(name);
        match content.strip_prefix(preamble()) {
            Some(body) => body.to_string(),
            None => panic!("'{name}' does not start with the preamble:\n{content}"),
        }
    }
}
