//! Read-only project metadata handed to scripts.
//!
//! Loading build metadata is a collaborator of the engine: anything that
//! implements [`ProjectLoader`] can supply the [`ProjectModel`].
//! [`FileSystemLoader`] is the default: it describes the project from its
//! manifest file and the files around it.

use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::ext::PathExt;
use crate::ignore::parse_ignore_file;

/// The solution (multi-project container) a project was resolved in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolutionInfo {
    pub name: String,
    pub path: PathBuf,
}

/// Project metadata as scripts see it. Never mutated once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectModel {
    pub name: String,
    pub path: PathBuf,
    pub directory: PathBuf,
    pub solution: Option<SolutionInfo>,
    /// The manifest parsed as JSON or YAML, or null for other formats.
    pub properties: serde_json::Value,
    /// Files below `directory`, relative, `/`-separated and sorted.
    pub files: Vec<String>,
}

/// Produces a [`ProjectModel`] for a project file, optionally inside a solution.
pub trait ProjectLoader: Send + Sync {
    fn load(&self, project_file: &Path, solution_file: Option<&Path>) -> Result<ProjectModel>;
}

/// Loads projects straight from the file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemLoader;

impl FileSystemLoader {
    pub fn new() -> Self {
        Self
    }

    fn parse_properties(project_file: &Path) -> Result<serde_json::Value> {
        let parse = |content: &str| -> Result<serde_json::Value> {
            match project_file.extension().and_then(|ext| ext.to_str()) {
                Some("json") => Ok(serde_json::from_str(content)?),
                Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(content)?),
                _ => Ok(serde_json::Value::Null),
            }
        };
        let content = std::fs::read_to_string(project_file)?;
        parse(&content)
    }

    fn list_files(directory: &Path) -> Result<Vec<String>> {
        let ignored = parse_ignore_file(directory)?;
        let mut files = Vec::new();
        for entry in WalkDir::new(directory).follow_links(false) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(directory) else {
                continue;
            };
            if ignored.is_match(relative) {
                continue;
            }
            let relative = relative.to_str_checked()?.replace('\\', "/");
            files.push(relative);
        }
        files.sort();
        Ok(files)
    }
}

impl ProjectLoader for FileSystemLoader {
    fn load(&self, project_file: &Path, solution_file: Option<&Path>) -> Result<ProjectModel> {
        project_file.require_absolute("project")?;
        if !project_file.is_file() {
            return Err(Error::MissingFile { what: "project", path: project_file.to_path_buf() });
        }

        let directory = project_file.parent().unwrap_or(project_file).to_path_buf();

        let solution = match solution_file {
            Some(solution_file) => {
                solution_file.require_absolute("solution")?;
                if !solution_file.is_file() {
                    return Err(Error::MissingFile {
                        what: "solution",
                        path: solution_file.to_path_buf(),
                    });
                }
                let solution_dir = solution_file.parent().unwrap_or(solution_file);
                if !directory.starts_with(solution_dir) {
                    return Err(Error::ProjectNotInSolution {
                        project: project_file.to_path_buf(),
                        solution: solution_file.to_path_buf(),
                    });
                }
                Some(SolutionInfo {
                    name: file_stem(solution_file),
                    path: solution_file.to_path_buf(),
                })
            }
            None => None,
        };

        let model = ProjectModel {
            name: file_stem(project_file),
            path: project_file.to_path_buf(),
            properties: Self::parse_properties(project_file)?,
            files: Self::list_files(&directory)?,
            directory,
            solution,
        };
        log::debug!("Loaded project '{}' with {} files.", model.name, model.files.len());
        Ok(model)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default()
}
