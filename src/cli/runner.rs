use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use walkdir::WalkDir;

use crate::cancel::Cancellation;
use crate::cli::Args;
use crate::config::{Config, ConfigV1};
use crate::diagnostic::{Diagnostic, EvaluationResult};
use crate::engine::ScriptEngine;
use crate::error::{Error, Result};
use crate::ioutils::absolutize;
use crate::project::FileSystemLoader;
use crate::source::ScriptSource;

/// Evaluates every script named on the command line against one project.
pub struct Runner {
    args: Args,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        Self { args }
    }

    /// Runs all evaluations and reports whether every one of them succeeded.
    ///
    /// Invalid arguments are returned as `Err` before any script runs.
    pub fn run(self) -> Result<bool> {
        let project = absolutize(&self.args.project)?;
        let solution = self.args.solution.as_deref().map(absolutize).transpose()?;
        let config = self.load_config(&project)?;
        let script_extension = config.script_extension.clone();

        let engine =
            ScriptEngine::with_loader(&project, solution.as_deref(), &FileSystemLoader::new(), config)?;

        let sources = collect_scripts(&self.args.scripts, &script_extension)?
            .iter()
            .map(ScriptSource::from_file)
            .collect::<Result<Vec<_>>>()?;
        if sources.is_empty() {
            log::warn!("No '*.{script_extension}' scripts found.");
            return Ok(true);
        }

        let timeout = self.args.timeout.map(Duration::from_secs);
        let results = evaluate_all(&engine, &sources, timeout);

        let mut failed = 0;
        for (source, result) in sources.iter().zip(&results) {
            result.log();
            if result.success {
                log::debug!("'{}' succeeded.", source.path().display());
            } else {
                failed += 1;
                log::debug!("'{}' failed.", source.path().display());
            }
        }
        log::info!("Evaluated {} script(s), {failed} failed.", sources.len());
        Ok(failed == 0)
    }

    fn load_config(&self, project: &Path) -> Result<ConfigV1> {
        match &self.args.config {
            Some(path) => Config::from_file(absolutize(path)?),
            None => Config::load_config(project.parent().unwrap_or(project)),
        }
    }
}

/// Runs one evaluation per script, each on its own thread.
fn evaluate_all(
    engine: &ScriptEngine,
    sources: &[ScriptSource],
    timeout: Option<Duration>,
) -> Vec<EvaluationResult> {
    thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|source| {
                scope.spawn(move || match timeout {
                    Some(timeout) => {
                        engine.evaluate_with(source, &Cancellation::with_timeout(timeout))
                    }
                    None => engine.evaluate(source),
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    EvaluationResult::from_diagnostics(vec![Diagnostic::error(
                        "evaluation panicked",
                    )])
                })
            })
            .collect()
    })
}

/// Expands the command-line script arguments into a sorted list of script files.
///
/// Files are taken as given; directories are searched recursively for files
/// with `extension`.
pub fn collect_scripts(paths: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>> {
    let mut scripts = BTreeSet::new();
    for path in paths {
        let path = absolutize(path)?;
        if path.is_file() {
            scripts.insert(path);
        } else if path.is_dir() {
            for entry in WalkDir::new(&path).follow_links(false) {
                let entry = entry?;
                let matches = entry.path().extension().is_some_and(|ext| ext == extension);
                if entry.file_type().is_file() && matches {
                    scripts.insert(entry.into_path());
                }
            }
        } else {
            return Err(Error::MissingFile { what: "script", path });
        }
    }
    Ok(scripts.into_iter().collect())
}

pub fn run(args: Args) -> Result<bool> {
    Runner::new(args).run()
}
