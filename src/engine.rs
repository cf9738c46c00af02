//! Evaluation of one script from source text to committed files.
//!
//! [`ScriptEngine`] owns everything that outlives a single evaluation: the
//! project model, configuration and formatter registry. Each call to
//! [`ScriptEngine::evaluate`] gets its own output registry, compiles and runs
//! the script and, only if that succeeded, commits the outputs.

use minijinja::{context, path_loader, Environment};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::cancel::Cancellation;
use crate::config::{Config, ConfigV1};
use crate::diagnostic::{
    compile_diagnostics, runtime_diagnostics, Diagnostic, EvaluationResult, SourceLocation,
};
use crate::error::Result;
use crate::format::{FormatterRegistry, Transform};
use crate::output::{preamble, CommitManager, OutputRegistry};
use crate::project::{FileSystemLoader, ProjectLoader, ProjectModel};
use crate::script::{base_environment, bindings, BodyWriter, SharedRegistry};
use crate::source::ScriptSource;

enum Failure {
    Compile(minijinja::Error),
    Runtime(minijinja::Error),
}

pub struct ScriptEngine {
    project: Arc<ProjectModel>,
    config: ConfigV1,
    formatters: Arc<FormatterRegistry>,
    env: Environment<'static>,
}

impl ScriptEngine {
    /// Loads the project (optionally within a solution) from disk, along with
    /// the `scriptgen` configuration next to the project file.
    ///
    /// # Errors
    /// Fails fast on relative or missing paths, a project outside the given
    /// solution and invalid configuration.
    pub fn new(project_file: &Path, solution_file: Option<&Path>) -> Result<Self> {
        let model = FileSystemLoader::new().load(project_file, solution_file)?;
        let config = Config::load_config(&model.directory)?;
        Ok(Self::from_model(model, config))
    }

    /// Like [`ScriptEngine::new`], with a custom loader and explicit configuration.
    pub fn with_loader(
        project_file: &Path,
        solution_file: Option<&Path>,
        loader: &dyn ProjectLoader,
        config: ConfigV1,
    ) -> Result<Self> {
        config.validate()?;
        let model = loader.load(project_file, solution_file)?;
        Ok(Self::from_model(model, config))
    }

    pub fn from_model(project: ProjectModel, config: ConfigV1) -> Self {
        let formatters = Arc::new(FormatterRegistry::new(config.indent_width));
        let env = base_environment(&config);
        Self { project: Arc::new(project), config, formatters, env }
    }

    pub fn project(&self) -> &ProjectModel {
        &self.project
    }

    pub fn config(&self) -> &ConfigV1 {
        &self.config
    }

    /// Makes a host-provided formatter available to scripts under `name`.
    pub fn register_formatter<S: Into<String>>(&mut self, name: S, transform: Arc<dyn Transform>) {
        Arc::make_mut(&mut self.formatters).register(name, transform);
    }

    /// Evaluates `source`, honouring the configured timeout if any.
    pub fn evaluate(&self, source: &ScriptSource) -> EvaluationResult {
        let cancel = match self.config.timeout() {
            Some(timeout) => Cancellation::with_timeout(timeout),
            None => Cancellation::new(),
        };
        self.evaluate_with(source, &cancel)
    }

    /// Evaluates `source` until it finishes or `cancel` fires.
    ///
    /// Nothing is written unless the script compiled and ran to completion
    /// without being cancelled.
    pub fn evaluate_with(&self, source: &ScriptSource, cancel: &Cancellation) -> EvaluationResult {
        log::debug!("Evaluating '{}'.", source.path().display());
        let registry: SharedRegistry = Arc::new(Mutex::new(OutputRegistry::new(
            source,
            &self.config.output_extension,
            self.formatters.clone(),
        )));

        let outcome = self.execute(source, &registry, cancel);

        // A failed render keeps clones of the script's globals (including
        // `output`) for debugging, so the registry is taken out under the lock.
        let registry = std::mem::replace(
            &mut *registry.lock().unwrap_or_else(PoisonError::into_inner),
            OutputRegistry::new(source, &self.config.output_extension, self.formatters.clone()),
        );

        match outcome {
            Err(Failure::Compile(err)) => {
                registry.discard();
                return EvaluationResult::from_diagnostics(compile_diagnostics(&err, source));
            }
            Err(Failure::Runtime(_)) | Ok(()) if cancel.is_cancelled() => {
                let discarded = registry.discard();
                log::debug!("Cancelled '{}', discarded {discarded} output(s).", source.stem());
                return EvaluationResult::from_diagnostics(vec![Diagnostic::error(
                    "evaluation was cancelled; no files were written",
                )
                .with_location(SourceLocation::file(source.path()))]);
            }
            Err(Failure::Runtime(err)) => {
                registry.discard();
                return EvaluationResult::from_diagnostics(runtime_diagnostics(&err, source));
            }
            Ok(()) => {}
        }

        // The deadline bounds the script only; once committing starts a
        // timeout no longer splits the outputs into written and unwritten.
        let cancel = cancel.without_deadline();
        let (buffers, warnings) = registry.into_buffers();
        let mut result = EvaluationResult::from_diagnostics(warnings);
        result.extend(CommitManager::new(preamble(), &cancel).commit(buffers).diagnostics);
        result
    }

    fn execute(
        &self,
        source: &ScriptSource,
        registry: &SharedRegistry,
        cancel: &Cancellation,
    ) -> Result<(), Failure> {
        let mut env = self.env.clone();
        env.set_loader(path_loader(source.directory()));
        bindings::install(&mut env, &self.project, source, registry, &self.formatters, cancel);

        env.add_template_owned(source.template_name().to_string(), source.code().to_string())
            .map_err(Failure::Compile)?;
        let template = env.get_template(source.template_name()).map_err(Failure::Compile)?;
        template
            .render_to_write(context! {}, BodyWriter::new(registry.clone(), cancel.clone()))
            .map_err(Failure::Runtime)?;
        Ok(())
    }
}

/// Loads the project and evaluates one script: the host-facing entry point.
///
/// Usage errors (relative paths, missing files) are returned as `Err`;
/// everything that happens during evaluation is in the result.
pub fn evaluate(
    source: &ScriptSource,
    project_file: &Path,
    solution_file: Option<&Path>,
) -> Result<EvaluationResult> {
    let engine = ScriptEngine::new(project_file, solution_file)?;
    Ok(engine.evaluate(source))
}
