//! Globals a running script sees.
//!
//! `output` and `log` are host objects; their methods return the empty
//! string so they can be called from `{{ ... }}` without leaving text behind.

use indexmap::IndexMap;
use minijinja::value::{from_args, Object, ObjectRepr, Rest, Value, ValueKind};
use minijinja::{Environment, Error as ScriptError, ErrorKind, State};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cancel::Cancellation;
use crate::constants::{bindings, SCRIPT_LOG_TARGET};
use crate::error::Error;
use crate::format::FormatterRegistry;
use crate::output::OutputRegistry;
use crate::project::ProjectModel;
use crate::source::ScriptSource;

pub type SharedRegistry = Arc<Mutex<OutputRegistry>>;

fn lock(registry: &SharedRegistry) -> MutexGuard<'_, OutputRegistry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Wraps a crate error so it survives as the source of a script failure.
fn script_error(detail: impl Into<String>, source: Error) -> ScriptError {
    ScriptError::new(ErrorKind::InvalidOperation, detail.into()).with_source(source)
}

#[derive(Debug, Serialize)]
struct ScriptInfo {
    path: PathBuf,
    directory: PathBuf,
    name: String,
}

/// Adds every binding for one evaluation to `env`.
pub fn install(
    env: &mut Environment<'static>,
    project: &ProjectModel,
    source: &ScriptSource,
    registry: &SharedRegistry,
    formatters: &FormatterRegistry,
    cancel: &Cancellation,
) {
    let project = Value::from_serialize(project);
    env.add_global(bindings::PROJECT, project.clone());
    env.add_global(bindings::PROJECT_ALIAS, project);

    env.add_global(
        bindings::OUTPUT,
        Value::from_object(OutputHandle { registry: registry.clone(), cancel: cancel.clone() }),
    );

    let handles: IndexMap<&str, &str> = formatters.names().map(|name| (name, name)).collect();
    env.add_global(bindings::FORMATTERS, Value::from_serialize(&handles));

    env.add_global(
        bindings::LOG,
        Value::from_object(LogHandle { script: source.stem().to_string() }),
    );

    env.add_global(
        bindings::SCRIPT,
        Value::from_serialize(&ScriptInfo {
            path: source.path().to_path_buf(),
            directory: source.directory().to_path_buf(),
            name: source.stem().to_string(),
        }),
    );

    env.add_global(
        bindings::PLATFORM,
        Value::from_serialize(serde_json::json!({
            "os": std::env::consts::OS,
            "family": std::env::consts::FAMILY,
            "arch": std::env::consts::ARCH,
        })),
    );

    env.add_function(bindings::RAISE, raise);
}

/// The `output` binding.
#[derive(Debug)]
pub struct OutputHandle {
    registry: SharedRegistry,
    cancel: Cancellation,
}

impl OutputHandle {
    fn check_cancelled(&self) -> Result<(), ScriptError> {
        if self.cancel.is_cancelled() {
            return Err(script_error("evaluation was cancelled", Error::Cancelled));
        }
        Ok(())
    }

    fn write(&self, args: &[Value], newline: bool) -> Result<(), ScriptError> {
        let (first, second): (Value, Option<Value>) = from_args(args)?;
        let (name, text) = match second {
            Some(text) => (Some(buffer_name(&first)?), text),
            None => (None, first),
        };
        let mut text = text_of(&text);
        if newline {
            text.push('\n');
        }
        lock(&self.registry)
            .write(name.as_deref(), &text)
            .map_err(|e| script_error("output.write failed", e))
    }

    fn attach_formatter(&self, args: &[Value]) -> Result<(), ScriptError> {
        let (first, second): (&str, Option<&str>) = from_args(args)?;
        let (name, formatter) = match second {
            Some(formatter) => (Some(first), formatter),
            None => (None, first),
        };
        lock(&self.registry)
            .attach_formatter(name, formatter)
            .map_err(|e| script_error("output.attach_formatter failed", e))
    }
}

impl Object for OutputHandle {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, ScriptError> {
        self.check_cancelled()?;
        match method {
            "write" => self.write(args, false)?,
            "writeln" => self.write(args, true)?,
            "attach_formatter" | "attachFormatter" => self.attach_formatter(args)?,
            _ => {
                return Err(ScriptError::new(
                    ErrorKind::UnknownMethod,
                    format!("output has no method named {method}"),
                ))
            }
        }
        Ok(Value::from(""))
    }
}

fn buffer_name(value: &Value) -> Result<String, ScriptError> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        ScriptError::new(
            ErrorKind::InvalidOperation,
            format!("output name must be a string, got {}", value.kind()),
        )
    })
}

fn text_of(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}

/// The `log` binding.
#[derive(Debug)]
pub struct LogHandle {
    script: String,
}

impl Object for LogHandle {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, ScriptError> {
        let level = match method {
            "trace" => log::Level::Trace,
            "debug" => log::Level::Debug,
            "info" => log::Level::Info,
            "warn" => log::Level::Warn,
            "error" => log::Level::Error,
            _ => {
                return Err(ScriptError::new(
                    ErrorKind::UnknownMethod,
                    format!("log has no method named {method}"),
                ))
            }
        };
        let (message,): (Value,) = from_args(args)?;
        log::log!(target: SCRIPT_LOG_TARGET, level, "[{}] {}", self.script, text_of(&message));
        Ok(Value::from(""))
    }
}

/// `raise(message, ...)`: fails the script with one diagnostic per message.
///
/// A list argument, however it was built, contributes one message per item.
fn raise(args: Rest<Value>) -> Result<Value, ScriptError> {
    let mut messages = Vec::new();
    for arg in args.iter() {
        if matches!(arg.kind(), ValueKind::Seq | ValueKind::Iterable) {
            messages.extend(arg.try_iter()?.map(|item| text_of(&item)));
        } else {
            messages.push(text_of(arg));
        }
    }
    if messages.is_empty() {
        messages.push("script raised an error".to_string());
    }
    Err(script_error("script raised an error", Error::Raised(messages)))
}

/// Receives the text the script body renders and appends it to the default buffer.
pub struct BodyWriter {
    registry: SharedRegistry,
    cancel: Cancellation,
}

impl BodyWriter {
    pub fn new(registry: SharedRegistry, cancel: Cancellation) -> Self {
        Self { registry, cancel }
    }
}

impl io::Write for BodyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.cancel.is_cancelled() {
            return Err(io::Error::other(Error::Cancelled));
        }
        lock(&self.registry).append_body(buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
