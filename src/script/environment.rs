use minijinja::{AutoEscape, Environment, UndefinedBehavior};

use crate::config::ConfigV1;
use crate::script::filters::register_filters;

/// Builds the base environment shared by every evaluation of one engine.
///
/// Per-script state (bindings and the template loader) is added to a clone
/// of this environment for each evaluation.
pub fn base_environment(config: &ConfigV1) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_fuel(config.fuel);
    register_filters(&mut env);
    env
}
