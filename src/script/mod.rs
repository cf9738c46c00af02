//! The scripting host: a MiniJinja environment with scriptgen's bindings.
//!
//! A script is a template. Text its body renders goes to the script's
//! default output; everything else goes through the `output` binding.

pub mod bindings;
pub mod environment;
pub mod filters;

pub use bindings::{BodyWriter, SharedRegistry};
pub use environment::base_environment;
