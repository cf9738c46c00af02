//! Constants used throughout scriptgen

/// Configuration file names in order of preference
pub const CONFIG_FILENAMES: &[&str] = &["scriptgen.json", "scriptgen.yaml", "scriptgen.yml"];

/// Extension given to the default output of a script (`models.gen` -> `models.rs`)
pub const DEFAULT_OUTPUT_EXTENSION: &str = "rs";

/// Extension the CLI looks for when walking a directory for scripts
pub const DEFAULT_SCRIPT_EXTENSION: &str = "gen";

/// Indentation width used by the canonical formatter
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Ignore file consulted when listing project files
pub const IGNORE_FILE: &str = ".scriptgenignore";

/// Log target used for messages emitted by scripts through the `log` binding
pub const SCRIPT_LOG_TARGET: &str = "scriptgen::script";

/// Header written at the top of every generated file.
///
/// Stored with `\n` line endings; see [`crate::output::preamble`] for the
/// platform-normalized copy that is actually written.
pub const PREAMBLE_TEMPLATE: &str = "\
// ------------------------------------------------------------------------------
// <auto-generated>
//     This code was generated by a tool.
//
//     Changes to this file may cause incorrect behavior and will be lost if
//     the code is regenerated, except inside preserved regions.
// </auto-generated>
// ------------------------------------------------------------------------------

";

/// Native line ending of the host platform
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
/// Native line ending of the host platform
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Names under which scripts can reach their bindings
pub mod bindings {
    pub const PROJECT: &str = "project";
    pub const PROJECT_ALIAS: &str = "projectModel";
    pub const OUTPUT: &str = "output";
    pub const FORMATTERS: &str = "formatters";
    pub const LOG: &str = "log";
    pub const SCRIPT: &str = "script";
    pub const PLATFORM: &str = "platform";
    pub const RAISE: &str = "raise";
}

/// Built-in formatter names
pub mod formatters {
    pub const PASS_THROUGH: &str = "passthrough";
    pub const CANONICAL: &str = "canonical";
    pub const MERGE: &str = "merge";
}

/// Sentinel markers delimiting preserved regions
pub mod sentinel {
    pub const BEGIN: &str = "BEGIN-PRESERVED";
    pub const END: &str = "END-PRESERVED";
}

/// Exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
}

/// Verbosity levels
pub mod verbosity {
    pub const OFF: u8 = 0;
    pub const INFO: u8 = 1;
    pub const DEBUG: u8 = 2;
    pub const TRACE: u8 = 3;
}
