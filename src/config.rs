//! Configuration loading and management

use crate::constants::{
    CONFIG_FILENAMES, DEFAULT_INDENT_WIDTH, DEFAULT_OUTPUT_EXTENSION, DEFAULT_SCRIPT_EXTENSION,
};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Engine settings, read from `scriptgen.{json,yaml,yml}` next to the project file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigV1 {
    /// Extension of a script's default output (`models.gen` -> `models.rs`).
    #[serde(default = "get_default_output_extension")]
    pub output_extension: String,
    /// Extension the CLI looks for when given a directory of scripts.
    #[serde(default = "get_default_script_extension")]
    pub script_extension: String,
    /// Spaces per nesting level for the canonical formatter.
    #[serde(default = "get_default_indent_width")]
    pub indent_width: usize,
    /// Upper bound on script execution steps. Unlimited when absent.
    #[serde(default)]
    pub fuel: Option<u64>,
    /// Evaluations still running after this many milliseconds are cancelled.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl ConfigV1 {
    pub fn validate(&self) -> Result<(), Error> {
        for (field, value) in [
            ("output_extension", &self.output_extension),
            ("script_extension", &self.script_extension),
        ] {
            if value.is_empty() {
                return Err(Error::ConfigValidation(format!("{field} must not be empty")));
            }
            if value.starts_with('.') {
                return Err(Error::ConfigValidation(format!(
                    "{field} must not start with '.'"
                )));
            }
        }
        if !(1..=16).contains(&self.indent_width) {
            return Err(Error::ConfigValidation(
                "indent_width must be between 1 and 16".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ConfigV1 {
    fn default() -> Self {
        Self {
            output_extension: get_default_output_extension(),
            script_extension: get_default_script_extension(),
            indent_width: get_default_indent_width(),
            fuel: None,
            timeout_ms: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "schemaVersion")]
pub enum Config {
    #[serde(rename = "v1")]
    V1(ConfigV1),
}

impl Config {
    /// Loads the first configuration file found in `project_dir`.
    ///
    /// Falls back to the defaults when the directory has none.
    pub fn load_config<P: AsRef<Path>>(project_dir: P) -> Result<ConfigV1> {
        let project_dir = project_dir.as_ref();

        for config_file_name in CONFIG_FILENAMES.iter() {
            let config_file_path = project_dir.join(config_file_name);
            if config_file_path.exists() {
                return Self::from_file(&config_file_path);
            }
        }

        log::debug!("No configuration file in '{}', using defaults.", project_dir.display());
        Ok(ConfigV1::default())
    }

    /// Loads and validates a configuration file; the format follows its extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ConfigV1> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        let Config::V1(config) = config;
        config.validate()?;
        log::debug!("Loaded configuration from '{}'.", path.display());
        Ok(config)
    }
}

fn get_default_output_extension() -> String {
    DEFAULT_OUTPUT_EXTENSION.to_string()
}

fn get_default_script_extension() -> String {
    DEFAULT_SCRIPT_EXTENSION.to_string()
}

fn get_default_indent_width() -> usize {
    DEFAULT_INDENT_WIDTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path()).unwrap();
        assert_eq!(config, ConfigV1::default());
        assert_eq!(config.output_extension, "rs");
        assert_eq!(config.indent_width, 4);
    }

    #[test]
    fn loads_yaml_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("scriptgen.yaml"),
            "schemaVersion: v1\noutput_extension: cs\nindent_width: 2\ntimeout_ms: 1500\n",
        )
        .unwrap();
        let config = Config::load_config(dir.path()).unwrap();
        assert_eq!(config.output_extension, "cs");
        assert_eq!(config.script_extension, "gen");
        assert_eq!(config.indent_width, 2);
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn json_takes_precedence_over_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("scriptgen.json"),
            r#"{"schemaVersion": "v1", "output_extension": "ts"}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("scriptgen.yaml"),
            "schemaVersion: v1\noutput_extension: cs\n",
        )
        .unwrap();
        assert_eq!(Config::load_config(dir.path()).unwrap().output_extension, "ts");
    }

    #[test]
    fn rejects_invalid_values() {
        let dotted = ConfigV1 { output_extension: ".rs".into(), ..ConfigV1::default() };
        assert!(matches!(dotted.validate(), Err(Error::ConfigValidation(_))));

        let wide = ConfigV1 { indent_width: 0, ..ConfigV1::default() };
        assert!(matches!(wide.validate(), Err(Error::ConfigValidation(_))));
    }

    #[test]
    fn missing_schema_version_fails_to_parse() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scriptgen.yml"), "output_extension: cs\n").unwrap();
        assert!(matches!(Config::load_config(dir.path()), Err(Error::YAMLParseError(_))));
    }
}
