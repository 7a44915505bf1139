//! Project configuration
//!
//! Optional per-project defaults, loaded from `.rehearse.yml` at the project
//! root. Every field mirrors a CLI flag, and flags win over the file:
//!
//! ```yaml
//! workflows:
//!   - .github/workflows/ci.yml
//! jobs:
//!   - /test/
//! skip_step:
//!   - deploy
//! verbose: true
//! warn:
//!   version_mismatch: false
//! privileged_command_patterns:
//!   - ^sudo\b
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Name of the config file looked up at the project root.
pub const CONFIG_FILE: &str = ".rehearse.yml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read {file}: {source}")]
    Io {
        file: String,
        source: std::io::Error,
    },

    #[error("parse {file}: {source}")]
    Yaml {
        file: String,
        source: serde_yaml::Error,
    },
}

/// CI provider whose workflow files to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Detect from the files present at the project root.
    #[default]
    Auto,
    Github,
}

/// Report format for `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarnConfig {
    /// Warn when `.ruby-version`/`.node-version` disagree with the
    /// interpreters on PATH.
    #[serde(default = "default_true")]
    pub version_mismatch: bool,
}

impl Default for WarnConfig {
    fn default() -> Self {
        Self {
            version_mismatch: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: Provider,

    /// Workflow files to run; empty means discover them.
    #[serde(default)]
    pub workflows: Vec<String>,

    /// Job filter patterns.
    #[serde(default)]
    pub jobs: Vec<String>,

    /// Step filter patterns: keep only matching steps.
    #[serde(default)]
    pub only_step: Vec<String>,

    /// Step filter patterns: drop matching steps.
    #[serde(default)]
    pub skip_step: Vec<String>,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub format: Format,

    #[serde(default)]
    pub warn: WarnConfig,

    /// Overrides the built-in privileged command patterns.
    #[serde(default)]
    pub privileged_command_patterns: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load `.rehearse.yml` from the project root. A missing file is the
    /// default configuration, not an error.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    file: path.display().to_string(),
                    source,
                });
            }
        };
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            file: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.provider, Provider::Auto);
        assert_eq!(config.format, Format::Pretty);
        assert!(config.warn.version_mismatch);
        assert!(!config.dry_run);
        assert!(config.workflows.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
provider: github
workflows:
  - .github/workflows/ci.yml
jobs:
  - /test/
skip_step:
  - deploy
format: json
verbose: true
warn:
  version_mismatch: false
privileged_command_patterns:
  - ^sudo\b
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider, Provider::Github);
        assert_eq!(config.workflows, vec![".github/workflows/ci.yml"]);
        assert_eq!(config.jobs, vec!["/test/"]);
        assert_eq!(config.skip_step, vec!["deploy"]);
        assert_eq!(config.format, Format::Json);
        assert!(config.verbose);
        assert!(!config.warn.version_mismatch);
        assert_eq!(config.privileged_command_patterns, vec![r"^sudo\b"]);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.format, Format::Pretty);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "workflows: {not a list").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }
}
