//! YAML configuration for the engine and the command-line tool.

use crate::flattener::DEFAULT_MAX_REGEX_LEN;
use crate::generator::strategy::{DEFAULT_BOUNDED_LIMIT, DEFAULT_MAX_REPEAT};
use crate::template_request::DataTemplateRequest;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine settings.
///
/// # Example
///
/// ```yaml
/// data_template:
///   min_multiplier: 1
///   max_multiplier: 2
/// max_regex_len: 128
/// fixtures_dir: ./fixtures
/// seed: 42
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FuzzConfig {
    #[serde(default)]
    pub data_template: DataTemplateRequest,

    /// Flattened alternations longer than this collapse to `.+`.
    #[serde(default = "default_max_regex_len")]
    pub max_regex_len: usize,

    /// Extra repetitions generated for unbounded quantifiers.
    #[serde(default = "default_max_repeat")]
    pub max_repeat: u32,

    /// Output cap of the secondary regex strategy.
    #[serde(default = "default_bounded_output_limit")]
    pub bounded_output_limit: usize,

    /// Directory holding `<name>.dat` fixture files.
    #[serde(default)]
    pub fixtures_dir: Option<PathBuf>,

    /// Seed for reproducible generation.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_max_regex_len() -> usize {
    DEFAULT_MAX_REGEX_LEN
}

fn default_max_repeat() -> u32 {
    DEFAULT_MAX_REPEAT
}

fn default_bounded_output_limit() -> usize {
    DEFAULT_BOUNDED_LIMIT
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            data_template: DataTemplateRequest::default(),
            max_regex_len: default_max_regex_len(),
            max_repeat: default_max_repeat(),
            bounded_output_limit: default_bounded_output_limit(),
            fixtures_dir: None,
            seed: None,
        }
    }
}

impl FuzzConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        let mut config: FuzzConfig = serde_yaml::from_str(contents)?;
        config.data_template = config.data_template.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_regex_len == 0 {
            anyhow::bail!("max_regex_len must be greater than zero");
        }

        if self.bounded_output_limit == 0 {
            anyhow::bail!("bounded_output_limit must be greater than zero");
        }

        if let Some(dir) = &self.fixtures_dir {
            if !dir.is_dir() {
                anyhow::bail!(
                    "fixtures_dir '{}' does not exist or is not a directory",
                    dir.display()
                );
            }
        }

        Ok(())
    }
}
