//! Run configuration.
//!
//! Settings come from up to three layers: built-in defaults, an optional
//! YAML config file, and command-line flags. Each layer is a [`ConfigLayer`]
//! of optional values; [`ConfigLayer::overlay`] stacks them and
//! [`ConfigLayer::resolve`] produces the final [`MergeConfig`].
//!
//! # Example YAML
//!
//! ```yaml
//! input-directory: specs/
//! output-file: build/mock_server_openapi.yml
//! validate: true
//! verbose: false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Output file used when none is configured.
pub const DEFAULT_OUTPUT_FILE: &str = "mock_server_openapi.yml";

/// Fully resolved settings for one merge run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MergeConfig {
    /// Directory holding the per-service documents.
    pub input_directory: PathBuf,
    /// Destination of the unified document.
    pub output_file: PathBuf,
    /// Validate the merged document before writing it.
    pub validate: bool,
    /// Report every merge step, not just warnings.
    pub verbose: bool,
}

impl MergeConfig {
    /// Creates a configuration with default settings for `input_directory`.
    ///
    /// ```
    /// use openapi_merge_core::{DEFAULT_OUTPUT_FILE, MergeConfig};
    ///
    /// let config = MergeConfig::new("specs");
    /// assert_eq!(config.output_file.to_str(), Some(DEFAULT_OUTPUT_FILE));
    /// assert!(config.validate);
    /// assert!(!config.verbose);
    /// ```
    pub fn new(input_directory: impl Into<PathBuf>) -> Self {
        Self {
            input_directory: input_directory.into(),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            validate: true,
            verbose: false,
        }
    }

    pub fn with_output_file(mut self, output_file: impl Into<PathBuf>) -> Self {
        self.output_file = output_file.into();
        self
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// One source of settings; unset fields defer to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_directory: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

impl ConfigLayer {
    /// Loads a layer from a YAML file. An empty file is an empty layer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not a valid config mapping.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Stacks `higher` on top of `self`; set fields in `higher` win.
    pub fn overlay(self, higher: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            input_directory: higher.input_directory.or(self.input_directory),
            output_file: higher.output_file.or(self.output_file),
            validate: higher.validate.or(self.validate),
            verbose: higher.verbose.or(self.verbose),
        }
    }

    /// Fills unset fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingInputDirectory`] if no layer named an
    /// input directory.
    pub fn resolve(self) -> Result<MergeConfig, ConfigError> {
        let input_directory = self
            .input_directory
            .ok_or(ConfigError::MissingInputDirectory)?;
        let mut config = MergeConfig::new(input_directory);
        if let Some(output_file) = self.output_file {
            config.output_file = output_file;
        }
        if let Some(validate) = self.validate {
            config.validate = validate;
        }
        if let Some(verbose) = self.verbose {
            config.verbose = verbose;
        }
        Ok(config)
    }
}
