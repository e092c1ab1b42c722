//! Configuration management for hammer
//!
//! Centralizes the options resolved from flags and `HAMMER_*` environment
//! variables and validates them before any package is loaded.

use crate::{
    cli::Args,
    core::backend::{self, Backend},
    error::HammerError,
    utils::process::ProcessRunner,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Enable debug logging
    pub debug: bool,
    /// Root directory searched for package manifests
    pub search: PathBuf,
    /// Directory artifacts are written to
    pub output: PathBuf,
    /// Packaging backend configuration
    pub backend: BackendConfig,
}

/// Packaging backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend command line, e.g. `fpm`
    pub command: String,
    /// Output format passed as `-t`
    pub output_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            search: PathBuf::from("."),
            output: PathBuf::from("out"),
            backend: BackendConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command: backend::DEFAULT_COMMAND.to_string(),
            output_type: backend::DEFAULT_OUTPUT_TYPE.to_string(),
        }
    }
}

impl Config {
    /// Create configuration from command line arguments
    pub fn from_args(args: &Args) -> Result<Self, HammerError> {
        let config = Self {
            debug: args.debug,
            search: args.search.clone(),
            output: args.output.clone(),
            backend: BackendConfig {
                command: args.backend.clone(),
                output_type: args.output_type.clone(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), HammerError> {
        if !self.search.is_dir() {
            return Err(HammerError::validation(format!(
                "Search directory not found: {}",
                self.search.display()
            )));
        }

        if self.output.exists() && !self.output.is_dir() {
            return Err(HammerError::validation(format!(
                "Output path is not a directory: {}",
                self.output.display()
            )));
        }

        if self.backend.command.trim().is_empty() {
            return Err(HammerError::config("packaging backend command is empty"));
        }

        if self.backend.output_type.trim().is_empty() {
            return Err(HammerError::config("packaging output type is empty"));
        }

        Ok(())
    }

    /// Build the packaging backend described by this configuration
    pub fn backend(&self) -> Result<Backend, HammerError> {
        Backend::new(
            &self.backend.command,
            self.backend.output_type.clone(),
            ProcessRunner::new(self.debug),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output, PathBuf::from("out"));
        assert_eq!(config.backend.command, "fpm");
        assert_eq!(config.backend.output_type, "rpm");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_args() {
        let temp = TempDir::new().unwrap();
        let search = temp.path().to_str().unwrap();
        let args = Args::try_parse_from([
            "hammer", "--search", search, "--type", "deb", "--backend", "bundle exec fpm", "build",
        ])
        .unwrap();

        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.search, temp.path());
        assert_eq!(config.backend.output_type, "deb");

        let backend = config.backend().unwrap();
        assert_eq!(backend.program(), "bundle");
        assert_eq!(backend.output_type(), "deb");
    }

    #[test]
    fn test_validate_rejects_missing_search() {
        let config = Config {
            search: PathBuf::from("/nonexistent/hammer/search"),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(HammerError::Validation { .. })));
    }

    #[test]
    fn test_validate_rejects_file_as_output() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("out");
        std::fs::write(&file, "").unwrap();

        let config = Config {
            output: file,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_backend() {
        let mut config = Config::default();
        config.backend.command = " ".to_string();
        assert!(matches!(config.validate(), Err(HammerError::Config { .. })));
    }
}
