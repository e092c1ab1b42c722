//! Packaging backend adapter
//!
//! The backend (fpm by default) receives a staged directory plus rendered
//! metadata as command-line arguments and writes the artifact into the
//! output directory. Everything format-specific is left to it.

use crate::{
    error::{HammerError, Result},
    utils::process::ProcessRunner,
};
use std::path::Path;
use tracing::{debug, instrument};

pub const DEFAULT_COMMAND: &str = "fpm";
pub const DEFAULT_OUTPUT_TYPE: &str = "rpm";

/// External packaging command and the output format it should produce
#[derive(Debug, Clone)]
pub struct Backend {
    program: String,
    leading_args: Vec<String>,
    output_type: String,
    runner: ProcessRunner,
}

impl Backend {
    /// Create a backend from a command line such as `fpm` or `bundle exec fpm`
    pub fn new(command: &str, output_type: impl Into<String>, runner: ProcessRunner) -> Result<Self> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| HammerError::config("packaging backend command is empty"))?;

        let output_type = output_type.into();
        if output_type.trim().is_empty() {
            return Err(HammerError::config("packaging output type is empty"));
        }

        Ok(Self {
            program,
            leading_args: words.collect(),
            output_type,
            runner,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn output_type(&self) -> &str {
        &self.output_type
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// Full argument vector: source type, output type and directory, then the package arguments
    pub fn arguments(&self, output_root: &Path, package_args: Vec<String>) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend([
            "-s".to_string(),
            "dir".to_string(),
            "-t".to_string(),
            self.output_type.clone(),
            "-p".to_string(),
            output_root.display().to_string(),
        ]);
        args.extend(package_args);
        args
    }

    /// Run the backend and return its combined output
    #[instrument(skip(self, package_args), fields(backend = %self.program))]
    pub fn invoke(
        &self,
        output_root: &Path,
        package_args: Vec<String>,
        cwd: Option<&Path>,
    ) -> Result<String> {
        let args = self.arguments(output_root, package_args);
        debug!(?args, "invoking packaging backend");

        let result = self.runner.run_with_output(&self.program, &args, cwd)?;
        Ok(result.combined())
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            program: DEFAULT_COMMAND.to_string(),
            leading_args: Vec::new(),
            output_type: DEFAULT_OUTPUT_TYPE.to_string(),
            runner: ProcessRunner::default(),
        }
    }
}
