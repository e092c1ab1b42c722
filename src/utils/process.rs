//! Process execution utilities
//!
//! Runs build scripts and the packaging backend to completion, capturing
//! their output for diagnostics.

use crate::error::{HammerError, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Utility for running external processes
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    debug: bool,
}

/// Result of a process execution
#[derive(Debug)]
pub struct ProcessResult {
    /// Exit status code
    pub exit_code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Whether the process was successful
    pub success: bool,
}

impl ProcessResult {
    /// Standard output followed by standard error.
    ///
    /// The streams are captured separately, so lines are grouped per stream
    /// rather than interleaved in the order the process wrote them.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

impl ProcessRunner {
    /// Create a new process runner
    #[must_use]
    pub const fn new(debug: bool) -> Self {
        Self { debug }
    }

    /// Run a command to completion and capture its output.
    ///
    /// A launch failure or a non-zero exit status is an error carrying the
    /// combined output.
    #[instrument(skip(self, args))]
    pub fn run_with_output(
        &self,
        command: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<ProcessResult> {
        let cmd_str = format!("{} {}", command, args.join(" "));

        if self.debug {
            debug!("Running command: {}", cmd_str);
        } else {
            info!("+ {}", command);
        }

        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let started = Instant::now();
        let output = cmd.output().map_err(|e| {
            HammerError::process(
                command,
                format!("could not be started: {e}"),
                None,
                String::new(),
            )
        })?;

        let result = ProcessResult {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        };

        debug!(
            command,
            success = result.success,
            exit_code = ?result.exit_code,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "command exited"
        );

        if !result.success {
            return Err(HammerError::process(
                command,
                "exited with a non-zero status",
                result.exit_code,
                result.combined(),
            ));
        }

        Ok(result)
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_process_runner_creation() {
        let runner = ProcessRunner::new(true);
        assert!(runner.debug);

        let runner = ProcessRunner::default();
        assert!(!runner.debug);
    }

    #[test]
    fn test_run_with_output() {
        let runner = ProcessRunner::new(false);
        let result = runner
            .run_with_output("echo", &["hello".into(), "world".into()], None)
            .unwrap();

        assert!(result.success);
        assert_eq!(result.stdout.trim(), "hello world");
        assert!(result.stderr.is_empty());
    }

    #[test]
    fn test_combined_output_includes_stderr() {
        let runner = ProcessRunner::new(false);
        let result = runner
            .run_with_output("sh", &sh("echo out; echo err >&2"), None)
            .unwrap();

        assert_eq!(result.combined(), "out\nerr\n");
    }

    #[test]
    fn test_run_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(false);
        let result = runner
            .run_with_output("sh", &sh("touch marker"), Some(dir.path()))
            .unwrap();

        assert!(result.success);
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn test_run_failing_command() {
        let runner = ProcessRunner::new(false);
        let result = runner.run_with_output("sh", &sh("echo broken; exit 3"), None);

        match result {
            Err(HammerError::Process {
                command,
                exit_code,
                output,
                ..
            }) => {
                assert_eq!(command, "sh");
                assert_eq!(exit_code, Some(3));
                assert_eq!(output.trim(), "broken");
            }
            other => panic!("Expected process error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_command() {
        let runner = ProcessRunner::new(false);
        let result = runner.run_with_output("nonexistent_command_12345", &[], None);
        assert!(matches!(
            result,
            Err(HammerError::Process { exit_code: None, .. })
        ));
    }
}
