//! Error types for hammer
//!
//! `HammerError` describes what went wrong; `PackageError` adds which package
//! was being built and which pipeline phase detected the failure.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for manifest loading, rendering and packaging
#[derive(Error, Debug)]
pub enum HammerError {
    /// Manifest could not be read or parsed
    #[error("Manifest error in {path}: {message}")]
    Manifest {
        message: String,
        path: PathBuf,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Template string could not be rendered
    #[error("Template error in {field}: {message}")]
    Template { field: String, message: String },

    /// Resource could not be acquired
    #[error("Resource error for {resource}: {message}")]
    Resource {
        resource: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Script set contains a hook outside the lifecycle whitelist
    #[error("invalid script name: {name}")]
    InvalidScriptName { name: String },

    /// File system operation errors
    #[error("File system error: {operation} failed on {path}")]
    FileSystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Process execution errors
    #[error("Process error: {command} {message}")]
    Process {
        command: String,
        message: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl HammerError {
    /// Create a new manifest error
    pub fn manifest<P: Into<PathBuf>>(message: impl Into<String>, path: P) -> Self {
        Self::Manifest {
            message: message.into(),
            path: path.into(),
            source: None,
        }
    }

    /// Create a new template error
    pub fn template(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new resource error
    pub fn resource(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resource {
            resource: resource.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a new file system error
    pub fn file_system<P: Into<PathBuf>>(
        operation: impl Into<String>,
        path: P,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a new process error
    pub fn process(
        command: impl Into<String>,
        message: impl Into<String>,
        exit_code: Option<i32>,
        output: impl Into<String>,
    ) -> Self {
        Self::Process {
            command: command.into(),
            message: message.into(),
            exit_code,
            output: output.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Attach a source error to variants that carry one
    #[must_use]
    pub fn with_source(mut self, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        match &mut self {
            Self::Manifest { source, .. } | Self::Resource { source, .. } => {
                *source = Some(Box::new(err));
            }
            _ => {}
        }
        self
    }

    /// Captured subprocess output, if this error came from one
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Process { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Stage of the package pipeline in which a failure was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ConflictCheck,
    Workspace,
    Resources,
    Build,
    Render,
    Scripts,
    Targets,
    Backend,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConflictCheck => "conflict check",
            Self::Workspace => "workspace setup",
            Self::Resources => "resource acquisition",
            Self::Build => "build script",
            Self::Render => "metadata rendering",
            Self::Scripts => "hook scripts",
            Self::Targets => "targets",
            Self::Backend => "packaging backend",
        };
        f.write_str(name)
    }
}

/// A failure scoped to one package build
#[derive(Error, Debug)]
#[error("package {package} failed during {phase}: {source}")]
pub struct PackageError {
    pub package: String,
    pub phase: Phase,
    #[source]
    pub source: HammerError,
}

impl PackageError {
    pub fn new(package: impl Into<String>, phase: Phase, source: HammerError) -> Self {
        Self {
            package: package.into(),
            phase,
            source,
        }
    }

    /// Captured build script or backend output, for operator diagnostics
    pub fn output(&self) -> Option<&str> {
        self.source.output()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, HammerError>;
