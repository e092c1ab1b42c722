//! # hammer
//!
//! Builds installable packages from declarative YAML manifests. Each manifest
//! names its resources, a build script, lifecycle hooks and install targets;
//! hammer fetches the resources into a temporary workspace, runs the build,
//! and hands the staged files to a packaging backend (fpm by default).
//!
//! ## Features
//!
//! - Manifest fields are templates that may reference the package itself
//! - Remote and local resources with optional sha256 verification
//! - Existing artifacts are never overwritten
//! - Workspaces are always removed, including after failures
//!
//! ## Example
//!
//! ```no_run
//! use hammer::core::{Backend, Loader, Packager};
//!
//! let packages = Loader::new("packages").load()?;
//! let mut packager = Packager::new(packages, Backend::default());
//! packager.ensure_output_dir("out".as_ref())?;
//! if !packager.build() {
//!     std::process::exit(1);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;

use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with appropriate verbosity
pub fn setup_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .compact(),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
