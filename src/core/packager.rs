//! Drives package builds for a selection of packages

use crate::{
    core::{
        backend::Backend,
        package::{BuildOutcome, Package},
    },
    error::{HammerError, Result},
    utils::fs::FileSystemUtils,
};
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument, warn};

/// Builds packages one after another into a shared output directory
pub struct Packager {
    packages: Vec<Package>,
    backend: Backend,
    fs_utils: FileSystemUtils,
}

impl Packager {
    pub fn new(packages: Vec<Package>, backend: Backend) -> Self {
        Self {
            packages,
            backend,
            fs_utils: FileSystemUtils::new(),
        }
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Create the output directory if needed and point every package at it.
    ///
    /// Returns the canonical output path.
    #[instrument(skip(self))]
    pub fn ensure_output_dir(&mut self, path: &Path) -> Result<PathBuf> {
        self.fs_utils
            .create_dir_all(path)
            .map_err(|e| HammerError::file_system("create directory", path, e))?;
        let output_root = self
            .fs_utils
            .canonicalize(path)
            .map_err(|e| HammerError::file_system("resolve", path, e))?;

        for package in &mut self.packages {
            package.set_output_root(&output_root);
        }

        info!("Output directory: {}", output_root.display());
        Ok(output_root)
    }

    /// Build every package in order, continuing past failures.
    ///
    /// Returns whether all packages succeeded.
    pub fn build(&mut self) -> bool {
        let total = self.packages.len();
        let mut built = 0;
        let mut skipped = 0;
        let mut failed = 0;

        for package in &mut self.packages {
            match package.build(&self.backend) {
                Ok(report) => {
                    match report.outcome {
                        BuildOutcome::Skipped { .. } => skipped += 1,
                        BuildOutcome::Packaged { .. } => built += 1,
                    }
                    if !report.cleanup_warnings.is_empty() {
                        warn!(
                            package = %package.name,
                            count = report.cleanup_warnings.len(),
                            "package built but its workspace was not fully removed"
                        );
                    }
                }
                Err(err) => {
                    failed += 1;
                    error!(
                        package = %err.package,
                        phase = %err.phase,
                        error = %err.source,
                        "failed to build package"
                    );
                    if let Some(output) = err.output().filter(|o| !o.is_empty()) {
                        error!(package = %err.package, "output:\n{output}");
                    }
                }
            }
        }

        info!(total, built, skipped, failed, "Build finished");
        failed == 0
    }
}
