//! The package: manifest data plus one build's workspace
//!
//! `build` runs the whole pipeline for one manifest. `package_artifact` is the
//! last stage on its own: check hook names, render metadata, stage hook
//! scripts, call the backend.

use crate::{
    core::{
        backend::Backend,
        resource::{Fetch, Resource},
        scripts::ScriptSet,
        template::{self, TemplateContext},
    },
    error::{HammerError, PackageError, Phase, Result},
    utils::fs::FileSystemUtils,
};
use serde::{Deserialize, Deserializer, de::Error as _};
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, error, info, instrument, warn};

const RESOURCE_MODE: u32 = 0o777;
const SCRIPT_MODE: u32 = 0o755;

/// Mapping from a path produced by the build to its install location
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Target {
    pub src: String,
    pub dest: String,
}

/// A package as described by its manifest
#[derive(Debug, Deserialize)]
pub struct Package {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar")]
    pub version: String,
    #[serde(default, deserialize_with = "scalar")]
    pub iteration: String,
    #[serde(default, deserialize_with = "scalar")]
    pub epoch: String,
    #[serde(default, deserialize_with = "scalar")]
    pub license: String,
    #[serde(default, deserialize_with = "scalar")]
    pub vendor: String,
    #[serde(default, deserialize_with = "scalar")]
    pub url: String,
    #[serde(default, deserialize_with = "scalar")]
    pub description: String,
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub scripts: ScriptSet,

    #[serde(skip)]
    root: Option<PathBuf>,
    #[serde(skip)]
    output_root: Option<PathBuf>,
    #[serde(skip)]
    workspace: Workspace,
}

/// What a finished build did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// An artifact for this name/version/iteration already exists
    Skipped { existing: String },
    /// The backend produced an artifact; `output` is what it printed
    Packaged { output: String },
}

/// Result of a build that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub outcome: BuildOutcome,
    /// Workspace directories that could not be removed
    pub cleanup_warnings: Vec<String>,
}

impl BuildReport {
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, BuildOutcome::Skipped { .. })
    }

    pub fn workspace_reclaimed(&self) -> bool {
        self.cleanup_warnings.is_empty()
    }
}

/// Temporary directories owned by the package for the duration of one build
#[derive(Debug, Default)]
struct Workspace {
    build: Option<TempDir>,
    scripts: Option<TempDir>,
}

impl Workspace {
    fn create(prefix: &str) -> Result<TempDir> {
        tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .map_err(|e| HammerError::file_system("create directory", std::env::temp_dir(), e))
    }

    /// Remove both directories, reporting failures instead of returning them
    fn reclaim(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        for (label, dir) in [("build root", self.build.take()), ("script root", self.scripts.take())] {
            let Some(dir) = dir else { continue };
            let path = dir.path().to_path_buf();

            match dir.close() {
                Ok(()) => debug!(path = %path.display(), "removed {label}"),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not remove {label} during cleanup");
                    warnings.push(format!("could not remove {label} {}: {e}", path.display()));
                }
            }
        }

        warnings
    }
}

impl Package {
    /// Parse a package from manifest YAML
    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Directory containing the manifest
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn set_root(&mut self, root: impl Into<PathBuf>) {
        self.root = Some(root.into());
    }

    pub fn output_root(&self) -> Option<&Path> {
        self.output_root.as_deref()
    }

    pub fn set_output_root(&mut self, output_root: impl Into<PathBuf>) {
        self.output_root = Some(output_root.into());
    }

    /// Build workspace, while a build is running
    pub fn build_root(&self) -> Option<&Path> {
        self.workspace.build.as_ref().map(TempDir::path)
    }

    /// Rendered hook scripts, while packaging is running
    pub fn script_root(&self) -> Option<&Path> {
        self.workspace.scripts.as_ref().map(TempDir::path)
    }

    /// Render a template string with this package as its context
    pub fn render(&self, label: &str, input: &str) -> Result<String> {
        template::render(label, input, self)
    }

    /// Remove any workspace directories left by a previous call
    pub fn reclaim_workspace(&mut self) -> Vec<String> {
        self.workspace.reclaim()
    }

    fn fail(&self, phase: Phase, source: HammerError) -> PackageError {
        PackageError::new(&self.name, phase, source)
    }

    fn require_output_root(&self, phase: Phase) -> std::result::Result<PathBuf, PackageError> {
        self.output_root
            .clone()
            .ok_or_else(|| self.fail(phase, HammerError::config("output directory is not set")))
    }

    /// Build the package: resources, build script, backend, cleanup.
    ///
    /// An existing artifact named `{name}-{version}-{iteration}.*` in the
    /// output directory skips the build without touching anything.
    #[instrument(skip(self, backend), fields(package = %self.name))]
    pub fn build(&mut self, backend: &Backend) -> std::result::Result<BuildReport, PackageError> {
        let output_root = self.require_output_root(Phase::ConflictCheck)?;

        let conflict = self
            .find_conflict(&output_root)
            .map_err(|e| self.fail(Phase::ConflictCheck, e))?;
        if let Some(existing) = conflict {
            warn!(file = %existing, "found conflicting output file - not building to avoid overwrite");
            return Ok(BuildReport {
                outcome: BuildOutcome::Skipped { existing },
                cleanup_warnings: Vec::new(),
            });
        }

        info!("Building package");
        let started = Instant::now();

        let result = self.run_pipeline(backend);
        let cleanup_warnings = self.workspace.reclaim();
        let output = result?;

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "Package built");
        Ok(BuildReport {
            outcome: BuildOutcome::Packaged { output },
            cleanup_warnings,
        })
    }

    fn find_conflict(&self, output_root: &Path) -> Result<Option<String>> {
        let glob = format!("{}-{}-{}.*", self.name, self.version, self.iteration);
        let files = FileSystemUtils::new()
            .file_names(output_root)
            .map_err(|e| HammerError::file_system("read directory", output_root, e))?;

        let pattern = match glob::Pattern::new(&glob) {
            Ok(pattern) => pattern,
            Err(e) => {
                error!(glob = %glob, error = %e, "could not match output files");
                return Ok(None);
            }
        };

        Ok(files.into_iter().find(|file| pattern.matches(file)))
    }

    fn run_pipeline(&mut self, backend: &Backend) -> std::result::Result<String, PackageError> {
        let build_dir = Workspace::create(&format!("hammer-{}", self.name))
            .map_err(|e| self.fail(Phase::Workspace, e))?;
        let build_root = build_dir.path().to_path_buf();
        self.workspace.build = Some(build_dir);
        debug!(build_root = %build_root.display(), "created build root");

        self.fetch_resources(&build_root)
            .map_err(|e| self.fail(Phase::Resources, e))?;

        let script = self
            .render_build_script()
            .map_err(|e| self.fail(Phase::Build, e))?;
        let result = ScriptSet::run_build(backend.runner(), &script, &build_root)
            .map_err(|e| self.fail(Phase::Build, e))?;
        debug!(output = %result.combined(), "build script finished");

        self.package_artifact(backend)
    }

    /// Workspace file names for every resource, rejecting unsafe or repeated names
    fn resource_names(&self) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(self.resources.len());

        for resource in &self.resources {
            let name = resource.name(self)?;
            if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
                return Err(HammerError::resource(
                    name,
                    "resource name must be a plain file name",
                ));
            }
            if !seen.insert(name.clone()) {
                return Err(HammerError::resource(name, "duplicate resource name"));
            }
            names.push(name);
        }
        Ok(names)
    }

    fn fetch_resources(&self, build_root: &Path) -> Result<()> {
        let names = self.resource_names()?;
        let fs_utils = FileSystemUtils::new();

        for (resource, name) in self.resources.iter().zip(names) {
            let body = resource.download(self)?;

            let dest = build_root.join(&name);
            fs_utils
                .write_file_with_mode(&dest, &body, RESOURCE_MODE)
                .map_err(|e| HammerError::file_system("write resource", &dest, e))?;
            debug!(resource = %name, bytes = body.len(), "stored resource");
        }

        Ok(())
    }

    fn render_build_script(&self) -> Result<String> {
        let body = self
            .scripts
            .build_script()
            .ok_or_else(|| HammerError::validation("manifest has no build script"))?;
        self.render("scripts.build", body)
    }

    /// Check hook names, render metadata, stage hook scripts and run the
    /// packaging backend.
    ///
    /// Returns the backend's combined output.
    #[instrument(skip(self, backend), fields(package = %self.name))]
    pub fn package_artifact(&mut self, backend: &Backend) -> std::result::Result<String, PackageError> {
        let output_root = self.require_output_root(Phase::Render)?;

        for (hook, _) in self.scripts.hooks() {
            ScriptSet::validate_hook(hook)
                .inspect_err(|_| error!(hook, "invalid script name"))
                .map_err(|e| self.fail(Phase::Scripts, e))?;
        }

        let mut args = self
            .metadata_args()
            .map_err(|e| self.fail(Phase::Render, e))?;

        let script_dir = Workspace::create(&format!("hammer-scripts-{}", self.name))
            .map_err(|e| self.fail(Phase::Workspace, e))?;
        let script_root = script_dir.path().to_path_buf();
        self.workspace.scripts = Some(script_dir);

        args.extend(
            self.hook_args(&script_root)
                .map_err(|e| self.fail(Phase::Scripts, e))?,
        );
        args.extend(self.target_args().map_err(|e| self.fail(Phase::Targets, e))?);

        info!("packaging with {}", backend.program());
        backend
            .invoke(&output_root, args, self.build_root())
            .map_err(|e| self.fail(Phase::Backend, e))
    }

    fn metadata_args(&self) -> Result<Vec<String>> {
        let mut args = Vec::new();

        for (flag, value) in [
            ("name", &self.name),
            ("version", &self.version),
            ("iteration", &self.iteration),
        ] {
            args.push(format!("--{flag}"));
            args.push(self.render(flag, value)?);
        }

        for (flag, value) in [
            ("epoch", &self.epoch),
            ("license", &self.license),
            ("vendor", &self.vendor),
            ("description", &self.description),
            ("url", &self.url),
        ] {
            if value.is_empty() {
                continue;
            }
            args.push(format!("--{flag}"));
            args.push(self.render(flag, value)?);
        }

        for depend in &self.depends {
            args.push("--depend".to_string());
            args.push(depend.clone());
        }

        Ok(args)
    }

    fn hook_args(&self, script_root: &Path) -> Result<Vec<String>> {
        let fs_utils = FileSystemUtils::new();
        let mut args = Vec::new();

        for (hook, body) in self.scripts.hooks() {
            let content = self.render(&format!("scripts.{hook}"), body)?;
            let location = script_root.join(hook);
            fs_utils
                .write_file_with_mode(&location, content, SCRIPT_MODE)
                .map_err(|e| HammerError::file_system("write script", &location, e))?;
            debug!(hook, "wrote script");

            args.push(format!("--{hook}"));
            args.push(location.display().to_string());
        }

        Ok(args)
    }

    fn target_args(&self) -> Result<Vec<String>> {
        self.targets
            .iter()
            .enumerate()
            .map(|(index, target)| -> Result<String> {
                let src = self.render(&format!("targets[{index}].src"), &target.src)?;
                let dest = self.render(&format!("targets[{index}].dest"), &target.dest)?;
                Ok(format!("{src}={dest}"))
            })
            .collect()
    }
}

/// Accept unquoted YAML numbers and booleans (`iteration: 1`) as strings
fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!("expected a string, found {other:?}"))),
    }
}

fn path_value(path: Option<&Path>) -> Cow<'_, str> {
    path.map_or(Cow::Borrowed(""), Path::to_string_lossy)
}

impl TemplateContext for Package {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        let value = match name.to_ascii_lowercase().as_str() {
            "name" => Cow::Borrowed(self.name.as_str()),
            "version" => Cow::Borrowed(self.version.as_str()),
            "iteration" => Cow::Borrowed(self.iteration.as_str()),
            "epoch" => Cow::Borrowed(self.epoch.as_str()),
            "license" => Cow::Borrowed(self.license.as_str()),
            "vendor" => Cow::Borrowed(self.vendor.as_str()),
            "url" => Cow::Borrowed(self.url.as_str()),
            "description" => Cow::Borrowed(self.description.as_str()),
            "root" => path_value(self.root()),
            "buildroot" => path_value(self.build_root()),
            "scriptroot" => path_value(self.script_root()),
            "outputroot" => path_value(self.output_root()),
            _ => return None,
        };
        Some(value)
    }
}
