//! Named shell procedures attached to a package
//!
//! The `build` hook runs inside the build workspace; every other hook is a
//! lifecycle script handed to the packaging backend.

use crate::{
    error::{HammerError, Result},
    utils::process::{ProcessResult, ProcessRunner},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, instrument};

/// Hook that produces the staged files; never passed to the backend
pub const BUILD_HOOK: &str = "build";

/// Lifecycle hooks the packaging backend accepts
pub const LIFECYCLE_HOOKS: [&str; 6] = [
    "before-install",
    "after-install",
    "before-remove",
    "after-remove",
    "before-upgrade",
    "after-upgrade",
];

/// Mapping from hook name to script body, ordered by hook name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptSet(BTreeMap<String, String>);

impl ScriptSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Body of the build hook, if the manifest declares one
    pub fn build_script(&self) -> Option<&str> {
        self.0.get(BUILD_HOOK).map(String::as_str)
    }

    /// Every entry except the build hook, in hook-name order
    pub fn hooks(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(name, _)| name.as_str() != BUILD_HOOK)
            .map(|(name, body)| (name.as_str(), body.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check a hook name against the lifecycle whitelist
    pub fn validate_hook(name: &str) -> Result<()> {
        if LIFECYCLE_HOOKS.contains(&name) {
            Ok(())
        } else {
            Err(HammerError::InvalidScriptName {
                name: name.to_string(),
            })
        }
    }

    /// Run an already-rendered build script with `sh -c` inside `build_root`
    #[instrument(skip(runner, script))]
    pub fn run_build(
        runner: &ProcessRunner,
        script: &str,
        build_root: &Path,
    ) -> Result<ProcessResult> {
        debug!("Running build script in {}", build_root.display());
        runner.run_with_output("sh", &["-c".to_string(), script.to_string()], Some(build_root))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ScriptSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_script_is_not_a_hook() {
        let scripts: ScriptSet = [
            ("build", "make"),
            ("after-install", "systemctl daemon-reload"),
            ("before-remove", "true"),
        ]
        .into_iter()
        .collect();

        assert_eq!(scripts.build_script(), Some("make"));
        let hooks: Vec<_> = scripts.hooks().map(|(name, _)| name).collect();
        assert_eq!(hooks, vec!["after-install", "before-remove"]);
    }

    #[test]
    fn test_validate_hook() {
        for hook in LIFECYCLE_HOOKS {
            assert!(ScriptSet::validate_hook(hook).is_ok());
        }

        let err = ScriptSet::validate_hook("bogus-hook").unwrap_err();
        assert!(matches!(err, HammerError::InvalidScriptName { ref name } if name == "bogus-hook"));
        assert!(ScriptSet::validate_hook(BUILD_HOOK).is_err());
    }

    #[test]
    fn test_deserialize_from_yaml_mapping() {
        let scripts: ScriptSet =
            serde_yaml::from_str("build: echo done\nafter-install: echo hi\n").unwrap();
        assert_eq!(scripts.build_script(), Some("echo done"));
        assert_eq!(scripts.hooks().count(), 1);
    }

    #[test]
    fn test_run_build_in_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(false);

        let result = ScriptSet::run_build(&runner, "echo built > out.txt; echo done", dir.path())
            .unwrap();

        assert_eq!(result.stdout.trim(), "done");
        assert!(dir.path().join("out.txt").exists());
    }

    #[test]
    fn test_run_build_failure_keeps_output() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(false);

        let err = ScriptSet::run_build(&runner, "echo compiling; exit 1", dir.path()).unwrap_err();
        assert_eq!(err.output().map(str::trim), Some("compiling"));
    }
}
