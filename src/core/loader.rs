//! Manifest discovery
//!
//! Walks a search root for `spec.yml` files and turns each into a `Package`.

use crate::{
    core::package::Package,
    error::{HammerError, Result},
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

/// File names recognised as package manifests
pub const MANIFEST_NAMES: [&str; 2] = ["spec.yml", "spec.yaml"];

/// Finds and parses package manifests under a search root
#[derive(Debug, Clone)]
pub struct Loader {
    search_root: PathBuf,
}

impl Loader {
    pub fn new(search_root: impl Into<PathBuf>) -> Self {
        Self {
            search_root: search_root.into(),
        }
    }

    /// Load every manifest below the search root, sorted by package name
    #[instrument(skip(self), fields(search = %self.search_root.display()))]
    pub fn load(&self) -> Result<Vec<Package>> {
        if !self.search_root.is_dir() {
            return Err(HammerError::validation(format!(
                "search path is not a directory: {}",
                self.search_root.display()
            )));
        }

        let mut packages = Vec::new();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for entry in WalkDir::new(&self.search_root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map_or_else(|| self.search_root.clone(), Path::to_path_buf);
                HammerError::manifest("could not walk search path", path).with_source(e)
            })?;

            let is_manifest = entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| MANIFEST_NAMES.contains(&name));
            if !is_manifest {
                continue;
            }

            let package = Self::load_manifest(entry.path())?;
            if let Some(first) = seen.insert(package.name.clone(), entry.path().to_path_buf()) {
                return Err(HammerError::manifest(
                    format!(
                        "duplicate package name {} (also defined in {})",
                        package.name,
                        first.display()
                    ),
                    entry.path(),
                ));
            }
            packages.push(package);
        }

        packages.sort_by(|a, b| a.name.cmp(&b.name));
        info!("Loaded {} package(s)", packages.len());
        Ok(packages)
    }

    /// Parse a single manifest file; its directory becomes the package root
    pub fn load_manifest(path: &Path) -> Result<Package> {
        debug!("Parsing manifest: {}", path.display());

        let content = fs::read_to_string(path)
            .map_err(|e| HammerError::file_system("read", path, e))?;

        let mut package = Package::from_yaml(&content)
            .map_err(|e| HammerError::manifest("malformed manifest", path).with_source(e))?;

        if package.name.trim().is_empty() {
            return Err(HammerError::manifest("package name is empty", path));
        }

        if let Some(dir) = path.parent() {
            package.set_root(dir);
        }

        debug!(package = %package.name, "loaded manifest");
        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_manifest(root: &Path, dir: &str, file: &str, content: &str) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_load_nested_manifests() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), "zeta", "spec.yml", "name: zeta\n");
        write_manifest(temp.path(), "deep/alpha", "spec.yaml", "name: alpha\nextra: ignored\n");
        write_manifest(temp.path(), "other", "notes.yml", "name: nope\n");

        let packages = Loader::new(temp.path()).load().unwrap();

        let names: Vec<_> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(packages[0].root(), Some(temp.path().join("deep/alpha").as_path()));
    }

    #[test]
    fn test_malformed_manifest_is_an_error() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), "bad", "spec.yml", "name: [unterminated\n");

        let err = Loader::new(temp.path()).load().unwrap_err();
        assert!(matches!(err, HammerError::Manifest { ref message, .. } if message == "malformed manifest"));
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), "a", "spec.yml", "version: \"1.0\"\n");
        assert!(Loader::new(temp.path()).load().is_err());

        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), "a", "spec.yml", "name: \"\"\n");
        assert!(Loader::new(temp.path()).load().is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), "a", "spec.yml", "name: foo\n");
        write_manifest(temp.path(), "b", "spec.yml", "name: foo\n");

        let err = Loader::new(temp.path()).load().unwrap_err();
        assert!(err.to_string().contains("duplicate package name foo"));
    }

    #[test]
    fn test_hook_names_not_validated_at_load() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), "a", "spec.yml", "name: foo\nscripts:\n  bogus-hook: x\n");
        assert_eq!(Loader::new(temp.path()).load().unwrap().len(), 1);
    }

    #[test]
    fn test_search_root_must_exist() {
        let err = Loader::new("/nonexistent/hammer/search").load().unwrap_err();
        assert!(matches!(err, HammerError::Validation { .. }));
    }
}
