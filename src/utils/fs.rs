//! File system utility functions
//!
//! Provides the handful of file operations the build pipeline needs, with
//! permission handling for staged resources and hook scripts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Utility struct for file system operations
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemUtils;

impl FileSystemUtils {
    /// Create a new file system utilities instance
    pub fn new() -> Self {
        Self
    }

    /// Create directories recursively
    #[instrument(skip(self))]
    pub fn create_dir_all<P: AsRef<Path> + std::fmt::Debug>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        debug!("Creating directory: {}", path.display());
        fs::create_dir_all(path)
    }

    /// Write content to a file and set its permission bits.
    ///
    /// The mode is applied after writing so it is not narrowed by the umask.
    #[instrument(skip(self, contents))]
    pub fn write_file_with_mode<P: AsRef<Path> + std::fmt::Debug, C: AsRef<[u8]>>(
        &self,
        path: P,
        contents: C,
        mode: u32,
    ) -> io::Result<()> {
        let path = path.as_ref();
        debug!("Writing file: {} (mode {:o})", path.display(), mode);

        fs::write(path, contents)?;
        set_mode(path, mode)
    }

    /// Names of the regular (non-directory) entries of a directory
    #[instrument(skip(self))]
    pub fn file_names<P: AsRef<Path> + std::fmt::Debug>(&self, dir: P) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Resolve a path to its absolute, symlink-free form
    pub fn canonicalize<P: AsRef<Path>>(&self, path: P) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let fs_utils = FileSystemUtils::new();

        let nested_path = temp_dir.path().join("a").join("b").join("c");

        fs_utils.create_dir_all(&nested_path).unwrap();
        assert!(nested_path.is_dir());

        // idempotent
        fs_utils.create_dir_all(&nested_path).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_write_file_with_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let fs_utils = FileSystemUtils::new();
        let path = temp_dir.path().join("tool");

        fs_utils.write_file_with_mode(&path, b"#!/bin/sh\n", 0o777).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o777);
        assert_eq!(fs::read(&path).unwrap(), b"#!/bin/sh\n");
    }

    #[test]
    fn test_file_names_skips_directories() {
        let temp_dir = TempDir::new().unwrap();
        let fs_utils = FileSystemUtils::new();

        fs::write(temp_dir.path().join("b.rpm"), "").unwrap();
        fs::write(temp_dir.path().join("a.rpm"), "").unwrap();
        fs::create_dir(temp_dir.path().join("c.rpm")).unwrap();

        let names = fs_utils.file_names(temp_dir.path()).unwrap();
        assert_eq!(names, vec!["a.rpm", "b.rpm"]);
    }

    #[test]
    fn test_file_names_missing_directory() {
        let fs_utils = FileSystemUtils::new();
        assert!(fs_utils.file_names("/nonexistent/hammer/output").is_err());
    }
}
