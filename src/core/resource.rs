//! Build inputs fetched into the workspace before the build script runs
//!
//! A resource is either a remote file (`url`) or a file next to the manifest
//! (`path`). Both locations are templates rendered against the package, so a
//! manifest can point at `.../foo-{{.Version}}.tar.gz`. Without an explicit
//! `name`, the workspace file takes the last segment of the rendered location.

use crate::{
    core::package::Package,
    error::{HammerError, Result},
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Acquisition strategy for a single build input
pub trait Fetch {
    /// Destination file name inside the build workspace
    fn name(&self, package: &Package) -> Result<String>;

    /// Fetch the raw bytes, rendering locations against `package`
    fn download(&self, package: &Package) -> Result<Vec<u8>>;
}

/// File fetched over HTTP(S)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UrlResource {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
}

/// File copied from disk, relative paths resolved against the manifest directory
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocalResource {
    pub path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
}

/// A resource as written in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Resource {
    Url(UrlResource),
    Local(LocalResource),
}

impl Resource {
    fn expected_sha256(&self) -> Option<&str> {
        match self {
            Self::Url(r) => r.sha256.as_deref(),
            Self::Local(r) => r.sha256.as_deref(),
        }
    }
}

impl Fetch for Resource {
    fn name(&self, package: &Package) -> Result<String> {
        match self {
            Self::Url(r) => r.name(package),
            Self::Local(r) => r.name(package),
        }
    }

    fn download(&self, package: &Package) -> Result<Vec<u8>> {
        let body = match self {
            Self::Url(r) => r.download(package)?,
            Self::Local(r) => r.download(package)?,
        };

        if let Some(expected) = self.expected_sha256() {
            verify_sha256(&self.name(package)?, expected, &body)?;
        }

        Ok(body)
    }
}

impl Fetch for UrlResource {
    fn name(&self, package: &Package) -> Result<String> {
        if let Some(name) = &self.name {
            return package.render("resources.name", name);
        }
        let url = package.render("resources.url", &self.url)?;
        let path = url.split(['?', '#']).next().unwrap_or_default();
        Ok(last_segment(path).to_string())
    }

    fn download(&self, package: &Package) -> Result<Vec<u8>> {
        let name = self.name(package)?;
        let url = package.render("resources.url", &self.url)?;
        info!(resource = %name, url = %url, "fetching");

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("hammer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HammerError::resource(&name, "could not create HTTP client").with_source(e))?;

        let response = client
            .get(&url)
            .send()
            .map_err(|e| HammerError::resource(&name, format!("could not fetch {url}")).with_source(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HammerError::resource(
                &name,
                format!("fetching {url} returned HTTP {status}"),
            ));
        }

        let bytes = response
            .bytes()
            .map_err(|e| HammerError::resource(&name, format!("could not read body of {url}")).with_source(e))?;

        debug!(resource = %name, bytes = bytes.len(), "fetched");
        Ok(bytes.to_vec())
    }
}

impl Fetch for LocalResource {
    fn name(&self, package: &Package) -> Result<String> {
        if let Some(name) = &self.name {
            return package.render("resources.name", name);
        }
        let path = package.render("resources.path", &self.path)?;
        Ok(last_segment(&path).to_string())
    }

    fn download(&self, package: &Package) -> Result<Vec<u8>> {
        let name = self.name(package)?;
        let rendered = PathBuf::from(package.render("resources.path", &self.path)?);
        let path = match package.root() {
            Some(root) if rendered.is_relative() => root.join(&rendered),
            _ => rendered,
        };
        info!(resource = %name, path = %path.display(), "copying");

        fs::read(&path).map_err(|e| {
            HammerError::resource(&name, format!("could not read {}", path.display())).with_source(e)
        })
    }
}

fn last_segment(location: &str) -> &str {
    location.rsplit(['/', '\\']).next().unwrap_or_default()
}

fn verify_sha256(name: &str, expected: &str, body: &[u8]) -> Result<()> {
    let mut hasher = Sha256::new();
    hasher.update(body);
    let actual = hex::encode(hasher.finalize());

    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(HammerError::resource(
            name,
            format!("sha256 mismatch: expected {expected}, got {actual}"),
        ));
    }
    debug!(resource = %name, "hash verified");
    Ok(())
}
