//! Core functionality for package building
//!
//! Manifest model, resource acquisition, templating, the per-package build
//! pipeline and the packager that drives it.

pub mod backend;
pub mod loader;
pub mod package;
pub mod packager;
pub mod resource;
pub mod scripts;
pub mod template;

pub use backend::Backend;
pub use loader::Loader;
pub use package::{BuildOutcome, BuildReport, Package, Target};
pub use packager::Packager;
pub use resource::{Fetch, LocalResource, Resource, UrlResource};
pub use scripts::ScriptSet;
