//! Command implementations for the CLI

use crate::{
    cli::Command,
    config::Config,
    core::{Loader, Package, Packager},
};
use anyhow::{Context, bail};
use tracing::{info, instrument, warn};

/// Execute the appropriate command based on CLI arguments.
///
/// Returns `false` when the command ran but some work failed; failures have
/// already been reported.
#[instrument(skip(config))]
pub fn execute_command(config: &Config, command: &Command) -> anyhow::Result<bool> {
    match command {
        Command::Build { packages } => execute_build_command(config, packages),
    }
}

/// Execute the build command
#[instrument(skip(config))]
fn execute_build_command(config: &Config, names: &[String]) -> anyhow::Result<bool> {
    let loaded = Loader::new(&config.search)
        .load()
        .context("could not load packages")?;

    let packages = select_packages(loaded, names);
    if packages.is_empty() {
        bail!("no packages selected");
    }
    info!(
        "Selected {} package(s): {:?}",
        packages.len(),
        packages.iter().map(|p| p.name.as_str()).collect::<Vec<_>>()
    );

    let backend = config.backend().context("invalid packaging backend")?;
    let mut packager = Packager::new(packages, backend);
    packager
        .ensure_output_dir(&config.output)
        .context("could not create output directory")?;

    Ok(packager.build())
}

/// Keep the requested packages in the order given; no names selects all.
///
/// Names that match no loaded package are skipped with a warning.
fn select_packages(loaded: Vec<Package>, names: &[String]) -> Vec<Package> {
    if names.is_empty() {
        return loaded;
    }

    let mut pool: Vec<Option<Package>> = loaded.into_iter().map(Some).collect();
    let mut selected = Vec::with_capacity(names.len());

    for name in names {
        let slot = pool
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|p| &p.name == name));
        match slot.and_then(Option::take) {
            Some(package) => selected.push(package),
            // already selected earlier in the list
            None if selected.iter().any(|p: &Package| &p.name == name) => {}
            None => warn!(package = %name, "no package named {name}, skipping"),
        }
    }

    selected
}
