//! Command-line argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hammer - build packages from YAML manifests
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "hammer")]
pub struct Args {
    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Directory searched recursively for spec.yml manifests
    #[arg(long, global = true, env = "HAMMER_SEARCH", default_value = ".")]
    pub search: PathBuf,

    /// Directory packages are written to
    #[arg(long, global = true, env = "HAMMER_OUTPUT", default_value = "out")]
    pub output: PathBuf,

    /// Package format produced by the backend
    #[arg(short = 't', long = "type", global = true, env = "HAMMER_TYPE", default_value = "rpm")]
    pub output_type: String,

    /// Packaging backend command
    #[arg(long, global = true, env = "HAMMER_BACKEND", default_value = "fpm")]
    pub backend: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build packages (all packages unless specific ones are named)
    Build {
        /// Names of the packages to build
        packages: Vec<String>,
    },
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_args() {
        let args = Args::try_parse_from(["hammer", "build"]).unwrap();
        assert!(!args.debug);
        assert!(matches!(args.command, Command::Build { ref packages } if packages.is_empty()));
    }

    #[test]
    fn test_parse_debug_flag() {
        let args = Args::try_parse_from(["hammer", "build", "--debug"]).unwrap();
        assert!(args.debug);
    }

    #[test]
    fn test_parse_build_with_packages() {
        let args =
            Args::try_parse_from(["hammer", "build", "foo", "bar", "--output", "dist", "-t", "deb"])
                .unwrap();
        match args.command {
            Command::Build { packages } => assert_eq!(packages, vec!["foo", "bar"]),
        }
        assert_eq!(args.output, PathBuf::from("dist"));
        assert_eq!(args.output_type, "deb");
    }
}
