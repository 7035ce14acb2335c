//! unitreg CLI - browse and load units from configured namespaces.
//!
//! Namespaces come from the layered configuration (`~/.unitreg/config.toml`,
//! `.unitreg/config.toml` in the current directory) or from an explicit
//! `--config` file. `--dir` adds an ad-hoc namespace named `default`.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use unitreg_config::Config;

mod commands;
mod config_bridge;
mod theme;

use commands::{check, list, load, namespaces, path};
use config_bridge::{AD_HOC_NAMESPACE, Catalog};

/// unitreg - namespaced unit registry
#[derive(Parser)]
#[command(name = "unitreg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Load configuration from this file instead of the layered defaults
    #[arg(short, long, global = true, env = "UNITREG_CONFIG")]
    config: Option<PathBuf>,

    /// Define an ad-hoc namespace named "default" rooted at this directory
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Unit-file extension for the ad-hoc namespace
    #[arg(long, global = true, requires = "dir")]
    extension: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured namespaces
    Namespaces,

    /// List unit identifiers found on disk
    List {
        /// Namespace name
        #[arg(default_value = AD_HOC_NAMESPACE)]
        namespace: String,
    },

    /// Print the file a unit identifier resolves to
    Path {
        /// Namespace name
        namespace: String,
        /// Unit identifier (may contain '/')
        id: String,
    },

    /// Load a unit and show what it registered
    Load {
        /// Namespace name
        namespace: String,
        /// Unit identifier (may contain '/')
        id: String,
        /// Print the descriptor as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load every unit in a namespace and report failures
    Check {
        /// Namespace name
        #[arg(default_value = AD_HOC_NAMESPACE)]
        namespace: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_file(path)
            .with_context(|| format!("load config file {}", path.display()))?,
        None => {
            let workspace_root = std::env::current_dir().ok();
            Config::load(workspace_root.as_deref())
                .context("load layered configuration")?
                .config
        },
    };

    let mut log_config = config_bridge::to_log_config(&config.logging);
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = unitreg_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let mut catalog = Catalog::from_config(&config);
    if let Some(dir) = cli.dir {
        catalog = catalog.with_ad_hoc(dir, cli.extension.as_deref());
    }

    dispatch(cli.command, &catalog)
}

fn dispatch(command: Commands, catalog: &Catalog) -> Result<()> {
    match command {
        Commands::Namespaces => namespaces::show_namespaces(catalog),
        Commands::List { namespace } => list::list_units(&*catalog.get(&namespace)?)?,
        Commands::Path { namespace, id } => path::show_path(&*catalog.get(&namespace)?, &id)?,
        Commands::Load {
            namespace,
            id,
            json,
        } => load::load_unit(&*catalog.get(&namespace)?, &id, json)?,
        Commands::Check { namespace } => check::run_check(&*catalog.get(&namespace)?)?,
    }
    Ok(())
}
