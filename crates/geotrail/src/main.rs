// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! geotrail - device location history service.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;
mod snapshot;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use geotrail_config::GeotrailConfig;

/// geotrail - reconstructs device movement history and backs up live positions.
#[derive(Parser, Debug)]
#[command(name = "geotrail", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API and run the periodic snapshot task.
    Serve,
    /// Run a single snapshot pass over every device and exit.
    Snapshot,
    /// Load and validate configuration, then exit.
    CheckConfig,
}

fn load_config(path: Option<&std::path::Path>) -> GeotrailConfig {
    let loaded = match path {
        Some(path) => geotrail_config::load_and_validate_path(path),
        None => geotrail_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            geotrail_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Snapshot) => snapshot::run_snapshot(config).await,
        Some(Commands::CheckConfig) => {
            println!(
                "geotrail: configuration OK (database={}, gateway={}:{}, snapshot every {}s)",
                config.storage.database_path,
                config.gateway.host,
                config.gateway.port,
                config.snapshot.interval_secs,
            );
            Ok(())
        }
        None => {
            println!("geotrail: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_flag_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["geotrail", "snapshot", "--config", "/tmp/g.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Snapshot)));
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/g.toml")));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = geotrail_config::load_config_from_str("").expect("defaults should parse");
        assert_eq!(config.gateway.port, 5003);
        assert_eq!(config.history.default_window_days, 7);
    }
}
