// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! passdb - a local credential vault.
//!
//! This is the binary entry point.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use passdb_config::PassdbConfig;

/// passdb - password manager that optimises for easily distributing your passwords.
#[derive(Parser, Debug)]
#[command(name = "passdb", version, about, long_about = None)]
struct Cli {
    /// Credentials directory (overrides vault.dir).
    #[arg(short = 'd', long, global = true)]
    dir: Option<PathBuf>,

    /// Verbose mode (debug logging).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read configuration from this file instead of the default locations.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum Commands {
    /// Print every credential whose name contains QUERY.
    Find { query: String },
    /// Print the credentials stored under NAME.
    Get { name: String },
    /// Append a credential to NAME.
    Add { name: String },
    /// Replace the credentials stored under NAME.
    Set { name: String },
    /// Generate a password and append it to NAME.
    Generate { name: String },
    /// Import rows from a headerless CSV file (secret, meta, type, url, user).
    Import { file: PathBuf },
    /// Print every credential in the vault.
    Export {
        #[arg(value_parser = ["all"])]
        scope: Option<String>,
    },
    /// Print the record with the given storage identifier.
    Load { identifier: String },
    /// Report index entries without records and records without index entries.
    Verify,
}

fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => passdb_config::load_and_validate_path(path),
        None => passdb_config::load_and_validate(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            passdb_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    apply_overrides(&mut config, &cli);

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    init_tracing(level);

    if let Err(e) = commands::run(cli.command, &config) {
        eprintln!("passdb: {e}");
        std::process::exit(1);
    }
}

/// Command-line flags win over every configuration layer.
fn apply_overrides(config: &mut PassdbConfig, cli: &Cli) {
    if let Some(dir) = &cli.dir {
        config.vault.dir = dir.to_string_lossy().into_owned();
    }
}

/// Logs go to stderr; stdout carries command output.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "passdb={log_level},passdb_vault={log_level},passdb_config={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["passdb", "get", "github", "-d", "/tmp/v", "-v"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Get {
                name: "github".into()
            }
        );
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp/v")));
        assert!(cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parses_every_subcommand() {
        let cases: [(&[&str], Commands); 9] = [
            (&["find", "git"][..], Commands::Find { query: "git".into() }),
            (&["get", "aws"][..], Commands::Get { name: "aws".into() }),
            (&["add", "aws"][..], Commands::Add { name: "aws".into() }),
            (&["set", "aws"][..], Commands::Set { name: "aws".into() }),
            (&["generate", "aws"][..], Commands::Generate { name: "aws".into() }),
            (
                &["import", "dump.csv"][..],
                Commands::Import {
                    file: "dump.csv".into(),
                },
            ),
            (&["export"][..], Commands::Export { scope: None }),
            (
                &["load", "abc"][..],
                Commands::Load {
                    identifier: "abc".into(),
                },
            ),
            (&["verify"][..], Commands::Verify),
        ];
        for (args, expected) in cases {
            let cli = Cli::try_parse_from(std::iter::once("passdb").chain(args.iter().copied()))
                .unwrap();
            assert_eq!(cli.command, expected, "args {args:?}");
        }
    }

    #[test]
    fn export_accepts_only_all() {
        let cli = Cli::try_parse_from(["passdb", "export", "all"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Export {
                scope: Some("all".into())
            }
        );
        assert!(Cli::try_parse_from(["passdb", "export", "some"]).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["passdb"]).is_err());
        assert!(Cli::try_parse_from(["passdb", "get"]).is_err());
    }

    #[test]
    fn dir_flag_overrides_config() {
        let cli =
            Cli::try_parse_from(["passdb", "--dir", "/srv/creds", "--config", "x.toml", "verify"])
                .unwrap();
        let mut config = PassdbConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.vault.dir, "/srv/creds");
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
