// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing and command dispatch.

use crate::commands::{self, QueryOptions};
use crate::config::Config;
use crate::install::PlatformDescriptor;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Extension download statistics query tool", long_about = None)]
pub struct Args {
    /// Path to the configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Query download statistics per extension and release
    Query {
        /// Extension(s) to query, separated by commas (default: all extensions)
        #[arg(short, long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,

        /// Write the results as JSON to this file
        #[arg(short = 'j', long)]
        output_json: Option<Utf8PathBuf>,

        /// Write the results as CSV to this file
        #[arg(short = 's', long)]
        output_csv: Option<Utf8PathBuf>,

        /// Baseline statistics CSV (overrides the configuration)
        #[arg(short, long)]
        baseline: Option<Utf8PathBuf>,

        /// Print average daily downloads per release instead of totals
        #[arg(long)]
        daily: bool,
    },

    /// List all extensions with their total downloads
    List {
        /// Baseline statistics CSV (overrides the configuration)
        #[arg(short, long)]
        baseline: Option<Utf8PathBuf>,
    },

    /// Show the release catalog
    Releases,

    /// Check that a package archive exists and matches a platform
    CheckPackage {
        /// Package archive named <revision>-<os>-<arch>-<name>
        archive: Utf8PathBuf,

        /// Revision of the target application
        #[arg(long)]
        revision: String,

        /// Operating system of the target application (win, macosx, linux)
        #[arg(long)]
        os: String,

        /// Architecture of the target application
        #[arg(long, default_value = "amd64")]
        arch: String,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Dispatch parsed arguments to the appropriate command.
pub async fn dispatch(args: Args) -> Result<()> {
    let config =
        Config::load_or_default(args.config.as_deref()).context("failed to load configuration")?;

    match args.command {
        Command::Query {
            extensions,
            output_json,
            output_csv,
            baseline,
            daily,
        } => {
            let extensions = extensions.map(|names| {
                names
                    .into_iter()
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect()
            });
            let options = QueryOptions {
                extensions,
                output_json,
                output_csv,
                baseline,
                daily,
            };
            commands::run_query(&config, options).await?;
        }
        Command::List { baseline } => {
            commands::run_list(&config, baseline.as_deref()).await?;
        }
        Command::Releases => {
            commands::run_releases(&config)?;
        }
        Command::CheckPackage {
            archive,
            revision,
            os,
            arch,
        } => {
            let platform = PlatformDescriptor { revision, os, arch };
            commands::run_check_package(&archive, &platform)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_query() {
        let args = Args::try_parse_from([
            "extension-stats",
            "query",
            "--extensions",
            "SlicerRT,SlicerIGT",
            "--output-csv",
            "stats.csv",
        ])
        .unwrap();

        match args.command {
            Command::Query {
                extensions,
                output_csv,
                output_json,
                ..
            } => {
                assert_eq!(extensions.unwrap(), ["SlicerRT", "SlicerIGT"]);
                assert_eq!(output_csv.unwrap(), "stats.csv");
                assert!(output_json.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
