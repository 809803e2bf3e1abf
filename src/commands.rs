// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command implementations.

use crate::aggregate::StatsAggregator;
use crate::config::Config;
use crate::downloadstats::HttpSource;
use crate::install::{self, PlatformDescriptor};
use crate::{query, table};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use tracing::info;

/// Options for the query command.
#[derive(Debug, Default)]
pub struct QueryOptions {
    pub extensions: Option<Vec<String>>,
    pub output_json: Option<Utf8PathBuf>,
    pub output_csv: Option<Utf8PathBuf>,
    pub baseline: Option<Utf8PathBuf>,
    pub daily: bool,
}

fn aggregator(config: &Config, baseline: Option<&Utf8Path>) -> Result<StatsAggregator<HttpSource>> {
    let catalog = config.catalog()?;
    let baseline = baseline.unwrap_or(&config.baseline);
    Ok(StatsAggregator::new(
        catalog,
        baseline,
        HttpSource::new(&config.downloadstats_url),
    ))
}

/// Run the query command.
pub async fn run_query(config: &Config, options: QueryOptions) -> Result<()> {
    let mut aggregator = aggregator(config, options.baseline.as_deref())?;

    let extensions = match options.extensions {
        Some(extensions) => extensions,
        None => aggregator
            .extension_names()
            .await
            .context("failed to list extensions")?,
    };
    info!(count = extensions.len(), "querying download statistics");

    let stats = aggregator
        .get_extension_download_stats(Some(&extensions))
        .await
        .context("failed to get extension download statistics")?;
    let catalog = aggregator.catalog();

    if let Some(output) = &options.output_json {
        query::export_json(&stats, output)?;
    }

    if let Some(output) = &options.output_csv {
        let table = table::to_total_table(catalog, &stats, Some(&extensions));
        query::export_csv(&table, output)?;
    }

    if options.output_json.is_none() && options.output_csv.is_none() {
        let text = if options.daily {
            table::to_daily_table(catalog, &stats, Some(&extensions))
                .context("failed to compute daily downloads")?
                .to_tsv(true)
        } else {
            table::to_total_table(catalog, &stats, Some(&extensions)).to_tsv(true)
        };
        print!("{}", text);
    }

    Ok(())
}

/// Run the list command.
pub async fn run_list(config: &Config, baseline: Option<&Utf8Path>) -> Result<()> {
    let mut aggregator = aggregator(config, baseline)?;
    let stats = aggregator
        .get_extension_download_stats(None)
        .await
        .context("failed to get extension download statistics")?;

    query::print_extensions(&stats);
    Ok(())
}

/// Run the releases command.
pub fn run_releases(config: &Config) -> Result<()> {
    let catalog = config.catalog()?;
    query::print_releases(&catalog, Utc::now().date_naive())
}

/// Run the check-package command.
pub fn run_check_package(archive: &Utf8Path, platform: &PlatformDescriptor) -> Result<()> {
    if !install::file_exists_case_sensitive(archive)? {
        anyhow::bail!("package file does not exist: {}", archive);
    }
    install::check_platform(archive, platform)
        .with_context(|| format!("package {} cannot be installed", archive))?;

    println!(
        "{} matches revision {} on {}-{}.",
        archive, platform.revision, platform.os, platform.arch
    );
    Ok(())
}
