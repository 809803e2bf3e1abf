// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregation of download statistics by extension and release.

use crate::baseline;
use crate::downloadstats::{DownloadStatsSource, RawDownloadStats};
use crate::error::Result;
use crate::releases::ReleaseCatalog;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// A download count for one extension in one release bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRecord {
    pub extension: String,
    pub release: String,
    pub downloads: u64,
}

impl DownloadRecord {
    pub fn new(extension: impl Into<String>, release: impl Into<String>, downloads: u64) -> Self {
        Self {
            extension: extension.into(),
            release: release.into(),
            downloads,
        }
    }
}

/// Download counts indexed by extension name, then by release bucket label.
///
/// Zero counts are never stored: an absent entry means no downloads were
/// recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DownloadStats {
    extensions: BTreeMap<String, BTreeMap<String, u64>>,
}

impl DownloadStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a count to an (extension, release) pair.
    pub fn add(&mut self, extension: &str, release: &str, downloads: u64) {
        if downloads == 0 {
            return;
        }
        *self
            .extensions
            .entry(extension.to_string())
            .or_default()
            .entry(release.to_string())
            .or_insert(0) += downloads;
    }

    /// Merge records additively, keeping only extensions accepted by `filter`.
    pub fn merge(
        &mut self,
        records: impl IntoIterator<Item = DownloadRecord>,
        filter: Option<&HashSet<&str>>,
    ) {
        for record in records {
            if let Some(filter) = filter {
                if !filter.contains(record.extension.as_str()) {
                    continue;
                }
            }
            self.add(&record.extension, &record.release, record.downloads);
        }
    }

    /// Count for an (extension, release) pair, zero when absent.
    pub fn get(&self, extension: &str, release: &str) -> u64 {
        self.extensions
            .get(extension)
            .and_then(|releases| releases.get(release))
            .copied()
            .unwrap_or(0)
    }

    pub fn releases(&self, extension: &str) -> Option<&BTreeMap<String, u64>> {
        self.extensions.get(extension)
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.contains_key(extension)
    }

    /// Extension names in sorted order.
    pub fn extension_names(&self) -> Vec<String> {
        self.extensions.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, u64>)> {
        self.extensions.iter()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// Combines baseline and live statistics into per-release counts.
///
/// The live document is fetched on first use and cached for the lifetime of
/// the aggregator; call [`StatsAggregator::refresh`] to fetch again.
pub struct StatsAggregator<S> {
    catalog: ReleaseCatalog,
    baseline: Utf8PathBuf,
    source: S,
    cached: Option<RawDownloadStats>,
}

impl<S: DownloadStatsSource> StatsAggregator<S> {
    pub fn new(catalog: ReleaseCatalog, baseline: impl Into<Utf8PathBuf>, source: S) -> Self {
        Self {
            catalog,
            baseline: baseline.into(),
            source,
            cached: None,
        }
    }

    pub fn catalog(&self) -> &ReleaseCatalog {
        &self.catalog
    }

    pub fn baseline_path(&self) -> &Utf8Path {
        &self.baseline
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    /// Forget the cached live statistics.
    pub fn refresh(&mut self) {
        self.cached = None;
    }

    /// Download counts per extension and release bucket.
    ///
    /// With a non-empty `filter`, only the named extensions are merged.
    pub async fn get_extension_download_stats(
        &mut self,
        filter: Option<&[String]>,
    ) -> Result<DownloadStats> {
        let filter: Option<HashSet<&str>> = filter
            .filter(|names| !names.is_empty())
            .map(|names| names.iter().map(String::as_str).collect());

        let baseline = baseline::read_baseline(&self.baseline)?;
        self.ensure_fetched().await?;

        let mut stats = DownloadStats::new();
        stats.merge(baseline, filter.as_ref());
        if let Some(live) = &self.cached {
            stats.merge(live.records(&self.catalog), filter.as_ref());
        }

        info!(extensions = stats.len(), "aggregated download statistics");
        Ok(stats)
    }

    /// Names of every extension with recorded downloads, sorted.
    pub async fn extension_names(&mut self) -> Result<Vec<String>> {
        Ok(self
            .get_extension_download_stats(None)
            .await?
            .extension_names())
    }

    async fn ensure_fetched(&mut self) -> Result<()> {
        if self.cached.is_none() {
            let stats = self.source.fetch().await?;
            self.cached = Some(stats);
        } else {
            debug!("using cached download statistics");
        }
        Ok(())
    }
}
