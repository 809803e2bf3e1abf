// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the extensions server download statistics endpoint.
//!
//! The endpoint returns a single JSON document keyed by revision:
//!
//! ```json
//! {
//!   "29738": {
//!     "extensions": {
//!       "SlicerRT": { "win": { "amd64": 12 }, "linux": { "amd64": 3 } }
//!     }
//!   }
//! }
//! ```

use crate::aggregate::DownloadRecord;
use crate::error::{Result, StatsError};
use crate::releases::ReleaseCatalog;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::future::Future;
use tracing::debug;

pub const DEFAULT_DOWNLOADSTATS_URL: &str =
    "https://slicer-packages.kitware.com/api/v1/app/5f4474d0e1d8c75dfc705482/downloadstats";

/// Operating system and architecture pairs whose counts are summed.
const COUNTED_PLATFORMS: [(&str, &str); 3] =
    [("win", "amd64"), ("macosx", "amd64"), ("linux", "amd64")];

/// Per-OS, per-architecture counts for one extension.
///
/// Values are kept as raw JSON so that an odd entry only loses its own count.
pub type PlatformCounts = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

/// Download statistics for every revision known to the server.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct RawDownloadStats {
    pub revisions: BTreeMap<String, RevisionStats>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RevisionStats {
    #[serde(default)]
    pub extensions: Option<BTreeMap<String, PlatformCounts>>,
}

impl RawDownloadStats {
    /// Flatten into bucketed records, summing the counted platforms.
    ///
    /// Revisions without an `extensions` object and extensions with no
    /// counted downloads produce nothing.
    pub fn records<'a>(
        &'a self,
        catalog: &'a ReleaseCatalog,
    ) -> impl Iterator<Item = DownloadRecord> + 'a {
        self.revisions.iter().flat_map(move |(revision, stats)| {
            let release = catalog.bucket_for_revision(revision).to_string();
            stats
                .extensions
                .iter()
                .flatten()
                .filter_map(move |(extension, counts)| {
                    let downloads = platform_total(counts);
                    (downloads > 0).then(|| DownloadRecord {
                        extension: extension.clone(),
                        release: release.clone(),
                        downloads,
                    })
                })
        })
    }
}

fn platform_total(counts: &PlatformCounts) -> u64 {
    COUNTED_PLATFORMS
        .iter()
        .filter_map(|(os, arch)| counts.get(*os)?.get(*arch)?.as_u64())
        .sum()
}

/// A source of live download statistics.
pub trait DownloadStatsSource {
    fn fetch(&self) -> impl Future<Output = Result<RawDownloadStats>>;
}

/// Fetches statistics over HTTP.
#[derive(Clone, Debug)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl DownloadStatsSource for HttpSource {
    async fn fetch(&self) -> Result<RawDownloadStats> {
        debug!(url = %self.url, "fetching download statistics");

        let response = self
            .client
            .get(&self.url)
            .header("User-Agent", "extension-stats")
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| StatsError::Fetch {
                url: self.url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StatsError::ServerStatus {
                url: self.url.clone(),
                status,
                body,
            });
        }

        let stats: RawDownloadStats =
            response
                .json()
                .await
                .map_err(|source| StatsError::InvalidResponse {
                    url: self.url.clone(),
                    source,
                })?;

        debug!(revisions = stats.revisions.len(), "fetched download statistics");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::releases::ReleaseEntry;
    use chrono::NaiveDate;

    fn catalog() -> ReleaseCatalog {
        ReleaseCatalog::new(vec![
            ReleaseEntry::new("4.10.2", 28257, NaiveDate::from_ymd_opt(2019, 5, 17).unwrap()),
            ReleaseEntry::new(
                "4.11.20200930",
                29402,
                NaiveDate::from_ymd_opt(2020, 9, 30).unwrap(),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_records_sum_platforms() {
        let json = r#"{
            "28257": {
                "extensions": {
                    "SlicerRT": {
                        "win": { "amd64": 10 },
                        "macosx": { "amd64": 4 },
                        "linux": { "amd64": 1, "i386": 100 }
                    },
                    "Empty": { "win": { "amd64": 0 } }
                }
            },
            "29000": {
                "extensions": {
                    "SlicerRT": { "linux": { "amd64": 2 }, "macosx": { "amd64": "n/a" } }
                }
            },
            "abc": { "extensions": { "SlicerRT": { "win": { "amd64": 5 } } } },
            "29402": {}
        }"#;
        let stats: RawDownloadStats = serde_json::from_str(json).unwrap();
        let catalog = catalog();
        let records: Vec<_> = stats.records(&catalog).collect();

        assert_eq!(
            records,
            vec![
                DownloadRecord::new("SlicerRT", "4.10.2", 15),
                DownloadRecord::new("SlicerRT", "post-4.10.2", 2),
                DownloadRecord::new("SlicerRT", "unknown", 5),
            ]
        );
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_fetch_downloadstats() {
        let stats = HttpSource::new(DEFAULT_DOWNLOADSTATS_URL)
            .fetch()
            .await
            .unwrap();
        assert!(!stats.revisions.is_empty(), "should have at least one revision");
    }
}
