// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for download statistics queries.

use crate::downloadstats::DEFAULT_DOWNLOADSTATS_URL;
use crate::releases::{ReleaseCatalog, ReleaseEntry};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;

pub const DEFAULT_BASELINE: &str = "resources/ExtensionsDownloadStats-20211027.csv";

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Endpoint returning download statistics keyed by revision.
    #[serde(default = "default_downloadstats_url")]
    pub downloadstats_url: String,

    /// CSV file with statistics collected before the current server.
    #[serde(default = "default_baseline")]
    pub baseline: Utf8PathBuf,

    /// Stable releases. Preview builds are reported as `post-<release>`.
    #[serde(default, rename = "release")]
    pub releases: Vec<ReleaseEntry>,
}

fn default_downloadstats_url() -> String {
    DEFAULT_DOWNLOADSTATS_URL.to_string()
}

fn default_baseline() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_BASELINE)
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let content = fs::read_to_string(path.as_std_path())
            .with_context(|| format!("failed to read config file at {}", path))?;

        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file at {}", path))
    }

    /// Load the given file, or fall back to the built-in configuration.
    pub fn load_or_default(path: Option<&Utf8Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Build the release catalog from the configured releases.
    pub fn catalog(&self) -> Result<ReleaseCatalog> {
        ReleaseCatalog::new(self.releases.clone()).context("invalid release table")
    }
}

impl Default for Config {
    fn default() -> Self {
        // Stable release revisions with their approximate publication dates.
        let releases = [
            ("4.0.0", 18777, (2011, 11, 24)),
            ("4.0.1", 19033, (2012, 1, 13)),
            ("4.1.0", 19886, (2012, 4, 27)),
            ("4.1.1", 20313, (2012, 6, 28)),
            ("4.2.0", 21298, (2012, 11, 1)),
            ("4.2.1", 21438, (2012, 11, 19)),
            ("4.2.2", 21508, (2012, 12, 7)),
            ("4.2.2-1", 21513, (2012, 12, 10)),
            ("4.3.0", 22408, (2013, 9, 5)),
            ("4.3.1", 22599, (2013, 10, 1)),
            ("4.3.1-1", 22704, (2013, 11, 6)),
            ("4.4.0", 23774, (2014, 11, 3)),
            ("4.5.0-1", 24735, (2015, 11, 12)),
            ("4.6.0", 25441, (2016, 10, 14)),
            ("4.6.2", 25516, (2016, 11, 8)),
            ("4.8.0", 26489, (2017, 10, 18)),
            ("4.8.1", 26813, (2017, 12, 19)),
            ("4.10.0", 27510, (2018, 10, 17)),
            ("4.10.1", 27931, (2019, 1, 25)),
            ("4.10.2", 28257, (2019, 5, 17)),
            ("4.11.20200930", 29402, (2020, 9, 30)),
            ("4.11.20210226", 29738, (2021, 2, 26)),
        ];

        Self {
            downloadstats_url: default_downloadstats_url(),
            baseline: default_baseline(),
            releases: releases
                .into_iter()
                .filter_map(|(label, revision, (y, m, d))| {
                    let date = NaiveDate::from_ymd_opt(y, m, d)?;
                    Some(ReleaseEntry::new(label, revision, date))
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(config.releases, parsed.releases);
        assert_eq!(config.downloadstats_url, parsed.downloadstats_url);
    }

    #[test]
    fn test_default_catalog() {
        let config = Config::default();
        assert_eq!(config.releases.len(), 22);

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.bucket_for_revision("21298").to_string(), "4.2.0");
        assert_eq!(catalog.bucket_for_revision("21300").to_string(), "post-4.2.0");
        assert_eq!(catalog.bucket_for_revision("18000").to_string(), "legacy");
        assert_eq!(catalog.bucket_for_revision("30000").to_string(), "post-4.11.20210226");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
downloadstats-url = "http://localhost:8080/downloadstats"
baseline = "stats.csv"

[[release]]
label = "B"
revision = 200
date = "2020-03-01"

[[release]]
label = "A"
revision = 100
date = "2020-01-01"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.downloadstats_url, "http://localhost:8080/downloadstats");
        assert_eq!(config.baseline, "stats.csv");

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.entries()[0].label, "A");
        assert_eq!(catalog.release_duration_days("A").unwrap(), 60);
    }

    #[test]
    fn test_parse_config_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.downloadstats_url, DEFAULT_DOWNLOADSTATS_URL);
        assert_eq!(config.baseline, DEFAULT_BASELINE);
        assert!(config.releases.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("config.toml");
        assert!(Config::load(&path).is_err());
        assert!(Config::load_or_default(None).is_ok());
    }
}
