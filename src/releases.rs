// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Release catalog and revision bucketing.
//!
//! Every download is reported against a build revision. Revisions are mapped
//! to release buckets: a stable release's own revision maps to that release,
//! nightly builds between release A and release B map to `post-A`, builds
//! older than the first cataloged release map to `legacy`, and revisions that
//! are not integers map to `unknown`.

use crate::error::{Result, StatsError};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const UNKNOWN_RELEASE: &str = "unknown";
pub const LEGACY_RELEASE: &str = "legacy";
pub const POST_RELEASE_PREFIX: &str = "post-";

/// A stable release: its label, the revision it was built from and when it
/// was published.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ReleaseEntry {
    pub label: String,
    pub revision: i64,
    pub date: NaiveDate,
}

impl ReleaseEntry {
    pub fn new(label: impl Into<String>, revision: i64, date: NaiveDate) -> Self {
        Self {
            label: label.into(),
            revision,
            date,
        }
    }
}

/// The release bucket a revision falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseBucket<'a> {
    Unknown,
    Legacy,
    Release(&'a ReleaseEntry),
    PostRelease(&'a ReleaseEntry),
}

impl fmt::Display for ReleaseBucket<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseBucket::Unknown => f.write_str(UNKNOWN_RELEASE),
            ReleaseBucket::Legacy => f.write_str(LEGACY_RELEASE),
            ReleaseBucket::Release(entry) => f.write_str(&entry.label),
            ReleaseBucket::PostRelease(entry) => {
                write!(f, "{}{}", POST_RELEASE_PREFIX, entry.label)
            }
        }
    }
}

/// Stable releases ordered by revision.
#[derive(Clone, Debug)]
pub struct ReleaseCatalog {
    entries: Vec<ReleaseEntry>,
}

impl ReleaseCatalog {
    /// Build a catalog, sorting entries by revision.
    ///
    /// The sort is stable: releases sharing a revision keep the order they
    /// were given in.
    pub fn new(mut entries: Vec<ReleaseEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.label.as_str()) {
                return Err(StatsError::DuplicateRelease {
                    label: entry.label.clone(),
                });
            }
        }

        entries.sort_by_key(|entry| entry.revision);
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ReleaseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map a revision string to its release bucket.
    pub fn bucket_for_revision(&self, revision: &str) -> ReleaseBucket<'_> {
        let Ok(revision) = revision.trim().parse::<i64>() else {
            return ReleaseBucket::Unknown;
        };

        // First entry whose revision is not below the input. An exact match
        // wins over post-release bucketing.
        let idx = self.entries.partition_point(|entry| entry.revision < revision);
        if let Some(entry) = self.entries.get(idx) {
            if entry.revision == revision {
                return ReleaseBucket::Release(entry);
            }
        }

        match idx.checked_sub(1) {
            Some(prev) => ReleaseBucket::PostRelease(&self.entries[prev]),
            None => ReleaseBucket::Legacy,
        }
    }

    /// All bucket labels in presentation order.
    pub fn all_bucket_labels(&self) -> Vec<String> {
        let mut labels = Vec::with_capacity(2 + 2 * self.entries.len());
        labels.push(UNKNOWN_RELEASE.to_string());
        labels.push(LEGACY_RELEASE.to_string());
        for entry in &self.entries {
            labels.push(entry.label.clone());
            labels.push(format!("{}{}", POST_RELEASE_PREFIX, entry.label));
        }
        labels
    }

    /// Release date for a label, ignoring a `post-` prefix.
    pub fn release_date(&self, label: &str) -> Option<NaiveDate> {
        self.position(label).map(|idx| self.entries[idx].date)
    }

    /// Number of days a release was current, measured until today for the
    /// latest release.
    pub fn release_duration_days(&self, label: &str) -> Result<i64> {
        self.release_duration_days_at(label, Utc::now().date_naive())
    }

    /// Number of days a release was current, with `today` closing the window
    /// of the latest release.
    pub fn release_duration_days_at(&self, label: &str, today: NaiveDate) -> Result<i64> {
        let idx = self
            .position(label)
            .ok_or_else(|| StatsError::ReleaseNotFound {
                label: label.to_string(),
            })?;

        let start = self.entries[idx].date;
        let end = self
            .entries
            .get(idx + 1)
            .map(|next| next.date)
            .unwrap_or(today);

        Ok((end - start).num_days())
    }

    fn position(&self, label: &str) -> Option<usize> {
        let label = strip_post_prefix(label);
        self.entries.iter().position(|entry| entry.label == label)
    }
}

/// Strip a single leading `post-` from a bucket label.
pub fn strip_post_prefix(label: &str) -> &str {
    label.strip_prefix(POST_RELEASE_PREFIX).unwrap_or(label)
}
