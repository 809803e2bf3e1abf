// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tabular views of aggregated download statistics.

use crate::aggregate::DownloadStats;
use crate::error::Result;
use crate::releases::{POST_RELEASE_PREFIX, ReleaseCatalog};
use chrono::{NaiveDate, Utc};
use std::fmt::Display;

/// Header of the first column in rendered tables.
pub const EXTENSION_COLUMN: &str = "Extension";

/// A release bucket column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub label: String,
    /// Set for plain releases only; `post-` buckets are not decorated.
    pub release_date: Option<NaiveDate>,
}

impl Column {
    /// Column heading, with the release date appended when known.
    pub fn heading(&self) -> String {
        match self.release_date {
            Some(date) => format!("{} ({})", self.label, date.format("%Y-%m-%d")),
            None => self.label.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Row<T> {
    pub extension: String,
    pub values: Vec<T>,
}

/// One row per extension, one column per release bucket.
#[derive(Clone, Debug, PartialEq)]
pub struct Table<T> {
    pub columns: Vec<Column>,
    pub rows: Vec<Row<T>>,
}

impl<T: Display> Table<T> {
    /// Render as tab-separated text with a header line.
    pub fn to_tsv(&self, decorated_headers: bool) -> String {
        let mut out = String::from(EXTENSION_COLUMN);
        for column in &self.columns {
            out.push('\t');
            if decorated_headers {
                out.push_str(&column.heading());
            } else {
                out.push_str(&column.label);
            }
        }

        for row in &self.rows {
            out.push('\n');
            out.push_str(&row.extension);
            for value in &row.values {
                out.push('\t');
                out.push_str(&value.to_string());
            }
        }
        out.push('\n');
        out
    }
}

/// Total downloads for every release bucket.
pub fn to_total_table(
    catalog: &ReleaseCatalog,
    stats: &DownloadStats,
    extension_names: Option<&[String]>,
) -> Table<u64> {
    let columns: Vec<Column> = catalog
        .all_bucket_labels()
        .into_iter()
        .map(|label| {
            let release_date = if label.starts_with(POST_RELEASE_PREFIX) {
                None
            } else {
                catalog.release_date(&label)
            };
            Column {
                label,
                release_date,
            }
        })
        .collect();

    let rows = row_names(stats, extension_names)
        .into_iter()
        .map(|extension| {
            let values = columns
                .iter()
                .map(|column| stats.get(&extension, &column.label))
                .collect();
            Row { extension, values }
        })
        .collect();

    Table { columns, rows }
}

/// Average daily downloads for every release, counting the release and its
/// post-release nightlies together.
pub fn to_daily_table(
    catalog: &ReleaseCatalog,
    stats: &DownloadStats,
    extension_names: Option<&[String]>,
) -> Result<Table<f64>> {
    to_daily_table_at(catalog, stats, extension_names, Utc::now().date_naive())
}

/// Like [`to_daily_table`], with `today` closing the latest release window.
pub fn to_daily_table_at(
    catalog: &ReleaseCatalog,
    stats: &DownloadStats,
    extension_names: Option<&[String]>,
    today: NaiveDate,
) -> Result<Table<f64>> {
    let mut columns = Vec::with_capacity(catalog.len());
    let mut durations = Vec::with_capacity(catalog.len());
    for entry in catalog.entries() {
        // A release superseded on the day it shipped still counts as one day.
        let days = catalog.release_duration_days_at(&entry.label, today)?.max(1);
        durations.push(days as f64);
        columns.push(Column {
            label: entry.label.clone(),
            release_date: Some(entry.date),
        });
    }

    let rows = row_names(stats, extension_names)
        .into_iter()
        .map(|extension| {
            let values = columns
                .iter()
                .zip(&durations)
                .map(|(column, days)| {
                    let post = format!("{}{}", POST_RELEASE_PREFIX, column.label);
                    let total =
                        stats.get(&extension, &column.label) + stats.get(&extension, &post);
                    total as f64 / days
                })
                .collect();
            Row { extension, values }
        })
        .collect();

    Ok(Table { columns, rows })
}

/// Requested names that have data, in the requested order, or every
/// extension sorted by name.
fn row_names(stats: &DownloadStats, extension_names: Option<&[String]>) -> Vec<String> {
    match extension_names {
        Some(names) if !names.is_empty() => names
            .iter()
            .filter(|name| stats.contains(name))
            .cloned()
            .collect(),
        _ => stats.extension_names(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::releases::ReleaseEntry;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn catalog() -> ReleaseCatalog {
        ReleaseCatalog::new(vec![
            ReleaseEntry::new("A", 100, date(2020, 1, 1)),
            ReleaseEntry::new("B", 200, date(2020, 1, 21)),
        ])
        .unwrap()
    }

    fn stats() -> DownloadStats {
        let mut stats = DownloadStats::new();
        stats.add("ExtA", "A", 6);
        stats.add("ExtA", "post-A", 4);
        stats.add("ExtA", "legacy", 2);
        stats.add("ExtB", "B", 30);
        stats
    }

    #[test]
    fn test_total_table_columns() {
        let table = to_total_table(&catalog(), &stats(), None);
        let labels: Vec<_> = table.columns.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["unknown", "legacy", "A", "post-A", "B", "post-B"]);

        let headings: Vec<_> = table.columns.iter().map(Column::heading).collect();
        assert_eq!(headings[2], "A (2020-01-01)");
        assert_eq!(headings[3], "post-A");
        assert_eq!(headings[1], "legacy");
    }

    #[test]
    fn test_total_table_fills_zero() {
        let table = to_total_table(&catalog(), &stats(), None);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].extension, "ExtA");
        assert_eq!(table.rows[0].values, [0, 2, 6, 4, 0, 0]);
        assert_eq!(table.rows[1].extension, "ExtB");
        assert_eq!(table.rows[1].values, [0, 0, 0, 0, 30, 0]);
    }

    #[test]
    fn test_total_table_follows_requested_order() {
        let names = vec!["ExtB".to_string(), "Missing".to_string(), "ExtA".to_string()];
        let table = to_total_table(&catalog(), &stats(), Some(&names));
        let rows: Vec<_> = table.rows.iter().map(|r| r.extension.as_str()).collect();
        assert_eq!(rows, ["ExtB", "ExtA"]);
    }

    #[test]
    fn test_daily_table() {
        let table = to_daily_table_at(&catalog(), &stats(), None, date(2020, 2, 20)).unwrap();
        let labels: Vec<_> = table.columns.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["A", "B"]);

        // A lasted 20 days with 6 + 4 downloads; B has run for 30 days.
        assert_eq!(table.rows[0].values, [0.5, 0.0]);
        assert_eq!(table.rows[1].values, [0.0, 1.0]);
    }

    #[test]
    fn test_daily_table_same_day_release() {
        let catalog = ReleaseCatalog::new(vec![
            ReleaseEntry::new("A", 100, date(2020, 1, 1)),
            ReleaseEntry::new("A-1", 101, date(2020, 1, 1)),
        ])
        .unwrap();
        let mut stats = DownloadStats::new();
        stats.add("ExtA", "A", 3);

        let table = to_daily_table_at(&catalog, &stats, None, date(2020, 1, 2)).unwrap();
        assert_eq!(table.rows[0].values[0], 3.0);
    }

    #[test]
    fn test_to_tsv() {
        let names = vec!["ExtB".to_string()];
        let table = to_total_table(&catalog(), &stats(), Some(&names));
        assert_eq!(
            table.to_tsv(false),
            "Extension\tunknown\tlegacy\tA\tpost-A\tB\tpost-B\nExtB\t0\t0\t0\t0\t30\t0\n"
        );
        assert!(table.to_tsv(true).starts_with("Extension\tunknown\tlegacy\tA (2020-01-01)\t"));
    }
}
