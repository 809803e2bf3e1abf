// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reader for the frozen historical download statistics.
//!
//! These counts were collected by the previous extensions server and are not
//! available from the current one. The file is a CSV table whose header is
//! `Extension` followed by release labels, with one row per extension. The
//! counts are already bucketed by release, so no revision lookup is needed.

use crate::aggregate::DownloadRecord;
use crate::error::{Result, StatsError};
use camino::Utf8Path;
use std::fs::File;
use std::io::Read;
use tracing::debug;

/// Read baseline records from a CSV file.
pub fn read_baseline(path: &Utf8Path) -> Result<Vec<DownloadRecord>> {
    let file = File::open(path.as_std_path()).map_err(|source| StatsError::BaselineIo {
        path: path.to_owned(),
        source,
    })?;

    let records = parse_baseline(file)?;
    debug!(%path, records = records.len(), "read baseline statistics");
    Ok(records)
}

/// Parse baseline records from CSV data.
///
/// Empty cells and zero counts mean "no data" and produce no record.
pub fn parse_baseline(reader: impl Read) -> Result<Vec<DownloadRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let releases: Vec<String> = reader
        .headers()?
        .iter()
        .skip(1)
        .map(|release| release.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let Some(extension) = row.get(0) else {
            continue;
        };

        for (release, value) in releases.iter().zip(row.iter().skip(1)) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            let downloads: u64 = value.parse().map_err(|_| StatsError::InvalidCount {
                extension: extension.to_string(),
                release: release.clone(),
                value: value.to_string(),
            })?;

            if downloads == 0 {
                continue;
            }

            records.push(DownloadRecord {
                extension: extension.to_string(),
                release: release.clone(),
                downloads,
            });
        }
    }

    Ok(records)
}
