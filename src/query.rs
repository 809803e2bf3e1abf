// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Console output and file export for download statistics.

use crate::aggregate::DownloadStats;
use crate::releases::ReleaseCatalog;
use crate::table::Table;
use anyhow::{Context, Result};
use camino::Utf8Path;
use chrono::NaiveDate;
use std::{fs::File, io::Write};

/// Header of the first column in exported CSV files.
pub const CSV_EXTENSION_COLUMN: &str = "Extension name";

/// Write the `extension -> release -> count` map as pretty-printed JSON.
pub fn export_json(stats: &DownloadStats, output: &Utf8Path) -> Result<()> {
    let json = serde_json::to_string_pretty(stats)?;

    let mut file = File::create(output.as_std_path())
        .with_context(|| format!("failed to create file at {}", output))?;
    file.write_all(json.as_bytes())?;

    println!("Exported to {}.", output);
    Ok(())
}

/// Write a total downloads table as CSV with undecorated release labels.
pub fn export_csv(table: &Table<u64>, output: &Utf8Path) -> Result<()> {
    let file = File::create(output.as_std_path())
        .with_context(|| format!("failed to create file at {}", output))?;
    write_csv(table, file)?;

    println!("Exported to {}.", output);
    Ok(())
}

pub fn write_csv(table: &Table<u64>, writer: impl Write) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec![CSV_EXTENSION_COLUMN];
    header.extend(table.columns.iter().map(|column| column.label.as_str()));
    writer.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![row.extension.clone()];
        record.extend(row.values.iter().map(u64::to_string));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Print extension names with their total downloads.
pub fn print_extensions(stats: &DownloadStats) {
    println!("\n{:<40} {:>15}", "Extension", "Downloads");
    println!("{}", "=".repeat(56));

    for (extension, releases) in stats.iter() {
        let total: u64 = releases.values().sum();
        println!("{:<40} {:>15}", extension, format_number(total));
    }
}

/// Print the release catalog with how long each release was current.
pub fn print_releases(catalog: &ReleaseCatalog, today: NaiveDate) -> Result<()> {
    println!("\n{:<16} {:>10} {:<12} {:>8}", "Release", "Revision", "Date", "Days");
    println!("{}", "=".repeat(49));

    for entry in catalog.entries() {
        let days = catalog.release_duration_days_at(&entry.label, today)?;
        println!(
            "{:<16} {:>10} {:<12} {:>8}",
            entry.label,
            entry.revision,
            entry.date.format("%Y-%m-%d"),
            format_number(days.max(0) as u64)
        );
    }

    Ok(())
}

/// Format a number with thousands separators.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline;
    use crate::releases::ReleaseEntry;
    use crate::table::to_total_table;

    fn catalog() -> ReleaseCatalog {
        ReleaseCatalog::new(vec![
            ReleaseEntry::new("4.2.0", 21298, NaiveDate::from_ymd_opt(2012, 11, 1).unwrap()),
            ReleaseEntry::new("4.2.1", 21438, NaiveDate::from_ymd_opt(2012, 11, 19).unwrap()),
        ])
        .unwrap()
    }

    fn stats() -> DownloadStats {
        let mut stats = DownloadStats::new();
        stats.add("SlicerRT", "4.2.0", 146);
        stats.add("SlicerRT", "post-4.2.1", 3);
        stats.add("SlicerIGT", "unknown", 1);
        stats
    }

    #[test]
    fn test_csv_export_roundtrip() {
        let stats = stats();
        let table = to_total_table(&catalog(), &stats, None);

        let mut buf = Vec::new();
        write_csv(&table, &mut buf).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("Extension name,unknown,legacy,4.2.0,post-4.2.0,4.2.1,post-4.2.1\n"));

        let mut parsed = DownloadStats::new();
        parsed.merge(baseline::parse_baseline(buf.as_slice()).unwrap(), None);
        assert_eq!(parsed, stats);
    }

    #[test]
    fn test_json_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("stats.json");
        export_json(&stats(), &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["SlicerRT"]["4.2.0"], 146);
        assert_eq!(json["SlicerIGT"]["unknown"], 1);
        assert!(json["SlicerRT"].get("4.2.1").is_none());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }
}
