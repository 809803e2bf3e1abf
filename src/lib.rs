// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Download statistics for application extensions, bucketed by release.

pub mod aggregate;
pub mod baseline;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod downloadstats;
pub mod error;
pub mod install;
pub mod query;
pub mod releases;
pub mod table;

pub use aggregate::{DownloadRecord, DownloadStats, StatsAggregator};
pub use error::{InstallError, StatsError};
pub use releases::{ReleaseBucket, ReleaseCatalog, ReleaseEntry};
