// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for statistics collection and package installation.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while building the release catalog or aggregating statistics.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A release label was looked up that the catalog does not contain.
    #[error("release '{label}' is not in the release catalog")]
    ReleaseNotFound { label: String },

    /// The same release label was listed twice.
    #[error("release '{label}' is listed more than once in the release catalog")]
    DuplicateRelease { label: String },

    #[error("failed to read baseline statistics from {path}")]
    BaselineIo {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse baseline statistics")]
    BaselineCsv(#[from] csv::Error),

    #[error("invalid download count '{value}' for extension '{extension}' in release '{release}'")]
    InvalidCount {
        extension: String,
        release: String,
        value: String,
    },

    #[error("failed to fetch download statistics from {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download statistics request to {url} failed with status {status}: {body}")]
    ServerStatus {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse download statistics returned by {url}")]
    InvalidResponse {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Errors raised while checking or installing packages into the host.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("extension file does not exist: {path}")]
    FileNotFound { path: Utf8PathBuf },

    #[error(
        "package name '{name}' does not match the expected format (revision-os-arch-name)"
    )]
    MalformedPackageName { name: String },

    /// The package was built for a different platform than the host runs.
    #[error("{field}: {host} (host) {package} (package)")]
    PlatformMismatch {
        field: &'static str,
        host: String,
        package: String,
    },

    #[error("host refused to install extension archive {path}")]
    HostRejected { path: Utf8PathBuf },

    #[error("module '{key}' is already loaded")]
    ModuleAlreadyLoaded { key: String },

    #[error("failed to register module '{key}'")]
    ModuleNotRegistered { key: String },

    #[error("module factory failed to load '{key}' or one of its dependencies")]
    ModuleLoadFailed { key: String },

    #[error("failed to list directory {path}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = StatsError> = std::result::Result<T, E>;
