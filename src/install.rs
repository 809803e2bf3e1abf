// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Installing extension packages and loading developer modules into a host
//! application.
//!
//! Packages are named `<revision>-<os>-<arch>-<name>.<ext>`; a package can only
//! be installed into a host running the same revision on the same platform.
//! The host itself is reached through the [`Host`] trait.

use crate::error::InstallError;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{debug, info};

/// The build and platform a host application runs on.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlatformDescriptor {
    pub revision: String,
    pub os: String,
    pub arch: String,
}

/// Platform tags parsed from a package file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageName {
    pub revision: String,
    pub os: String,
    pub arch: String,
    pub rest: String,
}

impl PackageName {
    pub fn parse(path: &Utf8Path) -> Result<Self, InstallError> {
        let name = path.file_name().unwrap_or(path.as_str());
        let mut parts = name.splitn(4, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(revision), Some(os), Some(arch)) => Ok(Self {
                revision: revision.to_string(),
                os: os.to_string(),
                arch: arch.to_string(),
                rest: parts.next().unwrap_or_default().to_string(),
            }),
            _ => Err(InstallError::MalformedPackageName {
                name: name.to_string(),
            }),
        }
    }
}

/// Operations the host application provides.
pub trait Host {
    fn current_platform(&self) -> PlatformDescriptor;

    /// Install an extension archive; `false` if the host refused it.
    fn install_extension_archive(&mut self, path: &Utf8Path) -> bool;

    fn is_module_loaded(&self, key: &str) -> bool;
    fn register_module(&mut self, path: &Utf8Path);
    fn is_module_registered(&self, key: &str) -> bool;
    fn load_modules(&mut self, keys: &[&str]) -> bool;

    /// Module search paths persisted in the host's settings.
    fn additional_module_paths(&self) -> Vec<Utf8PathBuf>;
    fn set_additional_module_paths(&mut self, paths: Vec<Utf8PathBuf>);
}

/// Check that a file exists with exactly this name.
///
/// Path lookups are case-insensitive on some filesystems, so the directory
/// listing is checked for the exact file name as well.
pub fn file_exists_case_sensitive(path: &Utf8Path) -> Result<bool, InstallError> {
    if !path.is_file() {
        return Ok(false);
    }
    let Some(file_name) = path.file_name() else {
        return Ok(false);
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };

    let entries = fs::read_dir(dir.as_std_path()).map_err(|source| InstallError::Io {
        path: dir.to_owned(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| InstallError::Io {
            path: dir.to_owned(),
            source,
        })?;
        if entry.file_name() == file_name {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Compare the platform tags of a package with the host platform.
pub fn check_platform(path: &Utf8Path, platform: &PlatformDescriptor) -> Result<(), InstallError> {
    let package = PackageName::parse(path)?;
    let fields = [
        ("revision", &platform.revision, package.revision),
        ("os", &platform.os, package.os),
        ("arch", &platform.arch, package.arch),
    ];
    for (field, host, package) in fields {
        if *host != package {
            return Err(InstallError::PlatformMismatch {
                field,
                host: host.clone(),
                package,
            });
        }
    }
    Ok(())
}

/// Installs packages and loads modules through a host.
pub struct ExtensionInstaller<H> {
    host: H,
}

impl<H: Host> ExtensionInstaller<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Install an extension archive after checking it exists and matches the
    /// host platform.
    pub fn install_extension(&mut self, path: &Utf8Path) -> Result<(), InstallError> {
        if !file_exists_case_sensitive(path)? {
            return Err(InstallError::FileNotFound {
                path: path.to_owned(),
            });
        }
        check_platform(path, &self.host.current_platform())?;

        info!(%path, "installing extension");
        if !self.host.install_extension_archive(path) {
            return Err(InstallError::HostRejected {
                path: path.to_owned(),
            });
        }
        info!(%path, "extension installed");
        Ok(())
    }

    /// Register and load a module file while the host is running.
    ///
    /// With `permanent`, the module's directory is also added to the host's
    /// module search paths.
    pub fn add_module(&mut self, path: &Utf8Path, permanent: bool) -> Result<(), InstallError> {
        let key = path.file_stem().unwrap_or(path.as_str()).to_string();
        if self.host.is_module_loaded(&key) {
            return Err(InstallError::ModuleAlreadyLoaded { key });
        }

        if permanent {
            let dir = path.parent().unwrap_or(Utf8Path::new("")).to_owned();
            let mut paths = self.host.additional_module_paths();
            if !paths.contains(&dir) {
                debug!(%dir, "adding module search path");
                paths.push(dir);
                self.host.set_additional_module_paths(paths);
            }
        }

        self.host.register_module(path);
        if !self.host.is_module_registered(&key) {
            return Err(InstallError::ModuleNotRegistered { key });
        }
        if !self.host.load_modules(&[key.as_str()]) {
            return Err(InstallError::ModuleLoadFailed { key });
        }

        info!(%key, "module loaded");
        Ok(())
    }
}
