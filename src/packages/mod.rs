// src/packages/mod.rs

//! Package descriptions built on top of the compatibility and install-state
//! engines
//!
//! This is the calling layer: it classifies what kind of package a set of
//! markers describes, refuses packages it does not recognize, and reads and
//! writes the sidecar manifest.

pub mod manifest;

use crate::compat::rules::compare_ignore_case;
use crate::compat::{Architecture, PackageCompatibilityFacts, SdkMarkers};
use crate::error::{Error, Result};
use crate::install::{self, FamilyFolderResolver, InstallRoot, InstallState, PackageIdentity};
use crate::version::Version;
use std::cmp::Ordering;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::debug;

pub use manifest::{manifest_path, read_manifest, write_manifest};

/// SDK facets a package can be built against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// Native plug-in exporting SDK version and service release
    Native,
    /// Managed plug-in referencing the runtime binding
    RuntimeBinding,
    /// Managed plug-in referencing the common binding
    CommonBinding,
}

impl PackageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageKind::Native => "native",
            PackageKind::RuntimeBinding => "runtime-binding",
            PackageKind::CommonBinding => "common-binding",
        }
    }
}

/// Every kind `markers` qualifies as
///
/// A native package needs both the SDK version and the service release.
pub fn package_kinds(markers: &SdkMarkers) -> Vec<PackageKind> {
    let mut kinds = Vec::new();
    if !markers.native_sdk_version.is_empty() && !markers.native_sdk_service_release.is_empty() {
        kinds.push(PackageKind::Native);
    }
    if !markers.runtime_binding_version.is_empty() {
        kinds.push(PackageKind::RuntimeBinding);
    }
    if !markers.common_binding_version.is_empty() {
        kinds.push(PackageKind::CommonBinding);
    }
    kinds
}

/// A candidate package and everything known about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub identity: PackageIdentity,
    pub version: Version,
    pub install_root: InstallRoot,
    /// Path of the package payload
    pub path: PathBuf,
    pub facts: PackageCompatibilityFacts,
    pub install_state: InstallState,
}

impl PackageInfo {
    pub fn new(
        identity: PackageIdentity,
        version: Version,
        install_root: InstallRoot,
        path: impl Into<PathBuf>,
        markers: SdkMarkers,
        architecture: Architecture,
    ) -> Self {
        Self {
            identity,
            version,
            install_root,
            path: path.into(),
            facts: PackageCompatibilityFacts::new(markers, architecture),
            install_state: InstallState::Unknown,
        }
    }

    pub fn kinds(&self) -> Vec<PackageKind> {
        package_kinds(&self.facts.markers)
    }

    /// Refuse packages that advertise none of the known SDK facets
    pub fn ensure_recognized(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::UnrecognizedPackage(format!(
                "{} has no payload path",
                self.identity.title
            )));
        }

        if self.kinds().is_empty() {
            debug!("Package {} declares no known SDK facet", self.path.display());
            return Err(Error::UnrecognizedPackage(self.path.display().to_string()));
        }

        Ok(())
    }

    /// Resolve and record the install state of this package
    pub fn refresh_install_state<R>(&mut self, resolver: &R) -> Result<InstallState>
    where
        R: FamilyFolderResolver + ?Sized,
    {
        debug!("Getting package install state for {}", self.path.display());
        let state = install::resolve_install_state(&self.version, self.install_root, resolver)?;
        self.install_state = state;
        Ok(state)
    }

    /// Multi-line summary for logs and the `inspect` command
    pub fn describe(&self) -> String {
        let markers = &self.facts.markers;
        let mut out = String::new();

        let _ = writeln!(out, "Package: {}", self.identity.title);
        let _ = writeln!(out, "Id: {}", self.identity.id);
        let _ = writeln!(out, "Version: {}", self.version);
        let _ = writeln!(out, "Platform: {}", self.facts.architecture);
        let _ = writeln!(out, "Install root: {}", self.install_root);
        let _ = writeln!(out, "Install state: {}", self.install_state);
        let _ = writeln!(out, "Path: {}", self.path.display());
        let _ = writeln!(out, "Native SDK version: {}", markers.native_sdk_version);
        let _ = writeln!(
            out,
            "Native SDK service release: {}",
            markers.native_sdk_service_release
        );
        let _ = writeln!(out, "Common binding version: {}", markers.common_binding_version);
        let _ = writeln!(out, "Runtime binding version: {}", markers.runtime_binding_version);

        let kinds: Vec<&str> = self.kinds().iter().map(|k| k.as_str()).collect();
        let _ = writeln!(out, "Kinds: {}", kinds.join(", "));

        let platforms: Vec<String> = self.facts.platforms.iter().map(|p| p.to_string()).collect();
        let _ = writeln!(out, "Targets: {}", platforms.join(", "));

        out
    }
}

/// Order two builds of a package: by version, then by each declared marker
pub fn compare_packages(a: &PackageInfo, b: &PackageInfo) -> Ordering {
    let (ma, mb) = (&a.facts.markers, &b.facts.markers);

    a.version
        .cmp(&b.version)
        .then_with(|| compare_ignore_case(&ma.native_sdk_version, &mb.native_sdk_version))
        .then_with(|| {
            compare_ignore_case(
                &ma.native_sdk_service_release,
                &mb.native_sdk_service_release,
            )
        })
        .then_with(|| compare_ignore_case(&ma.runtime_binding_version, &mb.runtime_binding_version))
        .then_with(|| compare_ignore_case(&ma.common_binding_version, &mb.common_binding_version))
}
