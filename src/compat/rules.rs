// src/compat/rules.rs

//! Package/host compatibility rules
//!
//! Rules run in a fixed order and the first failure rejects:
//!
//! 1. the host must be valid
//! 2. managed runtime binding
//! 3. common binding
//! 4. native SDK version
//! 5. native SDK service release
//!
//! A facet rule is skipped when the package does not declare that facet, so
//! a package declaring nothing is compatible with every valid host.

use super::facts::{Generation, HostDescriptor, PackageCompatibilityFacts};
use std::cmp::Ordering;
use thiserror::Error;
use tracing::{debug, info, trace};

/// Runtime binding revisions at or above this belong to generation B
const GENERATION_B_REVISION: i64 = 100;

/// Why a package was rejected for a host
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Incompatibility {
    #[error("Host is not a valid installation: {host}")]
    InvalidHost { host: String },

    #[error("Runtime binding version incompatibility: host: {host}, package: {package}")]
    RuntimeBindingUnparseable { host: String, package: String },

    #[error("Runtime binding generation incompatibility: host: {host}, package: {package}")]
    RuntimeBindingGeneration { host: String, package: String },

    #[error("Runtime binding version incompatibility: host: {host} is older than package: {package}")]
    RuntimeBindingOlder { host: String, package: String },

    #[error("Common binding version incompatibility: host: not found, package: {package}")]
    CommonBindingMissing { package: String },

    #[error("Common binding version incompatibility: host: {host} is older than package: {package}")]
    CommonBindingOlder { host: String, package: String },

    #[error("Native SDK version incompatibility: host: {host}, package: {package}")]
    NativeSdkGeneration { host: String, package: String },

    #[error("Native SDK version incompatibility: host: {host} is older than package: {package}")]
    NativeSdkOlder { host: String, package: String },

    #[error("Native SDK service release incompatibility: host: {host}, package: {package}")]
    NativeSdkServiceRelease { host: String, package: String },
}

impl Incompatibility {
    /// Short name of the facet that failed
    pub fn facet(&self) -> &'static str {
        match self {
            Incompatibility::InvalidHost { .. } => "host",
            Incompatibility::RuntimeBindingUnparseable { .. }
            | Incompatibility::RuntimeBindingGeneration { .. }
            | Incompatibility::RuntimeBindingOlder { .. } => "runtime-binding",
            Incompatibility::CommonBindingMissing { .. }
            | Incompatibility::CommonBindingOlder { .. } => "common-binding",
            Incompatibility::NativeSdkGeneration { .. }
            | Incompatibility::NativeSdkOlder { .. } => "native-sdk",
            Incompatibility::NativeSdkServiceRelease { .. } => "native-sdk-service-release",
        }
    }
}

/// Case-insensitive ordinal string comparison
pub(crate) fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_uppercase)
        .cmp(b.chars().flat_map(char::to_uppercase))
}

/// Final `.`-separated integer component of a version string
fn trailing_revision(version: &str) -> Option<i64> {
    let (_, last) = version.trim().rsplit_once('.')?;
    if last.is_empty() || !last.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    last.parse().ok()
}

fn check_runtime_binding(host: &str, package: &str) -> Result<(), Incompatibility> {
    let (Some(host_rev), Some(package_rev)) = (trailing_revision(host), trailing_revision(package))
    else {
        return Err(Incompatibility::RuntimeBindingUnparseable {
            host: host.to_string(),
            package: package.to_string(),
        });
    };

    // A generation A host cannot load a package built for generation B; the
    // reverse is fine.
    if host_rev < GENERATION_B_REVISION && package_rev >= GENERATION_B_REVISION {
        return Err(Incompatibility::RuntimeBindingGeneration {
            host: host.to_string(),
            package: package.to_string(),
        });
    }

    if compare_ignore_case(host, package) == Ordering::Less {
        return Err(Incompatibility::RuntimeBindingOlder {
            host: host.to_string(),
            package: package.to_string(),
        });
    }

    Ok(())
}

fn check_common_binding(host: &str, package: &str) -> Result<(), Incompatibility> {
    if host.is_empty() {
        return Err(Incompatibility::CommonBindingMissing {
            package: package.to_string(),
        });
    }

    if compare_ignore_case(host, package) == Ordering::Less {
        return Err(Incompatibility::CommonBindingOlder {
            host: host.to_string(),
            package: package.to_string(),
        });
    }

    Ok(())
}

fn check_native_sdk(host: &str, package: &str) -> Result<(), Incompatibility> {
    let generation_error = || Incompatibility::NativeSdkGeneration {
        host: host.to_string(),
        package: package.to_string(),
    };

    let host_generation = Generation::from_marker(host).ok_or_else(generation_error)?;
    let package_generation = Generation::from_marker(package).ok_or_else(generation_error)?;

    // Generation B hosts load A and B packages; generation A hosts only A
    let accepted = match host_generation {
        Generation::A => package_generation == Generation::A,
        Generation::B => true,
    };
    if !accepted {
        return Err(generation_error());
    }

    // Short markers such as "40000" and "50000" share a trailing digit and
    // carry the major version in their leading digit instead. Date-stamped
    // markers ("200612140") all lead with the same digit and never hit this.
    if let (Some(host_major), Some(package_major)) = (leading_digit(host), leading_digit(package)) {
        if package_major > host_major {
            return Err(Incompatibility::NativeSdkOlder {
                host: host.to_string(),
                package: package.to_string(),
            });
        }
    }

    Ok(())
}

/// Leading digit of an all-digit marker
fn leading_digit(marker: &str) -> Option<u32> {
    let marker = marker.trim();
    if marker.is_empty() || !marker.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    marker.chars().next()?.to_digit(10)
}

fn check_native_service_release(host: &str, package: &str) -> Result<(), Incompatibility> {
    let package_generation = Generation::from_marker(package);

    let accepted = match Generation::from_marker(host) {
        Some(Generation::A) => package_generation == Some(Generation::A),
        Some(Generation::B) => package_generation.is_some(),
        None => false,
    };

    if accepted {
        Ok(())
    } else {
        Err(Incompatibility::NativeSdkServiceRelease {
            host: host.to_string(),
            package: package.to_string(),
        })
    }
}

type Rule = fn(&str, &str) -> Result<(), Incompatibility>;

/// Apply one facet rule, skipping it when the package does not declare the facet
fn apply_rule(facet: &str, offered: &str, declared: &str, rule: Rule) -> Result<(), Incompatibility> {
    if declared.is_empty() {
        trace!(facet, "Rule skipped, package declares no dependency");
        return Ok(());
    }

    let result = rule(offered, declared);
    match &result {
        Ok(()) => debug!(facet, host = offered, package = declared, "Rule passed"),
        Err(reason) => debug!(facet, host = offered, package = declared, "Rule failed: {}", reason),
    }
    result
}

/// Run every applicable rule, returning the first failure
pub fn check_compatibility(
    package: &PackageCompatibilityFacts,
    host: &HostDescriptor,
) -> Result<(), Incompatibility> {
    if !host.valid {
        debug!(facet = "host", host = %host.display_name(), "Rule failed: host is not valid");
        return Err(Incompatibility::InvalidHost {
            host: host.display_name(),
        });
    }

    let declared = &package.markers;
    let offered = &host.markers;

    apply_rule(
        "runtime-binding",
        &offered.runtime_binding_version,
        &declared.runtime_binding_version,
        check_runtime_binding,
    )?;
    apply_rule(
        "common-binding",
        &offered.common_binding_version,
        &declared.common_binding_version,
        check_common_binding,
    )?;
    apply_rule(
        "native-sdk",
        &offered.native_sdk_version,
        &declared.native_sdk_version,
        check_native_sdk,
    )?;
    apply_rule(
        "native-sdk-service-release",
        &offered.native_sdk_service_release,
        &declared.native_sdk_service_release,
        check_native_service_release,
    )?;

    Ok(())
}

/// Run the rules and log the verdict
///
/// Each rule logs its own outcome with both compared values; this adds the
/// verdict for the host as a whole.
pub fn evaluate_compatibility(
    package: &PackageCompatibilityFacts,
    host: &HostDescriptor,
) -> Result<(), Incompatibility> {
    let result = check_compatibility(package, host);
    match &result {
        Ok(()) => info!("Compatible host found: {}", host.display_name()),
        Err(reason) => info!(
            facet = reason.facet(),
            host = %host.display_name(),
            "Incompatible host: {}",
            reason
        ),
    }
    result
}

/// True if `package` can be installed into `host`
pub fn is_compatible(package: &PackageCompatibilityFacts, host: &HostDescriptor) -> bool {
    evaluate_compatibility(package, host).is_ok()
}
