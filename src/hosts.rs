// src/hosts.rs

//! Host inventories
//!
//! A host enumerator describes the host installations it found as a JSON
//! array of [`HostDescriptor`] values:
//!
//! ```json
//! [
//!   {
//!     "label": "Host 5 (64-bit)",
//!     "executable": "/opt/host5/bin/host",
//!     "native_sdk_version": "201010075",
//!     "native_sdk_service_release": "5",
//!     "runtime_binding_version": "5.1.30000.150",
//!     "common_binding_version": "5.1.30000.12"
//!   }
//! ]
//! ```

use crate::compat::{evaluate_compatibility, HostDescriptor, Incompatibility, PackageCompatibilityFacts};
use crate::error::{Error, Result};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Parse a JSON host inventory
pub fn parse_hosts(json: &str) -> Result<Vec<HostDescriptor>> {
    let hosts: Vec<HostDescriptor> = serde_json::from_str(json)?;
    Ok(hosts)
}

/// Load a JSON host inventory from disk
pub fn load_hosts(path: &Path) -> Result<Vec<HostDescriptor>> {
    debug!("Loading host inventory from {}", path.display());

    let json = fs::read_to_string(path)?;
    let hosts = parse_hosts(&json).map_err(|e| match e {
        Error::Json(e) => Error::ParseError(format!(
            "Invalid host inventory {}: {}",
            path.display(),
            e
        )),
        other => other,
    })?;

    info!("Loaded {} host(s) from {}", hosts.len(), path.display());
    Ok(hosts)
}

/// Compatibility verdict for one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostVerdict {
    pub host: HostDescriptor,
    pub result: std::result::Result<(), Incompatibility>,
}

impl HostVerdict {
    pub fn is_compatible(&self) -> bool {
        self.result.is_ok()
    }
}

/// Check `package` against every host in parallel, preserving host order
pub fn evaluate_hosts(package: &PackageCompatibilityFacts, hosts: &[HostDescriptor]) -> Vec<HostVerdict> {
    hosts
        .par_iter()
        .map(|host| HostVerdict {
            host: host.clone(),
            result: evaluate_compatibility(package, host),
        })
        .collect()
}
