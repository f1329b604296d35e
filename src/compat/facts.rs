// src/compat/facts.rs

//! Facts about hosts and packages consumed by the compatibility rules
//!
//! These are produced by introspection collaborators (manifest readers, host
//! enumerators) and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Coarse SDK compatibility bucket, inferred from the trailing digit of a
/// version marker (`0` for A, `5` for B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Generation {
    A,
    B,
}

impl Generation {
    /// Classify a raw marker by its trailing digit
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker.trim().chars().last()? {
            '0' => Some(Generation::A),
            '5' => Some(Generation::B),
            _ => None,
        }
    }
}

/// CPU target of a package binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Architecture {
    X86,
    X64,
    /// Architecture-neutral managed code
    Any,
    #[default]
    Unknown,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::X64 => "x64",
            Architecture::Any => "Any",
            Architecture::Unknown => "Unknown",
        }
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "x86" => Ok(Architecture::X86),
            "x64" => Ok(Architecture::X64),
            "Any" => Ok(Architecture::Any),
            "Unknown" => Ok(Architecture::Unknown),
            _ => Err(format!("Invalid architecture: {}", s)),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bitness {
    Bits32,
    Bits64,
}

/// A host build a package can run in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetPlatform {
    pub generation: Generation,
    pub bitness: Bitness,
}

impl TargetPlatform {
    pub const fn new(generation: Generation, bitness: Bitness) -> Self {
        Self {
            generation,
            bitness,
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let generation = match self.generation {
            Generation::A => "A",
            Generation::B => "B",
        };
        let bits = match self.bitness {
            Bitness::Bits32 => "32",
            Bitness::Bits64 => "64",
        };
        write!(f, "generation-{}/{}-bit", generation, bits)
    }
}

/// SDK version markers declared by a package or reported by a host
///
/// Empty strings mean "not declared".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkMarkers {
    /// Native SDK version marker, e.g. `"201010075"`
    pub native_sdk_version: String,
    /// Native SDK service-release marker
    pub native_sdk_service_release: String,
    /// Managed runtime binding assembly version, e.g. `"5.1.30000.12"`
    pub runtime_binding_version: String,
    /// Common binding assembly version
    pub common_binding_version: String,
}

impl SdkMarkers {
    /// True if no facet is declared at all
    pub fn is_empty(&self) -> bool {
        self.native_sdk_version.is_empty()
            && self.native_sdk_service_release.is_empty()
            && self.runtime_binding_version.is_empty()
            && self.common_binding_version.is_empty()
    }
}

/// Facts about one located host installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDescriptor {
    /// Human readable label, usually the host executable path
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub executable: Option<PathBuf>,
    #[serde(flatten)]
    pub markers: SdkMarkers,
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}

impl HostDescriptor {
    pub fn new(label: impl Into<String>, markers: SdkMarkers) -> Self {
        Self {
            label: label.into(),
            executable: None,
            markers,
            valid: true,
        }
    }

    /// Name to use in log records
    pub fn display_name(&self) -> String {
        match (&self.executable, self.label.is_empty()) {
            (Some(path), true) => path.display().to_string(),
            (_, false) => self.label.clone(),
            (None, true) => "<unnamed host>".to_string(),
        }
    }
}

/// Facts about a candidate package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageCompatibilityFacts {
    pub markers: SdkMarkers,
    pub architecture: Architecture,
    pub platforms: BTreeSet<TargetPlatform>,
}

impl PackageCompatibilityFacts {
    /// Build facts, inferring target platforms from architecture and markers
    pub fn new(markers: SdkMarkers, architecture: Architecture) -> Self {
        let platforms = infer_platforms(architecture, &markers);
        Self {
            markers,
            architecture,
            platforms,
        }
    }
}

/// Host builds a package can target, given its binary architecture and the
/// SDK markers it was built against
///
/// Managed bindings only exist on generation B hosts. A native package built
/// against the generation A SDK also loads in 32-bit generation B hosts.
pub fn infer_platforms(architecture: Architecture, markers: &SdkMarkers) -> BTreeSet<TargetPlatform> {
    use Bitness::*;
    use Generation::*;

    let mut platforms = BTreeSet::new();

    let managed = !markers.runtime_binding_version.is_empty()
        || !markers.common_binding_version.is_empty();
    if managed {
        match architecture {
            Architecture::X86 => {
                platforms.insert(TargetPlatform::new(B, Bits32));
            }
            Architecture::X64 => {
                platforms.insert(TargetPlatform::new(B, Bits64));
            }
            Architecture::Any => {
                platforms.insert(TargetPlatform::new(B, Bits32));
                platforms.insert(TargetPlatform::new(B, Bits64));
            }
            Architecture::Unknown => {}
        }
    }

    match Generation::from_marker(&markers.native_sdk_version) {
        Some(A) => {
            platforms.insert(TargetPlatform::new(A, Bits32));
            platforms.insert(TargetPlatform::new(B, Bits32));
        }
        Some(B) => match architecture {
            Architecture::X86 => {
                platforms.insert(TargetPlatform::new(B, Bits32));
            }
            Architecture::X64 => {
                platforms.insert(TargetPlatform::new(B, Bits64));
            }
            Architecture::Any | Architecture::Unknown => {}
        },
        None => {}
    }

    platforms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platforms(list: &[(Generation, Bitness)]) -> BTreeSet<TargetPlatform> {
        list.iter()
            .map(|(g, b)| TargetPlatform::new(*g, *b))
            .collect()
    }

    #[test]
    fn test_generation_from_trailing_digit() {
        assert_eq!(Generation::from_marker("200612140"), Some(Generation::A));
        assert_eq!(Generation::from_marker("201010075"), Some(Generation::B));
        assert_eq!(Generation::from_marker("201010073"), None);
        assert_eq!(Generation::from_marker(""), None);
    }

    #[test]
    fn test_managed_any_cpu_targets_both_bitnesses() {
        let markers = SdkMarkers {
            common_binding_version: "5.1.30000.12".to_string(),
            ..Default::default()
        };
        assert_eq!(
            infer_platforms(Architecture::Any, &markers),
            platforms(&[(Generation::B, Bitness::Bits32), (Generation::B, Bitness::Bits64)])
        );
    }

    #[test]
    fn test_native_generation_a_loads_in_both_generations() {
        let markers = SdkMarkers {
            native_sdk_version: "200612140".to_string(),
            native_sdk_service_release: "0".to_string(),
            ..Default::default()
        };
        assert_eq!(
            infer_platforms(Architecture::X86, &markers),
            platforms(&[(Generation::A, Bitness::Bits32), (Generation::B, Bitness::Bits32)])
        );
    }

    #[test]
    fn test_native_generation_b_follows_architecture() {
        let markers = SdkMarkers {
            native_sdk_version: "201010075".to_string(),
            ..Default::default()
        };
        assert_eq!(
            infer_platforms(Architecture::X64, &markers),
            platforms(&[(Generation::B, Bitness::Bits64)])
        );
    }

    #[test]
    fn test_no_markers_no_platforms() {
        assert!(infer_platforms(Architecture::Any, &SdkMarkers::default()).is_empty());
    }

    #[test]
    fn test_host_descriptor_json_defaults() {
        let host: HostDescriptor =
            serde_json::from_str(r#"{"label": "Host 5 (64-bit)", "native_sdk_version": "201010075"}"#)
                .unwrap();

        assert!(host.valid);
        assert_eq!(host.markers.native_sdk_version, "201010075");
        assert!(host.markers.common_binding_version.is_empty());
        assert_eq!(host.display_name(), "Host 5 (64-bit)");
    }
}
