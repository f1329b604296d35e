// src/lib.rs

//! extinstall
//!
//! Decides, for an application extension about to be installed, whether it
//! is compatible with a given host build and which version of it (if any)
//! is already installed.
//!
//! # Architecture
//!
//! - Version folders: installed packages live in `<family>/<a.b.c.d>/`
//! - Root precedence: the all-users root is checked before the per-user root
//! - Facts in, verdicts out: hosts and packages are described by plain marker
//!   structs; nothing here inspects binaries
//! - Compatibility rules are evaluated in a fixed order and every rejection
//!   carries the facet and both compared values

pub mod compat;
mod error;
pub mod hosts;
pub mod install;
pub mod packages;
pub mod scanner;
pub mod version;

pub use compat::{HostDescriptor, Incompatibility, PackageCompatibilityFacts, SdkMarkers};
pub use error::{Error, Result};
pub use install::{InstallRoot, InstallRoots, InstallState};
pub use version::Version;
