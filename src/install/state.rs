// src/install/state.rs

//! Install state classification
//!
//! Determines whether a candidate package version is already installed, and
//! if so whether the installed copy is older, the same, or newer. The
//! all-users root always wins: per-user roots are only consulted when nothing
//! is installed for all users.

use super::root::{FamilyFolderResolver, InstallRoot};
use crate::error::Result;
use crate::scanner;
use crate::version::Version;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Relationship between an installed package and a candidate, plus where the
/// installed copy was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InstallState {
    #[default]
    Unknown,
    NotInstalled,
    NewerVersionInstalled(InstallRoot),
    SameVersionInstalled(InstallRoot),
    OlderVersionInstalled(InstallRoot),
}

impl InstallState {
    /// Position in the "more installed" precedence order
    pub fn rank(&self) -> u8 {
        match self {
            InstallState::Unknown => 0,
            InstallState::NotInstalled => 1,
            InstallState::NewerVersionInstalled(_) => 2,
            InstallState::SameVersionInstalled(_) => 3,
            InstallState::OlderVersionInstalled(_) => 4,
        }
    }

    /// True for any state above `NotInstalled`
    pub fn is_installed(&self) -> bool {
        self.rank() > InstallState::NotInstalled.rank()
    }

    /// Root the installed copy was found at
    pub fn root(&self) -> Option<InstallRoot> {
        match self {
            InstallState::Unknown | InstallState::NotInstalled => None,
            InstallState::NewerVersionInstalled(root)
            | InstallState::SameVersionInstalled(root)
            | InstallState::OlderVersionInstalled(root) => Some(*root),
        }
    }

    fn relation_name(&self) -> &str {
        match self {
            InstallState::Unknown => "Unknown",
            InstallState::NotInstalled => "NotInstalled",
            InstallState::NewerVersionInstalled(_) => "NewerVersionInstalled",
            InstallState::SameVersionInstalled(_) => "SameVersionInstalled",
            InstallState::OlderVersionInstalled(_) => "OlderVersionInstalled",
        }
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root() {
            Some(root) => write!(f, "{}{}", self.relation_name(), root),
            None => f.write_str(self.relation_name()),
        }
    }
}

impl FromStr for InstallState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Unknown" => return Ok(InstallState::Unknown),
            "NotInstalled" => return Ok(InstallState::NotInstalled),
            _ => {}
        }

        let variants: [(&str, fn(InstallRoot) -> InstallState); 3] = [
            ("NewerVersionInstalled", InstallState::NewerVersionInstalled),
            ("SameVersionInstalled", InstallState::SameVersionInstalled),
            ("OlderVersionInstalled", InstallState::OlderVersionInstalled),
        ];

        for (prefix, make) in variants {
            if let Some(root) = s.strip_prefix(prefix) {
                let root = root
                    .parse::<InstallRoot>()
                    .map_err(|_| format!("Invalid install state: {}", s))?;
                return Ok(make(root));
            }
        }

        Err(format!("Invalid install state: {}", s))
    }
}

/// Classify `installed` (found at `root`) relative to `candidate`
pub fn compare_versions(
    candidate: &Version,
    installed: Option<&Version>,
    root: InstallRoot,
) -> InstallState {
    let Some(installed) = installed else {
        debug!("Not installed.");
        return InstallState::NotInstalled;
    };

    match installed.cmp(candidate) {
        Ordering::Less => {
            debug!("Older version installed ({}): {}", root, installed);
            InstallState::OlderVersionInstalled(root)
        }
        Ordering::Equal => {
            debug!("Same version installed ({}): {}", root, installed);
            InstallState::SameVersionInstalled(root)
        }
        Ordering::Greater => {
            debug!("Newer version installed ({}): {}", root, installed);
            InstallState::NewerVersionInstalled(root)
        }
    }
}

/// Scan one root's family folder and classify what is there
fn state_at_root<R>(candidate: &Version, root: InstallRoot, resolver: &R) -> Result<InstallState>
where
    R: FamilyFolderResolver + ?Sized,
{
    let folder = resolver.family_folder(root)?;
    let installed = scanner::newest_version(&folder)?;
    Ok(compare_versions(candidate, installed.as_ref(), root))
}

/// Determine the install state of `candidate`
///
/// The all-users root is checked first regardless of `preferred_root`. If
/// anything is installed there, that state is returned without looking at
/// the per-user root. Otherwise the package's preferred per-user root is
/// scanned and its classification returned.
pub fn resolve_install_state<R>(
    candidate: &Version,
    preferred_root: InstallRoot,
    resolver: &R,
) -> Result<InstallState>
where
    R: FamilyFolderResolver + ?Sized,
{
    debug!("Checking install state for all users");
    let state = state_at_root(candidate, InstallRoot::AllUsers, resolver)?;
    if state.is_installed() || !preferred_root.is_per_user() {
        return Ok(state);
    }

    debug!("Checking install state for current user ({})", preferred_root);
    state_at_root(candidate, preferred_root, resolver)
}
