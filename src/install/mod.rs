// src/install/mod.rs

//! Install roots and install-state resolution
//!
//! Packages install into `<root>/<family>/<version>`, where the root is either
//! machine-wide or in the current user's profile.

pub mod root;
pub mod state;

pub use root::{
    sanitize_folder_name, FamilyFolderResolver, InstallRoot, InstallRoots, PackageFamily,
    PackageIdentity,
};
pub use state::{compare_versions, resolve_install_state, InstallState};
