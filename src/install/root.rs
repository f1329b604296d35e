// src/install/root.rs

//! Install roots and family folder resolution

use crate::error::{Error, Result};
use crate::version::Version;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Characters that are never valid in a folder name on any supported platform
const INVALID_FOLDER_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Where a package can be installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallRoot {
    AllUsers,
    CurrentUserLocalProfile,
    CurrentUserRoamingProfile,
}

impl InstallRoot {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallRoot::AllUsers => "AllUsers",
            InstallRoot::CurrentUserLocalProfile => "CurrentUserLocalProfile",
            InstallRoot::CurrentUserRoamingProfile => "CurrentUserRoamingProfile",
        }
    }

    pub fn is_per_user(&self) -> bool {
        !matches!(self, InstallRoot::AllUsers)
    }
}

impl fmt::Display for InstallRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallRoot {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "AllUsers" => Ok(InstallRoot::AllUsers),
            "CurrentUserLocalProfile" => Ok(InstallRoot::CurrentUserLocalProfile),
            "CurrentUserRoamingProfile" => Ok(InstallRoot::CurrentUserRoamingProfile),
            _ => Err(format!("Invalid install root: {}", s)),
        }
    }
}

/// Maps an install root to the folder holding one package's version subfolders
///
/// Implementations hide how the path is built (environment, OS conventions,
/// registry lookups). Closures `Fn(InstallRoot) -> Result<PathBuf>` implement
/// this trait directly.
pub trait FamilyFolderResolver {
    fn family_folder(&self, root: InstallRoot) -> Result<PathBuf>;
}

impl<F> FamilyFolderResolver for F
where
    F: Fn(InstallRoot) -> Result<PathBuf>,
{
    fn family_folder(&self, root: InstallRoot) -> Result<PathBuf> {
        self(root)
    }
}

/// Identity used to name a package's family folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIdentity {
    pub id: String,
    pub title: String,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Folder name for this package: `<title> (<id>)`
    pub fn folder_name(&self) -> String {
        sanitize_folder_name(&format!("{} ({})", self.title, self.id))
    }
}

/// Remove characters that cannot appear in a folder name
pub fn sanitize_folder_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && !INVALID_FOLDER_CHARS.contains(c))
        .collect()
}

/// Base directories for each install root on this machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRoots {
    pub all_users: PathBuf,
    pub local_profile: Option<PathBuf>,
    pub roaming_profile: Option<PathBuf>,
}

impl InstallRoots {
    /// Per-user roots from the platform data directories, under `app_dir`
    pub fn with_user_defaults(all_users: impl Into<PathBuf>, app_dir: &str) -> Self {
        Self {
            all_users: all_users.into(),
            local_profile: dirs::data_local_dir().map(|d| d.join(app_dir)),
            roaming_profile: dirs::data_dir().map(|d| d.join(app_dir)),
        }
    }

    /// Base directory for `root`
    pub fn base(&self, root: InstallRoot) -> Result<&Path> {
        let base = match root {
            InstallRoot::AllUsers => Some(self.all_users.as_path()),
            InstallRoot::CurrentUserLocalProfile => self.local_profile.as_deref(),
            InstallRoot::CurrentUserRoamingProfile => self.roaming_profile.as_deref(),
        };

        base.ok_or_else(|| {
            Error::ResolverError(format!("No base directory configured for {}", root))
        })
    }

    /// Folder holding every installed version of `package` under `root`
    pub fn family_folder_for(&self, root: InstallRoot, package: &PackageIdentity) -> Result<PathBuf> {
        Ok(self.base(root)?.join(package.folder_name()))
    }

    /// Folder a specific version of `package` installs into
    pub fn install_folder(
        &self,
        root: InstallRoot,
        package: &PackageIdentity,
        version: &Version,
    ) -> Result<PathBuf> {
        Ok(self
            .family_folder_for(root, package)?
            .join(version.to_string()))
    }

    /// Bind these roots to one package
    pub fn family<'a>(&'a self, package: &'a PackageIdentity) -> PackageFamily<'a> {
        PackageFamily {
            roots: self,
            package,
        }
    }
}

/// [`InstallRoots`] bound to a single package identity
#[derive(Debug, Clone, Copy)]
pub struct PackageFamily<'a> {
    roots: &'a InstallRoots,
    package: &'a PackageIdentity,
}

impl FamilyFolderResolver for PackageFamily<'_> {
    fn family_folder(&self, root: InstallRoot) -> Result<PathBuf> {
        self.roots.family_folder_for(root, self.package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> InstallRoots {
        InstallRoots {
            all_users: PathBuf::from("/opt/host/plug-ins"),
            local_profile: Some(PathBuf::from("/home/u/.local/share/host")),
            roaming_profile: None,
        }
    }

    #[test]
    fn test_install_root_round_trip_names() {
        for root in [
            InstallRoot::AllUsers,
            InstallRoot::CurrentUserLocalProfile,
            InstallRoot::CurrentUserRoamingProfile,
        ] {
            assert_eq!(root.as_str().parse::<InstallRoot>().unwrap(), root);
        }
        assert!("Everywhere".parse::<InstallRoot>().is_err());
    }

    #[test]
    fn test_sanitize_strips_invalid_chars() {
        assert_eq!(sanitize_folder_name("My: Plug/in*?"), "My Plugin");
        assert_eq!(sanitize_folder_name("tab\there"), "tabhere");
    }

    #[test]
    fn test_install_folder_layout() {
        let package = PackageIdentity::new("abc-123", "Mesh Tools");
        let folder = roots()
            .install_folder(InstallRoot::AllUsers, &package, &Version::new(1, 2, 3, 4))
            .unwrap();

        assert_eq!(
            folder,
            PathBuf::from("/opt/host/plug-ins/Mesh Tools (abc-123)/1.2.3.4")
        );
        assert_eq!(
            folder.parent().unwrap(),
            roots().family_folder_for(InstallRoot::AllUsers, &package).unwrap()
        );
    }

    #[test]
    fn test_missing_base_is_resolver_error() {
        let package = PackageIdentity::new("abc-123", "Mesh Tools");
        let result = roots().family_folder_for(InstallRoot::CurrentUserRoamingProfile, &package);
        assert!(matches!(result, Err(Error::ResolverError(_))));
    }

    #[test]
    fn test_package_family_resolves_per_root() {
        let roots = roots();
        let package = PackageIdentity::new("abc-123", "Mesh Tools");
        let family = roots.family(&package);

        assert_eq!(
            family.family_folder(InstallRoot::CurrentUserLocalProfile).unwrap(),
            PathBuf::from("/home/u/.local/share/host/Mesh Tools (abc-123)")
        );
    }
}
