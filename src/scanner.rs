// src/scanner.rs

//! Installed version discovery
//!
//! A package family folder holds one subfolder per installed version:
//!
//! ```text
//! <family-folder>/
//!     1.2.0.0/
//!     2.0.0.0/
//!     logs/          <- ignored
//! ```
//!
//! Only subfolders whose names are exactly four dot-separated integers count.

use crate::error::Result;
use crate::version::Version;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A version subfolder found inside a family folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDirectory {
    pub version: Version,
    pub path: PathBuf,
}

/// List the version subfolders of `folder`, sorted ascending by version
///
/// A missing `folder` yields an empty list. Any other I/O failure while
/// listing an existing folder is returned to the caller.
pub fn list_version_directories(folder: &Path) -> Result<Vec<VersionDirectory>> {
    let entries = match fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Package folder not found: {}", folder.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut directories: Vec<VersionDirectory> = Vec::new();

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        // Follows symlinks; a dangling link or an entry removed mid-scan is skipped
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!("Skipping vanished entry: {}", path.display());
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_dir() {
            continue;
        }

        let name = entry.file_name();
        let Some(version) = name.to_str().and_then(Version::from_folder_name) else {
            trace!("Skipping non-version folder: {}", path.display());
            continue;
        };

        // Distinct names can parse to the same version ("1.0.0.1" / "1.0.0.01")
        if directories.iter().any(|d| d.version == version) {
            trace!("Duplicate version folder ignored: {}", path.display());
            continue;
        }

        directories.push(VersionDirectory { version, path });
    }

    directories.sort_by(|a, b| a.version.cmp(&b.version));
    Ok(directories)
}

/// Newest installed version under `folder`, or `None` if nothing is installed
pub fn newest_version(folder: &Path) -> Result<Option<Version>> {
    debug!("Getting newest version of installed package in {}", folder.display());

    let newest = list_version_directories(folder)?
        .into_iter()
        .map(|d| d.version)
        .max();

    match newest {
        Some(v) => debug!("Newest installed version: {}", v),
        None => debug!("No installed versions found"),
    }

    Ok(newest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn family_with(dirs: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for d in dirs {
            fs::create_dir(temp.path().join(d)).unwrap();
        }
        temp
    }

    #[test]
    fn test_missing_folder_is_empty() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");

        assert!(list_version_directories(&missing).unwrap().is_empty());
        assert_eq!(newest_version(&missing).unwrap(), None);
    }

    #[test]
    fn test_only_non_version_folders() {
        let temp = family_with(&["logs", "readme", "1.2.3", "v1.0.0.0"]);
        assert_eq!(newest_version(temp.path()).unwrap(), None);
    }

    #[test]
    fn test_newest_excludes_non_version_names() {
        let temp = family_with(&["1.2.0.0", "2.0.0.0", "notaversion"]);

        let listed = list_version_directories(temp.path()).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|d| !d.path.ends_with("notaversion")));

        assert_eq!(
            newest_version(temp.path()).unwrap(),
            Some(Version::new(2, 0, 0, 0))
        );
    }

    #[test]
    fn test_sorted_numerically_not_lexically() {
        let temp = family_with(&["10.0.0.0", "9.0.0.0", "1.10.0.0", "1.9.0.0"]);

        let versions: Vec<String> = list_version_directories(temp.path())
            .unwrap()
            .into_iter()
            .map(|d| d.version.to_string())
            .collect();

        assert_eq!(versions, vec!["1.9.0.0", "1.10.0.0", "9.0.0.0", "10.0.0.0"]);
    }

    #[test]
    fn test_version_below_legacy_floor_is_reported() {
        // 1.0.0.0 and lower are real installs, not "nothing found"
        let temp = family_with(&["0.9.0.0", "1.0.0.0"]);
        assert_eq!(
            newest_version(temp.path()).unwrap(),
            Some(Version::new(1, 0, 0, 0))
        );
    }

    #[test]
    fn test_files_with_version_names_are_ignored() {
        let temp = family_with(&["1.0.0.0"]);
        fs::write(temp.path().join("3.0.0.0"), b"not a folder").unwrap();

        assert_eq!(
            newest_version(temp.path()).unwrap(),
            Some(Version::new(1, 0, 0, 0))
        );
    }

    #[test]
    fn test_duplicate_versions_collapse() {
        let temp = family_with(&["1.0.0.1", "1.0.0.01"]);
        assert_eq!(list_version_directories(temp.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_folder_is_a_file_propagates_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("family");
        fs::write(&file, b"").unwrap();

        assert!(list_version_directories(&file).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_unsearchable_folder_propagates_error() {
        use std::os::unix::fs::PermissionsExt;

        let temp = family_with(&["2.0.0.0"]);
        let family = temp.path();
        fs::set_permissions(family, fs::Permissions::from_mode(0o444)).unwrap();

        // Privileged users bypass the permission check
        let privileged = fs::metadata(family.join("2.0.0.0")).is_ok();

        let listed = list_version_directories(family);
        let newest = newest_version(family);
        fs::set_permissions(family, fs::Permissions::from_mode(0o755)).unwrap();

        if privileged {
            return;
        }
        match listed {
            Err(crate::Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("expected permission error, got {:?}", other),
        }
        assert!(newest.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_skipped() {
        let temp = family_with(&["1.0.0.0"]);
        std::os::unix::fs::symlink(temp.path().join("gone"), temp.path().join("3.0.0.0")).unwrap();

        assert_eq!(
            newest_version(temp.path()).unwrap(),
            Some(Version::new(1, 0, 0, 0))
        );
    }
}
