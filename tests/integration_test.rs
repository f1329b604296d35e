// tests/integration_test.rs

//! Integration tests for extinstall
//!
//! These tests verify end-to-end functionality across modules.

use extinstall::compat::{self, Architecture, HostDescriptor, SdkMarkers};
use extinstall::hosts;
use extinstall::install::{
    resolve_install_state, FamilyFolderResolver, InstallRoot, InstallRoots, InstallState,
    PackageIdentity,
};
use extinstall::packages::{self, PackageInfo};
use extinstall::scanner;
use extinstall::{Error, Version};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn roots_in(temp: &TempDir) -> InstallRoots {
    InstallRoots {
        all_users: temp.path().join("machine"),
        local_profile: Some(temp.path().join("local")),
        roaming_profile: Some(temp.path().join("roaming")),
    }
}

fn mesh_tools(payload: PathBuf, version: Version) -> PackageInfo {
    PackageInfo::new(
        PackageIdentity::new("7d0cd3b0-1d3e-4c4a-9f5e-0a3c3e9a1b11", "Mesh Tools"),
        version,
        InstallRoot::CurrentUserRoamingProfile,
        payload,
        SdkMarkers {
            native_sdk_version: "201010075".to_string(),
            native_sdk_service_release: "5".to_string(),
            ..Default::default()
        },
        Architecture::X64,
    )
}

#[test]
fn test_scanner_finds_newest_of_mixed_folder() {
    let temp = TempDir::new().unwrap();
    for name in ["1.2.0.0", "2.0.0.0", "notaversion"] {
        fs::create_dir(temp.path().join(name)).unwrap();
    }

    assert_eq!(
        scanner::newest_version(temp.path()).unwrap(),
        Some(Version::new(2, 0, 0, 0))
    );
}

#[test]
fn test_install_state_workflow_across_roots() {
    let temp = TempDir::new().unwrap();
    let roots = roots_in(&temp);
    let mut package = mesh_tools(temp.path().join("MeshTools.plugin"), Version::new(1, 5, 0, 0));
    let identity = package.identity.clone();

    // Nothing installed anywhere
    let state = package.refresh_install_state(&roots.family(&identity)).unwrap();
    assert_eq!(state, InstallState::NotInstalled);

    // Older copy in the roaming profile
    let per_user = roots
        .install_folder(InstallRoot::CurrentUserRoamingProfile, &identity, &Version::new(1, 0, 0, 0))
        .unwrap();
    fs::create_dir_all(&per_user).unwrap();

    let state = package.refresh_install_state(&roots.family(&identity)).unwrap();
    assert_eq!(
        state,
        InstallState::OlderVersionInstalled(InstallRoot::CurrentUserRoamingProfile)
    );

    // A machine-wide newer copy takes precedence over the per-user one
    let machine = roots
        .install_folder(InstallRoot::AllUsers, &identity, &Version::new(2, 0, 0, 0))
        .unwrap();
    fs::create_dir_all(&machine).unwrap();

    let state = package.refresh_install_state(&roots.family(&identity)).unwrap();
    assert_eq!(state, InstallState::NewerVersionInstalled(InstallRoot::AllUsers));
    assert_eq!(package.install_state, state);
}

#[test]
fn test_per_user_root_not_consulted_when_installed_for_all_users() {
    let temp = TempDir::new().unwrap();
    let family = temp.path().join("machine").join("Mesh Tools");
    fs::create_dir_all(family.join("1.5.0.0")).unwrap();

    let resolver = |root: InstallRoot| -> extinstall::Result<PathBuf> {
        match root {
            InstallRoot::AllUsers => Ok(family.clone()),
            _ => Err(Error::ResolverError("per-user root must not be resolved".to_string())),
        }
    };

    let state =
        resolve_install_state(&Version::new(1, 5, 0, 0), InstallRoot::CurrentUserLocalProfile, &resolver)
            .unwrap();
    assert_eq!(state, InstallState::SameVersionInstalled(InstallRoot::AllUsers));
}

#[test]
fn test_trait_object_resolver() {
    let temp = TempDir::new().unwrap();
    let roots = roots_in(&temp);
    let identity = PackageIdentity::new("id", "Tools");
    let family = roots.family(&identity);
    let resolver: &dyn FamilyFolderResolver = &family;

    let state = resolve_install_state(&Version::new(1, 0, 0, 0), InstallRoot::CurrentUserLocalProfile, resolver)
        .unwrap();
    assert_eq!(state, InstallState::NotInstalled);
}

#[test]
fn test_manifest_to_compatibility_workflow() {
    let temp = TempDir::new().unwrap();
    let payload = temp.path().join("MeshTools.plugin");
    fs::write(&payload, b"payload").unwrap();

    let package = mesh_tools(payload.clone(), Version::new(1, 5, 0, 0));
    packages::write_manifest(&package).unwrap();

    let loaded = packages::read_manifest(&payload).unwrap();
    loaded.ensure_recognized().unwrap();

    let inventory = hosts::parse_hosts(
        r#"[
            {"label": "Host 4", "native_sdk_version": "200612140", "native_sdk_service_release": "0"},
            {"label": "Host 5", "native_sdk_version": "201010075", "native_sdk_service_release": "5"}
        ]"#,
    )
    .unwrap();

    let verdicts = hosts::evaluate_hosts(&loaded.facts, &inventory);
    assert!(!verdicts[0].is_compatible());
    assert_eq!(verdicts[0].result.as_ref().unwrap_err().facet(), "native-sdk");
    assert!(verdicts[1].is_compatible());
}

#[test]
fn test_no_markers_package_is_unrecognized_but_compatible() {
    let package = PackageInfo::new(
        PackageIdentity::new("id", "Readme Only"),
        Version::new(1, 0, 0, 0),
        InstallRoot::CurrentUserLocalProfile,
        "/pkg/readme.plugin",
        SdkMarkers::default(),
        Architecture::Any,
    );

    // The calling layer refuses it...
    assert!(matches!(
        package.ensure_recognized(),
        Err(Error::UnrecognizedPackage(_))
    ));

    // ...while the resolver itself accepts it vacuously for valid hosts only
    let mut host = HostDescriptor::new("Host 5", SdkMarkers::default());
    assert!(compat::is_compatible(&package.facts, &host));
    host.valid = false;
    assert!(!compat::is_compatible(&package.facts, &host));
}

#[test]
fn test_core_types_are_thread_safe() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HostDescriptor>();
    assert_send_sync::<PackageInfo>();
    assert_send_sync::<InstallRoots>();
    assert_send_sync::<InstallState>();
    assert_send_sync::<Version>();
}
