// src/packages/manifest.rs

//! Sidecar package manifest
//!
//! A payload `Foo.plugin` may carry an already-inspected description of
//! itself in `Foo.plugin.xml`:
//!
//! ```xml
//! <PackageManifest>
//!   <Id>7d0cd3b0-...</Id>
//!   <Title>Mesh Tools</Title>
//!   <Version>1.2.0.0</Version>
//!   <InstallRoot>CurrentUserRoamingProfile</InstallRoot>
//!   <NativeSDKVersion>201010075</NativeSDKVersion>
//!   <NativeSDKServiceRelease>5</NativeSDKServiceRelease>
//!   <RuntimeBindingVersion/>
//!   <CommonBindingVersion/>
//!   <InstallState>NotInstalled</InstallState>
//!   <Platform>x64</Platform>
//! </PackageManifest>
//! ```

use super::PackageInfo;
use crate::compat::{Architecture, SdkMarkers};
use crate::error::{Error, Result};
use crate::install::{InstallRoot, InstallState, PackageIdentity};
use crate::version::Version;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const ROOT_ELEMENT: &str = "PackageManifest";

/// Manifest path for a payload: the payload path with `.xml` appended
pub fn manifest_path(payload: &Path) -> PathBuf {
    let mut name = payload.as_os_str().to_owned();
    name.push(".xml");
    PathBuf::from(name)
}

/// Render `info` as manifest XML
pub fn to_xml(info: &PackageInfo) -> Result<String> {
    let markers = &info.facts.markers;
    let version = info.version.to_string();
    let install_root = info.install_root.to_string();
    let install_state = info.install_state.to_string();

    let fields: [(&str, &str); 10] = [
        ("Id", info.identity.id.as_str()),
        ("Title", info.identity.title.as_str()),
        ("Version", version.as_str()),
        ("InstallRoot", install_root.as_str()),
        ("NativeSDKVersion", markers.native_sdk_version.as_str()),
        ("NativeSDKServiceRelease", markers.native_sdk_service_release.as_str()),
        ("RuntimeBindingVersion", markers.runtime_binding_version.as_str()),
        ("CommonBindingVersion", markers.common_binding_version.as_str()),
        ("InstallState", install_state.as_str()),
        ("Platform", info.facts.architecture.as_str()),
    ];

    let xml_error = |e: quick_xml::Error| Error::ParseError(format!("Failed to write manifest: {}", e));

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))
        .map_err(xml_error)?;

    for (name, value) in fields {
        if value.is_empty() {
            writer
                .write_event(Event::Empty(BytesStart::new(name)))
                .map_err(xml_error)?;
            continue;
        }
        writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(xml_error)?;
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(xml_error)?;
        writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))
        .map_err(xml_error)?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::ParseError(format!("Manifest is not valid UTF-8: {}", e)))
}

/// Collect `<Name>text</Name>` children of the root element
fn read_fields(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut fields = HashMap::new();
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut current: Option<String> = None;
    let mut saw_root = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                depth += 1;
                if depth == 1 {
                    if name != ROOT_ELEMENT {
                        return Err(Error::ParseError(format!(
                            "Unexpected manifest root element: {}",
                            name
                        )));
                    }
                    saw_root = true;
                } else if depth == 2 {
                    fields.entry(name.clone()).or_insert_with(String::new);
                    current = Some(name);
                }
            }
            Ok(Event::Empty(e)) => {
                if depth == 1 {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    fields.entry(name).or_insert_with(String::new);
                }
            }
            Ok(Event::Text(e)) => {
                if let (2, Some(name)) = (depth, &current) {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::ParseError(format!("Bad manifest text: {}", e)))?;
                    fields.insert(name.clone(), text.trim().to_string());
                }
            }
            Ok(Event::End(_)) => {
                if depth == 2 {
                    current = None;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::ParseError(format!(
                    "Failed to parse manifest: {}",
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(Error::ParseError(format!(
            "Manifest has no <{}> element",
            ROOT_ELEMENT
        )));
    }

    Ok(fields)
}

/// Parse manifest XML describing the payload at `payload`
pub fn parse_manifest(xml: &str, payload: &Path) -> Result<PackageInfo> {
    let mut fields = read_fields(xml)?;
    let mut take = |name: &str| fields.remove(name).unwrap_or_default();

    let required = |name: &str, value: String| -> Result<String> {
        if value.is_empty() {
            Err(Error::ParseError(format!(
                "Manifest for {} is missing <{}>",
                payload.display(),
                name
            )))
        } else {
            Ok(value)
        }
    };

    let id = required("Id", take("Id"))?;
    let title = required("Title", take("Title"))?;
    let version = Version::coerce(&required("Version", take("Version"))?)?;
    let install_root: InstallRoot = required("InstallRoot", take("InstallRoot"))?
        .parse()
        .map_err(Error::ParseError)?;

    let markers = SdkMarkers {
        native_sdk_version: take("NativeSDKVersion"),
        native_sdk_service_release: take("NativeSDKServiceRelease"),
        runtime_binding_version: take("RuntimeBindingVersion"),
        common_binding_version: take("CommonBindingVersion"),
    };

    let install_state = take("InstallState");
    let install_state = install_state.parse::<InstallState>().unwrap_or_else(|_| {
        if !install_state.is_empty() {
            warn!("Unrecognized install state in manifest: {}", install_state);
        }
        InstallState::Unknown
    });

    let platform = take("Platform");
    let architecture = platform.parse::<Architecture>().unwrap_or(Architecture::Unknown);

    let mut info = PackageInfo::new(
        PackageIdentity::new(id, title),
        version,
        install_root,
        payload,
        markers,
        architecture,
    );
    info.install_state = install_state;

    Ok(info)
}

/// Read the sidecar manifest of `payload`
pub fn read_manifest(payload: &Path) -> Result<PackageInfo> {
    let path = manifest_path(payload);
    debug!("Reading package manifest: {}", path.display());

    let xml = fs::read_to_string(&path)?;
    parse_manifest(&xml, payload)
}

/// Write the sidecar manifest next to `info.path`
pub fn write_manifest(info: &PackageInfo) -> Result<PathBuf> {
    let path = manifest_path(&info.path);
    debug!("Writing package manifest: {}", path.display());

    fs::write(&path, to_xml(info)?)?;
    Ok(path)
}
