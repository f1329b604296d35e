// src/compat/mod.rs

//! Host compatibility checking
//!
//! Decides whether a package built against a set of SDK markers can run in a
//! particular host build. Inputs are plain facts; nothing here touches
//! binaries or manifests.

pub mod facts;
pub mod rules;

pub use facts::{
    infer_platforms, Architecture, Bitness, Generation, HostDescriptor,
    PackageCompatibilityFacts, SdkMarkers, TargetPlatform,
};
pub use rules::{check_compatibility, evaluate_compatibility, is_compatible, Incompatibility};
