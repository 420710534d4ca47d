//! Manifest model, parsing, and value helpers for Rigger.
//!
//! This crate defines the schema layer: the YAML application manifest
//! (`Manifest`, `AppEntry`, `ServiceEntryInfo`), memory unit conversion
//! (`format_memory`, `parse_memory`), `${target-base}` symbol handling, and the
//! string newtypes shared with the platform model.

pub mod manifest;
pub mod memory;
pub mod symbols;
pub mod types;

pub use manifest::{
    anchor_path, find_manifest, load_manifest_file, parse_manifest_file, parse_manifest_str,
    AppEntry, Manifest, ManifestError, ServiceEntryInfo, MANIFEST_FILE_NAME,
};
pub use memory::{format_memory, parse_memory};
pub use symbols::{expand_symbols, TARGET_BASE_PLACEHOLDER, TARGET_BASE_SYMBOL};
pub use types::{AppName, Guid, InstanceName};
