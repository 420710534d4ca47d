//! Reconciliation engine for Rigger manifests.
//!
//! This crate holds the logic between a loaded manifest and a live target:
//! resolving user-given app identifiers against manifest entries (`resolve`),
//! projecting live apps back into manifest form (`ManifestGenerator`),
//! planning and executing service provisioning (`plan`, `execute`), scoping
//! entries to a working directory (`current_apps`), and the `ManifestAccessor`
//! that composes them over an optional manifest.

pub mod accessor;
pub mod generate;
pub mod matcher;
pub mod reconcile;
pub mod scope;

pub use accessor::ManifestAccessor;
pub use generate::{ManifestGenerator, NO_URL};
pub use matcher::{is_path_shaped, resolve, Resolution};
pub use reconcile::{execute, plan, plan_entry, ApplyReport, ReconciliationAction};
pub use scope::current_apps;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Path {0} is not present in manifest")]
    PathNotInManifest(String),
    #[error("unknown service offering '{label}'")]
    UnresolvedOffering { label: String },
    #[error("unknown plan '{plan}' for service offering '{label}'")]
    UnresolvedPlan { label: String, plan: String },
    #[error("service offering '{label}' is ambiguous: {count} offerings match, declare provider/version to narrow it")]
    AmbiguousOffering { label: String, count: usize },
    #[error("app not found on target: {0}")]
    AppNotFound(String),
    #[error("manifest error: {0}")]
    Manifest(#[from] rigger_schema::ManifestError),
    #[error("platform error: {0}")]
    Platform(#[from] rigger_platform::PlatformError),
}
