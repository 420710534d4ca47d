//! Platform access layer for Rigger.
//!
//! This crate defines the read-only model of live platform objects (`LiveApp`,
//! `ServiceInstance`, `ServicePlan`, `ServiceOffering`), the `Platform` trait
//! through which the reconciliation engine talks to a target, a JSON-backed
//! `SnapshotPlatform` implementation, and target configuration.

pub mod config;
pub mod model;
pub mod platform;
pub mod snapshot;

pub use config::PlatformConfig;
pub use model::{
    plans_for, Domain, LiveApp, Route, ServiceBinding, ServiceInstance, ServiceOffering,
    ServicePlan,
};
pub use platform::Platform;
pub use snapshot::{PlatformState, SnapshotPlatform};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("platform config error: {0}")]
    Config(String),
    #[error("platform state error: {0}")]
    State(String),
}
