//! Read-only view of platform objects as observed on a target.

use rigger_schema::{AppName, Guid, InstanceName};
use serde::{Deserialize, Serialize};

/// A deployed application and the state the platform reports for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiveApp {
    pub guid: Guid,
    pub name: AppName,
    /// Memory per instance, in megabytes.
    pub memory: u64,
    pub total_instances: u32,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub buildpack: Option<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub service_bindings: Vec<ServiceBinding>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    pub host: String,
    pub domain: Domain,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
}

/// Reference from an app to a service instance it does not own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceBinding {
    pub guid: Guid,
    pub service_instance: ServiceInstance,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInstance {
    pub guid: Guid,
    pub name: InstanceName,
    pub service_plan: ServicePlan,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServicePlan {
    pub guid: Guid,
    pub name: String,
    pub offering: ServiceOffering,
}

/// A marketplace entry, identified for users by its label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceOffering {
    pub guid: Guid,
    pub label: String,
    pub provider: String,
    pub version: String,
}

impl LiveApp {
    /// Whether any of this app's bindings references the instance.
    pub fn is_bound_to(&self, instance: &ServiceInstance) -> bool {
        self.service_bindings
            .iter()
            .any(|b| b.service_instance.guid == instance.guid)
    }
}

impl Route {
    pub fn new(host: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            domain: Domain {
                name: domain.into(),
            },
        }
    }
}

/// Plans in `plans` that belong to `offering`, in catalog order.
pub fn plans_for<'a>(
    plans: &'a [ServicePlan],
    offering: &'a ServiceOffering,
) -> impl Iterator<Item = &'a ServicePlan> + 'a {
    plans.iter().filter(move |p| p.offering.guid == offering.guid)
}
