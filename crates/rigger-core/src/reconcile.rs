use crate::CoreError;
use indexmap::IndexMap;
use rigger_platform::{
    plans_for, LiveApp, Platform, ServiceInstance, ServiceOffering, ServicePlan,
};
use rigger_schema::{AppEntry, AppName, InstanceName, ServiceEntryInfo};
use serde::Serialize;
use tracing::{debug, info};

/// One provisioning step toward the declared service set.
///
/// `Create` implies binding the new instance to the app; a plan never holds
/// both a `Create` and a `Bind` for the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReconciliationAction {
    Create {
        name: InstanceName,
        offering: ServiceOffering,
        plan: ServicePlan,
    },
    Bind {
        app: AppName,
        instance: ServiceInstance,
    },
    Skip {
        name: InstanceName,
    },
}

impl ReconciliationAction {
    /// Declared instance name the action is about.
    pub fn instance_name(&self) -> &InstanceName {
        match self {
            Self::Create { name, .. } | Self::Skip { name } => name,
            Self::Bind { instance, .. } => &instance.name,
        }
    }
}

/// What `execute` did, per declared instance name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub app: String,
    pub created: Vec<InstanceName>,
    pub bound: Vec<InstanceName>,
    pub skipped: Vec<InstanceName>,
}

/// Offerings and plans, fetched at most once per plan call.
struct Marketplace {
    offerings: Vec<ServiceOffering>,
    plans: Vec<ServicePlan>,
}

impl Marketplace {
    fn fetch(catalog: &dyn Platform) -> Result<Self, CoreError> {
        Ok(Self {
            offerings: catalog.list_service_offerings()?,
            plans: catalog.list_service_plans()?,
        })
    }

    fn resolve(&self, info: &ServiceEntryInfo) -> Result<(ServiceOffering, ServicePlan), CoreError> {
        let candidates: Vec<&ServiceOffering> = self
            .offerings
            .iter()
            .filter(|o| o.label == info.label)
            .filter(|o| info.provider.as_ref().map_or(true, |p| *p == o.provider))
            .filter(|o| info.version.as_ref().map_or(true, |v| *v == o.version))
            .collect();

        let offering = match candidates.as_slice() {
            [] => {
                return Err(CoreError::UnresolvedOffering {
                    label: info.label.clone(),
                })
            }
            [only] => *only,
            many => {
                return Err(CoreError::AmbiguousOffering {
                    label: info.label.clone(),
                    count: many.len(),
                })
            }
        };

        let plan = plans_for(&self.plans, offering)
            .find(|p| p.name == info.plan)
            .ok_or_else(|| CoreError::UnresolvedPlan {
                label: info.label.clone(),
                plan: info.plan.clone(),
            })?;

        Ok((offering.clone(), plan.clone()))
    }
}

/// Compute the actions that bring `app`'s bindings in line with `declared`.
///
/// Nothing is queried when `declared` is empty. Instances are listed once;
/// the marketplace is listed only if some instance has to be created. Any
/// resolution failure aborts the whole plan.
pub fn plan(
    app: &LiveApp,
    declared: &IndexMap<InstanceName, ServiceEntryInfo>,
    catalog: &dyn Platform,
) -> Result<Vec<ReconciliationAction>, CoreError> {
    if declared.is_empty() {
        return Ok(Vec::new());
    }

    let instances = catalog.list_service_instances()?;
    let mut marketplace: Option<Marketplace> = None;
    let mut actions = Vec::with_capacity(declared.len());

    for (name, info) in declared {
        let action = match instances.iter().find(|i| i.name == *name) {
            Some(existing) if app.is_bound_to(existing) => {
                debug!("{name} already bound to {}", app.name);
                ReconciliationAction::Skip { name: name.clone() }
            }
            Some(existing) => {
                debug!("{name} exists, will bind to {}", app.name);
                ReconciliationAction::Bind {
                    app: app.name.clone(),
                    instance: existing.clone(),
                }
            }
            None => {
                let market = match marketplace.take() {
                    Some(m) => m,
                    None => Marketplace::fetch(catalog)?,
                };
                let resolved = market.resolve(info);
                marketplace = Some(market);
                let (offering, plan) = resolved?;
                debug!("{name} missing, will create {} / {}", offering.label, plan.name);
                ReconciliationAction::Create {
                    name: name.clone(),
                    offering,
                    plan,
                }
            }
        };
        actions.push(action);
    }

    Ok(actions)
}

/// Plan services for a manifest entry against the live app of the same name.
pub fn plan_entry(
    entry: &AppEntry,
    platform: &dyn Platform,
) -> Result<(LiveApp, Vec<ReconciliationAction>), CoreError> {
    let app = platform
        .find_app(&entry.name)?
        .ok_or_else(|| CoreError::AppNotFound(entry.name.to_string()))?;
    let actions = plan(&app, &entry.declared_services(), platform)?;
    Ok((app, actions))
}

/// Carry out `actions` in order. Stops at the first platform error.
pub fn execute(
    platform: &dyn Platform,
    app: &LiveApp,
    actions: &[ReconciliationAction],
) -> Result<ApplyReport, CoreError> {
    let mut report = ApplyReport {
        app: app.name.to_string(),
        ..ApplyReport::default()
    };

    for action in actions {
        match action {
            ReconciliationAction::Create {
                name,
                offering,
                plan,
            } => {
                info!("creating service {name} ({} / {})", offering.label, plan.name);
                let instance = platform.create_service_instance(name, offering, plan)?;
                platform.bind_service(app, &instance)?;
                report.created.push(name.clone());
            }
            ReconciliationAction::Bind { instance, .. } => {
                info!("binding {} to {}", instance.name, app.name);
                platform.bind_service(app, instance)?;
                report.bound.push(instance.name.clone());
            }
            ReconciliationAction::Skip { name } => {
                report.skipped.push(name.clone());
            }
        }
    }

    Ok(report)
}
