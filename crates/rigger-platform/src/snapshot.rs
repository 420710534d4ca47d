use crate::model::{LiveApp, ServiceBinding, ServiceInstance, ServiceOffering, ServicePlan};
use crate::platform::Platform;
use crate::PlatformError;
use rigger_schema::{Guid, InstanceName};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;
use tracing::debug;

/// Serializable picture of a target: apps, marketplace, and provisioned instances.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformState {
    pub target_base: String,
    #[serde(default)]
    pub apps: Vec<LiveApp>,
    #[serde(default)]
    pub service_offerings: Vec<ServiceOffering>,
    #[serde(default)]
    pub service_plans: Vec<ServicePlan>,
    #[serde(default)]
    pub service_instances: Vec<ServiceInstance>,
}

/// In-memory platform backed by a [`PlatformState`] document.
///
/// Mutations (`create_service_instance`, `bind_service`) update the held state;
/// `save` writes it back. Every trait call is recorded so callers can assert
/// which lookups happened.
pub struct SnapshotPlatform {
    state: Mutex<PlatformState>,
    calls: Mutex<Vec<String>>,
}

impl SnapshotPlatform {
    pub fn new(state: PlatformState) -> Self {
        Self {
            state: Mutex::new(state),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, PlatformError> {
        let content = std::fs::read_to_string(path)?;
        let state: PlatformState = serde_json::from_str(&content).map_err(|e| {
            PlatformError::Serialization(format!("invalid state file {}: {e}", path.display()))
        })?;
        debug!(
            "loaded platform state from {} ({} apps, {} instances)",
            path.display(),
            state.apps.len(),
            state.service_instances.len()
        );
        Ok(Self::new(state))
    }

    /// Atomically write the current state to `path`.
    pub fn save(&self, path: &Path) -> Result<(), PlatformError> {
        let content = serde_json::to_string_pretty(&*self.lock_state()?)
            .map_err(|e| PlatformError::Serialization(e.to_string()))?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| PlatformError::Io(e.error))?;
        Ok(())
    }

    /// Copy of the current state.
    pub fn state(&self) -> Result<PlatformState, PlatformError> {
        Ok(self.lock_state()?.clone())
    }

    /// Names of the trait methods invoked so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, PlatformState>, PlatformError> {
        self.state
            .lock()
            .map_err(|e| PlatformError::State(format!("mutex poisoned: {e}")))
    }

    fn record(&self, call: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.to_owned());
        }
    }
}

impl Platform for SnapshotPlatform {
    fn target_base(&self) -> Result<String, PlatformError> {
        self.record("target_base");
        Ok(self.lock_state()?.target_base.clone())
    }

    fn list_apps(&self) -> Result<Vec<LiveApp>, PlatformError> {
        self.record("list_apps");
        Ok(self.lock_state()?.apps.clone())
    }

    fn list_service_offerings(&self) -> Result<Vec<ServiceOffering>, PlatformError> {
        self.record("list_service_offerings");
        Ok(self.lock_state()?.service_offerings.clone())
    }

    fn list_service_plans(&self) -> Result<Vec<ServicePlan>, PlatformError> {
        self.record("list_service_plans");
        Ok(self.lock_state()?.service_plans.clone())
    }

    fn list_service_instances(&self) -> Result<Vec<ServiceInstance>, PlatformError> {
        self.record("list_service_instances");
        Ok(self.lock_state()?.service_instances.clone())
    }

    fn create_service_instance(
        &self,
        name: &str,
        offering: &ServiceOffering,
        plan: &ServicePlan,
    ) -> Result<ServiceInstance, PlatformError> {
        self.record("create_service_instance");
        let mut state = self.lock_state()?;

        if state.service_instances.iter().any(|i| i.name == name) {
            return Err(PlatformError::Conflict(format!(
                "service instance '{name}' already exists"
            )));
        }
        let Some(known_plan) = state
            .service_plans
            .iter()
            .find(|p| p.guid == plan.guid && p.offering.guid == offering.guid)
            .cloned()
        else {
            return Err(PlatformError::NotFound(format!(
                "plan '{}' of offering '{}'",
                plan.name, offering.label
            )));
        };

        let guid = next_guid(
            "si",
            state.service_instances.iter().map(|i| &i.guid).chain(
                state
                    .apps
                    .iter()
                    .flat_map(|a| &a.service_bindings)
                    .map(|b| &b.service_instance.guid),
            ),
        );
        let instance = ServiceInstance {
            guid,
            name: InstanceName::new(name),
            service_plan: known_plan,
        };
        debug!(
            "created service instance {} ({} / {})",
            instance.name, offering.label, instance.service_plan.name
        );
        state.service_instances.push(instance.clone());
        Ok(instance)
    }

    fn bind_service(
        &self,
        app: &LiveApp,
        instance: &ServiceInstance,
    ) -> Result<(), PlatformError> {
        self.record("bind_service");
        let mut state = self.lock_state()?;

        let Some(known) = state
            .service_instances
            .iter()
            .find(|i| i.guid == instance.guid)
            .cloned()
        else {
            return Err(PlatformError::NotFound(format!(
                "service instance '{}'",
                instance.name
            )));
        };
        let binding_guid = next_guid(
            "sb",
            state
                .apps
                .iter()
                .flat_map(|a| &a.service_bindings)
                .map(|b| &b.guid),
        );

        let Some(target) = state.apps.iter_mut().find(|a| a.guid == app.guid) else {
            return Err(PlatformError::NotFound(format!("app '{}'", app.name)));
        };
        if target.is_bound_to(&known) {
            return Err(PlatformError::Conflict(format!(
                "'{}' is already bound to '{}'",
                known.name, target.name
            )));
        }

        debug!("binding {} to {}", known.name, target.name);
        target.service_bindings.push(ServiceBinding {
            guid: binding_guid,
            service_instance: known,
        });
        Ok(())
    }
}

/// `<prefix>-NNNN`, numbered one past the highest guid already using `prefix`.
fn next_guid<'a>(prefix: &str, existing: impl Iterator<Item = &'a Guid>) -> Guid {
    let highest = existing
        .filter_map(|g| g.strip_prefix(prefix)?.strip_prefix('-')?.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    Guid::new(format!("{prefix}-{:04}", highest + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigger_schema::AppName;

    fn sample_state() -> PlatformState {
        let mysql = ServiceOffering {
            guid: Guid::new("o-mysql"),
            label: "mysql".to_owned(),
            provider: "core".to_owned(),
            version: "5.6".to_owned(),
        };
        let plan_100 = ServicePlan {
            guid: Guid::new("p-100"),
            name: "100".to_owned(),
            offering: mysql.clone(),
        };
        PlatformState {
            target_base: "some-cloud.com".to_owned(),
            apps: vec![LiveApp {
                guid: Guid::new("app-web"),
                name: AppName::new("web"),
                memory: 256,
                total_instances: 1,
                command: None,
                buildpack: None,
                routes: Vec::new(),
                service_bindings: Vec::new(),
            }],
            service_offerings: vec![mysql],
            service_plans: vec![plan_100],
            service_instances: Vec::new(),
        }
    }

    #[test]
    fn create_then_bind_updates_state() {
        let platform = SnapshotPlatform::new(sample_state());
        let state = platform.state().unwrap();
        let offering = &state.service_offerings[0];
        let plan = &state.service_plans[0];

        let instance = platform
            .create_service_instance("db", offering, plan)
            .unwrap();
        assert_eq!(instance.name, "db");
        assert_eq!(instance.service_plan.name, "100");

        let app = platform.find_app("web").unwrap().unwrap();
        platform.bind_service(&app, &instance).unwrap();

        let app = platform.find_app("web").unwrap().unwrap();
        assert!(app.is_bound_to(&instance));
        assert_eq!(platform.list_service_instances().unwrap().len(), 1);
    }

    #[test]
    fn new_guids_skip_past_gaps_in_loaded_state() {
        let mut state = sample_state();
        let plan = state.service_plans[0].clone();
        // One instance, numbered as if an earlier one had been deleted.
        let existing = ServiceInstance {
            guid: Guid::new("si-0002"),
            name: InstanceName::new("old-db"),
            service_plan: plan.clone(),
        };
        state.apps[0].service_bindings.push(ServiceBinding {
            guid: Guid::new("sb-0003"),
            service_instance: existing.clone(),
        });
        state.service_instances.push(existing.clone());
        let platform = SnapshotPlatform::new(state);

        let created = platform
            .create_service_instance("db", &plan.offering, &plan)
            .unwrap();
        assert_eq!(created.guid, "si-0003");
        assert!(!platform
            .find_app("web")
            .unwrap()
            .unwrap()
            .is_bound_to(&created));

        let app = platform.find_app("web").unwrap().unwrap();
        platform.bind_service(&app, &created).unwrap();
        let app = platform.find_app("web").unwrap().unwrap();
        let guids: Vec<&str> = app.service_bindings.iter().map(|b| b.guid.as_str()).collect();
        assert_eq!(guids, vec!["sb-0003", "sb-0004"]);
    }

    #[test]
    fn next_guid_ignores_foreign_prefixes() {
        let guids = [Guid::new("si-0007"), Guid::new("sb-0042"), Guid::new("si-x")];
        assert_eq!(next_guid("si", guids.iter()), "si-0008");
        assert_eq!(next_guid("sb", std::iter::empty()), "sb-0001");
    }

    #[test]
    fn duplicate_instance_name_conflicts() {
        let platform = SnapshotPlatform::new(sample_state());
        let state = platform.state().unwrap();
        let (offering, plan) = (&state.service_offerings[0], &state.service_plans[0]);

        platform.create_service_instance("db", offering, plan).unwrap();
        let err = platform
            .create_service_instance("db", offering, plan)
            .unwrap_err();
        assert!(matches!(err, PlatformError::Conflict(_)));
    }

    #[test]
    fn double_bind_conflicts() {
        let platform = SnapshotPlatform::new(sample_state());
        let state = platform.state().unwrap();
        let instance = platform
            .create_service_instance("db", &state.service_offerings[0], &state.service_plans[0])
            .unwrap();
        let app = platform.find_app("web").unwrap().unwrap();

        platform.bind_service(&app, &instance).unwrap();
        assert!(matches!(
            platform.bind_service(&app, &instance),
            Err(PlatformError::Conflict(_))
        ));
    }

    #[test]
    fn bind_unknown_app_is_not_found() {
        let platform = SnapshotPlatform::new(sample_state());
        let state = platform.state().unwrap();
        let instance = platform
            .create_service_instance("db", &state.service_offerings[0], &state.service_plans[0])
            .unwrap();
        let mut ghost = state.apps[0].clone();
        ghost.guid = Guid::new("app-ghost");

        assert!(matches!(
            platform.bind_service(&ghost, &instance),
            Err(PlatformError::NotFound(_))
        ));
    }

    #[test]
    fn calls_are_recorded_in_order() {
        let platform = SnapshotPlatform::new(sample_state());
        platform.list_apps().unwrap();
        platform.target_base().unwrap();
        assert_eq!(platform.calls(), vec!["list_apps", "target_base"]);
    }

    #[test]
    fn save_and_load_preserve_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("platform.json");

        let platform = SnapshotPlatform::new(sample_state());
        let state = platform.state().unwrap();
        platform
            .create_service_instance("db", &state.service_offerings[0], &state.service_plans[0])
            .unwrap();
        platform.save(&path).unwrap();

        let reloaded = SnapshotPlatform::load(&path).unwrap();
        assert_eq!(reloaded.state().unwrap(), platform.state().unwrap());
    }

    #[test]
    fn load_rejects_malformed_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("platform.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            SnapshotPlatform::load(&path),
            Err(PlatformError::Serialization(_))
        ));
    }
}
