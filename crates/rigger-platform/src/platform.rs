use crate::model::{LiveApp, ServiceInstance, ServiceOffering, ServicePlan};
use crate::PlatformError;

/// Access to a deployment target.
///
/// Implementations own transport and authentication. Reconciliation code only
/// ever sees this trait, never a concrete client.
pub trait Platform: Send + Sync {
    /// Base domain of the target, e.g. `apps.example.com`.
    fn target_base(&self) -> Result<String, PlatformError>;

    fn list_apps(&self) -> Result<Vec<LiveApp>, PlatformError>;

    fn list_service_offerings(&self) -> Result<Vec<ServiceOffering>, PlatformError>;

    /// All plans in the marketplace; each references its offering.
    fn list_service_plans(&self) -> Result<Vec<ServicePlan>, PlatformError>;

    fn list_service_instances(&self) -> Result<Vec<ServiceInstance>, PlatformError>;

    fn create_service_instance(
        &self,
        name: &str,
        offering: &ServiceOffering,
        plan: &ServicePlan,
    ) -> Result<ServiceInstance, PlatformError>;

    fn bind_service(&self, app: &LiveApp, instance: &ServiceInstance)
        -> Result<(), PlatformError>;

    /// Look up a single app by exact name.
    fn find_app(&self, name: &str) -> Result<Option<LiveApp>, PlatformError> {
        Ok(self.list_apps()?.into_iter().find(|a| a.name == name))
    }
}
