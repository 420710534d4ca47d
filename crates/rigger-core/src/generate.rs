use crate::CoreError;
use indexmap::IndexMap;
use rigger_platform::{LiveApp, Platform};
use rigger_schema::{
    format_memory, AppEntry, InstanceName, Manifest, ServiceEntryInfo, TARGET_BASE_PLACEHOLDER,
};

/// `url` value for an app without routes.
pub const NO_URL: &str = "none";

/// Projects live apps into manifest entries.
///
/// Routes on the target's base domain are written with the `${target-base}`
/// placeholder so the manifest can be pushed to another target.
#[derive(Debug, Clone)]
pub struct ManifestGenerator {
    target_base: String,
}

impl ManifestGenerator {
    pub fn new(target_base: impl Into<String>) -> Self {
        Self {
            target_base: target_base.into(),
        }
    }

    /// Generator for the base domain reported by `platform`.
    pub fn for_platform(platform: &dyn Platform) -> Result<Self, CoreError> {
        Ok(Self::new(platform.target_base()?))
    }

    pub fn target_base(&self) -> &str {
        &self.target_base
    }

    pub fn from_live_app(&self, app: &LiveApp, path: &str) -> AppEntry {
        AppEntry {
            name: app.name.clone(),
            path: path.to_owned(),
            memory: Some(format_memory(app.memory)),
            instances: Some(app.total_instances),
            url: Some(self.url_for(app)),
            command: non_empty(app.command.as_deref()),
            buildpack: non_empty(app.buildpack.as_deref()),
            services: services_for(app),
        }
    }

    /// Manifest holding one entry per `(app, path)` pair, in the given order.
    pub fn manifest_for<'a, I>(&self, apps: I) -> Manifest
    where
        I: IntoIterator<Item = (&'a LiveApp, &'a str)>,
    {
        Manifest::new(
            apps.into_iter()
                .map(|(app, path)| self.from_live_app(app, path))
                .collect(),
        )
    }

    fn url_for(&self, app: &LiveApp) -> String {
        let Some(route) = app.routes.first() else {
            return NO_URL.to_owned();
        };
        let domain = if route.domain.name == self.target_base {
            TARGET_BASE_PLACEHOLDER
        } else {
            route.domain.name.as_str()
        };
        if route.host.is_empty() {
            domain.to_owned()
        } else {
            format!("{}.{domain}", route.host)
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_owned)
}

fn services_for(app: &LiveApp) -> Option<IndexMap<InstanceName, ServiceEntryInfo>> {
    if app.service_bindings.is_empty() {
        return None;
    }

    let services = app
        .service_bindings
        .iter()
        .map(|binding| {
            let instance = &binding.service_instance;
            let plan = &instance.service_plan;
            let offering = &plan.offering;
            let info = ServiceEntryInfo {
                label: offering.label.clone(),
                plan: plan.name.clone(),
                provider: Some(offering.provider.clone()),
                version: Some(offering.version.clone()),
            };
            (instance.name.clone(), info)
        })
        .collect();
    Some(services)
}
