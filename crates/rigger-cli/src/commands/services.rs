use super::{
    anchor_identifiers, describe_action, json_pretty, load_accessor, open_target, spin_fail,
    spin_ok, spinner, EXIT_SUCCESS,
};
use rigger_core::{execute, plan_entry, ApplyReport, ReconciliationAction};
use rigger_platform::{Platform, PlatformError};
use rigger_schema::AppEntry;
use std::path::Path;
use tracing::warn;

pub fn run(
    manifest: Option<&Path>,
    state: Option<&Path>,
    cwd: &Path,
    identifiers: &[String],
    dry_run: bool,
    json: bool,
) -> Result<u8, String> {
    let accessor = load_accessor(manifest, cwd)?;
    if accessor.manifest().is_none() {
        return Err(format!(
            "manifest error: no manifest found at or above {}",
            cwd.display()
        ));
    }

    let entries: Vec<AppEntry> = if identifiers.is_empty() {
        let current = accessor.current_apps(&cwd.to_string_lossy());
        if current.is_empty() {
            accessor.all_apps()
        } else {
            current
        }
    } else {
        let resolution = accessor
            .apps_in_manifest(&anchor_identifiers(identifiers, cwd))
            .map_err(|e| e.to_string())?;
        if let Some(name) = resolution.unmatched.first() {
            return Err(format!("manifest error: app '{name}' is not in the manifest"));
        }
        resolution.matched
    };

    let target = open_target(state)?;

    // Plan everything before touching the target so resolution errors abort early.
    let mut planned = Vec::with_capacity(entries.len());
    for entry in &entries {
        planned.push(plan_entry(entry, &target.platform).map_err(|e| e.to_string())?);
    }

    if !json {
        for (app, actions) in &planned {
            println!("{}:", app.name);
            if actions.is_empty() {
                println!("  no services declared");
            }
            for action in actions {
                println!("  {}", describe_action(action));
            }
        }
    }

    let mut reports = Vec::new();
    let mutates = planned.iter().any(|(_, actions)| {
        actions
            .iter()
            .any(|a| !matches!(a, ReconciliationAction::Skip { .. }))
    });
    if !dry_run && mutates {
        let pb = if json {
            None
        } else {
            Some(spinner("provisioning services..."))
        };
        match provision(&target.platform, &entries, || {
            target.platform.save(&target.state_file)
        }) {
            Ok(done) => reports = done,
            Err(msg) => {
                if let Some(ref pb) = pb {
                    spin_fail(pb, "provisioning failed");
                }
                return Err(msg);
            }
        }
        if let Some(ref pb) = pb {
            spin_ok(pb, "services provisioned");
        }
    }

    if json {
        let payload = serde_json::json!({
            "dry_run": dry_run,
            "plans": planned
                .iter()
                .map(|(app, actions)| serde_json::json!({ "app": app.name, "actions": actions }))
                .collect::<Vec<_>>(),
            "reports": reports,
        });
        println!("{}", json_pretty(&payload)?);
    }
    Ok(EXIT_SUCCESS)
}

/// Reconcile `entries` in order, then `persist` the target.
///
/// Each entry is planned again right before it executes, so an instance that
/// an earlier entry created is bound rather than created twice. `persist`
/// also runs when an entry fails, keeping whatever already changed.
fn provision(
    platform: &dyn Platform,
    entries: &[AppEntry],
    persist: impl Fn() -> Result<(), PlatformError>,
) -> Result<Vec<ApplyReport>, String> {
    let mut reports = Vec::with_capacity(entries.len());
    for entry in entries {
        let outcome = plan_entry(entry, platform)
            .and_then(|(app, actions)| execute(platform, &app, &actions));
        match outcome {
            Ok(report) => reports.push(report),
            Err(e) => {
                return Err(match persist() {
                    Ok(()) => e.to_string(),
                    Err(save_err) => {
                        warn!("target state not saved after failed provisioning: {save_err}");
                        format!("{e} (target state not saved: {save_err})")
                    }
                });
            }
        }
    }
    persist().map_err(|e| format!("platform error: {e}"))?;
    Ok(reports)
}
