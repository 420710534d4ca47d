use rigger_schema::{AppEntry, Manifest};

/// Entries whose path is exactly `cwd`, in manifest order.
///
/// Comparison is plain string equality; paths are expected to be anchored
/// already (see `rigger_schema::load_manifest_file`).
pub fn current_apps(manifest: &Manifest, cwd: &str) -> Vec<AppEntry> {
    manifest
        .applications
        .iter()
        .filter(|app| app.path == cwd)
        .cloned()
        .collect()
}
