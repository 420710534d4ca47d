use crate::CoreError;
use rigger_schema::{AppEntry, Manifest};
use serde::Serialize;
use std::path::{Path, MAIN_SEPARATOR};
use tracing::debug;

/// Outcome of matching identifiers against a manifest.
///
/// Each identifier lands in exactly one half. A name contributes at most one
/// entry; a path contributes every entry located there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Entries found, in identifier order.
    pub matched: Vec<AppEntry>,
    /// Bare names with no entry; callers may look these up on the target.
    pub unmatched: Vec<String>,
}

/// Whether a user-given identifier denotes a filesystem location rather than
/// an app name.
pub fn is_path_shaped(identifier: &str) -> bool {
    identifier == "."
        || identifier == ".."
        || identifier.starts_with('~')
        || identifier.contains('/')
        || identifier.contains(MAIN_SEPARATOR)
        || Path::new(identifier).is_absolute()
}

/// Resolve identifiers against manifest entries, by name first and then by path.
///
/// A path matches all entries sharing it, in manifest order.
///
/// An unmatched bare name is reported in `unmatched`. An unmatched path fails
/// the whole call with [`CoreError::PathNotInManifest`].
pub fn resolve<S: AsRef<str>>(
    identifiers: &[S],
    manifest: &Manifest,
) -> Result<Resolution, CoreError> {
    let mut resolution = Resolution::default();

    for identifier in identifiers {
        let identifier = identifier.as_ref();
        let by_name = manifest
            .applications
            .iter()
            .find(|app| app.name == identifier);
        let found: Vec<&AppEntry> = match by_name {
            Some(app) => vec![app],
            None => manifest
                .applications
                .iter()
                .filter(|app| app.path == identifier)
                .collect(),
        };

        if found.is_empty() {
            if is_path_shaped(identifier) {
                return Err(CoreError::PathNotInManifest(identifier.to_owned()));
            }
            debug!("'{identifier}' not in manifest");
            resolution.unmatched.push(identifier.to_owned());
            continue;
        }
        for app in found {
            debug!("'{identifier}' matched manifest entry '{}'", app.name);
            resolution.matched.push(app.clone());
        }
    }

    Ok(resolution)
}
