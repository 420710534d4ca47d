use crate::matcher::{resolve, Resolution};
use crate::scope;
use crate::CoreError;
use rigger_schema::{find_manifest, load_manifest_file, AppEntry, Manifest};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only view over an optional manifest.
///
/// A missing manifest is not an error: every query degrades to an empty result.
#[derive(Debug, Clone, Default)]
pub struct ManifestAccessor {
    manifest: Option<Manifest>,
    manifest_file: Option<PathBuf>,
}

impl ManifestAccessor {
    pub fn new(manifest: Option<Manifest>) -> Self {
        Self {
            manifest,
            manifest_file: None,
        }
    }

    /// Load the manifest at `path`, anchoring relative entry paths to its directory.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let manifest = load_manifest_file(path)?;
        debug!(
            "loaded {} application(s) from {}",
            manifest.applications.len(),
            path.display()
        );
        Ok(Self {
            manifest: Some(manifest),
            manifest_file: Some(path.to_path_buf()),
        })
    }

    /// Load the nearest `manifest.yml` at or above `start_dir`, if any.
    pub fn discover(start_dir: &Path) -> Result<Self, CoreError> {
        match find_manifest(start_dir) {
            Some(path) => Self::load(&path),
            None => {
                debug!("no manifest found above {}", start_dir.display());
                Ok(Self::default())
            }
        }
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    pub fn manifest_file(&self) -> Option<&Path> {
        self.manifest_file.as_deref()
    }

    pub fn all_apps(&self) -> Vec<AppEntry> {
        self.manifest
            .as_ref()
            .map(|m| m.applications.clone())
            .unwrap_or_default()
    }

    pub fn current_apps(&self, cwd: &str) -> Vec<AppEntry> {
        self.manifest
            .as_ref()
            .map(|m| scope::current_apps(m, cwd))
            .unwrap_or_default()
    }

    /// Manifest entries matching `identifiers`; empty when there is no manifest.
    pub fn find_apps<S: AsRef<str>>(&self, identifiers: &[S]) -> Result<Vec<AppEntry>, CoreError> {
        match &self.manifest {
            Some(manifest) => Ok(resolve(identifiers, manifest)?.matched),
            None => Ok(Vec::new()),
        }
    }

    /// Both halves of the resolution. Without a manifest nothing matches and
    /// every identifier is returned as unmatched.
    pub fn apps_in_manifest<S: AsRef<str>>(
        &self,
        identifiers: &[S],
    ) -> Result<Resolution, CoreError> {
        match &self.manifest {
            Some(manifest) => resolve(identifiers, manifest),
            None => Ok(Resolution {
                matched: Vec::new(),
                unmatched: identifiers.iter().map(|i| i.as_ref().to_owned()).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigger_schema::MANIFEST_FILE_NAME;

    fn applications() -> Vec<AppEntry> {
        vec![
            AppEntry::new("foo", "/abc"),
            AppEntry::new("bar", "/abc"),
            AppEntry::new("baz", "/abc/baz"),
        ]
    }

    fn accessor() -> ManifestAccessor {
        ManifestAccessor::new(Some(Manifest::new(applications())))
    }

    #[test]
    fn all_apps_returns_entries_unmodified() {
        assert_eq!(accessor().all_apps(), applications());
    }

    #[test]
    fn no_manifest_degrades_to_empty() {
        let empty = ManifestAccessor::default();
        assert!(empty.all_apps().is_empty());
        assert!(empty.current_apps("/abc").is_empty());
        assert!(empty.find_apps(&["foo", "/abc/xxx"]).unwrap().is_empty());
        let none: [&str; 0] = [];
        assert!(empty.find_apps(&none).unwrap().is_empty());
    }

    #[test]
    fn apps_in_manifest_without_manifest_reports_all_unmatched() {
        let r = ManifestAccessor::default()
            .apps_in_manifest(&["foo", "bar"])
            .unwrap();
        assert!(r.matched.is_empty());
        assert_eq!(r.unmatched, vec!["foo", "bar"]);
    }

    #[test]
    fn current_apps_uses_cwd() {
        let names: Vec<String> = accessor()
            .current_apps("/abc")
            .into_iter()
            .map(|a| a.name.into_inner())
            .collect();
        assert_eq!(names, vec!["foo", "bar"]);
    }

    #[test]
    fn find_apps_returns_matched_half_only() {
        let found = accessor().find_apps(&["baz", "unknown"]).unwrap();
        assert_eq!(found, vec![AppEntry::new("baz", "/abc/baz")]);
    }

    #[test]
    fn find_apps_propagates_missing_path() {
        assert!(matches!(
            accessor().find_apps(&["/abc/xxx"]),
            Err(CoreError::PathNotInManifest(_))
        ));
    }

    #[test]
    fn discover_loads_and_anchors() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("svc");
        std::fs::create_dir_all(&sub).unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE_NAME),
            "applications:\n  - name: root\n    path: .\n  - name: svc\n    path: svc\n",
        )
        .unwrap();

        let acc = ManifestAccessor::discover(&sub).unwrap();
        assert_eq!(
            acc.manifest_file(),
            Some(dir.path().join(MANIFEST_FILE_NAME).as_path())
        );
        let cwd = sub.to_string_lossy().into_owned();
        let names: Vec<String> = acc
            .current_apps(&cwd)
            .into_iter()
            .map(|a| a.name.into_inner())
            .collect();
        assert_eq!(names, vec!["svc"]);
    }

    #[test]
    fn load_surfaces_manifest_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE_NAME);
        std::fs::write(&path, "applications: [").unwrap();
        assert!(matches!(
            ManifestAccessor::load(&path),
            Err(CoreError::Manifest(_))
        ));
    }
}
