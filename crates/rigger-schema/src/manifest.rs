use crate::memory::parse_memory;
use crate::symbols::expand_symbols;
use crate::types::{AppName, InstanceName};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// File name searched for when no manifest path is given.
pub const MANIFEST_FILE_NAME: &str = "manifest.yml";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("failed to serialize manifest: {0}")]
    SerializeYaml(String),
    #[error("application '{0}' is declared more than once")]
    DuplicateApp(String),
    #[error("application name must not be empty")]
    EmptyAppName,
    #[error("application '{0}' has an empty path")]
    EmptyPath(String),
    #[error("invalid memory value '{0}', expected e.g. '256M' or '2G'")]
    InvalidMemory(String),
    #[error("unknown manifest symbol '${{{0}}}'")]
    UnknownSymbol(String),
}

/// A multi-application deployment description.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub applications: Vec<AppEntry>,
}

/// One application in manifest form.
///
/// Optional fields are omitted from the serialized document when absent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppEntry {
    pub name: AppName,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buildpack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<IndexMap<InstanceName, ServiceEntryInfo>>,
}

/// Declared service intent, independent of whether an instance exists yet.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceEntryInfo {
    pub label: String,
    pub plan: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

fn default_path() -> String {
    ".".to_owned()
}

impl AppEntry {
    /// Minimal entry with only a name and a path.
    pub fn new(name: impl Into<AppName>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            memory: None,
            instances: None,
            url: None,
            command: None,
            buildpack: None,
            services: None,
        }
    }

    /// Declared services, or an empty mapping when the entry has none.
    pub fn declared_services(&self) -> IndexMap<InstanceName, ServiceEntryInfo> {
        self.services.clone().unwrap_or_default()
    }
}

impl ServiceEntryInfo {
    pub fn new(label: impl Into<String>, plan: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            plan: plan.into(),
            provider: None,
            version: None,
        }
    }
}

impl Manifest {
    pub fn new(applications: Vec<AppEntry>) -> Self {
        Self { applications }
    }

    /// Check entry-level invariants: non-empty unique names, non-empty paths,
    /// parseable memory, and only known `${...}` symbols in urls.
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut seen = HashSet::with_capacity(self.applications.len());
        for app in &self.applications {
            if app.name.trim().is_empty() {
                return Err(ManifestError::EmptyAppName);
            }
            if !seen.insert(app.name.as_str()) {
                return Err(ManifestError::DuplicateApp(app.name.to_string()));
            }
            if app.path.trim().is_empty() {
                return Err(ManifestError::EmptyPath(app.name.to_string()));
            }
            if let Some(memory) = &app.memory {
                parse_memory(memory)?;
            }
            if let Some(url) = &app.url {
                expand_symbols(url, "")?;
            }
        }
        Ok(())
    }

    /// Rewrite relative entry paths so they are rooted at `base_dir`.
    ///
    /// Purely lexical: `.` and `..` components are folded, nothing touches
    /// the filesystem.
    pub fn anchor_paths(&mut self, base_dir: &Path) {
        for app in &mut self.applications {
            app.path = anchor_path(base_dir, &app.path);
        }
    }

    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        serde_yaml::to_string(self).map_err(|e| ManifestError::SerializeYaml(e.to_string()))
    }
}

/// Root a relative `path` at `base_dir`, folding `.` and `..` lexically.
/// Absolute paths are returned unchanged.
pub fn anchor_path(base_dir: &Path, path: &str) -> String {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return path.to_owned();
    }

    let mut out = base_dir.to_path_buf();
    for component in candidate.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out.to_string_lossy().into_owned()
}

pub fn parse_manifest_str(input: &str) -> Result<Manifest, ManifestError> {
    let manifest: Manifest = serde_yaml::from_str(input)?;
    manifest.validate()?;
    Ok(manifest)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<Manifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}

/// Parse a manifest file and anchor its relative paths to the file's directory.
pub fn load_manifest_file(path: impl AsRef<Path>) -> Result<Manifest, ManifestError> {
    let path = path.as_ref();
    let mut manifest = parse_manifest_file(path)?;
    let base = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    manifest.anchor_paths(&base);
    Ok(manifest)
}

/// Walk up from `start_dir` and return the first `manifest.yml` found.
pub fn find_manifest(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(MANIFEST_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
applications:
  - name: web
    path: /srv/web
    memory: 512M
    instances: 2
    url: web.${target-base}
    command: bundle exec rackup
    buildpack: ruby_buildpack
    services:
      web-db:
        label: mysql
        plan: "100"
      web-cache:
        label: redis
        plan: small
        provider: core
  - name: worker
    path: /srv/worker
"#;

    #[test]
    fn parses_full_manifest() {
        let manifest = parse_manifest_str(FULL).expect("should parse");
        assert_eq!(manifest.applications.len(), 2);

        let web = &manifest.applications[0];
        assert_eq!(web.name, "web");
        assert_eq!(web.memory.as_deref(), Some("512M"));
        assert_eq!(web.instances, Some(2));
        assert_eq!(web.url.as_deref(), Some("web.${target-base}"));

        let services = web.services.as_ref().unwrap();
        let names: Vec<&str> = services.keys().map(InstanceName::as_str).collect();
        assert_eq!(names, vec!["web-db", "web-cache"]);
        assert_eq!(services["web-cache"].provider.as_deref(), Some("core"));
    }

    #[test]
    fn parses_minimal_entry() {
        let manifest = parse_manifest_str("applications:\n  - name: api\n").unwrap();
        let api = &manifest.applications[0];
        assert_eq!(api.path, ".");
        assert!(api.memory.is_none());
        assert!(api.services.is_none());
        assert!(api.declared_services().is_empty());
    }

    #[test]
    fn empty_document_has_no_applications() {
        let manifest = parse_manifest_str("applications: []\n").unwrap();
        assert!(manifest.applications.is_empty());
    }

    #[test]
    fn absent_fields_are_omitted_when_serialized() {
        let manifest = Manifest::new(vec![AppEntry::new("api", "/srv/api")]);
        let yaml = manifest.to_yaml().unwrap();
        assert!(yaml.contains("name: api"));
        assert!(yaml.contains("path: /srv/api"));
        for key in ["memory", "instances", "url", "command", "buildpack", "services"] {
            assert!(!yaml.contains(key), "'{key}' must be omitted: {yaml}");
        }
        assert!(!yaml.contains("null"));
    }

    #[test]
    fn serialized_manifest_parses_back() {
        let manifest = parse_manifest_str(FULL).unwrap();
        let yaml = manifest.to_yaml().unwrap();
        assert_eq!(parse_manifest_str(&yaml).unwrap(), manifest);
    }

    #[test]
    fn rejects_duplicate_names() {
        let input = "applications:\n  - name: a\n    path: /x\n  - name: a\n    path: /y\n";
        let err = parse_manifest_str(input).unwrap_err();
        assert!(matches!(err, ManifestError::DuplicateApp(ref n) if n == "a"));
    }

    #[test]
    fn rejects_bad_memory() {
        let input = "applications:\n  - name: a\n    memory: lots\n";
        assert!(matches!(
            parse_manifest_str(input),
            Err(ManifestError::InvalidMemory(_))
        ));
    }

    #[test]
    fn rejects_unknown_url_symbol() {
        let input = "applications:\n  - name: a\n    url: a.${random-word}\n";
        assert!(matches!(
            parse_manifest_str(input),
            Err(ManifestError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let input = "applications:\n  - name: a\n    colour: blue\n";
        assert!(parse_manifest_str(input).is_err());
    }

    #[test]
    fn rejects_service_without_plan() {
        let input = "applications:\n  - name: a\n    services:\n      db:\n        label: mysql\n";
        assert!(parse_manifest_str(input).is_err());
    }

    #[test]
    fn anchors_relative_paths() {
        let mut manifest = Manifest::new(vec![
            AppEntry::new("root", "."),
            AppEntry::new("sub", "./foo"),
            AppEntry::new("bare", "bar"),
            AppEntry::new("up", "../shared"),
            AppEntry::new("abs", "/elsewhere"),
        ]);
        manifest.anchor_paths(Path::new("/abc"));
        let paths: Vec<&str> = manifest
            .applications
            .iter()
            .map(|a| a.path.as_str())
            .collect();
        assert_eq!(paths, vec!["/abc", "/abc/foo", "/abc/bar", "/shared", "/elsewhere"]);
    }

    #[test]
    fn anchor_path_folds_dots_and_trailing_separator() {
        let base = Path::new("/proj/web");
        assert_eq!(anchor_path(base, "."), "/proj/web");
        assert_eq!(anchor_path(base, "./"), "/proj/web");
        assert_eq!(anchor_path(base, "../worker/"), "/proj/worker");
        assert_eq!(anchor_path(base, "/srv/app"), "/srv/app");
    }

    #[test]
    fn load_anchors_to_manifest_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE_NAME);
        fs::write(&path, "applications:\n  - name: foo\n    path: ./foo\n").unwrap();

        let manifest = load_manifest_file(&path).unwrap();
        let expected = dir.path().join("foo").to_string_lossy().into_owned();
        assert_eq!(manifest.applications[0].path, expected);
    }

    #[test]
    fn find_manifest_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("a").join(MANIFEST_FILE_NAME), "applications: []\n").unwrap();

        let found = find_manifest(&nested).unwrap();
        assert_eq!(found, dir.path().join("a").join(MANIFEST_FILE_NAME));
    }

    #[test]
    fn find_manifest_returns_none_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        // tempdir ancestors (/tmp, /) are not expected to hold a manifest.yml
        assert!(find_manifest(dir.path()).map_or(true, |p| !p.starts_with(dir.path())));
    }
}
