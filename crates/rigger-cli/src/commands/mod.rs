pub mod apps;
pub mod completions;
pub mod current;
pub mod save;
pub mod services;
pub mod target;

use indicatif::{ProgressBar, ProgressStyle};
use rigger_core::{is_path_shaped, ManifestAccessor, ReconciliationAction};
use rigger_platform::{PlatformConfig, SnapshotPlatform};
use rigger_schema::{anchor_path, AppEntry};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_PLATFORM_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn describe_action(action: &ReconciliationAction) -> String {
    use console::Style;
    match action {
        ReconciliationAction::Create {
            name,
            offering,
            plan,
        } => format!(
            "{} {name} ({} / {})",
            Style::new().green().apply_to("create"),
            offering.label,
            plan.name
        ),
        ReconciliationAction::Bind { app, instance } => format!(
            "{} {} to {app}",
            Style::new().cyan().apply_to("bind"),
            instance.name
        ),
        ReconciliationAction::Skip { name } => format!(
            "{} {name} (already bound)",
            Style::new().dim().apply_to("skip")
        ),
    }
}

pub fn print_entries(entries: &[AppEntry]) {
    println!("{:<20} PATH", "NAME");
    for entry in entries {
        println!("{:<20} {}", entry.name, entry.path);
    }
}

/// Load the manifest given on the command line, or the nearest one above `cwd`.
pub fn load_accessor(manifest: Option<&Path>, cwd: &Path) -> Result<ManifestAccessor, String> {
    match manifest {
        Some(path) => ManifestAccessor::load(path),
        None => ManifestAccessor::discover(cwd),
    }
    .map_err(|e| e.to_string())
}

/// Make path-shaped identifiers absolute against `cwd` so they compare equal
/// to the anchored manifest paths. Bare names pass through untouched.
pub fn anchor_identifiers(identifiers: &[String], cwd: &Path) -> Vec<String> {
    identifiers
        .iter()
        .map(|id| {
            if !is_path_shaped(id) {
                return id.clone();
            }
            match home_relative(id) {
                Some((home, rest)) => anchor_path(&home, rest),
                None => anchor_path(cwd, id),
            }
        })
        .collect()
}

fn home_relative(path: &str) -> Option<(PathBuf, &str)> {
    let rest = if path == "~" {
        ""
    } else {
        path.strip_prefix("~/")?
    };
    let home = std::env::var("HOME").ok()?;
    Some((PathBuf::from(home), rest))
}

pub fn working_dir() -> Result<PathBuf, String> {
    std::env::current_dir().map_err(|e| format!("cannot determine working directory: {e}"))
}

/// A platform opened from its state file, plus where to write it back.
pub struct Target {
    pub platform: SnapshotPlatform,
    pub state_file: PathBuf,
    pub target_base: Option<String>,
}

pub fn open_target(state: Option<&Path>) -> Result<Target, String> {
    let config = if let Some(path) = state {
        PlatformConfig::new(path)
    } else {
        PlatformConfig::load_default()
            .map_err(|e| format!("no --state and no target config: {e}"))?
    };
    let platform = SnapshotPlatform::load(&config.state_file)
        .map_err(|e| format!("platform error: {e}"))?;
    Ok(Target {
        platform,
        state_file: config.state_file,
        target_base: config.target_base,
    })
}

pub fn write_atomic(dest: &Path, content: &str) -> Result<(), String> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| format!("write temp file: {e}"))?;
    use std::io::Write;
    tmp.write_all(content.as_bytes())
        .map_err(|e| format!("write temp file: {e}"))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| format!("fsync temp file: {e}"))?;
    tmp.persist(dest)
        .map_err(|e| format!("persist manifest: {}", e.error))?;
    Ok(())
}
