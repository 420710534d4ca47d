use super::{json_pretty, EXIT_SUCCESS};
use rigger_platform::{PlatformConfig, SnapshotPlatform};
use std::path::Path;

/// Point the CLI at a target state file, or show the current target.
pub fn run(
    cwd: &Path,
    state_file: Option<&Path>,
    target_base: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let config = match state_file {
        Some(state_file) => {
            let state_file = cwd.join(state_file);
            // Refuse to record a target that cannot be opened.
            SnapshotPlatform::load(&state_file).map_err(|e| format!("platform error: {e}"))?;
            let mut config = PlatformConfig::new(state_file);
            if let Some(base) = target_base {
                config = config.with_target_base(base);
            }
            config
                .save_default()
                .map_err(|e| format!("platform error: {e}"))?;
            config
        }
        None => PlatformConfig::load_default()
            .map_err(|e| format!("platform error: no target configured: {e}"))?,
    };

    if json {
        println!("{}", json_pretty(&config)?);
    } else {
        println!("state file:  {}", config.state_file.display());
        println!(
            "target base: {}",
            config.target_base.as_deref().unwrap_or("(from state)")
        );
    }
    Ok(EXIT_SUCCESS)
}
