use super::{json_pretty, open_target, write_atomic, EXIT_SUCCESS};
use rigger_core::{CoreError, ManifestGenerator};
use rigger_platform::Platform;
use rigger_schema::MANIFEST_FILE_NAME;
use std::path::Path;

pub fn run(
    state: Option<&Path>,
    cwd: &Path,
    apps: &[String],
    app_path: &str,
    output: Option<&Path>,
    force: bool,
    json: bool,
) -> Result<u8, String> {
    let dest = output.map_or_else(|| cwd.join(MANIFEST_FILE_NAME), Path::to_path_buf);
    if dest.exists() && !force {
        return Err(format!(
            "refusing to overwrite existing {} (pass --force)",
            dest.display()
        ));
    }

    let target = open_target(state)?;
    let generator = match target.target_base.as_deref() {
        Some(base) => ManifestGenerator::new(base),
        None => ManifestGenerator::for_platform(&target.platform).map_err(|e| e.to_string())?,
    };

    let mut live = Vec::with_capacity(apps.len());
    for name in apps {
        let app = target
            .platform
            .find_app(name)
            .map_err(|e| CoreError::from(e).to_string())?
            .ok_or_else(|| CoreError::AppNotFound(name.clone()).to_string())?;
        live.push(app);
    }

    let manifest = generator.manifest_for(live.iter().map(|app| (app, app_path)));
    let yaml = manifest
        .to_yaml()
        .map_err(|e| CoreError::from(e).to_string())?;
    write_atomic(&dest, &yaml)?;

    if json {
        let payload = serde_json::json!({
            "status": "written",
            "path": dest,
            "apps": apps,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "wrote {} with {} app(s)",
            dest.display(),
            manifest.applications.len()
        );
    }
    Ok(EXIT_SUCCESS)
}
