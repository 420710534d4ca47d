use super::{json_pretty, load_accessor, print_entries, EXIT_SUCCESS};
use std::path::Path;

pub fn run(manifest: Option<&Path>, cwd: &Path, json: bool) -> Result<u8, String> {
    let accessor = load_accessor(manifest, cwd)?;
    let apps = accessor.current_apps(&cwd.to_string_lossy());

    if json {
        println!("{}", json_pretty(&apps)?);
    } else if apps.is_empty() {
        println!("no manifest apps in {}", cwd.display());
    } else {
        print_entries(&apps);
    }
    Ok(EXIT_SUCCESS)
}
