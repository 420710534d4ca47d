use super::{anchor_identifiers, json_pretty, load_accessor, print_entries, EXIT_SUCCESS};
use rigger_core::Resolution;
use std::path::Path;

pub fn run(
    manifest: Option<&Path>,
    cwd: &Path,
    identifiers: &[String],
    json: bool,
) -> Result<u8, String> {
    let accessor = load_accessor(manifest, cwd)?;

    let resolution = if identifiers.is_empty() {
        Resolution {
            matched: accessor.all_apps(),
            unmatched: Vec::new(),
        }
    } else {
        accessor
            .apps_in_manifest(&anchor_identifiers(identifiers, cwd))
            .map_err(|e| e.to_string())?
    };

    if json {
        println!("{}", json_pretty(&resolution)?);
        return Ok(EXIT_SUCCESS);
    }

    if accessor.manifest().is_none() {
        println!("no manifest found");
    } else if resolution.matched.is_empty() {
        println!("no matching apps in manifest");
    } else {
        print_entries(&resolution.matched);
    }
    for name in &resolution.unmatched {
        println!("not in manifest: {name}");
    }
    Ok(EXIT_SUCCESS)
}
