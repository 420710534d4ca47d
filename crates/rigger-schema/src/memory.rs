//! Memory size strings as they appear in manifests (`"256M"`, `"2G"`).

use crate::manifest::ManifestError;

const MB_PER_GB: u64 = 1024;

/// Render a megabyte count using the largest unit that divides it evenly.
///
/// `2048` becomes `"2G"`, `1536` stays `"1536M"`. Zero renders as `"0M"`.
pub fn format_memory(megabytes: u64) -> String {
    if megabytes != 0 && megabytes % MB_PER_GB == 0 {
        format!("{}G", megabytes / MB_PER_GB)
    } else {
        format!("{megabytes}M")
    }
}

/// Parse a manifest memory string into megabytes.
///
/// Accepts `M`, `MB`, `G` and `GB` suffixes in any case.
pub fn parse_memory(input: &str) -> Result<u64, ManifestError> {
    let invalid = || ManifestError::InvalidMemory(input.to_owned());

    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (digits, unit) = trimmed.split_at(split);
    if digits.is_empty() {
        return Err(invalid());
    }
    let value: u64 = digits.parse().map_err(|_| invalid())?;

    match unit.to_ascii_uppercase().as_str() {
        "M" | "MB" => Ok(value),
        "G" | "GB" => value.checked_mul(MB_PER_GB).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_gigabytes_use_g_suffix() {
        assert_eq!(format_memory(2048), "2G");
        assert_eq!(format_memory(1024), "1G");
    }

    #[test]
    fn fractional_gigabytes_stay_in_megabytes() {
        assert_eq!(format_memory(1536), "1536M");
        assert_eq!(format_memory(256), "256M");
        assert_eq!(format_memory(0), "0M");
    }

    #[test]
    fn parses_all_accepted_units() {
        assert_eq!(parse_memory("256M").unwrap(), 256);
        assert_eq!(parse_memory("256mb").unwrap(), 256);
        assert_eq!(parse_memory("2G").unwrap(), 2048);
        assert_eq!(parse_memory(" 1gb ").unwrap(), 1024);
    }

    #[test]
    fn formatted_values_parse_back() {
        for mb in [128, 1024, 1536, 4096] {
            assert_eq!(parse_memory(&format_memory(mb)).unwrap(), mb);
        }
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(parse_memory("").is_err());
        assert!(parse_memory("256").is_err());
        assert!(parse_memory("G").is_err());
        assert!(parse_memory("12T").is_err());
        assert!(parse_memory("1.5G").is_err());
    }
}
