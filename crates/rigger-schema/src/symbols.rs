use crate::manifest::ManifestError;

/// Name of the symbol standing in for the target's base domain.
pub const TARGET_BASE_SYMBOL: &str = "target-base";

/// The placeholder as written in manifests.
pub const TARGET_BASE_PLACEHOLDER: &str = "${target-base}";

/// Substitute `${...}` symbols in a manifest value.
///
/// Only `${target-base}` is known. An unterminated `${` is kept verbatim.
pub fn expand_symbols(input: &str, target_base: &str) -> Result<String, ManifestError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let symbol = &after[..end];
        if symbol != TARGET_BASE_SYMBOL {
            return Err(ManifestError::UnknownSymbol(symbol.to_owned()));
        }
        out.push_str(target_base);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
