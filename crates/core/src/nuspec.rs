//! Package version lookup from a NuGet `.nuspec` manifest.

use std::path::Path;

use regex_lite::Regex;
use tracing::debug;

/// Pull the `<version>` element out of nuspec XML text.
pub fn parse_nuspec_version(xml: &str) -> Option<String> {
    let re = Regex::new(r"(?i)<version>\s*([^<]+?)\s*</version>").ok()?;
    re.captures(xml)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|v| !v.is_empty())
}

/// Read the version from a nuspec file. A missing or unreadable file, or one
/// without a version element, yields `None`.
pub fn read_nuspec_version(path: &Path) -> Option<String> {
    if !path.is_file() {
        debug!(path = %path.display(), "no nuspec file");
        return None;
    }
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "failed to read nuspec");
            return None;
        }
    };
    parse_nuspec_version(&String::from_utf8_lossy(&bytes))
}
