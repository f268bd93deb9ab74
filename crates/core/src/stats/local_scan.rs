//! Optional estimate of language composition from a local checkout.
//!
//! Only covers the checked-out repository, not the whole account. Binary,
//! media and archive files are left out, as are VCS, tooling and build
//! directories.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".github",
    ".venv",
    "venv",
    "node_modules",
    "dist",
    "build",
    "bin",
    "obj",
    ".idea",
    ".vscode",
    "__pycache__",
    ".ruff_cache",
    ".mypy_cache",
];

const EXCLUDED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "ico", "svg", "mp4", "mov", "avi", "mkv", "mp3", "wav",
    "zip", "7z", "rar", "tar", "gz", "exe", "dll", "msi", "iso", "img", "bin", "pdf", "doc",
    "docx", "ppt", "pptx", "xls", "xlsx", "nupkg", "snupkg",
];

/// Language bytes found on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalScan {
    pub languages: BTreeMap<String, u64>,
    /// The size limit was hit and the walk stopped early.
    pub truncated: bool,
}

impl LocalScan {
    /// Languages by bytes descending.
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut langs: Vec<(&str, u64)> = self
            .languages
            .iter()
            .map(|(name, bytes)| (name.as_str(), *bytes))
            .collect();
        langs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        langs
    }
}

/// Map a lowercase extension to a language name.
pub fn language_for_extension(ext: &str) -> &'static str {
    match ext {
        "ps1" | "psm1" | "psd1" => "PowerShell",
        "vbs" => "VBScript",
        "hta" => "HTML/VBScript",
        "py" => "Python",
        "js" => "JavaScript",
        "ts" => "TypeScript",
        "json" => "JSON",
        "md" => "Markdown",
        "yml" | "yaml" => "YAML",
        "xml" | "nuspec" => "XML",
        "cs" => "C#",
        "cpp" => "C++",
        "c" => "C",
        "h" => "C/C++ Header",
        "html" => "HTML",
        "css" => "CSS",
        "sh" => "Shell",
        "bat" | "cmd" => "Batchfile",
        _ => "Other",
    }
}

fn is_excluded_dir(name: &str) -> bool {
    name.starts_with(".git") || EXCLUDED_DIRS.contains(&name)
}

/// Walk `root` and sum file sizes per language, stopping once the running
/// total exceeds `max_bytes`.
pub fn scan_language_bytes(root: &Path, max_bytes: u64) -> LocalScan {
    let mut scan = LocalScan::default();
    let mut total = 0u64;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !is_excluded_dir(&e.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let ext = entry
            .path()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if EXCLUDED_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(_) => continue,
        };

        total += size;
        if total > max_bytes {
            warn!(root = %root.display(), max_bytes, "local scan size limit reached, stopping");
            scan.truncated = true;
            return scan;
        }

        *scan
            .languages
            .entry(language_for_extension(&ext).to_string())
            .or_insert(0) += size;
    }

    debug!(root = %root.display(), bytes = total, languages = scan.languages.len(), "local scan complete");
    scan
}
