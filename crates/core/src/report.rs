//! JSON and Markdown summaries written next to the cards.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::errors::ReportError;
use crate::github::LatestRelease;
use crate::stats::{LanguageReport, LocalScan, RepoLanguageBreakdown};

pub const STATS_SVG: &str = "github-stats.svg";
pub const LANGUAGES_SVG: &str = "top-languages.svg";
pub const STREAK_SVG: &str = "streak.svg";
pub const PER_REPO_JSON: &str = "per-repo-languages.json";
pub const PER_REPO_MD: &str = "per-repo-languages.md";
pub const RELEASE_JSON: &str = "release-info.json";

/// Repositories listed in the Markdown summary.
pub const SUMMARY_REPOS: usize = 10;
/// Languages listed per repository in the Markdown summary.
pub const SUMMARY_LANGUAGES: usize = 5;

/// Locations of every generated artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub dir: PathBuf,
    pub stats_svg: PathBuf,
    pub languages_svg: PathBuf,
    pub streak_svg: PathBuf,
    pub per_repo_json: PathBuf,
    pub per_repo_md: PathBuf,
    pub release_json: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            stats_svg: dir.join(STATS_SVG),
            languages_svg: dir.join(LANGUAGES_SVG),
            streak_svg: dir.join(STREAK_SVG),
            per_repo_json: dir.join(PER_REPO_JSON),
            per_repo_md: dir.join(PER_REPO_MD),
            release_json: dir.join(RELEASE_JSON),
            dir,
        }
    }
}

/// Timestamp format used inside the JSON and Markdown reports.
pub fn format_report_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Contents of `per-repo-languages.json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerRepoReport<'a> {
    pub generated_at_utc: String,
    pub user: &'a str,
    pub method: &'static str,
    pub excluded_repos: Vec<&'a str>,
    pub repos: &'a RepoLanguageBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_scan: Option<&'a LocalScan>,
}

impl<'a> PerRepoReport<'a> {
    pub fn new(
        generated_at: DateTime<Utc>,
        user: &'a str,
        languages: &'a LanguageReport,
        local_scan: Option<&'a LocalScan>,
    ) -> Self {
        Self {
            generated_at_utc: format_report_timestamp(generated_at),
            user,
            method: "github-linguist-bytes",
            // BTreeSet iteration is already sorted.
            excluded_repos: languages.excluded.iter().map(String::as_str).collect(),
            repos: &languages.per_repo,
            local_scan,
        }
    }

    /// Markdown summary of the largest repositories.
    pub fn to_markdown(&self) -> String {
        let mut rows = vec![
            "# Per-repo Language Breakdown (GitHub Linguist)\n".to_string(),
            format!("- Generated (UTC): {}", self.generated_at_utc),
            format!("- User: {}", self.user),
            String::new(),
        ];

        for (name, langs) in self.repos.top_by_total(SUMMARY_REPOS) {
            let total = langs.total_bytes().max(1);
            rows.push(format!("## {name}"));
            for lang in langs.iter().take(SUMMARY_LANGUAGES) {
                let pct = lang.bytes as f64 / total as f64 * 100.0;
                rows.push(format!("- {}: {} bytes ({:.1}%)", lang.name, lang.bytes, pct));
            }
            rows.push(String::new());
        }

        rows.join("\n")
    }
}

/// Write `contents` to `path`.
pub fn write_text(path: &Path, contents: &str) -> Result<(), ReportError> {
    std::fs::write(path, contents).map_err(|source| ReportError::Write {
        path: path.display().to_string(),
        source,
    })?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote output file");
    Ok(())
}

/// Write `value` as pretty-printed JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(value)?;
    write_text(path, &json)
}

/// Write the release JSON; `None` is written as an all-null record.
pub fn write_release(path: &Path, release: Option<&LatestRelease>) -> Result<(), ReportError> {
    let fallback = LatestRelease::default();
    write_json(path, release.unwrap_or(&fallback))
}
