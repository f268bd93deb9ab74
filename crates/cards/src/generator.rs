//! One generator run: fetch from GitHub, compute, render and write.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use sysadmin_core::cards_config::{CardsConfig, LocalScanConfig};
use sysadmin_core::github::{GitHubClient, LatestRelease, UserStats};
use sysadmin_core::nuspec::read_nuspec_version;
use sysadmin_core::render::{render_card, render_language_bars, CardStyle};
use sysadmin_core::report::{self, OutputPaths, PerRepoReport};
use sysadmin_core::stats::{
    aggregate_all, scan_language_bytes, LanguageReport, LocalScan, StreakResult,
};

/// Languages shown on the top-languages card.
pub const TOP_LANGUAGES: usize = 8;

const STATS_FOOTER: &str = "Generated by GitHub Actions • GitHub API only";
const STREAK_FOOTER: &str = "Computed from GitHub contribution calendar (UTC, 1y)";
const NOT_AVAILABLE: &str = "n/a";

/// Everything fetched and computed before rendering.
#[derive(Debug, Clone)]
pub struct CardData {
    pub user: UserStats,
    pub streak: StreakResult,
    pub release: Option<LatestRelease>,
    pub nuspec_version: Option<String>,
    pub languages: LanguageReport,
    pub local_scan: Option<LocalScan>,
}

/// What [`write_outputs`] actually produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Written {
    pub markdown: bool,
    pub local_scan: bool,
}

/// Card generator bound to one configuration and output directory.
pub struct Generator {
    config: CardsConfig,
    client: GitHubClient,
    paths: OutputPaths,
    nuspec: PathBuf,
    style: CardStyle,
}

impl Generator {
    pub fn new(config: CardsConfig, out_dir: PathBuf, nuspec: PathBuf) -> Result<Self> {
        let client = GitHubClient::new(&config.graphql_url, &config.token)
            .context("failed to create GitHub client")?;
        Ok(Self {
            config,
            client,
            paths: OutputPaths::new(out_dir),
            nuspec,
            style: CardStyle::default(),
        })
    }

    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }

    /// Fetch, render and write every artifact.
    pub async fn run(&self) -> Result<Written> {
        std::fs::create_dir_all(&self.paths.dir).with_context(|| {
            format!("failed to create output directory {}", self.paths.dir.display())
        })?;

        let data = self.collect().await?;
        write_outputs(&self.paths, &data, Utc::now(), &self.style)
    }

    async fn collect(&self) -> Result<CardData> {
        let (user, calendar) = self.client.fetch_user(&self.config.username).await?;
        let streak = calendar.streak_utc();
        info!(
            login = %user.login,
            current = streak.current_streak,
            longest = streak.longest_streak,
            total = streak.total_contributions,
            "computed contribution streak"
        );

        let release = self.latest_release().await;
        let nuspec_version = read_nuspec_version(&self.nuspec);

        let source = self.client.owned_repositories(&self.config.username);
        let languages = aggregate_all(&source, self.config.exclude_repos.clone()).await?;
        info!(
            repos = languages.per_repo.len(),
            languages = languages.totals.len(),
            stars = languages.stars,
            "aggregated repository languages"
        );

        let local_scan = match &self.config.local_scan {
            Some(scan) => Some(run_local_scan(scan.clone()).await?),
            None => None,
        };

        Ok(CardData {
            user,
            streak,
            release,
            nuspec_version,
            languages,
            local_scan,
        })
    }

    /// The release lookup never fails the run.
    async fn latest_release(&self) -> Option<LatestRelease> {
        let repo = self.config.repository.as_ref()?;
        match self.client.latest_release(&repo.owner, &repo.name).await {
            Ok(release) => release,
            Err(e) => {
                warn!(owner = %repo.owner, name = %repo.name, error = %e, "release lookup failed");
                None
            }
        }
    }
}

async fn run_local_scan(scan: LocalScanConfig) -> Result<LocalScan> {
    let max_bytes = scan.max_bytes();
    let root = scan.root;
    let result = tokio::task::spawn_blocking(move || scan_language_bytes(&root, max_bytes))
        .await
        .context("local scan task failed")?;
    info!(
        languages = result.languages.len(),
        truncated = result.truncated,
        "local scan finished"
    );
    Ok(result)
}

/// Rows of the stats card.
pub fn stats_lines(data: &CardData) -> Vec<(String, String)> {
    let release = data
        .release
        .as_ref()
        .and_then(|r| r.tag.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let nuspec = data
        .nuspec_version
        .clone()
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    vec![
        ("User".into(), data.user.display_name().to_string()),
        ("Followers".into(), data.user.followers.to_string()),
        ("Owned repos".into(), data.user.owned_repos.to_string()),
        ("Total stars".into(), data.languages.stars.to_string()),
        (
            "Contributions (1y)".into(),
            data.streak.total_contributions.to_string(),
        ),
        ("Latest release".into(), release),
        ("NuGet nuspec".into(), nuspec),
    ]
}

/// Rows of the streak card.
pub fn streak_lines(streak: &StreakResult) -> Vec<(String, String)> {
    vec![
        (
            "Current streak".into(),
            format!("{} days", streak.current_streak),
        ),
        (
            "Longest streak".into(),
            format!("{} days", streak.longest_streak),
        ),
        (
            "Contributions (1y)".into(),
            streak.total_contributions.to_string(),
        ),
    ]
}

/// Render the cards and write every file into `paths`.
///
/// The Markdown summary is optional: a failure to write it is logged and
/// reported through [`Written::markdown`].
pub fn write_outputs(
    paths: &OutputPaths,
    data: &CardData,
    generated_at: DateTime<Utc>,
    style: &CardStyle,
) -> Result<Written> {
    report::write_release(&paths.release_json, data.release.as_ref())?;

    let per_repo = PerRepoReport::new(
        generated_at,
        &data.user.login,
        &data.languages,
        data.local_scan.as_ref(),
    );
    report::write_json(&paths.per_repo_json, &per_repo)?;
    let markdown = match report::write_text(&paths.per_repo_md, &per_repo.to_markdown()) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "skipping Markdown summary");
            false
        }
    };

    let stats_svg = render_card(
        "GitHub Stats",
        &stats_lines(data),
        Some(STATS_FOOTER),
        generated_at,
        style,
    );
    report::write_text(&paths.stats_svg, &stats_svg)?;

    let top = data.languages.totals.ranked(TOP_LANGUAGES);
    let languages_svg = render_language_bars("Top Languages", &top, generated_at, style);
    report::write_text(&paths.languages_svg, &languages_svg)?;

    let streak_svg = render_card(
        "Contribution Streak",
        &streak_lines(&data.streak),
        Some(STREAK_FOOTER),
        generated_at,
        style,
    );
    report::write_text(&paths.streak_svg, &streak_svg)?;

    Ok(Written {
        markdown,
        local_scan: data
            .local_scan
            .as_ref()
            .is_some_and(|scan| !scan.languages.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeSet;
    use sysadmin_core::stats::{LanguageAggregator, LanguageBytes, RepositoryLanguages};

    fn sample_data() -> CardData {
        let mut agg = LanguageAggregator::new(BTreeSet::from(["skip-me".to_string()]));
        for (name, stars, langs) in [
            ("tools", 3, vec![("PowerShell", 900), ("Python", 100)]),
            ("skip-me", 50, vec![("Go", 10_000)]),
            ("site", 2, vec![("HTML", 400)]),
        ] {
            agg.ingest(&RepositoryLanguages {
                name: name.into(),
                stars,
                archived: false,
                languages: langs
                    .into_iter()
                    .map(|(n, b)| LanguageBytes::new(n, b))
                    .collect(),
            });
        }

        CardData {
            user: UserStats {
                login: "octocat".into(),
                name: Some("The Octocat".into()),
                followers: 12,
                public_repos: 8,
                owned_repos: 9,
            },
            streak: StreakResult {
                current_streak: 3,
                longest_streak: 7,
                total_contributions: 321,
            },
            release: None,
            nuspec_version: Some("1.2.3".into()),
            languages: agg.finish(),
            local_scan: None,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_stats_lines() {
        let lines = stats_lines(&sample_data());
        let labels: Vec<&str> = lines.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "User",
                "Followers",
                "Owned repos",
                "Total stars",
                "Contributions (1y)",
                "Latest release",
                "NuGet nuspec"
            ]
        );
        assert_eq!(lines[0].1, "The Octocat");
        assert_eq!(lines[3].1, "5");
        assert_eq!(lines[5].1, "n/a");
        assert_eq!(lines[6].1, "1.2.3");
    }

    #[test]
    fn test_stats_lines_with_release() {
        let mut data = sample_data();
        data.release = Some(LatestRelease {
            tag: Some("v2.0.0".into()),
            published_at: None,
            url: None,
        });
        data.nuspec_version = None;
        let lines = stats_lines(&data);
        assert_eq!(lines[5].1, "v2.0.0");
        assert_eq!(lines[6].1, "n/a");
    }

    #[test]
    fn test_streak_lines() {
        let lines = streak_lines(&sample_data().streak);
        assert_eq!(lines[0], ("Current streak".to_string(), "3 days".to_string()));
        assert_eq!(lines[1], ("Longest streak".to_string(), "7 days".to_string()));
        assert_eq!(lines[2].1, "321");
    }

    #[test]
    fn test_write_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path());
        let written = write_outputs(&paths, &sample_data(), at(), &CardStyle::default()).unwrap();

        assert!(written.markdown);
        assert!(!written.local_scan);
        for path in [
            &paths.stats_svg,
            &paths.languages_svg,
            &paths.streak_svg,
            &paths.per_repo_json,
            &paths.per_repo_md,
            &paths.release_json,
        ] {
            assert!(path.is_file(), "missing {}", path.display());
        }

        let release: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.release_json).unwrap()).unwrap();
        assert!(release["tag"].is_null());

        let per_repo: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.per_repo_json).unwrap()).unwrap();
        assert_eq!(per_repo["user"], "octocat");
        assert_eq!(per_repo["excludedRepos"], serde_json::json!(["skip-me"]));
        assert!(per_repo["repos"].get("skip-me").is_none());

        let languages = std::fs::read_to_string(&paths.languages_svg).unwrap();
        assert!(languages.contains(">PowerShell</text>"));
        assert!(!languages.contains(">Go</text>"));

        let streak = std::fs::read_to_string(&paths.streak_svg).unwrap();
        assert!(streak.contains(STREAK_FOOTER));
    }

    #[test]
    fn test_write_outputs_reports_local_scan() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path());
        let mut data = sample_data();
        let mut scan = LocalScan::default();
        scan.languages.insert("PowerShell".into(), 2048);
        data.local_scan = Some(scan);

        let written = write_outputs(&paths, &data, at(), &CardStyle::default()).unwrap();
        assert!(written.local_scan);
        let per_repo = std::fs::read_to_string(&paths.per_repo_json).unwrap();
        assert!(per_repo.contains("\"localScan\""));
    }

    #[test]
    fn test_write_outputs_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path().join("does-not-exist"));
        assert!(write_outputs(&paths, &sample_data(), at(), &CardStyle::default()).is_err());
    }
}
