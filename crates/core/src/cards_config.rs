//! Environment-driven configuration for the README card generator.
//!
//! The generator runs inside CI, so everything comes from environment
//! variables. [`CardsConfig::from_lookup`] takes the lookup as a closure so
//! tests never touch the process environment.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::debug;

use crate::errors::ConfigError;

pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";
pub const DEFAULT_LOCAL_SCAN_MAX_MB: u64 = 250;

/// The repository the automation runs in, split from `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

/// Opt-in scan of the local checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalScanConfig {
    pub root: PathBuf,
    pub max_mb: u64,
}

impl LocalScanConfig {
    pub fn max_bytes(&self) -> u64 {
        self.max_mb.saturating_mul(1024 * 1024)
    }
}

/// Card generator settings.
#[derive(Debug, Clone)]
pub struct CardsConfig {
    pub token: String,
    pub username: String,
    pub graphql_url: String,
    /// `None` when `GITHUB_REPOSITORY` is unset or has no `/`; the release
    /// lookup is skipped in that case.
    pub repository: Option<RepositoryRef>,
    pub exclude_repos: BTreeSet<String>,
    pub local_scan: Option<LocalScanConfig>,
}

impl CardsConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &str| {
            lookup(var)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::EnvVarMissing { var: var.into() })
        };

        let token = required("GITHUB_TOKEN")?;
        let username = required("GITHUB_USERNAME")?;

        let graphql_url = lookup("GITHUB_GRAPHQL_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_GRAPHQL_URL.to_string());

        let repository = lookup("GITHUB_REPOSITORY")
            .as_deref()
            .and_then(parse_repository);

        let exclude_repos = parse_exclude_list(lookup("EXCLUDE_REPOS").as_deref().unwrap_or(""));

        let local_scan_enabled = lookup("LOCAL_SCAN")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let local_scan = if local_scan_enabled {
            let root = lookup("LOCAL_SCAN_ROOT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| ".".into());
            let max_mb = match lookup("LOCAL_SCAN_MAX_MB") {
                Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    field: "LOCAL_SCAN_MAX_MB".into(),
                    detail: format!("'{raw}' is not a whole number of megabytes"),
                })?,
                None => DEFAULT_LOCAL_SCAN_MAX_MB,
            };
            Some(LocalScanConfig {
                root: PathBuf::from(root),
                max_mb,
            })
        } else {
            None
        };

        debug!(
            username = %username,
            excluded = exclude_repos.len(),
            local_scan = local_scan.is_some(),
            "card generator configuration loaded"
        );

        Ok(Self {
            token,
            username,
            graphql_url,
            repository,
            exclude_repos,
            local_scan,
        })
    }
}

/// Split `owner/name`; anything without a slash or with an empty half is ignored.
fn parse_repository(raw: &str) -> Option<RepositoryRef> {
    let (owner, name) = raw.trim().split_once('/')?;
    if owner.is_empty() || name.is_empty() {
        return None;
    }
    Some(RepositoryRef {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

fn parse_exclude_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_environment() {
        let config = CardsConfig::from_lookup(lookup_from(&[
            ("GITHUB_TOKEN", "ghp_abc"),
            ("GITHUB_USERNAME", "octocat"),
        ]))
        .unwrap();
        assert_eq!(config.username, "octocat");
        assert_eq!(config.graphql_url, DEFAULT_GRAPHQL_URL);
        assert!(config.repository.is_none());
        assert!(config.exclude_repos.is_empty());
        assert!(config.local_scan.is_none());
    }

    #[test]
    fn test_missing_token_is_reported_first() {
        let err = CardsConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err.to_string(), "GITHUB_TOKEN is missing.");

        let err = CardsConfig::from_lookup(lookup_from(&[("GITHUB_TOKEN", "x")])).unwrap_err();
        assert_eq!(err.to_string(), "GITHUB_USERNAME is missing.");
    }

    #[test]
    fn test_empty_required_value_counts_as_missing() {
        let err = CardsConfig::from_lookup(lookup_from(&[
            ("GITHUB_TOKEN", ""),
            ("GITHUB_USERNAME", "octocat"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarMissing { ref var } if var == "GITHUB_TOKEN"));
    }

    #[test]
    fn test_exclude_list_is_trimmed() {
        let config = CardsConfig::from_lookup(lookup_from(&[
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_USERNAME", "u"),
            ("EXCLUDE_REPOS", " dotfiles, ,scratch ,"),
        ]))
        .unwrap();
        let names: Vec<&str> = config.exclude_repos.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["dotfiles", "scratch"]);
    }

    #[test]
    fn test_repository_parsing() {
        assert_eq!(
            parse_repository("acme/SysAdmin-Tools"),
            Some(RepositoryRef {
                owner: "acme".into(),
                name: "SysAdmin-Tools".into()
            })
        );
        assert_eq!(parse_repository("no-slash"), None);
        assert_eq!(parse_repository("/name"), None);
        assert_eq!(parse_repository(""), None);
    }

    #[test]
    fn test_local_scan_settings() {
        let config = CardsConfig::from_lookup(lookup_from(&[
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_USERNAME", "u"),
            ("LOCAL_SCAN", "TRUE"),
            ("LOCAL_SCAN_MAX_MB", "10"),
        ]))
        .unwrap();
        let scan = config.local_scan.unwrap();
        assert_eq!(scan.root, PathBuf::from("."));
        assert_eq!(scan.max_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_local_scan_rejects_bad_limit() {
        let err = CardsConfig::from_lookup(lookup_from(&[
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_USERNAME", "u"),
            ("LOCAL_SCAN", "true"),
            ("LOCAL_SCAN_MAX_MB", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_local_scan_disabled_ignores_limit() {
        let config = CardsConfig::from_lookup(lookup_from(&[
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_USERNAME", "u"),
            ("LOCAL_SCAN", "false"),
            ("LOCAL_SCAN_MAX_MB", "lots"),
        ]))
        .unwrap();
        assert!(config.local_scan.is_none());
    }
}
