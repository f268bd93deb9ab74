//! Per-repository and aggregate language byte counts.
//!
//! Byte counts come from GitHub Linguist. Repositories are fed page by page
//! from a [`RepositorySource`]; excluded and archived repositories never touch
//! the totals.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use serde::ser::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::errors::GitHubError;

/// Bytes attributed to one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageBytes {
    pub name: String,
    pub bytes: u64,
}

impl LanguageBytes {
    pub fn new(name: impl Into<String>, bytes: u64) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// A repository as reported by the source, before filtering.
#[derive(Debug, Clone, Default)]
pub struct RepositoryLanguages {
    pub name: String,
    pub stars: u64,
    pub archived: bool,
    /// Language edges as returned; a language may repeat.
    pub languages: Vec<LanguageBytes>,
}

/// One page of repositories plus the cursor of the next page, if any.
#[derive(Debug, Clone, Default)]
pub struct RepositoryPage {
    pub repositories: Vec<RepositoryLanguages>,
    pub next_cursor: Option<String>,
}

/// Paginated supplier of repositories.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<RepositoryPage, GitHubError>;
}

/// Languages of one repository, largest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoLanguages(Vec<LanguageBytes>);

impl RepoLanguages {
    /// Sum repeated languages and order by bytes descending, then name.
    fn from_edges(edges: &[LanguageBytes]) -> Self {
        let mut merged: Vec<LanguageBytes> = Vec::new();
        for edge in edges {
            match merged.iter_mut().find(|l| l.name == edge.name) {
                Some(existing) => existing.bytes += edge.bytes,
                None => merged.push(edge.clone()),
            }
        }
        sort_ranked(&mut merged);
        Self(merged)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageBytes> {
        self.0.iter()
    }

    pub fn total_bytes(&self) -> u64 {
        self.0.iter().map(|l| l.bytes).sum()
    }

    pub fn get(&self, language: &str) -> Option<u64> {
        self.0.iter().find(|l| l.name == language).map(|l| l.bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for RepoLanguages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|l| (&l.name, l.bytes)))
    }
}

/// Per-repository breakdown in the order repositories were ingested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoLanguageBreakdown(Vec<(String, RepoLanguages)>);

impl RepoLanguageBreakdown {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RepoLanguages)> {
        self.0.iter().map(|(name, langs)| (name.as_str(), langs))
    }

    pub fn get(&self, repo: &str) -> Option<&RepoLanguages> {
        self.0
            .iter()
            .find(|(name, _)| name == repo)
            .map(|(_, langs)| langs)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Repositories ordered by total bytes, largest first, at most `limit`.
    pub fn top_by_total(&self, limit: usize) -> Vec<(&str, &RepoLanguages)> {
        let mut repos: Vec<(&str, &RepoLanguages)> = self.iter().collect();
        repos.sort_by(|a, b| b.1.total_bytes().cmp(&a.1.total_bytes()));
        repos.truncate(limit);
        repos
    }
}

impl Serialize for RepoLanguageBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(name, langs)| (name, langs)))
    }
}

/// Language totals across every ingested repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateLanguageTotals(HashMap<String, u64>);

impl AggregateLanguageTotals {
    pub fn get(&self, language: &str) -> Option<u64> {
        self.0.get(language).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Languages by bytes descending (ties by name), at most `limit`.
    pub fn ranked(&self, limit: usize) -> Vec<LanguageBytes> {
        let mut langs: Vec<LanguageBytes> = self
            .0
            .iter()
            .map(|(name, bytes)| LanguageBytes::new(name.clone(), *bytes))
            .collect();
        sort_ranked(&mut langs);
        langs.truncate(limit);
        langs
    }
}

fn sort_ranked(langs: &mut [LanguageBytes]) {
    langs.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.name.cmp(&b.name)));
}

/// Accumulates repositories into totals and a per-repository breakdown.
#[derive(Debug, Clone, Default)]
pub struct LanguageAggregator {
    excluded: BTreeSet<String>,
    totals: AggregateLanguageTotals,
    per_repo: RepoLanguageBreakdown,
    stars: u64,
}

impl LanguageAggregator {
    pub fn new(excluded: BTreeSet<String>) -> Self {
        Self {
            excluded,
            ..Self::default()
        }
    }

    /// Add one repository unless it is excluded by name or archived.
    ///
    /// Returns whether the repository was counted.
    pub fn ingest(&mut self, repo: &RepositoryLanguages) -> bool {
        if self.excluded.contains(&repo.name) {
            debug!(repo = %repo.name, "skipping excluded repository");
            return false;
        }
        if repo.archived {
            debug!(repo = %repo.name, "skipping archived repository");
            return false;
        }

        self.stars += repo.stars;
        for lang in &repo.languages {
            *self.totals.0.entry(lang.name.clone()).or_insert(0) += lang.bytes;
        }
        self.per_repo
            .0
            .push((repo.name.clone(), RepoLanguages::from_edges(&repo.languages)));
        true
    }

    pub fn ingest_page(&mut self, page: &RepositoryPage) {
        for repo in &page.repositories {
            self.ingest(repo);
        }
    }

    pub fn finish(self) -> LanguageReport {
        LanguageReport {
            excluded: self.excluded,
            totals: self.totals,
            per_repo: self.per_repo,
            stars: self.stars,
        }
    }
}

/// Result of aggregating every page of a source.
#[derive(Debug, Clone, Default)]
pub struct LanguageReport {
    pub excluded: BTreeSet<String>,
    pub totals: AggregateLanguageTotals,
    pub per_repo: RepoLanguageBreakdown,
    pub stars: u64,
}

/// Pull pages from `source` until it reports no further page.
pub async fn aggregate_all<S>(
    source: &S,
    excluded: BTreeSet<String>,
) -> Result<LanguageReport, GitHubError>
where
    S: RepositorySource + ?Sized,
{
    let mut aggregator = LanguageAggregator::new(excluded);
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = source.fetch_page(cursor.as_deref()).await?;
        pages += 1;
        aggregator.ingest_page(&page);

        match page.next_cursor {
            Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                warn!(cursor = %next, "source repeated its cursor, stopping pagination");
                break;
            }
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    let report = aggregator.finish();
    debug!(
        pages,
        repos = report.per_repo.len(),
        languages = report.totals.len(),
        "language aggregation complete"
    );
    Ok(report)
}
