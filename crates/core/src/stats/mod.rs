//! Statistics computed from GitHub data: contribution streaks and language
//! byte totals, plus an optional scan of the local checkout.

pub mod languages;
pub mod local_scan;
pub mod streak;

pub use languages::{
    aggregate_all, AggregateLanguageTotals, LanguageAggregator, LanguageBytes, LanguageReport,
    RepoLanguageBreakdown, RepoLanguages, RepositoryLanguages, RepositoryPage, RepositorySource,
};
pub use local_scan::{scan_language_bytes, LocalScan};
pub use streak::{compute_streak, ContributionCalendar, ContributionDay, StreakResult};
