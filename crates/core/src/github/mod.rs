//! GitHub GraphQL access: user statistics, the contribution calendar,
//! repository languages and the latest release.

pub mod client;
pub mod models;

pub use client::{GitHubClient, OwnedRepositories};
pub use models::{LatestRelease, UserStats};
