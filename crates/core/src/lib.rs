//! Core library for the README card generator and the directory SSO service.
//!
//! The card side covers GitHub GraphQL access, contribution streaks, language
//! aggregation and SVG rendering. The auth side covers configuration and the
//! LDAP directory adapter used by the HTTP service.

pub mod cards_config;
pub mod config;
pub mod directory;
pub mod errors;
pub mod github;
pub mod nuspec;
pub mod render;
pub mod report;
pub mod stats;

// Re-exports for convenience.
pub use cards_config::CardsConfig;
pub use config::AuthConfig;
pub use directory::{DirectoryService, LdapDirectory};
pub use errors::CoreError;
pub use github::GitHubClient;
