//! Error types for the sysadmin core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

// ---------------------------------------------------------------------------
// GitHub API errors
// ---------------------------------------------------------------------------

/// Errors from GitHub GraphQL API interactions.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// HTTP-level transport error (network, TLS, timeout).
    #[error("GitHub HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("GitHub API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// Authentication token is missing or invalid.
    #[error("GitHub authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded.
    #[error("GitHub rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    /// The response carried a GraphQL `errors` array.
    #[error("GraphQL returned errors:\n{0}")]
    GraphQl(String),

    /// The response had no `data` member (or it was null).
    #[error("GraphQL returned no data.")]
    EmptyData,

    /// A queried object (user, repository) does not exist.
    #[error("GitHub {entity} not found: {name}")]
    NotFound { entity: String, name: String },

    /// JSON deserialization failure.
    #[error("GitHub response parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("{var} is missing.")]
    EnvVarMissing { var: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Directory (LDAP) errors
// ---------------------------------------------------------------------------

/// Errors from the directory authentication adapter.
///
/// The variants are kept apart so callers can tell a retryable outage from a
/// rejected login or a request that can never succeed.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The directory could not be reached (connect, I/O, timeout).
    #[error("directory service unreachable: {0}")]
    Network(String),

    /// The bind was rejected for the supplied credentials.
    #[error("invalid credentials for '{0}'")]
    InvalidCredentials(String),

    /// The username or the resulting search filter is not acceptable.
    #[error("malformed directory query: {0}")]
    MalformedQuery(String),

    /// The server answered with a non-success result code.
    #[error("directory operation failed (rc {code}): {detail}")]
    Operation { code: u32, detail: String },

    /// The adapter itself is misconfigured (bad URL, service account rejected).
    #[error("directory configuration error: {0}")]
    Config(String),
}

impl DirectoryError {
    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

// ---------------------------------------------------------------------------
// Report / output errors
// ---------------------------------------------------------------------------

/// Errors from writing cards and summaries to disk.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Writing an output file failed.
    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Serializing a JSON report failed.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
