//! TOML-based configuration for the directory SSO service.
//!
//! Sensitive values (the service-account bind password) are stored as `_env`
//! fields that reference environment variable names. The actual secrets are
//! resolved at runtime via [`AuthConfig::resolve_env_vars`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level service configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HTTP listener and logging settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Directory server settings.
    pub ldap: LdapConfig,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (default `0.0.0.0:5000`).
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// File receiving the authentication audit trail. Disabled when unset.
    #[serde(default)]
    pub audit_log: Option<PathBuf>,
}

fn default_listen() -> String {
    "0.0.0.0:5000".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_level: default_log_level(),
            audit_log: None,
        }
    }
}

// ---------------------------------------------------------------------------
// LDAP
// ---------------------------------------------------------------------------

/// How a login's bind identity is derived from the submitted username.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BindStrategy {
    /// Bind as the service account, find the user's entry, re-bind as its DN.
    #[default]
    Search,
    /// Bind with the logon name itself (`DOMAIN\user` or `user@suffix`).
    Principal,
    /// Bind with a DN built from `user_dn_template`.
    Template,
}

/// Directory server connection and search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// Server URL (e.g. `ldap://dc01.example.com:3268`).
    pub url: String,

    /// Search base for user entries.
    pub base_dn: String,

    /// Service account DN used for lookups and search-then-bind.
    #[serde(default)]
    pub bind_dn: Option<String>,

    /// Environment variable holding the service account password.
    #[serde(default)]
    pub bind_password_env: Option<String>,

    /// Search filter; `{username}` is replaced by the escaped username.
    #[serde(default = "default_user_search_filter")]
    pub user_search_filter: String,

    /// How login binds are performed.
    #[serde(default)]
    pub bind_strategy: BindStrategy,

    /// DN template for [`BindStrategy::Template`], e.g. `CN={username},dc=example,dc=com`.
    #[serde(default)]
    pub user_dn_template: Option<String>,

    /// Suffix appended as `user@suffix` for [`BindStrategy::Principal`].
    #[serde(default)]
    pub upn_suffix: Option<String>,

    /// Connect and per-operation timeout in seconds (default 10).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Resolved service account password (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub bind_password: Option<String>,
}

fn default_user_search_filter() -> String {
    "(sAMAccountName={username})".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl LdapConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AuthConfig {
    /// Load an [`AuthConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AuthConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve all `*_env` fields from environment variables.
    ///
    /// A missing variable logs a warning but does not fail; lookups then fall
    /// back to an anonymous bind and `validate` decides what is required.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref env_name) = self.ldap.bind_password_env {
            self.ldap.bind_password = resolve_optional_env(env_name, "ldap.bind_password_env");
        }
        debug!("environment variable resolution complete");
        Ok(())
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ldap = &self.ldap;
        if !(ldap.url.starts_with("ldap://") || ldap.url.starts_with("ldaps://")) {
            return Err(ConfigError::InvalidValue {
                field: "ldap.url".into(),
                detail: "URL must start with ldap:// or ldaps://".into(),
            });
        }
        if ldap.base_dn.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ldap.base_dn".into(),
                detail: "base DN must not be empty".into(),
            });
        }
        if !ldap.user_search_filter.contains("{username}") {
            return Err(ConfigError::InvalidValue {
                field: "ldap.user_search_filter".into(),
                detail: "filter must contain the {username} placeholder".into(),
            });
        }
        if ldap.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ldap.timeout_secs".into(),
                detail: "timeout must be > 0".into(),
            });
        }

        match ldap.bind_strategy {
            BindStrategy::Template => {
                let ok = ldap
                    .user_dn_template
                    .as_deref()
                    .is_some_and(|t| t.contains("{username}"));
                if !ok {
                    return Err(ConfigError::InvalidValue {
                        field: "ldap.user_dn_template".into(),
                        detail: "template strategy needs a template containing {username}".into(),
                    });
                }
            }
            BindStrategy::Search => {
                if ldap.bind_dn.is_none() {
                    return Err(ConfigError::InvalidValue {
                        field: "ldap.bind_dn".into(),
                        detail: "search strategy needs a service account bind DN".into(),
                    });
                }
            }
            BindStrategy::Principal => {}
        }

        if self.server.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidValue {
                field: "server.listen".into(),
                detail: format!("'{}' is not a socket address", self.server.listen),
            });
        }

        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[server]
listen = "127.0.0.1:8080"
log_level = "debug"
audit_log = "/var/log/ad-sso/authentication.log"

[ldap]
url = "ldap://ldap.headq.scriptguy:3268"
base_dn = "dc=headq,dc=scriptguy"
bind_dn = "cn=ad-sso-authentication,ou=ServiceAccounts,dc=headq,dc=scriptguy"
bind_password_env = "LDAP_PASSWORD"
user_search_filter = "(sAMAccountName={username})"
bind_strategy = "search"
timeout_secs = 5
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: AuthConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.server.listen, "127.0.0.1:8080");
        assert_eq!(config.ldap.bind_strategy, BindStrategy::Search);
        assert_eq!(config.ldap.timeout(), Duration::from_secs(5));
        assert_eq!(
            config.server.audit_log.as_deref(),
            Some(Path::new("/var/log/ad-sso/authentication.log"))
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ad-sso.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = AuthConfig::load_from_file(&path).expect("load_from_file failed");
        assert_eq!(config.server.log_level, "debug");
    }

    #[test]
    fn test_file_not_found() {
        let result = AuthConfig::load_from_file("/nonexistent/ad-sso.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_defaults() {
        let minimal = r#"
[ldap]
url = "ldap://localhost"
base_dn = "dc=example,dc=com"
bind_strategy = "principal"
"#;
        let config: AuthConfig = toml::from_str(minimal).unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:5000");
        assert_eq!(config.server.log_level, "info");
        assert!(config.server.audit_log.is_none());
        assert_eq!(config.ldap.user_search_filter, "(sAMAccountName={username})");
        assert_eq!(config.ldap.timeout_secs, 10);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config: AuthConfig = toml::from_str(sample_toml()).unwrap();
        config.ldap.url = "http://ldap.example.com".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "ldap.url"
        ));
    }

    #[test]
    fn test_validate_template_needs_placeholder() {
        let mut config: AuthConfig = toml::from_str(sample_toml()).unwrap();
        config.ldap.bind_strategy = BindStrategy::Template;
        config.ldap.user_dn_template = Some("CN=fixed,dc=example".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "ldap.user_dn_template"
        ));

        config.ldap.user_dn_template = Some("CN={username},dc=HEADQ,dc=SCRIPTGUY".into());
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_search_needs_bind_dn() {
        let mut config: AuthConfig = toml::from_str(sample_toml()).unwrap();
        config.ldap.bind_dn = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "ldap.bind_dn"
        ));
    }

    #[test]
    fn test_resolve_env_vars() {
        std::env::set_var("TEST_SSO_LDAP_PW", "s3cret");

        let toml_str = r#"
[ldap]
url = "ldap://localhost"
base_dn = "dc=example,dc=com"
bind_dn = "cn=svc,dc=example,dc=com"
bind_password_env = "TEST_SSO_LDAP_PW"
"#;
        let mut config: AuthConfig = toml::from_str(toml_str).unwrap();
        config.resolve_env_vars().unwrap();
        assert_eq!(config.ldap.bind_password.as_deref(), Some("s3cret"));

        std::env::remove_var("TEST_SSO_LDAP_PW");
    }
}
