//! LDAP / Active Directory implementation of [`DirectoryService`].
//!
//! Every call opens its own connection, binds, performs its operation and
//! unbinds. Connect and per-operation timeouts come from [`LdapConfig`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ldap3::{
    dn_escape, ldap_escape, Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry,
};
use tracing::{debug, info, instrument, warn};

use super::{validate_username, AuthenticatedUser, DirectoryService, DirectoryUser};
use crate::config::{BindStrategy, LdapConfig};
use crate::errors::DirectoryError;

/// `invalidCredentials`
const RC_INVALID_CREDENTIALS: u32 = 49;
/// `filterError` as reported by client-side filter checks.
const RC_FILTER_ERROR: u32 = 87;

const LOOKUP_ATTRS: [&str; 3] = ["cn", "mail", "memberOf"];
/// Request no attributes; only the DN is needed.
const NO_ATTRS: [&str; 1] = ["1.1"];

const MISSING_EMAIL: &str = "N/A";

/// Directory backed by an LDAP server.
#[derive(Clone)]
pub struct LdapDirectory {
    url: String,
    base_dn: String,
    bind_dn: Option<String>,
    bind_password: Option<String>,
    user_search_filter: String,
    strategy: BindStrategy,
    user_dn_template: Option<String>,
    upn_suffix: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for LdapDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapDirectory")
            .field("url", &self.url)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &self.bind_password.as_ref().map(|_| "[REDACTED]"))
            .field("strategy", &self.strategy)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl LdapDirectory {
    /// Build from validated configuration. No connection is made here.
    pub fn from_config(config: &LdapConfig) -> Result<Self, DirectoryError> {
        if config.bind_strategy == BindStrategy::Template && config.user_dn_template.is_none() {
            return Err(DirectoryError::Config(
                "template bind strategy requires user_dn_template".into(),
            ));
        }
        if config.bind_strategy == BindStrategy::Search && config.bind_dn.is_none() {
            return Err(DirectoryError::Config(
                "search bind strategy requires bind_dn".into(),
            ));
        }

        let directory = Self {
            url: config.url.clone(),
            base_dn: config.base_dn.clone(),
            bind_dn: config.bind_dn.clone(),
            bind_password: config.bind_password.clone(),
            user_search_filter: config.user_search_filter.clone(),
            strategy: config.bind_strategy,
            user_dn_template: config.user_dn_template.clone(),
            upn_suffix: config.upn_suffix.clone(),
            timeout: config.timeout(),
        };
        info!(
            url = %directory.url,
            base_dn = %directory.base_dn,
            strategy = ?directory.strategy,
            "created LdapDirectory"
        );
        Ok(directory)
    }

    async fn connect(&self) -> Result<Ldap, DirectoryError> {
        let settings = LdapConnSettings::new().set_conn_timeout(self.timeout);
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.url)
            .await
            .map_err(classify)?;
        ldap3::drive!(conn);
        debug!(url = %self.url, "connected to directory");
        Ok(ldap)
    }

    /// Bind as the service account, or stay anonymous when none is configured.
    async fn service_bind(&self, ldap: &mut Ldap) -> Result<(), DirectoryError> {
        let Some(bind_dn) = self.bind_dn.as_deref() else {
            debug!("no service account configured, using anonymous bind");
            return Ok(());
        };
        let password = self.bind_password.as_deref().unwrap_or_default();
        ldap.with_timeout(self.timeout)
            .simple_bind(bind_dn, password)
            .await
            .and_then(|r| r.success())
            .map_err(|e| match classify(e) {
                DirectoryError::InvalidCredentials(_) => {
                    DirectoryError::Config(format!("service account '{bind_dn}' was rejected"))
                }
                other => other,
            })?;
        Ok(())
    }

    /// DN of the first entry matching the search filter.
    async fn find_user_dn(
        &self,
        ldap: &mut Ldap,
        username: &str,
    ) -> Result<Option<String>, DirectoryError> {
        let filter = build_filter(&self.user_search_filter, username);
        let (entries, _) = ldap
            .with_timeout(self.timeout)
            .search(&self.base_dn, Scope::Subtree, &filter, NO_ATTRS.to_vec())
            .await
            .and_then(|r| r.success())
            .map_err(classify)?;
        Ok(entries
            .into_iter()
            .next()
            .map(|entry| SearchEntry::construct(entry).dn))
    }

    /// Identity to bind with for the configured strategy.
    async fn bind_identity(
        &self,
        ldap: &mut Ldap,
        username: &str,
    ) -> Result<String, DirectoryError> {
        match self.strategy {
            BindStrategy::Principal => Ok(principal_name(username, self.upn_suffix.as_deref())),
            BindStrategy::Template => {
                let template = self.user_dn_template.as_deref().ok_or_else(|| {
                    DirectoryError::Config("user_dn_template is not set".into())
                })?;
                Ok(template_dn(template, username))
            }
            BindStrategy::Search => {
                self.service_bind(ldap).await?;
                self.find_user_dn(ldap, username)
                    .await?
                    .ok_or_else(|| DirectoryError::InvalidCredentials(username.to_string()))
            }
        }
    }

    async fn authenticate_on(
        &self,
        ldap: &mut Ldap,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, DirectoryError> {
        let dn = self.bind_identity(ldap, username).await?;
        ldap.with_timeout(self.timeout)
            .simple_bind(&dn, password)
            .await
            .and_then(|r| r.success())
            .map_err(|e| match classify(e) {
                DirectoryError::InvalidCredentials(_) => {
                    DirectoryError::InvalidCredentials(username.to_string())
                }
                other => other,
            })?;
        Ok(AuthenticatedUser {
            username: username.to_string(),
            dn,
        })
    }

    async fn lookup_on(
        &self,
        ldap: &mut Ldap,
        username: &str,
    ) -> Result<Option<DirectoryUser>, DirectoryError> {
        self.service_bind(ldap).await?;
        let filter = build_filter(&self.user_search_filter, username);
        let (entries, _) = ldap
            .with_timeout(self.timeout)
            .search(&self.base_dn, Scope::Subtree, &filter, LOOKUP_ATTRS.to_vec())
            .await
            .and_then(|r| r.success())
            .map_err(classify)?;
        Ok(entries
            .into_iter()
            .next()
            .map(|entry| user_from_attrs(username, &SearchEntry::construct(entry).attrs)))
    }
}

#[async_trait]
impl DirectoryService for LdapDirectory {
    #[instrument(skip(self, password))]
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, DirectoryError> {
        validate_username(username)?;
        // A simple bind with an empty password succeeds anonymously on most servers.
        if password.is_empty() {
            return Err(DirectoryError::InvalidCredentials(username.to_string()));
        }

        let mut ldap = self.connect().await?;
        let result = self.authenticate_on(&mut ldap, username, password).await;
        if let Err(e) = ldap.unbind().await {
            debug!(error = %e, "unbind failed");
        }
        match &result {
            Ok(user) => info!(username, dn = %user.dn, "directory bind succeeded"),
            Err(e) => warn!(username, error = %e, "directory bind failed"),
        }
        result
    }

    #[instrument(skip(self))]
    async fn lookup(&self, username: &str) -> Result<Option<DirectoryUser>, DirectoryError> {
        validate_username(username)?;
        let mut ldap = self.connect().await?;
        let result = self.lookup_on(&mut ldap, username).await;
        if let Err(e) = ldap.unbind().await {
            debug!(error = %e, "unbind failed");
        }
        if let Ok(found) = &result {
            debug!(username, found = found.is_some(), "directory lookup finished");
        }
        result
    }
}

/// Substitute the escaped username into a search filter template.
pub fn build_filter(template: &str, username: &str) -> String {
    template.replace("{username}", &ldap_escape(username))
}

/// Substitute the escaped username into a DN template.
pub fn template_dn(template: &str, username: &str) -> String {
    template.replace("{username}", &dn_escape(username))
}

/// Logon name for a principal bind: `DOMAIN\user` and `user@realm` are used
/// as given, a bare name gets `@suffix` when a suffix is configured.
pub fn principal_name(username: &str, suffix: Option<&str>) -> String {
    if username.contains('\\') || username.contains('@') {
        return username.to_string();
    }
    match suffix.map(|s| s.trim_start_matches('@')).filter(|s| !s.is_empty()) {
        Some(suffix) => format!("{username}@{suffix}"),
        None => username.to_string(),
    }
}

/// Map an LDAP result code to an error kind.
pub fn classify_result_code(rc: u32, text: &str) -> DirectoryError {
    match rc {
        RC_INVALID_CREDENTIALS => DirectoryError::InvalidCredentials(text.to_string()),
        RC_FILTER_ERROR => DirectoryError::MalformedQuery(text.to_string()),
        code => DirectoryError::Operation {
            code,
            detail: text.to_string(),
        },
    }
}

fn classify(err: LdapError) -> DirectoryError {
    match err {
        LdapError::LdapResult { result } => classify_result_code(result.rc, &result.text),
        LdapError::FilterParsing => DirectoryError::MalformedQuery("invalid search filter".into()),
        e @ LdapError::UrlParsing { .. } => DirectoryError::Config(e.to_string()),
        other => DirectoryError::Network(other.to_string()),
    }
}

/// First value of `name`, matched case-insensitively.
fn first_attr<'a>(attrs: &'a HashMap<String, Vec<String>>, name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(String::as_str)
}

fn user_from_attrs(username: &str, attrs: &HashMap<String, Vec<String>>) -> DirectoryUser {
    let groups = attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("memberOf"))
        .map(|(_, values)| values.clone())
        .unwrap_or_default();
    DirectoryUser {
        username: username.to_string(),
        display_name: first_attr(attrs, "cn").unwrap_or(username).to_string(),
        email: first_attr(attrs, "mail").unwrap_or(MISSING_EMAIL).to_string(),
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(strategy: BindStrategy) -> LdapConfig {
        LdapConfig {
            url: "ldap://127.0.0.1:1".into(),
            base_dn: "dc=example,dc=com".into(),
            bind_dn: Some("cn=svc,dc=example,dc=com".into()),
            bind_password_env: None,
            user_search_filter: "(sAMAccountName={username})".into(),
            bind_strategy: strategy,
            user_dn_template: Some("CN={username},dc=example,dc=com".into()),
            upn_suffix: Some("example.com".into()),
            timeout_secs: 1,
            bind_password: Some("secret".into()),
        }
    }

    #[test]
    fn test_filter_escapes_username() {
        assert_eq!(
            build_filter("(sAMAccountName={username})", "jdoe"),
            "(sAMAccountName=jdoe)"
        );
        assert_eq!(
            build_filter("(uid={username})", "*)(uid=*"),
            r"(uid=\2a\29\28uid=\2a)"
        );
    }

    #[test]
    fn test_template_dn_escapes_username() {
        let template = "CN={username},dc=example,dc=com";
        assert_eq!(template_dn(template, "jdoe"), "CN=jdoe,dc=example,dc=com");
        let escaped = template_dn(template, "Doe, Jane");
        assert!(!escaped.starts_with("CN=Doe, Jane,"));
        assert!(escaped.ends_with(",dc=example,dc=com"));
    }

    #[test]
    fn test_principal_name() {
        assert_eq!(principal_name(r"CORP\jdoe", Some("corp.local")), r"CORP\jdoe");
        assert_eq!(principal_name("jdoe@corp.local", Some("other")), "jdoe@corp.local");
        assert_eq!(principal_name("jdoe", Some("corp.local")), "jdoe@corp.local");
        assert_eq!(principal_name("jdoe", Some("@corp.local")), "jdoe@corp.local");
        assert_eq!(principal_name("jdoe", None), "jdoe");
    }

    #[test]
    fn test_classify_result_codes() {
        assert!(matches!(
            classify_result_code(49, "80090308: LdapErr: DSID-0C09044E"),
            DirectoryError::InvalidCredentials(_)
        ));
        assert!(matches!(
            classify_result_code(87, "bad filter"),
            DirectoryError::MalformedQuery(_)
        ));
        assert!(matches!(
            classify_result_code(50, "insufficient access"),
            DirectoryError::Operation { code: 50, .. }
        ));
    }

    #[test]
    fn test_user_from_attrs_case_insensitive() {
        let mut attrs = HashMap::new();
        attrs.insert("CN".to_string(), vec!["Jane Doe".to_string()]);
        attrs.insert("memberof".to_string(), vec!["CN=Admins".into(), "CN=Users".into()]);
        let user = user_from_attrs("jdoe", &attrs);

        assert_eq!(user.display_name, "Jane Doe");
        assert_eq!(user.email, "N/A");
        assert_eq!(user.groups, vec!["CN=Admins", "CN=Users"]);
    }

    #[test]
    fn test_user_from_empty_attrs() {
        let user = user_from_attrs("jdoe", &HashMap::new());
        assert_eq!(user.display_name, "jdoe");
        assert!(user.groups.is_empty());
    }

    #[test]
    fn test_from_config_requirements() {
        let mut cfg = config(BindStrategy::Template);
        cfg.user_dn_template = None;
        assert!(matches!(
            LdapDirectory::from_config(&cfg),
            Err(DirectoryError::Config(_))
        ));

        let mut cfg = config(BindStrategy::Search);
        cfg.bind_dn = None;
        assert!(LdapDirectory::from_config(&cfg).is_err());

        let mut cfg = config(BindStrategy::Principal);
        cfg.bind_dn = None;
        assert!(LdapDirectory::from_config(&cfg).is_ok());
    }

    #[test]
    fn test_debug_redacts_password() {
        let dir = LdapDirectory::from_config(&config(BindStrategy::Search)).unwrap();
        let rendered = format!("{dir:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_empty_password_rejected_without_connecting() {
        let dir = LdapDirectory::from_config(&config(BindStrategy::Principal)).unwrap();
        let err = dir.authenticate("jdoe", "").await.unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidCredentials(_)));
    }

    #[tokio::test]
    async fn test_invalid_username_rejected() {
        let dir = LdapDirectory::from_config(&config(BindStrategy::Search)).unwrap();
        let err = dir.lookup("  ").await.unwrap_err();
        assert!(matches!(err, DirectoryError::MalformedQuery(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let dir = LdapDirectory::from_config(&config(BindStrategy::Principal)).unwrap();
        let err = dir.authenticate("jdoe", "pw").await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err}");
    }
}
