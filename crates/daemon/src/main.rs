//! Active Directory SSO service entry point.
//!
//! Loads configuration, sets up logging and the audit trail, connects the
//! HTTP API to the directory and serves until a shutdown signal arrives.

mod logging;
mod signals;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use sysadmin_auth_web::WebServer;
use sysadmin_core::config::AuthConfig;
use sysadmin_core::directory::LdapDirectory;

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// Directory-backed single sign-on service.
#[derive(Parser, Debug)]
#[command(
    name = "ad-sso-server",
    version,
    about = "Authenticate users against Active Directory / LDAP over HTTP"
)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Override the log level from the config file (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config =
        AuthConfig::load_and_resolve(&args.config).context("failed to load configuration")?;

    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.server.log_level);
    let _audit_guard = logging::init(log_level, config.server.audit_log.as_deref())?;

    // Startup banner
    info!("========================================");
    info!("  AD SSO Server v{}", env!("CARGO_PKG_VERSION"));
    info!("========================================");
    info!("Config file   : {}", args.config.display());
    info!("LDAP URL      : {}", config.ldap.url);
    info!("Base DN       : {}", config.ldap.base_dn);
    info!("Bind strategy : {:?}", config.ldap.bind_strategy);
    info!("Listen        : {}", config.server.listen);
    info!(
        "Audit log     : {}",
        config
            .server
            .audit_log
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "disabled".into())
    );
    info!("Log level     : {}", log_level);
    info!("========================================");

    let directory =
        LdapDirectory::from_config(&config.ldap).context("failed to initialize directory")?;
    let server = WebServer::new(Arc::new(directory));

    server
        .start(&config.server.listen, signals::wait_for_shutdown())
        .await
        .context("web server error")?;

    info!("AD SSO server stopped.");
    Ok(())
}
