//! Tracing setup: console output plus the optional authentication audit file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use sysadmin_auth_web::api::auth::AUDIT_TARGET;

/// Install the global subscriber.
///
/// Audit events bypass the console level filter so they reach the file even
/// when the console runs at `warn`. The returned guard flushes the audit
/// writer on drop and must live until shutdown.
pub fn init(log_level: &str, audit_log: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let console = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(filter);

    let (audit, guard) = match audit_log {
        Some(path) => {
            let (dir, file) = split_audit_path(path)?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create audit log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(&dir, file);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(filter_fn(|meta| meta.target() == AUDIT_TARGET));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(audit)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(guard)
}

/// Split the audit log path into its directory and file name.
fn split_audit_path(path: &Path) -> Result<(PathBuf, OsString)> {
    let file = path
        .file_name()
        .ok_or_else(|| anyhow!("audit log path '{}' has no file name", path.display()))?
        .to_os_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file))
}
