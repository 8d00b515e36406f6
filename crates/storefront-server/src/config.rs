use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use storefront_api::outbox::OutboxConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub outbox: OutboxConfig,
    pub mail_webhook: Option<String>,
    pub revalidate_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = PathBuf::from(get("STOREFRONT_DB_PATH", "storefront.db"));
        let host = get("STOREFRONT_HOST", "0.0.0.0");
        let port: u16 = get("STOREFRONT_PORT", "3000")
            .parse()
            .context("STOREFRONT_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

        let interval_secs: u64 = get("STOREFRONT_OUTBOX_INTERVAL_SECS", "5")
            .parse()
            .context("STOREFRONT_OUTBOX_INTERVAL_SECS must be a whole number of seconds")?;
        let max_attempts: u32 = get("STOREFRONT_OUTBOX_MAX_ATTEMPTS", "5")
            .parse()
            .context("STOREFRONT_OUTBOX_MAX_ATTEMPTS must be a whole number")?;
        let retention_secs: u64 = get("STOREFRONT_OUTBOX_RETENTION_SECS", "86400")
            .parse()
            .context("STOREFRONT_OUTBOX_RETENTION_SECS must be a whole number of seconds")?;

        Ok(Self {
            db_path,
            addr,
            outbox: OutboxConfig {
                interval: Duration::from_secs(interval_secs.max(1)),
                max_attempts,
                retention: Duration::from_secs(retention_secs),
                ..OutboxConfig::default()
            },
            mail_webhook: optional("STOREFRONT_MAIL_WEBHOOK"),
            revalidate_url: optional("STOREFRONT_REVALIDATE_URL"),
        })
    }
}
