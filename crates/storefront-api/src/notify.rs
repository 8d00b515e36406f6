//! Outbound collaborators reached from the outbox: receipt email and
//! storefront cache revalidation. Both are opaque to this crate; the
//! implementations here either log or POST JSON to a configured webhook.

use anyhow::Result;
use serde_json::json;
use tracing::info;

use storefront_types::events::Receipt;

pub trait Mailer: Send + Sync + 'static {
    fn send_receipt(&self, receipt: &Receipt) -> impl Future<Output = Result<()>> + Send;
}

pub trait Revalidator: Send + Sync + 'static {
    fn revalidate(&self, path: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Writes receipts to the log instead of sending them.
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send_receipt(&self, receipt: &Receipt) -> Result<()> {
        info!(
            "Receipt for order {} ({:.2}) to {} <{}>",
            receipt.order_number, receipt.amount, receipt.name, receipt.to
        );
        Ok(())
    }
}

/// Hands receipts to an external mail service as JSON.
pub struct WebhookMailer {
    client: reqwest::Client,
    url: String,
}

impl WebhookMailer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Mailer for WebhookMailer {
    async fn send_receipt(&self, receipt: &Receipt) -> Result<()> {
        self.client
            .post(&self.url)
            .json(&json!({
                "template": "invoice",
                "to": receipt.to,
                "name": receipt.name,
                "order_number": receipt.order_number,
                "amount": receipt.amount,
                "created_at": receipt.created_at,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

pub enum MailTransport {
    Log(LogMailer),
    Webhook(WebhookMailer),
}

impl MailTransport {
    pub fn from_webhook(url: Option<String>) -> Self {
        match url {
            Some(url) => Self::Webhook(WebhookMailer::new(url)),
            None => Self::Log(LogMailer),
        }
    }
}

impl Mailer for MailTransport {
    async fn send_receipt(&self, receipt: &Receipt) -> Result<()> {
        match self {
            Self::Log(m) => m.send_receipt(receipt).await,
            Self::Webhook(m) => m.send_receipt(receipt).await,
        }
    }
}

pub struct LogRevalidator;

impl Revalidator for LogRevalidator {
    async fn revalidate(&self, path: &str) -> Result<()> {
        info!("Revalidate {}", path);
        Ok(())
    }
}

/// Asks the storefront front end to rebuild a cached path.
pub struct WebhookRevalidator {
    client: reqwest::Client,
    url: String,
}

impl WebhookRevalidator {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Revalidator for WebhookRevalidator {
    async fn revalidate(&self, path: &str) -> Result<()> {
        self.client
            .post(&self.url)
            .json(&json!({ "path": path }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

pub enum RevalidateTransport {
    Log(LogRevalidator),
    Webhook(WebhookRevalidator),
}

impl RevalidateTransport {
    pub fn from_webhook(url: Option<String>) -> Self {
        match url {
            Some(url) => Self::Webhook(WebhookRevalidator::new(url)),
            None => Self::Log(LogRevalidator),
        }
    }
}

impl Revalidator for RevalidateTransport {
    async fn revalidate(&self, path: &str) -> Result<()> {
        match self {
            Self::Log(r) => r.revalidate(path).await,
            Self::Webhook(r) => r.revalidate(path).await,
        }
    }
}
