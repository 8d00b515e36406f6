use std::time::Duration;

use tracing::{debug, info, warn};

use storefront_db::models::OutboxRow;
use storefront_types::events::SideEffect;

use crate::notify::{Mailer, Revalidator};
use crate::state::{AppState, with_db};

#[derive(Debug, Clone, Copy)]
pub struct OutboxConfig {
    pub interval: Duration,
    /// Entries that failed this many times are left for inspection.
    pub max_attempts: u32,
    pub batch_size: u32,
    /// Delivered entries older than this are deleted.
    pub retention: Duration,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 5,
            batch_size: 32,
            retention: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Background task that delivers queued side effects.
///
/// Runs on an interval, picks up undelivered outbox entries oldest first,
/// hands each to the mailer or revalidator and records the outcome, then
/// prunes delivered entries past the retention window.
pub async fn run_outbox_loop<M, R>(state: AppState, mailer: M, revalidator: R, config: OutboxConfig)
where
    M: Mailer,
    R: Revalidator,
{
    let mut interval = tokio::time::interval(config.interval);

    loop {
        interval.tick().await;

        match drain_outbox(&state, &mailer, &revalidator, &config).await {
            Ok(count) => {
                if count > 0 {
                    info!("Outbox: delivered {} side effects", count);
                }
            }
            Err(e) => {
                warn!("Outbox error: {}", e);
            }
        }

        match prune_outbox(&state, &config).await {
            Ok(count) => {
                if count > 0 {
                    info!("Outbox: pruned {} delivered entries", count);
                }
            }
            Err(e) => {
                warn!("Outbox prune error: {}", e);
            }
        }
    }
}

pub async fn prune_outbox(state: &AppState, config: &OutboxConfig) -> anyhow::Result<u64> {
    let retention = config.retention;
    Ok(with_db(state, move |db| db.prune_delivered_outbox(retention)).await?)
}

/// One delivery pass. Returns how many entries were delivered.
pub async fn drain_outbox<M, R>(
    state: &AppState,
    mailer: &M,
    revalidator: &R,
    config: &OutboxConfig,
) -> anyhow::Result<usize>
where
    M: Mailer,
    R: Revalidator,
{
    let max_attempts = config.max_attempts;
    let batch_size = config.batch_size;
    let pending = with_db(state, move |db| db.pending_outbox(max_attempts, batch_size)).await?;

    let mut delivered = 0;
    for entry in pending {
        let id = entry.id;
        match deliver(&entry, mailer, revalidator).await {
            Ok(()) => {
                with_db(state, move |db| db.mark_outbox_delivered(id)).await?;
                delivered += 1;
            }
            Err(e) => {
                let attempt = entry.attempts + 1;
                if attempt >= max_attempts {
                    warn!("Outbox entry {} ({}) gave up after {} attempts: {}", id, entry.kind, attempt, e);
                } else {
                    debug!("Outbox entry {} ({}) attempt {} failed: {}", id, entry.kind, attempt, e);
                }
                let message = e.to_string();
                with_db(state, move |db| db.mark_outbox_failed(id, &message)).await?;
            }
        }
    }

    Ok(delivered)
}

async fn deliver<M, R>(entry: &OutboxRow, mailer: &M, revalidator: &R) -> anyhow::Result<()>
where
    M: Mailer,
    R: Revalidator,
{
    match entry.effect()? {
        SideEffect::EmailReceipt(receipt) => mailer.send_receipt(&receipt).await,
        SideEffect::Revalidate { path } => revalidator.revalidate(&path).await,
    }
}
