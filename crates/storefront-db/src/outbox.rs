use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use rusqlite::Connection;
use tracing::debug;
use storefront_types::events::SideEffect;

use crate::models::OutboxRow;
use crate::{Database, format_timestamp};

/// Queue a side effect. Pass the transaction that carries the write the
/// effect belongs to, so both commit or neither does.
pub(crate) fn enqueue(conn: &Connection, effect: &SideEffect) -> Result<()> {
    let payload = serde_json::to_string(effect)?;
    conn.execute(
        "INSERT INTO outbox (kind, payload) VALUES (?1, ?2)",
        (effect.kind(), payload),
    )?;
    Ok(())
}

impl OutboxRow {
    pub fn effect(&self) -> Result<SideEffect> {
        serde_json::from_str(&self.payload)
            .with_context(|| format!("Undecodable outbox entry {} ({})", self.id, self.kind))
    }
}

impl Database {
    /// Oldest undelivered entries that have not used up their attempts.
    pub fn pending_outbox(&self, max_attempts: u32, limit: u32) -> Result<Vec<OutboxRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, kind, payload, attempts, last_error, created_at
                 FROM outbox
                 WHERE delivered_at IS NULL AND attempts < ?1
                 ORDER BY id ASC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![max_attempts, limit], |row| {
                    Ok(OutboxRow {
                        id: row.get(0)?,
                        kind: row.get(1)?,
                        payload: row.get(2)?,
                        attempts: row.get(3)?,
                        last_error: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn mark_outbox_delivered(&self, id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE outbox SET delivered_at = datetime('now'), attempts = attempts + 1, last_error = NULL
                 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    pub fn mark_outbox_failed(&self, id: i64, error: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE outbox SET attempts = attempts + 1, last_error = ?2 WHERE id = ?1",
                rusqlite::params![id, error],
            )?;
            Ok(())
        })
    }

    /// Delete entries delivered more than `older_than` ago. Undelivered
    /// entries, exhausted or not, are kept.
    pub fn prune_delivered_outbox(&self, older_than: Duration) -> Result<u64> {
        let Some(cutoff) = TimeDelta::from_std(older_than)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return Ok(0);
        };
        let cutoff = format_timestamp(cutoff);

        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM outbox WHERE delivered_at IS NOT NULL AND delivered_at <= ?1",
                [&cutoff],
            )?;
            if removed > 0 {
                debug!("Pruned {} delivered outbox entries (cutoff {})", removed, cutoff);
            }
            Ok(removed as u64)
        })
    }

    /// Undelivered entries, including those that exhausted their attempts.
    pub fn undelivered_outbox_count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM outbox WHERE delivered_at IS NULL",
                [],
                |r| r.get(0),
            )?)
        })
    }
}
