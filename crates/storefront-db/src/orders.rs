use anyhow::{Result, anyhow};
use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params_from_iter};
use storefront_types::OrderStatus;
use storefront_types::api::OrderFilter;
use storefront_types::events::{Receipt, SideEffect};
use tracing::{debug, info};
use uuid::Uuid;

use crate::filter::WhereClause;
use crate::models::{OrderFields, OrderRow, OrderSearch, PurchaseOutcome, UpdateOutcome};
use crate::queries::{OptionalExt, insert_notification, query_user_by_id};
use crate::{Database, format_timestamp, outbox};

/// Admin listing page whose cache is rebuilt after every order write.
pub const ADMIN_ORDERS_PATH: &str = "/admin/orders";

const ORDER_SELECT: &str = "SELECT o.id, o.order_number, o.amount, o.status, o.created_at,
        o.is_component, o.is_bundle, o.is_pack, o.pack, o.address, o.phone, o.zip,
        o.payment_provider, o.user_id, u.name, u.email, u.avatar,
        o.component_id, c.name, c.slug
     FROM orders o
     LEFT JOIN users u ON u.id = o.user_id
     LEFT JOIN components c ON c.id = o.component_id";

// Stays well below SQLite's bound-parameter ceiling.
const DELETE_CHUNK: usize = 500;

// Search reaches into the buyer columns, so counts need the users join too.
const ORDER_COUNT: &str = "SELECT COUNT(*) FROM orders o LEFT JOIN users u ON u.id = o.user_id";

pub fn order_path(id: &str) -> String {
    format!("{}/{}", ADMIN_ORDERS_PATH, id)
}

/// `ORD-YYYYMMDD-XXXXXX` with six random upper-case alphanumerics.
pub fn generate_order_number(at: DateTime<Utc>) -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(6)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("ORD-{}-{}", at.format("%Y%m%d"), suffix)
}

impl Database {
    /// One page of orders matching `filter`, newest first, with the filtered
    /// and overall counts. All three reads run in one read transaction so
    /// they see the same snapshot.
    pub fn search_orders(&self, filter: &OrderFilter) -> Result<OrderSearch> {
        let clause = WhereClause::build(filter);

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            let sql = format!(
                "{}{} ORDER BY o.created_at DESC, o.rowid DESC LIMIT ? OFFSET ?",
                ORDER_SELECT, clause.sql
            );
            let mut page_params = clause.params.clone();
            page_params.push(Value::Integer(i64::from(filter.limit())));
            page_params.push(Value::Integer(i64::from(filter.offset())));

            let rows = {
                let mut stmt = tx.prepare(&sql)?;
                stmt.query_map(params_from_iter(page_params.iter()), order_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            };

            let filtered_total = count(
                &tx,
                &format!("{}{}", ORDER_COUNT, clause.sql),
                &clause.params,
            )?;
            let total = count(&tx, "SELECT COUNT(*) FROM orders", &[])?;
            tx.commit()?;

            debug!(
                "Order search: {} rows, {} filtered of {} total",
                rows.len(),
                filtered_total,
                total
            );
            Ok(OrderSearch {
                rows,
                filtered_total,
                total,
            })
        })
    }

    pub fn get_order(&self, id: &str) -> Result<Option<OrderRow>> {
        self.with_conn(|conn| query_order(conn, id))
    }

    pub fn count_orders_for_user(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            count(
                conn,
                "SELECT COUNT(*) FROM orders WHERE user_id = ?",
                &[Value::Text(user_id.to_string())],
            )
        })
    }

    pub fn total_spent_by_user(&self, user_id: &str) -> Result<f64> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COALESCE(SUM(amount), 0.0) FROM orders WHERE user_id = ?1",
                [user_id],
                |r| r.get(0),
            )?)
        })
    }

    /// Record a purchase. The order row, the buyer's purchased flag, the
    /// notification and the queued receipt and revalidation commit together.
    pub fn record_purchase(
        &self,
        fields: &OrderFields,
        status: OrderStatus,
        created_at: DateTime<Utc>,
    ) -> Result<PurchaseOutcome> {
        let created_at = created_at.trunc_subsecs(0);

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(buyer) = query_user_by_id(&tx, &fields.user_id)? else {
                return Ok(PurchaseOutcome::UnknownUser);
            };
            if let Some(component_id) = &fields.component_id {
                if !component_exists(&tx, component_id)? {
                    return Ok(PurchaseOutcome::UnknownComponent);
                }
            }

            let id = Uuid::new_v4().to_string();
            let order_number = generate_order_number(created_at);
            let (is_component, is_bundle, is_pack) = fields.order_type.flags();

            tx.execute(
                "INSERT INTO orders (id, order_number, amount, status, created_at,
                    is_component, is_bundle, is_pack, pack, address, phone, zip,
                    payment_provider, user_id, component_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                rusqlite::params![
                    id,
                    order_number,
                    fields.amount,
                    status.as_str(),
                    format_timestamp(created_at),
                    is_component,
                    is_bundle,
                    is_pack,
                    fields.pack,
                    fields.address,
                    fields.phone,
                    fields.zip,
                    fields.payment_provider,
                    fields.user_id,
                    fields.component_id,
                ],
            )?;

            tx.execute(
                "UPDATE users SET has_purchased = 1 WHERE id = ?1",
                [&fields.user_id],
            )?;

            insert_notification(
                &tx,
                &fields.user_id,
                &format!("Your order {} has been placed.", order_number),
            )?;

            outbox::enqueue(
                &tx,
                &SideEffect::EmailReceipt(Receipt {
                    to: buyer.email,
                    name: buyer.name,
                    order_number: order_number.clone(),
                    amount: fields.amount,
                    created_at,
                }),
            )?;
            outbox::enqueue(
                &tx,
                &SideEffect::Revalidate {
                    path: ADMIN_ORDERS_PATH.to_string(),
                },
            )?;

            let row = query_order(&tx, &id)?
                .ok_or_else(|| anyhow!("Order {} missing after insert", id))?;
            tx.commit()?;

            info!("Recorded purchase {} for user {}", order_number, fields.user_id);
            Ok(PurchaseOutcome::Recorded(row))
        })
    }

    /// Set the status and notify the buyer. Returns false when no order has
    /// this id. Any transition is accepted.
    pub fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<(String, String)> = tx
                .query_row(
                    "SELECT order_number, user_id FROM orders WHERE id = ?1",
                    [id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((order_number, user_id)) = existing else {
                return Ok(false);
            };

            tx.execute(
                "UPDATE orders SET status = ?2 WHERE id = ?1",
                (id, status.as_str()),
            )?;

            insert_notification(
                &tx,
                &user_id,
                &format!(
                    "Your order {} status has been updated to {}.",
                    order_number, status
                ),
            )?;
            enqueue_revalidation(&tx, id)?;
            tx.commit()?;

            info!("Order {} status set to {}", order_number, status);
            Ok(true)
        })
    }

    /// Overwrite the editable columns. No notification is written.
    pub fn update_order(&self, id: &str, fields: &OrderFields) -> Result<UpdateOutcome> {
        let (is_component, is_bundle, is_pack) = fields.order_type.flags();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_user_by_id(&tx, &fields.user_id)?.is_none() {
                return Ok(UpdateOutcome::UnknownUser);
            }
            if let Some(component_id) = &fields.component_id {
                if !component_exists(&tx, component_id)? {
                    return Ok(UpdateOutcome::UnknownComponent);
                }
            }

            let changed = tx.execute(
                "UPDATE orders SET
                    user_id = ?2, component_id = ?3,
                    is_component = ?4, is_bundle = ?5, is_pack = ?6,
                    pack = ?7, amount = ?8, address = ?9, phone = ?10, zip = ?11,
                    payment_provider = ?12
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    fields.user_id,
                    fields.component_id,
                    is_component,
                    is_bundle,
                    is_pack,
                    fields.pack,
                    fields.amount,
                    fields.address,
                    fields.phone,
                    fields.zip,
                    fields.payment_provider,
                ],
            )?;
            if changed == 0 {
                return Ok(UpdateOutcome::NotFound);
            }

            enqueue_revalidation(&tx, id)?;
            tx.commit()?;
            Ok(UpdateOutcome::Updated)
        })
    }

    /// Returns false when no order has this id.
    pub fn delete_order(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute("DELETE FROM orders WHERE id = ?1", [id])?;
            if removed == 0 {
                return Ok(false);
            }

            enqueue_revalidation(&tx, id)?;
            tx.commit()?;
            Ok(true)
        })
    }

    /// Delete every listed order that exists; unknown ids are ignored.
    /// Returns the number of rows removed.
    pub fn delete_orders(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut removed = 0;
            for chunk in ids.chunks(DELETE_CHUNK) {
                let placeholders: Vec<String> =
                    (1..=chunk.len()).map(|i| format!("?{}", i)).collect();
                let sql = format!(
                    "DELETE FROM orders WHERE id IN ({})",
                    placeholders.join(", ")
                );
                removed += tx.execute(&sql, params_from_iter(chunk.iter()))?;
            }

            if removed > 0 {
                outbox::enqueue(
                    &tx,
                    &SideEffect::Revalidate {
                        path: ADMIN_ORDERS_PATH.to_string(),
                    },
                )?;
            }
            tx.commit()?;

            info!("Bulk delete removed {} of {} orders", removed, ids.len());
            Ok(removed as u64)
        })
    }
}

fn enqueue_revalidation(conn: &Connection, id: &str) -> Result<()> {
    outbox::enqueue(
        conn,
        &SideEffect::Revalidate {
            path: ADMIN_ORDERS_PATH.to_string(),
        },
    )?;
    outbox::enqueue(conn, &SideEffect::Revalidate { path: order_path(id) })
}

fn component_exists(conn: &Connection, id: &str) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM components WHERE id = ?1)",
        [id],
        |r| r.get(0),
    )?)
}

fn count(conn: &Connection, sql: &str, params: &[Value]) -> Result<u64> {
    let n: i64 = conn.query_row(sql, params_from_iter(params.iter()), |r| r.get(0))?;
    Ok(n.max(0) as u64)
}

fn query_order(conn: &Connection, id: &str) -> Result<Option<OrderRow>> {
    let sql = format!("{} WHERE o.id = ?1", ORDER_SELECT);
    conn.query_row(&sql, [id], order_from_row).optional()
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<OrderRow> {
    Ok(OrderRow {
        id: row.get(0)?,
        order_number: row.get(1)?,
        amount: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        is_component: row.get(5)?,
        is_bundle: row.get(6)?,
        is_pack: row.get(7)?,
        pack: row.get(8)?,
        address: row.get(9)?,
        phone: row.get(10)?,
        zip: row.get(11)?,
        payment_provider: row.get(12)?,
        user_id: row.get(13)?,
        user_name: row.get(14)?,
        user_email: row.get(15)?,
        user_avatar: row.get(16)?,
        component_id: row.get(17)?,
        component_name: row.get(18)?,
        component_slug: row.get(19)?,
    })
}
