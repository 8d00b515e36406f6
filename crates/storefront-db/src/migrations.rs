use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const LATEST_VERSION: i64 = 2;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, components, orders, notifications)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                email           TEXT NOT NULL UNIQUE,
                avatar          TEXT,
                has_purchased   INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE components (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                slug        TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE orders (
                id                  TEXT PRIMARY KEY,
                order_number        TEXT NOT NULL UNIQUE,
                amount              REAL NOT NULL,
                status              TEXT NOT NULL DEFAULT 'PENDING'
                                    CHECK (status IN ('PENDING', 'SUCCESS', 'FAILED')),
                created_at          TEXT NOT NULL DEFAULT (datetime('now')),
                is_component        INTEGER NOT NULL DEFAULT 0,
                is_bundle           INTEGER NOT NULL DEFAULT 0,
                is_pack             INTEGER NOT NULL DEFAULT 0,
                pack                TEXT,
                address             TEXT,
                phone               TEXT,
                zip                 TEXT,
                payment_provider    TEXT,
                user_id             TEXT NOT NULL REFERENCES users(id),
                component_id        TEXT REFERENCES components(id) ON DELETE SET NULL
            );

            CREATE INDEX idx_orders_created ON orders(created_at);
            CREATE INDEX idx_orders_user ON orders(user_id);
            CREATE INDEX idx_orders_status ON orders(status);

            CREATE TABLE notifications (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                message     TEXT NOT NULL,
                read        INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_notifications_user
                ON notifications(user_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (side-effect outbox)");
        conn.execute_batch(
            "
            CREATE TABLE outbox (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                kind            TEXT NOT NULL,
                payload         TEXT NOT NULL,
                attempts        INTEGER NOT NULL DEFAULT 0,
                last_error      TEXT,
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                delivered_at    TEXT
            );

            CREATE INDEX idx_outbox_pending
                ON outbox(delivered_at, attempts);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
