use crate::Database;
use crate::models::{ComponentRow, NotificationRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, Row};
use uuid::Uuid;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, name: &str, email: &str, avatar: Option<&str>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, avatar) VALUES (?1, ?2, ?3, ?4)",
                (id, name, email, avatar),
            )?;
            Ok(())
        })
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, email, avatar, has_purchased, created_at
                 FROM users WHERE email = ?1 COLLATE NOCASE",
                [email],
                user_from_row,
            )
            .optional()
        })
    }

    // -- Components --

    pub fn create_component(&self, id: &str, name: &str, slug: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO components (id, name, slug) VALUES (?1, ?2, ?3)",
                (id, name, slug),
            )?;
            Ok(())
        })
    }

    pub fn get_component(&self, id: &str) -> Result<Option<ComponentRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, slug FROM components WHERE id = ?1",
                [id],
                |row| {
                    Ok(ComponentRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        slug: row.get(2)?,
                    })
                },
            )
            .optional()
        })
    }

    // -- Notifications --

    /// Newest first.
    pub fn get_notifications(&self, user_id: &str, limit: u32) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, message, read, created_at
                 FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], notification_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

pub(crate) fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, avatar, has_purchased, created_at FROM users WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], user_from_row).optional()?;

    Ok(row)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        avatar: row.get(3)?,
        has_purchased: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Insert a notification; callers pass a transaction when the message must
/// commit together with the change it describes.
pub(crate) fn insert_notification(conn: &Connection, user_id: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, message) VALUES (?1, ?2, ?3)",
        (Uuid::new_v4().to_string(), user_id, message),
    )?;
    Ok(())
}

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        message: row.get(2)?,
        read: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
