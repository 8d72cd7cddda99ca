//! User operations

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{format_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::User;

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let created_at: String = row.get(2)?;
    let last_sync_at: Option<String> = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        external_id: row.get(1)?,
        created_at: parse_datetime(&created_at),
        last_sync_at: last_sync_at.as_deref().map(parse_datetime),
    })
}

impl Database {
    /// Register a provider user locally, returning the existing row if present
    pub fn create_user(&self, external_id: &str) -> Result<User> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Err(Error::InvalidData("user id cannot be empty".into()));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (external_id) VALUES (?) ON CONFLICT(external_id) DO NOTHING",
            params![external_id],
        )?;

        let user = conn.query_row(
            "SELECT id, external_id, created_at, last_sync_at FROM users WHERE external_id = ?",
            params![external_id],
            row_to_user,
        )?;
        Ok(user)
    }

    /// Look up a local user by provider user id
    pub fn get_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, external_id, created_at, last_sync_at FROM users WHERE external_id = ?",
                params![external_id.trim()],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, external_id, created_at, last_sync_at FROM users ORDER BY external_id",
        )?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Record when the user's data was last synced
    pub fn set_last_sync(&self, user_id: i64, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE users SET last_sync_at = ? WHERE id = ?",
            params![format_datetime(&at), user_id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }
}
