//! Subscription operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_date, parse_datetime, parse_tag, Database};
use crate::error::Result;
use crate::models::{merchant_key, NewSubscription, Subscription};

const SELECT_COLUMNS: &str = "id, user_id, merchant_name, amount, frequency, next_billing_date, detected_at, is_active, auto_detected";

fn row_to_subscription(row: &Row) -> rusqlite::Result<Subscription> {
    let frequency: String = row.get(4)?;
    let next_billing_date: String = row.get(5)?;
    let detected_at: String = row.get(6)?;
    Ok(Subscription {
        id: Some(row.get(0)?),
        user_id: Some(row.get(1)?),
        merchant_name: row.get(2)?,
        amount: row.get(3)?,
        frequency: parse_tag(&frequency)?,
        next_billing_date: parse_date(&next_billing_date)?,
        detected_at: parse_datetime(&detected_at),
        is_active: row.get(7)?,
        auto_detected: row.get(8)?,
    })
}

impl Database {
    /// Insert a subscription or refresh the user's active one for the same merchant
    ///
    /// Merchants match on [`merchant_key`]. A match has its amount, frequency
    /// and next billing date refreshed; otherwise a new active row is
    /// inserted. Returns the row id either way. The partial unique index on
    /// active rows makes this a single atomic statement, so concurrent syncs
    /// for one user cannot both insert.
    pub fn upsert_subscription(&self, sub: &NewSubscription) -> Result<i64> {
        let conn = self.conn()?;
        let merchant = sub.merchant_name.trim();

        let id = conn.query_row(
            r#"
            INSERT INTO subscriptions (user_id, merchant_name, merchant_key, amount, frequency, next_billing_date, is_active, auto_detected)
            VALUES (?, ?, ?, ?, ?, ?, 1, ?)
            ON CONFLICT(user_id, merchant_key) WHERE is_active = 1 DO UPDATE SET
                amount = excluded.amount,
                frequency = excluded.frequency,
                next_billing_date = excluded.next_billing_date
            RETURNING id
            "#,
            params![
                sub.user_id,
                merchant,
                merchant_key(merchant),
                sub.amount,
                sub.frequency.as_str(),
                sub.next_billing_date.to_string(),
                sub.auto_detected,
            ],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    /// Active subscriptions for a user, most expensive first
    pub fn list_active_subscriptions(&self, user_id: i64) -> Result<Vec<Subscription>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = ? AND is_active = 1 ORDER BY amount DESC, id",
            SELECT_COLUMNS
        ))?;
        let subs = stmt
            .query_map(params![user_id], row_to_subscription)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(subs)
    }

    pub fn get_subscription(&self, id: i64) -> Result<Option<Subscription>> {
        let conn = self.conn()?;
        let sub = conn
            .query_row(
                &format!("SELECT {} FROM subscriptions WHERE id = ?", SELECT_COLUMNS),
                params![id],
                row_to_subscription,
            )
            .optional()?;
        Ok(sub)
    }

    /// Soft delete: mark the subscription inactive
    ///
    /// Returns false when no subscription has this id. Deactivating an
    /// already inactive subscription succeeds.
    pub fn deactivate_subscription(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE subscriptions SET is_active = 0 WHERE id = ?",
            params![id],
        )?;
        Ok(changed > 0)
    }
}
