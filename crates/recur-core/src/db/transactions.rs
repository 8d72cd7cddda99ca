//! Transaction operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_date, parse_tag, Database};
use crate::error::Result;
use crate::models::Transaction;

/// Outcome of merging a batch of fetched transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeResult {
    /// Rows that did not exist before the merge
    pub inserted: usize,
    /// Existing rows whose display fields were refreshed
    pub updated: usize,
}

const SELECT_COLUMNS: &str =
    "id, external_id, user_id, merchant_name, amount, type, category, date, description";

fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    let tx_type: String = row.get(5)?;
    let category: String = row.get(6)?;
    let date: String = row.get(7)?;
    Ok(Transaction {
        id: Some(row.get(0)?),
        external_id: row.get(1)?,
        user_id: Some(row.get(2)?),
        merchant_name: row.get(3)?,
        amount: row.get(4)?,
        transaction_type: parse_tag(&tx_type)?,
        category: parse_tag(&category)?,
        date: parse_date(&date)?,
        description: row.get(8)?,
    })
}

impl Database {
    /// Upsert fetched transactions for a user, keyed on external id
    ///
    /// Runs in a single SQL transaction. Rows already present keep their
    /// amount, type and date; only merchant name, category and description
    /// are refreshed from the provider.
    pub fn merge_transactions(&self, user_id: i64, transactions: &[Transaction]) -> Result<MergeResult> {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;
        let mut result = MergeResult::default();

        {
            let mut exists = db_tx.prepare(
                "SELECT id FROM transactions WHERE user_id = ? AND external_id = ?",
            )?;
            let mut upsert = db_tx.prepare(
                r#"
                INSERT INTO transactions (user_id, external_id, merchant_name, amount, type, category, date, description)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(user_id, external_id) DO UPDATE SET
                    merchant_name = excluded.merchant_name,
                    category = excluded.category,
                    description = excluded.description,
                    updated_at = CURRENT_TIMESTAMP
                "#,
            )?;

            for tx in transactions {
                let existing: Option<i64> = exists
                    .query_row(params![user_id, tx.external_id], |row| row.get(0))
                    .optional()?;

                upsert.execute(params![
                    user_id,
                    tx.external_id,
                    tx.merchant_name,
                    tx.amount,
                    tx.transaction_type.as_str(),
                    tx.category.as_str(),
                    tx.date.to_string(),
                    tx.description,
                ])?;

                if existing.is_some() {
                    result.updated += 1;
                } else {
                    result.inserted += 1;
                }
            }
        }

        db_tx.commit()?;
        Ok(result)
    }

    /// Stored transactions dated within `[from, to]`, most recent first
    pub fn list_transactions_between(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE user_id = ? AND date >= ? AND date <= ? ORDER BY date DESC, id DESC",
            SELECT_COLUMNS
        ))?;
        let transactions = stmt
            .query_map(
                params![user_id, from.to_string(), to.to_string()],
                row_to_transaction,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    pub fn count_transactions(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
