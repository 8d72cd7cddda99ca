//! Transaction normalization
//!
//! Maps provider records into the canonical [`Transaction`] shape. Everything
//! here is pure: no network, no storage, no clock.

use chrono::NaiveDate;
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{Category, Transaction, TransactionType};
use crate::provider::{Direction, RawTransaction};

/// Merchant name used when the provider gives us nothing to go on
pub const UNKNOWN_MERCHANT: &str = "Unknown";

/// Normalize a single provider transaction
pub fn normalize(raw: &RawTransaction) -> Result<Transaction> {
    let signed_amount: f64 = raw.amount.trim().parse().map_err(|_| {
        Error::InvalidData(format!(
            "Transaction {} has a non-numeric amount: {:?}",
            raw.id, raw.amount
        ))
    })?;
    // f64 parsing also accepts "NaN" and "inf"
    if !signed_amount.is_finite() {
        return Err(Error::InvalidData(format!(
            "Transaction {} has a non-finite amount: {:?}",
            raw.id, raw.amount
        )));
    }

    let description = raw.description.as_deref().unwrap_or("");
    let transaction_type = classify_type(raw.direction, signed_amount, description);
    let category = categorize(raw.division_title().unwrap_or(""), transaction_type);

    let date_str = raw
        .transaction_date
        .as_deref()
        .or(raw.post_date.as_deref())
        .ok_or_else(|| Error::InvalidData(format!("Transaction {} has no date", raw.id)))?;

    Ok(Transaction {
        id: None,
        external_id: raw.id.clone(),
        user_id: None,
        merchant_name: merchant_name(raw),
        amount: signed_amount.abs(),
        transaction_type,
        category,
        date: parse_provider_date(date_str)?,
        description: raw.description.clone(),
    })
}

/// Normalize a batch, skipping records that cannot be normalized
pub fn normalize_all(raws: &[RawTransaction]) -> Vec<Transaction> {
    raws.iter()
        .filter_map(|raw| match normalize(raw) {
            Ok(tx) => Some(tx),
            Err(e) => {
                warn!(external_id = %raw.id, error = %e, "Skipping transaction");
                None
            }
        })
        .collect()
}

/// Decide whether a record is income, expense, or an internal transfer
///
/// Money coming in (credit direction, or a positive signed amount) is income
/// unless the description mentions "transfer" without mentioning "salary".
pub fn classify_type(
    direction: Option<Direction>,
    signed_amount: f64,
    description: &str,
) -> TransactionType {
    let incoming = direction == Some(Direction::Credit) || signed_amount > 0.0;
    if !incoming {
        return TransactionType::Expense;
    }

    let desc = description.to_lowercase();
    if desc.contains("transfer") && !desc.contains("salary") {
        TransactionType::Transfer
    } else {
        TransactionType::Income
    }
}

/// Map a provider classification title onto a coarse category
pub fn categorize(division_title: &str, transaction_type: TransactionType) -> Category {
    match transaction_type {
        TransactionType::Income => return Category::Income,
        TransactionType::Transfer => return Category::Transfer,
        TransactionType::Expense => {}
    }

    let title = division_title.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| title.contains(w));

    if has(&["food", "restaurant", "cafe"]) {
        Category::FoodDining
    } else if has(&["transport", "automotive"]) {
        Category::Transportation
    } else if has(&["retail", "shopping"]) {
        Category::Shopping
    } else if has(&["health", "medical"]) {
        Category::Health
    } else if has(&["entertainment", "recreation"]) {
        Category::Entertainment
    } else if has(&["utility", "electricity", "gas"]) {
        Category::BillsUtilities
    } else {
        Category::Other
    }
}

/// Enriched business name, else the raw description, else "Unknown"
pub fn merchant_name(raw: &RawTransaction) -> String {
    [raw.business_name(), raw.description.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_MERCHANT)
        .to_string()
}

/// Parse "YYYY-MM-DD" with an optional time suffix
pub fn parse_provider_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| Error::InvalidData(format!("Invalid transaction date: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AnzsicDivision, Anzsic, EnrichedCategory, EnrichedMerchant, Enrichment};

    fn raw(id: &str, amount: &str, description: &str) -> RawTransaction {
        RawTransaction {
            id: id.to_string(),
            description: Some(description.to_string()),
            amount: amount.to_string(),
            post_date: Some("2024-03-02T00:00:00Z".to_string()),
            ..Default::default()
        }
    }

    fn enriched(business: Option<&str>, title: Option<&str>) -> Enrichment {
        Enrichment {
            merchant: business.map(|b| EnrichedMerchant {
                business_name: Some(b.to_string()),
            }),
            category: title.map(|t| EnrichedCategory {
                anzsic: Some(Anzsic {
                    division: Some(AnzsicDivision {
                        title: Some(t.to_string()),
                    }),
                }),
            }),
        }
    }

    #[test]
    fn test_classify_type_table() {
        use Direction::*;
        use TransactionType::*;

        let cases: &[(Option<Direction>, f64, &str, TransactionType)] = &[
            (Some(Debit), -22.99, "NETFLIX.COM", Expense),
            (None, -5.00, "Coffee", Expense),
            (Some(Credit), 4200.00, "ACME PTY LTD SALARY", Income),
            (None, 12.50, "Interest earned", Income),
            (Some(Credit), 500.00, "Transfer from savings", Transfer),
            (Some(Credit), 500.00, "TRANSFER FROM J SMITH", Transfer),
            (Some(Credit), 3900.00, "Salary transfer ACME", Income),
            // Outgoing transfers stay expenses
            (Some(Debit), -200.00, "Transfer to savings", Expense),
            // A positive amount counts as incoming even without a direction
            (None, 100.00, "internal transfer", Transfer),
            (Some(Debit), 0.0, "zero", Expense),
        ];

        for (direction, amount, description, expected) in cases {
            assert_eq!(
                classify_type(*direction, *amount, description),
                *expected,
                "direction={:?} amount={} description={:?}",
                direction,
                amount,
                description
            );
        }
    }

    #[test]
    fn test_categorize_table() {
        use TransactionType::*;

        let cases: &[(&str, TransactionType, Category)] = &[
            ("Accommodation and Food Services", Expense, Category::FoodDining),
            ("Cafe", Expense, Category::FoodDining),
            ("Transport, Postal and Warehousing", Expense, Category::Transportation),
            ("Automotive Repair", Expense, Category::Transportation),
            ("Retail Trade", Expense, Category::Shopping),
            ("Health Care and Social Assistance", Expense, Category::Health),
            ("Medical Services", Expense, Category::Health),
            ("Arts and Recreation Services", Expense, Category::Entertainment),
            ("Electricity, Gas, Water and Waste Services", Expense, Category::BillsUtilities),
            ("Financial and Insurance Services", Expense, Category::Other),
            ("", Expense, Category::Other),
            ("Retail Trade", Income, Category::Income),
            ("Retail Trade", Transfer, Category::Transfer),
        ];

        for (title, tx_type, expected) in cases {
            assert_eq!(categorize(title, *tx_type), *expected, "title={:?}", title);
        }
    }

    #[test]
    fn test_normalize_expense_uses_enriched_merchant() {
        let mut r = raw("tx-1", "-22.99", "NETFLIX.COM SYDNEY AU");
        r.direction = Some(Direction::Debit);
        r.enrich = Some(enriched(Some("Netflix"), Some("Arts and Recreation Services")));

        let tx = normalize(&r).unwrap();
        assert_eq!(tx.external_id, "tx-1");
        assert_eq!(tx.merchant_name, "Netflix");
        assert_eq!(tx.amount, 22.99);
        assert_eq!(tx.transaction_type, TransactionType::Expense);
        assert_eq!(tx.category, Category::Entertainment);
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert!(tx.id.is_none());
    }

    #[test]
    fn test_normalize_income_overrides_category() {
        let mut r = raw("tx-2", "4200.00", "ACME SALARY");
        r.direction = Some(Direction::Credit);
        r.enrich = Some(enriched(None, Some("Retail Trade")));

        let tx = normalize(&r).unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Income);
        assert_eq!(tx.category, Category::Income);
        assert_eq!(tx.merchant_name, "ACME SALARY");
    }

    #[test]
    fn test_amount_is_never_negative() {
        for amount in ["-0.01", "-1500", "0", "42.10", "  -3.5 "] {
            let tx = normalize(&raw("x", amount, "anything")).unwrap();
            assert!(tx.amount >= 0.0, "amount {} normalized to {}", amount, tx.amount);
        }
    }

    #[test]
    fn test_merchant_name_fallbacks() {
        let mut r = raw("tx-3", "-1", "  ");
        r.description = None;
        assert_eq!(merchant_name(&r), UNKNOWN_MERCHANT);

        r.description = Some("   ".to_string());
        r.enrich = Some(enriched(Some(""), None));
        assert_eq!(merchant_name(&r), UNKNOWN_MERCHANT);

        r.description = Some("WOOLWORTHS 1234".to_string());
        assert_eq!(merchant_name(&r), "WOOLWORTHS 1234");
    }

    #[test]
    fn test_transaction_date_preferred_over_post_date() {
        let mut r = raw("tx-4", "-10", "Shell");
        r.transaction_date = Some("2024-02-28".to_string());
        let tx = normalize(&r).unwrap();
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 2, 28).unwrap());
    }

    #[test]
    fn test_invalid_records_are_rejected_and_skipped() {
        let bad_amount = raw("bad-1", "twelve", "Shell");
        assert!(matches!(normalize(&bad_amount), Err(Error::InvalidData(_))));

        let mut no_date = raw("bad-2", "-3", "Shell");
        no_date.post_date = None;
        assert!(normalize(&no_date).is_err());

        for amount in ["NaN", "inf", "-inf", "infinity"] {
            let record = raw("bad-3", amount, "Shell");
            assert!(
                matches!(normalize(&record), Err(Error::InvalidData(_))),
                "{} should be rejected",
                amount
            );
        }

        let good = raw("ok", "-3", "Shell");
        let normalized = normalize_all(&[
            bad_amount,
            good,
            no_date,
            raw("bad-4", "NaN", "Shell"),
            raw("bad-5", "-inf", "Shell"),
        ]);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].external_id, "ok");
    }
}
