//! Wire types returned by the banking provider

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::Account;

/// Money movement direction as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Credit,
    Debit,
}

/// A transaction exactly as the provider returns it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Signed decimal string, e.g. "-22.99"
    #[serde(deserialize_with = "decimal_string")]
    pub amount: String,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub post_date: Option<String>,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub enrich: Option<Enrichment>,
}

impl RawTransaction {
    /// Enriched business name, if the provider resolved one
    pub fn business_name(&self) -> Option<&str> {
        self.enrich
            .as_ref()?
            .merchant
            .as_ref()?
            .business_name
            .as_deref()
    }

    /// ANZSIC division title used as the category hint
    pub fn division_title(&self) -> Option<&str> {
        self.enrich
            .as_ref()?
            .category
            .as_ref()?
            .anzsic
            .as_ref()?
            .division
            .as_ref()?
            .title
            .as_deref()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Enrichment {
    #[serde(default)]
    pub merchant: Option<EnrichedMerchant>,
    #[serde(default)]
    pub category: Option<EnrichedCategory>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedMerchant {
    #[serde(default)]
    pub business_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichedCategory {
    #[serde(default)]
    pub anzsic: Option<Anzsic>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Anzsic {
    #[serde(default)]
    pub division: Option<AnzsicDivision>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnzsicDivision {
    #[serde(default)]
    pub title: Option<String>,
}

/// An account exactly as the provider returns it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccount {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub account_no: Option<String>,
    #[serde(default, deserialize_with = "optional_decimal_string")]
    pub balance: Option<String>,
    #[serde(default, deserialize_with = "optional_decimal_string")]
    pub available_funds: Option<String>,
    #[serde(default)]
    pub class: Option<AccountClass>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountClass {
    #[serde(default, rename = "type")]
    pub account_type: Option<String>,
}

impl From<RawAccount> for Account {
    fn from(raw: RawAccount) -> Self {
        Account {
            id: raw.id,
            name: raw.name.unwrap_or_default(),
            account_no: raw.account_no.unwrap_or_default(),
            balance: parse_balance(raw.balance.as_deref()),
            available_balance: parse_balance(raw.available_funds.as_deref()),
            account_type: raw
                .class
                .and_then(|c| c.account_type)
                .unwrap_or_else(|| "unknown".to_string()),
            status: raw.status.unwrap_or_default(),
            institution: raw.institution.unwrap_or_default(),
        }
    }
}

/// Missing or malformed balances count as zero
fn parse_balance(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// One page of a paginated provider listing
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub links: Option<PageLinks>,
}

#[derive(Debug, Deserialize)]
pub struct PageLinks {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Decimal {
    Text(String),
    Number(f64),
}

impl From<Decimal> for String {
    fn from(d: Decimal) -> Self {
        match d {
            Decimal::Text(s) => s,
            Decimal::Number(n) => n.to_string(),
        }
    }
}

/// Providers send amounts as strings, but tolerate bare numbers
fn decimal_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Decimal::deserialize(deserializer).map(String::from)
}

fn optional_decimal_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Decimal>::deserialize(deserializer)?.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_transaction_from_provider_json() {
        let json = r#"{
            "type": "transaction",
            "id": "tx-123",
            "status": "posted",
            "description": "NETFLIX.COM SYDNEY",
            "amount": "-22.99",
            "account": "acc-1",
            "direction": "debit",
            "class": "payment",
            "postDate": "2024-03-02T00:00:00Z",
            "transactionDate": null,
            "enrich": {
                "merchant": { "businessName": "Netflix" },
                "category": { "anzsic": { "division": { "title": "Arts and Recreation Services" } } }
            }
        }"#;

        let raw: RawTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(raw.amount, "-22.99");
        assert_eq!(raw.direction, Some(Direction::Debit));
        assert_eq!(raw.business_name(), Some("Netflix"));
        assert_eq!(raw.division_title(), Some("Arts and Recreation Services"));
        assert!(raw.transaction_date.is_none());
    }

    #[test]
    fn test_numeric_amount_is_accepted() {
        let raw: RawTransaction = serde_json::from_str(r#"{"id":"x","amount":12.5}"#).unwrap();
        assert_eq!(raw.amount, "12.5");
        assert!(raw.business_name().is_none());
    }

    #[test]
    fn test_account_conversion_defaults() {
        let raw: RawAccount = serde_json::from_str(
            r#"{"id":"acc-1","name":"Everyday","balance":"1520.35","availableFunds":null,"class":{"type":"transaction"}}"#,
        )
        .unwrap();
        let account = Account::from(raw);
        assert_eq!(account.balance, 1520.35);
        assert_eq!(account.available_balance, 0.0);
        assert_eq!(account.account_type, "transaction");

        let bare: RawAccount = serde_json::from_str(r#"{"id":"acc-2","balance":""}"#).unwrap();
        let account = Account::from(bare);
        assert_eq!(account.balance, 0.0);
        assert_eq!(account.account_type, "unknown");
    }
}
