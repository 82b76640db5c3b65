//! Transaction records as persisted, and the validated form the analytics run on.

use super::error::{AnalyticsError, Result};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

pub const DEFAULT_INCOME_CATEGORIES: &[&str] = &["Salary", "Gifts", "Other"];
pub const DEFAULT_EXPENSE_CATEGORIES: &[&str] = &[
    "Food",
    "Transport",
    "Entertainment",
    "Shopping",
    "Health",
    "Other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TransactionType::Income => "income",
                TransactionType::Expense => "expense",
            }
        )
    }
}

impl FromStr for TransactionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(anyhow::anyhow!("Invalid transaction type: {}", s)),
        }
    }
}

/// An amount as found in storage: either a JSON number or a decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredAmount {
    Number(f64),
    Text(String),
}

impl StoredAmount {
    /// Parses the amount, accepting `,` as the decimal separator.
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            StoredAmount::Number(n) => *n,
            StoredAmount::Text(s) => s.trim().replace(',', ".").parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// Unvalidated transaction, exactly as the store keeps it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub amount: Option<StoredAmount>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_amount: Option<StoredAmount>,
}

/// A validated transaction. `amount` is always in the reference currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: String,
    pub kind: TransactionType,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub original_currency: Option<String>,
    pub original_amount: Option<f64>,
}

impl Transaction {
    pub fn new(kind: TransactionType, amount: f64, category: &str, date: NaiveDate) -> Self {
        Transaction {
            id: Uuid::new_v4().to_string(),
            kind,
            amount,
            category: category.to_string(),
            date,
            description: None,
            original_currency: None,
            original_amount: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        if !description.trim().is_empty() {
            self.description = Some(description.to_string());
        }
        self
    }

    /// Records the amount and currency the user originally entered.
    pub fn with_original(mut self, currency: &str, amount: f64) -> Self {
        self.original_currency = Some(currency.to_string());
        self.original_amount = Some(amount);
        self
    }

    pub fn to_record(&self) -> TransactionRecord {
        TransactionRecord {
            id: self.id.clone(),
            kind: Some(self.kind.to_string()),
            amount: Some(StoredAmount::Number(self.amount)),
            category: Some(self.category.clone()),
            date: Some(self.date.format("%Y-%m-%d").to_string()),
            description: self.description.clone(),
            original_currency: self.original_currency.clone(),
            original_amount: self.original_amount.map(StoredAmount::Number),
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

impl TryFrom<&TransactionRecord> for Transaction {
    type Error = AnalyticsError;

    fn try_from(record: &TransactionRecord) -> Result<Self> {
        let malformed = |reason: &str| AnalyticsError::MalformedTransaction {
            id: record.id.clone(),
            reason: reason.to_string(),
        };

        let kind = record
            .kind
            .as_deref()
            .ok_or_else(|| malformed("missing type"))?
            .parse::<TransactionType>()
            .map_err(|e| malformed(&e.to_string()))?;
        let amount = record
            .amount
            .as_ref()
            .ok_or_else(|| malformed("missing amount"))?
            .value()
            .ok_or_else(|| malformed("unparseable amount"))?;
        if amount <= 0.0 {
            return Err(malformed("amount must be positive"));
        }
        let date = record
            .date
            .as_deref()
            .ok_or_else(|| malformed("missing date"))
            .and_then(|d| parse_date(d).ok_or_else(|| malformed("unparseable date")))?;
        let category = record
            .category
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| malformed("missing category"))?;

        Ok(Transaction {
            id: record.id.clone(),
            kind,
            amount,
            category,
            date,
            description: record.description.clone(),
            original_currency: record.original_currency.clone(),
            original_amount: record.original_amount.as_ref().and_then(StoredAmount::value),
        })
    }
}

/// Transactions that passed validation, plus how many records were dropped.
#[derive(Debug, Clone, Default)]
pub struct LoadedTransactions {
    pub transactions: Vec<Transaction>,
    pub skipped: usize,
}

/// Validates stored records. Malformed ones are logged and counted, never coerced.
pub fn load_transactions(records: &[TransactionRecord]) -> LoadedTransactions {
    let mut loaded = LoadedTransactions::default();
    for record in records {
        match Transaction::try_from(record) {
            Ok(transaction) => loaded.transactions.push(transaction),
            Err(e) => {
                warn!("Skipping record: {e}");
                loaded.skipped += 1;
            }
        }
    }
    loaded
}
