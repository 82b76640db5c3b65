use super::{dashboard::recent_transactions, ui};
use crate::core::config::CategoriesConfig;
use crate::core::currency::{ExchangeRateProvider, convert_currency};
use crate::core::error::AnalyticsError;
use crate::core::transaction::{Transaction, TransactionType};
use crate::store::TransactionStore;
use anyhow::{Result, bail};
use chrono::NaiveDate;
use comfy_table::Cell;
use tracing::{debug, info, instrument};

/// User input for a new transaction, before conversion.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionType,
    pub amount: f64,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    /// Currency `amount` is given in; the reference currency when absent.
    pub currency: Option<String>,
    pub description: Option<String>,
}

/// Filters for `list`. Every filter that is set must match.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub kind: Option<TransactionType>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ListFilter {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        if self.kind.is_some_and(|k| k != transaction.kind) {
            return false;
        }
        if let Some(category) = &self.category
            && !category.eq_ignore_ascii_case(&transaction.category)
        {
            return false;
        }
        if let Some(search) = &self.search {
            let description = transaction.description.as_deref().unwrap_or("");
            return description
                .to_lowercase()
                .contains(&search.to_lowercase());
        }
        true
    }
}

fn resolve_category(
    categories: &CategoriesConfig,
    kind: TransactionType,
    requested: Option<&str>,
) -> Result<String, AnalyticsError> {
    let known = match kind {
        TransactionType::Income => &categories.income,
        TransactionType::Expense => &categories.expense,
    };
    let Some(requested) = requested else {
        // Income defaults to the first income category, expenses to "Other".
        let fallback = match kind {
            TransactionType::Income => known.first(),
            TransactionType::Expense => known
                .iter()
                .find(|c| c.as_str() == "Other")
                .or_else(|| known.last()),
        };
        return fallback.cloned().ok_or_else(|| AnalyticsError::UnknownCategory {
            kind: kind.to_string(),
            category: String::new(),
        });
    };
    known
        .iter()
        .find(|c| c.eq_ignore_ascii_case(requested))
        .cloned()
        .ok_or_else(|| AnalyticsError::UnknownCategory {
            kind: kind.to_string(),
            category: requested.to_string(),
        })
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Validates `input`, converts it into the reference currency and stores it.
#[instrument(skip_all, fields(kind = %input.kind))]
pub async fn add_transaction(
    store: &dyn TransactionStore,
    provider: &dyn ExchangeRateProvider,
    categories: &CategoriesConfig,
    input: NewTransaction,
    today: NaiveDate,
) -> Result<Transaction> {
    if !input.amount.is_finite() || input.amount <= 0.0 {
        bail!("Amount must be a positive number, got {}", input.amount);
    }
    let category = resolve_category(categories, input.kind, input.category.as_deref())?;
    let reference = store.get_default_currency()?;
    let currency = input
        .currency
        .as_deref()
        .map(str::to_uppercase)
        .unwrap_or_else(|| reference.clone());

    let amount = if currency.eq_ignore_ascii_case(&reference) {
        input.amount
    } else {
        let converted = convert_currency(provider, input.amount, &currency, &reference).await?;
        debug!("Converted {} {} to {} {}", input.amount, currency, converted, reference);
        round_cents(converted)
    };
    if amount <= 0.0 {
        bail!("Converted amount {amount} {reference} is not positive");
    }

    let transaction = Transaction::new(input.kind, amount, &category, input.date.unwrap_or(today))
        .with_description(input.description.as_deref().unwrap_or(""))
        .with_original(&currency, input.amount);
    store.add_transaction(&transaction)?;
    info!("Added transaction {}", transaction.id);
    Ok(transaction)
}

pub fn render_transactions(transactions: &[&Transaction], currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Date"),
        ui::header_cell("Type"),
        ui::header_cell("Category"),
        ui::header_cell("Description"),
        ui::header_cell(&format!("Amount ({currency})")),
        ui::header_cell("Original"),
    ]);

    let (mut income, mut expense) = (0.0, 0.0);
    for transaction in transactions {
        match transaction.kind {
            TransactionType::Income => income += transaction.amount,
            TransactionType::Expense => expense += transaction.amount,
        }
        let original = match (&transaction.original_currency, transaction.original_amount) {
            (Some(code), Some(amount)) if !code.eq_ignore_ascii_case(currency) => {
                Some(format!("{amount:.2} {code}"))
            }
            _ => None,
        };
        table.add_row(vec![
            Cell::new(&transaction.id),
            Cell::new(transaction.date.format("%Y-%m-%d")),
            Cell::new(transaction.kind),
            Cell::new(&transaction.category),
            Cell::new(transaction.description.as_deref().unwrap_or("")),
            ui::transaction_amount_cell(transaction.kind, transaction.amount),
            Cell::new(original.unwrap_or_default()),
        ]);
    }

    format!(
        "{}\n\n{} {}   {} {}",
        table,
        ui::style_text("Income:", ui::StyleType::TotalLabel),
        ui::style_text(&format!("{income:.2} {currency}"), ui::StyleType::Positive),
        ui::style_text("Expenses:", ui::StyleType::TotalLabel),
        ui::style_text(&format!("{expense:.2} {currency}"), ui::StyleType::Negative),
    )
}

pub fn list_transactions(store: &dyn TransactionStore, filter: &ListFilter) -> Result<()> {
    let loaded = store.load()?;
    let currency = store.get_default_currency()?;
    let matching: Vec<Transaction> = loaded
        .transactions
        .into_iter()
        .filter(|t| filter.matches(t))
        .collect();

    if matching.is_empty() {
        println!("{}", ui::style_text("No transactions found", ui::StyleType::Subtle));
        return Ok(());
    }
    let sorted = recent_transactions(&matching, matching.len());
    println!("{}", render_transactions(&sorted, &currency));
    Ok(())
}

pub fn delete_transaction(store: &dyn TransactionStore, id: &str) -> Result<()> {
    if !store.delete_transaction(id)? {
        bail!("No transaction with id {}", id);
    }
    println!("Deleted transaction {}", id);
    Ok(())
}
