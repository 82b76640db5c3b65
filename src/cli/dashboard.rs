use super::ui;
use crate::core::analytics::{MonthToDate, month_to_date};
use crate::core::currency::{ExchangeRateProvider, ExchangeRates, TRACKED_CURRENCIES};
use crate::core::transaction::Transaction;
use crate::store::TransactionStore;
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;
use tracing::warn;

const TOP_CATEGORIES: usize = 3;
const RECENT_TRANSACTIONS: usize = 5;

/// The `count` newest transactions; same-day entries keep their stored order.
pub fn recent_transactions(transactions: &[Transaction], count: usize) -> Vec<&Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(count);
    sorted
}

pub fn render_month_summary(mtd: &MonthToDate, currency: &str) -> String {
    let month = NaiveDate::from_ymd_opt(mtd.year, mtd.month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_default();

    let mut output = format!("{}\n\n", ui::style_text(&month, ui::StyleType::Title));
    output.push_str(&format!(
        "Balance:  {}\n",
        ui::style_balance(mtd.balance(), currency)
    ));
    output.push_str(&format!("Income:   {:.2} {}\n", mtd.income_total, currency));
    output.push_str(&format!("Expenses: {:.2} {}\n", mtd.expense_total, currency));

    if mtd.expense_by_category.is_empty() {
        return output;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Top category"),
        ui::header_cell(&format!("Spent ({currency})")),
    ]);
    for category in mtd.expense_by_category.iter().take(TOP_CATEGORIES) {
        table.add_row(vec![
            Cell::new(&category.category),
            ui::amount_cell(category.total),
        ]);
    }
    output.push('\n');
    output.push_str(&table.to_string());
    output
}

pub fn render_recent(recent: &[&Transaction]) -> String {
    if recent.is_empty() {
        return ui::style_text("No transactions yet", ui::StyleType::Subtle);
    }
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Category"),
        ui::header_cell("Description"),
        ui::header_cell("Amount"),
    ]);
    for transaction in recent {
        table.add_row(vec![
            Cell::new(transaction.date.format("%Y-%m-%d")),
            Cell::new(&transaction.category),
            Cell::new(transaction.description.as_deref().unwrap_or("")),
            ui::transaction_amount_cell(transaction.kind, transaction.amount),
        ]);
    }
    table.to_string()
}

pub fn render_tracked_rates(rates: Option<&ExchangeRates>) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Currency"), ui::header_cell("Per 1 USD")]);
    for code in TRACKED_CURRENCIES {
        table.add_row(vec![
            Cell::new(code),
            ui::format_optional_cell(rates.and_then(|r| r.rate(code)), |v| format!("{v:.4}")),
        ]);
    }
    let note = rates.map_or_else(
        || ui::style_text("rates unavailable", ui::StyleType::Warning),
        |r| ui::rate_origin_note(r.origin),
    );
    format!("{}\n{}", table, note)
}

pub async fn show_dashboard(
    store: &dyn TransactionStore,
    provider: &dyn ExchangeRateProvider,
    today: NaiveDate,
) -> Result<()> {
    let loaded = store.load()?;
    let currency = store.get_default_currency()?;
    let mtd = month_to_date(&loaded.transactions, today);

    let spinner = ui::new_spinner("Loading exchange rates...");
    let rates = match provider.get_exchange_rates("USD").await {
        Ok(rates) => Some(rates),
        Err(e) => {
            warn!("Could not load exchange rates: {}", e);
            None
        }
    };
    spinner.finish_and_clear();

    println!("{}", render_month_summary(&mtd, &currency));
    ui::print_separator();
    println!("{}", ui::style_text("Recent transactions", ui::StyleType::TotalLabel));
    println!(
        "{}",
        render_recent(&recent_transactions(&loaded.transactions, RECENT_TRANSACTIONS))
    );
    ui::print_separator();
    println!("{}", ui::style_text("Exchange rates", ui::StyleType::TotalLabel));
    println!("{}", render_tracked_rates(rates.as_ref()));
    if loaded.skipped > 0 {
        println!(
            "\n{}",
            ui::style_text(
                &format!("{} malformed record(s) skipped", loaded.skipped),
                ui::StyleType::Warning
            )
        );
    }
    Ok(())
}
