use super::{analytics::budget_table, ui};
use crate::core::analytics::month_to_date;
use crate::core::budget::budget_utilization;
use crate::core::config::CategoriesConfig;
use crate::core::error::AnalyticsError;
use crate::store::TransactionStore;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

/// Budget subcommands.
#[derive(Debug, Clone, PartialEq)]
pub enum BudgetAction {
    Set { category: String, amount: f64 },
    Clear { category: String },
    Show,
}

fn known_expense_category(
    categories: &CategoriesConfig,
    category: &str,
) -> Result<String, AnalyticsError> {
    categories
        .expense
        .iter()
        .find(|c| c.eq_ignore_ascii_case(category))
        .cloned()
        .ok_or_else(|| AnalyticsError::UnknownCategory {
            kind: "expense".to_string(),
            category: category.to_string(),
        })
}

pub fn run_budget(
    store: &dyn TransactionStore,
    categories: &CategoriesConfig,
    action: BudgetAction,
    today: NaiveDate,
) -> Result<()> {
    match action {
        BudgetAction::Set { category, amount } => {
            let category = known_expense_category(categories, &category)?;
            let mut budgets = store.get_category_budgets()?;
            budgets.set(&category, amount)?;
            store.set_category_budgets(&budgets)?;
            info!("Budget for {} set to {}", category, amount);
            println!("Budget for {category} set to {amount:.2}");
        }
        BudgetAction::Clear { category } => {
            let mut budgets = store.get_category_budgets()?;
            // Stored keys may predate the current category list, so match any key.
            let key = budgets
                .iter()
                .map(|(k, _)| k.to_string())
                .find(|k| k.eq_ignore_ascii_case(&category));
            match key.and_then(|k| budgets.clear(&k).map(|_| k)) {
                Some(k) => {
                    store.set_category_budgets(&budgets)?;
                    println!("Budget for {k} cleared");
                }
                None => println!(
                    "{}",
                    ui::style_text(
                        &format!("No budget set for {category}"),
                        ui::StyleType::Subtle
                    )
                ),
            }
        }
        BudgetAction::Show => {
            let loaded = store.load()?;
            let budgets = store.get_category_budgets()?;
            let currency = store.get_default_currency()?;
            let mtd = month_to_date(&loaded.transactions, today);
            let lines = budget_utilization(&budgets, &mtd.expense_by_category, &categories.expense);
            println!("{}", budget_table(&lines, &currency));
        }
    }
    Ok(())
}
