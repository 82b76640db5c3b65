use super::ui;
use crate::core::analytics::{AnalyticsSnapshot, CategoryTotal};
use crate::core::budget::BudgetUtilization;
use crate::core::config::AppConfig;
use crate::core::period::PeriodToken;
use crate::store::TransactionStore;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use comfy_table::{Cell, CellAlignment};

impl AnalyticsSnapshot {
    pub fn display_as_text(&self, currency: &str) -> String {
        let stats = &self.stats;
        let comparison = &self.comparison;

        let mut output = format!(
            "Analytics: {}\n{} .. {}\n\n",
            ui::style_text(&self.window.period.to_string(), ui::StyleType::Title),
            self.window.start.format("%Y-%m-%d %H:%M"),
            self.window.end.format("%Y-%m-%d %H:%M"),
        );

        let mut totals = ui::new_styled_table();
        totals.set_header(vec![
            ui::header_cell(""),
            ui::header_cell(&format!("Total ({currency})")),
            ui::header_cell("Count"),
            ui::header_cell("Average"),
            ui::header_cell("Previous"),
            ui::header_cell("Change"),
        ]);
        totals.add_row(vec![
            Cell::new("Income"),
            ui::amount_cell(stats.income_total),
            Cell::new(stats.income_count).set_alignment(CellAlignment::Right),
            ui::amount_cell(stats.income_avg),
            ui::format_optional_cell(
                comparison.previous_window.map(|_| comparison.previous_income),
                |v| format!("{v:.2}"),
            ),
            ui::change_cell(comparison.income_change_pct, true),
        ]);
        totals.add_row(vec![
            Cell::new("Expenses"),
            ui::amount_cell(stats.expense_total),
            Cell::new(stats.expense_count).set_alignment(CellAlignment::Right),
            ui::amount_cell(stats.expense_avg),
            ui::format_optional_cell(
                comparison.previous_window.map(|_| comparison.previous_expense),
                |v| format!("{v:.2}"),
            ),
            ui::change_cell(comparison.expense_change_pct, false),
        ]);
        output.push_str(&totals.to_string());
        output.push_str(&format!(
            "\n\nBalance: {}\n",
            ui::style_balance(stats.income_total - stats.expense_total, currency)
        ));

        for (title, categories) in [
            ("Expenses by category", &stats.expense_by_category),
            ("Income by category", &stats.income_by_category),
        ] {
            if !categories.is_empty() {
                output.push('\n');
                output.push_str(&category_table(title, categories));
                output.push('\n');
            }
        }

        if !stats.daily.is_empty() {
            let mut daily = ui::new_styled_table();
            daily.set_header(vec![
                ui::header_cell("Day"),
                ui::header_cell("Income"),
                ui::header_cell("Expenses"),
            ]);
            for day in &stats.daily {
                daily.add_row(vec![
                    Cell::new(day.date.format("%Y-%m-%d")),
                    ui::amount_cell(day.income),
                    ui::amount_cell(day.expense),
                ]);
            }
            output.push('\n');
            output.push_str(&daily.to_string());
            output.push('\n');
        }

        let mtd = &self.month_to_date;
        output.push_str(&format!(
            "\nThis month ({}/{} days): spent {:.2} {}",
            mtd.days_elapsed, mtd.days_in_month, mtd.expense_total, currency
        ));
        if let Some(forecast) = self.forecast {
            output.push_str(&format!(
                ", forecast {} by month end",
                ui::style_text(&format!("{forecast:.2} {currency}"), ui::StyleType::TotalLabel)
            ));
        }
        output.push('\n');

        if self.budgets.iter().any(|b| b.budget.is_some()) {
            output.push('\n');
            output.push_str(&budget_table(&self.budgets, currency));
            output.push('\n');
        }

        if self.skipped_records > 0 {
            output.push_str(&format!(
                "\n{}\n",
                ui::style_text(
                    &format!("{} malformed record(s) skipped", self.skipped_records),
                    ui::StyleType::Warning
                )
            ));
        }
        output
    }
}

fn category_table(title: &str, categories: &[CategoryTotal]) -> String {
    let total: f64 = categories.iter().map(|c| c.total).sum();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(title),
        ui::header_cell("Total"),
        ui::header_cell("Share"),
    ]);
    for category in categories {
        let share = (total > 0.0).then(|| category.total / total * 100.0);
        table.add_row(vec![
            Cell::new(&category.category),
            ui::amount_cell(category.total),
            ui::format_optional_cell(share, |s| format!("{s:.1}%")),
        ]);
    }
    table.to_string()
}

/// Month-to-date spend against each category budget.
pub fn budget_table(lines: &[BudgetUtilization], currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell(&format!("Spent ({currency})")),
        ui::header_cell("Budget"),
        ui::header_cell("Used"),
    ]);
    for line in lines {
        table.add_row(vec![
            Cell::new(&line.category),
            ui::amount_cell(line.spent),
            ui::format_optional_cell(line.budget, |b| format!("{b:.2}")),
            ui::utilization_cell(line.utilization_pct),
        ]);
    }
    table.to_string()
}

pub fn show_analytics(
    store: &dyn TransactionStore,
    config: &AppConfig,
    period: Option<PeriodToken>,
    json: bool,
    now: NaiveDateTime,
) -> Result<()> {
    let loaded = store.load()?;
    let budgets = store.get_category_budgets()?;
    let period = period.unwrap_or(config.default_period);
    let snapshot =
        AnalyticsSnapshot::compute(&loaded, &budgets, &config.categories.expense, period, now);

    if json {
        let text = serde_json::to_string_pretty(&snapshot)
            .context("Failed to serialize analytics snapshot")?;
        println!("{text}");
    } else {
        let currency = store.get_default_currency()?;
        println!("{}", snapshot.display_as_text(&currency));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::budget::CategoryBudgets;
    use crate::core::transaction::{Transaction, TransactionType, load_transactions};
    use chrono::NaiveDate;

    fn snapshot(period: PeriodToken) -> AnalyticsSnapshot {
        let date = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();
        let transactions = vec![
            Transaction::new(TransactionType::Income, 1000.0, "Salary", date(1)).to_record(),
            Transaction::new(TransactionType::Expense, 300.0, "Food", date(5)).to_record(),
            Transaction::new(TransactionType::Expense, 100.0, "Transport", date(6)).to_record(),
        ];
        let mut budgets = CategoryBudgets::new();
        budgets.set("Food", 200.0).unwrap();
        let categories: Vec<String> = vec!["Food".into(), "Transport".into()];
        let now = date(10).and_hms_opt(12, 0, 0).unwrap();
        AnalyticsSnapshot::compute(
            &load_transactions(&transactions),
            &budgets,
            &categories,
            period,
            now,
        )
    }

    #[test]
    fn test_text_rendering() {
        let output = console::strip_ansi_codes(&snapshot(PeriodToken::Month).display_as_text("RUB"))
            .to_string();
        assert!(output.contains("Analytics: month"));
        assert!(output.contains("Balance: +600.00 RUB"));
        assert!(output.contains("Expenses by category"));
        assert!(output.contains("forecast 1200.00 RUB by month end"));
        assert!(output.contains("100%"));
    }

    #[test]
    fn test_no_forecast_outside_month() {
        let output = snapshot(PeriodToken::Week).display_as_text("RUB");
        assert!(!output.contains("forecast"));
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(snapshot(PeriodToken::All)).unwrap();
        assert_eq!(value["window"]["period"], "all");
        assert_eq!(value["stats"]["expense_total"], 400.0);
        assert!(value["comparison"]["income_change_pct"].is_null());
        assert!(value["forecast"].is_null());
        assert_eq!(value["budgets"][0]["utilization_pct"], 100.0);
    }
}
