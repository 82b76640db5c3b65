//! Derives period summaries from a flat transaction log.
//!
//! Everything here is a pure function of its inputs: the caller resolves a
//! window, hands over the full transaction list and gets plain values back.
//! Nothing is cached between calls.
use crate::core::budget::{BudgetUtilization, CategoryBudgets, budget_utilization};
use crate::core::period::{PeriodToken, Window, resolve_period};
use crate::core::transaction::{LoadedTransactions, Transaction, TransactionType};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub income: f64,
    pub expense: f64,
}

/// Totals, averages and breakdowns for one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodStats {
    pub income_total: f64,
    pub expense_total: f64,
    pub income_count: usize,
    pub expense_count: usize,
    pub income_avg: f64,
    pub expense_avg: f64,
    pub expense_by_category: Vec<CategoryTotal>,
    pub income_by_category: Vec<CategoryTotal>,
    pub daily: Vec<DailyTotals>,
}

fn mean(total: f64, count: usize) -> f64 {
    if count > 0 { total / count as f64 } else { 0.0 }
}

/// Sums per category, largest first. Ties keep the order categories first appeared in.
fn totals_by_category<'a>(
    transactions: impl Iterator<Item = &'a Transaction>,
) -> Vec<CategoryTotal> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for transaction in transactions {
        match index.get(transaction.category.as_str()) {
            Some(&i) => totals[i].total += transaction.amount,
            None => {
                index.insert(transaction.category.as_str(), totals.len());
                totals.push(CategoryTotal {
                    category: transaction.category.clone(),
                    total: transaction.amount,
                });
            }
        }
    }
    // sort_by is stable
    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    totals
}

/// Computes the statistics of every transaction dated inside `window`.
pub fn aggregate(transactions: &[Transaction], window: &Window) -> PeriodStats {
    let in_window: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| window.contains_date(t.date))
        .collect();

    let of_kind = |kind: TransactionType| in_window.iter().copied().filter(move |t| t.kind == kind);

    let income_total: f64 = of_kind(TransactionType::Income).map(|t| t.amount).sum();
    let expense_total: f64 = of_kind(TransactionType::Expense).map(|t| t.amount).sum();
    let income_count = of_kind(TransactionType::Income).count();
    let expense_count = of_kind(TransactionType::Expense).count();

    let mut days: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();
    for transaction in &in_window {
        let day = days.entry(transaction.date).or_insert(DailyTotals {
            date: transaction.date,
            income: 0.0,
            expense: 0.0,
        });
        match transaction.kind {
            TransactionType::Income => day.income += transaction.amount,
            TransactionType::Expense => day.expense += transaction.amount,
        }
    }

    PeriodStats {
        income_total,
        expense_total,
        income_count,
        expense_count,
        income_avg: mean(income_total, income_count),
        expense_avg: mean(expense_total, expense_count),
        expense_by_category: totals_by_category(of_kind(TransactionType::Expense)),
        income_by_category: totals_by_category(of_kind(TransactionType::Income)),
        daily: days.into_values().collect(),
    }
}

/// Change against the window of equal length right before the current one.
///
/// A `None` percentage means there is nothing to compare against, which is
/// not the same as "no change".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub previous_window: Option<Window>,
    pub previous_income: f64,
    pub previous_expense: f64,
    pub income_change_pct: Option<f64>,
    pub expense_change_pct: Option<f64>,
}

fn change_pct(current: f64, previous: f64) -> Option<f64> {
    (previous > 0.0).then(|| (current - previous) / previous * 100.0)
}

pub fn compare_to_previous(
    transactions: &[Transaction],
    window: &Window,
    current_income: f64,
    current_expense: f64,
) -> Comparison {
    let Some(previous) = window.previous() else {
        debug!("No comparable window for period {}", window.period);
        return Comparison {
            previous_window: None,
            previous_income: 0.0,
            previous_expense: 0.0,
            income_change_pct: None,
            expense_change_pct: None,
        };
    };

    let (mut previous_income, mut previous_expense) = (0.0, 0.0);
    for transaction in transactions.iter().filter(|t| previous.contains_date(t.date)) {
        match transaction.kind {
            TransactionType::Income => previous_income += transaction.amount,
            TransactionType::Expense => previous_expense += transaction.amount,
        }
    }
    debug!(previous_income, previous_expense, "Computed previous window totals");

    Comparison {
        previous_window: Some(previous),
        previous_income,
        previous_expense,
        income_change_pct: change_pct(current_income, previous_income),
        expense_change_pct: change_pct(current_expense, previous_expense),
    }
}

/// Figures for the calendar month containing `today`, whatever period is selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthToDate {
    pub year: i32,
    pub month: u32,
    pub days_elapsed: u32,
    pub days_in_month: u32,
    pub income_total: f64,
    pub expense_total: f64,
    pub expense_by_category: Vec<CategoryTotal>,
}

impl MonthToDate {
    pub fn balance(&self) -> f64 {
        self.income_total - self.expense_total
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

pub fn month_to_date(transactions: &[Transaction], today: NaiveDate) -> MonthToDate {
    let in_month: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.date.year() == today.year() && t.date.month() == today.month())
        .collect();

    let expense_by_category = totals_by_category(
        in_month
            .iter()
            .copied()
            .filter(|t| t.kind == TransactionType::Expense),
    );

    MonthToDate {
        year: today.year(),
        month: today.month(),
        days_elapsed: today.day(),
        days_in_month: days_in_month(today.year(), today.month()),
        income_total: in_month
            .iter()
            .filter(|t| t.kind == TransactionType::Income)
            .map(|t| t.amount)
            .sum(),
        expense_total: expense_by_category.iter().map(|c| c.total).sum(),
        expense_by_category,
    }
}

/// Extrapolates month-end spending from the month-to-date daily average.
///
/// Only meaningful while the monthly period is selected; other periods get `None`.
pub fn forecast_month_end(
    period: PeriodToken,
    month_to_date_expense: f64,
    days_elapsed: u32,
    days_in_month: u32,
) -> Option<f64> {
    if period != PeriodToken::Month {
        return None;
    }
    let daily_avg = if days_elapsed > 0 {
        month_to_date_expense / f64::from(days_elapsed)
    } else {
        0.0
    };
    Some(daily_avg * f64::from(days_in_month))
}

/// Everything the analytics view shows, recomputed from scratch on each call.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSnapshot {
    pub window: Window,
    pub stats: PeriodStats,
    pub comparison: Comparison,
    pub month_to_date: MonthToDate,
    pub forecast: Option<f64>,
    pub budgets: Vec<BudgetUtilization>,
    pub skipped_records: usize,
}

impl AnalyticsSnapshot {
    #[instrument(name = "AnalyticsSnapshot", skip_all, fields(period = %period))]
    pub fn compute(
        loaded: &LoadedTransactions,
        budgets: &CategoryBudgets,
        expense_categories: &[String],
        period: PeriodToken,
        now: NaiveDateTime,
    ) -> Self {
        let transactions = &loaded.transactions;
        let window = resolve_period(period, now);
        let stats = aggregate(transactions, &window);
        let comparison =
            compare_to_previous(transactions, &window, stats.income_total, stats.expense_total);
        let month_to_date = month_to_date(transactions, now.date());
        let forecast = forecast_month_end(
            period,
            month_to_date.expense_total,
            month_to_date.days_elapsed,
            month_to_date.days_in_month,
        );
        let budgets = budget_utilization(
            budgets,
            &month_to_date.expense_by_category,
            expense_categories,
        );
        debug!(
            transactions = transactions.len(),
            skipped = loaded.skipped,
            income = stats.income_total,
            expense = stats.expense_total,
            "Computed analytics snapshot"
        );

        AnalyticsSnapshot {
            window,
            stats,
            comparison,
            month_to_date,
            forecast,
            budgets,
            skipped_records: loaded.skipped,
        }
    }
}
