//! Core business logic: the analytics engine and the abstractions it is fed through

pub mod analytics;
pub mod budget;
pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod period;
pub mod transaction;

// Re-export main types for cleaner imports
pub use analytics::{
    AnalyticsSnapshot, CategoryTotal, Comparison, DailyTotals, MonthToDate, PeriodStats,
    aggregate, compare_to_previous, forecast_month_end, month_to_date,
};
pub use budget::{BudgetUtilization, CategoryBudgets, budget_utilization};
pub use currency::{ExchangeRateProvider, ExchangeRates, RateOrigin};
pub use error::AnalyticsError;
pub use period::{PeriodToken, Window, resolve_period};
pub use transaction::{
    LoadedTransactions, Transaction, TransactionRecord, TransactionType, load_transactions,
};
