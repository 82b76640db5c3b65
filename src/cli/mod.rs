//! Terminal front end: one module per command, sharing the styling helpers in `ui`.

pub mod analytics;
pub mod budget;
pub mod dashboard;
pub mod rates;
pub mod setup;
pub mod transactions;
pub mod ui;

pub use budget::BudgetAction;
pub use transactions::{ListFilter, NewTransaction};
