//! Per-category monthly budget ceilings and how much of them is used.

use super::analytics::CategoryTotal;
use super::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Budget ceiling per expense category. A missing entry means "no budget",
/// which is different from a budget of zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryBudgets(BTreeMap<String, f64>);

impl CategoryBudgets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: &str) -> Option<f64> {
        self.0.get(category).copied()
    }

    /// Creates or replaces the budget of `category`.
    pub fn set(&mut self, category: &str, amount: f64) -> Result<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(AnalyticsError::InvalidBudget {
                category: category.to_string(),
                reason: format!("{amount} is not a non-negative amount"),
            });
        }
        self.0.insert(category.to_string(), amount);
        Ok(())
    }

    /// Removes the budget, returning what it was.
    pub fn clear(&mut self, category: &str) -> Option<f64> {
        self.0.remove(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetUtilization {
    pub category: String,
    pub spent: f64,
    pub budget: Option<f64>,
    /// Spent share of the budget in percent, capped at 100. `None` without a positive budget.
    pub utilization_pct: Option<f64>,
}

/// Joins budgets with month-to-date spend.
///
/// Lines follow the order of `categories`; categories outside that list which
/// still have spend or a budget are appended alphabetically.
pub fn budget_utilization(
    budgets: &CategoryBudgets,
    month_to_date_by_category: &[CategoryTotal],
    categories: &[String],
) -> Vec<BudgetUtilization> {
    let spent_in = |category: &str| {
        month_to_date_by_category
            .iter()
            .find(|c| c.category == category)
            .map_or(0.0, |c| c.total)
    };

    let extra: BTreeSet<&str> = month_to_date_by_category
        .iter()
        .map(|c| c.category.as_str())
        .chain(budgets.iter().map(|(category, _)| category))
        .filter(|category| !categories.iter().any(|known| known.as_str() == *category))
        .collect();

    categories
        .iter()
        .map(String::as_str)
        .chain(extra)
        .map(|category| {
            let spent = spent_in(category);
            let budget = budgets.get(category);
            let utilization_pct = budget
                .filter(|b| *b > 0.0)
                .map(|b| (spent / b * 100.0).min(100.0));
            BudgetUtilization {
                category: category.to_string(),
                spent,
                budget,
                utilization_pct,
            }
        })
        .collect()
}
