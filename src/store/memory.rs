use super::{DEFAULT_CURRENCY, TransactionStore};
use crate::core::budget::CategoryBudgets;
use anyhow::{Result, anyhow};
use serde_json::Value;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Ledger {
    transactions: Vec<Value>,
    budgets: CategoryBudgets,
    currency: Option<String>,
}

/// Non-persistent store, used in tests and as a scratch ledger.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Ledger>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with raw transaction entries.
    pub fn with_entries(entries: Vec<Value>) -> Self {
        MemoryStore {
            inner: RwLock::new(Ledger {
                transactions: entries,
                ..Default::default()
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Ledger>> {
        self.inner
            .read()
            .map_err(|_| anyhow!("Memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Ledger>> {
        self.inner
            .write()
            .map_err(|_| anyhow!("Memory store lock poisoned"))
    }
}

impl TransactionStore for MemoryStore {
    fn list_entries(&self) -> Result<Vec<Value>> {
        Ok(self.read()?.transactions.clone())
    }

    fn save_entries(&self, entries: &[Value]) -> Result<()> {
        self.write()?.transactions = entries.to_vec();
        Ok(())
    }

    fn get_category_budgets(&self) -> Result<CategoryBudgets> {
        Ok(self.read()?.budgets.clone())
    }

    fn set_category_budgets(&self, budgets: &CategoryBudgets) -> Result<()> {
        self.write()?.budgets = budgets.clone();
        Ok(())
    }

    fn get_default_currency(&self) -> Result<String> {
        Ok(self
            .read()?
            .currency
            .clone()
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))
    }

    fn set_default_currency(&self, code: &str) -> Result<()> {
        self.write()?.currency = Some(code.to_string());
        Ok(())
    }
}
