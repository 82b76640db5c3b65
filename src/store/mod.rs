//! Persistence for transactions, category budgets and the reference currency.

pub mod disk;
pub mod memory;

use crate::core::budget::CategoryBudgets;
use crate::core::transaction::{
    LoadedTransactions, Transaction, TransactionRecord, load_transactions,
};
use anyhow::Result;
use serde_json::Value;
use tracing::{debug, warn};

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// Reference currency used until the user picks one.
pub const DEFAULT_CURRENCY: &str = "RUB";

/// Storage the application reads and writes its data through.
///
/// Transaction entries are kept in insertion order as raw JSON values, never
/// rewritten into a typed shape. Validation happens when they are loaded for
/// display or analytics, so an entry that cannot be read is skipped there but
/// stays untouched in storage across adds and deletes.
pub trait TransactionStore: Send + Sync {
    fn list_entries(&self) -> Result<Vec<Value>>;
    fn save_entries(&self, entries: &[Value]) -> Result<()>;
    fn get_category_budgets(&self) -> Result<CategoryBudgets>;
    fn set_category_budgets(&self, budgets: &CategoryBudgets) -> Result<()>;
    fn get_default_currency(&self) -> Result<String>;
    fn set_default_currency(&self, code: &str) -> Result<()>;

    /// Stored entries as records. An entry of the wrong shape becomes an
    /// empty record so it is counted as malformed instead of hiding the rest.
    fn list_transactions(&self) -> Result<Vec<TransactionRecord>> {
        Ok(self
            .list_entries()?
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                serde_json::from_value(entry).unwrap_or_else(|e| {
                    warn!("Unreadable transaction at position {}: {}", i, e);
                    TransactionRecord::default()
                })
            })
            .collect())
    }

    /// Replaces every stored entry with `records`.
    fn save_transactions(&self, records: &[TransactionRecord]) -> Result<()> {
        let entries = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.save_entries(&entries)
    }

    /// Validated transactions, with the count of records that were dropped.
    fn load(&self) -> Result<LoadedTransactions> {
        Ok(load_transactions(&self.list_transactions()?))
    }

    fn add_transaction(&self, transaction: &Transaction) -> Result<()> {
        let mut entries = self.list_entries()?;
        entries.push(serde_json::to_value(transaction.to_record())?);
        debug!("Adding transaction {}", transaction.id);
        self.save_entries(&entries)
    }

    /// Removes every entry with `id`. Returns whether anything was removed.
    fn delete_transaction(&self, id: &str) -> Result<bool> {
        let mut entries = self.list_entries()?;
        let before = entries.len();
        entries.retain(|entry| !entry_has_id(entry, id));
        if entries.len() == before {
            debug!("No transaction with id {}", id);
            return Ok(false);
        }
        self.save_entries(&entries)?;
        Ok(true)
    }
}

/// Whether a stored entry carries `id`, written either as a string or a number.
fn entry_has_id(entry: &Value, id: &str) -> bool {
    match entry.get("id") {
        Some(Value::String(stored)) => stored == id,
        Some(Value::Number(stored)) => stored.to_string() == id,
        _ => false,
    }
}
