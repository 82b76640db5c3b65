use super::{DEFAULT_CURRENCY, TransactionStore};
use crate::core::budget::CategoryBudgets;
use anyhow::{Context, Result};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

const PARTITION: &str = "ledger";
const TRANSACTIONS_KEY: &str = "transactions";
const BUDGETS_KEY: &str = "category_budgets";
const CURRENCY_KEY: &str = "default_currency";

/// Store backed by a fjall keyspace. Each key holds one JSON document.
pub struct DiskStore {
    keyspace: Keyspace,
    ledger: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;
        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open data store at {}", path.display()))?;
        let ledger = keyspace.open_partition(PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened data store at {}", path.display());
        Ok(DiskStore { keyspace, ledger })
    }

    fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.put_raw(key, &serde_json::to_vec(value)?)
    }

    fn put_raw(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.ledger.insert(key, bytes)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Stored {} ({} bytes)", key, bytes.len());
        Ok(())
    }
}

impl TransactionStore for DiskStore {
    fn list_entries(&self) -> Result<Vec<Value>> {
        let Some(raw) = self.ledger.get(TRANSACTIONS_KEY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_slice(&raw).context("Stored transactions are not a JSON array")
    }

    fn save_entries(&self, entries: &[Value]) -> Result<()> {
        self.put_json(TRANSACTIONS_KEY, entries)
    }

    fn get_category_budgets(&self) -> Result<CategoryBudgets> {
        let Some(raw) = self.ledger.get(BUDGETS_KEY)? else {
            return Ok(CategoryBudgets::new());
        };
        Ok(serde_json::from_slice(&raw).unwrap_or_else(|e| {
            warn!("Ignoring corrupt category budgets: {}", e);
            CategoryBudgets::new()
        }))
    }

    fn set_category_budgets(&self, budgets: &CategoryBudgets) -> Result<()> {
        self.put_json(BUDGETS_KEY, budgets)
    }

    fn get_default_currency(&self) -> Result<String> {
        let currency = self
            .ledger
            .get(CURRENCY_KEY)?
            .map(|raw| String::from_utf8_lossy(&raw).trim().to_string())
            .filter(|code| !code.is_empty());
        Ok(currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))
    }

    fn set_default_currency(&self, code: &str) -> Result<()> {
        self.put_raw(CURRENCY_KEY, code.as_bytes())
    }
}
