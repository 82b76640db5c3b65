//! Currency conversion abstractions

use super::error::AnalyticsError;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Codes shown by the rates widget, quoted against USD.
pub const TRACKED_CURRENCIES: &[&str] = &["EUR", "RUB", "GBP", "JPY", "CNY"];

/// Where a set of rates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RateOrigin {
    Live,
    Cached,
    Stale,
    Default,
}

/// Rates of every listed code against `base`: 1 `base` = `rates[code]` `code`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRates {
    pub base: String,
    pub rates: BTreeMap<String, f64>,
    pub origin: RateOrigin,
}

impl ExchangeRates {
    pub fn new(base: &str, rates: BTreeMap<String, f64>, origin: RateOrigin) -> Self {
        Self {
            base: base.to_uppercase(),
            rates,
            origin,
        }
    }

    pub fn with_origin(mut self, origin: RateOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        let code = code.to_uppercase();
        if code == self.base {
            return Some(1.0);
        }
        self.rates.get(&code).copied().filter(|r| *r > 0.0)
    }

    pub fn convert(&self, amount: f64, to: &str) -> Result<f64, AnalyticsError> {
        self.rate(to)
            .map(|rate| amount * rate)
            .ok_or_else(|| AnalyticsError::MissingRate {
                from: self.base.clone(),
                to: to.to_uppercase(),
            })
    }
}

#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    async fn get_exchange_rates(&self, base: &str) -> Result<ExchangeRates>;
}

/// Converts `amount` between two currencies using rates quoted against `from`.
pub async fn convert_currency(
    provider: &dyn ExchangeRateProvider,
    amount: f64,
    from: &str,
    to: &str,
) -> Result<f64> {
    if from.eq_ignore_ascii_case(to) {
        debug!("No currency conversion needed ({from} -> {to})");
        return Ok(amount);
    }
    let rates = provider.get_exchange_rates(from).await?;
    let converted = rates.convert(amount, to)?;
    debug!(
        origin = ?rates.origin,
        "Converted {amount} from {from} to {to}: {converted}"
    );
    Ok(converted)
}
