use anyhow::Result;
use async_trait::async_trait;
use tracing::instrument;

use super::util::fetch_rate_table;
use crate::core::currency::{ExchangeRateProvider, ExchangeRates, RateOrigin};

/// Rates from the exchangerate-api.com `v4/latest` endpoint.
pub struct ExchangeRateApiProvider {
    base_url: String,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str) -> Self {
        ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ExchangeRateProvider for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRateApiFetch", skip(self), fields(base = %base))]
    async fn get_exchange_rates(&self, base: &str) -> Result<ExchangeRates> {
        let base = base.to_uppercase();
        let url = format!("{}/v4/latest/{}", self.base_url, base);
        let rates = fetch_rate_table(&url, &base).await?;
        Ok(ExchangeRates::new(&base, rates, RateOrigin::Live))
    }
}
