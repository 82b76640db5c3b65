use anyhow::Result;
use async_trait::async_trait;
use tracing::instrument;

use super::util::fetch_rate_table;
use crate::core::currency::{ExchangeRateProvider, ExchangeRates, RateOrigin};

/// Rates from the Frankfurter (ECB reference rates) `latest` endpoint.
///
/// The response omits the base currency itself; `ExchangeRates::rate` covers that.
pub struct FrankfurterProvider {
    base_url: String,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str) -> Self {
        FrankfurterProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ExchangeRateProvider for FrankfurterProvider {
    #[instrument(name = "FrankfurterFetch", skip(self), fields(base = %base))]
    async fn get_exchange_rates(&self, base: &str) -> Result<ExchangeRates> {
        let base = base.to_uppercase();
        let url = format!("{}/latest?from={}", self.base_url, base);
        let rates = fetch_rate_table(&url, &base).await?;
        Ok(ExchangeRates::new(&base, rates, RateOrigin::Live))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_successful_rates_fetch() {
        let mock_server = MockServer::start().await;
        let body = r#"{
            "amount": 1.0,
            "base": "EUR",
            "date": "2024-06-01",
            "rates": {"USD": 1.08, "GBP": 0.85}
        }"#;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("from", "EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let provider = FrankfurterProvider::new(&format!("{}/", mock_server.uri()));
        let rates = provider.get_exchange_rates("EUR").await.unwrap();

        assert_eq!(rates.rate("USD"), Some(1.08));
        assert_eq!(rates.rate("GBP"), Some(0.85));
        assert_eq!(rates.rate("EUR"), Some(1.0));
    }

    #[tokio::test]
    async fn test_unknown_base_currency() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string(r#"{"message": "not found"}"#),
            )
            .mount(&mock_server)
            .await;

        let provider = FrankfurterProvider::new(&mock_server.uri());
        let result = provider.get_exchange_rates("XYZ").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 404 Not Found for base currency: XYZ"
        );
    }
}
