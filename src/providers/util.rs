use anyhow::{Error, anyhow};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay_ms`: Milliseconds between retry attempts
///
/// # Returns
/// Either the successful result or the error after all attempts
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// Body shape shared by the supported rate APIs; only `rates` is read.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: Option<BTreeMap<String, f64>>,
}

/// Fetches `url` and extracts a non-empty `rates` table from the JSON body.
pub async fn fetch_rate_table(url: &str, base: &str) -> Result<BTreeMap<String, f64>, Error> {
    debug!("Requesting exchange rates from {}", url);

    let client = reqwest::Client::builder().user_agent("fintrack/1.0").build()?;
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| anyhow!("Request error: {} for base currency: {}", e, base))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "HTTP error: {} for base currency: {}",
            response.status(),
            base
        ));
    }

    let text = response.text().await?;
    let data: LatestRatesResponse = serde_json::from_str(&text)
        .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", base, e))?;

    match data.rates {
        Some(rates) if !rates.is_empty() => Ok(rates),
        _ => Err(anyhow!("No rate data found for base currency: {}", base)),
    }
}
