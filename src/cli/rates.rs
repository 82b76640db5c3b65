use super::ui;
use crate::core::currency::{ExchangeRateProvider, ExchangeRates, convert_currency};
use crate::store::TransactionStore;
use anyhow::{Result, bail};
use comfy_table::Cell;
use tracing::info;

pub fn render_rates(rates: &ExchangeRates) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Per 1 {}", rates.base)),
    ]);
    for (code, rate) in &rates.rates {
        if *code == rates.base {
            continue;
        }
        table.add_row(vec![Cell::new(code), ui::amount_cell_precise(*rate)]);
    }
    format!(
        "{}\n{}",
        table,
        ui::rate_origin_note(rates.origin)
    )
}

pub async fn show_rates(provider: &dyn ExchangeRateProvider, base: &str) -> Result<()> {
    let spinner = ui::new_spinner(&format!("Loading {} rates...", base.to_uppercase()));
    let rates = provider.get_exchange_rates(base).await;
    spinner.finish_and_clear();
    println!("{}", render_rates(&rates?));
    Ok(())
}

pub async fn convert(
    provider: &dyn ExchangeRateProvider,
    amount: f64,
    from: &str,
    to: &str,
) -> Result<()> {
    if !amount.is_finite() {
        bail!("Amount must be a number, got {}", amount);
    }
    let spinner = ui::new_spinner("Converting...");
    let converted = convert_currency(provider, amount, from, to).await;
    spinner.finish_and_clear();
    println!(
        "{:.2} {} = {}",
        amount,
        from.to_uppercase(),
        ui::style_text(
            &format!("{:.2} {}", converted?, to.to_uppercase()),
            ui::StyleType::TotalLabel
        )
    );
    Ok(())
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Shows the reference currency, or changes it when `code` is given.
///
/// Stored amounts are not converted when it changes.
pub fn reference_currency(store: &dyn TransactionStore, code: Option<&str>) -> Result<()> {
    match code {
        None => println!("{}", store.get_default_currency()?),
        Some(code) => {
            if !is_currency_code(code) {
                bail!("Invalid currency code: {}", code);
            }
            let code = code.to_uppercase();
            store.set_default_currency(&code)?;
            info!("Reference currency set to {}", code);
            println!("Reference currency set to {code}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::RateOrigin;
    use crate::store::MemoryStore;
    use std::collections::BTreeMap;

    #[test]
    fn test_render_rates_skips_base() {
        let rates = ExchangeRates::new(
            "USD",
            BTreeMap::from([
                ("USD".to_string(), 1.0),
                ("EUR".to_string(), 0.921),
                ("JPY".to_string(), 151.2345),
            ]),
            RateOrigin::Default,
        );
        let output = console::strip_ansi_codes(&render_rates(&rates)).to_string();
        assert!(output.contains("Per 1 USD"));
        assert!(output.contains("0.9210"));
        assert!(output.contains("151.2345"));
        assert!(output.contains("offline defaults"));
        assert_eq!(output.matches("USD").count(), 1);
    }

    #[test]
    fn test_reference_currency() {
        let store = MemoryStore::new();
        reference_currency(&store, Some("usd")).unwrap();
        assert_eq!(store.get_default_currency().unwrap(), "USD");

        assert!(reference_currency(&store, Some("dollars")).is_err());
        assert_eq!(store.get_default_currency().unwrap(), "USD");
        reference_currency(&store, None).unwrap();
    }
}
