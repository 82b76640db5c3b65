use fintrack::AppCommand;
use fintrack::cli::{BudgetAction, ListFilter, NewTransaction};
use fintrack::core::period::PeriodToken;
use fintrack::core::transaction::TransactionType;
use fintrack::store::{DiskStore, TransactionStore};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// exchangerate-api style server answering for `base`.
    pub async fn create_rates_server(base: &str, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v4/latest/{base}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    /// Frankfurter style server answering for `base`.
    pub async fn create_frankfurter_server(base: &str, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("from", base))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    pub async fn create_failing_server() -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;
        mock_server
    }
}

/// Writes a config pointing the store into `dir` and the rate sources at the given servers.
fn write_config(dir: &Path, exchange_rate_api: &str, frankfurter: &str) -> String {
    let config_path = dir.join("config.yaml");
    let config_content = format!(
        r#"
default_period: month
data_path: "{}"
rates:
  timeout_secs: 5
  sources:
    - kind: exchange_rate_api
      base_url: "{}"
    - kind: frankfurter
      base_url: "{}"
"#,
        dir.join("data").display(),
        exchange_rate_api,
        frankfurter
    );
    fs::write(&config_path, config_content).expect("Failed to write config file");
    config_path.to_str().unwrap().to_string()
}

fn expense(amount: f64, category: &str) -> NewTransaction {
    NewTransaction {
        kind: TransactionType::Expense,
        amount,
        category: Some(category.to_string()),
        date: None,
        currency: None,
        description: Some(format!("{category} purchase")),
    }
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock_rates() {
    let temp_dir = TempDir::new().unwrap();
    let rates_server = test_utils::create_rates_server(
        "USD",
        r#"{"base": "USD", "rates": {"USD": 1, "RUB": 90.0, "EUR": 0.9}}"#,
    )
    .await;
    let failing = test_utils::create_failing_server().await;
    let config_path = write_config(temp_dir.path(), &rates_server.uri(), &failing.uri());
    let config = Some(config_path.as_str());

    fintrack::run_command(AppCommand::Add(expense(300.0, "Food")), config)
        .await
        .unwrap();

    let mut foreign = expense(10.0, "Transport");
    foreign.currency = Some("USD".to_string());
    fintrack::run_command(AppCommand::Add(foreign), config)
        .await
        .unwrap();

    fintrack::run_command(
        AppCommand::Budget(BudgetAction::Set {
            category: "Food".to_string(),
            amount: 200.0,
        }),
        config,
    )
    .await
    .unwrap();

    for command in [
        AppCommand::Dashboard,
        AppCommand::List(ListFilter::default()),
        AppCommand::Analytics {
            period: Some(PeriodToken::Month),
            json: false,
        },
        AppCommand::Analytics {
            period: None,
            json: true,
        },
        AppCommand::Budget(BudgetAction::Show),
        AppCommand::Rates {
            base: "USD".to_string(),
        },
        AppCommand::Currency { code: None },
    ] {
        let result = fintrack::run_command(command, config).await;
        assert!(result.is_ok(), "Command failed with: {:?}", result.err());
    }

    let store = DiskStore::open(&temp_dir.path().join("data")).unwrap();
    let loaded = store.load().unwrap();
    info!(count = loaded.transactions.len(), "Stored transactions");
    assert_eq!(loaded.transactions.len(), 2);
    assert_eq!(loaded.transactions[1].amount, 900.0);
    assert_eq!(
        loaded.transactions[1].original_currency.as_deref(),
        Some("USD")
    );
    assert_eq!(store.get_category_budgets().unwrap().get("Food"), Some(200.0));
}

#[test_log::test(tokio::test)]
async fn test_rates_fall_back_to_second_source() {
    let temp_dir = TempDir::new().unwrap();
    let failing = test_utils::create_failing_server().await;
    let frankfurter = test_utils::create_frankfurter_server(
        "EUR",
        r#"{"amount": 1.0, "base": "EUR", "rates": {"USD": 1.1}}"#,
    )
    .await;
    let config_path = write_config(temp_dir.path(), &failing.uri(), &frankfurter.uri());

    let result = fintrack::run_command(
        AppCommand::Convert {
            amount: 10.0,
            from: "EUR".to_string(),
            to: "USD".to_string(),
        },
        Some(&config_path),
    )
    .await;
    assert!(result.is_ok(), "Convert failed with: {:?}", result.err());
    assert_eq!(frankfurter.received_requests().await.unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_delete_and_reference_currency() {
    let temp_dir = TempDir::new().unwrap();
    let failing = test_utils::create_failing_server().await;
    let config_path = write_config(temp_dir.path(), &failing.uri(), &failing.uri());
    let config = Some(config_path.as_str());

    fintrack::run_command(
        AppCommand::Currency {
            code: Some("eur".to_string()),
        },
        config,
    )
    .await
    .unwrap();
    fintrack::run_command(AppCommand::Add(expense(12.0, "Health")), config)
        .await
        .unwrap();

    let id = {
        let store = DiskStore::open(&temp_dir.path().join("data")).unwrap();
        assert_eq!(store.get_default_currency().unwrap(), "EUR");
        store.load().unwrap().transactions[0].id.clone()
    };

    fintrack::run_command(AppCommand::Delete { id: id.clone() }, config)
        .await
        .unwrap();
    let again = fintrack::run_command(AppCommand::Delete { id }, config).await;
    assert!(again.unwrap_err().to_string().contains("No transaction with id"));
}

#[test_log::test(tokio::test)]
async fn test_invalid_input_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let failing = test_utils::create_failing_server().await;
    let config_path = write_config(temp_dir.path(), &failing.uri(), &failing.uri());
    let config = Some(config_path.as_str());

    let result = fintrack::run_command(AppCommand::Add(expense(5.0, "Salary")), config).await;
    assert_eq!(
        result.unwrap_err().to_string(),
        "Unknown expense category: Salary"
    );

    let missing = temp_dir.path().join("missing.yaml");
    let result = fintrack::run_command(AppCommand::Dashboard, missing.to_str()).await;
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Failed to read config file")
    );
}
