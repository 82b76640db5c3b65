pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::{BudgetAction, ListFilter, NewTransaction};
use crate::core::config::AppConfig;
use crate::core::period::PeriodToken;
use crate::providers::FallbackRateProvider;
use crate::store::DiskStore;
use anyhow::Result;
use chrono::Local;
use tracing::{debug, info};

pub enum AppCommand {
    Dashboard,
    Add(NewTransaction),
    List(ListFilter),
    Delete { id: String },
    Analytics { period: Option<PeriodToken>, json: bool },
    Budget(BudgetAction),
    Rates { base: String },
    Convert { amount: f64, from: String, to: String },
    Currency { code: Option<String> },
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fintrack starting...");

    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");

    let store = DiskStore::open(&config.default_data_path()?)?;
    let provider = FallbackRateProvider::from_config(&config.rates);
    let now = Local::now().naive_local();
    let today = now.date();

    match command {
        AppCommand::Dashboard => cli::dashboard::show_dashboard(&store, &provider, today).await,
        AppCommand::Add(input) => {
            let transaction = cli::transactions::add_transaction(
                &store,
                &provider,
                &config.categories,
                input,
                today,
            )
            .await?;
            println!("Added transaction {}", transaction.id);
            Ok(())
        }
        AppCommand::List(filter) => cli::transactions::list_transactions(&store, &filter),
        AppCommand::Delete { id } => cli::transactions::delete_transaction(&store, &id),
        AppCommand::Analytics { period, json } => {
            cli::analytics::show_analytics(&store, &config, period, json, now)
        }
        AppCommand::Budget(action) => {
            cli::budget::run_budget(&store, &config.categories, action, today)
        }
        AppCommand::Rates { base } => cli::rates::show_rates(&provider, &base).await,
        AppCommand::Convert { amount, from, to } => {
            cli::rates::convert(&provider, amount, &from, &to).await
        }
        AppCommand::Currency { code } => cli::rates::reference_currency(&store, code.as_deref()),
    }
}
