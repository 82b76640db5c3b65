use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use fintrack::cli::{BudgetAction, ListFilter, NewTransaction};
use fintrack::core::log::init_logging;
use fintrack::core::period::PeriodToken;
use fintrack::core::transaction::TransactionType;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct AddArgs {
    /// income or expense
    #[arg(short = 't', long = "type")]
    kind: TransactionType,
    #[arg(short, long)]
    amount: f64,
    /// One of the configured categories for the type
    #[arg(long)]
    category: Option<String>,
    /// YYYY-MM-DD, today when omitted
    #[arg(short, long)]
    date: Option<NaiveDate>,
    /// Currency the amount is given in; converted to the reference currency
    #[arg(long)]
    currency: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Subcommand)]
enum BudgetCommands {
    /// Set the monthly budget of an expense category
    Set { category: String, amount: f64 },
    /// Remove the budget of a category
    Clear { category: String },
    /// Show this month's spending against budgets
    Show,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show this month's balance, recent transactions and exchange rates
    Dashboard,
    /// Record a transaction
    Add(AddArgs),
    /// List transactions, newest first
    List {
        #[arg(short = 't', long = "type")]
        kind: Option<TransactionType>,
        #[arg(long)]
        category: Option<String>,
        /// Case-insensitive text to look for in descriptions
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Delete a transaction by id
    Delete { id: String },
    /// Period totals, comparison, forecast and budget use
    Analytics {
        /// week, month, quarter, year or all
        #[arg(short, long)]
        period: Option<PeriodToken>,
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage category budgets
    #[command(subcommand)]
    Budget(BudgetCommands),
    /// Show exchange rates for a base currency
    Rates {
        #[arg(short, long, default_value = "USD")]
        base: String,
    },
    /// Convert an amount between currencies
    Convert { amount: f64, from: String, to: String },
    /// Show or set the reference currency
    Currency { code: Option<String> },
}

impl From<Commands> for fintrack::AppCommand {
    fn from(cmd: Commands) -> fintrack::AppCommand {
        match cmd {
            Commands::Dashboard => fintrack::AppCommand::Dashboard,
            Commands::Add(args) => fintrack::AppCommand::Add(NewTransaction {
                kind: args.kind,
                amount: args.amount,
                category: args.category,
                date: args.date,
                currency: args.currency,
                description: args.description,
            }),
            Commands::List {
                kind,
                category,
                search,
            } => fintrack::AppCommand::List(ListFilter {
                kind,
                category,
                search,
            }),
            Commands::Delete { id } => fintrack::AppCommand::Delete { id },
            Commands::Analytics { period, json } => {
                fintrack::AppCommand::Analytics { period, json }
            }
            Commands::Budget(budget) => fintrack::AppCommand::Budget(match budget {
                BudgetCommands::Set { category, amount } => BudgetAction::Set { category, amount },
                BudgetCommands::Clear { category } => BudgetAction::Clear { category },
                BudgetCommands::Show => BudgetAction::Show,
            }),
            Commands::Rates { base } => fintrack::AppCommand::Rates { base },
            Commands::Convert { amount, from, to } => {
                fintrack::AppCommand::Convert { amount, from, to }
            }
            Commands::Currency { code } => fintrack::AppCommand::Currency { code },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => fintrack::cli::setup::setup_at_path(path),
            None => fintrack::cli::setup::setup(),
        },
        Some(cmd) => fintrack::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
