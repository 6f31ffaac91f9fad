//! Fintrack CLI - Personal finance tracker client
//!
//! Usage:
//!   fintrack login --email E --password P    Log in and save the session
//!   fintrack dashboard                       Totals, active goals, forecast
//!   fintrack transactions add --category C --amount N --kind expense
//!   fintrack budget set --amount N           Set this month's budget

mod cli;
mod commands;
mod terminal;


use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use fintrack_core::Page;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use commands::AlreadyReported;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is::<AlreadyReported>() => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = commands::open_client(cli.api_base.as_deref(), cli.data_dir, cli.offline).await?;

    match cli.command {
        Commands::Login { email, password } => commands::cmd_login(&client, &email, &password).await,
        Commands::Signup {
            name,
            email,
            password,
            confirm,
        } => commands::cmd_signup(&client, &name, &email, &password, &confirm).await,
        Commands::Logout => commands::cmd_logout(&client),
        Commands::Whoami => commands::cmd_whoami(&client),
        Commands::ResetPassword { email } => commands::cmd_reset_password(&client, &email),
        Commands::Dashboard => commands::cmd_page(&client, Page::Dashboard).await,
        Commands::Transactions { action } => match action {
            None | Some(TransactionsAction::List) => {
                commands::cmd_page(&client, Page::Transactions).await
            }
            Some(TransactionsAction::Add {
                category,
                amount,
                kind,
                date,
            }) => commands::cmd_transactions_add(&client, &category, amount, &kind, date).await,
        },
        Commands::Goals { action } => match action {
            None | Some(GoalsAction::List) => commands::cmd_page(&client, Page::Goals).await,
            Some(GoalsAction::Add { name, target, date }) => {
                commands::cmd_goals_add(&client, &name, target, date).await
            }
        },
        Commands::Budget { action } => match action {
            None | Some(BudgetAction::Show) => commands::cmd_page(&client, Page::Budget).await,
            Some(BudgetAction::Set { amount }) => commands::cmd_budget_set(&client, amount).await,
        },
        Commands::Predictions => commands::cmd_page(&client, Page::Predictions).await,
    }
}
