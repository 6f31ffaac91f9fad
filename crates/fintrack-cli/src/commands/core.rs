//! Client construction and shared utilities
//!
//! This module contains:
//! - `open_client` - Build the orchestrator from flags, config and the data dir
//! - `demo_gateway` - Seeded in-memory service for `--offline`
//! - `AlreadyReported` - Failure marker for errors the renderer already printed

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, Months, NaiveDate};
use fintrack_core::gateway::{Gateway, GatewayClient, MockGateway};
use fintrack_core::models::{NewGoal, NewTransaction, TransactionKind};
use fintrack_core::{ClientConfig, Orchestrator, RefreshOutcome, Scope, SessionStore};
use tracing::debug;

use crate::terminal::TerminalRenderer;

pub type Client = Orchestrator<GatewayClient, TerminalRenderer>;

pub const DEMO_EMAIL: &str = "demo@fintrack.local";
pub const DEMO_PASSWORD: &str = "demo";

/// The command failed and the user has already been told why
#[derive(Debug)]
pub struct AlreadyReported;

impl fmt::Display for AlreadyReported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation failed")
    }
}

impl std::error::Error for AlreadyReported {}

/// Map a core result whose failure was already notified
pub fn reported<T>(result: fintrack_core::Result<T>) -> Result<T> {
    result.map_err(|_| AlreadyReported.into())
}

/// Fail the command if any scope failed to refresh
pub fn check_outcomes(outcomes: &[(Scope, RefreshOutcome)]) -> Result<()> {
    if outcomes
        .iter()
        .any(|(_, outcome)| matches!(outcome, RefreshOutcome::Failed(_)))
    {
        return Err(AlreadyReported.into());
    }
    Ok(())
}

/// Resolve configuration: data dir first, then config file, env, and flag
pub fn load_config(api_base: Option<&str>, data_dir: Option<PathBuf>) -> Result<ClientConfig> {
    let config = ClientConfig::load(data_dir).context("Failed to load configuration")?;
    Ok(match api_base {
        Some(base) => config.with_api_base(base),
        None => config,
    })
}

pub async fn open_client(
    api_base: Option<&str>,
    data_dir: Option<PathBuf>,
    offline: bool,
) -> Result<Client> {
    let config = load_config(api_base, data_dir)?;

    let gateway = if offline {
        GatewayClient::Mock(demo_gateway().await?)
    } else {
        GatewayClient::from_config(&config).context("Failed to create HTTP client")?
    };

    let session = SessionStore::open(&config.data_dir).with_context(|| {
        format!(
            "Failed to open data directory {}",
            config.data_dir.display()
        )
    })?;

    debug!(
        host = gateway.host(),
        data_dir = %config.data_dir.display(),
        timeout_secs = config.timeout.as_secs(),
        "Client ready"
    );
    Ok(Orchestrator::new(gateway, TerminalRenderer::new(), session))
}

/// In-memory service with a demo account and a few months of history
pub async fn demo_gateway() -> Result<MockGateway> {
    let gateway = MockGateway::new();
    let user = gateway.seed_user("Demo", DEMO_EMAIL, DEMO_PASSWORD);
    let today = Local::now().date_naive();

    let month = |back: u32, day: u32| -> NaiveDate {
        let first = today
            .checked_sub_months(Months::new(back))
            .unwrap_or(today);
        NaiveDate::from_ymd_opt(first.year(), first.month(), day).unwrap_or(first)
    };

    let history = [
        ("Salary", 50000.0, TransactionKind::Income, month(2, 1)),
        ("Rent", 15000.0, TransactionKind::Expense, month(2, 3)),
        ("Groceries", 6200.0, TransactionKind::Expense, month(2, 12)),
        ("Salary", 50000.0, TransactionKind::Income, month(1, 1)),
        ("Rent", 15000.0, TransactionKind::Expense, month(1, 3)),
        ("Travel", 9800.0, TransactionKind::Expense, month(1, 18)),
        ("Salary", 52000.0, TransactionKind::Income, month(0, 1)),
        ("Rent", 15000.0, TransactionKind::Expense, month(0, 1)),
    ];
    for (category, amount, kind, date) in history {
        let tx = NewTransaction {
            category: category.to_string(),
            amount,
            kind,
            date,
        };
        gateway.create_transaction(user.user_id, &tx).await?;
    }

    let goal = NewGoal {
        name: "Emergency fund".to_string(),
        target_amount: 100000.0,
        saved_amount: 35000.0,
        due_date: today
            .checked_add_months(Months::new(6))
            .unwrap_or(today),
    };
    gateway.create_goal(user.user_id, &goal).await?;
    gateway.set_budget(user.user_id, 25000.0).await?;

    // Seeding is not user activity
    gateway.clear_calls();
    Ok(gateway)
}
