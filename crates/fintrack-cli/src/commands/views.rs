//! View command implementations (dashboard, transactions, goals, budget, predictions)
//!
//! Listing commands load a page through the orchestrator; adding commands
//! submit a form, after which the orchestrator re-renders the dependent views.

use anyhow::Result;
use chrono::NaiveDate;
use fintrack_core::{GoalForm, Page, TransactionForm};

use super::{check_outcomes, reported, Client};

pub async fn cmd_page(client: &Client, page: Page) -> Result<()> {
    let outcomes = client.page_load(page).await;
    check_outcomes(&outcomes)
}

pub async fn cmd_transactions_add(
    client: &Client,
    category: &str,
    amount: f64,
    kind: &str,
    date: Option<NaiveDate>,
) -> Result<()> {
    let form = TransactionForm {
        category: category.to_string(),
        amount,
        kind: kind.to_string(),
        date,
    };
    reported(client.submit_transaction(&form).await)?;
    Ok(())
}

pub async fn cmd_goals_add(
    client: &Client,
    name: &str,
    target: f64,
    due_date: Option<NaiveDate>,
) -> Result<()> {
    let form = GoalForm {
        name: name.to_string(),
        target,
        due_date,
    };
    reported(client.submit_goal(&form).await)?;
    Ok(())
}

pub async fn cmd_budget_set(client: &Client, amount: f64) -> Result<()> {
    reported(client.submit_budget(amount).await)
}
