//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Fintrack - Track income, expenses, savings goals and budgets
#[derive(Parser)]
#[command(name = "fintrack")]
#[command(about = "Personal finance tracker client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Finance service base URL (overrides config file and FINTRACK_API_BASE)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Directory holding the saved session and config.toml
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Use a built-in demo service instead of the network
    ///
    /// The demo account is demo@fintrack.local / demo. Demo data resets on
    /// every run.
    #[arg(long, global = true)]
    pub offline: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Create an account
    Signup {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Password confirmation
        #[arg(long)]
        confirm: String,
    },

    /// Forget the saved session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Request a password reset link
    ResetPassword {
        #[arg(long)]
        email: String,
    },

    /// Show totals, active goals and the expense forecast
    Dashboard,

    /// List or add transactions
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// List or add savings goals
    Goals {
        #[command(subcommand)]
        action: Option<GoalsAction>,
    },

    /// Show or set this month's budget
    Budget {
        #[command(subcommand)]
        action: Option<BudgetAction>,
    },

    /// Show monthly expenses with next month's forecast
    Predictions,
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List transactions, newest first
    List,

    /// Add a transaction
    Add {
        #[arg(long)]
        category: String,

        #[arg(long)]
        amount: f64,

        /// income or expense
        #[arg(long, default_value = "expense")]
        kind: String,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
pub enum GoalsAction {
    /// List goals with progress
    List,

    /// Add a savings goal
    Add {
        #[arg(long)]
        name: String,

        /// Target amount
        #[arg(long)]
        target: f64,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Show this month's budget and recent months
    Show,

    /// Set this month's budget
    Set {
        #[arg(long)]
        amount: f64,
    },
}
