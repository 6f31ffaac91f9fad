//! Fintrack Core Library
//!
//! Client-side data synchronization and derived metrics for the fintrack
//! personal finance client:
//! - Session store with a durable identity slot
//! - Remote data gateway over the finance service (HTTP or in-memory)
//! - Pure derived-metrics functions (totals, goal progress, budget status, predictions)
//! - View refresh orchestrator with per-scope stale-response discarding
//! - Input validation for the client's forms

pub mod config;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod session;
pub mod validation;

/// Test utilities including a mock finance service
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::ClientConfig;
pub use error::{Error, ErrorKind, Result};
pub use gateway::{Gateway, GatewayClient, HttpGateway, MockGateway};
pub use metrics::{
    BudgetPanel, BudgetSeverity, BudgetStatus, DashboardSummary, GoalProgress, PredictionDisplay,
    Totals, TransactionList,
};
pub use models::{
    BudgetPeriod, BudgetSnapshot, Goal, GoalStatus, NewGoal, NewTransaction, PredictionSeries,
    Session, Transaction, TransactionKind,
};
pub use orchestrator::{MutationKind, Orchestrator, Page, RefreshOutcome, Scope, ViewState};
pub use render::{Aggregate, NotifyLevel, RenderHandle, Renderer};
pub use session::SessionStore;
pub use validation::{GoalForm, LoginForm, SignupForm, TransactionForm};
