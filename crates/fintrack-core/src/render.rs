//! Render collaborator
//!
//! The orchestrator never draws anything itself. It hands finished aggregates
//! to a [`Renderer`] through handles it owns: each accepted refresh unmounts
//! the scope's previous handle and mounts a fresh one.

use serde::Serialize;

use crate::metrics::{BudgetPanel, DashboardSummary, GoalProgress, PredictionDisplay, TransactionList};
use crate::orchestrator::Scope;

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    Info,
    Success,
    Error,
}

impl NotifyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A mounted view surface
///
/// The holder owns the surface; passing it to [`Renderer::unmount`] destroys it.
#[derive(Debug, PartialEq, Eq)]
pub struct RenderHandle {
    scope: Scope,
    id: u64,
}

impl RenderHandle {
    pub fn new(scope: Scope, id: u64) -> Self {
        Self { scope, id }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Display-ready data for one scope
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "scope", content = "data", rename_all = "snake_case")]
pub enum Aggregate {
    Dashboard(DashboardSummary),
    Transactions(TransactionList),
    Goals(Vec<GoalProgress>),
    Budget(BudgetPanel),
    Prediction(PredictionDisplay),
}

impl Aggregate {
    pub fn scope(&self) -> Scope {
        match self {
            Self::Dashboard(_) => Scope::Dashboard,
            Self::Transactions(_) => Scope::TransactionsList,
            Self::Goals(_) => Scope::GoalsList,
            Self::Budget(_) => Scope::BudgetPanel,
            Self::Prediction(_) => Scope::PredictionPanel,
        }
    }
}

/// Presentation side of the client
///
/// Calls arrive synchronously from the orchestrator and must not call back
/// into it.
pub trait Renderer: Send + Sync {
    fn mount(&self, scope: Scope) -> RenderHandle;

    fn render(&self, handle: &RenderHandle, aggregate: &Aggregate);

    fn unmount(&self, handle: RenderHandle);

    fn notify(&self, level: NotifyLevel, message: &str);
}
