//! Domain models for fintrack
//!
//! These are the canonical shapes held by the client. Upstream field-name and
//! format variations are normalized away in `gateway::wire` before anything
//! here is constructed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The authenticated identity for this client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i64,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction as held by the client (no edit path once created)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Server id; `None` for a freshly created record the service didn't echo
    pub id: Option<i64>,
    pub category: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub date: Option<NaiveDate>,
}

/// Payload for creating a transaction
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub category: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub date: NaiveDate,
}

/// Lifecycle status of a savings goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Closed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Closed => "closed",
        }
    }

    /// Map an upstream status string; unknown values (e.g. `in_progress`) are active
    pub fn from_upstream(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "completed" | "done" => Self::Completed,
            "closed" => Self::Closed,
            _ => Self::Active,
        }
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Option<i64>,
    pub name: String,
    pub target_amount: f64,
    /// May exceed `target_amount`
    pub saved_amount: f64,
    pub due_date: Option<NaiveDate>,
    pub status: GoalStatus,
}

/// Payload for creating a goal
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: f64,
    pub saved_amount: f64,
    pub due_date: NaiveDate,
}

/// One month of budget data
///
/// `spent` may exceed `amount`; that overspend is a valid state. An `amount`
/// of zero or less means no budget was set for the month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BudgetPeriod {
    /// Period key, `YYYY-MM`
    pub month_year: String,
    pub amount: f64,
    pub spent: f64,
    /// As reported by the service (amount - spent, may be negative)
    pub remaining: f64,
    pub remaining_days: u32,
    pub note: String,
}

/// Current month plus recent history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BudgetSnapshot {
    pub current: BudgetPeriod,
    pub previous: Vec<BudgetPeriod>,
}

/// Monthly expense history with the service's forecast
///
/// `labels`, `actual` and `predicted` have equal lengths, or are all empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PredictionSeries {
    pub labels: Vec<String>,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
    pub next_prediction: f64,
}

impl PredictionSeries {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.actual.is_empty() && self.predicted.is_empty()
    }
}
