//! In-memory gateway for testing
//!
//! Behaves like the finance service: accounts, per-user transactions and
//! goals, month-keyed budgets with the service's spent/remaining/note rules,
//! and the six-month moving-average forecast. Clones share state.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{Datelike, Local, Months, NaiveDate};

use crate::error::{Error, Result};
use crate::models::{
    BudgetPeriod, BudgetSnapshot, Goal, GoalStatus, NewGoal, NewTransaction, PredictionSeries,
    Session, Transaction, TransactionKind,
};

use super::Gateway;

const HISTORY_MONTHS: u32 = 3;
const FORECAST_WINDOW: usize = 6;
const FORECAST_GROWTH: f64 = 1.05;

struct MockUser {
    id: i64,
    name: String,
    email: String,
    password: String,
}

#[derive(Default)]
struct MockState {
    users: Vec<MockUser>,
    transactions: Vec<(i64, Transaction)>,
    goals: Vec<(i64, Goal)>,
    budgets: BTreeMap<(i64, String), f64>,
    next_id: i64,
    offline: bool,
    reject_next: Option<String>,
    calls: Vec<&'static str>,
}

impl MockState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Record a call and apply any injected failure
    fn enter(&mut self, op: &'static str) -> Result<()> {
        self.calls.push(op);
        if self.offline {
            return Err(Error::Network("mock service offline".to_string()));
        }
        if let Some(message) = self.reject_next.take() {
            return Err(Error::Server(message));
        }
        Ok(())
    }

    fn expenses_in(&self, user_id: i64, month_year: &str) -> f64 {
        self.transactions
            .iter()
            .filter(|(uid, t)| *uid == user_id && t.kind == TransactionKind::Expense)
            .filter(|(_, t)| t.date.map(month_key).as_deref() == Some(month_year))
            .map(|(_, t)| t.amount)
            .sum()
    }
}

/// Mock finance service
#[derive(Clone)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
    today: Option<NaiveDate>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            today: None,
        }
    }

    /// Pin "today" so budget months and remaining days are deterministic
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Create an account directly and return its session
    pub fn seed_user(&self, name: &str, email: &str, password: &str) -> Session {
        self.with_state(|s| {
            let id = s.next_id();
            s.users.push(MockUser {
                id,
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            });
            Session {
                user_id: id,
                display_name: name.to_string(),
                email: Some(email.to_string()),
            }
        })
    }

    /// Make every call fail with `Network` until turned off
    pub fn set_offline(&self, offline: bool) {
        self.with_state(|s| s.offline = offline);
    }

    /// Reject the next call with a `Server` error carrying `message`
    pub fn reject_next(&self, message: &str) {
        self.with_state(|s| s.reject_next = Some(message.to_string()));
    }

    /// Names of the operations called so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn clear_calls(&self) {
        self.with_state(|s| s.calls.clear());
    }

    /// Mark a goal's status (the service has no endpoint for this)
    pub fn set_goal_status(&self, goal_id: i64, status: GoalStatus) {
        self.with_state(|s| {
            for (_, goal) in s.goals.iter_mut() {
                if goal.id == Some(goal_id) {
                    goal.status = status;
                }
            }
        });
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session> {
        self.with_state(|s| {
            s.enter("authenticate")?;
            let user = s
                .users
                .iter()
                .find(|u| u.email == email)
                .ok_or_else(|| Error::Auth("Account not found".to_string()))?;
            if user.password != password {
                return Err(Error::Auth("Invalid credentials".to_string()));
            }
            Ok(Session {
                user_id: user.id,
                display_name: user.name.clone(),
                email: Some(user.email.clone()),
            })
        })
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<()> {
        self.with_state(|s| {
            s.enter("register")?;
            if name.is_empty() || email.is_empty() || password.is_empty() {
                return Err(Error::Validation("All fields are required".to_string()));
            }
            if s.users.iter().any(|u| u.email == email) {
                return Err(Error::Validation("Account already exists".to_string()));
            }
            let id = s.next_id();
            s.users.push(MockUser {
                id,
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            });
            Ok(())
        })
    }

    async fn list_transactions(&self, user_id: i64) -> Result<Vec<Transaction>> {
        self.with_state(|s| {
            s.enter("list_transactions")?;
            let mut txns: Vec<Transaction> = s
                .transactions
                .iter()
                .filter(|(uid, _)| *uid == user_id)
                .map(|(_, t)| t.clone())
                .collect();
            // Newest first, like the service
            txns.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
            Ok(txns)
        })
    }

    async fn create_transaction(&self, user_id: i64, tx: &NewTransaction) -> Result<Transaction> {
        self.with_state(|s| {
            s.enter("create_transaction")?;
            if tx.category.is_empty() || tx.amount == 0.0 {
                return Err(Error::Server("All fields required".to_string()));
            }
            let id = s.next_id();
            let created = Transaction {
                id: Some(id),
                category: tx.category.clone(),
                amount: tx.amount,
                kind: tx.kind,
                date: Some(tx.date),
            };
            s.transactions.push((user_id, created.clone()));
            Ok(created)
        })
    }

    async fn list_goals(&self, user_id: i64) -> Result<Vec<Goal>> {
        self.with_state(|s| {
            s.enter("list_goals")?;
            let mut goals: Vec<Goal> = s
                .goals
                .iter()
                .filter(|(uid, _)| *uid == user_id)
                .map(|(_, g)| g.clone())
                .collect();
            goals.sort_by(|a, b| b.id.cmp(&a.id));
            Ok(goals)
        })
    }

    async fn create_goal(&self, user_id: i64, goal: &NewGoal) -> Result<Goal> {
        self.with_state(|s| {
            s.enter("create_goal")?;
            if goal.name.is_empty() || goal.target_amount == 0.0 {
                return Err(Error::Server("All fields required".to_string()));
            }
            let id = s.next_id();
            let created = Goal {
                id: Some(id),
                name: goal.name.clone(),
                target_amount: goal.target_amount,
                saved_amount: goal.saved_amount,
                due_date: Some(goal.due_date),
                status: GoalStatus::Active,
            };
            s.goals.push((user_id, created.clone()));
            Ok(created)
        })
    }

    async fn get_budget(&self, user_id: i64) -> Result<BudgetSnapshot> {
        let today = self.today();
        self.with_state(|s| {
            s.enter("get_budget")?;
            let current_key = month_key(today);
            let amount = s
                .budgets
                .get(&(user_id, current_key.clone()))
                .copied()
                .unwrap_or(0.0);
            let spent = s.expenses_in(user_id, &current_key);
            let remaining = amount - spent;

            let current = BudgetPeriod {
                month_year: current_key,
                amount,
                spent,
                remaining,
                remaining_days: days_in_month(today).saturating_sub(today.day()),
                note: budget_note(amount, remaining).to_string(),
            };

            let previous = (1..=HISTORY_MONTHS)
                .filter_map(|back| today.checked_sub_months(Months::new(back)))
                .map(month_key)
                .filter_map(|key| {
                    let amount = s.budgets.get(&(user_id, key.clone())).copied();
                    let spent = s.expenses_in(user_id, &key);
                    if amount.is_none() && spent == 0.0 {
                        return None;
                    }
                    let amount = amount.unwrap_or(0.0);
                    Some(BudgetPeriod {
                        month_year: key,
                        amount,
                        spent,
                        remaining: amount - spent,
                        ..Default::default()
                    })
                })
                .collect();

            Ok(BudgetSnapshot { current, previous })
        })
    }

    async fn set_budget(&self, user_id: i64, amount: f64) -> Result<()> {
        let key = month_key(self.today());
        self.with_state(|s| {
            s.enter("set_budget")?;
            s.budgets.insert((user_id, key), amount);
            Ok(())
        })
    }

    async fn get_predictions(&self, user_id: i64) -> Result<PredictionSeries> {
        self.with_state(|s| {
            s.enter("get_predictions")?;
            let mut monthly: BTreeMap<String, f64> = BTreeMap::new();
            for (_, t) in s.transactions.iter().filter(|(uid, t)| {
                *uid == user_id && t.kind == TransactionKind::Expense
            }) {
                if let Some(date) = t.date {
                    *monthly.entry(month_key(date)).or_insert(0.0) += t.amount;
                }
            }
            let skip = monthly.len().saturating_sub(FORECAST_WINDOW);
            let recent: Vec<(String, f64)> = monthly.into_iter().skip(skip).collect();
            Ok(forecast(recent))
        })
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

/// Moving-average forecast over chronological monthly expense totals
///
/// Each month's prediction is the next month's actual; the last one is the
/// average of the window grown by 5%.
pub fn forecast(monthly: Vec<(String, f64)>) -> PredictionSeries {
    if monthly.is_empty() {
        return PredictionSeries::default();
    }
    let (labels, actual): (Vec<String>, Vec<f64>) = monthly
        .into_iter()
        .map(|(label, total)| (label, total.trunc()))
        .unzip();
    let average = actual.iter().sum::<f64>() / actual.len() as f64;
    let next_prediction = (average * FORECAST_GROWTH).round();
    let mut predicted: Vec<f64> = actual.iter().skip(1).copied().collect();
    predicted.push(next_prediction);

    PredictionSeries {
        labels,
        actual,
        predicted,
        next_prediction,
    }
}

fn budget_note(amount: f64, remaining: f64) -> &'static str {
    if amount <= 0.0 {
        "No budget set for this month."
    } else if remaining < 0.0 {
        "🚨 Over budget. Time to cut expenses!"
    } else if remaining / amount >= 0.40 {
        "✅ All good, you're managing well!"
    } else {
        "⚠️ You're at the edge, spend carefully!"
    }
}

fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}
