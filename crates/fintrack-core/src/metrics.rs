//! Derived metrics
//!
//! Pure functions from raw entity collections to display-ready aggregates.
//! No I/O, no hidden state: the same input always yields bit-identical output,
//! and every function is total.

use serde::Serialize;

use crate::models::{
    BudgetPeriod, BudgetSnapshot, Goal, GoalStatus, PredictionSeries, Transaction,
    TransactionKind,
};

/// Label shown on the axis when there is no history to chart
pub const PLACEHOLDER_LABEL: &str = "Next Month";

/// A budget is in warning once less than this share of it remains
const WARNING_SHARE: f64 = 0.20;

/// Most transactions shown in the list view
pub const TRANSACTION_LIST_LIMIT: usize = 200;

/// Income, expense and net saving over a set of transactions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
    /// income - expense, negative when spending exceeds income
    pub saving: f64,
}

pub fn compute_totals(transactions: &[Transaction]) -> Totals {
    let (income, expense) =
        transactions
            .iter()
            .fold((0.0, 0.0), |(income, expense), t| match t.kind {
                TransactionKind::Income => (income + t.amount, expense),
                TransactionKind::Expense => (income, expense + t.amount),
            });
    Totals {
        income,
        expense,
        saving: income - expense,
    }
}

/// Percent of the target saved, in `[0, 100]`
///
/// A target of zero or less is treated as 1. Reaching or passing the target
/// is always 100. Non-finite amounts give 0.
pub fn compute_goal_progress(goal: &Goal) -> f64 {
    if !goal.saved_amount.is_finite() || !goal.target_amount.is_finite() {
        return 0.0;
    }
    if goal.saved_amount >= goal.target_amount {
        return 100.0;
    }
    let target = goal.target_amount.max(1.0);
    (goal.saved_amount / target * 100.0).clamp(0.0, 100.0)
}

/// Whether a goal counts toward "active goals"
pub fn is_active_goal(goal: &Goal) -> bool {
    goal.status == GoalStatus::Active
}

pub fn count_active_goals(goals: &[Goal]) -> usize {
    goals.iter().filter(|g| is_active_goal(g)).count()
}

/// Budget health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetSeverity {
    Ok,
    Warning,
    Over,
}

impl BudgetSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Over => "over",
        }
    }
}

impl std::fmt::Display for BudgetSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetStatus {
    /// max(amount - spent, 0)
    pub remaining_display: f64,
    pub severity: BudgetSeverity,
    /// False when no budget was set for the period (amount <= 0)
    pub budget_set: bool,
    /// max(spent - amount, 0)
    pub overspent_by: f64,
    pub amount: f64,
    pub spent: f64,
}

pub fn compute_budget_status(period: &BudgetPeriod) -> BudgetStatus {
    let remaining = period.amount - period.spent;
    let severity = if period.spent > period.amount {
        BudgetSeverity::Over
    } else if remaining < period.amount * WARNING_SHARE {
        BudgetSeverity::Warning
    } else {
        BudgetSeverity::Ok
    };
    BudgetStatus {
        remaining_display: remaining.max(0.0),
        severity,
        budget_set: period.amount > 0.0,
        overspent_by: (period.spent - period.amount).max(0.0),
        amount: period.amount,
        spent: period.spent,
    }
}

/// Chart-ready prediction data; the label axis is never empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionDisplay {
    pub labels: Vec<String>,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
    pub next_prediction: f64,
}

pub fn compute_prediction_display(series: &PredictionSeries) -> PredictionDisplay {
    let labels = if series.labels.is_empty() {
        vec![PLACEHOLDER_LABEL.to_string()]
    } else {
        series.labels.clone()
    };
    PredictionDisplay {
        labels,
        actual: series.actual.clone(),
        predicted: series.predicted.clone(),
        next_prediction: series.next_prediction,
    }
}

// =============================================================================
// Per-scope aggregates
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub display_name: String,
    pub totals: Totals,
    pub active_goals: usize,
}

pub fn dashboard_summary(
    display_name: &str,
    transactions: &[Transaction],
    goals: &[Goal],
) -> DashboardSummary {
    DashboardSummary {
        display_name: display_name.to_string(),
        totals: compute_totals(transactions),
        active_goals: count_active_goals(goals),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionList {
    /// Newest first, at most [`TRANSACTION_LIST_LIMIT`]
    pub transactions: Vec<Transaction>,
    /// How many the service returned before the cap
    pub total: usize,
}

pub fn transaction_list(transactions: &[Transaction]) -> TransactionList {
    TransactionList {
        transactions: transactions
            .iter()
            .take(TRANSACTION_LIST_LIMIT)
            .cloned()
            .collect(),
        total: transactions.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal: Goal,
    pub progress: f64,
}

pub fn goal_list(goals: &[Goal]) -> Vec<GoalProgress> {
    goals
        .iter()
        .map(|g| GoalProgress {
            goal: g.clone(),
            progress: compute_goal_progress(g),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetPanel {
    pub current: BudgetPeriod,
    pub status: BudgetStatus,
    pub previous: Vec<BudgetPeriod>,
}

pub fn budget_panel(snapshot: &BudgetSnapshot) -> BudgetPanel {
    BudgetPanel {
        current: snapshot.current.clone(),
        status: compute_budget_status(&snapshot.current),
        previous: snapshot.previous.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(amount: f64, kind: TransactionKind) -> Transaction {
        Transaction {
            id: None,
            category: "misc".to_string(),
            amount,
            kind,
            date: None,
        }
    }

    fn goal(target: f64, saved: f64) -> Goal {
        Goal {
            id: Some(1),
            name: "Goal".to_string(),
            target_amount: target,
            saved_amount: saved,
            due_date: None,
            status: GoalStatus::Active,
        }
    }

    fn period(amount: f64, spent: f64) -> BudgetPeriod {
        BudgetPeriod {
            month_year: "2024-03".to_string(),
            amount,
            spent,
            remaining: amount - spent,
            ..Default::default()
        }
    }

    #[test]
    fn test_totals_income_and_expense() {
        let totals = compute_totals(&[
            tx(5000.0, TransactionKind::Income),
            tx(2000.0, TransactionKind::Expense),
        ]);
        assert_eq!(
            totals,
            Totals {
                income: 5000.0,
                expense: 2000.0,
                saving: 3000.0
            }
        );
    }

    #[test]
    fn test_totals_empty_and_negative_saving() {
        assert_eq!(compute_totals(&[]), Totals::default());

        let totals = compute_totals(&[
            tx(100.0, TransactionKind::Income),
            tx(250.5, TransactionKind::Expense),
            tx(49.5, TransactionKind::Expense),
        ]);
        assert_eq!(totals.saving, -200.0);
    }

    #[test]
    fn test_saving_is_income_minus_expense() {
        let amounts = [0.1, 0.2, 0.3, 1e9, 12.75, 3.0, 7.07];
        for split in 0..amounts.len() {
            let txns: Vec<Transaction> = amounts
                .iter()
                .enumerate()
                .map(|(i, a)| {
                    let kind = if i < split {
                        TransactionKind::Income
                    } else {
                        TransactionKind::Expense
                    };
                    tx(*a, kind)
                })
                .collect();
            let t = compute_totals(&txns);
            assert_eq!(t.saving, t.income - t.expense);
        }
    }

    #[test]
    fn test_goal_progress_bounds() {
        assert_eq!(compute_goal_progress(&goal(1000.0, 250.0)), 25.0);
        assert_eq!(compute_goal_progress(&goal(1000.0, 1000.0)), 100.0);
        assert_eq!(compute_goal_progress(&goal(1000.0, 5000.0)), 100.0);
        assert_eq!(compute_goal_progress(&goal(1000.0, 0.0)), 0.0);
        assert_eq!(compute_goal_progress(&goal(0.5, 0.6)), 100.0);

        for (target, saved) in [(0.0, 0.0), (-5.0, 3.0), (3.0, -1.0), (1e12, 1.0)] {
            let p = compute_goal_progress(&goal(target, saved));
            assert!((0.0..=100.0).contains(&p), "{} out of range", p);
        }
    }

    #[test]
    fn test_goal_progress_non_finite_is_zero() {
        let nan = f64::NAN;
        let inf = f64::INFINITY;
        for (target, saved) in [(1000.0, nan), (nan, 10.0), (inf, 10.0), (1000.0, inf), (1000.0, -inf)] {
            let p = compute_goal_progress(&goal(target, saved));
            assert_eq!(p, 0.0, "target {} saved {}", target, saved);
        }
    }

    #[test]
    fn test_goal_progress_zero_target() {
        assert_eq!(compute_goal_progress(&goal(0.0, 100.0)), 100.0);
    }

    #[test]
    fn test_active_goal_count() {
        let mut done = goal(10.0, 10.0);
        done.status = GoalStatus::Completed;
        let mut closed = goal(10.0, 1.0);
        closed.status = GoalStatus::Closed;
        assert_eq!(
            count_active_goals(&[goal(10.0, 1.0), done, closed, goal(5.0, 0.0)]),
            2
        );
    }

    #[test]
    fn test_budget_over() {
        let status = compute_budget_status(&period(5000.0, 6000.0));
        assert_eq!(status.severity, BudgetSeverity::Over);
        assert_eq!(status.remaining_display, 0.0);
        assert_eq!(status.overspent_by, 1000.0);
        assert!(status.spent > status.amount);
    }

    #[test]
    fn test_budget_warning() {
        let status = compute_budget_status(&period(5000.0, 4200.0));
        assert_eq!(status.severity, BudgetSeverity::Warning);
        assert_eq!(status.remaining_display, 800.0);
    }

    #[test]
    fn test_budget_boundaries() {
        // Exactly spent is not over
        assert_eq!(
            compute_budget_status(&period(5000.0, 5000.0)).severity,
            BudgetSeverity::Warning
        );
        // Exactly 20% remaining is ok
        assert_eq!(
            compute_budget_status(&period(5000.0, 4000.0)).severity,
            BudgetSeverity::Ok
        );
        assert_eq!(
            compute_budget_status(&period(5000.0, 0.0)).severity,
            BudgetSeverity::Ok
        );
    }

    #[test]
    fn test_budget_not_set() {
        let status = compute_budget_status(&period(0.0, 0.0));
        assert!(!status.budget_set);
        assert_eq!(status.severity, BudgetSeverity::Ok);
        assert_eq!(status.remaining_display, 0.0);
    }

    #[test]
    fn test_over_iff_spent_exceeds_amount() {
        for (amount, spent) in [(100.0, 99.0), (100.0, 100.0), (100.0, 100.01), (0.0, 1.0)] {
            let over = compute_budget_status(&period(amount, spent)).severity == BudgetSeverity::Over;
            assert_eq!(over, spent > amount);
        }
    }

    #[test]
    fn test_prediction_display_empty() {
        let display = compute_prediction_display(&PredictionSeries::default());
        assert_eq!(display.labels, vec!["Next Month".to_string()]);
        assert!(display.actual.is_empty());
        assert!(display.predicted.is_empty());
    }

    #[test]
    fn test_prediction_display_passthrough() {
        let series = PredictionSeries {
            labels: vec!["2024-01".into(), "2024-02".into()],
            actual: vec![100.0, 200.0],
            predicted: vec![200.0, 158.0],
            next_prediction: 158.0,
        };
        let display = compute_prediction_display(&series);
        assert_eq!(display.labels, series.labels);
        assert_eq!(display.predicted, series.predicted);
        assert_eq!(display.next_prediction, 158.0);
    }

    #[test]
    fn test_idempotent() {
        let txns = vec![
            tx(0.1, TransactionKind::Income),
            tx(0.2, TransactionKind::Expense),
        ];
        assert_eq!(
            compute_totals(&txns).saving.to_bits(),
            compute_totals(&txns).saving.to_bits()
        );
        let g = goal(3.0, 1.0);
        assert_eq!(
            compute_goal_progress(&g).to_bits(),
            compute_goal_progress(&g).to_bits()
        );
        let p = period(5000.0, 4200.0);
        assert_eq!(compute_budget_status(&p), compute_budget_status(&p));
        let s = PredictionSeries::default();
        assert_eq!(compute_prediction_display(&s), compute_prediction_display(&s));
    }

    #[test]
    fn test_transaction_list_cap() {
        let txns: Vec<Transaction> = (0..250)
            .map(|_| tx(1.0, TransactionKind::Expense))
            .collect();
        let list = transaction_list(&txns);
        assert_eq!(list.transactions.len(), TRANSACTION_LIST_LIMIT);
        assert_eq!(list.total, 250);
    }
}
