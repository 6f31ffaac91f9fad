//! Terminal renderer
//!
//! Prints each rendered aggregate as a block of text and notifications as
//! single marked lines (errors go to stderr).

use std::sync::atomic::{AtomicU64, Ordering};

use fintrack_core::metrics::{BudgetSeverity, TRANSACTION_LIST_LIMIT};
use fintrack_core::models::{GoalStatus, TransactionKind};
use fintrack_core::{Aggregate, NotifyLevel, RenderHandle, Renderer, Scope};
use tracing::debug;

#[derive(Default)]
pub struct TerminalRenderer {
    next_handle: AtomicU64,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for TerminalRenderer {
    fn mount(&self, scope: Scope) -> RenderHandle {
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(scope = %scope, id, "Mounted view");
        RenderHandle::new(scope, id)
    }

    fn render(&self, _handle: &RenderHandle, aggregate: &Aggregate) {
        println!("{}", format_aggregate(aggregate));
    }

    fn unmount(&self, handle: RenderHandle) {
        debug!(scope = %handle.scope(), id = handle.id(), "Unmounted view");
    }

    fn notify(&self, level: NotifyLevel, message: &str) {
        match level {
            NotifyLevel::Error => eprintln!("{}", format_notification(level, message)),
            _ => println!("{}", format_notification(level, message)),
        }
    }
}

pub fn format_notification(level: NotifyLevel, message: &str) -> String {
    let marker = match level {
        NotifyLevel::Info => "ℹ️ ",
        NotifyLevel::Success => "✓",
        NotifyLevel::Error => "❌",
    };
    format!("{} {}", marker, message)
}

/// Rupee amount with Indian digit grouping: `₹12,34,567.5`
pub fn format_inr(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            groups.push(&head[end - 2..end]);
            end -= 2;
        }
        groups.push(&head[..end]);
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };

    let fraction = match frac {
        0 => String::new(),
        f if f % 10 == 0 => format!(".{}", f / 10),
        f => format!(".{:02}", f),
    };
    format!("{}₹{}{}", sign, grouped, fraction)
}

fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn severity_marker(severity: BudgetSeverity) -> &'static str {
    match severity {
        BudgetSeverity::Ok => "✅",
        BudgetSeverity::Warning => "⚠️ ",
        BudgetSeverity::Over => "🚨",
    }
}

pub fn format_aggregate(aggregate: &Aggregate) -> String {
    let mut out = Vec::new();
    match aggregate {
        Aggregate::Dashboard(summary) => {
            out.push(String::new());
            out.push("╭─────────────────────────────────────────╮".to_string());
            out.push("│          💰 Fintrack Dashboard          │".to_string());
            out.push("╰─────────────────────────────────────────╯".to_string());
            out.push(format!("  Welcome, {}", summary.display_name));
            out.push(String::new());
            out.push(format!("  Income:        {}", format_inr(summary.totals.income)));
            out.push(format!("  Expense:       {}", format_inr(summary.totals.expense)));
            out.push(format!("  Net savings:   {}", format_inr(summary.totals.saving)));
            out.push(format!("  Active goals:  {}", summary.active_goals));
        }
        Aggregate::Transactions(list) => {
            out.push(String::new());
            out.push(format!("📋 Transactions ({})", list.total));
            out.push("   ─────────────────────────────────────────────────────────────".to_string());
            if list.transactions.is_empty() {
                out.push("   No transactions yet.".to_string());
            }
            for t in &list.transactions {
                let date = t
                    .date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "----------".to_string());
                let sign = match t.kind {
                    TransactionKind::Income => "+",
                    TransactionKind::Expense => "-",
                };
                let category = if t.category.is_empty() { "-" } else { &t.category };
                out.push(format!(
                    "   {}  {:<28} {}{}",
                    date,
                    category,
                    sign,
                    format_inr(t.amount)
                ));
            }
            if list.total > TRANSACTION_LIST_LIMIT {
                out.push(format!(
                    "   ... {} older not shown",
                    list.total - TRANSACTION_LIST_LIMIT
                ));
            }
        }
        Aggregate::Goals(goals) => {
            out.push(String::new());
            out.push(format!("🎯 Goals ({})", goals.len()));
            out.push("   ─────────────────────────────────────────────────────────────".to_string());
            if goals.is_empty() {
                out.push("   No goals yet.".to_string());
            }
            for entry in goals {
                let goal = &entry.goal;
                let due = goal
                    .due_date
                    .map(|d| format!(" (due {})", d.format("%Y-%m-%d")))
                    .unwrap_or_default();
                let status = match goal.status {
                    GoalStatus::Active => String::new(),
                    other => format!(" [{}]", other),
                };
                out.push(format!("   {}{}{}", goal.name, due, status));
                out.push(format!(
                    "     {} {:.0}%  Target: {} • Saved: {}",
                    progress_bar(entry.progress, 20),
                    entry.progress,
                    format_inr(goal.target_amount),
                    format_inr(goal.saved_amount)
                ));
            }
        }
        Aggregate::Budget(panel) => {
            let current = &panel.current;
            let status = &panel.status;
            out.push(String::new());
            out.push(format!("📅 Budget {}", current.month_year));
            out.push("   ─────────────────────────────────────────────────────────────".to_string());
            if status.budget_set {
                out.push(format!("   Budget:     {}", format_inr(status.amount)));
            } else {
                out.push("   Budget:     not set".to_string());
            }
            out.push(format!("   Spent:      {}", format_inr(status.spent)));
            out.push(format!(
                "   Remaining:  {} {}",
                format_inr(status.remaining_display),
                severity_marker(status.severity)
            ));
            if status.overspent_by > 0.0 {
                out.push(format!("   Over by:    {}", format_inr(status.overspent_by)));
            }
            out.push(format!("   Days left:  {}", current.remaining_days));
            if !current.note.is_empty() {
                out.push(format!("   {}", current.note));
            }
            if !panel.previous.is_empty() {
                out.push(String::new());
                out.push("   Previous months:".to_string());
                for period in &panel.previous {
                    out.push(format!(
                        "   {}  Budget: {:<14} Spent: {}",
                        period.month_year,
                        format_inr(period.amount),
                        format_inr(period.spent)
                    ));
                }
            }
        }
        Aggregate::Prediction(display) => {
            out.push(String::new());
            out.push("📈 Expense forecast".to_string());
            out.push("   ─────────────────────────────────────────────────────────────".to_string());
            if display.actual.is_empty() {
                out.push(format!("   {}: no history yet", display.labels.join(", ")));
            } else {
                out.push(format!("   {:<10} {:>14} {:>14}", "Month", "Actual", "Predicted"));
                for (i, label) in display.labels.iter().enumerate() {
                    let actual = display.actual.get(i).copied().unwrap_or_default();
                    let predicted = display.predicted.get(i).copied().unwrap_or_default();
                    out.push(format!(
                        "   {:<10} {:>14} {:>14}",
                        label,
                        format_inr(actual),
                        format_inr(predicted)
                    ));
                }
            }
            out.push(format!(
                "   Next month: {}",
                format_inr(display.next_prediction)
            ));
        }
    }
    out.join("\n")
}
