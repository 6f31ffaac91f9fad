//! Input validation
//!
//! Form checks that run before any network call. Each form turns raw user
//! input into the typed payload the gateway takes, or a `Validation` error
//! carrying the message shown to the user.

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::{NewGoal, NewTransaction, TransactionKind};

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(String, String)> {
        let email = self.email.trim();
        if email.is_empty() || self.password.trim().is_empty() {
            return Err(Error::Validation("Enter email & password".into()));
        }
        Ok((email.to_string(), self.password.clone()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
}

/// Trimmed signup fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<Signup> {
        let name = self.name.trim();
        let email = self.email.trim();
        if name.is_empty() || email.is_empty() || self.password.is_empty() {
            return Err(Error::Validation("Complete all fields".into()));
        }
        if self.password != self.confirm {
            return Err(Error::Validation("Passwords do not match".into()));
        }
        Ok(Signup {
            name: name.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionForm {
    pub category: String,
    pub amount: f64,
    /// `income` or `expense`
    pub kind: String,
    /// Defaults to today
    pub date: Option<NaiveDate>,
}

impl TransactionForm {
    pub fn validate(&self, today: NaiveDate) -> Result<NewTransaction> {
        let category = self.category.trim();
        if category.is_empty() || !is_positive(self.amount) {
            return Err(Error::Validation("Enter category & amount".into()));
        }
        let kind: TransactionKind = self.kind.parse().map_err(Error::Validation)?;
        Ok(NewTransaction {
            category: category.to_string(),
            amount: self.amount,
            kind,
            date: self.date.unwrap_or(today),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct GoalForm {
    pub name: String,
    pub target: f64,
    pub due_date: Option<NaiveDate>,
}

impl GoalForm {
    pub fn validate(&self) -> Result<NewGoal> {
        let name = self.name.trim();
        match self.due_date {
            Some(due_date) if !name.is_empty() && is_positive(self.target) => Ok(NewGoal {
                name: name.to_string(),
                target_amount: self.target,
                saved_amount: 0.0,
                due_date,
            }),
            _ => Err(Error::Validation("Complete goal form".into())),
        }
    }
}

pub fn validate_budget(amount: f64) -> Result<f64> {
    if is_positive(amount) {
        Ok(amount)
    } else {
        Err(Error::Validation("Enter a valid budget amount".into()))
    }
}

pub fn validate_reset_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::Validation("Enter registered email".into()));
    }
    Ok(email.to_string())
}

fn is_positive(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_login_requires_both_fields() {
        let form = LoginForm {
            email: "  ".into(),
            password: "pw".into(),
        };
        assert!(matches!(form.validate(), Err(Error::Validation(_))));

        let form = LoginForm {
            email: " asha@example.com ".into(),
            password: "pw".into(),
        };
        assert_eq!(form.validate().unwrap().0, "asha@example.com");
    }

    #[test]
    fn test_signup_password_mismatch() {
        let form = SignupForm {
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password: "secret".into(),
            confirm: "secret2".into(),
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[test]
    fn test_signup_missing_field() {
        let form = SignupForm {
            name: "".into(),
            email: "asha@example.com".into(),
            password: "secret".into(),
            confirm: "secret".into(),
        };
        assert_eq!(form.validate().unwrap_err().to_string(), "Complete all fields");
    }

    #[test]
    fn test_transaction_defaults_date_to_today() {
        let form = TransactionForm {
            category: " Salary ".into(),
            amount: 5000.0,
            kind: "Income".into(),
            date: None,
        };
        let tx = form.validate(today()).unwrap();
        assert_eq!(tx.category, "Salary");
        assert_eq!(tx.kind, TransactionKind::Income);
        assert_eq!(tx.date, today());
    }

    #[test]
    fn test_transaction_rejects_bad_amount_and_kind() {
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let form = TransactionForm {
                category: "Food".into(),
                amount,
                kind: "expense".into(),
                date: None,
            };
            assert!(form.validate(today()).is_err(), "{} accepted", amount);
        }

        let form = TransactionForm {
            category: "Food".into(),
            amount: 10.0,
            kind: "transfer".into(),
            date: None,
        };
        assert!(matches!(form.validate(today()), Err(Error::Validation(_))));
    }

    #[test]
    fn test_goal_requires_due_date() {
        let mut form = GoalForm {
            name: "Laptop".into(),
            target: 60000.0,
            due_date: None,
        };
        assert!(form.validate().is_err());

        form.due_date = Some(today());
        let goal = form.validate().unwrap();
        assert_eq!(goal.saved_amount, 0.0);
        assert_eq!(goal.target_amount, 60000.0);
    }

    #[test]
    fn test_budget_amount() {
        assert_eq!(validate_budget(5000.0).unwrap(), 5000.0);
        assert_eq!(
            validate_budget(0.0).unwrap_err().to_string(),
            "Enter a valid budget amount"
        );
        assert!(validate_budget(-1.0).is_err());
    }

    #[test]
    fn test_reset_email() {
        assert!(validate_reset_email(" ").is_err());
        assert_eq!(validate_reset_email(" a@b.c ").unwrap(), "a@b.c");
    }
}
