//! Wire format of the finance service
//!
//! Every response is an envelope `{status, message?, ...payload}`. The service
//! is loose about field names and formats (amounts as decimal strings, dates
//! as HTTP dates, `name` vs `goal_name`), so this module accepts all observed
//! variants and emits one canonical model.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{
    BudgetPeriod, BudgetSnapshot, Goal, GoalStatus, NewGoal, NewTransaction, PredictionSeries,
    Session, Transaction,
};

const SUCCESS: &str = "success";

/// How a rejected envelope (`status != "success"`) is surfaced
pub type Rejection = fn(String) -> Error;

/// Open an envelope and return the whole object on success
///
/// `http_ok` is whether the HTTP status was 2xx. A success envelope on a
/// non-2xx response is still a rejection.
pub fn open_envelope(http_ok: bool, http_status: u16, body: &str, reject: Rejection) -> Result<Value> {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) if !http_ok => {
            return Err(Error::Server(format!("Request failed (HTTP {})", http_status)))
        }
        Err(e) => return Err(Error::Decode(format!("body is not JSON: {}", e))),
    };

    let status = value
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Decode("envelope has no status".to_string()))?;

    if status != SUCCESS || !http_ok {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or("Request failed")
            .to_string();
        return Err(reject(message));
    }

    Ok(value)
}

/// Decode a successful envelope into its typed payload
pub fn payload<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))
}

// =============================================================================
// Lenient scalars
// =============================================================================

/// A number the service may send as a JSON number, a decimal string, or null
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Amount(pub f64);

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(Amount(0.0)),
            Value::Number(n) => n
                .as_f64()
                .map(Amount)
                .ok_or_else(|| serde::de::Error::custom("number out of range")),
            Value::String(s) if s.trim().is_empty() => Ok(Amount(0.0)),
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Amount(v)),
                _ => Err(serde::de::Error::custom(format!("invalid amount: {:?}", s))),
            },
            other => Err(serde::de::Error::custom(format!("invalid amount: {}", other))),
        }
    }
}

/// An [`Amount`] that must not be negative (money moved, saved, or budgeted)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Money(pub f64);

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let Amount(v) = Amount::deserialize(d)?;
        if v < 0.0 {
            return Err(serde::de::Error::custom(format!("negative amount: {}", v)));
        }
        Ok(Money(v))
    }
}

/// An id the service may send as a JSON number or a numeric string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WireId(pub Option<i64>);

impl<'de> Deserialize<'de> for WireId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(WireId(None)),
            Value::Number(n) => n
                .as_i64()
                .map(|id| WireId(Some(id)))
                .ok_or_else(|| serde::de::Error::custom(format!("invalid id: {}", n))),
            Value::String(s) if s.trim().is_empty() => Ok(WireId(None)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(|id| WireId(Some(id)))
                .map_err(|_| serde::de::Error::custom(format!("invalid id: {:?}", s))),
            other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
        }
    }
}

/// A calendar date in any of the formats the service emits
///
/// Unrecognized strings decode as `None` rather than failing the whole list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WireDate(pub Option<NaiveDate>);

impl<'de> Deserialize<'de> for WireDate {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(WireDate(raw.as_deref().and_then(parse_date)))
    }
}

/// Parse `YYYY-MM-DD`, ISO date-times, and HTTP dates
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.date_naive());
    }
    None
}

fn first_non_empty(candidates: [Option<String>; 2]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub user: WireUser,
}

#[derive(Debug, Deserialize)]
pub struct WireUser {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl WireUser {
    /// Display name is the user's name, falling back to the email
    pub fn into_session(self) -> Session {
        let display_name = first_non_empty([self.name, self.email.clone()]).unwrap_or_default();
        Session {
            user_id: self.id,
            display_name,
            email: self.email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionsPayload {
    #[serde(default)]
    pub transactions: Vec<WireTransaction>,
}

#[derive(Debug, Deserialize)]
pub struct WireTransaction {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub txn_id: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: Money,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub date: WireDate,
    #[serde(default)]
    pub created_at: WireDate,
}

impl TryFrom<WireTransaction> for Transaction {
    type Error = Error;

    fn try_from(w: WireTransaction) -> Result<Self> {
        let kind = w.kind.unwrap_or_default().parse().map_err(Error::Decode)?;
        Ok(Transaction {
            id: w.id.or(w.txn_id),
            category: w.category.unwrap_or_default(),
            amount: w.amount.0,
            kind,
            date: w.date.0.or(w.created_at.0),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct GoalsPayload {
    #[serde(default)]
    pub goals: Vec<WireGoal>,
}

#[derive(Debug, Deserialize)]
pub struct WireGoal {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub goal_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub goal_name: Option<String>,
    #[serde(default)]
    pub target: Money,
    #[serde(default)]
    pub saved: Money,
    #[serde(default)]
    pub date: WireDate,
    #[serde(default)]
    pub status: Option<String>,
}

impl From<WireGoal> for Goal {
    fn from(w: WireGoal) -> Self {
        Goal {
            id: w.id.or(w.goal_id),
            name: first_non_empty([w.name, w.goal_name]).unwrap_or_default(),
            target_amount: w.target.0,
            saved_amount: w.saved.0,
            due_date: w.date.0,
            status: w
                .status
                .as_deref()
                .map(GoalStatus::from_upstream)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BudgetPayload {
    #[serde(default)]
    pub current: Option<WireBudget>,
    #[serde(default)]
    pub previous: Vec<WireBudget>,
}

#[derive(Debug, Deserialize)]
pub struct WireBudget {
    #[serde(default)]
    pub month_year: String,
    #[serde(default)]
    pub amount: Money,
    #[serde(default)]
    pub spent: Money,
    #[serde(default)]
    pub remaining: Option<Amount>,
    #[serde(default)]
    pub remaining_days: Amount,
    #[serde(default)]
    pub note: Option<String>,
}

impl From<WireBudget> for BudgetPeriod {
    fn from(w: WireBudget) -> Self {
        let remaining = w
            .remaining
            .map(|r| r.0)
            .unwrap_or(w.amount.0 - w.spent.0);
        BudgetPeriod {
            month_year: w.month_year,
            amount: w.amount.0,
            spent: w.spent.0,
            remaining,
            remaining_days: w.remaining_days.0.max(0.0) as u32,
            note: w.note.unwrap_or_default(),
        }
    }
}

impl From<BudgetPayload> for BudgetSnapshot {
    fn from(p: BudgetPayload) -> Self {
        BudgetSnapshot {
            current: p.current.map(BudgetPeriod::from).unwrap_or_default(),
            previous: p.previous.into_iter().map(BudgetPeriod::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PredictionPayload {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub actual: Vec<Amount>,
    #[serde(default)]
    pub predicted: Vec<Amount>,
    #[serde(default)]
    pub next_pred: Amount,
}

impl TryFrom<PredictionPayload> for PredictionSeries {
    type Error = Error;

    fn try_from(p: PredictionPayload) -> Result<Self> {
        if p.labels.len() != p.actual.len() || p.labels.len() != p.predicted.len() {
            return Err(Error::Decode(format!(
                "prediction series lengths differ (labels {}, actual {}, predicted {})",
                p.labels.len(),
                p.actual.len(),
                p.predicted.len()
            )));
        }
        Ok(PredictionSeries {
            labels: p.labels,
            actual: p.actual.into_iter().map(|a| a.0).collect(),
            predicted: p.predicted.into_iter().map(|a| a.0).collect(),
            next_prediction: p.next_pred.0,
        })
    }
}

/// Id echoed by a create call, if the service sends one
#[derive(Debug, Deserialize, Default)]
pub struct CreatedPayload {
    #[serde(default)]
    pub id: WireId,
    #[serde(default)]
    pub txn_id: WireId,
    #[serde(default)]
    pub goal_id: WireId,
}

impl CreatedPayload {
    pub fn id(&self) -> Option<i64> {
        self.id.0.or(self.txn_id.0).or(self.goal_id.0)
    }
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub user_id: i64,
    pub category: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
}

impl TransactionRequest {
    pub fn new(user_id: i64, tx: &NewTransaction) -> Self {
        Self {
            user_id,
            category: tx.category.clone(),
            amount: tx.amount,
            kind: tx.kind.as_str().to_string(),
            date: tx.date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GoalRequest {
    pub user_id: i64,
    pub name: String,
    pub target: f64,
    pub saved: f64,
    pub date: String,
}

impl GoalRequest {
    pub fn new(user_id: i64, goal: &NewGoal) -> Self {
        Self {
            user_id,
            name: goal.name.clone(),
            target: goal.target_amount,
            saved: goal.saved_amount,
            date: goal.due_date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BudgetRequest {
    pub user_id: i64,
    pub amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::TransactionKind;

    fn ok(body: &str) -> Result<Value> {
        open_envelope(true, 200, body, Error::Server)
    }

    #[test]
    fn test_envelope_success() {
        let value = ok(r#"{"status":"success","transactions":[]}"#).unwrap();
        let p: TransactionsPayload = payload(value).unwrap();
        assert!(p.transactions.is_empty());
    }

    #[test]
    fn test_envelope_rejection_uses_message() {
        let err = open_envelope(
            false,
            401,
            r#"{"status":"error","message":"Invalid credentials"}"#,
            Error::Auth,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[test]
    fn test_envelope_rejection_default_message() {
        let err = ok(r#"{"status":"error"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.to_string(), "Request failed");
    }

    #[test]
    fn test_success_status_on_http_error_is_rejected() {
        let err = open_envelope(false, 500, r#"{"status":"success"}"#, Error::Server).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
    }

    #[test]
    fn test_non_json_bodies() {
        let err = ok("<html>oops</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let err = open_envelope(false, 502, "Bad Gateway", Error::Server).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_missing_status_is_decode() {
        let err = ok(r#"{"transactions":[]}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_missing_collection_is_empty_success() {
        let p: GoalsPayload = payload(ok(r#"{"status":"success"}"#).unwrap()).unwrap();
        assert!(p.goals.is_empty());
    }

    #[test]
    fn test_parse_date_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("2024-03-15"), Some(d));
        assert_eq!(parse_date("2024-03-15T10:20:30"), Some(d));
        assert_eq!(parse_date("2024-03-15 10:20:30"), Some(d));
        assert_eq!(parse_date("2024-03-15T10:20:30+05:30"), Some(d));
        assert_eq!(parse_date("Fri, 15 Mar 2024 00:00:00 GMT"), Some(d));
        assert_eq!(parse_date("someday"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_transaction_decode_variants() {
        let body = r#"{"status":"success","transactions":[
            {"txn_id":11,"category":"Salary","amount":"5000.00","type":"income","date":"Fri, 15 Mar 2024 00:00:00 GMT"},
            {"id":12,"category":"Rent","amount":2000,"type":"Expense","date":null,"created_at":"2024-03-16T08:00:00"}
        ]}"#;
        let p: TransactionsPayload = payload(ok(body).unwrap()).unwrap();
        let txns: Vec<Transaction> = p
            .transactions
            .into_iter()
            .map(Transaction::try_from)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(txns[0].id, Some(11));
        assert_eq!(txns[0].amount, 5000.0);
        assert_eq!(txns[0].kind, TransactionKind::Income);
        assert_eq!(txns[0].date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(txns[1].kind, TransactionKind::Expense);
        assert_eq!(txns[1].date, NaiveDate::from_ymd_opt(2024, 3, 16));
    }

    #[test]
    fn test_unknown_transaction_type_is_decode() {
        let w: WireTransaction =
            serde_json::from_str(r#"{"id":1,"category":"x","amount":1,"type":"transfer"}"#).unwrap();
        let err = Transaction::try_from(w).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_bad_amount_is_decode() {
        let err = payload::<TransactionsPayload>(
            ok(r#"{"status":"success","transactions":[{"amount":"lots","type":"income"}]}"#)
                .unwrap(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_non_finite_and_negative_amounts_rejected() {
        for raw in ["\"NaN\"", "\"inf\"", "\"-inf\"", "\"infinity\""] {
            assert!(serde_json::from_str::<Amount>(raw).is_err(), "{}", raw);
        }
        assert_eq!(serde_json::from_str::<Amount>("\"-12.5\"").unwrap(), Amount(-12.5));
        assert!(serde_json::from_str::<Money>("-1").is_err());
        assert!(serde_json::from_str::<Money>("\"-0.01\"").is_err());
        assert_eq!(serde_json::from_str::<Money>("null").unwrap(), Money(0.0));

        let err = payload::<GoalsPayload>(
            ok(r#"{"status":"success","goals":[{"target":"1000","saved":"NaN"}]}"#).unwrap(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_created_id_variants() {
        let created: CreatedPayload =
            serde_json::from_str(r#"{"status":"success","goal_id":"7"}"#).unwrap();
        assert_eq!(created.id(), Some(7));
        let created: CreatedPayload = serde_json::from_str(r#"{"id":null,"txn_id":3}"#).unwrap();
        assert_eq!(created.id(), Some(3));
        assert!(serde_json::from_str::<CreatedPayload>(r#"{"id":"abc"}"#).is_err());
    }

    #[test]
    fn test_goal_name_variants() {
        let a: WireGoal = serde_json::from_str(r#"{"goal_id":4,"goal_name":"Bike","target":"900","saved":0}"#).unwrap();
        let b: WireGoal =
            serde_json::from_str(r#"{"id":5,"name":"","goal_name":"Trip","target":100,"status":"Done"}"#)
                .unwrap();
        let a = Goal::from(a);
        let b = Goal::from(b);
        assert_eq!(a.id, Some(4));
        assert_eq!(a.name, "Bike");
        assert_eq!(a.target_amount, 900.0);
        assert_eq!(a.status, GoalStatus::Active);
        assert_eq!(b.name, "Trip");
        assert_eq!(b.status, GoalStatus::Completed);
    }

    #[test]
    fn test_budget_decode_defaults() {
        let body = r#"{"status":"success",
            "current":{"month_year":"2024-03","amount":5000.0,"spent":6000.0,"remaining":-1000.0,"remaining_days":12,"note":"Over"},
            "previous":[{"month_year":"2024-02","amount":4000,"spent":"3500.50"}]}"#;
        let p: BudgetPayload = payload(ok(body).unwrap()).unwrap();
        let snapshot = BudgetSnapshot::from(p);
        assert_eq!(snapshot.current.remaining, -1000.0);
        assert_eq!(snapshot.current.remaining_days, 12);
        assert_eq!(snapshot.previous.len(), 1);
        assert_eq!(snapshot.previous[0].spent, 3500.5);
        assert_eq!(snapshot.previous[0].remaining, 499.5);
    }

    #[test]
    fn test_prediction_length_mismatch() {
        let body = r#"{"status":"success","labels":["2024-01","2024-02"],"actual":[10],"predicted":[11,12],"next_pred":12}"#;
        let p: PredictionPayload = payload(ok(body).unwrap()).unwrap();
        let err = PredictionSeries::try_from(p).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_login_display_name_falls_back_to_email() {
        let user: WireUser =
            serde_json::from_str(r#"{"id":9,"name":"","email":"kai@example.com"}"#).unwrap();
        let session = user.into_session();
        assert_eq!(session.display_name, "kai@example.com");
        assert_eq!(session.user_id, 9);
    }
}
