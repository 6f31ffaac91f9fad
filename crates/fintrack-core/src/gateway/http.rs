//! HTTP gateway implementation
//!
//! JSON over HTTP against the finance service. The per-request timeout comes
//! from [`ClientConfig`] and is enforced by the reqwest client, so callers see
//! a timeout as an ordinary `Network` error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{
    BudgetSnapshot, Goal, NewGoal, NewTransaction, PredictionSeries, Session, Transaction,
};

use super::wire::{
    self, BudgetPayload, BudgetRequest, CreatedPayload, GoalRequest, GoalsPayload, LoginPayload,
    LoginRequest, PredictionPayload, Rejection, SignupRequest, TransactionRequest,
    TransactionsPayload,
};
use super::Gateway;

/// Finance service client over HTTP
#[derive(Clone)]
pub struct HttpGateway {
    http_client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a new HTTP gateway
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(&config.api_base, config.timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, reject: Rejection) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        wire::open_envelope(status.is_success(), status.as_u16(), &body, reject)
    }

    async fn get(&self, path: &str, user_id: i64) -> Result<Value> {
        let url = self.url(path);
        debug!(url = %url, user_id, "GET");
        let request = self
            .http_client
            .get(&url)
            .query(&[("user_id", user_id)]);
        self.send(request, Error::Server).await
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B, reject: Rejection) -> Result<Value> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let request = self.http_client.post(&url).json(body);
        self.send(request, reject).await
    }
}

/// Id echoed by a create call; the record was stored even when it is unreadable
fn created_id(value: Value) -> Option<i64> {
    match wire::payload::<CreatedPayload>(value) {
        Ok(created) => created.id(),
        Err(e) => {
            debug!("Ignoring unreadable id in create response: {}", e);
            None
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let value = self.post("/login", &body, Error::Auth).await?;
        let login: LoginPayload = wire::payload(value)?;
        Ok(login.user.into_session())
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<()> {
        let body = SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post("/signup", &body, Error::Validation).await?;
        Ok(())
    }

    async fn list_transactions(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let value = self.get("/transactions", user_id).await?;
        let payload: TransactionsPayload = wire::payload(value)?;
        payload
            .transactions
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    async fn create_transaction(&self, user_id: i64, tx: &NewTransaction) -> Result<Transaction> {
        let body = TransactionRequest::new(user_id, tx);
        let value = self.post("/transactions", &body, Error::Server).await?;
        Ok(Transaction {
            id: created_id(value),
            category: tx.category.clone(),
            amount: tx.amount,
            kind: tx.kind,
            date: Some(tx.date),
        })
    }

    async fn list_goals(&self, user_id: i64) -> Result<Vec<Goal>> {
        let value = self.get("/goals", user_id).await?;
        let payload: GoalsPayload = wire::payload(value)?;
        Ok(payload.goals.into_iter().map(Goal::from).collect())
    }

    async fn create_goal(&self, user_id: i64, goal: &NewGoal) -> Result<Goal> {
        let body = GoalRequest::new(user_id, goal);
        let value = self.post("/goals", &body, Error::Server).await?;
        Ok(Goal {
            id: created_id(value),
            name: goal.name.clone(),
            target_amount: goal.target_amount,
            saved_amount: goal.saved_amount,
            due_date: Some(goal.due_date),
            status: Default::default(),
        })
    }

    async fn get_budget(&self, user_id: i64) -> Result<BudgetSnapshot> {
        let value = self.get("/get_budget", user_id).await?;
        let payload: BudgetPayload = wire::payload(value)?;
        Ok(payload.into())
    }

    async fn set_budget(&self, user_id: i64, amount: f64) -> Result<()> {
        let body = BudgetRequest { user_id, amount };
        self.post("/add_budget", &body, Error::Server).await?;
        Ok(())
    }

    async fn get_predictions(&self, user_id: i64) -> Result<PredictionSeries> {
        let value = self.get("/predictions", user_id).await?;
        let payload: PredictionPayload = wire::payload(value)?;
        payload.try_into()
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        // Grab a free port, then close it so nothing is listening
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{}", port);
        let gateway = HttpGateway::new(&url, Duration::from_secs(2)).unwrap();
        let err = gateway.list_transactions(1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_base_url_trimmed() {
        let gateway = HttpGateway::new("http://x.local///", Duration::from_secs(1)).unwrap();
        assert_eq!(gateway.host(), "http://x.local");
        assert_eq!(gateway.url("/goals"), "http://x.local/goals");
    }
}
