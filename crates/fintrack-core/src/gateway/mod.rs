//! Remote data gateway
//!
//! Uniform async access to the finance service's four entity collections and
//! its authentication endpoints.
//!
//! # Architecture
//!
//! - `Gateway` trait: one operation per entity kind, all returning typed results
//! - `GatewayClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Implementations: `HttpGateway` (reqwest), `MockGateway` (in-memory)
//!
//! Every response passes through the envelope decoder in [`wire`]; a
//! non-success envelope or transport failure is always an `Err`, never a
//! half-filled value. An empty collection is a successful empty `Vec`.
//!
//! Gateway calls take the user id explicitly. Callers read the session once
//! and pass the id down, so a logout mid-flight can't change whose data a
//! pending request is for.

mod http;
mod mock;
pub mod wire;

pub use http::HttpGateway;
pub use mock::MockGateway;

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::{
    BudgetSnapshot, Goal, NewGoal, NewTransaction, PredictionSeries, Session, Transaction,
};

/// Trait defining the interface to the finance service
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Exchange credentials for a session (`Auth` on rejection)
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session>;

    /// Create an account (`Validation` on rejection, e.g. duplicate email)
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<()>;

    async fn list_transactions(&self, user_id: i64) -> Result<Vec<Transaction>>;

    async fn create_transaction(&self, user_id: i64, tx: &NewTransaction) -> Result<Transaction>;

    async fn list_goals(&self, user_id: i64) -> Result<Vec<Goal>>;

    async fn create_goal(&self, user_id: i64, goal: &NewGoal) -> Result<Goal>;

    /// Current month's budget and up to three previous months
    async fn get_budget(&self, user_id: i64) -> Result<BudgetSnapshot>;

    /// Set the budget for the current month
    async fn set_budget(&self, user_id: i64, amount: f64) -> Result<()>;

    async fn get_predictions(&self, user_id: i64) -> Result<PredictionSeries>;

    /// Where requests go (for logging)
    fn host(&self) -> &str;
}

/// Concrete gateway enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum GatewayClient {
    /// Finance service over HTTP
    Http(HttpGateway),
    /// In-memory service for tests and offline use
    Mock(MockGateway),
}

impl GatewayClient {
    /// Create an HTTP client from configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        HttpGateway::from_config(config).map(GatewayClient::Http)
    }

    /// Create an in-memory client
    pub fn mock() -> Self {
        GatewayClient::Mock(MockGateway::new())
    }
}

#[async_trait]
impl Gateway for GatewayClient {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session> {
        match self {
            GatewayClient::Http(g) => g.authenticate(email, password).await,
            GatewayClient::Mock(g) => g.authenticate(email, password).await,
        }
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<()> {
        match self {
            GatewayClient::Http(g) => g.register(name, email, password).await,
            GatewayClient::Mock(g) => g.register(name, email, password).await,
        }
    }

    async fn list_transactions(&self, user_id: i64) -> Result<Vec<Transaction>> {
        match self {
            GatewayClient::Http(g) => g.list_transactions(user_id).await,
            GatewayClient::Mock(g) => g.list_transactions(user_id).await,
        }
    }

    async fn create_transaction(&self, user_id: i64, tx: &NewTransaction) -> Result<Transaction> {
        match self {
            GatewayClient::Http(g) => g.create_transaction(user_id, tx).await,
            GatewayClient::Mock(g) => g.create_transaction(user_id, tx).await,
        }
    }

    async fn list_goals(&self, user_id: i64) -> Result<Vec<Goal>> {
        match self {
            GatewayClient::Http(g) => g.list_goals(user_id).await,
            GatewayClient::Mock(g) => g.list_goals(user_id).await,
        }
    }

    async fn create_goal(&self, user_id: i64, goal: &NewGoal) -> Result<Goal> {
        match self {
            GatewayClient::Http(g) => g.create_goal(user_id, goal).await,
            GatewayClient::Mock(g) => g.create_goal(user_id, goal).await,
        }
    }

    async fn get_budget(&self, user_id: i64) -> Result<BudgetSnapshot> {
        match self {
            GatewayClient::Http(g) => g.get_budget(user_id).await,
            GatewayClient::Mock(g) => g.get_budget(user_id).await,
        }
    }

    async fn set_budget(&self, user_id: i64, amount: f64) -> Result<()> {
        match self {
            GatewayClient::Http(g) => g.set_budget(user_id, amount).await,
            GatewayClient::Mock(g) => g.set_budget(user_id, amount).await,
        }
    }

    async fn get_predictions(&self, user_id: i64) -> Result<PredictionSeries> {
        match self {
            GatewayClient::Http(g) => g.get_predictions(user_id).await,
            GatewayClient::Mock(g) => g.get_predictions(user_id).await,
        }
    }

    fn host(&self) -> &str {
        match self {
            GatewayClient::Http(g) => g.host(),
            GatewayClient::Mock(g) => g.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_gateway_client_mock() {
        let client = GatewayClient::mock();
        assert_eq!(client.host(), "mock://localhost");
    }

    #[test]
    fn test_gateway_client_from_config() {
        let config = ClientConfig::default().with_api_base("http://finance.local/");
        let client = GatewayClient::from_config(&config).unwrap();
        assert_eq!(client.host(), "http://finance.local");
    }

    #[tokio::test]
    async fn test_mock_dispatch() {
        let client = GatewayClient::mock();
        client.register("Asha", "asha@example.com", "pw").await.unwrap();
        let session = client.authenticate("asha@example.com", "pw").await.unwrap();
        assert!(client.list_goals(session.user_id).await.unwrap().is_empty());

        let err = client
            .authenticate("asha@example.com", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
    }
}
