//! Test utilities for fintrack-core
//!
//! - [`MockFinanceServer`]: an in-process HTTP finance service backed by
//!   [`MockGateway`], speaking the same loose wire format as the real one
//!   (decimal-string amounts, HTTP dates, `txn_id`/`goal_name` field names)
//! - [`RecordingRenderer`]: a renderer that records every call

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::error::{Error, ErrorKind, Result};
use crate::gateway::wire::{BudgetRequest, GoalRequest, LoginRequest, SignupRequest, TransactionRequest};
use crate::gateway::{Gateway, MockGateway};
use crate::models::{BudgetPeriod, NewGoal, NewTransaction};
use crate::orchestrator::Scope;
use crate::render::{Aggregate, NotifyLevel, RenderHandle, Renderer};

// =============================================================================
// Mock finance service
// =============================================================================

#[derive(Clone)]
struct AppState {
    gateway: MockGateway,
    raw_next: Arc<Mutex<Option<(u16, String)>>>,
}

impl AppState {
    fn take_raw(&self) -> Option<Response> {
        let raw = self
            .raw_next
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        raw.map(|(code, body)| {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, body).into_response()
        })
    }
}

/// Mock finance service for integration tests
pub struct MockFinanceServer {
    addr: SocketAddr,
    gateway: MockGateway,
    raw_next: Arc<Mutex<Option<(u16, String)>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockFinanceServer {
    /// Start the mock service on an available port
    pub async fn start() -> Self {
        Self::start_with(MockGateway::new()).await
    }

    /// Start the mock service over an existing in-memory store
    pub async fn start_with(gateway: MockGateway) -> Self {
        let raw_next = Arc::new(Mutex::new(None));
        let state = AppState {
            gateway: gateway.clone(),
            raw_next: Arc::clone(&raw_next),
        };

        let app = Router::new()
            .route("/login", post(handle_login))
            .route("/signup", post(handle_signup))
            .route(
                "/transactions",
                get(handle_list_transactions).post(handle_add_transaction),
            )
            .route("/goals", get(handle_list_goals).post(handle_add_goal))
            .route("/add_budget", post(handle_add_budget))
            .route("/get_budget", get(handle_get_budget))
            .route("/predictions", get(handle_predictions))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            gateway,
            raw_next,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock service
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// The store behind the service, for seeding and failure injection
    pub fn gateway(&self) -> &MockGateway {
        &self.gateway
    }

    /// Answer the next request with a raw status and body
    pub fn respond_raw_once(&self, status: u16, body: &str) {
        *self
            .raw_next
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((status, body.to_string()));
    }

    /// Stop the mock service
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockFinanceServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    user_id: i64,
}

fn success(mut body: Value) -> Response {
    body["status"] = json!("success");
    (StatusCode::OK, Json(body)).into_response()
}

fn failure(error: Error) -> Response {
    let status = match error.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Auth => StatusCode::UNAUTHORIZED,
        ErrorKind::Network => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Server | ErrorKind::Decode => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match &error {
        Error::Network(_) => "Database unavailable".to_string(),
        other => other.to_string(),
    };
    (status, Json(json!({"status": "error", "message": message}))).into_response()
}

fn respond(result: Result<Value>) -> Response {
    match result {
        Ok(body) => success(body),
        Err(e) => failure(e),
    }
}

/// HTTP-date rendering of a calendar date, like the service's JSON encoder
fn http_date(date: Option<NaiveDate>) -> Value {
    match date {
        Some(d) => json!(d.format("%a, %d %b %Y 00:00:00 GMT").to_string()),
        None => Value::Null,
    }
}

fn parse_request_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| Error::Server(format!("Invalid date: {}", raw)))
}

async fn handle_login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    if let Some(raw) = state.take_raw() {
        return raw;
    }
    respond(
        state
            .gateway
            .authenticate(&req.email, &req.password)
            .await
            .map(|session| {
                json!({
                    "message": "Login successful",
                    "user": {
                        "id": session.user_id,
                        "name": session.display_name,
                        "email": session.email,
                    }
                })
            }),
    )
}

async fn handle_signup(State(state): State<AppState>, Json(req): Json<SignupRequest>) -> Response {
    if let Some(raw) = state.take_raw() {
        return raw;
    }
    respond(
        state
            .gateway
            .register(&req.name, &req.email, &req.password)
            .await
            .map(|_| json!({"message": "Signup successful"})),
    )
}

async fn handle_list_transactions(
    State(state): State<AppState>,
    Query(q): Query<UserQuery>,
) -> Response {
    if let Some(raw) = state.take_raw() {
        return raw;
    }
    respond(state.gateway.list_transactions(q.user_id).await.map(|txns| {
        let rows: Vec<Value> = txns
            .iter()
            .map(|t| {
                json!({
                    "txn_id": t.id,
                    "category": t.category,
                    "amount": format!("{:.2}", t.amount),
                    "type": t.kind.as_str(),
                    "date": http_date(t.date),
                })
            })
            .collect();
        json!({ "transactions": rows })
    }))
}

async fn handle_add_transaction(
    State(state): State<AppState>,
    Json(req): Json<TransactionRequest>,
) -> Response {
    if let Some(raw) = state.take_raw() {
        return raw;
    }
    let result = async {
        let tx = NewTransaction {
            category: req.category.clone(),
            amount: req.amount,
            kind: req.kind.parse().map_err(Error::Server)?,
            date: parse_request_date(&req.date)?,
        };
        state.gateway.create_transaction(req.user_id, &tx).await?;
        Ok::<_, Error>(json!({"message": "Transaction added"}))
    }
    .await;
    respond(result)
}

async fn handle_list_goals(State(state): State<AppState>, Query(q): Query<UserQuery>) -> Response {
    if let Some(raw) = state.take_raw() {
        return raw;
    }
    respond(state.gateway.list_goals(q.user_id).await.map(|goals| {
        let rows: Vec<Value> = goals
            .iter()
            .map(|g| {
                let status = match g.status.as_str() {
                    "active" => "in_progress",
                    other => other,
                };
                json!({
                    "goal_id": g.id,
                    "goal_name": g.name,
                    "target": g.target_amount,
                    "saved": format!("{:.2}", g.saved_amount),
                    "date": g.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                    "status": status,
                })
            })
            .collect();
        json!({ "goals": rows })
    }))
}

async fn handle_add_goal(State(state): State<AppState>, Json(req): Json<GoalRequest>) -> Response {
    if let Some(raw) = state.take_raw() {
        return raw;
    }
    let result = async {
        let goal = NewGoal {
            name: req.name.clone(),
            target_amount: req.target,
            saved_amount: req.saved,
            due_date: parse_request_date(&req.date)?,
        };
        let created = state.gateway.create_goal(req.user_id, &goal).await?;
        Ok::<_, Error>(json!({"message": "Goal added", "goal_id": created.id}))
    }
    .await;
    respond(result)
}

async fn handle_add_budget(
    State(state): State<AppState>,
    Json(req): Json<BudgetRequest>,
) -> Response {
    if let Some(raw) = state.take_raw() {
        return raw;
    }
    respond(
        state
            .gateway
            .set_budget(req.user_id, req.amount)
            .await
            .map(|_| json!({"message": "Budget saved"})),
    )
}

async fn handle_get_budget(State(state): State<AppState>, Query(q): Query<UserQuery>) -> Response {
    if let Some(raw) = state.take_raw() {
        return raw;
    }
    respond(state.gateway.get_budget(q.user_id).await.map(|snapshot| {
        let current = &snapshot.current;
        let previous: Vec<Value> = snapshot.previous.iter().map(history_row).collect();
        json!({
            "current": {
                "month_year": current.month_year,
                "amount": current.amount,
                "spent": format!("{:.2}", current.spent),
                "remaining": current.remaining,
                "remaining_days": current.remaining_days,
                "note": current.note,
            },
            "previous": previous,
        })
    }))
}

/// History rows carry no `remaining`; clients derive it
fn history_row(period: &BudgetPeriod) -> Value {
    json!({
        "month_year": period.month_year,
        "amount": period.amount,
        "spent": period.spent,
    })
}

async fn handle_predictions(State(state): State<AppState>, Query(q): Query<UserQuery>) -> Response {
    if let Some(raw) = state.take_raw() {
        return raw;
    }
    respond(state.gateway.get_predictions(q.user_id).await.map(|series| {
        json!({
            "next_pred": series.next_prediction,
            "labels": series.labels,
            "actual": series.actual,
            "predicted": series.predicted,
        })
    }))
}

// =============================================================================
// Recording renderer
// =============================================================================

/// One call received by [`RecordingRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Mount(Scope, u64),
    Render(Scope, Aggregate),
    Unmount(Scope, u64),
    Notify(NotifyLevel, String),
}

#[derive(Default)]
struct Recording {
    events: Vec<RenderEvent>,
    next_id: u64,
    live: usize,
}

/// Renderer that records every call; clones share the recording
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        self.lock().events.clone()
    }

    /// Scopes in the order they were rendered
    pub fn rendered_scopes(&self) -> Vec<Scope> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                RenderEvent::Render(scope, _) => Some(*scope),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<(NotifyLevel, String)> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                RenderEvent::Notify(level, message) => Some((*level, message.clone())),
                _ => None,
            })
            .collect()
    }

    /// Handles mounted and not yet unmounted
    pub fn live_handles(&self) -> usize {
        self.lock().live
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Renderer for RecordingRenderer {
    fn mount(&self, scope: Scope) -> RenderHandle {
        let mut rec = self.lock();
        rec.next_id += 1;
        rec.live += 1;
        let id = rec.next_id;
        rec.events.push(RenderEvent::Mount(scope, id));
        RenderHandle::new(scope, id)
    }

    fn render(&self, handle: &RenderHandle, aggregate: &Aggregate) {
        self.lock()
            .events
            .push(RenderEvent::Render(handle.scope(), aggregate.clone()));
    }

    fn unmount(&self, handle: RenderHandle) {
        let mut rec = self.lock();
        rec.live = rec.live.saturating_sub(1);
        rec.events
            .push(RenderEvent::Unmount(handle.scope(), handle.id()));
    }

    fn notify(&self, level: NotifyLevel, message: &str) {
        self.lock()
            .events
            .push(RenderEvent::Notify(level, message.to_string()));
    }
}
