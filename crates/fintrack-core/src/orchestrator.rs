//! View refresh orchestrator
//!
//! Owns per-scope view state, sequences gateway calls, and decides which
//! scopes re-fetch after a mutation.
//!
//! # Ordering
//!
//! ```text
//! refresh(S) ──► seq = ++latest[S] ──► gateway ──► metrics ──► seq == latest[S]?
//!                                                               ├─ yes: remount + render
//!                                                               └─ no:  discard (Superseded)
//! ```
//!
//! Sequence numbers are issued per scope, so scopes refresh independently and
//! in parallel. The view table lock is never held across an await; gateway
//! calls run unlocked and only the accept/discard step takes the lock.
//!
//! The session is read once when an operation starts. A logout that lands
//! while a fetch is in flight tears the views down, which also advances every
//! scope's sequence, so the late result is discarded on arrival.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Local;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::gateway::Gateway;
use crate::metrics;
use crate::models::{Goal, Session, Transaction};
use crate::render::{Aggregate, NotifyLevel, RenderHandle, Renderer};
use crate::session::SessionStore;
use crate::validation::{self, GoalForm, LoginForm, SignupForm, TransactionForm};

/// One independently refreshable view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Dashboard,
    TransactionsList,
    GoalsList,
    BudgetPanel,
    PredictionPanel,
}

impl Scope {
    pub fn all() -> &'static [Scope] {
        &[
            Scope::Dashboard,
            Scope::TransactionsList,
            Scope::GoalsList,
            Scope::BudgetPanel,
            Scope::PredictionPanel,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::TransactionsList => "transactions-list",
            Self::GoalsList => "goals-list",
            Self::BudgetPanel => "budget-panel",
            Self::PredictionPanel => "prediction-panel",
        }
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Scope::all()
            .iter()
            .copied()
            .find(|scope| scope.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("Unknown scope: {}", s))
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Entity kind that was just created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Transaction,
    Goal,
    Budget,
}

impl MutationKind {
    /// Scopes whose data changes when this kind of entity is created
    pub fn dependent_scopes(&self) -> &'static [Scope] {
        match self {
            Self::Transaction => &[
                Scope::Dashboard,
                Scope::TransactionsList,
                Scope::BudgetPanel,
            ],
            Self::Goal => &[Scope::Dashboard, Scope::GoalsList],
            Self::Budget => &[Scope::Dashboard, Scope::BudgetPanel],
        }
    }
}

/// A screen of the client, made of one or more scopes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Transactions,
    Goals,
    Budget,
    Predictions,
}

impl Page {
    pub fn scopes(&self) -> &'static [Scope] {
        match self {
            Self::Dashboard => &[Scope::Dashboard, Scope::PredictionPanel],
            Self::Transactions => &[Scope::TransactionsList],
            Self::Goals => &[Scope::GoalsList],
            Self::Budget => &[Scope::BudgetPanel],
            Self::Predictions => &[Scope::PredictionPanel],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    #[default]
    Idle,
    Fetching,
    Rendered,
}

/// How a single refresh ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Rendered,
    /// A newer refresh for the same scope was issued; this result was dropped
    Superseded,
    Failed(ErrorKind),
}

#[derive(Default)]
struct View {
    latest_seq: u64,
    state: ViewState,
    handle: Option<RenderHandle>,
    last: Option<Aggregate>,
}

struct Inner<G, R> {
    gateway: G,
    renderer: R,
    session: SessionStore,
    views: Mutex<HashMap<Scope, View>>,
}

/// Coordinates the gateway, metrics engine and renderer
///
/// Cheap to clone; clones share view state.
pub struct Orchestrator<G, R> {
    inner: Arc<Inner<G, R>>,
}

impl<G, R> Clone for Orchestrator<G, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G, R> Orchestrator<G, R>
where
    G: Gateway + 'static,
    R: Renderer + 'static,
{
    pub fn new(gateway: G, renderer: R, session: SessionStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                renderer,
                session,
                views: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.inner.gateway
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn state(&self, scope: Scope) -> ViewState {
        self.views()
            .get(&scope)
            .map(|v| v.state)
            .unwrap_or_default()
    }

    /// The aggregate currently rendered for a scope
    pub fn last_accepted(&self, scope: Scope) -> Option<Aggregate> {
        self.views().get(&scope).and_then(|v| v.last.clone())
    }

    /// Fetch, derive and render one scope
    ///
    /// Only the most recently issued refresh for a scope ever renders. A
    /// failure leaves the previously rendered aggregate in place.
    pub async fn refresh(&self, scope: Scope) -> RefreshOutcome {
        let (seq, session, display_name) = match self.begin(scope) {
            Ok(issued) => issued,
            Err(e) => return self.fail(scope, e),
        };
        debug!(scope = %scope, seq, "Refresh issued");

        let result = self.fetch(scope, &session, &display_name).await;
        self.complete(scope, seq, result)
    }

    /// Refresh every scope that depends on the mutated entity kind
    pub async fn after_mutation(&self, kind: MutationKind) -> Vec<(Scope, RefreshOutcome)> {
        debug!(?kind, "Refreshing dependent scopes");
        self.refresh_all(kind.dependent_scopes()).await
    }

    /// Refresh the scopes shown on a page
    pub async fn page_load(&self, page: Page) -> Vec<(Scope, RefreshOutcome)> {
        if let Err(e) = self.inner.session.require() {
            let kind = e.kind();
            self.inner.renderer.notify(NotifyLevel::Error, &e.to_string());
            return page
                .scopes()
                .iter()
                .map(|scope| (*scope, RefreshOutcome::Failed(kind)))
                .collect();
        }
        self.refresh_all(page.scopes()).await
    }

    /// Unmount every view and forget rendered state
    ///
    /// In-flight refreshes are discarded when they land.
    pub fn teardown(&self) {
        self.teardown_locked(&mut self.views());
    }

    fn teardown_locked(&self, views: &mut HashMap<Scope, View>) {
        for view in views.values_mut() {
            view.latest_seq += 1;
            view.state = ViewState::Idle;
            view.last = None;
            if let Some(handle) = view.handle.take() {
                self.inner.renderer.unmount(handle);
            }
        }
    }

    pub async fn login(&self, form: &LoginForm) -> Result<Session> {
        let (email, password) = self.check(form.validate())?;
        let mut session = self.report(self.inner.gateway.authenticate(&email, &password).await)?;
        if session.display_name.trim().is_empty() {
            session.display_name = email;
        }
        self.report(self.inner.session.set(session.clone()))?;
        info!(user_id = session.user_id, "Logged in");
        self.inner
            .renderer
            .notify(NotifyLevel::Success, "Login successful");
        Ok(session)
    }

    pub async fn signup(&self, form: &SignupForm) -> Result<()> {
        let signup = self.check(form.validate())?;
        self.report(
            self.inner
                .gateway
                .register(&signup.name, &signup.email, &signup.password)
                .await,
        )?;
        info!(email = %signup.email, "Account created");
        self.inner
            .renderer
            .notify(NotifyLevel::Success, "Account created, please login");
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        // Refreshes read the session under the views lock, so none can be
        // issued between teardown and the clear.
        let cleared = {
            let mut views = self.views();
            self.teardown_locked(&mut views);
            self.inner.session.clear()
        };
        self.report(cleared)?;
        info!("Logged out");
        self.inner.renderer.notify(NotifyLevel::Info, "Logged out");
        Ok(())
    }

    /// The service has no reset endpoint; this only acknowledges the request
    pub fn reset_password(&self, email: &str) -> Result<()> {
        let email = self.check(validation::validate_reset_email(email))?;
        debug!(email = %email, "Password reset requested");
        self.inner.renderer.notify(
            NotifyLevel::Info,
            "Password reset link (demo): email flow not implemented yet",
        );
        Ok(())
    }

    pub async fn submit_transaction(&self, form: &TransactionForm) -> Result<Transaction> {
        let tx = self.check(form.validate(Local::now().date_naive()))?;
        let session = self.report(self.inner.session.require())?;
        let created = self.report(
            self.inner
                .gateway
                .create_transaction(session.user_id, &tx)
                .await,
        )?;
        info!(category = %created.category, amount = created.amount, kind = %created.kind, "Transaction added");
        self.inner
            .renderer
            .notify(NotifyLevel::Success, "Transaction added");
        self.after_mutation(MutationKind::Transaction).await;
        Ok(created)
    }

    pub async fn submit_goal(&self, form: &GoalForm) -> Result<Goal> {
        let goal = self.check(form.validate())?;
        let session = self.report(self.inner.session.require())?;
        let created = self.report(self.inner.gateway.create_goal(session.user_id, &goal).await)?;
        info!(name = %created.name, target = created.target_amount, "Goal added");
        self.inner.renderer.notify(NotifyLevel::Success, "Goal added");
        self.after_mutation(MutationKind::Goal).await;
        Ok(created)
    }

    pub async fn submit_budget(&self, amount: f64) -> Result<()> {
        let amount = self.check(validation::validate_budget(amount))?;
        let session = self.report(self.inner.session.require())?;
        self.report(self.inner.gateway.set_budget(session.user_id, amount).await)?;
        info!(amount, "Budget saved");
        self.inner
            .renderer
            .notify(NotifyLevel::Success, "Budget saved for current month");
        self.after_mutation(MutationKind::Budget).await;
        Ok(())
    }

    async fn refresh_all(&self, scopes: &[Scope]) -> Vec<(Scope, RefreshOutcome)> {
        let mut tasks = JoinSet::new();
        for &scope in scopes {
            let this = self.clone();
            tasks.spawn(async move { (scope, this.refresh(scope).await) });
        }

        let mut outcomes = Vec::with_capacity(scopes.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!("Refresh task failed: {}", e),
            }
        }
        for &scope in scopes {
            if !outcomes.iter().any(|(done, _)| *done == scope) {
                outcomes.push((scope, self.abandon(scope)));
            }
        }
        outcomes.sort_by_key(|(scope, _)| *scope);
        outcomes
    }

    async fn fetch(&self, scope: Scope, session: &Session, display_name: &str) -> Result<Aggregate> {
        let gateway = &self.inner.gateway;
        let user_id = session.user_id;
        let aggregate = match scope {
            Scope::Dashboard => {
                let (transactions, goals) = tokio::try_join!(
                    gateway.list_transactions(user_id),
                    gateway.list_goals(user_id)
                )?;
                Aggregate::Dashboard(metrics::dashboard_summary(
                    display_name,
                    &transactions,
                    &goals,
                ))
            }
            Scope::TransactionsList => {
                let transactions = gateway.list_transactions(user_id).await?;
                Aggregate::Transactions(metrics::transaction_list(&transactions))
            }
            Scope::GoalsList => {
                let goals = gateway.list_goals(user_id).await?;
                Aggregate::Goals(metrics::goal_list(&goals))
            }
            Scope::BudgetPanel => {
                let snapshot = gateway.get_budget(user_id).await?;
                Aggregate::Budget(metrics::budget_panel(&snapshot))
            }
            Scope::PredictionPanel => {
                let series = gateway.get_predictions(user_id).await?;
                Aggregate::Prediction(metrics::compute_prediction_display(&series))
            }
        };
        Ok(aggregate)
    }

    /// Issue a sequence number together with the identity it fetches for
    ///
    /// Fails with `Auth` before issuing anything when nobody is logged in.
    fn begin(&self, scope: Scope) -> Result<(u64, Session, String)> {
        let mut views = self.views();
        let (session, display_name) = self.inner.session.snapshot()?;
        let view = views.entry(scope).or_default();
        view.latest_seq += 1;
        view.state = ViewState::Fetching;
        Ok((view.latest_seq, session, display_name))
    }

    /// Settle a scope whose refresh task died without reporting
    fn abandon(&self, scope: Scope) -> RefreshOutcome {
        {
            let mut views = self.views();
            if let Some(view) = views.get_mut(&scope) {
                if view.state == ViewState::Fetching {
                    view.state = if view.last.is_some() {
                        ViewState::Rendered
                    } else {
                        ViewState::Idle
                    };
                }
            }
        }
        self.fail(scope, Error::Server(format!("Could not refresh {}", scope)))
    }

    fn complete(&self, scope: Scope, seq: u64, result: Result<Aggregate>) -> RefreshOutcome {
        let mut views = self.views();
        let view = views.entry(scope).or_default();
        if view.latest_seq != seq {
            debug!(scope = %scope, seq, latest = view.latest_seq, "Discarding stale result");
            return RefreshOutcome::Superseded;
        }

        match result {
            Ok(aggregate) => {
                if let Some(old) = view.handle.take() {
                    self.inner.renderer.unmount(old);
                }
                let handle = self.inner.renderer.mount(scope);
                self.inner.renderer.render(&handle, &aggregate);
                view.handle = Some(handle);
                view.last = Some(aggregate);
                view.state = ViewState::Rendered;
                info!(scope = %scope, seq, "Rendered");
                RefreshOutcome::Rendered
            }
            Err(e) => {
                view.state = if view.last.is_some() {
                    ViewState::Rendered
                } else {
                    ViewState::Idle
                };
                drop(views);
                self.fail(scope, e)
            }
        }
    }

    fn fail(&self, scope: Scope, error: Error) -> RefreshOutcome {
        warn!(scope = %scope, "Refresh failed: {}", error);
        self.inner
            .renderer
            .notify(NotifyLevel::Error, &error.to_string());
        RefreshOutcome::Failed(error.kind())
    }

    /// Notify a validation failure; nothing reaches the gateway
    fn check<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|e| {
            debug!("Rejected input: {}", e);
            self.inner.renderer.notify(NotifyLevel::Error, &e.to_string());
            e
        })
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|e| {
            warn!("{}", e);
            self.inner.renderer.notify(NotifyLevel::Error, &e.to_string());
            e
        })
    }

    fn views(&self) -> MutexGuard<'_, HashMap<Scope, View>> {
        self.inner
            .views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
