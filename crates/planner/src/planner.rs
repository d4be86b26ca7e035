use std::sync::Arc;

use homeplan_shared::{Error, Result, Weekday};
use homeplan_store::{Backend, IdentityProvider, Session};
use serde::Deserialize;
use tokio::sync::{Mutex, broadcast};
use validator::Validate;

use crate::{
    CloudAdapter, ListKind, LiveState, LocalAdapter, LocalStorage, PlannerState, SyncAdapter,
    SyncMode, ViewEvent,
};

const LOGIN_REQUIRED: &str = "Please log in to sync your household.";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "Email is required."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Everything the renderer needs, copied out of the session context.
#[derive(Debug, Clone)]
pub struct PlannerView {
    pub mode: SyncMode,
    pub enabled: bool,
    pub session: Option<Session>,
    pub household: Option<String>,
    pub status: String,
    pub state: PlannerState,
}

#[derive(Default)]
struct SessionContext {
    session: Option<Session>,
    household: Option<String>,
    enabled: bool,
}

/// Household session manager.
///
/// Owns the session context (identity, household binding and planner
/// enablement) and routes every user action to the active [`SyncAdapter`].
/// Each action records its outcome in the status line.
pub struct Planner {
    adapter: Arc<dyn SyncAdapter>,
    identity: Option<Arc<dyn IdentityProvider>>,
    storage: LocalStorage,
    live: LiveState,
    context: Mutex<SessionContext>,
}

impl Planner {
    /// Planner persisted on this device only.
    pub fn local(storage: LocalStorage) -> Self {
        let live = LiveState::new();
        let adapter = LocalAdapter::new(storage.clone(), live.clone());

        Self::with_adapter(Arc::new(adapter), None, storage, live)
    }

    /// Planner synchronized through a cloud backend.
    pub fn cloud(storage: LocalStorage, backend: Backend) -> Self {
        let live = LiveState::new();
        let adapter = CloudAdapter::new(backend.store, live.clone());

        Self::with_adapter(Arc::new(adapter), Some(backend.identity), storage, live)
    }

    fn with_adapter(
        adapter: Arc<dyn SyncAdapter>,
        identity: Option<Arc<dyn IdentityProvider>>,
        storage: LocalStorage,
        live: LiveState,
    ) -> Self {
        let context = SessionContext {
            household: storage.household(),
            ..Default::default()
        };

        Self {
            adapter,
            identity,
            storage,
            live,
            context: Mutex::new(context),
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.adapter.mode()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.live.subscribe()
    }

    /// Startup reaction. Local planners load their state and are usable
    /// right away; cloud planners wait for a login.
    pub async fn start(&self) {
        match self.mode() {
            SyncMode::Local => {
                let mut context = self.context.lock().await;
                let household = context.household.clone().unwrap_or_default();

                match self.adapter.connect(&household, None).await {
                    Ok(_) => {
                        context.enabled = true;
                        self.live
                            .set_status("Local mode: changes are saved on this device.")
                            .await;
                    }
                    Err(err) => self.live.set_status(err.to_string()).await,
                }

                self.live.emit(ViewEvent::Session);
            }
            SyncMode::Cloud => self.session_changed(None).await,
        }
    }

    pub async fn sign_up(&self, credentials: Credentials) -> Result<()> {
        let result = self.authenticate(credentials, true).await;
        self.report(result, "Account created.").await
    }

    pub async fn log_in(&self, credentials: Credentials) -> Result<()> {
        let result = self.authenticate(credentials, false).await;
        self.report(result, "Logged in.").await
    }

    async fn authenticate(&self, credentials: Credentials, create: bool) -> Result<()> {
        let credentials = Credentials::new(credentials.email.trim(), credentials.password);
        credentials.validate()?;

        let Some(identity) = self.identity.as_ref() else {
            homeplan_shared::user!("Accounts are not available in local mode.");
        };

        let session = if create {
            identity
                .sign_up(&credentials.email, &credentials.password)
                .await?
        } else {
            identity
                .log_in(&credentials.email, &credentials.password)
                .await?
        };

        tracing::info!(user = %session.uid, "session started");
        self.session_changed(Some(session)).await;

        Ok(())
    }

    pub async fn log_out(&self) -> Result<()> {
        if self.identity.is_none() {
            let result = Err(Error::Validate(
                "Accounts are not available in local mode.".to_owned(),
            ));
            return self.report(result, "").await;
        }

        self.session_changed(None).await;

        Ok(())
    }

    /// Reacts to an identity change: no identity disables the planner and
    /// drops every subscription, an identity reconnects the remembered
    /// household.
    async fn session_changed(&self, session: Option<Session>) {
        let mut context = self.context.lock().await;
        context.session = session;

        let Some(session) = context.session.clone() else {
            context.enabled = false;
            self.adapter.disconnect().await;
            self.live.set_status(LOGIN_REQUIRED).await;
            self.live.emit(ViewEvent::Session);
            return;
        };

        match context.household.clone() {
            Some(household) => match self.adapter.connect(&household, Some(&session)).await {
                Ok(_) => {
                    context.enabled = true;
                    self.live
                        .set_status(format!("Logged in as {}, connected to {household}.", session.email))
                        .await;
                }
                Err(err) => {
                    context.enabled = false;
                    self.live.set_status(err.to_string()).await;
                }
            },
            None => {
                self.live
                    .set_status(format!(
                        "Logged in as {}. Connect to a household to start.",
                        session.email
                    ))
                    .await;
            }
        }

        self.live.emit(ViewEvent::Session);
    }

    pub async fn connect_household(&self, id: &str) -> Result<()> {
        let result = self.bind_household(id).await;
        self.report(result, "Connected to household.").await
    }

    async fn bind_household(&self, id: &str) -> Result<()> {
        let id = id.trim();
        if id.is_empty() {
            homeplan_shared::user!("Please enter a household id.");
        }

        if id.contains('/') {
            homeplan_shared::user!("A household id cannot contain '/'.");
        }

        let mut context = self.context.lock().await;
        self.storage.remember_household(id);
        context.household = Some(id.to_owned());

        let session = context.session.clone();
        if self.mode() == SyncMode::Cloud && session.is_none() {
            context.enabled = false;
            self.live.emit(ViewEvent::Session);
            return Err(Error::Unauthenticated);
        }

        let result = self.adapter.connect(id, session.as_ref()).await;
        context.enabled = result.is_ok();
        self.live.emit(ViewEvent::Session);

        result
    }

    pub async fn add_task(&self, text: &str) -> Result<()> {
        self.add(ListKind::Tasks, text).await
    }

    pub async fn add_grocery(&self, text: &str) -> Result<()> {
        self.add(ListKind::Groceries, text).await
    }

    pub async fn toggle_task(&self, id: &str, current_done: bool) -> Result<()> {
        self.toggle(ListKind::Tasks, id, current_done).await
    }

    pub async fn toggle_grocery(&self, id: &str, current_done: bool) -> Result<()> {
        self.toggle(ListKind::Groceries, id, current_done).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        self.delete(ListKind::Tasks, id).await
    }

    pub async fn delete_grocery(&self, id: &str) -> Result<()> {
        self.delete(ListKind::Groceries, id).await
    }

    pub async fn add(&self, list: ListKind, text: &str) -> Result<()> {
        let result = match self.ensure_enabled().await {
            Ok(_) => self.adapter.add(list, text).await,
            Err(err) => Err(err),
        };

        self.report(result, "Added.").await
    }

    pub async fn toggle(&self, list: ListKind, id: &str, current_done: bool) -> Result<()> {
        let result = match self.ensure_enabled().await {
            Ok(_) => self.adapter.toggle(list, id, current_done).await,
            Err(err) => Err(err),
        };

        self.report(result, "Updated.").await
    }

    pub async fn delete(&self, list: ListKind, id: &str) -> Result<()> {
        let result = match self.ensure_enabled().await {
            Ok(_) => self.adapter.delete(list, id).await,
            Err(err) => Err(err),
        };

        self.report(result, "Deleted.").await
    }

    pub async fn update_meal(&self, day: Weekday, value: &str) -> Result<()> {
        let result = match self.ensure_enabled().await {
            Ok(_) => self.adapter.update_meal(day, value).await,
            Err(err) => Err(err),
        };

        self.report(result, &format!("Saved {day}.")).await
    }

    async fn ensure_enabled(&self) -> Result<()> {
        if !self.context.lock().await.enabled {
            homeplan_shared::user!("Connect to a household first.");
        }

        Ok(())
    }

    /// Records the outcome in the status line and hands it back.
    async fn report(&self, result: Result<()>, success: &str) -> Result<()> {
        match &result {
            Ok(_) => self.live.set_status(success).await,
            Err(err) => {
                if !err.is_validation() {
                    tracing::warn!(err = %err, "planner operation failed");
                }
                self.live.set_status(err.to_string()).await;
            }
        }

        result
    }

    pub async fn is_enabled(&self) -> bool {
        self.context.lock().await.enabled
    }

    pub async fn state(&self) -> PlannerState {
        self.live.snapshot().await
    }

    pub async fn status(&self) -> String {
        self.live.status().await
    }

    pub async fn view(&self) -> PlannerView {
        let (enabled, session, household) = {
            let context = self.context.lock().await;
            (
                context.enabled,
                context.session.clone(),
                context.household.clone(),
            )
        };

        PlannerView {
            mode: self.mode(),
            enabled,
            session,
            household,
            status: self.live.status().await,
            state: self.live.snapshot().await,
        }
    }

    /// Drops every live binding, used on process shutdown.
    pub async fn shutdown(&self) {
        self.adapter.disconnect().await;
    }
}
