use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};

use crate::PlannerState;

const EVENT_CAPACITY: usize = 64;

/// Which part of the UI has to be drawn again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    Tasks,
    Groceries,
    Meals,
    Status,
    Session,
}

/// In-memory planner state plus the status line, shared by the session
/// manager, the active adapter and the renderer.
#[derive(Clone)]
pub struct LiveState {
    state: Arc<RwLock<PlannerState>>,
    status: Arc<RwLock<String>>,
    events: broadcast::Sender<ViewEvent>,
}

impl Default for LiveState {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveState {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            state: Arc::new(RwLock::new(PlannerState::default())),
            status: Arc::new(RwLock::new(String::new())),
            events,
        }
    }

    pub async fn snapshot(&self) -> PlannerState {
        self.state.read().await.clone()
    }

    pub async fn status(&self) -> String {
        self.status.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    pub(crate) fn state(&self) -> &RwLock<PlannerState> {
        &self.state
    }

    pub(crate) async fn set_status(&self, status: impl Into<String>) {
        *self.status.write().await = status.into();
        self.emit(ViewEvent::Status);
    }

    pub(crate) fn emit(&self, event: ViewEvent) {
        let _ = self.events.send(event);
    }

    pub(crate) fn emit_all(&self) {
        self.emit(ViewEvent::Tasks);
        self.emit(ViewEvent::Groceries);
        self.emit(ViewEvent::Meals);
    }
}
