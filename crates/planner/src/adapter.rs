use async_trait::async_trait;
use homeplan_shared::{Result, Weekday};
use homeplan_store::Session;

use crate::{ListKind, LiveState};

/// How the planner keeps its state, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SyncMode {
    /// On-device persistence only.
    Local,
    /// Live subscriptions to a shared document store.
    Cloud,
}

/// Mutate-and-persist capability shared by both modes.
///
/// Local adapters change [`LiveState`] directly and re-render at once. Cloud
/// adapters write through and let their subscriptions bring the change back.
#[async_trait]
pub trait SyncAdapter: Send + Sync {
    fn mode(&self) -> SyncMode;

    fn live(&self) -> &LiveState;

    /// Binds the adapter to `household`, replacing any previous binding.
    async fn connect(&self, household: &str, session: Option<&Session>) -> Result<()>;

    /// Drops the current binding, if any.
    async fn disconnect(&self);

    async fn add(&self, list: ListKind, text: &str) -> Result<()>;

    /// Sets `done` to the opposite of `current_done`.
    async fn toggle(&self, list: ListKind, id: &str, current_done: bool) -> Result<()>;

    async fn delete(&self, list: ListKind, id: &str) -> Result<()>;

    async fn update_meal(&self, day: Weekday, value: &str) -> Result<()>;
}
