use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use homeplan_shared::{Result, Weekday};
use homeplan_store::Session;

use crate::{
    Item, ListKind, LiveState, PlannerState, SyncAdapter, SyncMode, ViewEvent, clean_text,
};

/// Key of the serialized planner state.
pub const STATE_KEY: &str = "homeplan.state";

/// Key of the last household id.
pub const HOUSEHOLD_KEY: &str = "homeplan.household";

/// Directory backed key/value storage of this device, one file per key.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match std::fs::read_to_string(self.dir.join(key)) {
            Ok(value) => Some(value),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(key = key, err = %err, "failed to read local storage");
                None
            }
        }
    }

    /// Overwrites `key`, going through a temporary file so readers never see
    /// half a value.
    pub fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let tmp = self.dir.join(format!("{key}.tmp"));
        std::fs::write(&tmp, value)?;
        std::fs::rename(tmp, self.dir.join(key))
    }

    /// Reads the planner state. Missing or malformed content yields the
    /// empty state.
    pub fn load(&self) -> PlannerState {
        let Some(raw) = self.get(STATE_KEY) else {
            return PlannerState::default();
        };

        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(err) => {
                tracing::debug!(err = %err, "discarding malformed planner state");
                PlannerState::default()
            }
        }
    }

    /// Writes the planner state. Best effort: failures are logged only.
    pub fn save(&self, state: &PlannerState) {
        let result = serde_json::to_string(state)
            .map_err(std::io::Error::other)
            .and_then(|raw| self.set(STATE_KEY, &raw));

        if let Err(err) = result {
            tracing::warn!(err = %err, "failed to save planner state");
        }
    }

    pub fn household(&self) -> Option<String> {
        self.get(HOUSEHOLD_KEY)
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty())
    }

    pub fn remember_household(&self, id: &str) {
        if let Err(err) = self.set(HOUSEHOLD_KEY, id) {
            tracing::warn!(household = id, err = %err, "failed to remember household");
        }
    }
}

/// Keeps the whole planner in [`LocalStorage`].
pub struct LocalAdapter {
    storage: LocalStorage,
    live: LiveState,
}

impl LocalAdapter {
    pub fn new(storage: LocalStorage, live: LiveState) -> Self {
        Self { storage, live }
    }

    fn changed(&self, state: &PlannerState, event: ViewEvent) {
        self.storage.save(state);
        self.live.emit(event);
    }
}

pub(crate) fn list_event(list: ListKind) -> ViewEvent {
    match list {
        ListKind::Tasks => ViewEvent::Tasks,
        ListKind::Groceries => ViewEvent::Groceries,
    }
}

#[async_trait]
impl SyncAdapter for LocalAdapter {
    fn mode(&self) -> SyncMode {
        SyncMode::Local
    }

    fn live(&self) -> &LiveState {
        &self.live
    }

    async fn connect(&self, household: &str, _session: Option<&Session>) -> Result<()> {
        let loaded = self.storage.load();
        *self.live.state().write().await = loaded;

        tracing::info!(household = household, "local planner loaded");
        self.live.emit_all();

        Ok(())
    }

    async fn disconnect(&self) {}

    async fn add(&self, list: ListKind, text: &str) -> Result<()> {
        let text = clean_text(text)?;

        let mut state = self.live.state().write().await;
        state.list_mut(list).push(Item::new(text));
        self.changed(&state, list_event(list));

        Ok(())
    }

    async fn toggle(&self, list: ListKind, id: &str, current_done: bool) -> Result<()> {
        let mut state = self.live.state().write().await;
        let Some(item) = state.list_mut(list).iter_mut().find(|item| item.id == id) else {
            homeplan_shared::not_found!("{list} item {id}");
        };

        item.done = !current_done;
        self.changed(&state, list_event(list));

        Ok(())
    }

    async fn delete(&self, list: ListKind, id: &str) -> Result<()> {
        let mut state = self.live.state().write().await;
        let items = state.list_mut(list);
        let before = items.len();
        items.retain(|item| item.id != id);

        if items.len() == before {
            homeplan_shared::not_found!("{list} item {id}");
        }

        self.changed(&state, list_event(list));

        Ok(())
    }

    async fn update_meal(&self, day: Weekday, value: &str) -> Result<()> {
        let mut state = self.live.state().write().await;
        state.meals.insert(day, value.to_owned());
        self.changed(&state, ViewEvent::Meals);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_loads_default() {
        let dir = temp_dir::TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        assert_eq!(storage.load(), PlannerState::default());
        assert_eq!(storage.household(), None);
    }

    #[test]
    fn test_malformed_content_loads_default() {
        let dir = temp_dir::TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.set(STATE_KEY, "definitely { not json").unwrap();

        let state = storage.load();
        assert!(state.tasks.is_empty());
        assert!(state.groceries.is_empty());
        assert!(state.meals.is_empty());
    }

    #[test]
    fn test_unknown_weekday_is_malformed() {
        let dir = temp_dir::TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage
            .set(STATE_KEY, r#"{"tasks":[],"groceries":[],"meals":{"Funday":"Cake"}}"#)
            .unwrap();

        assert_eq!(storage.load(), PlannerState::default());
    }

    #[test]
    fn test_household_is_trimmed() {
        let dir = temp_dir::TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.remember_household("smith");
        storage.set(HOUSEHOLD_KEY, " smith \n").unwrap();

        assert_eq!(storage.household().as_deref(), Some("smith"));
    }
}
