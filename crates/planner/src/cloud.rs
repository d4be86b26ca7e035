use std::{collections::BTreeMap, str::FromStr, sync::Arc};

use async_trait::async_trait;
use futures::StreamExt;
use homeplan_shared::{Error, Result, Weekday};
use homeplan_store::{
    CollectionPath, Document, DocumentPath, DocumentStore, Fields, Session, Snapshot, Watch,
};
use serde_json::Value;
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{
    Item, ListKind, LiveState, SyncAdapter, SyncMode, ViewEvent, clean_text, local::list_event,
};

/// Remote locations of one household.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseholdScope {
    household: String,
}

impl HouseholdScope {
    pub fn new(household: impl Into<String>) -> Self {
        Self {
            household: household.into(),
        }
    }

    pub fn household(&self) -> &str {
        &self.household
    }

    pub fn list(&self, list: ListKind) -> CollectionPath {
        CollectionPath::new(format!("households/{}/{list}", self.household))
    }

    pub fn meals(&self) -> DocumentPath {
        CollectionPath::new(format!("households/{}/planner", self.household)).doc("meals")
    }
}

#[derive(Debug, Clone, Copy)]
enum Slice {
    List(ListKind),
    Meals,
}

struct Binding {
    scope: HouseholdScope,
    subscriptions: Vec<JoinHandle<()>>,
}

impl Binding {
    /// Stops every subscription and waits until none of them can touch the
    /// state anymore.
    async fn teardown(self) {
        for handle in self.subscriptions.iter() {
            handle.abort();
        }

        for handle in self.subscriptions {
            let _ = handle.await;
        }

        tracing::debug!(household = self.scope.household(), "subscriptions torn down");
    }
}

/// Mirrors a household of a [`DocumentStore`] into [`LiveState`].
pub struct CloudAdapter {
    store: Arc<dyn DocumentStore>,
    live: LiveState,
    binding: Mutex<Option<Binding>>,
}

impl CloudAdapter {
    pub fn new(store: Arc<dyn DocumentStore>, live: LiveState) -> Self {
        Self {
            store,
            live,
            binding: Mutex::new(None),
        }
    }

    fn spawn(&self, slice: Slice, mut watch: Watch) -> JoinHandle<()> {
        let live = self.live.clone();

        tokio::spawn(async move {
            while let Some(next) = watch.next().await {
                match next {
                    Ok(snapshot) => apply(&live, slice, snapshot).await,
                    Err(err) => {
                        tracing::warn!(slice = ?slice, err = %err, "subscription error");
                        live.set_status(err.to_string()).await;
                    }
                }
            }
        })
    }
}

async fn apply(live: &LiveState, slice: Slice, snapshot: Snapshot) {
    match (slice, snapshot) {
        (Slice::List(list), Snapshot::Collection(docs)) => {
            let items: Vec<Item> = docs.iter().filter_map(item_from_document).collect();
            *live.state().write().await.list_mut(list) = items;
            live.emit(list_event(list));
        }
        (Slice::Meals, Snapshot::Document(doc)) => {
            let meals = doc.as_ref().map(meals_from_document).unwrap_or_default();
            live.state().write().await.meals = meals;
            live.emit(ViewEvent::Meals);
        }
        (slice, _) => {
            tracing::warn!(slice = ?slice, "snapshot does not match its subscription");
        }
    }
}

fn item_from_document(doc: &Document) -> Option<Item> {
    Some(Item {
        id: doc.id.to_owned(),
        text: doc.str_field("text")?.to_owned(),
        done: doc.bool_field("done").unwrap_or(false),
        created_at: Some(doc.created_at),
    })
}

fn meals_from_document(doc: &Document) -> BTreeMap<Weekday, String> {
    doc.fields
        .iter()
        .filter_map(|(day, value)| {
            let day = Weekday::from_str(day).ok()?;
            Some((day, value.as_str()?.to_owned()))
        })
        .collect()
}

#[async_trait]
impl SyncAdapter for CloudAdapter {
    fn mode(&self) -> SyncMode {
        SyncMode::Cloud
    }

    fn live(&self) -> &LiveState {
        &self.live
    }

    async fn connect(&self, household: &str, session: Option<&Session>) -> Result<()> {
        let Some(session) = session else {
            return Err(Error::Unauthenticated);
        };

        let mut binding = self.binding.lock().await;

        // Old subscriptions must be gone before the state is reset, or a late
        // snapshot of the previous household could land in the new one.
        if let Some(previous) = binding.take() {
            previous.teardown().await;
        }

        *self.live.state().write().await = Default::default();
        self.live.emit_all();

        let scope = HouseholdScope::new(household);
        let tasks = self
            .store
            .watch_collection(&scope.list(ListKind::Tasks))
            .await?;
        let groceries = self
            .store
            .watch_collection(&scope.list(ListKind::Groceries))
            .await?;
        let meals = self.store.watch_document(&scope.meals()).await?;

        let subscriptions = vec![
            self.spawn(Slice::List(ListKind::Tasks), tasks),
            self.spawn(Slice::List(ListKind::Groceries), groceries),
            self.spawn(Slice::Meals, meals),
        ];

        tracing::info!(
            household = household,
            user = %session.uid,
            "subscribed to household"
        );

        *binding = Some(Binding {
            scope,
            subscriptions,
        });

        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(previous) = self.binding.lock().await.take() {
            previous.teardown().await;
        }

        *self.live.state().write().await = Default::default();
        self.live.emit_all();
    }

    async fn add(&self, list: ListKind, text: &str) -> Result<()> {
        let text = clean_text(text)?;
        let binding = self.binding.lock().await;
        let Some(Binding { scope, .. }) = binding.as_ref() else {
            return Err(Error::Unauthenticated);
        };

        let mut fields = Fields::new();
        fields.insert("text".to_owned(), Value::String(text));
        fields.insert("done".to_owned(), Value::Bool(false));

        self.store.add(&scope.list(list), fields).await?;

        Ok(())
    }

    async fn toggle(&self, list: ListKind, id: &str, current_done: bool) -> Result<()> {
        let binding = self.binding.lock().await;
        let Some(Binding { scope, .. }) = binding.as_ref() else {
            return Err(Error::Unauthenticated);
        };

        let mut fields = Fields::new();
        fields.insert("done".to_owned(), Value::Bool(!current_done));

        self.store.update(&scope.list(list).doc(id), fields).await
    }

    async fn delete(&self, list: ListKind, id: &str) -> Result<()> {
        let binding = self.binding.lock().await;
        let Some(Binding { scope, .. }) = binding.as_ref() else {
            return Err(Error::Unauthenticated);
        };

        self.store.delete(&scope.list(list).doc(id)).await
    }

    async fn update_meal(&self, day: Weekday, value: &str) -> Result<()> {
        // Held until the merge is done, so a reconnect can not move the
        // optimistic value into another household.
        let binding = self.binding.lock().await;
        let Some(Binding { scope, .. }) = binding.as_ref() else {
            return Err(Error::Unauthenticated);
        };

        self.live
            .state()
            .write()
            .await
            .meals
            .insert(day, value.to_owned());
        self.live.emit(ViewEvent::Meals);

        let mut fields = Fields::new();
        fields.insert(day.to_string(), Value::String(value.to_owned()));

        self.store.merge(&scope.meals(), fields).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_paths() {
        let scope = HouseholdScope::new("smith");

        assert_eq!(
            scope.list(ListKind::Tasks).as_str(),
            "households/smith/tasks"
        );
        assert_eq!(
            scope.list(ListKind::Groceries).as_str(),
            "households/smith/groceries"
        );
        assert_eq!(scope.meals().to_string(), "households/smith/planner/meals");
    }

    #[test]
    fn test_meals_ignore_unknown_fields() {
        let mut fields = Fields::new();
        fields.insert("Monday".to_owned(), Value::String("Pasta".to_owned()));
        fields.insert("Funday".to_owned(), Value::String("Cake".to_owned()));
        fields.insert("Tuesday".to_owned(), Value::Bool(true));

        let doc = Document {
            id: "meals".to_owned(),
            fields,
            created_at: 0,
        };

        let meals = meals_from_document(&doc);
        assert_eq!(meals.len(), 1);
        assert_eq!(meals.get(&Weekday::Monday).map(String::as_str), Some("Pasta"));
    }

    #[test]
    fn test_document_without_text_is_skipped() {
        let doc = Document {
            id: "x".to_owned(),
            fields: Fields::new(),
            created_at: 0,
        };

        assert!(item_from_document(&doc).is_none());
    }
}
