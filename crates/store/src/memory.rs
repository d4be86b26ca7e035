use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use futures::StreamExt;
use homeplan_shared::{Error, Result};
use tokio::sync::{Mutex, broadcast};

use crate::{
    CollectionPath, Document, DocumentPath, DocumentStore, Fields, IdentityProvider, Session,
    Snapshot, Watch, WatchTarget, document::sort_newest_first, identity::normalize_email,
    password::{hash_password, verify_password},
};

const CHANGE_CAPACITY: usize = 256;

/// In-process document store and identity provider.
///
/// Clones share the same data, so one instance can back several planners in
/// tests and behave like a shared remote database.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    changes: broadcast::Sender<CollectionPath>,
}

#[derive(Default)]
struct Inner {
    seq: i64,
    collections: HashMap<CollectionPath, Vec<(Document, i64)>>,
    users: HashMap<String, UserRow>,
}

struct UserRow {
    uid: String,
    password_hash: String,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);

        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            changes,
        }
    }

    fn notify(&self, collection: &CollectionPath) {
        // No receiver simply means nobody is watching.
        let _ = self.changes.send(collection.clone());
    }

    async fn snapshot(&self, target: &WatchTarget) -> Snapshot {
        let inner = self.inner.lock().await;

        match target {
            WatchTarget::Collection(path) => {
                let mut docs = inner.collections.get(path).cloned().unwrap_or_default();
                sort_newest_first(&mut docs);
                Snapshot::Collection(docs.into_iter().map(|(doc, _)| doc).collect())
            }
            WatchTarget::Document(path) => Snapshot::Document(
                inner
                    .collections
                    .get(&path.collection)
                    .and_then(|docs| docs.iter().find(|(doc, _)| doc.id == path.id))
                    .map(|(doc, _)| doc.clone()),
            ),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String> {
        let id = homeplan_shared::new_id();
        {
            let mut inner = self.inner.lock().await;
            inner.seq += 1;
            let seq = inner.seq;
            inner.collections.entry(collection.clone()).or_default().push((
                Document {
                    id: id.to_owned(),
                    fields,
                    created_at: homeplan_shared::now_millis(),
                },
                seq,
            ));
        }

        self.notify(collection);

        Ok(id)
    }

    async fn update(&self, doc: &DocumentPath, fields: Fields) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            let Some((stored, _)) = inner
                .collections
                .get_mut(&doc.collection)
                .and_then(|docs| docs.iter_mut().find(|(d, _)| d.id == doc.id))
            else {
                homeplan_shared::not_found!("document {doc}");
            };

            stored.fields.extend(fields);
        }

        self.notify(&doc.collection);

        Ok(())
    }

    async fn merge(&self, doc: &DocumentPath, fields: Fields) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            inner.seq += 1;
            let seq = inner.seq;
            let docs = inner.collections.entry(doc.collection.clone()).or_default();

            match docs.iter_mut().find(|(d, _)| d.id == doc.id) {
                Some((stored, _)) => stored.fields.extend(fields),
                None => docs.push((
                    Document {
                        id: doc.id.to_owned(),
                        fields,
                        created_at: homeplan_shared::now_millis(),
                    },
                    seq,
                )),
            }
        }

        self.notify(&doc.collection);

        Ok(())
    }

    async fn delete(&self, doc: &DocumentPath) -> Result<()> {
        let removed = {
            let mut inner = self.inner.lock().await;
            match inner.collections.get_mut(&doc.collection) {
                Some(docs) => {
                    let before = docs.len();
                    docs.retain(|(d, _)| d.id != doc.id);
                    before != docs.len()
                }
                None => false,
            }
        };

        if removed {
            self.notify(&doc.collection);
        }

        Ok(())
    }

    async fn watch(&self, target: WatchTarget) -> Result<Watch> {
        // Subscribe before reading so no change slips between the two.
        let rx = self.changes.subscribe();
        let initial = self.snapshot(&target).await;
        let store = self.clone();

        let changes = futures::stream::unfold(
            (store, rx, target),
            |(store, mut rx, target)| async move {
                loop {
                    match rx.recv().await {
                        Ok(changed) if &changed != target.collection() => continue,
                        Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                            let snapshot = store.snapshot(&target).await;
                            return Some((Ok::<_, Error>(snapshot), (store, rx, target)));
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            },
        );

        Ok(futures::stream::once(async move { Ok::<_, Error>(initial) })
            .chain(changes)
            .boxed())
    }
}

#[async_trait]
impl IdentityProvider for MemoryStore {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email);
        let password_hash = hash_password(password)?;

        let mut inner = self.inner.lock().await;
        if inner.users.contains_key(&email) {
            homeplan_shared::user!("email already in use");
        }

        let uid = homeplan_shared::new_id();
        inner.users.insert(
            email.to_owned(),
            UserRow {
                uid: uid.to_owned(),
                password_hash,
            },
        );

        Ok(Session { uid, email })
    }

    async fn log_in(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email);
        let (uid, password_hash) = {
            let inner = self.inner.lock().await;
            match inner.users.get(&email) {
                Some(row) => (row.uid.to_owned(), row.password_hash.to_owned()),
                None => homeplan_shared::bail!("invalid email or password"),
            }
        };

        if !verify_password(password, &password_hash)? {
            homeplan_shared::bail!("invalid email or password");
        }

        Ok(Session { uid, email })
    }
}
