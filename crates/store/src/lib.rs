//! Remote side of the planner: a document store with live watchers and an
//! identity provider.
//!
//! Two backends ship with the crate. [`MemoryStore`] keeps everything in the
//! process and pushes snapshots as soon as a collection changes.
//! [`SqliteStore`] persists into a SQLite database that several planner
//! processes may share, and watches it by polling a revision counter.

mod document;
mod identity;
mod memory;
mod password;
mod sqlite;

pub use document::*;
pub use identity::*;
pub use memory::MemoryStore;
pub use password::{hash_password, verify_password};
pub use sqlite::SqliteStore;

use std::{sync::Arc, time::Duration};

/// Both halves of a cloud backend, usually served by the same store.
#[derive(Clone)]
pub struct Backend {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Opens the backend behind `url`.
///
/// `memory://` selects an in-process store. Any `sqlite:` url opens (or
/// creates) a shared database, bound to `api_key` on first use.
pub async fn open(
    url: &str,
    api_key: &str,
    poll_interval: Duration,
) -> homeplan_shared::Result<Backend> {
    if url.starts_with("memory://") {
        let store = MemoryStore::new();

        return Ok(Backend {
            store: Arc::new(store.clone()),
            identity: Arc::new(store),
        });
    }

    if !url.starts_with("sqlite:") {
        homeplan_shared::bail!("unsupported cloud url scheme: {url}");
    }

    let store = SqliteStore::open(url, poll_interval).await?;
    store.bind_api_key(api_key).await?;

    Ok(Backend {
        store: Arc::new(store.clone()),
        identity: Arc::new(store),
    })
}
