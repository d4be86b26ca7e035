use async_trait::async_trait;
use futures::stream::BoxStream;
use homeplan_shared::Result;
use serde_json::{Map, Value};

/// Field map of a document.
pub type Fields = Map<String, Value>;

/// Slash separated location of a collection, e.g. `households/smith/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn doc(&self, id: impl Into<String>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    pub collection: CollectionPath,
    pub id: String,
}

impl std::fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
    /// Server assigned creation time in unix milliseconds.
    pub created_at: i64,
}

impl Document {
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(Value::as_bool)
    }
}

/// What a watcher observed at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// Every document of a collection, newest first.
    Collection(Vec<Document>),
    /// A single document, `None` until it is first written.
    Document(Option<Document>),
}

/// Target of a live watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchTarget {
    Collection(CollectionPath),
    Document(DocumentPath),
}

impl WatchTarget {
    /// Collection whose changes wake the watcher up.
    pub fn collection(&self) -> &CollectionPath {
        match self {
            WatchTarget::Collection(path) => path,
            WatchTarget::Document(doc) => &doc.collection,
        }
    }
}

/// Stream of snapshots. The first item is the current state, then one item
/// per observed change. Dropping the stream unsubscribes.
pub type Watch = BoxStream<'static, Result<Snapshot>>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Appends a document with a store generated id and creation time.
    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String>;

    /// Overwrites the given fields of an existing document.
    async fn update(&self, doc: &DocumentPath, fields: Fields) -> Result<()>;

    /// Writes the given fields, creating the document when missing and
    /// keeping every other field untouched.
    async fn merge(&self, doc: &DocumentPath, fields: Fields) -> Result<()>;

    /// Removes a document. Removing a missing document is not an error.
    async fn delete(&self, doc: &DocumentPath) -> Result<()>;

    async fn watch(&self, target: WatchTarget) -> Result<Watch>;

    async fn watch_collection(&self, collection: &CollectionPath) -> Result<Watch> {
        self.watch(WatchTarget::Collection(collection.clone())).await
    }

    async fn watch_document(&self, doc: &DocumentPath) -> Result<Watch> {
        self.watch(WatchTarget::Document(doc.clone())).await
    }
}

/// Newest first, ties broken by store insertion sequence.
pub(crate) fn sort_newest_first(docs: &mut [(Document, i64)]) {
    docs.sort_by(|(a, a_seq), (b, b_seq)| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b_seq.cmp(a_seq))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, created_at: i64) -> Document {
        Document {
            id: id.to_owned(),
            fields: Fields::new(),
            created_at,
        }
    }

    #[test]
    fn test_sort_newest_first_with_ties() {
        let mut docs = vec![(doc("a", 10), 1), (doc("b", 20), 2), (doc("c", 20), 3)];
        sort_newest_first(&mut docs);

        let ids: Vec<&str> = docs.iter().map(|(d, _)| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_document_path_display() {
        let path = CollectionPath::new("households/smith/tasks").doc("01J");
        assert_eq!(path.to_string(), "households/smith/tasks/01J");
    }
}
