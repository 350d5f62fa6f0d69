//! Helpers over a document collection.
//!
//! Documents are JSON objects. A filter is a document too: a document matches
//! when every filter field is equal to the document's field, or is contained
//! in it when the document's field is an array.

use std::sync::{Arc, RwLock};

use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::Result;

/// A JSON object stored in a collection.
pub type Document = Map<String, JsonValue>;

const ID_FIELD: &str = "_id";

/// The operations the helpers need from a document collection.
pub trait Collection {
    /// Inserts `doc` and returns its `_id`, generating one if absent.
    fn insert_one(&self, doc: Document) -> Result<String>;

    /// Returns every document matching `filter`, in insertion order.
    fn find(&self, filter: &Document) -> Result<Vec<Document>>;

    /// Sets the fields of `set` on every document matching `filter` and
    /// returns how many matched.
    fn update_many(&self, filter: &Document, set: &Document) -> Result<u64>;
}

/// An in-process collection. Clones share the same documents.
#[derive(Clone, Default)]
pub struct MemoryCollection {
    docs: Arc<RwLock<Vec<Document>>>,
}

impl MemoryCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(field, expected)| match doc.get(field) {
        Some(JsonValue::Array(items)) if !expected.is_array() => items.contains(expected),
        Some(actual) => actual == expected,
        None => false,
    })
}

impl Collection for MemoryCollection {
    fn insert_one(&self, mut doc: Document) -> Result<String> {
        let id = doc
            .entry(ID_FIELD)
            .or_insert_with(|| JsonValue::String(Uuid::new_v4().to_string()));
        let id = match id {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.docs.write().unwrap().push(doc);
        Ok(id)
    }

    fn find(&self, filter: &Document) -> Result<Vec<Document>> {
        let docs = self.docs.read().unwrap();
        Ok(docs.iter().filter(|doc| matches(doc, filter)).cloned().collect())
    }

    fn update_many(&self, filter: &Document, set: &Document) -> Result<u64> {
        let mut docs = self.docs.write().unwrap();
        let mut matched = 0;
        for doc in docs.iter_mut().filter(|doc| matches(doc, filter)) {
            for (field, value) in set {
                doc.insert(field.clone(), value.clone());
            }
            matched += 1;
        }
        Ok(matched)
    }
}

/// Lists every document in the collection.
pub fn list_all<C: Collection>(collection: &C) -> Result<Vec<Document>> {
    collection.find(&Document::new())
}

/// Inserts a school document built from `fields` and returns its id.
pub fn insert_school<C: Collection>(collection: &C, fields: Document) -> Result<String> {
    collection.insert_one(fields)
}

/// Replaces the topics of every school named `name`.
pub fn update_topics<C: Collection>(collection: &C, name: &str, topics: &[&str]) -> Result<u64> {
    let mut filter = Document::new();
    filter.insert("name".to_owned(), JsonValue::from(name));
    let mut set = Document::new();
    set.insert("topics".to_owned(), JsonValue::from(topics.to_vec()));
    collection.update_many(&filter, &set)
}
