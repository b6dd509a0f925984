use std::collections::HashMap;

use async_trait::async_trait;
use bson::{Bson, Document};
use tokio::sync::Mutex;

use crate::{Selector, Store, UpdateDoc};

/// An in-memory `Store` used by tests throughout the workspace.
///
/// Implements the exact same selector/update semantics as `MongoStore` so a
/// test written against `MemoryStore` exercises the real contract, not a
/// stand-in for it.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_collections(&self) -> Vec<String> {
        self.collections.lock().await.keys().cloned().collect()
    }

    async fn drop(&self, collection: &str) {
        self.collections.lock().await.remove(collection);
    }

    async fn insert(&self, collection: &str, document: Document) {
        self.collections
            .lock()
            .await
            .entry(collection.to_owned())
            .or_default()
            .push(document);
    }

    async fn upsert(&self, collection: &str, selector: Selector, update: UpdateDoc) {
        if update.is_empty() {
            return;
        }
        let mut guard = self.collections.lock().await;
        let rows = guard.entry(collection.to_owned()).or_default();

        if let Some(existing) = rows.iter_mut().find(|doc| selector.matches(doc)) {
            apply_set(existing, update.set_doc());
            apply_add_to_set(existing, update.add_to_set_doc());
        } else {
            let mut created = Document::new();
            created.insert(selector.field, selector.value.clone());
            apply_set(&mut created, update.set_on_insert_doc());
            apply_set(&mut created, update.set_doc());
            apply_add_to_set(&mut created, update.add_to_set_doc());
            rows.push(created);
        }
    }

    async fn append(&self, collection: &str, selector: Selector, field: &str, value: Bson) {
        let mut guard = self.collections.lock().await;
        let rows = guard.entry(collection.to_owned()).or_default();

        if let Some(existing) = rows.iter_mut().find(|doc| selector.matches(doc)) {
            push(existing, field, value);
        } else {
            let mut created = Document::new();
            created.insert(selector.field, selector.value.clone());
            push(&mut created, field, value);
            rows.push(created);
        }
    }

    async fn scan(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

fn apply_set(target: &mut Document, fields: &Document) {
    for (key, value) in fields {
        target.insert(key.clone(), value.clone());
    }
}

fn apply_add_to_set(target: &mut Document, fields: &Document) {
    for (key, value) in fields {
        let set = target
            .entry(key.clone())
            .or_insert_with(|| Bson::Array(Vec::new()));
        if let Bson::Array(values) = set {
            if !values.contains(value) {
                values.push(value.clone());
            }
        }
    }
}

fn push(target: &mut Document, field: &str, value: Bson) {
    let array = target
        .entry(field.to_owned())
        .or_insert_with(|| Bson::Array(Vec::new()));
    if let Bson::Array(values) = array {
        values.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UpdateDoc;

    #[tokio::test]
    async fn upsert_creates_then_merges() {
        let store = MemoryStore::new();
        store
            .upsert(
                "BERTHS",
                Selector::eq("NAME", "MP0001"),
                UpdateDoc::new()
                    .set("LATEST_TRAIN", "0000")
                    .set_on_insert("FIXED", false),
            )
            .await;
        store
            .upsert(
                "BERTHS",
                Selector::eq("NAME", "MP0001"),
                UpdateDoc::new()
                    .set("LATEST_TRAIN", "1A23")
                    .set_on_insert("FIXED", true),
            )
            .await;

        let rows = store.scan("BERTHS").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("LATEST_TRAIN").unwrap(), "1A23");
        // set_on_insert from the second call must not have clobbered the first.
        assert_eq!(rows[0].get_bool("FIXED").unwrap(), false);
    }

    #[tokio::test]
    async fn add_to_set_has_no_duplicates() {
        let store = MemoryStore::new();
        store
            .upsert(
                "BERTHS",
                Selector::eq("NAME", "MP0001"),
                UpdateDoc::new().add_to_set("CONNECTIONS", "MP0002"),
            )
            .await;
        store
            .upsert(
                "BERTHS",
                Selector::eq("NAME", "MP0001"),
                UpdateDoc::new().add_to_set("CONNECTIONS", "MP0002"),
            )
            .await;

        let rows = store.scan("BERTHS").await;
        let connections = rows[0].get_array("CONNECTIONS").unwrap();
        assert_eq!(connections.len(), 1);
    }

    #[tokio::test]
    async fn append_is_not_deduplicated() {
        let store = MemoryStore::new();
        store
            .append(
                "TRAINS",
                Selector::eq("NAME", "1A23"),
                "BERTHS",
                Bson::String("MP0001".into()),
            )
            .await;
        store
            .append(
                "TRAINS",
                Selector::eq("NAME", "1A23"),
                "BERTHS",
                Bson::String("MP0001".into()),
            )
            .await;

        let rows = store.scan("TRAINS").await;
        let berths = rows[0].get_array("BERTHS").unwrap();
        assert_eq!(berths.len(), 2);
    }
}
