use async_trait::async_trait;
use bson::{doc, Bson, Document};
use mongodb::options::{ClientOptions, UpdateOptions};
use mongodb::{Client, Database};
use tracing::warn;

use crate::{Selector, Store, UpdateDoc};

/// `Store` backed by a real MongoDB deployment via the official driver.
///
/// Every method here is the infallible half of a try/except pair: on error
/// it logs at `warn` and returns a harmless default ("Store
/// write failure — logged and swallowed; no retry at this layer").
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect to `uri` and select the `thetrains` database.
    ///
    /// Returns `None` (rather than an error) on failure, mirroring the
    /// source's `Mongo.connect` classmethod, which the collector and
    /// generator both treat as "proceed without persistence" rather than
    /// a fatal startup error.
    pub async fn connect(uri: &str) -> Option<Self> {
        let options = match ClientOptions::parse(uri).await {
            Ok(options) => options,
            Err(err) => {
                warn!(error = %err, "mongo connection string error");
                return None;
            }
        };
        let client = match Client::with_options(options) {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "mongo client error");
                return None;
            }
        };
        let db = client.database("thetrains");
        Some(Self { db })
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn list_collections(&self) -> Vec<String> {
        match self.db.list_collection_names().await {
            Ok(names) => names,
            Err(err) => {
                warn!(error = %err, "mongo list_collections error");
                Vec::new()
            }
        }
    }

    async fn drop(&self, collection: &str) {
        if let Err(err) = self.db.collection::<Document>(collection).drop().await {
            warn!(error = %err, collection, "mongo drop error");
        }
    }

    async fn insert(&self, collection: &str, document: Document) {
        if let Err(err) = self
            .db
            .collection::<Document>(collection)
            .insert_one(document)
            .await
        {
            warn!(error = %err, collection, "mongo insert error");
        }
    }

    async fn upsert(&self, collection: &str, selector: Selector, update: UpdateDoc) {
        if update.is_empty() {
            return;
        }
        let mut operators = Document::new();
        if !update.set_doc().is_empty() {
            operators.insert("$set", update.set_doc().clone());
        }
        if !update.set_on_insert_doc().is_empty() {
            operators.insert("$setOnInsert", update.set_on_insert_doc().clone());
        }
        if !update.add_to_set_doc().is_empty() {
            let mut add_to_set = Document::new();
            for (field, value) in update.add_to_set_doc() {
                add_to_set.insert(field, doc! { "$each": [value.clone()] });
            }
            operators.insert("$addToSet", add_to_set);
        }

        let options = UpdateOptions::builder().upsert(true).build();
        if let Err(err) = self
            .db
            .collection::<Document>(collection)
            .update_one(selector.to_filter(), operators)
            .with_options(options)
            .await
        {
            warn!(error = %err, collection, "mongo upsert error");
        }
    }

    async fn append(&self, collection: &str, selector: Selector, field: &str, value: Bson) {
        let push = doc! { "$push": { field: value } };
        if let Err(err) = self
            .db
            .collection::<Document>(collection)
            .update_one(selector.to_filter(), push)
            .await
        {
            warn!(error = %err, collection, field, "mongo append error");
        }
    }

    async fn scan(&self, collection: &str) -> Vec<Document> {
        use futures_util::TryStreamExt;

        let cursor = match self
            .db
            .collection::<Document>(collection)
            .find(doc! {})
            .await
        {
            Ok(cursor) => cursor,
            Err(err) => {
                warn!(error = %err, collection, "mongo scan error");
                return Vec::new();
            }
        };

        match cursor.try_collect::<Vec<Document>>().await {
            Ok(documents) => documents,
            Err(err) => {
                warn!(error = %err, collection, "mongo scan cursor error");
                Vec::new()
            }
        }
    }
}
