//! Thin document-store facade.
//!
//! `Store` is the only shared resource between the collector and the
//! generator. Every operation is infallible from the caller's
//! point of view — failures are logged and swallowed inside the
//! implementation, never propagated, so callers never need to branch on
//! "did this persist".

mod memory;
mod mongo;
mod selector;
mod update;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use selector::Selector;
pub use update::UpdateDoc;

use async_trait::async_trait;
use bson::Document;

/// A document-store facade: upsert, append-to-array, collection scan.
///
/// Implementations must not panic and must not propagate errors to callers;
/// log-and-swallow internally. This is intentional: the collector tolerates
/// lost writes as long as the feed keeps flowing, and the
/// generator simply gets an empty scan back if the store is unreachable.
#[async_trait]
pub trait Store: Send + Sync {
    /// List the names of every collection currently present.
    async fn list_collections(&self) -> Vec<String>;

    /// Drop a collection entirely.
    async fn drop(&self, collection: &str);

    /// Append-only insert; never matches an existing document.
    async fn insert(&self, collection: &str, document: Document);

    /// Create-or-update a single document matched by `selector`, applying
    /// `update`'s field-set / set-on-insert / add-to-set operators.
    async fn upsert(&self, collection: &str, selector: Selector, update: UpdateDoc);

    /// Append `value` onto the ordered sequence field `field` of the
    /// document matched by `selector`. Not idempotent — used only for
    /// `TRAIN.BERTHS` / `TRAIN.TIMES`.
    async fn append(&self, collection: &str, selector: Selector, field: &str, value: bson::Bson);

    /// Every document currently in `collection`.
    async fn scan(&self, collection: &str) -> Vec<Document>;
}
