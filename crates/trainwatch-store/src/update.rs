use bson::{Bson, Document};

/// An upsert update: field-set, set-on-insert, and add-to-set operators
///, built up with a small fluent API.
#[derive(Debug, Clone, Default)]
pub struct UpdateDoc {
    set: Document,
    set_on_insert: Document,
    add_to_set: Document,
}

impl UpdateDoc {
    /// Start an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to `value` unconditionally.
    #[must_use]
    pub fn set(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.set.insert(field, value.into());
        self
    }

    /// Set `field` to `value` only if the document is being created.
    #[must_use]
    pub fn set_on_insert(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.set_on_insert.insert(field, value.into());
        self
    }

    /// Add `value` to the set-valued array field `field` if not already present.
    #[must_use]
    pub fn add_to_set(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.add_to_set.insert(field, value.into());
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.set.is_empty() && self.set_on_insert.is_empty() && self.add_to_set.is_empty()
    }

    pub(crate) fn set_doc(&self) -> &Document {
        &self.set
    }

    pub(crate) fn set_on_insert_doc(&self) -> &Document {
        &self.set_on_insert
    }

    pub(crate) fn add_to_set_doc(&self) -> &Document {
        &self.add_to_set
    }
}
