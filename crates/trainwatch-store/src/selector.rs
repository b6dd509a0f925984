use bson::Bson;

/// A single-key equality selector ("`selector` is a single-key equality").
#[derive(Debug, Clone)]
pub struct Selector {
    /// The field to match on, e.g. `"NAME"`.
    pub field: &'static str,
    /// The value the field must equal.
    pub value: Bson,
}

impl Selector {
    /// Build a selector matching `field == value`.
    pub fn eq(field: &'static str, value: impl Into<Bson>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    pub(crate) fn to_filter(&self) -> bson::Document {
        let mut filter = bson::Document::new();
        filter.insert(self.field, self.value.clone());
        filter
    }

    pub(crate) fn matches(&self, document: &bson::Document) -> bool {
        document.get(self.field) == Some(&self.value)
    }
}
