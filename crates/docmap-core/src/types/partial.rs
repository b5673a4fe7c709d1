use crate::{
    error::MapperError,
    traits::{FieldValue, Mapped},
};
use derive_more::Deref;
use std::collections::BTreeSet;

///
/// PartialUpdate
///
/// An object plus the set of member names changed since it was wrapped.
/// Read access derefs to the object; writes go through `set` or `modify`
/// so every change is recorded. The codec's `marshall_partial` writes only
/// the recorded fields.
///

#[derive(Clone, Debug, Deref)]
pub struct PartialUpdate<T> {
    #[deref]
    inner: T,
    changed: BTreeSet<String>,
}

impl<T: Mapped> PartialUpdate<T> {
    pub const fn new(inner: T) -> Self {
        Self {
            inner,
            changed: BTreeSet::new(),
        }
    }

    /// Write one field through its accessor and record the change.
    pub fn set<V: FieldValue>(&mut self, field: &str, value: V) -> Result<(), MapperError> {
        self.inner.set_field(field, value.to_value())?;
        self.changed.insert(field.to_string());

        Ok(())
    }

    /// Mutable access for a change to `field`, which is recorded up front.
    pub fn modify(&mut self, field: &str) -> &mut T {
        self.changed.insert(field.to_string());
        &mut self.inner
    }

    pub fn mark_changed(&mut self, field: &str) {
        self.changed.insert(field.to_string());
    }

    #[must_use]
    pub fn is_changed(&self, field: &str) -> bool {
        self.changed.contains(field)
    }

    pub fn changed_fields(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    pub fn clear_changes(&mut self) {
        self.changed.clear();
    }

    pub(crate) const fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}
