mod coerce;
mod tag;

#[cfg(test)]
mod tests;

pub use coerce::{CoercionError, CoercionMode, coerce, parse_date_heuristic};
pub use tag::ValueTag;

use crate::{model::TypeRef, reference::ReferenceLoader, traits::MappedObject};
use chrono::{DateTime, FixedOffset, Utc};
use std::{fmt, sync::Arc};
use ulid::Ulid;

///
/// Value
///
/// Object-side dynamic value. Generated field accessors read and write
/// fields through this type; the codec translates it to and from
/// [`DocValue`](crate::document::DocValue).
///

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Calendar(DateTime<FixedOffset>),
    Blob(Vec<u8>),
    Ulid(Ulid),
    Enum(ValueEnum),
    List(Vec<Self>),
    Map(Vec<(String, Self)>),
    Object(ObjectValue),
    Ref(RefValue),
}

impl Value {
    #[must_use]
    pub const fn tag(&self) -> ValueTag {
        match self {
            Self::Null => ValueTag::Null,
            Self::Bool(_) => ValueTag::Bool,
            Self::Int32(_) => ValueTag::Int32,
            Self::Int64(_) => ValueTag::Int64,
            Self::Float32(_) => ValueTag::Float32,
            Self::Float64(_) => ValueTag::Float64,
            Self::Text(_) => ValueTag::Text,
            Self::Timestamp(_) => ValueTag::Timestamp,
            Self::Calendar(_) => ValueTag::Calendar,
            Self::Blob(_) => ValueTag::Blob,
            Self::Ulid(_) => ValueTag::Ulid,
            Self::Enum(_) => ValueTag::Enum,
            Self::List(_) => ValueTag::List,
            Self::Map(_) => ValueTag::Map,
            Self::Object(_) => ValueTag::Object,
            Self::Ref(_) => ValueTag::Ref,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key in a `Map` value.
    #[must_use]
    pub fn map_get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    #[must_use]
    pub fn object(object: impl MappedObject) -> Self {
        Self::Object(ObjectValue::new(object))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

///
/// ValueEnum
/// Symbolic enum constant together with the path of its declaring enum.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValueEnum {
    pub path: String,
    pub variant: String,
}

impl ValueEnum {
    pub fn new(path: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            variant: variant.into(),
        }
    }
}

///
/// ObjectValue
///
/// Owned mapped object carried inside a [`Value`]. Equality and cloning go
/// through the object's dynamic helpers.
///

pub struct ObjectValue(pub Box<dyn MappedObject>);

impl ObjectValue {
    pub fn new(object: impl MappedObject) -> Self {
        Self(Box::new(object))
    }

    #[must_use]
    pub fn type_ref(&self) -> TypeRef {
        self.0.type_ref()
    }

    #[must_use]
    pub fn as_object(&self) -> &dyn MappedObject {
        &*self.0
    }

    pub fn as_object_mut(&mut self) -> &mut dyn MappedObject {
        &mut *self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Box<dyn MappedObject> {
        self.0
    }

    /// Downcast into a concrete type; on mismatch returns the actual type.
    pub fn downcast<T: MappedObject>(self) -> Result<T, TypeRef> {
        let actual = self.type_ref();

        self.0
            .into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| actual)
    }
}

impl From<Box<dyn MappedObject>> for ObjectValue {
    fn from(object: Box<dyn MappedObject>) -> Self {
        Self(object)
    }
}

impl Clone for ObjectValue {
    fn clone(&self) -> Self {
        Self(self.0.clone_boxed())
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_dyn(&*other.0)
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

///
/// RefValue
///
/// Dynamic view of a reference field. Either carries the target object,
/// a stored identifier, or both. A loader is present when the identifier
/// came from storage and the target may still be fetched.
///

#[derive(Clone)]
pub struct RefValue {
    pub target: TypeRef,
    pub id: Option<Box<Value>>,
    pub object: Option<ObjectValue>,
    pub loader: Option<Arc<dyn ReferenceLoader>>,
}

impl RefValue {
    /// Reference holding an in-memory target.
    #[must_use]
    pub const fn loaded(target: TypeRef, object: ObjectValue) -> Self {
        Self {
            target,
            id: None,
            object: Some(object),
            loader: None,
        }
    }

    /// Reference known only by identifier, to be fetched through `loader`.
    #[must_use]
    pub fn deferred(target: TypeRef, id: Value, loader: Arc<dyn ReferenceLoader>) -> Self {
        Self {
            target,
            id: Some(Box::new(id)),
            object: None,
            loader: Some(loader),
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.object.is_some()
    }
}

impl PartialEq for RefValue {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target && self.id == other.id && self.object == other.object
    }
}

impl fmt::Debug for RefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefValue")
            .field("target", &self.target.path)
            .field("id", &self.id)
            .field("object", &self.object)
            .field("lazy", &self.loader.is_some())
            .finish()
    }
}
