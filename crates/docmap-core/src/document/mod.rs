#[cfg(test)]
mod tests;

use crate::{
    error::{ErrorClass, ErrorOrigin, MapperError},
    value::Value,
};
use chrono::{DateTime, Utc};
use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};
use ulid::Ulid;

/// Reserved identifier key.
pub const ID_KEY: &str = "_id";

/// Reserved type-tag key.
pub const TYPE_TAG_KEY: &str = "class_name";

/// Older spelling of the type-tag key, accepted on read.
pub const LEGACY_TYPE_TAG_KEY: &str = "className";

/// Payload key of an opaque binary envelope.
pub const ENVELOPE_DATA_KEY: &str = "_data";

/// Constant name inside a tagged enum document.
pub const ENUM_NAME_KEY: &str = "name";

/// Keys of a stored to-many reference entry.
pub const REF_ID_KEY: &str = "ref_to_id";
pub const REF_COLLECTION_KEY: &str = "referenced_collection";

///
/// Document
///
/// Ordered string-keyed container. Inserting an existing key replaces the
/// value in place, so a key appears at most once.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    entries: Vec<(String, DocValue)>,
}

impl Document {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DocValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut DocValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace; returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<DocValue>) -> Option<DocValue> {
        let key = key.into();
        let value = value.into();

        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
            Some(std::mem::replace(&mut self.entries[pos].1, value))
        } else {
            self.entries.push((key, value));
            None
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<DocValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;

        Some(self.entries.remove(pos).1)
    }

    /// Keep only the entries whose key satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(k, _)| keep(k));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Type tag, under either spelling.
    #[must_use]
    pub fn type_tag(&self) -> Option<&str> {
        self.get(TYPE_TAG_KEY)
            .or_else(|| self.get(LEGACY_TYPE_TAG_KEY))
            .and_then(DocValue::as_str)
    }

    #[must_use]
    pub fn is_type_tag_key(key: &str) -> bool {
        key == TYPE_TAG_KEY || key == LEGACY_TYPE_TAG_KEY
    }

    /// Whether this document is an opaque binary envelope.
    #[must_use]
    pub fn is_envelope(&self) -> bool {
        self.type_tag().is_some() && matches!(self.get(ENVELOPE_DATA_KEY), Some(DocValue::Binary(_)))
    }

    /// Structural equality that ignores key order at every level.
    #[must_use]
    pub fn eq_ignoring_order(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(k, v)| {
                other
                    .get(k)
                    .is_some_and(|o| v.eq_ignoring_order(o))
            })
    }

    /// Parse a JSON object into a document.
    pub fn from_json(json: &str) -> Result<Self, MapperError> {
        let parsed: serde_json::Value = serde_json::from_str(json).map_err(|err| {
            MapperError::new(
                ErrorClass::Deserialization,
                ErrorOrigin::Codec,
                format!("invalid JSON document: {err}"),
            )
        })?;

        match DocValue::from(parsed) {
            DocValue::Document(doc) => Ok(doc),
            _ => Err(MapperError::deserialization(
                "JSON input must be an object at the top level",
            )),
        }
    }

    pub fn to_json(&self) -> Result<String, MapperError> {
        serde_json::to_string(self).map_err(|err| {
            MapperError::new(
                ErrorClass::InvariantViolation,
                ErrorOrigin::Serialize,
                format!("document cannot be rendered as JSON: {err}"),
            )
        })
    }
}

impl FromIterator<(String, DocValue)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, DocValue)>>(iter: I) -> Self {
        let mut doc = Self::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl IntoIterator for Document {
    type Item = (String, DocValue);
    type IntoIter = std::vec::IntoIter<(String, DocValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

///
/// DocValue
/// Wire-side value stored under a document key.
///

#[derive(Clone, Debug, PartialEq)]
pub enum DocValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Binary(Vec<u8>),
    ObjectId(Ulid),
    Array(Vec<Self>),
    Document(Document),
}

impl DocValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Scalar identifier form of an object-side value.
    #[must_use]
    pub fn from_scalar(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Null => Self::Null,
            Value::Bool(v) => Self::Bool(*v),
            Value::Int32(v) => Self::Int32(*v),
            Value::Int64(v) => Self::Int64(*v),
            Value::Float32(v) => Self::Double(f64::from(*v)),
            Value::Float64(v) => Self::Double(*v),
            Value::Text(v) => Self::String(v.clone()),
            Value::Timestamp(v) => Self::DateTime(*v),
            Value::Calendar(v) => Self::DateTime(v.with_timezone(&Utc)),
            Value::Blob(v) => Self::Binary(v.clone()),
            Value::Ulid(v) => Self::ObjectId(*v),
            Value::Enum(e) => Self::String(e.variant.clone()),
            _ => return None,
        })
    }

    /// Untyped object-side form: arrays become lists and documents maps.
    #[must_use]
    pub fn to_plain_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(v) => Value::Bool(*v),
            Self::Int32(v) => Value::Int32(*v),
            Self::Int64(v) => Value::Int64(*v),
            Self::Double(v) => Value::Float64(*v),
            Self::String(v) => Value::Text(v.clone()),
            Self::DateTime(v) => Value::Timestamp(*v),
            Self::Binary(v) => Value::Blob(v.clone()),
            Self::ObjectId(v) => Value::Ulid(*v),
            Self::Array(items) => Value::List(items.iter().map(Self::to_plain_value).collect()),
            Self::Document(doc) => Value::Map(
                doc.iter()
                    .map(|(k, v)| (k.to_string(), v.to_plain_value()))
                    .collect(),
            ),
        }
    }

    #[must_use]
    pub fn eq_ignoring_order(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Document(a), Self::Document(b)) => a.eq_ignoring_order(b),
            (Self::Array(a), Self::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_ignoring_order(y))
            }
            _ => self == other,
        }
    }
}

impl Serialize for DocValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int32(v) => serializer.serialize_i32(*v),
            Self::Int64(v) => serializer.serialize_i64(*v),
            Self::Double(v) => serializer.serialize_f64(*v),
            Self::String(v) => serializer.serialize_str(v),
            Self::DateTime(v) => v.serialize(serializer),
            Self::Binary(v) => serde_bytes::Bytes::new(v).serialize(serializer),
            Self::ObjectId(v) => serializer.collect_str(v),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Document(doc) => doc.serialize(serializer),
        }
    }
}

impl From<serde_json::Value> for DocValue {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => i32::try_from(i).map_or(Self::Int64(i), Self::Int32),
                None => n.as_f64().map_or(Self::Null, Self::Double),
            },
            Json::String(s) => Self::String(s),
            Json::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Json::Object(map) => Self::Document(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Document> for DocValue {
    fn from(doc: Document) -> Self {
        Self::Document(doc)
    }
}

impl From<&str> for DocValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for DocValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i32> for DocValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for DocValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for DocValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<bool> for DocValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<Self>> for DocValue {
    fn from(items: Vec<Self>) -> Self {
        Self::Array(items)
    }
}

///
/// doc!
///
/// Build a [`Document`] from `key => value` pairs.
///

#[macro_export]
macro_rules! doc {
    () => { $crate::document::Document::new() };
    ( $( $key:expr => $value:expr ),+ $(,)? ) => {{
        let mut doc = $crate::document::Document::new();
        $( doc.insert($key, $value); )+
        doc
    }};
}
