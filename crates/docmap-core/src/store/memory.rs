use crate::{
    document::{DocValue, Document, ID_KEY},
    model::TypeRef,
    store::{DocumentStore, StoreError, Writer},
};
use std::{
    collections::HashMap,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicI64, AtomicUsize, Ordering},
    },
};

///
/// MemoryStore
///
/// In-process store for tests and embedding. Documents are keyed by type
/// path and a normalized id; documents without an id get the next
/// sequential Int64. Every collaborator call is counted.
///

pub struct MemoryStore {
    documents: Mutex<HashMap<(&'static str, String), Document>>,
    next_id: AtomicI64,
    find_calls: AtomicUsize,
    persist_calls: AtomicUsize,
    store_calls: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            find_calls: AtomicUsize::new(0),
            persist_calls: AtomicUsize::new(0),
            store_calls: AtomicUsize::new(0),
        }
    }

    /// Number of `find_by_id` round trips served.
    #[must_use]
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }

    /// Number of writes received through the [`Writer`] interface.
    #[must_use]
    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.find_calls.store(0, Ordering::SeqCst);
        self.persist_calls.store(0, Ordering::SeqCst);
        self.store_calls.store(0, Ordering::SeqCst);
    }

    /// Stored document, without counting a round trip.
    pub fn peek(&self, target: TypeRef, id: &DocValue) -> Result<Option<Document>, StoreError> {
        let key = (target.path, id_key(target, id)?);

        Ok(self.lock()?.get(&key).cloned())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<(&'static str, String), Document>>, StoreError> {
        self.documents
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }

    fn write(&self, target: TypeRef, mut document: Document) -> Result<DocValue, StoreError> {
        let id = match document.get(ID_KEY) {
            Some(id) if !id.is_null() => id.clone(),
            _ => {
                let id = DocValue::Int64(self.next_id.fetch_add(1, Ordering::SeqCst));
                document.insert(ID_KEY, id.clone());
                id
            }
        };

        let key = (target.path, id_key(target, &id)?);
        self.lock()?.insert(key, document);

        Ok(id)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn find_by_id(&self, target: TypeRef, id: &DocValue) -> Result<Option<Document>, StoreError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);

        self.peek(target, id)
    }

    fn persist(&self, target: TypeRef, document: Document) -> Result<DocValue, StoreError> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);

        self.write(target, document)
    }
}

impl Writer for MemoryStore {
    fn store(&self, target: TypeRef, document: Document) -> Result<DocValue, StoreError> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);

        self.write(target, document)
    }
}

// Int32 and Int64 ids with the same value address the same document.
fn id_key(target: TypeRef, id: &DocValue) -> Result<String, StoreError> {
    match id {
        DocValue::Int32(v) => Ok(format!("n:{v}")),
        DocValue::Int64(v) => Ok(format!("n:{v}")),
        DocValue::String(s) => Ok(format!("s:{s}")),
        DocValue::ObjectId(u) => Ok(format!("o:{u}")),
        DocValue::Null | DocValue::Array(_) | DocValue::Document(_) => Err(StoreError::InvalidId {
            path: target.path,
            reason: format!("{id:?} is not a scalar id"),
        }),
        other => Ok(format!("x:{other:?}")),
    }
}

///
/// TESTS
///
