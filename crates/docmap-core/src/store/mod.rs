//! Collaborator interfaces consumed by the mapper.
//!
//! The mapper never talks to a database itself. Reads for lazy references
//! and the verify-new check go through [`DocumentStore`]; implicit
//! persistence of unsaved reference targets goes through [`Writer`] when one
//! is configured, else through [`DocumentStore::persist`].
mod memory;

pub use memory::MemoryStore;

use crate::{
    document::{DocValue, Document},
    error::{ErrorClass, ErrorDetail, ErrorOrigin, MapperError},
    model::TypeRef,
};
use thiserror::Error as ThisError;

///
/// StoreError
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),

    #[error("document for '{path}' carries an unusable id: {reason}")]
    InvalidId { path: &'static str, reason: String },
}

impl From<StoreError> for MapperError {
    fn from(err: StoreError) -> Self {
        Self::new(ErrorClass::Store, ErrorOrigin::Store, err.to_string())
            .with_detail(ErrorDetail::Store(err))
    }
}

///
/// DocumentStore
///

pub trait DocumentStore: Send + Sync {
    /// Current persisted state of the object of type `target` with `id`.
    fn find_by_id(&self, target: TypeRef, id: &DocValue) -> Result<Option<Document>, StoreError>;

    /// Persist a document now and return its identifier.
    fn persist(&self, target: TypeRef, document: Document) -> Result<DocValue, StoreError>;
}

///
/// Writer
///
/// Write path used for reference targets that are stored implicitly.
/// Must hand back the identifier the document will be stored under.
///

pub trait Writer: Send + Sync {
    fn store(&self, target: TypeRef, document: Document) -> Result<DocValue, StoreError>;
}
