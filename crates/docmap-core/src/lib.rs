//! Core runtime for docmap: mapped-type traits, values, documents, the
//! metadata and naming resolvers, reference handling and the codec.

extern crate self as docmap;

// public exports are one module level down
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod metadata;
pub mod model;
pub mod naming;
pub mod reference;
pub mod registry;
pub mod serialize;
pub mod store;
pub mod traits;
pub mod types;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Vocabulary needed to declare and map types. Resolvers, stores and
/// errors are imported from their modules.
///

pub mod prelude {
    pub use crate::{
        codec::Codec,
        config::MapperConfig,
        document::{DocValue, Document},
        traits::{Mapped, MappedEnum, MappedInterface, MappedObject, Path},
        types::{Blob, PartialUpdate, Ref},
        value::Value,
    };
}
