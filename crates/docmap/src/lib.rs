//! ## Crate layout
//! - `core`: runtime model, values, documents, resolvers and the codec.
//! - `macros`: `Mapped`, `MappedEnum` and `MappedInterface` derives.
//!
//! Generated code names `::docmap::{model, traits, value, error, serialize}`,
//! so those modules are re-exported here at the top level.
//!
//! The `prelude` module is what mapped types and call sites usually need.

pub use docmap_core as core;
pub use docmap_derive as macros;

pub use docmap_core::{
    codec, config, doc, document, error, metadata, model, naming, reference, registry, serialize,
    store, traits, types, value,
};

/// re-exports
///
/// opaque types derive `Serialize`/`Deserialize` through this path so the
/// caller does not need its own serde dependency
pub mod __reexports {
    pub use serde;
}

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Macros
//

pub use docmap_derive::{Mapped, MappedEnum, MappedInterface};

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::{
        core::{
            error::MapperError,
            store::{DocumentStore, MemoryStore},
            traits::{FieldValue as _, Reflect as _},
        },
        macros::{Mapped, MappedEnum, MappedInterface},
    };
    pub use serde::{Deserialize, Serialize};
}
