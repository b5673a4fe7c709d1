//! Declarative type model.
//!
//! Generated code describes each mapped type with a [`TypeDecl`]: its
//! markers, its parent declaration, the marker-only interfaces it
//! implements, its fields and its lifecycle hooks. The metadata resolver
//! turns these declarations into cached runtime metadata.
//!
//! In general:
//! - derives define *what is declared*
//! - `metadata` defines *what is resolved*
pub mod entity;
pub mod field;

pub use entity::{
    CaseTranslation, EmbeddedMarker, EntityMarker, HookDecl, LifecycleEvent, NameStrategy,
    TypeDecl, TypeMarker, TypeMarkerKind, TypeRef,
};
pub use field::{EnumRef, FieldDecl, FieldKind, FieldMarker, FieldMarkerKind, ReferenceMarker};
