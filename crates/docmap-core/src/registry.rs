use crate::{
    metadata::SnapshotCache,
    model::{EnumRef, FieldKind, TypeRef},
    traits::{Mapped, MappedEnum},
};
use tracing::debug;

///
/// TypeRegistry
///
/// Type tag to type lookup used for polymorphic read-back. Registering a
/// type also registers every type and enum reachable through its declared
/// fields and parents.
///

#[derive(Default)]
pub struct TypeRegistry {
    types: SnapshotCache<&'static str, TypeRef>,
    enums: SnapshotCache<&'static str, EnumRef>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Mapped>(&self) {
        self.register_type(T::mapped_type());
    }

    pub fn register_enum<E: MappedEnum>(&self) {
        self.enums.insert(E::PATH, E::enum_ref());
    }

    pub fn register_type(&self, type_ref: TypeRef) {
        if self.types.get(type_ref.path).is_some() {
            return;
        }
        // published before the walk so self-referencing types terminate
        self.types.insert(type_ref.path, type_ref);
        debug!(path = type_ref.path, "registered mapped type");

        let decl = type_ref.decl();
        for level in decl.chain() {
            for field in &level.fields {
                self.register_kind(&field.kind);
            }
        }
    }

    fn register_kind(&self, kind: &FieldKind) {
        match kind {
            FieldKind::Object(target) | FieldKind::Ref(target) => self.register_type(*target),
            FieldKind::Enum(decl) => self.enums.insert(decl.path, *decl),
            FieldKind::List(inner) | FieldKind::Map(inner) => self.register_kind(inner),
            _ => {}
        }
    }

    /// Type registered under the type tag `tag`.
    #[must_use]
    pub fn resolve(&self, tag: &str) -> Option<TypeRef> {
        self.types.get(tag)
    }

    #[must_use]
    pub fn resolve_enum(&self, path: &str) -> Option<EnumRef> {
        self.enums.get(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

///
/// TESTS
///
