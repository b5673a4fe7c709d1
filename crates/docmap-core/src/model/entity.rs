use crate::{model::field::FieldDecl, serialize::SerializeError, traits::MappedObject};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

///
/// TypeRef
///
/// Stable handle to a mapped type. Carries the type path plus the generated
/// functions that declare, allocate and opaquely decode it. Equality and
/// hashing use the path only.
///

#[derive(Clone, Copy)]
pub struct TypeRef {
    pub path: &'static str,
    pub declare: fn() -> TypeDecl,
    pub allocate: fn() -> Box<dyn MappedObject>,
    pub decode_opaque: fn(&[u8]) -> Option<Result<Box<dyn MappedObject>, SerializeError>>,
}

impl TypeRef {
    #[must_use]
    pub fn decl(&self) -> TypeDecl {
        (self.declare)()
    }

    /// Allocate a field-wise default instance without running constructor logic.
    #[must_use]
    pub fn allocate(&self) -> Box<dyn MappedObject> {
        (self.allocate)()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.path)
    }
}

///
/// TypeDecl
/// Generated declaration of one mapped type or marker interface.
///

#[derive(Clone, Debug)]
pub struct TypeDecl {
    /// Fully-qualified Rust type path, also written as the type tag.
    pub path: &'static str,
    /// Simple type name.
    pub name: &'static str,
    pub markers: Vec<TypeMarker>,
    /// Declaration of the flattened parent type, if any.
    pub parent: Option<Box<TypeDecl>>,
    /// Marker interfaces, in declaration order.
    pub interfaces: Vec<TypeDecl>,
    /// Own fields only; parent fields live on `parent`.
    pub fields: Vec<FieldDecl>,
    pub hooks: Vec<HookDecl>,
    /// Type supports the opaque binary envelope.
    pub opaque: bool,
}

impl TypeDecl {
    #[must_use]
    pub const fn new(path: &'static str, name: &'static str) -> Self {
        Self {
            path,
            name,
            markers: Vec::new(),
            parent: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            hooks: Vec::new(),
            opaque: false,
        }
    }

    /// First marker of `kind` declared directly on this type.
    #[must_use]
    pub fn marker(&self, kind: TypeMarkerKind) -> Option<TypeMarker> {
        self.markers.iter().copied().find(|m| m.kind() == kind)
    }

    #[must_use]
    pub fn has_marker(&self, kind: TypeMarkerKind) -> bool {
        self.marker(kind).is_some()
    }

    /// This declaration followed by its parents, closest first.
    pub fn chain(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |decl| decl.parent.as_deref())
    }
}

///
/// TypeMarker
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeMarker {
    Entity(EntityMarker),
    Embedded(EmbeddedMarker),
    Lifecycle,
    CreationTime { verify_new: bool },
    LastChange,
    LastAccess,
}

impl TypeMarker {
    #[must_use]
    pub const fn kind(&self) -> TypeMarkerKind {
        match self {
            Self::Entity(_) => TypeMarkerKind::Entity,
            Self::Embedded(_) => TypeMarkerKind::Embedded,
            Self::Lifecycle => TypeMarkerKind::Lifecycle,
            Self::CreationTime { .. } => TypeMarkerKind::CreationTime,
            Self::LastChange => TypeMarkerKind::LastChange,
            Self::LastAccess => TypeMarkerKind::LastAccess,
        }
    }
}

///
/// TypeMarkerKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TypeMarkerKind {
    Entity,
    Embedded,
    Lifecycle,
    CreationTime,
    LastChange,
    LastAccess,
}

///
/// EntityMarker
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EntityMarker {
    pub collection: Option<&'static str>,
    pub polymorphic: bool,
    /// `None` follows the configured default.
    pub case: Option<CaseTranslation>,
    pub name_strategy: NameStrategy,
}

///
/// EmbeddedMarker
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EmbeddedMarker {
    pub polymorphic: bool,
    pub case: Option<CaseTranslation>,
}

///
/// CaseTranslation
///
/// Wire-name policy for fields and collection names.
/// `Snake` renders snake_case, `Camel` renders lowerCamelCase.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CaseTranslation {
    None,
    Snake,
    Camel,
}

///
/// NameStrategy
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NameStrategy {
    #[default]
    Simple,
    FullyQualified,
    /// Named provider registered with the name resolver.
    Provider(&'static str),
}

///
/// LifecycleEvent
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LifecycleEvent {
    PreStore,
    PostStore,
    PostLoad,
    PreRemove,
    PostRemove,
    PreUpdate,
    PostUpdate,
}

impl LifecycleEvent {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PreStore => "pre_store",
            Self::PostStore => "post_store",
            Self::PostLoad => "post_load",
            Self::PreRemove => "pre_remove",
            Self::PostRemove => "post_remove",
            Self::PreUpdate => "pre_update",
            Self::PostUpdate => "post_update",
        }
    }
}

///
/// HookDecl
/// Lifecycle method bound to one event.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HookDecl {
    pub event: LifecycleEvent,
    pub method: &'static str,
}
