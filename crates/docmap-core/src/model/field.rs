use crate::model::entity::TypeRef;

static ANY_KIND: FieldKind = FieldKind::Any;

///
/// FieldDecl
/// Generated declaration of one struct field.
///

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    /// Rust member name.
    pub name: &'static str,
    pub kind: FieldKind,
    pub markers: Vec<FieldMarker>,
}

impl FieldDecl {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            markers: Vec::new(),
        }
    }

    #[must_use]
    pub fn marker(&self, kind: FieldMarkerKind) -> Option<FieldMarker> {
        self.markers.iter().copied().find(|m| m.kind() == kind)
    }

    #[must_use]
    pub fn has_marker(&self, kind: FieldMarkerKind) -> bool {
        self.marker(kind).is_some()
    }
}

///
/// FieldKind
///
/// Declared shape of a field, derived from its Rust type.
/// Aligned with `Value` variants.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    // Scalar primitives
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
    Timestamp,
    Calendar,
    Blob,
    Ulid,
    Enum(EnumRef),

    /// Nested entity or embedded type, stored inline.
    Object(TypeRef),
    /// Any mapped object; always written with a type tag.
    Dynamic,
    /// Reference to an entity, stored as its identifier.
    Ref(TypeRef),

    // Collections
    List(Box<Self>),
    Map(Box<Self>),

    /// Untyped value.
    Any,
}

impl FieldKind {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::Text => "Text",
            Self::Timestamp => "Timestamp",
            Self::Calendar => "Calendar",
            Self::Blob => "Blob",
            Self::Ulid => "Ulid",
            Self::Enum(_) => "Enum",
            Self::Object(_) => "Object",
            Self::Dynamic => "Dynamic",
            Self::Ref(_) => "Ref",
            Self::List(_) => "List",
            Self::Map(_) => "Map",
            Self::Any => "Any",
        }
    }

    /// Reference target and whether the field holds many references.
    #[must_use]
    pub fn reference_target(&self) -> Option<(TypeRef, bool)> {
        match self {
            Self::Ref(target) => Some((*target, false)),
            Self::List(inner) => match inner.as_ref() {
                Self::Ref(target) => Some((*target, true)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Element kind for collections, `Any` otherwise.
    #[must_use]
    pub fn element(&self) -> &Self {
        match self {
            Self::List(inner) | Self::Map(inner) => inner,
            _ => &ANY_KIND,
        }
    }
}

///
/// EnumRef
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EnumRef {
    pub path: &'static str,
    pub variants: &'static [&'static str],
}

///
/// FieldMarker
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldMarker {
    Identifier,
    PhysicalName(&'static str),
    Reference(ReferenceMarker),
    Transient,
    WriteOnly,
    ReadOnly,
    Aliases(&'static [&'static str]),
    DynamicData { read_only: bool },
    CreationTime { format: Option<&'static str> },
    LastChange { format: Option<&'static str> },
    LastAccess { format: Option<&'static str> },
    UseIfNull,
}

impl FieldMarker {
    #[must_use]
    pub const fn kind(&self) -> FieldMarkerKind {
        match self {
            Self::Identifier => FieldMarkerKind::Identifier,
            Self::PhysicalName(_) => FieldMarkerKind::PhysicalName,
            Self::Reference(_) => FieldMarkerKind::Reference,
            Self::Transient => FieldMarkerKind::Transient,
            Self::WriteOnly => FieldMarkerKind::WriteOnly,
            Self::ReadOnly => FieldMarkerKind::ReadOnly,
            Self::Aliases(_) => FieldMarkerKind::Aliases,
            Self::DynamicData { .. } => FieldMarkerKind::DynamicData,
            Self::CreationTime { .. } => FieldMarkerKind::CreationTime,
            Self::LastChange { .. } => FieldMarkerKind::LastChange,
            Self::LastAccess { .. } => FieldMarkerKind::LastAccess,
            Self::UseIfNull => FieldMarkerKind::UseIfNull,
        }
    }
}

///
/// FieldMarkerKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum FieldMarkerKind {
    Identifier,
    PhysicalName,
    Reference,
    Transient,
    WriteOnly,
    ReadOnly,
    Aliases,
    DynamicData,
    CreationTime,
    LastChange,
    LastAccess,
    UseIfNull,
}

///
/// ReferenceMarker
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReferenceMarker {
    pub lazy: bool,
    pub auto_store: bool,
    pub physical_name: Option<&'static str>,
}
