use crate::{
    config::{MapperConfig, is_valid_timestamp_format},
    document::ID_KEY,
    error::{ErrorOrigin, MapperError},
    model::{
        CaseTranslation, EmbeddedMarker, EntityMarker, FieldDecl, FieldKind, FieldMarker,
        FieldMarkerKind, LifecycleEvent, TypeDecl, TypeMarker, TypeMarkerKind, TypeRef,
    },
    naming::case::{camel_to_snake, snake_to_camel},
};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::warn;

///
/// EntityMetadata
///
/// Resolved, cached view of one mapped type.
///

#[derive(Clone, Debug)]
pub struct EntityMetadata {
    pub type_ref: TypeRef,
    pub path: &'static str,
    pub name: &'static str,
    pub shape: EntityShape,
    pub polymorphic: bool,
    pub case: CaseTranslation,

    /// Most-derived fields first; a parent field shadowed by a same-named
    /// child field is absent.
    pub fields: Vec<FieldDescriptor>,
    pub id_field: Option<usize>,
    pub dynamic_field: Option<usize>,

    /// At most one method per event.
    pub hooks: Vec<(LifecycleEvent, &'static str)>,
    pub lifecycle: bool,

    /// `Some(verify_new)` when the type carries a creation-time marker.
    pub creation_time: Option<bool>,
    pub last_change: bool,
    pub last_access: bool,
}

impl EntityMetadata {
    #[must_use]
    pub const fn is_entity(&self) -> bool {
        matches!(self.shape, EntityShape::Entity(_))
    }

    #[must_use]
    pub const fn is_opaque(&self) -> bool {
        matches!(self.shape, EntityShape::Opaque)
    }

    #[must_use]
    pub fn id(&self) -> Option<&FieldDescriptor> {
        self.id_field.map(|i| &self.fields[i])
    }

    #[must_use]
    pub fn dynamic(&self) -> Option<&FieldDescriptor> {
        self.dynamic_field.map(|i| &self.fields[i])
    }

    #[must_use]
    pub fn field(&self, member: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.member == member)
    }

    #[must_use]
    pub fn hook(&self, event: LifecycleEvent) -> Option<&'static str> {
        self.hooks
            .iter()
            .find(|(e, _)| *e == event)
            .map(|(_, method)| *method)
    }

    /// Fields carrying an auto-value marker of `kind`.
    pub fn auto_fields(&self, kind: AutoValueKind) -> impl Iterator<Item = (&FieldDescriptor, AutoValue)> {
        self.fields.iter().filter_map(move |f| {
            f.auto
                .iter()
                .copied()
                .find(|a| a.kind == kind)
                .map(|a| (f, a))
        })
    }
}

///
/// EntityShape
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntityShape {
    Entity(EntityMarker),
    Embedded(EmbeddedMarker),
    /// No entity or embedded marker; written as a binary envelope.
    Opaque,
}

///
/// FieldDescriptor
///

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    /// Rust member name.
    pub member: &'static str,
    /// Wire name.
    pub physical: String,
    pub role: FieldRole,
    pub kind: FieldKind,
    pub flags: FieldFlags,
    pub reference: Option<ReferenceOptions>,
    pub aliases: &'static [&'static str],
    pub physical_override: Option<&'static str>,
    pub auto: Vec<AutoValue>,
    pub markers: Vec<FieldMarkerKind>,
    /// Path of the type that declares the field.
    pub declared_on: &'static str,
}

impl FieldDescriptor {
    #[must_use]
    pub fn has_marker(&self, kind: FieldMarkerKind) -> bool {
        self.markers.contains(&kind)
    }
}

///
/// FieldRole
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldRole {
    Scalar,
    Embedded,
    Reference,
    Collection,
    Map,
    Identifier,
}

///
/// FieldFlags
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct FieldFlags {
    pub write_only: bool,
    pub read_only: bool,
    pub transient: bool,
    pub use_if_null: bool,
    pub dynamic: bool,
    pub dynamic_read_only: bool,
}

///
/// ReferenceOptions
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReferenceOptions {
    pub target: TypeRef,
    pub many: bool,
    pub lazy: bool,
    pub auto_store: bool,
}

///
/// AutoValue
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AutoValue {
    pub kind: AutoValueKind,
    /// strftime format for text fields.
    pub format: Option<&'static str>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AutoValueKind {
    CreationTime,
    LastChange,
    LastAccess,
}

/// Closest marker of `kind`: the type itself, then its parents, then a
/// breadth-first walk over every implemented interface.
pub(crate) fn find_marker(decl: &TypeDecl, kind: TypeMarkerKind) -> Option<TypeMarker> {
    if let Some(marker) = decl.chain().find_map(|d| d.marker(kind)) {
        return Some(marker);
    }

    let mut seen = HashSet::new();
    let mut queue: VecDeque<&TypeDecl> = decl.chain().flat_map(|d| d.interfaces.iter()).collect();

    while let Some(iface) = queue.pop_front() {
        if !seen.insert(iface.path) {
            continue;
        }
        if let Some(marker) = iface.marker(kind) {
            return Some(marker);
        }
        queue.extend(iface.interfaces.iter());
    }

    None
}

/// Translate a member name with `case`.
pub(crate) fn translate(member: &str, case: CaseTranslation) -> String {
    match case {
        CaseTranslation::None => member.to_string(),
        CaseTranslation::Snake => camel_to_snake(member),
        CaseTranslation::Camel => snake_to_camel(&camel_to_snake(member), false),
    }
}

pub(crate) fn build(type_ref: TypeRef, config: &MapperConfig) -> Result<EntityMetadata, MapperError> {
    let decl = type_ref.decl();
    let path = decl.path;
    let config_err = |message: String| MapperError::configuration(ErrorOrigin::Metadata, message);

    let entity = find_marker(&decl, TypeMarkerKind::Entity);
    let embedded = find_marker(&decl, TypeMarkerKind::Embedded);
    let shape = match (entity, embedded) {
        (Some(TypeMarker::Entity(marker)), other) => {
            if other.is_some() {
                warn!(path, "type carries both entity and embedded markers; entity wins");
            }
            EntityShape::Entity(marker)
        }
        (None, Some(TypeMarker::Embedded(marker))) => EntityShape::Embedded(marker),
        _ if decl.opaque && config.object_serialization => EntityShape::Opaque,
        _ => {
            return Err(config_err(format!(
                "type '{path}' carries neither an entity nor an embedded marker"
            )));
        }
    };

    let default_case = if config.translate_case {
        CaseTranslation::Snake
    } else {
        CaseTranslation::None
    };
    let (polymorphic, case) = match shape {
        EntityShape::Entity(m) => (m.polymorphic, m.case.unwrap_or(default_case)),
        EntityShape::Embedded(m) => (m.polymorphic, m.case.unwrap_or(default_case)),
        EntityShape::Opaque => (false, default_case),
    };

    let mut fields = Vec::new();
    if shape != EntityShape::Opaque {
        let mut seen = HashSet::new();
        for level in decl.chain() {
            for field in &level.fields {
                if seen.insert(field.name) {
                    fields.push(describe(level.path, field, case)?);
                }
            }
        }
    }

    let ids: Vec<usize> = position_all(&fields, |f| f.role == FieldRole::Identifier);
    if ids.len() > 1 {
        return Err(config_err(format!("type '{path}' declares more than one identifier field")));
    }
    let id_field = ids.first().copied();
    if matches!(shape, EntityShape::Entity(_)) && id_field.is_none() {
        return Err(config_err(format!("entity '{path}' declares no identifier field")));
    }

    let dynamics = position_all(&fields, |f| f.flags.dynamic);
    if dynamics.len() > 1 {
        return Err(config_err(format!(
            "type '{path}' declares more than one dynamic-data field"
        )));
    }

    let creation_time = match find_marker(&decl, TypeMarkerKind::CreationTime) {
        Some(TypeMarker::CreationTime { verify_new }) => Some(verify_new),
        _ => None,
    };

    Ok(EntityMetadata {
        type_ref,
        path,
        name: decl.name,
        shape,
        polymorphic,
        case,
        hooks: collect_hooks(&decl)?,
        lifecycle: find_marker(&decl, TypeMarkerKind::Lifecycle).is_some(),
        creation_time,
        last_change: find_marker(&decl, TypeMarkerKind::LastChange).is_some(),
        last_access: find_marker(&decl, TypeMarkerKind::LastAccess).is_some(),
        id_field,
        dynamic_field: dynamics.first().copied(),
        fields,
    })
}

fn position_all(fields: &[FieldDescriptor], pred: impl Fn(&FieldDescriptor) -> bool) -> Vec<usize> {
    fields
        .iter()
        .enumerate()
        .filter(|(_, f)| pred(f))
        .map(|(i, _)| i)
        .collect()
}

fn describe(
    declared_on: &'static str,
    field: &FieldDecl,
    case: CaseTranslation,
) -> Result<FieldDescriptor, MapperError> {
    let config_err = |message: String| MapperError::configuration(ErrorOrigin::Metadata, message);
    let member = field.name;

    let mut flags = FieldFlags::default();
    let mut reference_marker = None;
    let mut physical_override = None;
    let mut aliases: &'static [&'static str] = &[];
    let mut auto = Vec::new();
    let mut identifier = false;

    for marker in &field.markers {
        match *marker {
            FieldMarker::Identifier => identifier = true,
            FieldMarker::PhysicalName(name) => physical_override = Some(name),
            FieldMarker::Reference(r) => reference_marker = Some(r),
            FieldMarker::Transient => flags.transient = true,
            FieldMarker::WriteOnly => flags.write_only = true,
            FieldMarker::ReadOnly => flags.read_only = true,
            FieldMarker::Aliases(names) => aliases = names,
            FieldMarker::DynamicData { read_only } => {
                flags.dynamic = true;
                flags.dynamic_read_only = read_only;
            }
            FieldMarker::CreationTime { format } => auto.push(AutoValue {
                kind: AutoValueKind::CreationTime,
                format,
            }),
            FieldMarker::LastChange { format } => auto.push(AutoValue {
                kind: AutoValueKind::LastChange,
                format,
            }),
            FieldMarker::LastAccess { format } => auto.push(AutoValue {
                kind: AutoValueKind::LastAccess,
                format,
            }),
            FieldMarker::UseIfNull => flags.use_if_null = true,
        }
    }

    if let Some(format) = auto
        .iter()
        .filter_map(|a| a.format)
        .find(|f| !is_valid_timestamp_format(f))
    {
        return Err(config_err(format!(
            "field '{member}' has invalid timestamp format '{format}'"
        )));
    }

    let target = field.kind.reference_target();
    let reference = match (reference_marker, target) {
        (Some(r), Some((target, many))) => {
            if r.physical_name.is_some() {
                physical_override = r.physical_name;
            }
            Some(ReferenceOptions {
                target,
                many,
                lazy: r.lazy,
                auto_store: r.auto_store,
            })
        }
        (Some(_), None) => {
            return Err(config_err(format!(
                "field '{member}' on '{declared_on}' has a reference marker but is not a reference type"
            )));
        }
        (None, Some((target, many))) => Some(ReferenceOptions {
            target,
            many,
            lazy: false,
            auto_store: false,
        }),
        (None, None) => None,
    };

    if flags.dynamic && !matches!(field.kind, FieldKind::Map(_)) {
        return Err(config_err(format!(
            "dynamic-data field '{member}' on '{declared_on}' must be a string-keyed map"
        )));
    }
    for a in &auto {
        if !matches!(
            field.kind,
            FieldKind::Int64 | FieldKind::Float64 | FieldKind::Text | FieldKind::Timestamp | FieldKind::Calendar
        ) {
            return Err(config_err(format!(
                "{:?} field '{member}' on '{declared_on}' cannot hold a point in time",
                a.kind
            )));
        }
    }

    let role = if identifier {
        FieldRole::Identifier
    } else if reference.is_some() {
        FieldRole::Reference
    } else {
        match field.kind {
            FieldKind::Object(_) | FieldKind::Dynamic => FieldRole::Embedded,
            FieldKind::List(_) => FieldRole::Collection,
            FieldKind::Map(_) => FieldRole::Map,
            _ => FieldRole::Scalar,
        }
    };

    let physical = if identifier {
        ID_KEY.to_string()
    } else if let Some(name) = physical_override {
        name.to_string()
    } else {
        translate(member, case)
    };

    let mut markers: Vec<FieldMarkerKind> = field.markers.iter().map(FieldMarker::kind).collect();
    markers.sort();
    markers.dedup();

    Ok(FieldDescriptor {
        member,
        physical,
        role,
        kind: field.kind.clone(),
        flags,
        reference,
        aliases,
        physical_override,
        auto,
        markers,
        declared_on,
    })
}

fn collect_hooks(decl: &TypeDecl) -> Result<Vec<(LifecycleEvent, &'static str)>, MapperError> {
    let mut by_event: HashMap<LifecycleEvent, (&'static str, &'static str)> = HashMap::new();
    let mut ordered = Vec::new();

    for level in decl.chain() {
        for hook in &level.hooks {
            match by_event.get(&hook.event) {
                // same method redeclared further up the chain
                Some((method, _)) if *method == hook.method => {}
                Some((method, owner)) => {
                    return Err(MapperError::configuration(
                        ErrorOrigin::Metadata,
                        format!(
                            "type '{}' has more than one {} hook: '{owner}::{method}' and '{}::{}'",
                            decl.path,
                            hook.event.label(),
                            level.path,
                            hook.method
                        ),
                    ));
                }
                None => {
                    by_event.insert(hook.event, (hook.method, level.path));
                    ordered.push((hook.event, hook.method));
                }
            }
        }
    }

    Ok(ordered)
}
