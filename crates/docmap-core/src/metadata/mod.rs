//! Per-type and per-field metadata resolution.
//!
//! [`MetadataResolver`] turns generated [`TypeDecl`](crate::model::TypeDecl)s
//! into cached [`EntityMetadata`], resolves wire names to fields, performs
//! coerced field access, computes bookkeeping timestamps and dispatches
//! lifecycle hooks. Every cache is a [`SnapshotCache`].
mod auto;
mod cache;
mod entity;


pub use cache::SnapshotCache;
pub use entity::{
    AutoValue, AutoValueKind, EntityMetadata, EntityShape, FieldDescriptor, FieldFlags, FieldRole,
    ReferenceOptions,
};

pub(crate) use entity::translate;

use crate::{
    config::MapperConfig,
    document::ID_KEY,
    error::{ErrorOrigin, MapperError},
    model::{FieldMarkerKind, LifecycleEvent, TypeMarker, TypeMarkerKind, TypeRef},
    naming::case::camel_to_snake,
    store::DocumentStore,
    traits::MappedObject,
    value::{CoercionMode, Value, coerce},
};
use std::sync::Arc;
use tracing::debug;

///
/// MetadataResolver
///
/// Resolves and caches metadata for mapped types. Cached entries live for
/// the resolver's lifetime; types are assumed not to change during a run.
///

pub struct MetadataResolver {
    config: Arc<MapperConfig>,
    store: Option<Arc<dyn DocumentStore>>,
    entities: SnapshotCache<&'static str, Arc<EntityMetadata>>,
    fields: SnapshotCache<(&'static str, String), Option<usize>>,
    annotations: SnapshotCache<(&'static str, TypeMarkerKind), Option<TypeMarker>>,
    field_lists: SnapshotCache<(&'static str, Vec<FieldMarkerKind>), Arc<Vec<String>>>,
}

impl MetadataResolver {
    #[must_use]
    pub fn new(config: Arc<MapperConfig>) -> Self {
        Self {
            config,
            store: None,
            entities: SnapshotCache::new(),
            fields: SnapshotCache::new(),
            annotations: SnapshotCache::new(),
            field_lists: SnapshotCache::new(),
        }
    }

    /// Store consulted by the verify-new check.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Metadata for `type_ref`, built on first use.
    pub fn resolve_entity_metadata(&self, type_ref: TypeRef) -> Result<Arc<EntityMetadata>, MapperError> {
        self.entities.get_or_try_insert_with(type_ref.path, || {
            debug!(path = type_ref.path, "building entity metadata");
            entity::build(type_ref, &self.config).map(Arc::new)
        })
    }

    /// Field addressed by `name`.
    ///
    /// Precedence: physical-name override, alias, member name, the `_id`
    /// sentinel, then the case-translated wire name. Fields are scanned
    /// most-derived first.
    pub fn resolve_field(&self, type_ref: TypeRef, name: &str) -> Result<Option<FieldDescriptor>, MapperError> {
        let meta = self.resolve_entity_metadata(type_ref)?;
        let index = self
            .fields
            .get_or_try_insert_with((type_ref.path, name.to_string()), || {
                Ok::<_, MapperError>(field_index(&meta, name))
            })?;

        Ok(index.map(|i| meta.fields[i].clone()))
    }

    /// Wire names of the fields carrying any marker in `filter`, or of all
    /// fields when `filter` is empty. Transient and dynamic-data fields are
    /// never listed.
    pub fn resolve_fields(&self, type_ref: TypeRef, filter: &[FieldMarkerKind]) -> Result<Arc<Vec<String>>, MapperError> {
        let mut key_filter = filter.to_vec();
        key_filter.sort();
        key_filter.dedup();

        self.field_lists
            .get_or_try_insert_with((type_ref.path, key_filter), || {
                let meta = self.resolve_entity_metadata(type_ref)?;
                let names = meta
                    .fields
                    .iter()
                    .filter(|f| !f.flags.transient && !f.flags.dynamic)
                    .filter(|f| filter.is_empty() || filter.iter().any(|k| f.has_marker(*k)))
                    .map(|f| f.physical.clone())
                    .collect();

                Ok(Arc::new(names))
            })
    }

    /// Closest type marker of `kind`; class chain first, then interfaces.
    pub fn resolve_annotation(&self, type_ref: TypeRef, kind: TypeMarkerKind) -> Option<TypeMarker> {
        let found: Result<_, std::convert::Infallible> = self
            .annotations
            .get_or_try_insert_with((type_ref.path, kind), || {
                Ok(entity::find_marker(&type_ref.decl(), kind))
            });

        match found {
            Ok(marker) => marker,
            Err(never) => match never {},
        }
    }

    /// Raw read of the field addressed by `name`.
    pub fn get_value(&self, object: &dyn MappedObject, name: &str) -> Result<Value, MapperError> {
        let field = self.require_field(object.type_ref(), name)?;

        object.get_field(field.member).ok_or_else(|| {
            MapperError::invariant(
                ErrorOrigin::Metadata,
                format!("accessor for '{}' returned nothing", field.member),
            )
        })
    }

    /// Write the field addressed by `name`, coercing `value` to its
    /// declared kind. Identifiers coerce losslessly.
    pub fn set_value(&self, object: &mut dyn MappedObject, name: &str, value: Value) -> Result<(), MapperError> {
        let field = self.require_field(object.type_ref(), name)?;

        self.assign(object, &field, value)
    }

    /// Write an already resolved field, coercing `value` to its kind.
    pub fn assign(&self, object: &mut dyn MappedObject, field: &FieldDescriptor, value: Value) -> Result<(), MapperError> {
        let mode = if field.role == FieldRole::Identifier {
            CoercionMode::Lossless
        } else {
            CoercionMode::Lenient
        };
        let coerced = coerce(value, &field.kind, mode).map_err(|err| {
            let mut err = MapperError::from(err);
            err.message = format!("field '{}': {}", field.member, err.message);
            err
        })?;

        object.set_field(field.member, coerced)?;

        Ok(())
    }

    /// Identifier of `object`; `None` when unset.
    pub fn id_of(&self, object: &dyn MappedObject) -> Result<Option<Value>, MapperError> {
        let meta = self.resolve_entity_metadata(object.type_ref())?;
        let Some(id) = meta.id() else {
            return Ok(None);
        };

        Ok(object.get_field(id.member).filter(|v| !v.is_null()))
    }

    /// Run the hook registered for `event`, if the type is lifecycle-enabled.
    /// Returns whether a hook ran.
    pub fn dispatch_lifecycle_hook(&self, event: LifecycleEvent, object: &mut dyn MappedObject) -> Result<bool, MapperError> {
        let meta = self.resolve_entity_metadata(object.type_ref())?;
        if !meta.lifecycle {
            return Ok(false);
        }
        let Some(method) = meta.hook(event) else {
            return Ok(false);
        };

        if object.invoke_hook(method) {
            Ok(true)
        } else {
            Err(MapperError::invariant(
                ErrorOrigin::Metadata,
                format!("'{}' declares {} hook '{method}' but has no such method", meta.path, event.label()),
            ))
        }
    }

    fn require_field(&self, type_ref: TypeRef, name: &str) -> Result<FieldDescriptor, MapperError> {
        self.resolve_field(type_ref, name)?.ok_or_else(|| {
            MapperError::invariant(
                ErrorOrigin::Metadata,
                format!("'{}' has no field addressed as '{name}'", type_ref.path),
            )
        })
    }
}

fn field_index(meta: &EntityMetadata, name: &str) -> Option<usize> {
    let fields = &meta.fields;

    fields
        .iter()
        .position(|f| f.physical_override == Some(name))
        .or_else(|| fields.iter().position(|f| f.aliases.iter().any(|a| *a == name)))
        .or_else(|| fields.iter().position(|f| f.member == name))
        .or_else(|| if name == ID_KEY { meta.id_field } else { None })
        .or_else(|| {
            let snake = camel_to_snake(name);
            fields
                .iter()
                .position(|f| f.physical == name || f.member == snake)
        })
}
