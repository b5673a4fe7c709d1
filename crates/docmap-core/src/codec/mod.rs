//! Object to document mapping.
//!
//! [`Codec`] is the entry point: `marshall` turns a mapped object into a
//! [`Document`], `unmarshall` rebuilds the object. It consults the
//! metadata resolver for layout, the name resolver for collection names and
//! the reference resolver for relationship fields.
mod marshall;
mod unmarshall;

#[cfg(test)]
mod tests;

use crate::{
    config::MapperConfig,
    document::{DocValue, Document, ID_KEY},
    error::{ErrorOrigin, MapperError},
    metadata::{EntityMetadata, MetadataResolver},
    model::{TypeMarkerKind, TypeRef},
    naming::{NameProvider, NameResolver},
    reference::{ReferenceLoader, ReferenceResolver},
    registry::TypeRegistry,
    store::{DocumentStore, Writer},
    traits::{Mapped, MappedEnum, MappedObject},
    types::PartialUpdate,
    value::{ObjectValue, Value},
};
use std::{collections::BTreeSet, sync::Arc};
use tracing::debug;

///
/// Codec
///
/// Cheap to clone; clones share every cache.
///

#[derive(Clone)]
pub struct Codec {
    config: Arc<MapperConfig>,
    metadata: Arc<MetadataResolver>,
    names: Arc<NameResolver>,
    references: Arc<ReferenceResolver>,
    registry: Arc<TypeRegistry>,
    store: Option<Arc<dyn DocumentStore>>,
}

impl Codec {
    /// Codec without collaborators; references can be written only when
    /// their targets already carry an identifier.
    #[must_use]
    pub fn new(config: MapperConfig) -> Self {
        Self::builder().config(config).build()
    }

    #[must_use]
    pub fn builder() -> CodecBuilder {
        CodecBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    #[must_use]
    pub fn metadata(&self) -> &MetadataResolver {
        &self.metadata
    }

    #[must_use]
    pub fn names(&self) -> &NameResolver {
        &self.names
    }

    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Make `T` (and everything reachable from it) known for type-tag lookup.
    pub fn register<T: Mapped>(&self) {
        self.registry.register::<T>();
    }

    pub fn register_enum<E: MappedEnum>(&self) {
        self.registry.register_enum::<E>();
    }

    /// Document for `object`. Takes `&mut` because reference targets stored
    /// on the way receive their new identifiers.
    pub fn marshall(&self, object: &mut dyn MappedObject) -> Result<Document, MapperError> {
        self.registry.register_type(object.type_ref());
        let mut ctx = marshall::MarshallContext::default();

        self.marshall_object(&mut ctx, object, marshall::Placement::TopLevel)
    }

    /// Document holding only the identifier, the type tag and the fields
    /// changed through `update`.
    pub fn marshall_partial<T: Mapped>(&self, update: &mut PartialUpdate<T>) -> Result<Document, MapperError> {
        let type_ref = T::mapped_type();
        let meta = self.metadata.resolve_entity_metadata(type_ref)?;

        let mut keep = BTreeSet::new();
        let mut keep_extra = false;
        for name in update.changed_fields() {
            let field = self.metadata.resolve_field(type_ref, name)?.ok_or_else(|| {
                MapperError::invariant(
                    ErrorOrigin::Codec,
                    format!("'{}' has no field '{name}'", type_ref.path),
                )
            })?;
            if field.flags.dynamic {
                keep_extra = true;
            } else {
                keep.insert(field.physical);
            }
        }

        let mut doc = self.marshall(update.inner_mut())?;
        doc.retain(|key| {
            key == ID_KEY
                || Document::is_type_tag_key(key)
                || keep.contains(key)
                || (keep_extra && !meta.fields.iter().any(|f| f.physical == key))
        });

        Ok(doc)
    }

    /// Rebuild a `T` from `doc`. A type tag naming a different type fails.
    pub fn unmarshall<T: Mapped>(&self, doc: &Document) -> Result<T, MapperError> {
        self.registry.register::<T>();
        let object = self.unmarshall_dyn(T::mapped_type(), doc)?;

        ObjectValue(object).downcast::<T>().map_err(|actual| {
            MapperError::deserialization(format!(
                "document holds a '{}', not a '{}'",
                actual.path,
                T::PATH
            ))
        })
    }

    /// Rebuild an object of `type_ref`, or of the type named by the
    /// document's type tag.
    pub fn unmarshall_dyn(&self, type_ref: TypeRef, doc: &Document) -> Result<Box<dyn MappedObject>, MapperError> {
        self.registry.register_type(type_ref);
        let loader: Arc<dyn ReferenceLoader> = Arc::new(CodecLoader {
            codec: self.clone(),
        });

        let mut object = self.decode_object(type_ref, doc, &loader)?;
        self.metadata.touch_last_access(&mut *object)?;

        Ok(object)
    }

    /// Parse `json` as a document and rebuild a `T` from it.
    pub fn unmarshall_json<T: Mapped>(&self, json: &str) -> Result<T, MapperError> {
        let doc = Document::from_json(json)?;

        self.unmarshall(&doc)
    }

    pub fn collection_name_of(&self, object: &dyn MappedObject) -> Result<String, MapperError> {
        self.names.collection_name_of(object)
    }

    // Unmarked types surface as not-mappable on write and as
    // deserialization failures on read.
    fn metadata_for(&self, type_ref: TypeRef, reading: bool) -> Result<Arc<EntityMetadata>, MapperError> {
        self.metadata.resolve_entity_metadata(type_ref).map_err(|err| {
            let unmarked = err.is_configuration()
                && self
                    .metadata
                    .resolve_annotation(type_ref, TypeMarkerKind::Entity)
                    .is_none()
                && self
                    .metadata
                    .resolve_annotation(type_ref, TypeMarkerKind::Embedded)
                    .is_none();

            match (unmarked, reading) {
                (true, false) => MapperError::not_mappable(type_ref.path),
                (true, true) => MapperError::deserialization(format!(
                    "type '{}' is not mapped and cannot be instantiated",
                    type_ref.path
                )),
                (false, _) => err,
            }
        })
    }
}

///
/// CodecBuilder
///

#[derive(Default)]
pub struct CodecBuilder {
    config: MapperConfig,
    store: Option<Arc<dyn DocumentStore>>,
    writer: Option<Arc<dyn Writer>>,
    name_provider: Option<Arc<dyn NameProvider>>,
}

impl CodecBuilder {
    #[must_use]
    pub fn config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// Store used for loading references, verify-new and, without a
    /// writer, auto-store.
    #[must_use]
    pub fn store<S: DocumentStore + 'static>(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn writer<W: Writer + 'static>(mut self, writer: Arc<W>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Default collection name provider.
    #[must_use]
    pub fn name_provider(mut self, provider: Arc<dyn NameProvider>) -> Self {
        self.name_provider = Some(provider);
        self
    }

    #[must_use]
    pub fn build(self) -> Codec {
        let config = Arc::new(self.config);

        let mut metadata = MetadataResolver::new(Arc::clone(&config));
        if let Some(store) = &self.store {
            metadata = metadata.with_store(Arc::clone(store));
        }
        let metadata = Arc::new(metadata);

        let names = Arc::new(match self.name_provider {
            Some(provider) => NameResolver::with_default(Arc::clone(&metadata), provider),
            None => NameResolver::new(Arc::clone(&metadata)),
        });
        let references = Arc::new(ReferenceResolver::new(
            Arc::clone(&metadata),
            Arc::clone(&names),
            self.store.clone(),
            self.writer,
        ));

        Codec {
            config,
            metadata,
            names,
            references,
            registry: Arc::new(TypeRegistry::new()),
            store: self.store,
        }
    }
}

///
/// CodecLoader
/// Loads reference targets from the store and decodes them with the codec.
///

struct CodecLoader {
    codec: Codec,
}

impl ReferenceLoader for CodecLoader {
    fn load(&self, target: TypeRef, id: &Value) -> Result<Option<Box<dyn MappedObject>>, MapperError> {
        let store = self.codec.store.as_ref().ok_or_else(|| {
            MapperError::configuration(
                ErrorOrigin::Reference,
                format!("loading a '{}' reference needs a document store", target.path),
            )
        })?;
        let key = DocValue::from_scalar(id).ok_or_else(|| {
            MapperError::invariant(
                ErrorOrigin::Reference,
                format!("identifier of '{}' is not a scalar", target.path),
            )
        })?;

        debug!(path = target.path, ?id, "loading reference target");
        match store.find_by_id(target, &key)? {
            Some(doc) => self.codec.unmarshall_dyn(target, &doc).map(Some),
            None => Ok(None),
        }
    }
}
