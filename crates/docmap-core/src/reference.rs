//! Reference fields between storage and runtime form.
//!
//! A to-one reference is stored as the bare identifier of its target. A
//! to-many reference is stored as an array of `{ref_to_id,
//! referenced_collection}` documents. On read a reference is either loaded
//! right away or turned into a deferred placeholder that loads on first
//! access.

use crate::{
    document::{DocValue, Document, REF_COLLECTION_KEY, REF_ID_KEY},
    error::{ErrorOrigin, MapperError},
    metadata::{FieldDescriptor, MetadataResolver, ReferenceOptions},
    model::{FieldKind, LifecycleEvent, TypeRef},
    naming::NameResolver,
    store::{DocumentStore, Writer},
    traits::MappedObject,
    value::{CoercionMode, ObjectValue, RefValue, Value, coerce},
};
use std::sync::Arc;
use tracing::{debug, warn};

///
/// ReferenceLoader
///
/// Fetches and decodes the target of a reference. Deferred references keep
/// one to load themselves on first access.
///

pub trait ReferenceLoader: Send + Sync {
    fn load(&self, target: TypeRef, id: &Value) -> Result<Option<Box<dyn MappedObject>>, MapperError>;
}

///
/// ReferenceDescriptor
/// Identifier and collection of one stored reference; built per call.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceDescriptor {
    pub id: DocValue,
    pub collection: String,
    pub lazy: bool,
}

impl ReferenceDescriptor {
    /// Read a stored reference: a bare id, or a `ref_to_id` document.
    /// A bare id is assumed to live in `collection`.
    pub fn from_stored(stored: &DocValue, collection: &str, lazy: bool) -> Result<Self, MapperError> {
        match stored {
            DocValue::Document(doc) => {
                let id = doc.get(REF_ID_KEY).cloned().ok_or_else(|| {
                    MapperError::deserialization(format!(
                        "reference document lacks '{REF_ID_KEY}'"
                    ))
                })?;
                let collection = doc
                    .get(REF_COLLECTION_KEY)
                    .and_then(DocValue::as_str)
                    .unwrap_or(collection)
                    .to_string();

                Ok(Self { id, collection, lazy })
            }
            DocValue::Array(_) => Err(MapperError::deserialization(
                "an array cannot be a reference identifier",
            )),
            id => Ok(Self {
                id: id.clone(),
                collection: collection.to_string(),
                lazy,
            }),
        }
    }

    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(REF_ID_KEY, self.id.clone());
        doc.insert(REF_COLLECTION_KEY, self.collection.as_str());

        doc
    }
}

///
/// ReferenceResolver
///

pub struct ReferenceResolver {
    metadata: Arc<MetadataResolver>,
    names: Arc<NameResolver>,
    store: Option<Arc<dyn DocumentStore>>,
    writer: Option<Arc<dyn Writer>>,
}

impl ReferenceResolver {
    #[must_use]
    pub fn new(
        metadata: Arc<MetadataResolver>,
        names: Arc<NameResolver>,
        store: Option<Arc<dyn DocumentStore>>,
        writer: Option<Arc<dyn Writer>>,
    ) -> Self {
        Self {
            metadata,
            names,
            store,
            writer,
        }
    }

    /// Storage form of a reference field value.
    ///
    /// Targets without an identifier are stored through `marshal` and the
    /// writer when the field allows auto-store; the assigned identifier is
    /// written back into the target inside `value`. Returns whether that
    /// happened.
    pub fn to_storage_form(
        &self,
        field: &FieldDescriptor,
        value: &mut Value,
        marshal: &mut dyn FnMut(&mut dyn MappedObject) -> Result<Document, MapperError>,
    ) -> Result<(DocValue, bool), MapperError> {
        let options = reference_options(field)?;

        match value {
            Value::Null => Ok((DocValue::Null, false)),
            Value::Ref(reference) if !options.many => {
                self.storage_id(field, options, reference, marshal)
            }
            Value::List(items) if options.many => {
                let mut written = false;
                let mut out = Vec::with_capacity(items.len());

                for item in items.iter_mut() {
                    let Value::Ref(reference) = item else {
                        out.push(DocValue::Null);
                        continue;
                    };
                    let (id, stored) = self.storage_id(field, options, reference, marshal)?;
                    written |= stored;

                    let actual = reference.object.as_ref().map_or(options.target, ObjectValue::type_ref);
                    let descriptor = ReferenceDescriptor {
                        id,
                        collection: self.names.collection_name(actual)?,
                        lazy: options.lazy,
                    };
                    out.push(DocValue::Document(descriptor.to_document()));
                }

                Ok((DocValue::Array(out), written))
            }
            other => Err(MapperError::invariant(
                ErrorOrigin::Reference,
                format!("reference field '{}' holds a {} value", field.member, other.tag()),
            )),
        }
    }

    /// Runtime form of a stored reference field. Eager references load
    /// through `loader` now; lazy ones become deferred placeholders.
    pub fn to_runtime_form(
        &self,
        field: &FieldDescriptor,
        stored: &DocValue,
        loader: &Arc<dyn ReferenceLoader>,
    ) -> Result<Value, MapperError> {
        let options = reference_options(field)?;
        if stored.is_null() {
            return Ok(Value::Null);
        }

        if !options.many {
            return Ok(self
                .runtime_ref(field, options, stored, loader)?
                .unwrap_or(Value::Null));
        }

        let DocValue::Array(items) = stored else {
            return Err(MapperError::deserialization(format!(
                "to-many reference '{}' is not stored as an array",
                field.member
            )));
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items.iter().filter(|item| !item.is_null()) {
            if let Some(value) = self.runtime_ref(field, options, item, loader)? {
                out.push(value);
            }
        }

        Ok(Value::List(out))
    }

    fn storage_id(
        &self,
        field: &FieldDescriptor,
        options: ReferenceOptions,
        reference: &mut RefValue,
        marshal: &mut dyn FnMut(&mut dyn MappedObject) -> Result<Document, MapperError>,
    ) -> Result<(DocValue, bool), MapperError> {
        let id_kind = self.target_id_kind(options.target)?;

        let (id, written) = match (&mut reference.object, &reference.id) {
            (Some(object), _) => match self.metadata.id_of(object.as_object())? {
                Some(id) => (id, false),
                None if options.auto_store => (self.auto_store(object.as_object_mut(), marshal)?, true),
                None => {
                    return Err(MapperError::unpersisted_reference(
                        field.member,
                        options.target.path,
                    ));
                }
            },
            // deferred and never loaded: the stored id is still current
            (None, Some(id)) => ((**id).clone(), false),
            (None, None) => {
                return Err(MapperError::invariant(
                    ErrorOrigin::Reference,
                    format!("reference '{}' holds neither a target nor an id", field.member),
                ));
            }
        };

        let id = coerce(id, &id_kind, CoercionMode::Lossless)
            .map_err(|err| MapperError::from(err).at(ErrorOrigin::Reference))?;
        let stored = DocValue::from_scalar(&id).ok_or_else(|| {
            MapperError::invariant(
                ErrorOrigin::Reference,
                format!("identifier of '{}' is not a scalar", options.target.path),
            )
        })?;

        Ok((stored, written))
    }

    fn auto_store(
        &self,
        object: &mut dyn MappedObject,
        marshal: &mut dyn FnMut(&mut dyn MappedObject) -> Result<Document, MapperError>,
    ) -> Result<Value, MapperError> {
        let type_ref = object.type_ref();
        debug!(path = type_ref.path, "storing unsaved reference target");

        self.metadata.compute_auto_values(object, None, true, None)?;
        self.metadata
            .dispatch_lifecycle_hook(LifecycleEvent::PreStore, object)?;

        let document = marshal(object)?;
        let id = self.persist(type_ref, document)?;

        let meta = self.metadata.resolve_entity_metadata(type_ref)?;
        let id_field = meta.id().ok_or_else(|| {
            MapperError::configuration(
                ErrorOrigin::Reference,
                format!("reference target '{}' has no identifier field", type_ref.path),
            )
        })?;
        self.metadata.assign(object, id_field, id.to_plain_value())?;
        self.metadata
            .dispatch_lifecycle_hook(LifecycleEvent::PostStore, object)?;

        self.metadata.id_of(object)?.ok_or_else(|| {
            MapperError::invariant(
                ErrorOrigin::Reference,
                format!("stored '{}' but its identifier is still unset", type_ref.path),
            )
        })
    }

    fn persist(&self, target: TypeRef, document: Document) -> Result<DocValue, MapperError> {
        match (&self.writer, &self.store) {
            (Some(writer), _) => Ok(writer.store(target, document)?),
            (None, Some(store)) => Ok(store.persist(target, document)?),
            (None, None) => Err(MapperError::configuration(
                ErrorOrigin::Reference,
                format!("auto-store of '{}' needs a writer or a document store", target.path),
            )),
        }
    }

    fn runtime_ref(
        &self,
        field: &FieldDescriptor,
        options: ReferenceOptions,
        stored: &DocValue,
        loader: &Arc<dyn ReferenceLoader>,
    ) -> Result<Option<Value>, MapperError> {
        let expected = self.names.collection_name(options.target)?;
        let descriptor = ReferenceDescriptor::from_stored(stored, &expected, options.lazy)?;
        if descriptor.collection != expected {
            warn!(
                field = field.member,
                stored = %descriptor.collection,
                expected = %expected,
                "reference points at an unexpected collection"
            );
        }

        let id_kind = self.target_id_kind(options.target)?;
        let id = coerce(descriptor.id.to_plain_value(), &id_kind, CoercionMode::Lossless).map_err(|err| {
            let mut err = MapperError::from(err);
            err.message = format!("reference '{}': {}", field.member, err.message);
            err.at(ErrorOrigin::Reference)
        })?;

        if descriptor.lazy {
            return Ok(Some(Value::Ref(RefValue::deferred(
                options.target,
                id,
                Arc::clone(loader),
            ))));
        }

        match loader.load(options.target, &id)? {
            Some(object) => Ok(Some(Value::Ref(RefValue {
                target: options.target,
                id: Some(Box::new(id)),
                object: Some(ObjectValue(object)),
                loader: None,
            }))),
            None => {
                warn!(field = field.member, target = options.target.path, ?id, "dangling reference");
                Ok(None)
            }
        }
    }

    fn target_id_kind(&self, target: TypeRef) -> Result<FieldKind, MapperError> {
        let meta = self.metadata.resolve_entity_metadata(target)?;

        meta.id().map(|f| f.kind.clone()).ok_or_else(|| {
            MapperError::configuration(
                ErrorOrigin::Reference,
                format!("reference target '{}' has no identifier field", target.path),
            )
        })
    }
}

fn reference_options(field: &FieldDescriptor) -> Result<ReferenceOptions, MapperError> {
    field.reference.ok_or_else(|| {
        MapperError::invariant(
            ErrorOrigin::Reference,
            format!("field '{}' is not a reference", field.member),
        )
    })
}

///
/// TESTS
///
