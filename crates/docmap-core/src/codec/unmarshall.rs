use crate::{
    codec::Codec,
    document::{DocValue, Document, ENUM_NAME_KEY, ENVELOPE_DATA_KEY, ID_KEY},
    error::MapperError,
    metadata::{EntityMetadata, FieldDescriptor},
    model::{FieldKind, LifecycleEvent, TypeRef},
    reference::ReferenceLoader,
    traits::MappedObject,
    value::{CoercionError, ObjectValue, Value, ValueEnum},
};
use std::sync::Arc;

impl Codec {
    /// Rebuild one object. A type tag in `doc` overrides `declared`.
    pub(super) fn decode_object(
        &self,
        declared: TypeRef,
        doc: &Document,
        loader: &Arc<dyn ReferenceLoader>,
    ) -> Result<Box<dyn MappedObject>, MapperError> {
        let actual = match doc.type_tag() {
            Some(tag) if tag != declared.path => self.registry.resolve(tag).ok_or_else(|| {
                MapperError::deserialization(format!("type tag '{tag}' names no registered type"))
            })?,
            _ => declared,
        };
        if doc.is_envelope() {
            return open_envelope(actual, doc);
        }

        let meta = self.metadata_for(actual, true)?;
        if meta.is_opaque() {
            return Err(MapperError::deserialization(format!(
                "'{}' is stored as an opaque envelope but the document is not one",
                actual.path
            )));
        }

        let mut object = actual.allocate();
        for field in &meta.fields {
            if field.flags.transient || field.flags.write_only || field.flags.dynamic {
                continue;
            }
            // absent and null values leave the allocated default in place
            let Some(stored) = lookup(doc, field).filter(|v| !v.is_null()) else {
                continue;
            };

            let value = if field.reference.is_some() {
                self.references.to_runtime_form(field, stored, loader)?
            } else {
                self.decode_value(&field.kind, stored, loader)?
            };
            self.metadata.assign(&mut *object, field, value)?;
        }

        if let Some(field) = meta.dynamic() {
            let mut entries = Vec::new();
            for (key, stored) in doc.iter() {
                if key == ID_KEY || Document::is_type_tag_key(key) || is_declared(&meta, key) {
                    continue;
                }
                entries.push((key.to_string(), self.decode_value(field.kind.element(), stored, loader)?));
            }
            if !entries.is_empty() {
                self.metadata.assign(&mut *object, field, Value::Map(entries))?;
            }
        }

        self.metadata
            .dispatch_lifecycle_hook(LifecycleEvent::PostLoad, &mut *object)?;

        Ok(object)
    }

    /// Object-side form of a stored value declared as `kind`. Coercion to
    /// the exact field type happens when the value is assigned.
    fn decode_value(
        &self,
        kind: &FieldKind,
        stored: &DocValue,
        loader: &Arc<dyn ReferenceLoader>,
    ) -> Result<Value, MapperError> {
        match stored {
            DocValue::Null => Ok(Value::Null),
            DocValue::Array(items) => {
                let element = kind.element();
                items
                    .iter()
                    .map(|item| self.decode_value(element, item, loader))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }
            DocValue::Document(doc) => self.decode_document(kind, doc, loader),
            DocValue::String(s) => match kind {
                FieldKind::Enum(decl) => Ok(Value::Enum(ValueEnum::new(decl.path, s.as_str()))),
                _ => Ok(Value::Text(s.clone())),
            },
            scalar => Ok(scalar.to_plain_value()),
        }
    }

    fn decode_document(
        &self,
        kind: &FieldKind,
        doc: &Document,
        loader: &Arc<dyn ReferenceLoader>,
    ) -> Result<Value, MapperError> {
        match kind {
            FieldKind::Object(target) => {
                let object = self.decode_object(*target, doc, loader)?;
                Ok(Value::Object(ObjectValue(object)))
            }
            FieldKind::Enum(decl) => {
                let name = doc.get(ENUM_NAME_KEY).and_then(DocValue::as_str).ok_or_else(|| {
                    MapperError::deserialization(format!(
                        "enum '{}' stored as a document without '{ENUM_NAME_KEY}'",
                        decl.path
                    ))
                })?;
                Ok(Value::Enum(ValueEnum::new(decl.path, name)))
            }
            FieldKind::Dynamic => match doc.type_tag() {
                Some(tag) => self.decode_tagged(tag, doc, loader),
                None => Err(MapperError::deserialization(
                    "document in a polymorphic position carries no type tag",
                )),
            },
            FieldKind::Any => match doc.type_tag() {
                Some(tag) => self.decode_tagged(tag, doc, loader),
                None => self.decode_map(&FieldKind::Any, doc, loader),
            },
            FieldKind::Map(inner) => self.decode_map(inner, doc, loader),
            // left to the coercion step, which names the field
            _ => Ok(DocValue::Document(doc.clone()).to_plain_value()),
        }
    }

    fn decode_map(
        &self,
        element: &FieldKind,
        doc: &Document,
        loader: &Arc<dyn ReferenceLoader>,
    ) -> Result<Value, MapperError> {
        doc.iter()
            .map(|(key, stored)| {
                self.decode_value(element, stored, loader)
                    .map(|value| (key.to_string(), value))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Map)
    }

    /// Tagged document in an untyped position: a registered type, or a
    /// `{tag, name}` enum constant.
    fn decode_tagged(
        &self,
        tag: &str,
        doc: &Document,
        loader: &Arc<dyn ReferenceLoader>,
    ) -> Result<Value, MapperError> {
        if let Some(type_ref) = self.registry.resolve(tag) {
            let object = self.decode_object(type_ref, doc, loader)?;
            return Ok(Value::Object(ObjectValue(object)));
        }

        let name = doc.get(ENUM_NAME_KEY).and_then(DocValue::as_str);
        if let (Some(name), 2) = (name, doc.len()) {
            if let Some(decl) = self.registry.resolve_enum(tag) {
                if !decl.variants.iter().any(|v| *v == name) {
                    return Err(CoercionError::UnknownVariant {
                        path: tag.to_string(),
                        variant: name.to_string(),
                    }
                    .into());
                }
            }
            return Ok(Value::Enum(ValueEnum::new(tag, name)));
        }

        Err(MapperError::deserialization(format!(
            "type tag '{tag}' names no registered type"
        )))
    }
}

fn lookup<'a>(doc: &'a Document, field: &FieldDescriptor) -> Option<&'a DocValue> {
    doc.get(&field.physical)
        .or_else(|| field.aliases.iter().find_map(|alias| doc.get(alias)))
}

fn is_declared(meta: &EntityMetadata, key: &str) -> bool {
    meta.fields
        .iter()
        .any(|f| f.physical == key || f.aliases.iter().any(|a| *a == key))
}

fn open_envelope(actual: TypeRef, doc: &Document) -> Result<Box<dyn MappedObject>, MapperError> {
    let Some(DocValue::Binary(bytes)) = doc.get(ENVELOPE_DATA_KEY) else {
        return Err(MapperError::deserialization("opaque envelope without payload"));
    };

    match (actual.decode_opaque)(bytes) {
        Some(decoded) => Ok(decoded?),
        None => Err(MapperError::deserialization(format!(
            "'{}' cannot be read from an opaque envelope",
            actual.path
        ))),
    }
}
