use crate::{
    codec::Codec,
    document::{DocValue, Document, ENUM_NAME_KEY, ENVELOPE_DATA_KEY, ID_KEY, TYPE_TAG_KEY},
    error::{ErrorClass, ErrorOrigin, MapperError},
    metadata::{EntityMetadata, FieldDescriptor, FieldRole},
    model::FieldKind,
    traits::MappedObject,
    value::Value,
};
use std::collections::HashSet;
use tracing::warn;

///
/// MarshallContext
///
/// State of one `marshall` call. Objects currently being written are kept
/// in `in_flight` so a graph that reaches itself again fails instead of
/// recursing forever.
///

#[derive(Default)]
pub(super) struct MarshallContext {
    in_flight: HashSet<(&'static str, usize)>,
    depth: usize,
    /// Reference targets stored so far.
    writes: usize,
}

///
/// Placement
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum Placement {
    /// Stored document; carries the identifier.
    TopLevel,
    /// Inline in another document; tagged when the runtime type differs
    /// from the declared one.
    Nested { tagged: bool },
}

impl Codec {
    pub(super) fn marshall_object(
        &self,
        ctx: &mut MarshallContext,
        object: &mut dyn MappedObject,
        placement: Placement,
    ) -> Result<Document, MapperError> {
        let type_ref = object.type_ref();
        let meta = self.metadata_for(type_ref, false)?;
        // runtime types behind untyped fields must resolve on read-back
        self.registry.register_type(type_ref);
        if meta.is_opaque() {
            return envelope(object);
        }

        if ctx.depth >= self.config.max_depth {
            return Err(MapperError::invariant(
                ErrorOrigin::Codec,
                format!(
                    "nesting deeper than {} levels at '{}'",
                    self.config.max_depth, type_ref.path
                ),
            ));
        }
        let key = (type_ref.path, std::ptr::from_ref(&*object).cast::<()>().addr());
        if !ctx.in_flight.insert(key) {
            return Err(MapperError::invariant(
                ErrorOrigin::Codec,
                format!("'{}' reaches itself while being marshalled", type_ref.path),
            ));
        }

        ctx.depth += 1;
        let result = self.marshall_fields(ctx, object, &meta, placement);
        ctx.depth -= 1;
        ctx.in_flight.remove(&key);

        result
    }

    fn marshall_fields(
        &self,
        ctx: &mut MarshallContext,
        object: &mut dyn MappedObject,
        meta: &EntityMetadata,
        placement: Placement,
    ) -> Result<Document, MapperError> {
        let mut doc = Document::new();
        if meta.polymorphic || placement == (Placement::Nested { tagged: true }) {
            doc.insert(TYPE_TAG_KEY, meta.path);
        }

        let mut extra = None;
        for field in &meta.fields {
            if field.flags.transient || field.flags.read_only {
                continue;
            }
            // inline documents never carry an identifier
            if placement != Placement::TopLevel && field.role == FieldRole::Identifier {
                continue;
            }

            let mut value = read_field(object, field)?;
            if field.flags.dynamic {
                if !field.flags.dynamic_read_only {
                    extra = Some((field, value));
                }
                continue;
            }

            let before = ctx.writes;
            let stored = if field.reference.is_some() {
                let (stored, written) = self.references.to_storage_form(field, &mut value, &mut |target| {
                    self.marshall_object(ctx, target, Placement::TopLevel)
                })?;
                if written {
                    ctx.writes += 1;
                }
                stored
            } else {
                self.marshall_value(ctx, &field.kind, &mut value)?
            };
            if ctx.writes != before {
                object.set_field(field.member, value)?;
            }

            if stored.is_null() && !field.flags.use_if_null {
                continue;
            }
            doc.insert(field.physical.clone(), stored);
        }

        if let Some((field, mut value)) = extra {
            let before = ctx.writes;
            if let Value::Map(entries) = &mut value {
                for (key, item) in entries.iter_mut() {
                    let key = sanitize_key(key);
                    if key == ID_KEY || Document::is_type_tag_key(&key) || doc.contains_key(&key) {
                        warn!(path = meta.path, key = %key, "extra data shadows a declared field; dropped");
                        continue;
                    }
                    let stored = self.marshall_value(ctx, field.kind.element(), item)?;
                    doc.insert(key, stored);
                }
            }
            if ctx.writes != before {
                object.set_field(field.member, value)?;
            }
        }

        Ok(doc)
    }

    /// Wire form of a non-reference value declared as `kind`.
    fn marshall_value(
        &self,
        ctx: &mut MarshallContext,
        kind: &FieldKind,
        value: &mut Value,
    ) -> Result<DocValue, MapperError> {
        let stored = match value {
            Value::Null => DocValue::Null,
            Value::Enum(constant) => match kind {
                FieldKind::Enum(_) => DocValue::String(constant.variant.clone()),
                // untyped position: keep the enum type for read-back
                _ => {
                    let mut doc = Document::new();
                    doc.insert(TYPE_TAG_KEY, constant.path.as_str());
                    doc.insert(ENUM_NAME_KEY, constant.variant.as_str());
                    DocValue::Document(doc)
                }
            },
            Value::List(items) => {
                let element = kind.element();
                let items = items
                    .iter_mut()
                    .map(|item| self.marshall_value(ctx, element, item))
                    .collect::<Result<Vec<_>, _>>()?;
                DocValue::Array(items)
            }
            Value::Map(entries) => {
                let element = kind.element();
                let mut doc = Document::new();
                for (key, item) in entries.iter_mut() {
                    let stored = self.marshall_value(ctx, element, item)?;
                    doc.insert(sanitize_key(key), stored);
                }
                DocValue::Document(doc)
            }
            Value::Object(object) => {
                let declared = match kind {
                    FieldKind::Object(target) => Some(*target),
                    _ => None,
                };
                let tagged = declared != Some(object.type_ref());
                let doc = self.marshall_object(ctx, object.as_object_mut(), Placement::Nested { tagged })?;
                DocValue::Document(doc)
            }
            Value::Ref(reference) => {
                return Err(MapperError::new(
                    ErrorClass::NotMappable,
                    ErrorOrigin::Codec,
                    format!(
                        "reference to '{}' outside a Ref or Vec<Ref> field",
                        reference.target.path
                    ),
                ));
            }
            scalar => DocValue::from_scalar(scalar).ok_or_else(|| {
                MapperError::invariant(ErrorOrigin::Codec, format!("{} is not a scalar", scalar.tag()))
            })?,
        };

        Ok(stored)
    }
}

fn read_field(object: &dyn MappedObject, field: &FieldDescriptor) -> Result<Value, MapperError> {
    object.get_field(field.member).ok_or_else(|| {
        MapperError::invariant(
            ErrorOrigin::Codec,
            format!("accessor for '{}' returned nothing", field.member),
        )
    })
}

fn envelope(object: &dyn MappedObject) -> Result<Document, MapperError> {
    let path = object.type_ref().path;
    let bytes = object
        .encode_opaque()
        .ok_or_else(|| MapperError::not_mappable(path))??;

    let mut doc = Document::new();
    doc.insert(TYPE_TAG_KEY, path);
    doc.insert(ENVELOPE_DATA_KEY, DocValue::Binary(bytes));

    Ok(doc)
}

// '.' is a path separator in document stores
fn sanitize_key(key: &str) -> String {
    if key.contains('.') {
        warn!(key, "map key contains '.'; rewritten with '_'");
        key.replace('.', "_")
    } else {
        key.to_string()
    }
}
