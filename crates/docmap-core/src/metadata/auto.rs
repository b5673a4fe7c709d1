use crate::{
    document::{DocValue, Document},
    error::{ErrorOrigin, MapperError},
    metadata::{AutoValueKind, EntityMetadata, FieldDescriptor, MetadataResolver},
    model::FieldKind,
    traits::MappedObject,
    value::Value,
};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use tracing::debug;

impl MetadataResolver {
    /// Populate creation and last-change fields; returns whether `object`
    /// is considered new.
    ///
    /// An object without an identifier is new. With verify-new in force
    /// (type marker or config) and an identifier present, the persisted
    /// state decides regardless of `is_new_hint`: `prefetched` if given,
    /// else one store lookup. A prior state makes the object not new and
    /// its creation values are copied forward. Without verification the
    /// hint may mark an identified object as new. Last-change fields are
    /// set on every call.
    pub fn compute_auto_values(
        &self,
        object: &mut dyn MappedObject,
        id: Option<&Value>,
        is_new_hint: bool,
        prefetched: Option<&Document>,
    ) -> Result<bool, MapperError> {
        let meta = self.resolve_entity_metadata(object.type_ref())?;
        let id = match id {
            Some(id) if !id.is_null() => Some(id.clone()),
            _ => self.id_of(object)?,
        };
        let mut is_new = is_new_hint || id.is_none();

        if !self.config.auto_values {
            return Ok(is_new);
        }
        let now = Utc::now();

        if let Some(verify_marker) = meta.creation_time {
            // with verification the persisted state outranks the caller's hint
            if let (true, Some(id)) = (verify_marker || self.config.verify_new, &id) {
                let prior = match prefetched {
                    Some(doc) => Some(doc.clone()),
                    None => self.fetch_persisted(&meta, id)?,
                };

                is_new = match prior {
                    Some(doc) => {
                        self.copy_creation_values(object, &meta, &doc)?;
                        false
                    }
                    None => true,
                };
            }

            if is_new {
                for (field, auto) in meta.auto_fields(AutoValueKind::CreationTime) {
                    let value = self.point_in_time(field, auto.format, now)?;
                    object.set_field(field.member, value)?;
                }
            }
        }

        if meta.last_change {
            for (field, auto) in meta.auto_fields(AutoValueKind::LastChange) {
                let value = self.point_in_time(field, auto.format, now)?;
                object.set_field(field.member, value)?;
            }
        }

        Ok(is_new)
    }

    /// Populate last-access fields. Returns whether any field was written.
    pub fn touch_last_access(&self, object: &mut dyn MappedObject) -> Result<bool, MapperError> {
        let meta = self.resolve_entity_metadata(object.type_ref())?;
        if !self.config.auto_values || !meta.last_access {
            return Ok(false);
        }

        let now = Utc::now();
        let mut touched = false;
        for (field, auto) in meta.auto_fields(AutoValueKind::LastAccess) {
            let value = self.point_in_time(field, auto.format, now)?;
            object.set_field(field.member, value)?;
            touched = true;
        }

        Ok(touched)
    }

    fn fetch_persisted(&self, meta: &EntityMetadata, id: &Value) -> Result<Option<Document>, MapperError> {
        let store = self.store.as_ref().ok_or_else(|| {
            MapperError::configuration(
                ErrorOrigin::Metadata,
                format!("verify-new for '{}' needs a document store", meta.path),
            )
        })?;
        let key = DocValue::from_scalar(id).ok_or_else(|| {
            MapperError::invariant(
                ErrorOrigin::Metadata,
                format!("identifier of '{}' is not a scalar", meta.path),
            )
        })?;

        debug!(path = meta.path, "re-reading persisted state for verify-new");
        Ok(store.find_by_id(meta.type_ref, &key)?)
    }

    fn copy_creation_values(
        &self,
        object: &mut dyn MappedObject,
        meta: &EntityMetadata,
        prior: &Document,
    ) -> Result<(), MapperError> {
        for (field, _) in meta.auto_fields(AutoValueKind::CreationTime) {
            if let Some(stored) = prior.get(&field.physical).filter(|v| !v.is_null()) {
                self.set_value(object, field.member, stored.to_plain_value())?;
            }
        }

        Ok(())
    }

    fn point_in_time(
        &self,
        field: &FieldDescriptor,
        format: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Value, MapperError> {
        match field.kind {
            FieldKind::Int64 => Ok(Value::Int64(now.timestamp_millis())),
            FieldKind::Float64 => Ok(Value::Float64(now.timestamp_millis() as f64)),
            FieldKind::Timestamp => Ok(Value::Timestamp(now)),
            FieldKind::Calendar => Ok(Value::Calendar(now.fixed_offset())),
            FieldKind::Text => {
                let format = format.unwrap_or(&self.config.timestamp_format);
                let mut text = String::new();
                write!(text, "{}", now.format(format)).map_err(|_| {
                    MapperError::configuration(
                        ErrorOrigin::Metadata,
                        format!("invalid timestamp format '{format}' for field '{}'", field.member),
                    )
                })?;
                Ok(Value::Text(text))
            }
            _ => Err(MapperError::configuration(
                ErrorOrigin::Metadata,
                format!("field '{}' cannot hold a point in time", field.member),
            )),
        }
    }
}
