use crate::{
    error::{ErrorOrigin, MapperError},
    model::FieldKind,
    reference::ReferenceLoader,
    traits::{FieldValue, Mapped},
    value::{CoercionError, ObjectValue, RefValue, Value, ValueTag},
};
use std::{
    fmt,
    sync::{Arc, OnceLock},
};

///
/// Ref
///
/// Reference field. Either holds its target, or holds the stored id and a
/// loader; in that state the first `get` fetches the target and caches it.
///
/// Two references are equal when both have a target and the targets are
/// equal, or when neither has one and their ids match.
///

#[derive(Clone)]
pub struct Ref<T> {
    state: RefState<T>,
}

#[derive(Clone)]
enum RefState<T> {
    Loaded(T),
    Deferred {
        id: Value,
        loader: Arc<dyn ReferenceLoader>,
        cell: OnceLock<T>,
    },
}

impl<T: Mapped> Ref<T> {
    pub const fn new(target: T) -> Self {
        Self {
            state: RefState::Loaded(target),
        }
    }

    pub fn deferred(id: Value, loader: Arc<dyn ReferenceLoader>) -> Self {
        Self {
            state: RefState::Deferred {
                id,
                loader,
                cell: OnceLock::new(),
            },
        }
    }

    /// Whether the target is in memory.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.peek().is_some()
    }

    /// Target if already in memory; never triggers a fetch.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        match &self.state {
            RefState::Loaded(target) => Some(target),
            RefState::Deferred { cell, .. } => cell.get(),
        }
    }

    /// Stored id of a deferred reference.
    #[must_use]
    pub const fn stored_id(&self) -> Option<&Value> {
        match &self.state {
            RefState::Loaded(_) => None,
            RefState::Deferred { id, .. } => Some(id),
        }
    }

    /// Target, fetched on first access and cached.
    pub fn get(&self) -> Result<&T, MapperError> {
        match &self.state {
            RefState::Loaded(target) => Ok(target),
            RefState::Deferred { id, loader, cell } => {
                if let Some(target) = cell.get() {
                    return Ok(target);
                }
                let target = fetch::<T>(loader.as_ref(), id)?;

                Ok(cell.get_or_init(|| target))
            }
        }
    }

    /// Forced dereference; callers run this before reading target fields.
    pub fn resolve(&self) -> Result<&T, MapperError> {
        self.get()
    }

    pub fn get_mut(&mut self) -> Result<&mut T, MapperError> {
        self.get()?;

        match &mut self.state {
            RefState::Loaded(target) => Ok(target),
            RefState::Deferred { cell, .. } => cell.get_mut().ok_or_else(|| {
                MapperError::invariant(ErrorOrigin::Reference, "resolved reference lost its target")
            }),
        }
    }

    pub fn into_inner(self) -> Result<T, MapperError> {
        match self.state {
            RefState::Loaded(target) => Ok(target),
            RefState::Deferred { id, loader, cell } => match cell.into_inner() {
                Some(target) => Ok(target),
                None => fetch::<T>(loader.as_ref(), &id),
            },
        }
    }
}

fn fetch<T: Mapped>(loader: &dyn ReferenceLoader, id: &Value) -> Result<T, MapperError> {
    let object = loader.load(T::mapped_type(), id)?.ok_or_else(|| {
        MapperError::not_found(
            ErrorOrigin::Reference,
            format!("no '{}' stored under id {id:?}", T::PATH),
        )
    })?;

    ObjectValue(object).downcast::<T>().map_err(|actual| {
        MapperError::deserialization(format!(
            "reference to '{}' resolved to '{}'",
            T::PATH,
            actual.path
        ))
        .at(ErrorOrigin::Reference)
    })
}

impl<T: Mapped + PartialEq> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self.peek(), other.peek()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.stored_id() == other.stored_id(),
            _ => false,
        }
    }
}

impl<T: Mapped + PartialEq> PartialEq<T> for Ref<T> {
    fn eq(&self, other: &T) -> bool {
        self.peek().is_some_and(|target| target == other)
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            RefState::Loaded(target) => f.debug_tuple("Ref::Loaded").field(target).finish(),
            RefState::Deferred { id, cell, .. } => f
                .debug_struct("Ref::Deferred")
                .field("id", id)
                .field("target", &cell.get())
                .finish(),
        }
    }
}

impl<T: Mapped + Clone> FieldValue for Ref<T> {
    fn kind() -> FieldKind {
        FieldKind::Ref(T::mapped_type())
    }

    fn to_value(&self) -> Value {
        let target = T::mapped_type();

        match &self.state {
            RefState::Loaded(object) => {
                Value::Ref(RefValue::loaded(target, ObjectValue::new(object.clone())))
            }
            RefState::Deferred { id, loader, cell } => Value::Ref(RefValue {
                target,
                id: Some(Box::new(id.clone())),
                object: cell.get().map(|object| ObjectValue::new(object.clone())),
                loader: Some(Arc::clone(loader)),
            }),
        }
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        let mismatch = |actual: &str| CoercionError::Unsupported {
            from: ValueTag::Object,
            to: format!("Ref<{}> (found {actual})", T::PATH),
        };

        match value {
            Value::Ref(RefValue {
                object: Some(object),
                ..
            })
            | Value::Object(object) => object
                .downcast::<T>()
                .map(Self::new)
                .map_err(|actual| mismatch(actual.path)),
            Value::Ref(RefValue {
                id: Some(id),
                loader: Some(loader),
                ..
            }) => Ok(Self::deferred(*id, loader)),
            other => Err(CoercionError::Unsupported {
                from: other.tag(),
                to: format!("Ref<{}>", T::PATH),
            }),
        }
    }
}
