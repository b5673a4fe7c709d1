
use crate::{
    error::FieldError,
    model::{EnumRef, FieldKind, TypeDecl, TypeRef},
    serialize::SerializeError,
    value::{CoercionError, ObjectValue, Value, ValueEnum, ValueTag},
};
use chrono::{DateTime, FixedOffset, Utc};
use std::{
    any::Any,
    collections::{BTreeMap, HashMap},
    fmt,
};
use ulid::Ulid;

/// ------------------------
/// TYPE IDENTITY
/// ------------------------

///
/// Path
///
/// Fully qualified Rust path of a mapped type; doubles as the type tag.
///

pub trait Path {
    const PATH: &'static str;
}

///
/// Reflect
///
/// Object-safe field access generated for every mapped type.
/// Field names are Rust member names; parent fields are reachable through
/// the child.
///

pub trait Reflect: Any + Send + Sync {
    /// Runtime type of this value.
    fn type_ref(&self) -> TypeRef;

    fn get_field(&self, field: &str) -> Option<Value>;

    fn set_field(&mut self, field: &str, value: Value) -> Result<(), FieldError>;

    /// Call the lifecycle method named `method`; false if there is none.
    fn invoke_hook(&mut self, method: &str) -> bool;

    fn encode_opaque(&self) -> Option<Result<Vec<u8>, SerializeError>> {
        None
    }
}

///
/// MappedObject
///
/// Dynamic helpers for boxed mapped values. Implemented for every
/// `Reflect + Clone + PartialEq + Debug` type.
///

pub trait MappedObject: Reflect + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn clone_boxed(&self) -> Box<dyn MappedObject>;

    fn eq_dyn(&self, other: &dyn MappedObject) -> bool;
}

impl<T> MappedObject for T
where
    T: Reflect + Clone + PartialEq + fmt::Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_boxed(&self) -> Box<dyn MappedObject> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn MappedObject) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

impl PartialEq for dyn MappedObject {
    fn eq(&self, other: &Self) -> bool {
        self.eq_dyn(other)
    }
}

impl Clone for Box<dyn MappedObject> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

///
/// Mapped
///
/// Static side of a mapped type: its declaration and a field-wise default
/// allocation that bypasses any user constructor.
///

pub trait Mapped: Path + MappedObject + Sized {
    fn declaration() -> TypeDecl;

    fn instantiate() -> Self;

    fn decode_opaque(_bytes: &[u8]) -> Option<Result<Self, SerializeError>> {
        None
    }

    #[must_use]
    fn mapped_type() -> TypeRef {
        TypeRef {
            path: Self::PATH,
            declare: Self::declaration,
            allocate: allocate_boxed::<Self>,
            decode_opaque: decode_opaque_boxed::<Self>,
        }
    }
}

fn allocate_boxed<T: Mapped>() -> Box<dyn MappedObject> {
    Box::new(T::instantiate())
}

fn decode_opaque_boxed<T: Mapped>(
    bytes: &[u8],
) -> Option<Result<Box<dyn MappedObject>, SerializeError>> {
    T::decode_opaque(bytes).map(|res| res.map(|v| Box::new(v) as Box<dyn MappedObject>))
}

///
/// MappedInterface
/// Marker-only declaration that mapped types can list as implemented.
///

pub trait MappedInterface {
    fn declaration() -> TypeDecl;
}

///
/// MappedEnum
/// Unit enum stored by symbolic constant name.
///

pub trait MappedEnum: Path + Sized {
    const VARIANTS: &'static [&'static str];

    fn variant(&self) -> &'static str;

    fn from_variant(name: &str) -> Option<Self>;

    #[must_use]
    fn enum_ref() -> EnumRef {
        EnumRef {
            path: Self::PATH,
            variants: Self::VARIANTS,
        }
    }
}

/// ------------------------
/// FIELD VALUES
/// ------------------------

///
/// FieldValue
///
/// Conversion between a Rust field type and [`Value`].
/// `from_value` is strict; coercion happens before it is called.
///

pub trait FieldValue: Sized {
    fn kind() -> FieldKind;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, CoercionError>;
}

fn mismatch(value: &Value, to: &str) -> CoercionError {
    CoercionError::Unsupported {
        from: value.tag(),
        to: to.to_string(),
    }
}

impl FieldValue for String {
    fn kind() -> FieldKind {
        FieldKind::Text
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch(&other, "Text")),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn kind() -> FieldKind {
        T::kind()
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, FieldValue::to_value)
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn kind() -> FieldKind {
        FieldKind::List(Box::new(T::kind()))
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch(&other, "List")),
        }
    }
}

impl<T: FieldValue> FieldValue for BTreeMap<String, T> {
    fn kind() -> FieldKind {
        FieldKind::Map(Box::new(T::kind()))
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            other => Err(mismatch(&other, "Map")),
        }
    }
}

impl<T: FieldValue> FieldValue for HashMap<String, T> {
    fn kind() -> FieldKind {
        FieldKind::Map(Box::new(T::kind()))
    }

    fn to_value(&self) -> Value {
        // sorted so repeated writes produce identical documents
        let mut entries: Vec<_> = self
            .iter()
            .map(|(k, v)| (k.clone(), v.to_value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        Value::Map(entries)
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            other => Err(mismatch(&other, "Map")),
        }
    }
}

impl FieldValue for Box<dyn MappedObject> {
    fn kind() -> FieldKind {
        FieldKind::Dynamic
    }

    fn to_value(&self) -> Value {
        Value::Object(ObjectValue(self.clone_boxed()))
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Object(object) => Ok(object.into_inner()),
            other => Err(mismatch(&other, "Dynamic")),
        }
    }
}

impl FieldValue for Value {
    fn kind() -> FieldKind {
        FieldKind::Any
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        Ok(value)
    }
}

// impl_field_value
macro_rules! impl_field_value {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl FieldValue for $type {
                fn kind() -> FieldKind {
                    FieldKind::$variant
                }

                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }

                fn from_value(value: Value) -> Result<Self, CoercionError> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(mismatch(&other, stringify!($variant))),
                    }
                }
            }
        )*
    };
}

impl_field_value!(
    bool => Bool,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    DateTime<Utc> => Timestamp,
    DateTime<FixedOffset> => Calendar,
    Ulid => Ulid,
);

/// Read a nested mapped object back out of a [`Value`].
pub fn object_from_value<T: Mapped>(value: Value) -> Result<T, CoercionError> {
    match value {
        Value::Object(object) => object.downcast::<T>().map_err(|actual| {
            CoercionError::Unsupported {
                from: ValueTag::Object,
                to: format!("{} (found {})", T::PATH, actual.path),
            }
        }),
        other => Err(mismatch(&other, T::PATH)),
    }
}

/// Symbolic [`Value`] for an enum constant.
pub fn enum_to_value<T: MappedEnum>(value: &T) -> Value {
    Value::Enum(ValueEnum::new(T::PATH, value.variant()))
}

/// Read an enum constant back out of a [`Value`].
pub fn enum_from_value<T: MappedEnum>(value: Value) -> Result<T, CoercionError> {
    let variant = match value {
        Value::Enum(ValueEnum { variant, .. }) | Value::Text(variant) => variant,
        other => return Err(mismatch(&other, T::PATH)),
    };

    T::from_variant(&variant).ok_or_else(|| CoercionError::UnknownVariant {
        path: T::PATH.to_string(),
        variant,
    })
}
