use crate::{store::StoreError, value::CoercionError};
use std::fmt;
use thiserror::Error as ThisError;

///
/// MapperError
///
/// Structured runtime error with a stable classification.
/// Every fallible mapping operation surfaces this type; sub-errors raised by
/// individual modules convert into it and keep their payload in `detail`.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct MapperError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    pub detail: Option<ErrorDetail>,
}

impl MapperError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: ErrorDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Construct a configuration error (bad or missing markers).
    pub fn configuration(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Configuration, origin, message)
    }

    /// Construct a codec-origin error for a type that cannot be written.
    pub fn not_mappable(path: &str) -> Self {
        Self::new(
            ErrorClass::NotMappable,
            ErrorOrigin::Codec,
            format!("type '{path}' carries neither an entity nor an embedded marker"),
        )
    }

    /// Construct a codec-origin error for a document that cannot be read.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Deserialization, ErrorOrigin::Codec, message)
    }

    pub fn unpersisted_reference(field: &str, target: &str) -> Self {
        Self::new(
            ErrorClass::UnpersistedReference,
            ErrorOrigin::Reference,
            format!("reference '{field}' points at an unsaved '{target}' and auto-store is off"),
        )
    }

    pub fn not_found(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::NotFound, origin, message)
    }

    pub fn invariant(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, origin, message)
    }

    #[must_use]
    pub const fn is_coercion(&self) -> bool {
        matches!(self.class, ErrorClass::Coercion)
    }

    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.class, ErrorClass::Configuration)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }

    /// Re-attribute the error to another origin, keeping class and detail.
    #[must_use]
    pub(crate) fn at(mut self, origin: ErrorOrigin) -> Self {
        self.origin = origin;
        self
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`MapperError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Coercion(CoercionError),

    #[error("{0}")]
    Field(FieldError),

    #[error("{0}")]
    Store(StoreError),
}

///
/// FieldError
///
/// Raised by generated field accessors.
///

#[derive(Debug, ThisError)]
pub enum FieldError {
    #[error("unknown field '{field}' on '{path}'")]
    UnknownField { path: &'static str, field: String },

    #[error("field '{field}' is not writable: {reason}")]
    NotWritable { field: String, reason: String },

    #[error("field '{field}' rejected value: {source}")]
    Rejected {
        field: String,
        source: CoercionError,
    },
}

impl From<FieldError> for MapperError {
    fn from(err: FieldError) -> Self {
        let class = match err {
            FieldError::Rejected { .. } => ErrorClass::Coercion,
            FieldError::UnknownField { .. } | FieldError::NotWritable { .. } => {
                ErrorClass::InvariantViolation
            }
        };

        Self::new(class, ErrorOrigin::Metadata, err.to_string()).with_detail(ErrorDetail::Field(err))
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Configuration,
    NotMappable,
    Deserialization,
    Coercion,
    UnpersistedReference,
    NotFound,
    Store,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::NotMappable => "not_mappable",
            Self::Deserialization => "deserialization",
            Self::Coercion => "coercion",
            Self::UnpersistedReference => "unpersisted_reference",
            Self::NotFound => "not_found",
            Self::Store => "store",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Metadata,
    Naming,
    Reference,
    Codec,
    Store,
    Serialize,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Metadata => "metadata",
            Self::Naming => "naming",
            Self::Reference => "reference",
            Self::Codec => "codec",
            Self::Store => "store",
            Self::Serialize => "serialize",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueTag;

    #[test]
    fn display_with_class_uses_origin_and_class_labels() {
        let err = MapperError::not_mappable("shop::Cart");

        assert_eq!(
            err.display_with_class(),
            "codec:not_mappable: type 'shop::Cart' carries neither an entity nor an embedded marker"
        );
    }

    #[test]
    fn rejected_field_maps_to_coercion_class() {
        let err: MapperError = FieldError::Rejected {
            field: "qty".into(),
            source: CoercionError::Unsupported {
                from: ValueTag::Text,
                to: "Int32".into(),
            },
        }
        .into();

        assert!(err.is_coercion());
        assert!(matches!(err.detail, Some(ErrorDetail::Field(_))));
    }

    #[test]
    fn unknown_field_is_an_invariant_violation() {
        let err: MapperError = FieldError::UnknownField {
            path: "shop::Cart",
            field: "nope".into(),
        }
        .into();

        assert_eq!(err.class, ErrorClass::InvariantViolation);
        assert_eq!(err.origin, ErrorOrigin::Metadata);
    }
}
