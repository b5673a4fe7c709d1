use crate::{
    error::{ErrorClass, ErrorDetail, ErrorOrigin, MapperError},
    model::FieldKind,
    value::{RefValue, Value, ValueEnum, ValueTag},
};
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error as ThisError;
use ulid::Ulid;

const DATE_TEXT_FORMAT: &str = "%Y%m%d";
const I64_FLOAT_BOUND: f64 = 9_223_372_036_854_775_808.0;

///
/// CoercionError
///

#[derive(Debug, ThisError)]
pub enum CoercionError {
    #[error("cannot coerce {from} into {to}")]
    Unsupported { from: ValueTag, to: String },

    #[error("cannot parse '{input}' as {to}")]
    Parse { input: String, to: String },

    #[error("value {value} does not fit losslessly into {to}")]
    OutOfRange { value: String, to: String },

    #[error("'{variant}' is not a constant of enum '{path}'")]
    UnknownVariant { path: String, variant: String },
}

impl CoercionError {
    fn unsupported(value: &Value, to: impl Into<String>) -> Self {
        Self::Unsupported {
            from: value.tag(),
            to: to.into(),
        }
    }
}

impl From<CoercionError> for MapperError {
    fn from(err: CoercionError) -> Self {
        Self::new(ErrorClass::Coercion, ErrorOrigin::Metadata, err.to_string())
            .with_detail(ErrorDetail::Coercion(err))
    }
}

///
/// CoercionMode
///
/// `Lenient` truncates on numeric narrowing. `Lossless` refuses any
/// conversion that would lose information; identifiers use it.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CoercionMode {
    #[default]
    Lenient,
    Lossless,
}

/// Convert `value` so it matches the declared `kind`.
pub fn coerce(value: Value, kind: &FieldKind, mode: CoercionMode) -> Result<Value, CoercionError> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match kind {
        FieldKind::Bool => to_bool(value).map(Value::Bool),
        FieldKind::Int32 => to_i32(value, mode).map(Value::Int32),
        FieldKind::Int64 => to_i64(value, "Int64", mode).map(Value::Int64),
        FieldKind::Float32 => to_f64(value, "Float32").map(|f| Value::Float32(f as f32)),
        FieldKind::Float64 => to_f64(value, "Float64").map(Value::Float64),
        FieldKind::Text => to_text(value).map(Value::Text),
        FieldKind::Timestamp => to_timestamp(value).map(Value::Timestamp),
        FieldKind::Calendar => to_timestamp(value).map(|t| Value::Calendar(t.fixed_offset())),
        FieldKind::Ulid => to_ulid(value).map(Value::Ulid),
        FieldKind::Blob => to_blob(value),
        FieldKind::Enum(decl) => {
            let variant = match value {
                Value::Enum(ValueEnum { variant, .. }) | Value::Text(variant) => variant,
                other => return Err(CoercionError::unsupported(&other, kind.label())),
            };
            if !decl.variants.iter().any(|v| *v == variant) {
                return Err(CoercionError::UnknownVariant {
                    path: decl.path.to_string(),
                    variant,
                });
            }

            Ok(Value::Enum(ValueEnum::new(decl.path, variant)))
        }
        FieldKind::List(inner) => match value {
            Value::List(items) => items
                .into_iter()
                .map(|item| coerce(item, inner, mode))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            other => Err(CoercionError::unsupported(&other, kind.label())),
        },
        FieldKind::Map(inner) => match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| coerce(v, inner, mode).map(|v| (k, v)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Map),
            other => Err(CoercionError::unsupported(&other, kind.label())),
        },
        FieldKind::Object(_) | FieldKind::Dynamic => match value {
            Value::Object(_) => Ok(value),
            other => Err(CoercionError::unsupported(&other, kind.label())),
        },
        FieldKind::Ref(target) => match value {
            Value::Ref(_) => Ok(value),
            Value::Object(object) => Ok(Value::Ref(RefValue::loaded(*target, object))),
            other => Err(CoercionError::unsupported(&other, kind.label())),
        },
        FieldKind::Any => Ok(value),
    }
}

fn to_bool(value: Value) -> Result<bool, CoercionError> {
    match value {
        Value::Bool(b) => Ok(b),
        Value::Int32(v) => Ok(v != 0),
        Value::Int64(v) => Ok(v != 0),
        Value::Float32(v) => Ok(v != 0.0),
        Value::Float64(v) => Ok(v != 0.0),
        Value::Text(s) => match s.trim() {
            t if t.eq_ignore_ascii_case("true") || t == "1" => Ok(true),
            t if t.eq_ignore_ascii_case("false") || t == "0" => Ok(false),
            _ => Err(CoercionError::Parse {
                input: s,
                to: "Bool".into(),
            }),
        },
        other => Err(CoercionError::unsupported(&other, "Bool")),
    }
}

fn to_i32(value: Value, mode: CoercionMode) -> Result<i32, CoercionError> {
    let wide = to_i64(value, "Int32", mode)?;

    match mode {
        CoercionMode::Lenient => Ok(wide as i32),
        CoercionMode::Lossless => i32::try_from(wide).map_err(|_| CoercionError::OutOfRange {
            value: wide.to_string(),
            to: "Int32".into(),
        }),
    }
}

fn to_i64(value: Value, to: &str, mode: CoercionMode) -> Result<i64, CoercionError> {
    let lossless = mode == CoercionMode::Lossless;
    let out_of_range = |value: String| CoercionError::OutOfRange {
        value,
        to: to.to_string(),
    };
    let from_float = |f: f64| {
        // i64::MAX is not representable; 2^63 is the first float past it
        let in_range = f.is_finite() && f >= -I64_FLOAT_BOUND && f < I64_FLOAT_BOUND;
        if lossless && (f.fract() != 0.0 || !in_range) {
            Err(out_of_range(f.to_string()))
        } else {
            Ok(f.trunc() as i64)
        }
    };

    match value {
        Value::Int32(v) => Ok(i64::from(v)),
        Value::Int64(v) => Ok(v),
        Value::Float32(v) => from_float(f64::from(v)),
        Value::Float64(v) => from_float(v),
        Value::Bool(b) if !lossless => Ok(i64::from(b)),
        Value::Timestamp(t) if !lossless => Ok(t.timestamp_millis()),
        Value::Calendar(t) if !lossless => Ok(t.timestamp_millis()),
        Value::Text(s) => {
            let trimmed = s.trim();
            if let Ok(v) = trimmed.parse::<i64>() {
                return Ok(v);
            }
            match trimmed.parse::<f64>() {
                Ok(f) if !lossless => Ok(f.trunc() as i64),
                _ => Err(CoercionError::Parse {
                    input: s,
                    to: to.to_string(),
                }),
            }
        }
        other => Err(CoercionError::unsupported(&other, to)),
    }
}

fn to_f64(value: Value, to: &str) -> Result<f64, CoercionError> {
    match value {
        Value::Int32(v) => Ok(f64::from(v)),
        Value::Int64(v) => Ok(v as f64),
        Value::Float32(v) => Ok(f64::from(v)),
        Value::Float64(v) => Ok(v),
        Value::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
        Value::Timestamp(t) => Ok(t.timestamp_millis() as f64),
        Value::Calendar(t) => Ok(t.timestamp_millis() as f64),
        Value::Text(s) => s.trim().parse::<f64>().map_err(|_| CoercionError::Parse {
            input: s,
            to: to.to_string(),
        }),
        other => Err(CoercionError::unsupported(&other, to)),
    }
}

fn to_text(value: Value) -> Result<String, CoercionError> {
    match value {
        Value::Text(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int32(v) => Ok(v.to_string()),
        Value::Int64(v) => Ok(v.to_string()),
        Value::Float32(v) => Ok(v.to_string()),
        Value::Float64(v) => Ok(v.to_string()),
        Value::Timestamp(t) => Ok(t.format(DATE_TEXT_FORMAT).to_string()),
        Value::Calendar(t) => Ok(t.format(DATE_TEXT_FORMAT).to_string()),
        Value::Ulid(u) => Ok(u.to_string()),
        Value::Enum(e) => Ok(e.variant),
        other => Err(CoercionError::unsupported(&other, "Text")),
    }
}

fn to_timestamp(value: Value) -> Result<DateTime<Utc>, CoercionError> {
    let from_millis = |ms: i64| {
        DateTime::from_timestamp_millis(ms).ok_or_else(|| CoercionError::OutOfRange {
            value: ms.to_string(),
            to: "Timestamp".into(),
        })
    };

    match value {
        Value::Timestamp(t) => Ok(t),
        Value::Calendar(t) => Ok(t.with_timezone(&Utc)),
        Value::Int32(v) => from_millis(i64::from(v)),
        Value::Int64(v) => from_millis(v),
        Value::Float32(v) => from_millis(v as i64),
        Value::Float64(v) => from_millis(v as i64),
        Value::Text(s) => parse_date_heuristic(&s),
        other => Err(CoercionError::unsupported(&other, "Timestamp")),
    }
}

fn to_ulid(value: Value) -> Result<Ulid, CoercionError> {
    match value {
        Value::Ulid(u) => Ok(u),
        Value::Text(s) => Ulid::from_string(s.trim()).map_err(|_| CoercionError::Parse {
            input: s,
            to: "Ulid".into(),
        }),
        other => Err(CoercionError::unsupported(&other, "Ulid")),
    }
}

fn to_blob(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Blob(_) => Ok(value),
        // boxed byte arrays arrive as integer lists
        Value::List(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Int32(v) => u8::try_from(v).ok(),
                Value::Int64(v) => u8::try_from(v).ok(),
                _ => None,
            })
            .collect::<Option<Vec<u8>>>()
            .map(Value::Blob)
            .ok_or(CoercionError::Unsupported {
                from: ValueTag::List,
                to: "Blob".into(),
            }),
        other => Err(CoercionError::unsupported(&other, "Blob")),
    }
}

/// Parse a date string: eight digits as `yyyyMMdd`, text containing `-` as
/// RFC 3339 or `yyyy-MM-dd`, text containing `.` as `dd.MM.yyyy`, and
/// anything else as epoch milliseconds.
pub fn parse_date_heuristic(input: &str) -> Result<DateTime<Utc>, CoercionError> {
    let s = input.trim();
    let parse_err = || CoercionError::Parse {
        input: input.to_string(),
        to: "Timestamp".into(),
    };
    let midnight = |date: NaiveDate| date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());

    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(s, "%Y%m%d")
            .ok()
            .and_then(midnight)
            .ok_or_else(parse_err);
    }

    if s.contains('-') {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }
        return s
            .get(..10)
            .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
            .and_then(midnight)
            .ok_or_else(parse_err);
    }

    if s.contains('.') {
        return NaiveDate::parse_from_str(s, "%d.%m.%Y")
            .ok()
            .and_then(midnight)
            .ok_or_else(parse_err);
    }

    s.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(parse_err)
}
