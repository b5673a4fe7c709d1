use crate::{
    model::{EnumRef, FieldKind},
    traits::{Mapped, MappedEnum},
    test_fixtures::{Customer, OrderStatus},
    value::{CoercionError, CoercionMode, Value, ValueEnum, coerce, parse_date_heuristic},
};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use proptest::prelude::*;
use ulid::Ulid;

// ---- helpers -----------------------------------------------------------

fn lenient(value: Value, kind: &FieldKind) -> Result<Value, CoercionError> {
    coerce(value, kind, CoercionMode::Lenient)
}

fn lossless(value: Value, kind: &FieldKind) -> Result<Value, CoercionError> {
    coerce(value, kind, CoercionMode::Lossless)
}

fn ymd(dt: DateTime<Utc>) -> (i32, u32, u32) {
    (dt.year(), dt.month(), dt.day())
}

// ---- numeric ------------------------------------------------------------

#[test]
fn null_passes_through_every_kind() {
    for kind in [FieldKind::Int32, FieldKind::Text, FieldKind::Timestamp, FieldKind::Any] {
        assert_eq!(lossless(Value::Null, &kind).unwrap(), Value::Null);
    }
}

#[test]
fn lenient_narrowing_truncates() {
    assert_eq!(lenient(Value::Float64(3.7), &FieldKind::Int32).unwrap(), Value::Int32(3));
    assert_eq!(
        lenient(Value::Int64(i64::from(i32::MAX) + 1), &FieldKind::Int32).unwrap(),
        Value::Int32(i32::MIN)
    );
}

#[test]
fn lossless_narrowing_refuses_information_loss() {
    assert!(matches!(
        lossless(Value::Float64(3.7), &FieldKind::Int64),
        Err(CoercionError::OutOfRange { .. })
    ));
    assert!(matches!(
        lossless(Value::Int64(i64::from(i32::MAX) + 1), &FieldKind::Int32),
        Err(CoercionError::OutOfRange { .. })
    ));
    assert_eq!(lossless(Value::Float64(12.0), &FieldKind::Int64).unwrap(), Value::Int64(12));
}

#[test]
fn lossless_rejects_floats_beyond_the_integer_range() {
    for f in [1e20, -1e20, 9_223_372_036_854_775_808.0, f64::INFINITY, f64::NAN] {
        assert!(matches!(
            lossless(Value::Float64(f), &FieldKind::Int64),
            Err(CoercionError::OutOfRange { .. })
        ));
    }
    assert!(matches!(
        lossless(Value::Float32(1e10), &FieldKind::Int32),
        Err(CoercionError::OutOfRange { .. })
    ));
    assert_eq!(lenient(Value::Float64(1e20), &FieldKind::Int64).unwrap(), Value::Int64(i64::MAX));
}

#[test]
fn lossless_integers_refuse_non_numeric_sources() {
    let ulid = Ulid::from_parts(1_700_000_000_000, 7);
    let at = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();

    for value in [Value::Ulid(ulid), Value::Bool(true), Value::Timestamp(at)] {
        assert!(matches!(
            lossless(value, &FieldKind::Int64),
            Err(CoercionError::Unsupported { .. })
        ));
    }
    assert!(lenient(Value::Ulid(ulid), &FieldKind::Int64).is_err());
    assert_eq!(lenient(Value::Bool(true), &FieldKind::Int64).unwrap(), Value::Int64(1));
}

#[test]
fn numeric_text_parses() {
    assert_eq!(lenient(Value::from(" 42 "), &FieldKind::Int64).unwrap(), Value::Int64(42));
    assert_eq!(lenient(Value::from("4.9"), &FieldKind::Int32).unwrap(), Value::Int32(4));
    assert!(matches!(
        lossless(Value::from("4.9"), &FieldKind::Int32),
        Err(CoercionError::Parse { .. })
    ));
    assert_eq!(lenient(Value::from("2.5"), &FieldKind::Float64).unwrap(), Value::Float64(2.5));
}

#[test]
fn booleans_accept_numbers_and_text() {
    assert_eq!(lenient(Value::Int32(0), &FieldKind::Bool).unwrap(), Value::Bool(false));
    assert_eq!(lenient(Value::from("TRUE"), &FieldKind::Bool).unwrap(), Value::Bool(true));
    assert_eq!(lenient(Value::from("1"), &FieldKind::Bool).unwrap(), Value::Bool(true));
    assert_eq!(lenient(Value::from(" 0 "), &FieldKind::Bool).unwrap(), Value::Bool(false));
    assert_eq!(lossless(Value::from("False"), &FieldKind::Bool).unwrap(), Value::Bool(false));
}

#[test]
fn unrecognised_boolean_text_is_rejected() {
    for text in ["yes", "", "2"] {
        assert!(matches!(
            lenient(Value::from(text), &FieldKind::Bool),
            Err(CoercionError::Parse { .. })
        ));
    }
}

// ---- text and dates -------------------------------------------------------

#[test]
fn scalars_render_as_text() {
    let at = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();

    assert_eq!(lenient(Value::Int32(7), &FieldKind::Text).unwrap(), Value::from("7"));
    assert_eq!(lenient(Value::Timestamp(at), &FieldKind::Text).unwrap(), Value::from("20240309"));
}

#[test]
fn date_heuristic_covers_every_shape() {
    assert_eq!(ymd(parse_date_heuristic("20240102").unwrap()), (2024, 1, 2));
    assert_eq!(ymd(parse_date_heuristic("2024-01-02").unwrap()), (2024, 1, 2));
    assert_eq!(ymd(parse_date_heuristic("2024-01-02T23:30:00+00:00").unwrap()), (2024, 1, 2));
    assert_eq!(ymd(parse_date_heuristic("02.01.2024").unwrap()), (2024, 1, 2));
    assert_eq!(
        parse_date_heuristic("1704153600000").unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
    );
}

#[test]
fn unparseable_dates_fail() {
    assert!(matches!(
        parse_date_heuristic("soon"),
        Err(CoercionError::Parse { .. })
    ));
    assert!(parse_date_heuristic("2024-13-45").is_err());
}

#[test]
fn epoch_millis_become_timestamps() {
    let value = lenient(Value::Int64(0), &FieldKind::Timestamp).unwrap();

    assert_eq!(value, Value::Timestamp(DateTime::<Utc>::UNIX_EPOCH));
}

// ---- symbolic and structured ------------------------------------------------

#[test]
fn enum_constants_are_checked_against_declared_variants() {
    let kind = FieldKind::Enum(OrderStatus::enum_ref());

    assert_eq!(
        lenient(Value::from("Shipped"), &kind).unwrap(),
        Value::Enum(ValueEnum::new(OrderStatus::enum_ref().path, "Shipped"))
    );
    assert!(matches!(
        lenient(Value::from("Lost"), &kind),
        Err(CoercionError::UnknownVariant { .. })
    ));
}

#[test]
fn enum_kinds_reject_numbers() {
    let kind = FieldKind::Enum(EnumRef {
        path: "shop::Flag",
        variants: &["On", "Off"],
    });

    assert!(matches!(
        lenient(Value::Int32(1), &kind),
        Err(CoercionError::Unsupported { .. })
    ));
}

#[test]
fn byte_lists_become_blobs() {
    let bytes = Value::List(vec![Value::Int32(1), Value::Int64(255)]);

    assert_eq!(lenient(bytes, &FieldKind::Blob).unwrap(), Value::Blob(vec![1, 255]));
    assert!(lenient(Value::List(vec![Value::Int32(256)]), &FieldKind::Blob).is_err());
}

#[test]
fn list_elements_are_coerced_individually() {
    let kind = FieldKind::List(Box::new(FieldKind::Int64));
    let value = Value::List(vec![Value::Int32(1), Value::from("2")]);

    assert_eq!(
        lenient(value, &kind).unwrap(),
        Value::List(vec![Value::Int64(1), Value::Int64(2)])
    );
}

#[test]
fn objects_coerce_into_references() {
    let customer = Customer {
        id: Some(3),
        name: "Ada".into(),
    };
    let kind = FieldKind::Ref(Customer::mapped_type());

    let Value::Ref(reference) = lenient(Value::object(customer), &kind).unwrap() else {
        panic!("expected a reference");
    };

    assert!(reference.is_resolved());
    assert_eq!(reference.target, Customer::mapped_type());
}

#[test]
fn map_lookup_finds_keys() {
    let map = Value::Map(vec![("a".into(), Value::Int32(1))]);

    assert_eq!(map.map_get("a"), Some(&Value::Int32(1)));
    assert_eq!(map.map_get("b"), None);
    assert_eq!(Value::default(), Value::Null);
}

proptest! {
    #[test]
    fn int32_survives_lossless_widening_and_narrowing(v in any::<i32>()) {
        let wide = lossless(Value::Int32(v), &FieldKind::Int64).unwrap();
        prop_assert_eq!(lossless(wide, &FieldKind::Int32).unwrap(), Value::Int32(v));
    }

    #[test]
    fn integral_text_parses_exactly(v in any::<i64>()) {
        prop_assert_eq!(
            lossless(Value::Text(v.to_string()), &FieldKind::Int64).unwrap(),
            Value::Int64(v)
        );
    }
}
