use crate::{
    doc,
    document::{DocValue, Document, ENVELOPE_DATA_KEY, LEGACY_TYPE_TAG_KEY, TYPE_TAG_KEY},
    error::ErrorClass,
    value::Value,
};
use chrono::{TimeZone, Utc};

#[test]
fn insert_replaces_in_place() {
    let mut doc = doc! { "a" => 1, "b" => 2 };

    let previous = doc.insert("a", 3);

    assert_eq!(previous, Some(DocValue::Int32(1)));
    assert_eq!(doc.keys().collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(doc.get("a"), Some(&DocValue::Int32(3)));
}

#[test]
fn remove_and_retain() {
    let mut doc = doc! { "a" => 1, "b" => 2, "c" => 3 };

    assert_eq!(doc.remove("b"), Some(DocValue::Int32(2)));
    doc.retain(|key| key != "c");

    assert_eq!(doc.len(), 1);
    assert!(doc.contains_key("a"));
}

#[test]
fn both_type_tag_spellings_are_read() {
    let current = doc! { TYPE_TAG_KEY => "shop::Cart" };
    let legacy = doc! { LEGACY_TYPE_TAG_KEY => "shop::Cart" };

    assert_eq!(current.type_tag(), Some("shop::Cart"));
    assert_eq!(legacy.type_tag(), Some("shop::Cart"));
    assert!(Document::is_type_tag_key(LEGACY_TYPE_TAG_KEY));
}

#[test]
fn envelopes_need_a_tag_and_a_binary_payload() {
    let envelope = doc! {
        TYPE_TAG_KEY => "shop::Blob",
        ENVELOPE_DATA_KEY => DocValue::Binary(vec![1, 2]),
    };
    let not_binary = doc! {
        TYPE_TAG_KEY => "shop::Blob",
        ENVELOPE_DATA_KEY => "text",
    };

    assert!(envelope.is_envelope());
    assert!(!not_binary.is_envelope());
}

#[test]
fn order_insensitive_equality_recurses() {
    let a = doc! { "x" => 1, "inner" => doc! { "p" => true, "q" => false } };
    let b = doc! { "inner" => doc! { "q" => false, "p" => true }, "x" => 1 };

    assert_ne!(a, b);
    assert!(a.eq_ignoring_order(&b));
    assert!(!a.eq_ignoring_order(&doc! { "x" => 1 }));
}

#[test]
fn json_numbers_pick_the_narrowest_integer() {
    let doc = Document::from_json(r#"{"small": 7, "big": 5000000000, "frac": 1.5, "none": null}"#).unwrap();

    assert_eq!(doc.get("small"), Some(&DocValue::Int32(7)));
    assert_eq!(doc.get("big"), Some(&DocValue::Int64(5_000_000_000)));
    assert_eq!(doc.get("frac"), Some(&DocValue::Double(1.5)));
    assert_eq!(doc.get("none"), Some(&DocValue::Null));
}

#[test]
fn json_must_be_an_object() {
    let err = Document::from_json("[1, 2]").unwrap_err();
    assert_eq!(err.class, ErrorClass::Deserialization);

    let err = Document::from_json("{").unwrap_err();
    assert_eq!(err.class, ErrorClass::Deserialization);
}

#[test]
fn json_rendering_keeps_key_order() {
    let doc = doc! { "b" => 1, "a" => vec![DocValue::Bool(true), DocValue::Null] };

    assert_eq!(doc.to_json().unwrap(), r#"{"b":1,"a":[true,null]}"#);
}

#[test]
fn scalars_convert_to_wire_values() {
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

    assert_eq!(DocValue::from_scalar(&Value::Float32(1.5)), Some(DocValue::Double(1.5)));
    assert_eq!(
        DocValue::from_scalar(&Value::Calendar(at.fixed_offset())),
        Some(DocValue::DateTime(at))
    );
    assert_eq!(DocValue::from_scalar(&Value::List(vec![])), None);
}

#[test]
fn plain_values_mirror_the_document_shape() {
    let doc = doc! { "n" => 1, "items" => vec![DocValue::from("a")] };

    assert_eq!(
        DocValue::Document(doc).to_plain_value(),
        Value::Map(vec![
            ("n".into(), Value::Int32(1)),
            ("items".into(), Value::List(vec![Value::from("a")])),
        ])
    );
}
