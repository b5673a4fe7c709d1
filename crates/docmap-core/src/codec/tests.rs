use crate::{
    codec::Codec,
    config::MapperConfig,
    doc,
    document::{DocValue, Document, ENUM_NAME_KEY, ENVELOPE_DATA_KEY, LEGACY_TYPE_TAG_KEY, TYPE_TAG_KEY},
    error::ErrorClass,
    test_fixtures::{
        Address, Animal, AuditedEntry, CamelEntity, Contact, Dog, GeoPoint, Journal, Ledger, Order,
        OrderStatus, Parcel, Profile, Site, TreeNode, Unmarked,
    },
    traits::{Mapped, MappedObject, Path},
    types::PartialUpdate,
    value::{Value, ValueEnum},
};
use std::collections::BTreeMap;
use ulid::Ulid;

// ---- helpers -----------------------------------------------------------

fn codec() -> Codec {
    Codec::new(MapperConfig::default())
}

fn order(id: Option<i64>) -> Order {
    Order {
        id,
        customer_name: "Ada".into(),
        total: 12.5,
        status: OrderStatus::Shipped,
        created_at: None,
    }
}

fn dog() -> Dog {
    Dog {
        base: Animal {
            id: Some(7),
            name: "Rex".into(),
            stamped: false,
        },
        good_boy: true,
    }
}

fn contact() -> Contact {
    Contact {
        id: Some(1),
        email: "a@b.c".into(),
        phone_number: "555".into(),
        password_hash: "x1".into(),
        display_name: "Ada L.".into(),
        session: "tmp".into(),
        nickname: None,
    }
}

fn chain(depth: usize) -> TreeNode {
    (0..depth).fold(TreeNode::default(), |child, i| TreeNode {
        label: format!("n{i}"),
        children: vec![child],
    })
}

// ---- layout --------------------------------------------------------------

#[test]
fn entities_write_declared_fields_in_order() {
    let doc = codec().marshall(&mut order(Some(3))).unwrap();

    assert_eq!(
        doc,
        doc! {
            "_id" => 3i64,
            "customer_name" => "Ada",
            "total" => 12.5,
            "status" => "Shipped",
        }
    );
}

#[test]
fn entities_round_trip() {
    let codec = codec();
    let original = order(Some(3));

    let doc = codec.marshall(&mut original.clone()).unwrap();
    let back: Order = codec.unmarshall(&doc).unwrap();

    assert_eq!(back, original);
}

#[test]
fn marshalling_twice_yields_equal_documents() {
    let codec = codec();
    let mut contact = contact();

    let first = codec.marshall(&mut contact).unwrap();
    let second = codec.marshall(&mut contact).unwrap();

    assert_eq!(first, second);
}

#[test]
fn camel_entities_write_camel_keys() {
    let mut entity = CamelEntity {
        id: Some(1),
        first_name: "Ada".into(),
    };

    let doc = codec().marshall(&mut entity).unwrap();

    assert!(doc.contains_key("firstName"));
}

#[test]
fn access_direction_markers_are_honoured() {
    let codec = codec();
    let doc = codec.marshall(&mut contact()).unwrap();

    assert_eq!(doc.get("mail"), Some(&DocValue::from("a@b.c")));
    assert_eq!(doc.get("password_hash"), Some(&DocValue::from("x1")));
    assert_eq!(doc.get("nickname"), Some(&DocValue::Null));
    assert!(!doc.contains_key("display_name"));
    assert!(!doc.contains_key("session"));

    let stored = doc! {
        "_id" => 1i64,
        "mail" => "a@b.c",
        "password_hash" => "x1",
        "display_name" => "Shown",
        "session" => "ignored",
    };
    let back: Contact = codec.unmarshall(&stored).unwrap();

    assert_eq!(back.password_hash, "");
    assert_eq!(back.display_name, "Shown");
    assert_eq!(back.session, "");
}

#[test]
fn aliases_are_read_when_the_physical_name_is_absent() {
    let stored = doc! { "_id" => 1i64, "eMail" => "old@b.c" };

    let back: Contact = codec().unmarshall(&stored).unwrap();

    assert_eq!(back.email, "old@b.c");
}

#[test]
fn null_and_absent_values_keep_defaults() {
    let stored = doc! { "_id" => 2i64, "customer_name" => DocValue::Null };

    let back: Order = codec().unmarshall(&stored).unwrap();

    assert_eq!(back.customer_name, "");
    assert_eq!(back.status, OrderStatus::Pending);
}

#[test]
fn identifiers_are_coerced_losslessly_on_read() {
    let codec = codec();

    let back: Order = codec.unmarshall(&doc! { "_id" => "12" }).unwrap();
    assert_eq!(back.id, Some(12));

    let err = codec.unmarshall::<Order>(&doc! { "_id" => 1.5 }).unwrap_err();
    assert_eq!(err.class, ErrorClass::Coercion);
}

#[test]
fn identifiers_never_truncate_on_read() {
    let codec = codec();
    let object_id = DocValue::ObjectId(Ulid::from_parts(1_700_000_000_000, 1));

    for stored in [object_id, DocValue::Double(1e20), DocValue::Bool(true)] {
        let err = codec.unmarshall::<Order>(&doc! { "_id" => stored }).unwrap_err();
        assert_eq!(err.class, ErrorClass::Coercion);
    }
}

#[test]
fn unknown_enum_constants_fail() {
    let err = codec()
        .unmarshall::<Order>(&doc! { "_id" => 1i64, "status" => "Lost" })
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::Coercion);
}

// ---- polymorphism --------------------------------------------------------

#[test]
fn polymorphic_entities_carry_their_type_tag() {
    let doc = codec().marshall(&mut dog()).unwrap();

    assert_eq!(doc.type_tag(), Some(Dog::PATH));
    assert_eq!(
        doc.keys().collect::<Vec<_>>(),
        [TYPE_TAG_KEY, "good_boy", "_id", "name", "stamped"]
    );
}

#[test]
fn type_tags_select_the_concrete_type() {
    let codec = codec();
    let doc = codec.marshall(&mut dog()).unwrap();

    let object = codec.unmarshall_dyn(Animal::mapped_type(), &doc).unwrap();

    assert_eq!(object.type_ref(), Dog::mapped_type());
    assert_eq!(object.as_any().downcast_ref::<Dog>(), Some(&dog()));
}

#[test]
fn unregistered_type_tags_fail() {
    let doc = doc! { TYPE_TAG_KEY => "elsewhere::Cat", "_id" => 1i64 };

    let err = codec().unmarshall_dyn(Animal::mapped_type(), &doc).unwrap_err();

    assert_eq!(err.class, ErrorClass::Deserialization);
}

#[test]
fn legacy_tag_key_is_accepted() {
    let codec = codec();
    codec.register::<Dog>();
    let doc = doc! {
        LEGACY_TYPE_TAG_KEY => Dog::PATH,
        "_id" => 7i64,
        "name" => "Rex",
        "good_boy" => true,
    };

    let object = codec.unmarshall_dyn(Animal::mapped_type(), &doc).unwrap();

    assert_eq!(object.type_ref(), Dog::mapped_type());
}

#[test]
fn untyped_values_read_back_without_registration() {
    let codec = codec();
    let mut parcel = Parcel {
        id: Some(2),
        payload: Some(Box::new(Address {
            street: "Elm".into(),
            city: "Shelbyville".into(),
        })),
        anything: Value::object(chain(1)),
        tags: BTreeMap::new(),
    };

    let doc = codec.marshall(&mut parcel).unwrap();
    let back: Parcel = codec.unmarshall(&doc).unwrap();

    assert_eq!(back, parcel);
    assert!(codec.registry().resolve(Address::PATH).is_some());
    assert!(codec.registry().resolve(TreeNode::PATH).is_some());
}

#[test]
fn interface_entities_are_tagged() {
    let mut ledger = Ledger {
        id: Some(1),
        balance: 10,
        changed_at: None,
    };

    let doc = codec().marshall(&mut ledger).unwrap();

    assert_eq!(doc.type_tag(), Some(Ledger::PATH));
}

#[test]
fn untyped_positions_keep_type_information() {
    let codec = codec();
    codec.register::<Address>();
    let mut parcel = Parcel {
        id: Some(1),
        payload: Some(Box::new(Address {
            street: "Main".into(),
            city: "Springfield".into(),
        })),
        anything: Value::Enum(ValueEnum::new(OrderStatus::PATH, "Shipped")),
        tags: BTreeMap::from([("a".to_string(), 1)]),
    };

    let doc = codec.marshall(&mut parcel).unwrap();
    let payload = doc.get("payload").and_then(DocValue::as_document).unwrap();
    let anything = doc.get("anything").and_then(DocValue::as_document).unwrap();

    assert_eq!(payload.type_tag(), Some(Address::PATH));
    assert_eq!(anything.get(ENUM_NAME_KEY), Some(&DocValue::from("Shipped")));

    let back: Parcel = codec.unmarshall(&doc).unwrap();
    assert_eq!(back, parcel);
}

#[test]
fn map_keys_with_dots_are_rewritten() {
    let mut parcel = Parcel {
        id: Some(1),
        payload: None,
        anything: Value::Null,
        tags: BTreeMap::from([("a.b".to_string(), 1)]),
    };

    let doc = codec().marshall(&mut parcel).unwrap();

    assert_eq!(doc.get("tags"), Some(&DocValue::Document(doc! { "a_b" => 1 })));
}

// ---- extra data ------------------------------------------------------------

#[test]
fn extra_data_is_merged_without_shadowing() {
    let codec = codec();
    let mut profile = Profile {
        id: Some("p1".into()),
        name: "Ada".into(),
        extra: BTreeMap::from([
            ("color".to_string(), Value::from("red")),
            ("name".to_string(), Value::from("shadow")),
        ]),
    };

    let doc = codec.marshall(&mut profile).unwrap();

    assert_eq!(doc.get("name"), Some(&DocValue::from("Ada")));
    assert_eq!(doc.get("color"), Some(&DocValue::from("red")));
    assert!(!doc.contains_key("extra"));

    let back: Profile = codec.unmarshall(&doc).unwrap();
    assert_eq!(back.extra.len(), 1);
    assert_eq!(back.extra.get("color"), Some(&Value::from("red")));
}

// ---- opaque envelope --------------------------------------------------------

#[test]
fn opaque_types_use_the_binary_envelope() {
    let codec = Codec::new(MapperConfig {
        object_serialization: true,
        ..MapperConfig::default()
    });
    let mut site = Site {
        id: Some(1),
        location: GeoPoint { lat: 52.5, lon: 13.4 },
    };

    let doc = codec.marshall(&mut site).unwrap();
    let location = doc.get("location").and_then(DocValue::as_document).unwrap();

    assert!(location.is_envelope());
    assert!(matches!(location.get(ENVELOPE_DATA_KEY), Some(DocValue::Binary(_))));

    let back: Site = codec.unmarshall(&doc).unwrap();
    assert_eq!(back, site);
}

#[test]
fn opaque_types_are_not_mappable_without_serialization() {
    let mut site = Site {
        id: Some(1),
        location: GeoPoint::default(),
    };

    let err = codec().marshall(&mut site).unwrap_err();

    assert_eq!(err.class, ErrorClass::NotMappable);
}

#[test]
fn unmarked_types_fail_both_ways() {
    let codec = codec();
    let mut unmarked = Unmarked {
        label: "x".into(),
    };

    let err = codec.marshall(&mut unmarked).unwrap_err();
    assert_eq!(err.class, ErrorClass::NotMappable);

    let err = codec.unmarshall::<Unmarked>(&Document::new()).unwrap_err();
    assert_eq!(err.class, ErrorClass::Deserialization);
}

// ---- guards ----------------------------------------------------------------

#[test]
fn nesting_beyond_the_limit_is_rejected() {
    let codec = Codec::new(MapperConfig {
        max_depth: 3,
        ..MapperConfig::default()
    });

    assert!(codec.marshall(&mut chain(2)).is_ok());

    let err = codec.marshall(&mut chain(5)).unwrap_err();
    assert_eq!(err.class, ErrorClass::InvariantViolation);
}

#[test]
fn nested_trees_round_trip() {
    let codec = codec();
    let tree = chain(4);

    let doc = codec.marshall(&mut tree.clone()).unwrap();
    let back: TreeNode = codec.unmarshall(&doc).unwrap();

    assert_eq!(back, tree);
}

// ---- lifecycle and auto values ------------------------------------------------

#[test]
fn post_load_runs_for_every_decoded_object() {
    let back: Journal = codec()
        .unmarshall(&doc! { "_id" => 1i64, "title" => "Log", "stored" => 2 })
        .unwrap();

    assert_eq!(back.loads, 1);
    assert_eq!(back.stored, 2);
}

#[test]
fn reading_touches_last_access() {
    let back: AuditedEntry = codec()
        .unmarshall(&doc! { "_id" => "e1", "message" => "hi" })
        .unwrap();

    assert!(back.seen_at.is_some());
}

// ---- partial updates and json ---------------------------------------------------

#[test]
fn partial_updates_keep_only_changed_fields() {
    let mut update = PartialUpdate::new(order(Some(4)));
    update.set("total", 20.0_f64).unwrap();

    let doc = codec().marshall_partial(&mut update).unwrap();

    assert_eq!(doc, doc! { "_id" => 4i64, "total" => 20.0 });
}

#[test]
fn json_documents_are_accepted() {
    let back: Order = codec()
        .unmarshall_json(r#"{"_id": 9, "customer_name": "Lin", "total": 3, "status": "Cancelled"}"#)
        .unwrap();

    assert_eq!(back.id, Some(9));
    assert_eq!(back.customer_name, "Lin");
    assert!((back.total - 3.0).abs() < f64::EPSILON);
    assert_eq!(back.status, OrderStatus::Cancelled);
}

#[test]
fn boxed_objects_marshall_through_the_dyn_entry_point() {
    let mut boxed: Box<dyn MappedObject> = Box::new(order(Some(1)));

    let doc = codec().marshall(boxed.as_mut()).unwrap();

    assert_eq!(doc.get("_id"), Some(&DocValue::Int64(1)));
}
