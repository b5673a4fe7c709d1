//! Mapped types shared by the unit tests.

use crate::{traits::MappedObject, types::Ref, value::Value};
use chrono::{DateTime, Utc};
use docmap_derive::{Mapped, MappedEnum, MappedInterface};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// OrderStatus
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, MappedEnum)]
pub enum OrderStatus {
    #[default]
    Pending,
    Shipped,
    Cancelled,
}

///
/// Order
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity, creation_time)]
pub struct Order {
    #[mapped(id)]
    pub id: Option<i64>,
    pub customer_name: String,
    pub total: f64,
    pub status: OrderStatus,
    #[mapped(creation_time)]
    pub created_at: Option<i64>,
}

///
/// VerifiedOrder
/// Creation time survives re-saves because the type asks for a re-read.
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity, creation_time(verify_new), last_change)]
pub struct VerifiedOrder {
    #[mapped(id)]
    pub id: Option<i64>,
    #[mapped(creation_time(format = "%Y-%m-%d"))]
    pub created_on: String,
    #[mapped(creation_time)]
    pub created_at: Option<DateTime<Utc>>,
    #[mapped(last_change)]
    pub changed_at: Option<i64>,
}

///
/// MisformattedStamp
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity, creation_time)]
pub struct MisformattedStamp {
    #[mapped(id)]
    pub id: Option<i64>,
    #[mapped(creation_time(format = "%Q"))]
    pub created_on: String,
}

///
/// TextStamp
/// Text creation field formatted with the configured default.
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity, creation_time)]
pub struct TextStamp {
    #[mapped(id)]
    pub id: Option<i64>,
    #[mapped(creation_time)]
    pub created_on: String,
}

///
/// AuditedEntry
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity, last_access)]
pub struct AuditedEntry {
    #[mapped(id)]
    pub id: Option<String>,
    pub message: String,
    #[mapped(last_access)]
    pub seen_at: Option<f64>,
}

///
/// ShipmentLog
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity(collection = "ShipmentLOG"))]
pub struct ShipmentLog {
    #[mapped(id)]
    pub id: Option<i64>,
    pub lines: Vec<String>,
}

///
/// CamelEntity
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity(case = "camel"))]
pub struct CamelEntity {
    #[mapped(id)]
    pub id: Option<i64>,
    pub first_name: String,
}

///
/// TenantRecord
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity(name_provider = "tenant"))]
pub struct TenantRecord {
    #[mapped(id)]
    pub id: Option<i64>,
}

///
/// Address
///

#[derive(Clone, Debug, Default, PartialEq, Mapped)]
#[mapped(embedded)]
pub struct Address {
    pub street: String,
    pub city: String,
}

///
/// Customer
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity)]
pub struct Customer {
    #[mapped(id)]
    pub id: Option<i64>,
    pub name: String,
}

///
/// Product
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity)]
pub struct Product {
    #[mapped(id)]
    pub id: Option<String>,
    pub title: String,
}

///
/// Invoice
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity)]
pub struct Invoice {
    #[mapped(id)]
    pub id: Option<i64>,
    #[mapped(reference(auto_store))]
    pub customer: Option<Ref<Customer>>,
    #[mapped(reference(lazy))]
    pub products: Vec<Ref<Product>>,
    pub billing: Address,
    pub status: OrderStatus,
}

///
/// TreeNode
///

#[derive(Clone, Debug, Default, PartialEq, Mapped)]
#[mapped(embedded)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
}

///
/// Parcel
/// Untyped and polymorphic payloads.
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity)]
pub struct Parcel {
    #[mapped(id)]
    pub id: Option<i64>,
    pub payload: Option<Box<dyn MappedObject>>,
    pub anything: Value,
    pub tags: BTreeMap<String, i32>,
}

///
/// Contact
/// Field naming and access-direction markers.
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity)]
pub struct Contact {
    #[mapped(id)]
    pub id: Option<i64>,
    #[mapped(name = "mail", alias = "email_address", alias = "eMail")]
    pub email: String,
    pub phone_number: String,
    #[mapped(write_only)]
    pub password_hash: String,
    #[mapped(read_only)]
    pub display_name: String,
    #[mapped(transient)]
    pub session: String,
    #[mapped(use_if_null)]
    pub nickname: Option<String>,
}

///
/// CrossNamed
/// Names claimed by more than one field.
///

#[derive(Clone, Debug, Default, PartialEq, Mapped)]
#[mapped(embedded)]
pub struct CrossNamed {
    #[mapped(alias = "fooBar")]
    pub legacy: String,
    pub foo_bar: String,
    #[mapped(name = "code")]
    pub sku: String,
    #[mapped(alias = "code", alias = "sku")]
    pub label: String,
}

///
/// Profile
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity)]
pub struct Profile {
    #[mapped(id)]
    pub id: Option<String>,
    pub name: String,
    #[mapped(dynamic)]
    pub extra: BTreeMap<String, Value>,
}

///
/// Journal
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(
    entity,
    lifecycle,
    hook(event = "pre_store", method = "before_store"),
    hook(event = "post_load", method = "after_load")
)]
pub struct Journal {
    #[mapped(id)]
    pub id: Option<i64>,
    pub title: String,
    pub stored: i32,
    #[mapped(transient)]
    pub loads: i32,
}

impl Journal {
    fn before_store(&mut self) {
        self.stored += 1;
    }

    fn after_load(&mut self) {
        self.loads += 1;
    }
}

///
/// Auditable
///

#[derive(MappedInterface)]
#[mapped(entity(polymorphic), last_change)]
pub struct Auditable;

///
/// Ledger
/// Entity through an implemented interface.
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(implements(Auditable))]
pub struct Ledger {
    #[mapped(id)]
    pub id: Option<i64>,
    pub balance: i64,
    #[mapped(last_change)]
    pub changed_at: Option<i64>,
}

///
/// Animal
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity(polymorphic), lifecycle, hook(event = "pre_store", method = "stamp"))]
pub struct Animal {
    #[mapped(id)]
    pub id: Option<i64>,
    pub name: String,
    pub stamped: bool,
}

impl Animal {
    fn stamp(&mut self) {
        self.stamped = true;
    }
}

///
/// Dog
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity(polymorphic))]
pub struct Dog {
    #[mapped(parent)]
    pub base: Animal,
    pub good_boy: bool,
}

///
/// LoudDog
/// Redeclares the pre-store hook with another method.
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity, hook(event = "pre_store", method = "bark"))]
pub struct LoudDog {
    #[mapped(parent)]
    pub base: Animal,
}

impl LoudDog {
    fn bark(&mut self) {}
}

///
/// NoId
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity)]
pub struct NoId {
    pub label: String,
}

///
/// Unmarked
///

#[derive(Clone, Debug, PartialEq, Mapped)]
pub struct Unmarked {
    pub label: String,
}

///
/// GeoPoint
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, Mapped)]
#[mapped(opaque)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

///
/// Site
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity)]
pub struct Site {
    #[mapped(id)]
    pub id: Option<i64>,
    pub location: GeoPoint,
}
