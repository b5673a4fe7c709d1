#![allow(dead_code)]

use docmap::{
    naming::{NameProvider, NameRequest},
    prelude::*,
};
use std::collections::BTreeMap;

///
/// Genre
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, MappedEnum)]
pub enum Genre {
    #[default]
    Fiction,
    Poetry,
    Reference,
}

///
/// Author
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity, creation_time)]
pub struct Author {
    #[mapped(id)]
    pub id: Option<i64>,
    pub name: String,
    #[mapped(creation_time)]
    pub joined_at: Option<i64>,
}

impl Author {
    pub fn named(name: &str) -> Self {
        Self {
            id: None,
            name: name.into(),
            joined_at: None,
        }
    }
}

///
/// Tag
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity)]
pub struct Tag {
    #[mapped(id)]
    pub id: Option<String>,
    pub label: String,
}

///
/// Book
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity)]
pub struct Book {
    #[mapped(id)]
    pub id: Option<i64>,
    pub title: String,
    pub genre: Genre,
    #[mapped(reference(auto_store))]
    pub author: Option<Ref<Author>>,
    #[mapped(reference)]
    pub editor: Option<Ref<Author>>,
    #[mapped(reference(lazy))]
    pub tags: Vec<Ref<Tag>>,
}

impl Book {
    pub fn titled(title: &str) -> Self {
        Self {
            id: None,
            title: title.into(),
            genre: Genre::Fiction,
            author: None,
            editor: None,
            tags: Vec::new(),
        }
    }
}

///
/// Chapter
///

#[derive(Clone, Debug, Default, PartialEq, Mapped)]
#[mapped(embedded)]
pub struct Chapter {
    pub heading: String,
    pub pages: i32,
}

///
/// Manuscript
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity(case = "camel"))]
pub struct Manuscript {
    #[mapped(id)]
    pub id: Option<String>,
    pub working_title: String,
    pub chapters: Vec<Chapter>,
    pub notes: BTreeMap<String, String>,
    #[mapped(dynamic)]
    pub extra: BTreeMap<String, Value>,
}

///
/// Publication
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity(polymorphic), lifecycle, hook(event = "post_load", method = "loaded"))]
pub struct Publication {
    #[mapped(id)]
    pub id: Option<i64>,
    pub title: String,
    #[mapped(transient)]
    pub load_count: i32,
}

impl Publication {
    fn loaded(&mut self) {
        self.load_count += 1;
    }
}

///
/// Magazine
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity(polymorphic))]
pub struct Magazine {
    #[mapped(parent)]
    pub base: Publication,
    pub issue: i32,
}

///
/// Shelf
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity)]
pub struct Shelf {
    #[mapped(id)]
    pub id: Option<i64>,
    pub featured: Option<Box<dyn MappedObject>>,
}

///
/// Coordinates
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, Mapped)]
#[serde(crate = "docmap::__reexports::serde")]
#[mapped(opaque)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

///
/// Library
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity(name_provider = "tenant"))]
pub struct Library {
    #[mapped(id)]
    pub id: Option<i64>,
    pub position: Coordinates,
}

///
/// Archive
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity(name_strategy = "fully_qualified"))]
pub struct Archive {
    #[mapped(id)]
    pub id: Option<i64>,
}

///
/// Prefixed
/// Name provider that prepends a tenant prefix to the simple name.
///

pub struct Prefixed(pub &'static str);

impl NameProvider for Prefixed {
    fn collection_name(&self, request: &NameRequest) -> String {
        format!("{}_{}", self.0, request.name.to_lowercase())
    }
}

///
/// Review
///

#[derive(Clone, Debug, PartialEq, Mapped)]
#[mapped(entity)]
pub struct Review {
    #[mapped(id)]
    pub id: Option<i64>,
    #[mapped(reference(lazy))]
    pub book: Option<Ref<Book>>,
    pub stars: i32,
}
