use darling::{
    FromDeriveInput, FromField, FromMeta, FromVariant,
    ast::Data,
    util::{Flag, Override, PathList},
};
use syn::{Generics, Ident, Type};

///
/// TypeArgs
///
/// Type-level `#[mapped(...)]` arguments shared by `Mapped` and
/// `MappedInterface`.
///

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(mapped), supports(struct_named, struct_unit))]
pub struct TypeArgs {
    pub ident: Ident,
    pub generics: Generics,
    pub data: Data<(), FieldArgs>,

    #[darling(default)]
    pub entity: Option<Override<EntityArgs>>,

    #[darling(default)]
    pub embedded: Option<Override<EmbeddedArgs>>,

    #[darling(default)]
    pub lifecycle: Flag,

    #[darling(default)]
    pub creation_time: Option<Override<CreationArgs>>,

    #[darling(default)]
    pub last_change: Flag,

    #[darling(default)]
    pub last_access: Flag,

    #[darling(multiple, rename = "hook")]
    pub hooks: Vec<HookArgs>,

    #[darling(default)]
    pub implements: PathList,

    #[darling(default)]
    pub opaque: Flag,
}

impl TypeArgs {
    pub fn fields(&self) -> Vec<&FieldArgs> {
        self.data
            .as_ref()
            .take_struct()
            .map(|fields| fields.fields)
            .unwrap_or_default()
    }
}

///
/// EntityArgs
///

#[derive(Clone, Debug, Default, FromMeta)]
#[darling(default)]
pub struct EntityArgs {
    pub collection: Option<String>,
    pub polymorphic: Flag,
    pub case: Option<String>,
    pub name_strategy: Option<String>,
    pub name_provider: Option<String>,
}

///
/// EmbeddedArgs
///

#[derive(Clone, Debug, Default, FromMeta)]
#[darling(default)]
pub struct EmbeddedArgs {
    pub polymorphic: Flag,
    pub case: Option<String>,
}

///
/// CreationArgs
///

#[derive(Clone, Debug, Default, FromMeta)]
#[darling(default)]
pub struct CreationArgs {
    pub verify_new: Flag,
}

///
/// HookArgs
///

#[derive(Clone, Debug, FromMeta)]
pub struct HookArgs {
    pub event: String,
    pub method: Ident,
}

///
/// FieldArgs
///

#[derive(Debug, FromField)]
#[darling(attributes(mapped))]
pub struct FieldArgs {
    pub ident: Option<Ident>,
    pub ty: Type,

    #[darling(default)]
    pub id: Flag,

    #[darling(default)]
    pub name: Option<String>,

    #[darling(default)]
    pub reference: Option<Override<ReferenceArgs>>,

    #[darling(default)]
    pub transient: Flag,

    #[darling(default)]
    pub write_only: Flag,

    #[darling(default)]
    pub read_only: Flag,

    #[darling(multiple, rename = "alias")]
    pub aliases: Vec<String>,

    #[darling(default)]
    pub dynamic: Option<Override<DynamicArgs>>,

    #[darling(default)]
    pub creation_time: Option<Override<FormatArgs>>,

    #[darling(default)]
    pub last_change: Option<Override<FormatArgs>>,

    #[darling(default)]
    pub last_access: Option<Override<FormatArgs>>,

    #[darling(default)]
    pub use_if_null: Flag,

    #[darling(default)]
    pub parent: Flag,
}

///
/// ReferenceArgs
///

#[derive(Clone, Debug, Default, FromMeta)]
#[darling(default)]
pub struct ReferenceArgs {
    pub lazy: Flag,
    pub auto_store: Flag,
    pub name: Option<String>,
}

///
/// DynamicArgs
///

#[derive(Clone, Debug, Default, FromMeta)]
#[darling(default)]
pub struct DynamicArgs {
    pub read_only: Flag,
}

///
/// FormatArgs
///

#[derive(Clone, Debug, Default, FromMeta)]
#[darling(default)]
pub struct FormatArgs {
    pub format: Option<String>,
}

///
/// EnumArgs
///

#[derive(Debug, FromDeriveInput)]
#[darling(supports(enum_unit))]
pub struct EnumArgs {
    pub ident: Ident,
    pub generics: Generics,
    pub data: Data<VariantArgs, ()>,
}

#[derive(Debug, FromVariant)]
pub struct VariantArgs {
    pub ident: Ident,
}
