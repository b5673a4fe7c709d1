use crate::attrs::{FieldArgs, TypeArgs};
use darling::{Error, util::Override};
use proc_macro2::TokenStream;
use quote::quote;

/// `Some("..")` or `None` for an optional string literal.
pub fn opt_str(value: Option<&str>) -> TokenStream {
    match value {
        Some(s) => quote!(::core::option::Option::Some(#s)),
        None => quote!(::core::option::Option::None),
    }
}

fn case(value: Option<&str>) -> darling::Result<TokenStream> {
    let variant = match value {
        None => return Ok(quote!(::core::option::Option::None)),
        Some("none") => quote!(None),
        Some("snake") => quote!(Snake),
        Some("camel") => quote!(Camel),
        Some(other) => return Err(Error::unknown_value(other)),
    };

    Ok(quote!(::core::option::Option::Some(::docmap::model::CaseTranslation::#variant)))
}

fn lifecycle_event(event: &str) -> Option<TokenStream> {
    let variant = match event {
        "pre_store" => quote!(PreStore),
        "post_store" => quote!(PostStore),
        "post_load" => quote!(PostLoad),
        "pre_remove" => quote!(PreRemove),
        "post_remove" => quote!(PostRemove),
        "pre_update" => quote!(PreUpdate),
        "post_update" => quote!(PostUpdate),
        _ => return None,
    };

    Some(quote!(::docmap::model::LifecycleEvent::#variant))
}

/// `TypeMarker` expressions for the type-level arguments.
pub fn type_markers(args: &TypeArgs) -> darling::Result<Vec<TokenStream>> {
    let mut markers = Vec::new();

    if let Some(entity) = &args.entity {
        let entity = entity.clone().unwrap_or_default();
        let collection = opt_str(entity.collection.as_deref());
        let polymorphic = entity.polymorphic.is_present();
        let case = case(entity.case.as_deref())?;
        let strategy = match (entity.name_strategy.as_deref(), entity.name_provider.as_deref()) {
            (_, Some(provider)) => quote!(::docmap::model::NameStrategy::Provider(#provider)),
            (Some("fully_qualified"), None) => quote!(::docmap::model::NameStrategy::FullyQualified),
            (Some("simple") | None, None) => quote!(::docmap::model::NameStrategy::Simple),
            (Some(other), None) => return Err(Error::unknown_value(other)),
        };

        markers.push(quote! {
            ::docmap::model::TypeMarker::Entity(::docmap::model::EntityMarker {
                collection: #collection,
                polymorphic: #polymorphic,
                case: #case,
                name_strategy: #strategy,
            })
        });
    }

    if let Some(embedded) = &args.embedded {
        let embedded = embedded.clone().unwrap_or_default();
        let polymorphic = embedded.polymorphic.is_present();
        let case = case(embedded.case.as_deref())?;

        markers.push(quote! {
            ::docmap::model::TypeMarker::Embedded(::docmap::model::EmbeddedMarker {
                polymorphic: #polymorphic,
                case: #case,
            })
        });
    }

    if args.lifecycle.is_present() {
        markers.push(quote!(::docmap::model::TypeMarker::Lifecycle));
    }
    if let Some(creation) = &args.creation_time {
        let verify_new = creation.clone().unwrap_or_default().verify_new.is_present();
        markers.push(quote!(::docmap::model::TypeMarker::CreationTime { verify_new: #verify_new }));
    }
    if args.last_change.is_present() {
        markers.push(quote!(::docmap::model::TypeMarker::LastChange));
    }
    if args.last_access.is_present() {
        markers.push(quote!(::docmap::model::TypeMarker::LastAccess));
    }

    Ok(markers)
}

/// Declarations of the listed marker interfaces.
pub fn interfaces(args: &TypeArgs) -> Vec<TokenStream> {
    args.implements
        .iter()
        .map(|path| quote!(<#path as ::docmap::traits::MappedInterface>::declaration()))
        .collect()
}

/// `HookDecl` expressions for the `hook(...)` arguments.
pub fn hooks(args: &TypeArgs) -> darling::Result<Vec<TokenStream>> {
    let mut errors = Error::accumulator();
    let mut hooks = Vec::new();

    for hook in &args.hooks {
        let method = hook.method.to_string();
        match lifecycle_event(&hook.event) {
            Some(event) => hooks.push(quote! {
                ::docmap::model::HookDecl { event: #event, method: #method }
            }),
            None => errors.push(Error::unknown_value(&hook.event).with_span(&hook.method)),
        }
    }

    errors.finish_with(hooks)
}

/// `FieldMarker` expressions for one field.
pub fn field_markers(field: &FieldArgs) -> Vec<TokenStream> {
    let mut markers = Vec::new();
    let flag = |present: bool, marker: TokenStream, markers: &mut Vec<TokenStream>| {
        if present {
            markers.push(marker);
        }
    };

    flag(field.id.is_present(), quote!(::docmap::model::FieldMarker::Identifier), &mut markers);
    if let Some(name) = &field.name {
        markers.push(quote!(::docmap::model::FieldMarker::PhysicalName(#name)));
    }
    if let Some(reference) = &field.reference {
        let reference = reference.clone().unwrap_or_default();
        let lazy = reference.lazy.is_present();
        let auto_store = reference.auto_store.is_present();
        let name = opt_str(reference.name.as_deref());
        markers.push(quote! {
            ::docmap::model::FieldMarker::Reference(::docmap::model::ReferenceMarker {
                lazy: #lazy,
                auto_store: #auto_store,
                physical_name: #name,
            })
        });
    }
    flag(field.transient.is_present(), quote!(::docmap::model::FieldMarker::Transient), &mut markers);
    flag(field.write_only.is_present(), quote!(::docmap::model::FieldMarker::WriteOnly), &mut markers);
    flag(field.read_only.is_present(), quote!(::docmap::model::FieldMarker::ReadOnly), &mut markers);
    if !field.aliases.is_empty() {
        let aliases = &field.aliases;
        markers.push(quote!(::docmap::model::FieldMarker::Aliases(&[#(#aliases),*])));
    }
    if let Some(dynamic) = &field.dynamic {
        let read_only = dynamic.clone().unwrap_or_default().read_only.is_present();
        markers.push(quote!(::docmap::model::FieldMarker::DynamicData { read_only: #read_only }));
    }

    for (arg, variant) in [
        (&field.creation_time, quote!(CreationTime)),
        (&field.last_change, quote!(LastChange)),
        (&field.last_access, quote!(LastAccess)),
    ] {
        if let Some(arg) = arg {
            let format = match arg {
                Override::Inherit => opt_str(None),
                Override::Explicit(args) => opt_str(args.format.as_deref()),
            };
            markers.push(quote!(::docmap::model::FieldMarker::#variant { format: #format }));
        }
    }
    flag(field.use_if_null.is_present(), quote!(::docmap::model::FieldMarker::UseIfNull), &mut markers);

    markers
}
