use crate::{
    attrs::{FieldArgs, TypeArgs},
    markers,
};
use darling::{Error, FromDeriveInput};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Ident};

// derive_mapped
pub fn derive_mapped(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };
    let args = match TypeArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(err) => return err.write_errors(),
    };

    let expanded = if args.opaque.is_present() {
        expand_opaque(&args)
    } else {
        expand(&args)
    };

    expanded.unwrap_or_else(Error::write_errors)
}

fn reject_generics(args: &TypeArgs) -> darling::Result<()> {
    if args.generics.params.is_empty() {
        Ok(())
    } else {
        Err(Error::custom("mapped types cannot be generic").with_span(&args.generics))
    }
}

fn path_impl(ident: &Ident) -> TokenStream {
    let name = ident.to_string();

    quote! {
        impl ::docmap::traits::Path for #ident {
            const PATH: &'static str = concat!(module_path!(), "::", #name);
        }
    }
}

fn field_value_impl(ident: &Ident) -> TokenStream {
    quote! {
        impl ::docmap::traits::FieldValue for #ident {
            fn kind() -> ::docmap::model::FieldKind {
                ::docmap::model::FieldKind::Object(<Self as ::docmap::traits::Mapped>::mapped_type())
            }

            fn to_value(&self) -> ::docmap::value::Value {
                ::docmap::value::Value::Object(::docmap::value::ObjectValue::new(
                    ::core::clone::Clone::clone(self),
                ))
            }

            fn from_value(
                value: ::docmap::value::Value,
            ) -> ::core::result::Result<Self, ::docmap::value::CoercionError> {
                ::docmap::traits::object_from_value(value)
            }
        }
    }
}

fn expand(args: &TypeArgs) -> darling::Result<TokenStream> {
    reject_generics(args)?;
    let ident = &args.ident;
    let name = ident.to_string();

    let fields = args.fields();
    let parents: Vec<&FieldArgs> = fields.iter().copied().filter(|f| f.parent.is_present()).collect();
    if parents.len() > 1 {
        return Err(Error::custom("at most one field can be the parent").with_span(&parents[1].ty));
    }
    let parent = parents.first().copied();
    let own: Vec<&FieldArgs> = fields.iter().copied().filter(|f| !f.parent.is_present()).collect();

    let type_markers = markers::type_markers(args)?;
    let interfaces = markers::interfaces(args);
    let hooks = markers::hooks(args)?;

    // accessors
    let own_idents: Vec<&Ident> = own.iter().filter_map(|f| f.ident.as_ref()).collect();
    let own_names: Vec<String> = own_idents.iter().map(ToString::to_string).collect();

    let (get_fallback, set_fallback, hook_fallback) = match parent.and_then(|p| p.ident.as_ref()) {
        Some(p) => (
            quote!(::docmap::traits::Reflect::get_field(&self.#p, field)),
            quote!(::docmap::traits::Reflect::set_field(&mut self.#p, field, value)),
            quote!(::docmap::traits::Reflect::invoke_hook(&mut self.#p, method)),
        ),
        None => (
            quote!(::core::option::Option::None),
            quote! {{
                let _ = value;
                ::core::result::Result::Err(::docmap::error::FieldError::UnknownField {
                    path: <Self as ::docmap::traits::Path>::PATH,
                    field: field.to_string(),
                })
            }},
            quote!(false),
        ),
    };

    let mut hook_methods: Vec<&Ident> = Vec::new();
    for hook in &args.hooks {
        if !hook_methods.contains(&&hook.method) {
            hook_methods.push(&hook.method);
        }
    }
    let hook_names: Vec<String> = hook_methods.iter().map(ToString::to_string).collect();

    // declaration
    let field_decls = own.iter().map(|field| {
        let ty = &field.ty;
        let name = field.ident.as_ref().map(ToString::to_string).unwrap_or_default();
        let field_markers = markers::field_markers(field);

        quote! {{
            let mut field = ::docmap::model::FieldDecl::new(
                #name,
                <#ty as ::docmap::traits::FieldValue>::kind(),
            );
            field.markers = vec![#(#field_markers),*];
            field
        }}
    });
    let parent_decl = match parent {
        Some(p) => {
            let ty = &p.ty;
            quote!(::core::option::Option::Some(::std::boxed::Box::new(
                <#ty as ::docmap::traits::Mapped>::declaration()
            )))
        }
        None => quote!(::core::option::Option::None),
    };

    // allocation
    let inits = fields.iter().filter_map(|field| {
        let member = field.ident.as_ref()?;
        let ty = &field.ty;
        Some(if field.parent.is_present() {
            quote!(#member: <#ty as ::docmap::traits::Mapped>::instantiate())
        } else {
            quote!(#member: ::core::default::Default::default())
        })
    });

    let path_impl = path_impl(ident);
    let field_value_impl = field_value_impl(ident);

    Ok(quote! {
        #path_impl

        impl ::docmap::traits::Reflect for #ident {
            fn type_ref(&self) -> ::docmap::model::TypeRef {
                <Self as ::docmap::traits::Mapped>::mapped_type()
            }

            fn get_field(&self, field: &str) -> ::core::option::Option<::docmap::value::Value> {
                match field {
                    #( #own_names => ::core::option::Option::Some(
                        ::docmap::traits::FieldValue::to_value(&self.#own_idents)
                    ), )*
                    _ => #get_fallback,
                }
            }

            fn set_field(
                &mut self,
                field: &str,
                value: ::docmap::value::Value,
            ) -> ::core::result::Result<(), ::docmap::error::FieldError> {
                match field {
                    #( #own_names => {
                        self.#own_idents = ::docmap::traits::FieldValue::from_value(value).map_err(|source| {
                            ::docmap::error::FieldError::Rejected {
                                field: field.to_string(),
                                source,
                            }
                        })?;
                        ::core::result::Result::Ok(())
                    } )*
                    _ => #set_fallback,
                }
            }

            fn invoke_hook(&mut self, method: &str) -> bool {
                match method {
                    #( #hook_names => {
                        self.#hook_methods();
                        true
                    } )*
                    _ => #hook_fallback,
                }
            }
        }

        impl ::docmap::traits::Mapped for #ident {
            fn declaration() -> ::docmap::model::TypeDecl {
                let mut decl = ::docmap::model::TypeDecl::new(
                    <Self as ::docmap::traits::Path>::PATH,
                    #name,
                );
                decl.markers = vec![#(#type_markers),*];
                decl.parent = #parent_decl;
                decl.interfaces = vec![#(#interfaces),*];
                decl.fields = vec![#(#field_decls),*];
                decl.hooks = vec![#(#hooks),*];
                decl
            }

            fn instantiate() -> Self {
                Self {
                    #(#inits,)*
                }
            }
        }

        #field_value_impl
    })
}

// Types without entity or embedded markers, written as a binary envelope
// when object serialization is enabled.
fn expand_opaque(args: &TypeArgs) -> darling::Result<TokenStream> {
    reject_generics(args)?;
    if args.entity.is_some() || args.embedded.is_some() {
        return Err(Error::custom("opaque types cannot be entities or embedded").with_span(&args.ident));
    }
    let ident = &args.ident;
    let name = ident.to_string();
    let interfaces = markers::interfaces(args);

    let path_impl = path_impl(ident);
    let field_value_impl = field_value_impl(ident);

    Ok(quote! {
        #path_impl

        impl ::docmap::traits::Reflect for #ident {
            fn type_ref(&self) -> ::docmap::model::TypeRef {
                <Self as ::docmap::traits::Mapped>::mapped_type()
            }

            fn get_field(&self, _field: &str) -> ::core::option::Option<::docmap::value::Value> {
                ::core::option::Option::None
            }

            fn set_field(
                &mut self,
                field: &str,
                _value: ::docmap::value::Value,
            ) -> ::core::result::Result<(), ::docmap::error::FieldError> {
                ::core::result::Result::Err(::docmap::error::FieldError::UnknownField {
                    path: <Self as ::docmap::traits::Path>::PATH,
                    field: field.to_string(),
                })
            }

            fn invoke_hook(&mut self, _method: &str) -> bool {
                false
            }

            fn encode_opaque(
                &self,
            ) -> ::core::option::Option<
                ::core::result::Result<::std::vec::Vec<u8>, ::docmap::serialize::SerializeError>,
            > {
                ::core::option::Option::Some(::docmap::serialize::serialize(self))
            }
        }

        impl ::docmap::traits::Mapped for #ident {
            fn declaration() -> ::docmap::model::TypeDecl {
                let mut decl = ::docmap::model::TypeDecl::new(
                    <Self as ::docmap::traits::Path>::PATH,
                    #name,
                );
                decl.interfaces = vec![#(#interfaces),*];
                decl.opaque = true;
                decl
            }

            fn instantiate() -> Self {
                ::core::default::Default::default()
            }

            fn decode_opaque(
                bytes: &[u8],
            ) -> ::core::option::Option<::core::result::Result<Self, ::docmap::serialize::SerializeError>> {
                ::core::option::Option::Some(::docmap::serialize::deserialize(bytes))
            }
        }

        #field_value_impl
    })
}
