use crate::attrs::EnumArgs;
use darling::{Error, FromDeriveInput};
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

// derive_mapped_enum
pub fn derive_mapped_enum(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };
    let args = match EnumArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(err) => return err.write_errors(),
    };

    expand(&args).unwrap_or_else(Error::write_errors)
}

fn expand(args: &EnumArgs) -> darling::Result<TokenStream> {
    if !args.generics.params.is_empty() {
        return Err(Error::custom("mapped enums cannot be generic").with_span(&args.generics));
    }
    let ident = &args.ident;
    let name = ident.to_string();

    let variants: Vec<_> = args
        .data
        .as_ref()
        .take_enum()
        .unwrap_or_default()
        .into_iter()
        .map(|v| &v.ident)
        .collect();
    if variants.is_empty() {
        return Err(Error::custom("mapped enums need at least one variant").with_span(ident));
    }
    let labels: Vec<String> = variants.iter().map(ToString::to_string).collect();

    Ok(quote! {
        impl ::docmap::traits::Path for #ident {
            const PATH: &'static str = concat!(module_path!(), "::", #name);
        }

        impl ::docmap::traits::MappedEnum for #ident {
            const VARIANTS: &'static [&'static str] = &[#(#labels),*];

            fn variant(&self) -> &'static str {
                match self {
                    #( Self::#variants => #labels, )*
                }
            }

            fn from_variant(name: &str) -> ::core::option::Option<Self> {
                match name {
                    #( #labels => ::core::option::Option::Some(Self::#variants), )*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl ::docmap::traits::FieldValue for #ident {
            fn kind() -> ::docmap::model::FieldKind {
                ::docmap::model::FieldKind::Enum(<Self as ::docmap::traits::MappedEnum>::enum_ref())
            }

            fn to_value(&self) -> ::docmap::value::Value {
                ::docmap::traits::enum_to_value(self)
            }

            fn from_value(
                value: ::docmap::value::Value,
            ) -> ::core::result::Result<Self, ::docmap::value::CoercionError> {
                ::docmap::traits::enum_from_value(value)
            }
        }
    })
}
