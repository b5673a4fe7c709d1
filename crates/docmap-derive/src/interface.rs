use crate::{attrs::TypeArgs, markers};
use darling::{Error, FromDeriveInput};
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

// derive_mapped_interface
pub fn derive_mapped_interface(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };
    let args = match TypeArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(err) => return err.write_errors(),
    };

    expand(&args).unwrap_or_else(Error::write_errors)
}

fn expand(args: &TypeArgs) -> darling::Result<TokenStream> {
    let ident = &args.ident;
    if !args.fields().is_empty() {
        return Err(Error::custom("marker interfaces carry no fields").with_span(ident));
    }
    if !args.hooks.is_empty() || args.opaque.is_present() {
        return Err(Error::custom("marker interfaces carry type markers only").with_span(ident));
    }

    let name = ident.to_string();
    let type_markers = markers::type_markers(args)?;
    let interfaces = markers::interfaces(args);

    Ok(quote! {
        impl ::docmap::traits::MappedInterface for #ident {
            fn declaration() -> ::docmap::model::TypeDecl {
                let mut decl = ::docmap::model::TypeDecl::new(
                    concat!(module_path!(), "::", #name),
                    #name,
                );
                decl.markers = vec![#(#type_markers),*];
                decl.interfaces = vec![#(#interfaces),*];
                decl
            }
        }
    })
}
