use proc_macro::TokenStream;

mod attrs;
mod interface;
mod mapped;
mod mapped_enum;
mod markers;

#[proc_macro_derive(Mapped, attributes(mapped))]
pub fn derive_mapped(input: TokenStream) -> TokenStream {
    mapped::derive_mapped(input.into()).into()
}

#[proc_macro_derive(MappedEnum)]
pub fn derive_mapped_enum(input: TokenStream) -> TokenStream {
    mapped_enum::derive_mapped_enum(input.into()).into()
}

#[proc_macro_derive(MappedInterface, attributes(mapped))]
pub fn derive_mapped_interface(input: TokenStream) -> TokenStream {
    interface::derive_mapped_interface(input.into()).into()
}
