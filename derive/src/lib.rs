use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_metadata;

#[proc_macro_derive(FromMetadata, attributes(entry))]
pub fn derive_from_metadata(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match from_metadata::expand_from_metadata(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error().into(),
    }
}
