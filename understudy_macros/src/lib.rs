//! Procedural macros for `understudy`. Use them through the re-exports of
//! that crate.

#![forbid(unsafe_code)]

use proc_macro::TokenStream;

mod double;

/// Derives a capability and a double type for a trait. Documented on the
/// re-export in `understudy`.
#[proc_macro_attribute]
pub fn double(attr: TokenStream, input: TokenStream) -> TokenStream {
    let mut args = double::Attr::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    syn::parse_macro_input!(attr with parser);
    let item_trait = syn::parse_macro_input!(input as syn::ItemTrait);

    match double::generate(args, item_trait) {
        Ok(stream) => stream.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
