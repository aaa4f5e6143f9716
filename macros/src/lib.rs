use proc_macro::TokenStream;
use quote::quote;
use syn::{
  parse::{Parse, ParseStream},
  parse_macro_input, Ident, ItemFn, LitStr,
};

const USAGE: &str = "expected #[event_subject_macro::test], #[event_subject_macro::test(current)] \
                     or #[event_subject_macro::test(shared)]";

/// Runtime requested for an async test.
enum Flavor {
  /// No argument given: tokio's default single-threaded runtime.
  Default,
  Current,
  Shared,
}

impl Parse for Flavor {
  fn parse(input: ParseStream) -> syn::Result<Self> {
    if input.is_empty() {
      return Ok(Flavor::Default);
    }
    let (name, span) = if input.peek(LitStr) {
      let lit: LitStr = input.parse()?;
      (lit.value(), lit.span())
    } else {
      let ident: Ident = input.parse()?;
      (ident.to_string(), ident.span())
    };
    if !input.is_empty() {
      return Err(input.error(USAGE));
    }
    match name.as_str() {
      "current" => Ok(Flavor::Current),
      "shared" => Ok(Flavor::Shared),
      _ => Err(syn::Error::new(span, USAGE)),
    }
  }
}

impl Flavor {
  fn tokio_args(&self) -> proc_macro2::TokenStream {
    match self {
      Flavor::Default => quote!(),
      Flavor::Current => quote!(flavor = "current_thread"),
      Flavor::Shared => quote!(flavor = "multi_thread", worker_threads = 2),
    }
  }
}

/// Marks a test that runs natively and on wasm32.
///
/// Sync functions become plain `#[test]`s. Async functions run on tokio,
/// `current` or `shared` picks a current-thread or a two-worker runtime.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let flavor = parse_macro_input!(attr as Flavor);
  let input = parse_macro_input!(item as ItemFn);

  if input.sig.asyncness.is_none() {
    if !matches!(flavor, Flavor::Default) {
      let message = "runtime flavours only apply to async tests";
      return syn::Error::new_spanned(&input.sig.ident, message)
        .to_compile_error()
        .into();
    }
    return quote! {
      #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
      #[cfg_attr(not(target_arch = "wasm32"), test)]
      #input
    }
    .into();
  }

  let tokio_args = flavor.tokio_args();
  quote! {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test(async))]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test(#tokio_args))]
    #input
  }
  .into()
}
