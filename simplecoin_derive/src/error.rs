//! Derive macro for error types.
//!
//! ```ignore
//! use simplecoin_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum StoreError {
//!     #[error("insufficient funds: available {available}, required {required}")]
//!     InsufficientFunds { available: u64, required: u64 },
//!
//!     #[error("storage backend failure: {0}")]
//!     Backend(String),
//!
//!     #[error("genesis already applied")]
//!     GenesisAlreadyApplied,
//! }
//! ```
//!
//! Tuple fields are referenced positionally (`{0}`), named fields by name.

use proc_macro::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Ident, LitStr, parse_macro_input};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Enum(data) => {
            let arms = data
                .variants
                .iter()
                .map(|variant| {
                    let ident = &variant.ident;
                    let message = message(&variant.attrs, variant)?;
                    Ok(match &variant.fields {
                        Fields::Unit => quote! { Self::#ident => write!(f, #message), },
                        Fields::Unnamed(fields) => {
                            let bindings: Vec<_> = (0..fields.unnamed.len())
                                .map(|i| format_ident!("f{}", i))
                                .collect();
                            let message = positional_to_named(&message, bindings.len());
                            let used = referenced(&message, &bindings);
                            quote! {
                                #[allow(unused_variables)]
                                Self::#ident(#(#bindings),*) =>
                                    write!(f, #message, #(#used = #used),*),
                            }
                        }
                        Fields::Named(fields) => {
                            let idents: Vec<_> =
                                fields.named.iter().filter_map(|field| field.ident.clone()).collect();
                            let used = referenced(&message, &idents);
                            quote! {
                                #[allow(unused_variables)]
                                Self::#ident { #(#idents),* } =>
                                    write!(f, #message, #(#used = #used),*),
                            }
                        }
                    })
                })
                .collect::<syn::Result<Vec<_>>>()?;
            quote! { match self { #(#arms)* } }
        }
        Data::Struct(data) => {
            let message = message(&input.attrs, &input.ident)?;
            match &data.fields {
                Fields::Unit => quote! { write!(f, #message) },
                Fields::Named(fields) => {
                    let idents: Vec<_> =
                        fields.named.iter().filter_map(|field| field.ident.clone()).collect();
                    let used = referenced(&message, &idents);
                    quote! {
                        #[allow(unused_variables)]
                        let Self { #(#idents),* } = self;
                        write!(f, #message, #(#used = #used),*)
                    }
                }
                Fields::Unnamed(fields) => {
                    let bindings: Vec<_> = (0..fields.unnamed.len())
                        .map(|i| format_ident!("f{}", i))
                        .collect();
                    let message = positional_to_named(&message, bindings.len());
                    let used = referenced(&message, &bindings);
                    quote! {
                        #[allow(unused_variables)]
                        let Self(#(#bindings),*) = self;
                        write!(f, #message, #(#used = #used),*)
                    }
                }
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Error derive does not support unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
    })
}

/// Reads the string literal out of `#[error("...")]`.
fn message<T: ToTokens>(attrs: &[Attribute], target: &T) -> syn::Result<String> {
    let attr = attrs
        .iter()
        .find(|attr| attr.path().is_ident("error"))
        .ok_or_else(|| {
            syn::Error::new_spanned(target, "missing #[error(\"...\")] display message")
        })?;
    Ok(attr.parse_args::<LitStr>()?.value())
}

/// Rewrites `{0}`, `{1}` into `{f0}`, `{f1}` so tuple fields can be passed by name.
fn positional_to_named(message: &str, count: usize) -> String {
    (0..count).rev().fold(message.to_string(), |acc, i| {
        acc.replace(&format!("{{{i}}}"), &format!("{{f{i}}}"))
            .replace(&format!("{{{i}:"), &format!("{{f{i}:"))
    })
}

/// Returns the bindings that the message actually interpolates.
///
/// `write!` rejects named arguments that the format string never uses.
fn referenced<'a>(message: &str, bindings: &'a [Ident]) -> Vec<&'a Ident> {
    bindings
        .iter()
        .filter(|binding| {
            let open = format!("{{{binding}");
            message.match_indices(&open).any(|(at, _)| {
                matches!(message[at + open.len()..].chars().next(), Some('}') | Some(':'))
            })
        })
        .collect()
}
