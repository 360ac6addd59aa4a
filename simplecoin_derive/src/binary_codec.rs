//! Derive macro for the canonical binary codec.
//!
//! Fields are written in declaration order using the `Encode`/`Decode`
//! impls of their types, so the layout of a derived struct is fully
//! determined by its definition. Ledger transactions are hashed and signed
//! over this layout: reordering fields is a consensus-breaking change.
//!
//! Only structs are supported. Ledger types carry no enums on the wire, and
//! refusing them keeps the discriminant format out of the consensus surface.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Index, parse_macro_input};

pub fn derive_binary_codec(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let data = match &input.data {
        Data::Struct(data) => data,
        _ => {
            return syn::Error::new_spanned(&input, "BinaryCodec can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let (encode_body, decode_body) = match &data.fields {
        Fields::Named(fields) => {
            let idents: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
            (
                quote! {
                    #( crate::types::encoding::Encode::encode(&self.#idents, out); )*
                },
                quote! {
                    Ok(Self {
                        #( #idents: crate::types::encoding::Decode::decode(input)?, )*
                    })
                },
            )
        }
        Fields::Unnamed(fields) => {
            let indices: Vec<_> = (0..fields.unnamed.len()).map(Index::from).collect();
            let decoders = indices
                .iter()
                .map(|_| quote! { crate::types::encoding::Decode::decode(input)?, });
            (
                quote! {
                    #( crate::types::encoding::Encode::encode(&self.#indices, out); )*
                },
                quote! { Ok(Self( #(#decoders)* )) },
            )
        }
        Fields::Unit => (quote! { let _ = out; }, quote! { let _ = input; Ok(Self) }),
    };

    let expanded = quote! {
        impl #impl_generics crate::types::encoding::Encode for #name #ty_generics #where_clause {
            fn encode<S: crate::types::encoding::EncodeSink>(&self, out: &mut S) {
                #encode_body
            }
        }

        impl #impl_generics crate::types::encoding::Decode for #name #ty_generics #where_clause {
            fn decode(
                input: &mut &[u8],
            ) -> ::std::result::Result<Self, crate::types::encoding::DecodeError> {
                #decode_body
            }
        }
    };

    TokenStream::from(expanded)
}
