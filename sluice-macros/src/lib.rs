mod decode_record;

use decode_record::decode_record;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Implements `sluice::Record`, the structural metadata the registry turns into a model.
///
/// ```ignore
/// #[derive(Default, Record)]
/// #[sluice(table_name = "users")]
/// struct User {
///     #[sluice(column = "user_id")]
///     id: i64,
///     name: String,
/// }
/// ```
#[proc_macro_derive(Record, attributes(sluice))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemStruct);
    let metadata = match decode_record(&item) {
        Ok(v) => v,
        Err(e) => return e.to_compile_error().into(),
    };
    let ident = &item.ident;
    let type_name = ident.to_string();
    let table_name = match &metadata.table_name {
        Some(v) => quote!(Some(#v)),
        None => quote!(None),
    };
    let fields = metadata.fields.iter().map(|field| {
        let member = &field.ident;
        let ty = &field.ty;
        let name = &field.name;
        let tag = match &field.tag {
            Some(v) => quote!(Some(#v)),
            None => quote!(None),
        };
        quote! {
            ::sluice::FieldShape::new::<#ty>(
                #name,
                #tag,
                ::core::mem::offset_of!(#ident, #member),
            )
        }
    });
    quote! {
        impl ::sluice::Record for #ident {
            fn shape() -> ::sluice::RecordShape {
                ::sluice::RecordShape {
                    type_name: #type_name,
                    table_name: #table_name,
                    // Offsets and types come from the struct definition itself.
                    fields: unsafe { ::std::vec![#(#fields),*] },
                }
            }
        }
    }
    .into()
}
