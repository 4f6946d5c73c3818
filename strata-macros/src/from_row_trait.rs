use crate::decode_table::TableMetadata;
use proc_macro2::TokenStream;
use quote::quote;

pub(crate) fn from_row_trait(table: &TableMetadata) -> TokenStream {
    let item = &table.item;
    let struct_name = &item.ident;
    let origin = &table.origin;
    let fields = table.columns.iter().map(|c| {
        let ident = &c.ident;
        if c.unmapped {
            return quote!(#ident: ::std::default::Default::default());
        }
        let ty = &c.ty;
        let name = &c.name;
        quote! {
            #ident: <#ty as ::strata::AsValue>::try_from_value(row.take_column(#name))
                .map_err(|e| e.context(format!(
                    "While decoding column `{}` of `{}`",
                    #name,
                    ::std::stringify!(#struct_name),
                )))?
        }
    });
    quote! {
        impl ::strata::FromRow for #struct_name {
            fn declared_type(column: &str) -> Option<&'static ::strata::Value> {
                <Self as ::strata::Entity>::table()
                    .column(column)
                    .map(|c| &c.value)
            }

            fn from_row(mut row: ::strata::RowLabeled) -> ::strata::Result<Self> {
                Ok(Self {
                    #(#fields,)*
                    #origin: ::std::default::Default::default(),
                })
            }

            fn hydrated(&mut self) {
                ::strata::Entity::snapshot(self);
            }
        }
    }
}
