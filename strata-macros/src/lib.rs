mod decode_column;
mod decode_table;
mod from_row_trait;

use decode_table::decode_table;
use from_row_trait::from_row_trait;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

#[proc_macro_derive(Entity, attributes(strata))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let table = decode_table(parse_macro_input!(input as ItemStruct));
    let name = &table.item.ident;
    let table_name = &table.name;
    let origin = &table.origin;
    let from_row = from_row_trait(&table);
    let column_defs = table.mapped().map(|c| {
        let column = &c.name;
        let ty = &c.ty;
        let nullable = c.nullable;
        let primary_key = c.primary_key;
        let default = match &c.default {
            Some(v) => quote!(Some(#v)),
            None => quote!(None),
        };
        quote! {
            ::strata::ColumnDef {
                name: #column,
                value: <#ty as ::strata::AsValue>::as_empty_value(),
                nullable: #nullable,
                primary_key: #primary_key,
                default: #default,
            }
        }
    });
    let unmapped = table
        .columns
        .iter()
        .filter(|c| c.unmapped)
        .map(|c| &c.name);
    let optional = |v: &Option<String>| match v {
        Some(v) => quote!(Some(#v)),
        None => quote!(None),
    };
    let created_at = optional(&table.created_at);
    let updated_at = optional(&table.updated_at);
    let values = table.mapped().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        quote!(<#ty as ::strata::AsValue>::as_value(::std::clone::Clone::clone(&self.#ident)))
    });
    let assignments = table.mapped().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        let column = &c.name;
        quote!(#column => self.#ident = <#ty as ::strata::AsValue>::try_from_value(value)?)
    });
    quote! {
        #from_row
        impl ::strata::Entity for #name {
            fn table() -> &'static ::strata::TableDef {
                static TABLE: ::std::sync::LazyLock<::strata::TableDef> =
                    ::std::sync::LazyLock::new(|| {
                        ::strata::TableDef::new(
                            #table_name,
                            vec![#(#column_defs),*],
                            vec![#(#unmapped),*],
                            #created_at,
                            #updated_at,
                        )
                    });
                &TABLE
            }

            fn row(&self) -> ::strata::Row {
                vec![#(#values),*].into_boxed_slice()
            }

            fn set_value(&mut self, column: &str, value: ::strata::Value) -> ::strata::Result<()> {
                match column {
                    #(#assignments,)*
                    _ => {
                        return Err(::strata::Error::msg(format!(
                            "Entity `{}` has no column `{}`",
                            ::std::stringify!(#name),
                            column
                        )));
                    }
                }
                Ok(())
            }

            fn origin_ref(&self) -> &::strata::Origin {
                &self.#origin
            }

            fn origin_mut(&mut self) -> &mut ::strata::Origin {
                &mut self.#origin
            }
        }
    }
    .into()
}
