use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{Expr, Field, Ident, LitStr, Type, parse::ParseBuffer};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) nullable: bool,
    pub(crate) primary_key: bool,
    pub(crate) unmapped: bool,
    pub(crate) origin: bool,
    /// Expression of type `fn(OffsetDateTime) -> Value`.
    pub(crate) default: Option<TokenStream>,
}

/// Last path segment of `ty`, when it is a plain path.
pub(crate) fn type_name(ty: &Type) -> Option<String> {
    let Type::Path(path) = ty else {
        return None;
    };
    path.path.segments.last().map(|v| v.ident.to_string())
}

pub fn decode_column(field: &Field) -> ColumnMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Entity fields are expected to have a name");
    let ty = field.ty.clone();
    let type_name = type_name(&ty);
    let mut metadata = ColumnMetadata {
        name: ident.to_string(),
        ident,
        nullable: type_name.as_deref() == Some("Option"),
        origin: type_name.as_deref() == Some("Origin"),
        ty,
        primary_key: false,
        unmapped: false,
        default: None,
    };
    if metadata.name.starts_with('_') {
        metadata.name.remove(0);
    }
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("strata") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `strata`, use it like: `#[strata(attribute = value, ..)]`");
        };
        let ty = &metadata.ty;
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("name") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `name`, use it like: `#[strata(name = \"my_column\")]`");
                };
                metadata.name = v.value();
            } else if arg.path.is_ident("primary_key") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `primary_key`, use it like: `#[strata(primary_key)]`");
                };
                metadata.primary_key = true;
            } else if arg.path.is_ident("unmapped") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `unmapped`, use it like: `#[strata(unmapped)]`");
                };
                metadata.unmapped = true;
            } else if arg.path.is_ident("default") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Expr>) else {
                    panic!("Error while parsing `default`, use it like: `#[strata(default = some_expression)]`");
                };
                metadata.default = Some(quote! {
                    (|_: ::strata::time::OffsetDateTime| {
                        <#ty as ::strata::AsValue>::as_value(::std::convert::Into::into(#v))
                    }) as ::strata::DefaultFn
                });
            } else if arg.path.is_ident("default_now") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `default_now`, use it like: `#[strata(default_now)]`");
                };
                metadata.default = Some(quote! {
                    (|now: ::strata::time::OffsetDateTime| ::strata::timestamp_value(
                        &<#ty as ::strata::AsValue>::as_empty_value(),
                        now,
                    )) as ::strata::DefaultFn
                });
            } else {
                panic!(
                    "Unknown attribute `{}` inside strata macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    metadata
}
