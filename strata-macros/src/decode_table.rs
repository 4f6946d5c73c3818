use crate::decode_column::{ColumnMetadata, decode_column};
use convert_case::{Case, Casing};
use quote::ToTokens;
use syn::{
    Error, Expr, ExprLit, Ident, ItemStruct, Lit, LitStr, Result, parse::ParseBuffer,
    spanned::Spanned,
};

pub(crate) struct TableMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) name: String,
    /// Every field except the origin, in declaration order.
    pub(crate) columns: Vec<ColumnMetadata>,
    pub(crate) origin: Ident,
    pub(crate) created_at: Option<String>,
    pub(crate) updated_at: Option<String>,
}

impl TableMetadata {
    pub(crate) fn mapped(&self) -> impl Iterator<Item = &ColumnMetadata> + Clone {
        self.columns.iter().filter(|c| !c.unmapped)
    }
}

fn decode_column_names(value: Expr) -> Result<Vec<String>> {
    match value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(v), ..
        }) => Ok(vec![v.value()]),
        Expr::Tuple(tuple) => tuple
            .elems
            .into_iter()
            .map(|v| match v {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(v), ..
                }) => Ok(v.value()),
                v => Err(Error::new(v.span(), "Expected a string literal column name")),
            })
            .collect(),
        v => Err(Error::new(
            v.span(),
            "Expected a column name or a tuple of column names",
        )),
    }
}

/// Lowercase singular of the type name, the prefix of an inferred key.
pub(crate) fn singular(name: &str) -> String {
    let name = name.to_case(Case::Snake);
    if let Some(stem) = name.strip_suffix("ies") {
        format!("{stem}y")
    } else if name.ends_with("ss") {
        name
    } else if let Some(stem) = name.strip_suffix('s') {
        stem.to_string()
    } else {
        name
    }
}

pub fn decode_table(item: ItemStruct) -> TableMetadata {
    let mut columns: Vec<_> = item.fields.iter().map(decode_column).collect();
    let mut name = item.ident.to_string().to_case(Case::Snake);
    let mut primary_key = Vec::new();
    let mut created_at = None;
    let mut updated_at = None;
    if name.starts_with('_') {
        name.remove(0);
    }
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("strata") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `strata`, use it like: `#[strata(attribute = value, ..)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("name") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `name`, use it like: `#[strata(name = \"my_table\")]`");
                };
                name = value.value();
            } else if arg.path.is_ident("primary_key") {
                let Ok(value) = arg
                    .value()
                    .and_then(ParseBuffer::parse::<Expr>)
                    .and_then(decode_column_names)
                else {
                    panic!("Error while parsing `primary_key`, use it like: `#[strata(primary_key = (\"k1\", \"k2\", ..))]`");
                };
                if !primary_key.is_empty() {
                    panic!("Primary key attribute can appear just once on an entity");
                }
                primary_key = value;
            } else if arg.path.is_ident("created_at") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `created_at`, use it like: `#[strata(created_at = \"inserted_on\")]`");
                };
                created_at = Some(value.value());
            } else if arg.path.is_ident("updated_at") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `updated_at`, use it like: `#[strata(updated_at = \"modified_on\")]`");
                };
                updated_at = Some(value.value());
            } else {
                panic!(
                    "Unknown attribute `{}` inside strata macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }

    let mut origins = columns.iter().filter(|c| c.origin);
    let origin = match (origins.next(), origins.next()) {
        (Some(v), None) => v.ident.clone(),
        (None, _) => panic!(
            "Entity `{}` needs one field of type `strata::Origin`",
            item.ident
        ),
        _ => panic!(
            "Entity `{}` has more than one field of type `strata::Origin`",
            item.ident
        ),
    };
    columns.retain(|c| !c.origin);

    let declared = columns.iter().any(|c| c.primary_key);
    if !primary_key.is_empty() {
        if declared {
            panic!(
                "Entity `{}` declares the primary key both on the struct and on its fields",
                item.ident
            );
        }
        for key in &primary_key {
            let Some(column) = columns.iter_mut().find(|c| c.name == *key && !c.unmapped) else {
                panic!("Primary key column `{}` does not exist in the entity", key);
            };
            column.primary_key = true;
        }
    } else if !declared {
        let inferred = format!("{}_id", singular(&item.ident.to_string()));
        if let Some(column) = [inferred.as_str(), "id"].into_iter().find_map(|key| {
            columns
                .iter()
                .position(|c| !c.unmapped && c.name == key)
        }) {
            columns[column].primary_key = true;
        }
    }

    let well_known = |value: Option<String>, default: &str| {
        let value = value.or_else(|| {
            columns
                .iter()
                .any(|c| !c.unmapped && c.name == default)
                .then(|| default.to_string())
        })?;
        if !columns.iter().any(|c| !c.unmapped && c.name == value) {
            panic!("Timestamp column `{}` does not exist in the entity", value);
        }
        Some(value)
    };
    let created_at = well_known(created_at, "created_at");
    let updated_at = well_known(updated_at, "updated_at");

    TableMetadata {
        item,
        name,
        columns,
        origin,
        created_at,
        updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::singular;

    #[test]
    fn singular_of_type_names() {
        assert_eq!(singular("User"), "user");
        assert_eq!(singular("Categories"), "category");
        assert_eq!(singular("OrderItems"), "order_item");
        assert_eq!(singular("Address"), "address");
    }
}
