//! Derive macros for slate-sql table definitions.
//!
//! This crate provides the `#[derive(Table)]` macro, which turns a plain
//! struct into a schema entry that can be registered with
//! `SchemaRegistry::builder().register::<...>()`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, GenericArgument, Ident, Lit,
    LitStr, Meta, PathArguments, Type,
};

/// Derives `slate_sql_core::schema::Table` for a struct.
///
/// # Attributes
///
/// - `#[table(name = "table_name")]` - Specifies the SQL table name (optional,
///   defaults to snake_case of struct name)
///
/// # Field Attributes
///
/// - `#[column(name = "columnName")]` - Specifies the SQL column name
///   (optional, defaults to field name)
/// - `#[column(type = "date")]` - Overrides the inferred column type
///   (`number`, `string`, `date` or `boolean`)
/// - `#[column(skip)]` - Leaves the field out of the table
///
/// Column types are inferred from the field type: integers and floats are
/// `number`, `String` and `&str` are `string`, `bool` is `boolean`, chrono's
/// `NaiveDate`, `NaiveDateTime` and `DateTime<_>` are `date`. `Option<T>`
/// uses the type of `T`.
///
/// # Generated Items
///
/// For a struct `User`, this macro generates:
///
/// - `UserTable` - A type implementing `Table` with the table metadata
/// - Column name accessors on `UserTable` and `User` (`UserTable::email()`)
#[proc_macro_derive(Table, attributes(table, column))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_table_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_table_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let table_name = get_table_name(&input.attrs, struct_name)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Table derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Table derive only supports structs",
            ));
        }
    };

    let mut column_infos: Vec<ColumnInfo> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let column_attrs = parse_column_attrs(&field.attrs)?;
        if column_attrs.skip {
            continue;
        }

        let column_name = column_attrs
            .name
            .unwrap_or_else(|| field_name.to_string());
        if column_infos.iter().any(|c| c.column_name == column_name) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate column name '{column_name}'"),
            ));
        }

        let column_type = match column_attrs.column_type {
            Some(lit) => column_type_from_name(&lit)?,
            None => column_type_of(&field.ty)?,
        };

        column_infos.push(ColumnInfo {
            field_name: field_name.clone(),
            column_name,
            column_type,
        });
    }

    let table_struct_name = format_ident!("{}Table", struct_name);

    let column_entries: Vec<TokenStream2> = column_infos
        .iter()
        .map(|info| {
            let column_name = &info.column_name;
            let variant = format_ident!("{}", info.column_type.variant());
            quote! {
                (#column_name, ::slate_sql_core::schema::ColumnType::#variant)
            }
        })
        .collect();

    let column_accessors: Vec<TokenStream2> = column_infos
        .iter()
        .map(|info| {
            let method_name = &info.field_name;
            let column_name = &info.column_name;
            quote! {
                /// Returns the SQL column name.
                #[inline]
                #[must_use]
                pub const fn #method_name() -> &'static str {
                    #column_name
                }
            }
        })
        .collect();

    let expanded = quote! {
        #[doc = concat!("Table metadata for `", stringify!(#struct_name), "`.")]
        #[derive(Debug, Clone, Copy)]
        pub struct #table_struct_name;

        impl ::slate_sql_core::schema::Table for #table_struct_name {
            const NAME: &'static str = #table_name;
            const COLUMNS: &'static [(&'static str, ::slate_sql_core::schema::ColumnType)] = &[
                #(#column_entries),*
            ];
        }

        impl #table_struct_name {
            /// Returns the table name.
            #[inline]
            #[must_use]
            pub const fn table_name() -> &'static str {
                #table_name
            }

            #(#column_accessors)*
        }

        impl #struct_name {
            /// Returns the table metadata type.
            #[must_use]
            pub const fn table() -> #table_struct_name {
                #table_struct_name
            }

            #(#column_accessors)*
        }
    };

    Ok(expanded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Number,
    String,
    Date,
    Boolean,
}

impl ColumnKind {
    const fn variant(self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::String => "String",
            Self::Date => "Date",
            Self::Boolean => "Boolean",
        }
    }
}

struct ColumnInfo {
    field_name: Ident,
    column_name: String,
    column_type: ColumnKind,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    column_type: Option<LitStr>,
    skip: bool,
}

fn column_type_from_name(lit: &LitStr) -> syn::Result<ColumnKind> {
    match lit.value().as_str() {
        "number" => Ok(ColumnKind::Number),
        "string" => Ok(ColumnKind::String),
        "date" => Ok(ColumnKind::Date),
        "boolean" => Ok(ColumnKind::Boolean),
        other => Err(syn::Error::new_spanned(
            lit,
            format!("unknown column type '{other}', expected number, string, date or boolean"),
        )),
    }
}

fn column_type_of(ty: &Type) -> syn::Result<ColumnKind> {
    let unsupported = || {
        syn::Error::new_spanned(
            ty,
            "cannot infer a column type, use #[column(type = \"...\")]",
        )
    };

    match ty {
        Type::Reference(reference) => column_type_of(&reference.elem),
        Type::Path(path) => {
            let segment = path.path.segments.last().ok_or_else(unsupported)?;
            let ident = segment.ident.to_string();
            match ident.as_str() {
                "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32"
                | "u64" | "u128" | "usize" | "f32" | "f64" => Ok(ColumnKind::Number),
                "String" | "str" => Ok(ColumnKind::String),
                "bool" => Ok(ColumnKind::Boolean),
                "NaiveDate" | "NaiveDateTime" | "DateTime" => Ok(ColumnKind::Date),
                "Option" => match &segment.arguments {
                    PathArguments::AngleBracketed(args) => match args.args.first() {
                        Some(GenericArgument::Type(inner)) => column_type_of(inner),
                        _ => Err(unsupported()),
                    },
                    _ => Err(unsupported()),
                },
                _ => Err(unsupported()),
            }
        }
        _ => Err(unsupported()),
    }
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("table") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: Expr = meta.value()?.parse()?;
                    if let Expr::Lit(lit) = value {
                        if let Lit::Str(s) = lit.lit {
                            table_name = Some(s.value());
                        }
                    }
                }
                Ok(())
            })?;
            if let Some(name) = table_name {
                return Ok(name);
            }
        }
    }
    // Default to snake_case of struct name
    Ok(to_snake_case(&struct_name.to_string()))
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("column") {
            // Handle empty attribute like #[column]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    result.skip = true;
                } else if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else if meta.path.is_ident("type") {
                    result.column_type = Some(meta.value()?.parse()?);
                } else {
                    return Err(meta.error("unsupported column attribute"));
                }
                Ok(())
            })?;
        }
    }

    Ok(result)
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
