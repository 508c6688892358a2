use std::collections::{BTreeMap, HashSet};

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Data, DeriveInput, Error, ExprClosure, Field, Fields, GenericArgument, Ident, LitStr, Pat,
    PathArguments, Result, Token, Type,
    parse::{Parse, ParseStream},
};

pub(crate) fn expand_from_metadata(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new_spanned(
            input,
            "`FromMetadata` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new_spanned(
            input,
            "`FromMetadata` may only be derived on structs with named fields.",
        ))?
    };

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .map(Result::transpose)
        .flatten() // Skip fields without an attribute.
        .collect::<Result<Vec<_>>>()?;

    type Case = (LitStr, Ident, Option<(Type, ExprClosure)>);
    let mut methods: BTreeMap<&'static str, (Type, Vec<Case>)> = BTreeMap::new();
    let mut keys = HashSet::new();

    for field in fields {
        if !keys.insert(field.key.value()) {
            Err(Error::new_spanned(&field.key, "Entry keys must be unique."))?
        }

        methods
            .entry(field.method)
            .or_insert_with(|| (field.value.clone(), Vec::new()))
            .1
            .push((field.key, field.name, field.handler));
    }

    let methods = methods.into_iter().map(|(method, (value, cases))| {
        let cases = cases.into_iter().map(|(key, name, handler)| {
            let assignment = if let Some((field_type, handler)) = handler {
                let body = handler.body;
                let acc = handler.inputs.iter().nth(0).unwrap();
                let val = handler.inputs.iter().nth(1).unwrap();

                quote! {
                    (|#acc: &mut #field_type, #val| {#body})(&mut self.#name, value)
                }
            } else {
                quote! {
                    self.#name = Some(value)
                }
            };

            quote! { #key => { #assignment } }
        });

        let method = format_ident!("add_{}", method);

        quote! {
            fn #method(&mut self, key: &str, value: #value) {
                match key {
                    #(#cases)*
                    _ => {}
                };
            }
        }
    });

    let name = &input.ident;

    let expanded = quote! {
        impl FromMetadata for #name {
            #(#methods)*
        }
    };

    Ok(expanded.into())
}

#[derive(Debug)]
struct FieldMetadata {
    name: Ident,
    key: LitStr,
    /// Type of the value received, as written in the struct.
    value: Type,
    /// Suffix of the receiver method accepting the value.
    method: &'static str,
    handler: Option<(Type, ExprClosure)>,
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Option<Self>> {
        let name = field.ident.clone().unwrap();

        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("entry")) else {
            return Ok(None);
        };

        let EntryAttribute { key, handler } = attr.meta.require_list()?.parse_args()?;

        let value = if let Some(handler) = &handler {
            let Some(parameter) = handler.inputs.iter().nth(1) else {
                Err(Error::new_spanned(
                    handler,
                    "Handler closure must have two parameters.",
                ))?
            };

            let Pat::Type(pat_type) = parameter else {
                Err(Error::new_spanned(
                    parameter,
                    "Handler closure's second parameter must be annotated with the expected value type.",
                ))?
            };

            (*pat_type.ty).clone()
        } else {
            option_inner(&field.ty)?
        };

        let method = receiver_method(&value)?;
        let handler = handler.map(|h| (field.ty.clone(), h));

        Ok(Some(Self {
            name,
            key,
            value,
            method,
            handler,
        }))
    }
}

/// Extract `T` from a field of type `Option<T>`.
fn option_inner(ty: &Type) -> Result<Type> {
    let Type::Path(path) = ty else {
        Err(Error::new_spanned(ty, "Field must have a type annotation."))?
    };

    let Some(segment) = path.path.segments.last() else {
        Err(Error::new_spanned(
            &path.path.segments,
            "Field must have a type annotation.",
        ))?
    };

    if segment.ident != "Option" {
        Err(Error::new_spanned(
            &segment.ident,
            "Field without a handler must have type `Option<T>`.",
        ))?
    }

    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        Err(Error::new_spanned(
            &segment.arguments,
            "Field of type `Option<T>` must have a generic parameter.",
        ))?
    };

    let Some(GenericArgument::Type(inner)) = arguments.args.first() else {
        Err(Error::new_spanned(
            &arguments.args,
            "Generic argument of a field of type `Option<T>` must be a type.",
        ))?
    };

    Ok(inner.clone())
}

/// Select the receiver method for a value type by its final path segment.
fn receiver_method(value: &Type) -> Result<&'static str> {
    let ident = match value {
        Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    };

    Ok(match ident.as_deref() {
        Some("bool") => "bool",
        Some("i64") => "i64",
        Some("f64") => "f64",
        Some("Vec") => "bytes",
        Some("String") => "string",
        _ => Err(Error::new_spanned(
            value,
            "Entry value must be one of `bool`, `i64`, `f64`, `Vec<u8>` or `String`.",
        ))?,
    })
}

#[derive(Debug)]
struct EntryAttribute {
    key: LitStr,
    handler: Option<ExprClosure>,
}

impl Parse for EntryAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        let key = input.parse::<LitStr>()?;

        let handler = if !input.is_empty() {
            input.parse::<Token![,]>()?;
            Some(input.parse::<ExprClosure>()?)
        } else {
            None
        };

        Ok(Self { key, handler })
    }
}
