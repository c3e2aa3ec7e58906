//! Expansion of `#[derive(SchemaEnum)]`.

use std::collections::HashMap;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Fields, Ident, LitStr, Result, Variant, ext::IdentExt};

struct Member<'a> {
    ident: &'a Ident,
    name: String,
    value: LitStr,
}

pub fn expand(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(Error::new_spanned(
            &input.ident,
            "`SchemaEnum` can only be derived for enums",
        ));
    };
    if !input.generics.params.is_empty() || input.generics.where_clause.is_some() {
        return Err(Error::new_spanned(
            &input.generics,
            "`SchemaEnum` does not support generic enums",
        ));
    }
    if data.variants.is_empty() {
        return Err(Error::new_spanned(
            &input.ident,
            "`SchemaEnum` needs at least one variant",
        ));
    }

    let members = data
        .variants
        .iter()
        .map(member)
        .collect::<Result<Vec<_>>>()?;

    let mut seen: HashMap<String, &Ident> = HashMap::new();
    for member in &members {
        if let Some(previous) = seen.insert(member.value.value(), member.ident) {
            return Err(Error::new(
                member.value.span(),
                format!(
                    "duplicate enum value `{}`, already used by `{previous}`",
                    member.value.value()
                ),
            ));
        }
    }

    let ident = &input.ident;
    let enum_name = ident.unraw().to_string();
    let variants: Vec<&Ident> = members.iter().map(|member| member.ident).collect();
    let names: Vec<&str> = members.iter().map(|member| member.name.as_str()).collect();
    let values: Vec<&LitStr> = members.iter().map(|member| &member.value).collect();

    Ok(quote! {
        impl ::gptfunction::SchemaEnum for #ident {
            fn enum_type() -> ::gptfunction::Result<::gptfunction::EnumType> {
                ::gptfunction::EnumType::new(
                    #enum_name,
                    ::std::vec![#(::gptfunction::EnumMember::new(#names, #values)),*],
                )
            }

            fn from_value(value: &str) -> ::core::option::Option<Self> {
                match value {
                    #(#values => ::core::option::Option::Some(Self::#variants),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn value(&self) -> &'static str {
                match self {
                    #(Self::#variants => #values,)*
                }
            }
        }

        impl ::gptfunction::SchemaType for #ident {
            fn param_type() -> ::gptfunction::Result<::gptfunction::ParamType> {
                <Self as ::gptfunction::SchemaEnum>::enum_type()
                    .map(::gptfunction::ParamType::Enumeration)
            }

            fn from_argument(
                value: ::core::option::Option<&::gptfunction::Value>,
            ) -> ::core::result::Result<Self, ::gptfunction::ArgumentError> {
                ::gptfunction::decode_enum(value)
            }
        }
    })
}

fn member(variant: &Variant) -> Result<Member<'_>> {
    if !matches!(variant.fields, Fields::Unit) {
        return Err(Error::new_spanned(
            variant,
            "`SchemaEnum` variants cannot carry fields",
        ));
    }

    let name = variant.ident.unraw().to_string();
    let mut value = None;

    for attribute in &variant.attrs {
        if !attribute.path().is_ident("schema") {
            continue;
        }
        attribute.parse_nested_meta(|meta| {
            if meta.path.is_ident("value") {
                let literal: LitStr = meta.value()?.parse()?;
                if literal.value().is_empty() {
                    return Err(Error::new(literal.span(), "enum value must not be empty"));
                }
                value = Some(literal);
                Ok(())
            } else {
                Err(meta.error("unknown `schema` attribute, expected `value`"))
            }
        })?;
    }

    let value = value.unwrap_or_else(|| LitStr::new(&to_snake_case(&name), variant.ident.span()));

    Ok(Member {
        ident: &variant.ident,
        name,
        value,
    })
}

/// `SuperUser` becomes `super_user`, `HTTPServer` becomes `http_server`.
fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut snake = String::with_capacity(name.len() + 4);

    for (index, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let previous = index.checked_sub(1).map(|i| chars[i]);
            let next = chars.get(index + 1);
            let boundary = match previous {
                None | Some('_') => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) => p.is_uppercase() && next.is_some_and(|n| n.is_lowercase()),
            };
            if boundary {
                snake.push('_');
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }

    snake
}
