//! PropertyRecord derive macro implementation
//!
//! Reads `#[property(..)]` and the serde naming attributes to build the
//! record's `PropertySchema`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parenthesized, parse::Result, parse_macro_input, Attribute, Data, DeriveInput, Error, Fields,
    LitStr, Token, Type,
};

/// Main implementation function for the PropertyRecord derive
pub fn derive_property_record_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(result) => result.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// A field marked `#[property(nested)]`
struct NestedFieldInfo {
    serialized_name: String,
    ty: Type,
}

fn expand(input: &DeriveInput) -> Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let prefix = struct_prefix(&input.attrs)?.unwrap_or_default();
    let rename_all = serde_rename_all(&input.attrs)?;
    let nested = nested_fields(input, rename_all.as_deref())?;

    let nested_calls = nested.iter().map(|field| {
        let ty = &field.ty;
        let field_name = &field.serialized_name;
        quote! { .nested::<#ty>(#field_name) }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::bootkit::properties::PropertyRecord for #name #ty_generics #where_clause {
            fn schema() -> ::bootkit::properties::PropertySchema {
                ::bootkit::properties::PropertySchema::new(#prefix)
                    #(#nested_calls)*
            }
        }
    })
}

fn struct_prefix(attrs: &[Attribute]) -> Result<Option<String>> {
    let mut prefix = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("property")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("prefix") {
                let value: LitStr = meta.value()?.parse()?;
                prefix = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported property attribute, expected `prefix = \"...\"`"))
            }
        })?;
    }
    Ok(prefix)
}

fn serde_rename_all(attrs: &[Attribute]) -> Result<Option<String>> {
    serde_string_value(attrs, "rename_all")
}

/// Value of `#[serde(key = "...")]`, skipping every other serde option
fn serde_string_value(attrs: &[Attribute], key: &str) -> Result<Option<String>> {
    let mut found = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(key) && meta.input.peek(Token![=]) {
                let value: LitStr = meta.value()?.parse()?;
                found = Some(value.value());
            } else if meta.input.peek(Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            } else if meta.input.peek(syn::token::Paren) {
                let content;
                parenthesized!(content in meta.input);
                let _: proc_macro2::TokenStream = content.parse()?;
            }
            Ok(())
        })?;
    }
    Ok(found)
}

fn is_nested(attrs: &[Attribute]) -> Result<bool> {
    let mut nested = false;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("property")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("nested") {
                nested = true;
                Ok(())
            } else {
                Err(meta.error("unsupported field attribute, expected `nested`"))
            }
        })?;
    }
    Ok(nested)
}

fn nested_fields(input: &DeriveInput, rename_all: Option<&str>) -> Result<Vec<NestedFieldInfo>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unit => return Ok(Vec::new()),
            Fields::Unnamed(_) => {
                return Err(Error::new_spanned(
                    input,
                    "#[derive(PropertyRecord)] requires named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new_spanned(
                input,
                "#[derive(PropertyRecord)] can only be applied to structs",
            ))
        }
    };

    let mut nested = Vec::new();
    for field in fields {
        if !is_nested(&field.attrs)? {
            continue;
        }
        let Some(ident) = &field.ident else {
            continue;
        };
        let serialized_name = match serde_string_value(&field.attrs, "rename")? {
            Some(renamed) => renamed,
            None => {
                let raw = ident.to_string();
                let raw = raw.trim_start_matches("r#");
                match rename_all {
                    Some(rule) => apply_rename_rule(rule, raw).ok_or_else(|| {
                        Error::new_spanned(&input.ident, format!("unknown serde rename rule `{}`", rule))
                    })?,
                    None => raw.to_string(),
                }
            }
        };
        nested.push(NestedFieldInfo {
            serialized_name,
            ty: field.ty.clone(),
        });
    }
    Ok(nested)
}

/// Rename a snake_case field the way serde's `rename_all` does
fn apply_rename_rule(rule: &str, field: &str) -> Option<String> {
    let words = field.split('_').filter(|word| !word.is_empty());
    let renamed = match rule {
        "lowercase" | "snake_case" => field.to_string(),
        "UPPERCASE" | "SCREAMING_SNAKE_CASE" => field.to_ascii_uppercase(),
        "kebab-case" => field.replace('_', "-"),
        "SCREAMING-KEBAB-CASE" => field.replace('_', "-").to_ascii_uppercase(),
        "PascalCase" => words.map(capitalize).collect(),
        "camelCase" => {
            let pascal: String = words.map(capitalize).collect();
            let mut chars = pascal.chars();
            match chars.next() {
                Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        }
        _ => return None,
    };
    Some(renamed)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_rules() {
        assert_eq!(apply_rename_rule("camelCase", "content_negotiation").unwrap(), "contentNegotiation");
        assert_eq!(apply_rename_rule("camelCase", "retry").unwrap(), "retry");
        assert_eq!(apply_rename_rule("PascalCase", "web_socket").unwrap(), "WebSocket");
        assert_eq!(apply_rename_rule("kebab-case", "web_socket").unwrap(), "web-socket");
        assert_eq!(apply_rename_rule("SCREAMING_SNAKE_CASE", "max_size").unwrap(), "MAX_SIZE");
        assert!(apply_rename_rule("Title Case", "x").is_none());
    }

    #[test]
    fn test_expand_reads_prefix_and_nested_fields() {
        let input: DeriveInput = syn::parse_quote! {
            #[serde(default, rename_all = "camelCase")]
            #[property(prefix = "http.client")]
            struct ClientProperties {
                #[property(nested)]
                #[serde(skip_serializing_if = "Option::is_none")]
                content_negotiation: Negotiation,
                #[property(nested)]
                #[serde(rename = "ws")]
                websocket: WebSocket,
                user_agent: String,
            }
        };

        let tokens = expand(&input).unwrap().to_string();
        assert!(tokens.contains("\"http.client\""));
        assert!(tokens.contains("\"contentNegotiation\""));
        assert!(tokens.contains("\"ws\""));
        assert!(!tokens.contains("userAgent"));
    }

    #[test]
    fn test_enums_are_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            enum Level { Low, High }
        };
        assert!(expand(&input).is_err());
    }
}
