//! # bootkit-derive
//!
//! Derive macros for bootkit property records:
//! - `#[derive(PropertyRecord)]`: describe a record's binding prefix and nested records

use proc_macro::TokenStream;

mod property_record;

/// Implement `bootkit::properties::PropertyRecord`
///
/// Struct attribute `#[property(prefix = "a.b")]` sets the binding prefix;
/// field attribute `#[property(nested)]` marks fields holding other records.
/// Serde `rename_all` and `rename` are honoured when naming nested fields.
#[proc_macro_derive(PropertyRecord, attributes(property))]
pub fn derive_property_record(input: TokenStream) -> TokenStream {
    property_record::derive_property_record_impl(input)
}
