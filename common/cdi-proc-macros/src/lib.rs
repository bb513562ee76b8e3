//! Derive macros for configuration types

mod config;
mod enums;

use proc_macro::TokenStream;

/// Implement `to_str()` and `Display` for a fieldless enum, using each variant's name.
#[proc_macro_derive(EnumDisplay)]
pub fn enum_display(input: TokenStream) -> TokenStream {
    enums::enum_display(input)
}

/// Implement `FromStr` for a fieldless enum. Matching against variant names ignores case.
#[proc_macro_derive(EnumFromStr)]
pub fn enum_from_str(input: TokenStream) -> TokenStream {
    enums::enum_from_str(input)
}

/// Add an `ALL` constant listing every variant in declaration order.
#[proc_macro_derive(EnumAll)]
pub fn enum_all(input: TokenStream) -> TokenStream {
    enums::enum_all(input)
}

/// Implement `clap::ValueEnum` from the `EnumAll` and `EnumDisplay` derives, so that command-line
/// values are the variant names.
#[proc_macro_derive(CustomValueEnum)]
pub fn custom_value_enum(input: TokenStream) -> TokenStream {
    enums::custom_value_enum(input)
}

/// Implement `Display` for a config struct as one `name: value` line per field.
///
/// Field attributes:
/// - `#[cfg_display(debug_fmt)]` formats the field with `Debug` instead of `Display`
/// - `#[cfg_display(skip)]` leaves the field out
#[proc_macro_derive(ConfigDisplay, attributes(cfg_display))]
pub fn config_display(input: TokenStream) -> TokenStream {
    config::config_display(input)
}
