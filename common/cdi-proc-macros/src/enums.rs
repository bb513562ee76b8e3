use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, Fields, Ident};

/// Parse a derive input that must be an enum with only unit variants.
fn parse_unit_enum(input: TokenStream, derive_name: &str) -> (Ident, Vec<Ident>) {
    let ast: DeriveInput = syn::parse(input).expect("unable to parse input");
    let name = ast.ident;

    let syn::Data::Enum(data) = ast.data else {
        panic!("{derive_name} can only be applied to enums; {name} is not an enum");
    };

    let variants = data
        .variants
        .into_iter()
        .map(|variant| {
            assert!(
                matches!(variant.fields, Fields::Unit),
                "{derive_name} only supports fieldless variants; {name}::{} has fields",
                variant.ident
            );
            variant.ident
        })
        .collect();

    (name, variants)
}

pub fn enum_display(input: TokenStream) -> TokenStream {
    let (name, variants) = parse_unit_enum(input, "EnumDisplay");

    let names: Vec<_> = variants.iter().map(Ident::to_string).collect();
    let expanded = quote! {
        impl #name {
            #[must_use]
            pub fn to_str(&self) -> &'static str {
                match self {
                    #(Self::#variants => #names,)*
                }
            }
        }

        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.to_str())
            }
        }
    };

    expanded.into()
}

pub fn enum_from_str(input: TokenStream) -> TokenStream {
    let (name, variants) = parse_unit_enum(input, "EnumFromStr");

    let lowercase_names: Vec<_> =
        variants.iter().map(|variant| variant.to_string().to_ascii_lowercase()).collect();
    let err_fmt = format!("invalid {name} string: '{{}}'");
    let expanded = quote! {
        impl ::std::str::FromStr for #name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    #(#lowercase_names => ::std::result::Result::Ok(Self::#variants),)*
                    _ => ::std::result::Result::Err(::std::format!(#err_fmt, s)),
                }
            }
        }
    };

    expanded.into()
}

pub fn enum_all(input: TokenStream) -> TokenStream {
    let (name, variants) = parse_unit_enum(input, "EnumAll");

    let len = variants.len();
    let expanded = quote! {
        impl #name {
            pub const ALL: [Self; #len] = [#(Self::#variants,)*];
        }
    };

    expanded.into()
}

pub fn custom_value_enum(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("unable to parse input");
    let name = &ast.ident;

    let expanded = quote! {
        impl ::clap::ValueEnum for #name {
            fn value_variants<'a>() -> &'a [Self] {
                &Self::ALL
            }

            fn to_possible_value(&self) -> ::std::option::Option<::clap::builder::PossibleValue> {
                ::std::option::Option::Some(::clap::builder::PossibleValue::new(self.to_str()))
            }
        }
    };

    expanded.into()
}
