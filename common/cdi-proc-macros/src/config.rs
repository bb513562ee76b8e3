use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Field};

#[derive(Debug, Clone, Copy, Default)]
struct FieldOptions {
    debug_fmt: bool,
    skip: bool,
}

fn parse_field_options(field: &Field) -> FieldOptions {
    let mut options = FieldOptions::default();

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("cfg_display")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("debug_fmt") {
                options.debug_fmt = true;
            } else if meta.path.is_ident("skip") {
                options.skip = true;
            } else {
                return Err(meta.error("invalid cfg_display option"));
            }

            Ok(())
        })
        .expect("failed to parse cfg_display attribute");
    }

    options
}

fn field_line(field: &Field, options: FieldOptions) -> TokenStream2 {
    let Some(ident) = &field.ident else {
        panic!("ConfigDisplay only supports structs with named fields");
    };

    let fmt = if options.debug_fmt {
        format!("  {ident}: {{:?}}")
    } else {
        format!("  {ident}: {{}}")
    };

    quote! { ::std::format!(#fmt, self.#ident) }
}

pub fn config_display(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("unable to parse input");

    let Data::Struct(data) = &ast.data else {
        panic!("ConfigDisplay can only be applied to structs");
    };

    let lines: Vec<_> = data
        .fields
        .iter()
        .filter_map(|field| {
            let options = parse_field_options(field);
            (!options.skip).then(|| field_line(field, options))
        })
        .collect();
    assert!(!lines.is_empty(), "ConfigDisplay requires at least one displayed field");

    let name = &ast.ident;
    let (impl_generics, type_generics, where_clause) = ast.generics.split_for_impl();
    let expanded = quote! {
        impl #impl_generics ::std::fmt::Display for #name #type_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                let lines = [#(#lines,)*];
                for line in lines {
                    ::std::writeln!(f)?;
                    f.write_str(&line)?;
                }
                ::std::result::Result::Ok(())
            }
        }
    };

    expanded.into()
}
