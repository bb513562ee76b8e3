use cdi_proc_macros::{ConfigDisplay, EnumAll, EnumDisplay, EnumFromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumDisplay, EnumFromStr, EnumAll)]
enum Scaling {
    None,
    Integer,
    SquarePixels,
}

#[derive(Debug, Clone, Copy, ConfigDisplay)]
struct ScalerConfig {
    scaling: Scaling,
    #[cfg_display(debug_fmt)]
    aspect: Option<f64>,
    #[cfg_display(skip)]
    #[allow(dead_code)]
    internal_counter: u32,
    scale: u8,
}

#[test]
fn enum_display_uses_variant_names() {
    assert_eq!("SquarePixels", Scaling::SquarePixels.to_str());
    assert_eq!("Integer", Scaling::Integer.to_string());
}

#[test]
fn enum_from_str_ignores_case() {
    assert_eq!(Ok(Scaling::SquarePixels), "squarepixels".parse());
    assert_eq!(Ok(Scaling::None), "NONE".parse());
    assert_eq!(Err("invalid Scaling string: 'linear'".to_string()), "linear".parse::<Scaling>());
}

#[test]
fn enum_all_in_declaration_order() {
    assert_eq!([Scaling::None, Scaling::Integer, Scaling::SquarePixels], Scaling::ALL);
}

#[test]
fn config_display_lists_fields() {
    let config = ScalerConfig {
        scaling: Scaling::Integer,
        aspect: Some(1.5),
        internal_counter: 7,
        scale: 3,
    };

    assert_eq!("\n  scaling: Integer\n  aspect: Some(1.5)\n  scale: 3", config.to_string());
}
