use cdi_proc_macros::{EnumAll, EnumDisplay, EnumFromStr};

/// How the video coprocessor reacts to an image coding method write that selects a combination
/// the hardware does not allow (e.g. RGB555 on plane B while plane A is not OFF).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumDisplay, EnumFromStr, EnumAll)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(cdi_proc_macros::CustomValueEnum))]
pub enum CodingMethodPolicy {
    /// Log a warning and apply the write anyway; matches real hardware
    #[default]
    Permissive,
    /// Log a warning and leave the coding method register unchanged
    Strict,
}

impl CodingMethodPolicy {
    #[inline]
    #[must_use]
    pub fn rejects_disallowed(self) -> bool {
        self == Self::Strict
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumDisplay, EnumFromStr, EnumAll)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(cdi_proc_macros::CustomValueEnum))]
pub enum CdiAspectRatio {
    #[default]
    Auto,
    Ntsc,
    Pal,
    SquarePixels,
    Stretched,
}

impl CdiAspectRatio {
    /// Pixel aspect ratio for a frame of the given width in pixels; `None` means stretch to fill.
    ///
    /// Ratios are for the normal-resolution pixel clock; double-resolution frames have pixels half
    /// as wide.
    #[must_use]
    pub fn to_pixel_aspect_ratio(self, pal: bool, double_resolution: bool) -> Option<f64> {
        let base = match self {
            Self::Auto => {
                let auto = if pal { Self::Pal } else { Self::Ntsc };
                return auto.to_pixel_aspect_ratio(pal, double_resolution);
            }
            Self::Ntsc => 10.0 / 11.0,
            Self::Pal => 59.0 / 54.0,
            Self::SquarePixels => 1.0,
            Self::Stretched => return None,
        };

        Some(if double_resolution { base / 2.0 } else { base })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_from_str_ignores_case() {
        assert_eq!(Ok(CodingMethodPolicy::Strict), "strict".parse());
        assert_eq!(Ok(CodingMethodPolicy::Permissive), "PERMISSIVE".parse());
        assert!("lenient".parse::<CodingMethodPolicy>().is_err());
    }

    #[test]
    fn aspect_ratio_names() {
        assert_eq!(5, CdiAspectRatio::ALL.len());
        assert_eq!("SquarePixels", CdiAspectRatio::SquarePixels.to_string());
    }

    #[test]
    fn auto_aspect_follows_timing() {
        assert_eq!(
            CdiAspectRatio::Auto.to_pixel_aspect_ratio(true, false),
            CdiAspectRatio::Pal.to_pixel_aspect_ratio(true, false)
        );
        assert_eq!(
            CdiAspectRatio::Auto.to_pixel_aspect_ratio(false, true),
            CdiAspectRatio::Ntsc.to_pixel_aspect_ratio(false, true)
        );
        assert_eq!(None, CdiAspectRatio::Stretched.to_pixel_aspect_ratio(false, false));
    }
}
