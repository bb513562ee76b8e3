//! Per-pixel transparency resolution

use crate::frame::Color;
use crate::mcd212::registers::{TransparencyCondition, TransparencyMode};

/// Only the top 6 bits of each channel take part in a color key comparison. Color table entries
/// and key registers hold 6 significant bits per channel, stored in the high bits of each byte.
const COLOR_KEY_MASK: u32 = 0x00FC_FCFC;

/// Per-plane inputs that stay fixed across a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransparencyKey {
    pub condition: TransparencyCondition,
    pub transparent_color: u32,
    pub mask_color: u32,
}

impl TransparencyKey {
    fn color_key_match(self, pixel: Color) -> bool {
        let compare_mask = COLOR_KEY_MASK & !self.mask_color;
        (pixel.to_rgb24() ^ self.transparent_color) & compare_mask == 0
    }
}

/// Decide whether `pixel` is visible and overwrite its alpha accordingly.
///
/// `matte_flags` are the plane's own matte flags at this position. The reserved mode leaves the
/// pixel untouched.
#[must_use]
pub fn resolve(pixel: Color, key: TransparencyKey, matte_flags: [bool; 2]) -> Color {
    let condition = match key.condition.mode {
        TransparencyMode::Always => true,
        TransparencyMode::ColorKey => key.color_key_match(pixel),
        TransparencyMode::TransparencyBit => pixel.a == 0,
        TransparencyMode::MatteFlag0 => matte_flags[0],
        TransparencyMode::MatteFlag1 => matte_flags[1],
        TransparencyMode::MatteFlag0OrColorKey => matte_flags[0] || key.color_key_match(pixel),
        TransparencyMode::MatteFlag1OrColorKey => matte_flags[1] || key.color_key_match(pixel),
        TransparencyMode::Reserved => return pixel,
    };

    let transparent = condition ^ key.condition.invert;
    pixel.with_alpha(if transparent { 0 } else { Color::OPAQUE_ALPHA })
}
