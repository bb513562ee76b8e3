//! Plane compositing: overlay by plane order, or additive mixing, weighted by the image
//! contribution factors

use crate::frame::Color;
use crate::mcd212::registers::{MAX_CONTRIBUTION_FACTOR, Plane, PlaneOrder};
use std::cmp;

/// Black level of the video signal; scaling and mixing are relative to it.
const BLACK_LEVEL: i32 = 16;

const NEUTRAL: Color = Color::rgb(16, 16, 16);

/// Per-line compositing setup. Contribution factors are passed per pixel because matte commands
/// can change them mid-line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeMode {
    pub plane_order: PlaneOrder,
    pub mix: bool,
}

#[inline]
#[must_use]
pub fn scale_channel(channel: u8, factor: u8) -> u8 {
    let factor = i32::from(cmp::min(factor, MAX_CONTRIBUTION_FACTOR));
    let scaled = (factor * (i32::from(channel) - BLACK_LEVEL)) / i32::from(MAX_CONTRIBUTION_FACTOR)
        + BLACK_LEVEL;
    scaled.clamp(0, 255) as u8
}

#[inline]
fn scale(color: Color, factor: u8) -> Color {
    Color::rgb(
        scale_channel(color.r, factor),
        scale_channel(color.g, factor),
        scale_channel(color.b, factor),
    )
}

fn mix_channels(a: u8, b: u8) -> u8 {
    (i32::from(a) + i32::from(b) - BLACK_LEVEL).clamp(0, 255) as u8
}

/// Combine one pixel of each plane with the backdrop. The result is always opaque.
#[must_use]
pub fn composite_pixel(
    pixels: [Color; 2],
    backdrop: Color,
    factors: [u8; 2],
    mode: CompositeMode,
) -> Color {
    if mode.mix {
        let [a, b] = [Plane::A, Plane::B].map(|plane| {
            let pixel = pixels[plane.index()];
            let pixel = if pixel.is_transparent() { NEUTRAL } else { pixel };
            scale(pixel, factors[plane.index()])
        });

        return Color::rgb(mix_channels(a.r, b.r), mix_channels(a.g, b.g), mix_channels(a.b, b.b));
    }

    let front = mode.plane_order.front();
    let back = front.other();

    let front_pixel = pixels[front.index()];
    let back_pixel = pixels[back.index()];

    if !front_pixel.is_transparent() {
        scale(front_pixel, factors[front.index()])
    } else if !back_pixel.is_transparent() {
        scale(back_pixel, factors[back.index()])
    } else {
        backdrop.with_alpha(Color::OPAQUE_ALPHA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: [u8; 2] = [MAX_CONTRIBUTION_FACTOR; 2];

    fn overlay(plane_order: PlaneOrder) -> CompositeMode {
        CompositeMode { plane_order, mix: false }
    }

    const MIX: CompositeMode = CompositeMode { plane_order: PlaneOrder::AFront, mix: true };

    #[test]
    fn scale_identity_and_zero() {
        for channel in 0..=255 {
            assert_eq!(channel, scale_channel(channel, 63));
        }

        assert_eq!(16, scale_channel(235, 0));
        assert_eq!(16, scale_channel(0, 0));
        // (31 * 184) / 63 + 16
        assert_eq!(106, scale_channel(200, 31));
    }

    #[test]
    fn overlay_falls_back_to_backdrop() {
        let backdrop = Color::from_yrgb(0b1100);
        let output =
            composite_pixel([Color::TRANSPARENT; 2], backdrop, FULL, overlay(PlaneOrder::AFront));
        assert_eq!(Color::rgb(255, 0, 0), output);
    }

    #[test]
    fn overlay_shows_back_plane_through_transparent_front() {
        let back = Color::rgb(200, 100, 50);
        let output = composite_pixel(
            [Color::TRANSPARENT, back],
            Color::BLACK,
            FULL,
            overlay(PlaneOrder::AFront),
        );
        assert_eq!(back, output);
    }

    #[test]
    fn overlay_respects_plane_order() {
        let a = Color::rgb(100, 100, 100);
        let b = Color::rgb(50, 50, 50);

        assert_eq!(a, composite_pixel([a, b], Color::BLACK, FULL, overlay(PlaneOrder::AFront)));
        assert_eq!(b, composite_pixel([a, b], Color::BLACK, FULL, overlay(PlaneOrder::BFront)));
    }

    #[test]
    fn overlay_scales_front_plane() {
        let output = composite_pixel(
            [Color::rgb(200, 200, 200), Color::TRANSPARENT],
            Color::BLACK,
            [31, 63],
            overlay(PlaneOrder::AFront),
        );
        assert_eq!(Color::rgb(106, 106, 106), output);
    }

    #[test]
    fn mix_sums_relative_to_black_level() {
        let pixel = Color::rgb(80, 80, 80);
        assert_eq!(Color::rgb(144, 144, 144), composite_pixel([pixel, pixel], Color::BLACK, FULL, MIX));
    }

    #[test]
    fn mix_treats_transparent_as_black_level() {
        let pixel = Color::rgb(80, 120, 200);
        assert_eq!(pixel, composite_pixel([Color::TRANSPARENT, pixel], Color::BLACK, FULL, MIX));

        let output = composite_pixel([Color::TRANSPARENT; 2], Color::rgb(255, 255, 255), FULL, MIX);
        assert_eq!(Color::rgb(16, 16, 16), output);
    }

    #[test]
    fn mix_clamps() {
        let bright = Color::rgb(250, 250, 250);
        assert_eq!(Color::rgb(255, 255, 255), composite_pixel([bright, bright], Color::BLACK, FULL, MIX));

        let dark = Color::rgb(0, 0, 0);
        assert_eq!(Color::rgb(0, 0, 0), composite_pixel([dark, dark], Color::BLACK, FULL, MIX));
    }
}
