//! Delta YUV decoding
//!
//! Each 16-bit word encodes two pixels as four 4-bit deltas: U and V for the second pixel, and Y
//! for each pixel. Deltas accumulate onto the previous pixel's Y/U/V, which is reseeded from the
//! plane's start value register at the beginning of every line. The first pixel of a pair takes
//! the average of the previous and current chroma.

use crate::frame::Color;
use crate::mcd212::decode::{Resolution, put_pixel};
use crate::num::GetBit;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

const DEQUANTIZER: [u8; 16] = [0, 1, 4, 9, 16, 27, 44, 79, 128, 177, 212, 229, 240, 247, 252, 255];

struct YuvMatrix {
    v_to_r: [i16; 256],
    v_to_g: [i16; 256],
    u_to_g: [i16; 256],
    u_to_b: [i16; 256],
}

static YUV_MATRIX: LazyLock<YuvMatrix> = LazyLock::new(|| {
    let coefficient = |factor: i32| -> [i16; 256] {
        std::array::from_fn(|i| ((factor * (i as i32 - 128)) / 256) as i16)
    };

    YuvMatrix {
        v_to_r: coefficient(351),
        v_to_g: coefficient(179),
        u_to_g: coefficient(86),
        u_to_b: coefficient(444),
    }
});

#[inline]
fn clamp_u8(value: i16) -> u8 {
    value.clamp(0, 255) as u8
}

#[must_use]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> Color {
    let matrix = &*YUV_MATRIX;
    let y = i16::from(y);

    let r = y + matrix.v_to_r[v as usize];
    let g = y - (matrix.u_to_g[u as usize] + matrix.v_to_g[v as usize]);
    let b = y + matrix.u_to_b[u as usize];

    Color::rgb(clamp_u8(r), clamp_u8(g), clamp_u8(b))
}

/// Y/U/V carried from one pixel pair to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DyuvState {
    pub y: u8,
    pub u: u8,
    pub v: u8,
}

impl DyuvState {
    /// Start value register layout: Y in bits 16-23, U in bits 8-15, V in bits 0-7.
    #[must_use]
    pub fn from_seed(seed: u32) -> Self {
        Self { y: seed.bits(16..=23) as u8, u: seed.bits(8..=15) as u8, v: seed.bits(0..=7) as u8 }
    }

    fn decode_word(self, word: u16) -> ([Color; 2], Self) {
        let delta = |range: RangeInclusive<u8>| DEQUANTIZER[word.bits(range) as usize];

        let y1 = self.y.wrapping_add(delta(8..=11));
        let u2 = self.u.wrapping_add(delta(12..=15));
        let v2 = self.v.wrapping_add(delta(4..=7));
        let y2 = y1.wrapping_add(delta(0..=3));

        let u1 = ((u16::from(self.u) + u16::from(u2)) >> 1) as u8;
        let v1 = ((u16::from(self.v) + u16::from(v2)) >> 1) as u8;

        ([yuv_to_rgb(y1, u1, v1), yuv_to_rgb(y2, u2, v2)], Self { y: y2, u: u2, v: v2 })
    }
}

/// Decode `width` DYUV pixels; consumes two bytes per pixel pair. Output is always opaque.
pub fn decode_dyuv_line(
    out: &mut [Color],
    width: usize,
    resolution: Resolution,
    src: &[u8],
    seed: DyuvState,
) -> usize {
    let mut state = seed;

    for x in (0..width).step_by(2) {
        let word = u16::from_be_bytes([src[x], src[x + 1]]);
        let ([first, second], next) = state.decode_word(word);

        put_pixel(out, x, resolution, first);
        if x + 1 < width {
            put_pixel(out, x + 1, resolution, second);
        }

        state = next;
    }

    2 * width.div_ceil(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK_SEED: u32 = 0x10_8080;

    #[test]
    fn dequantizer_is_symmetric() {
        for i in 1..16 {
            assert_eq!(0, DEQUANTIZER[i].wrapping_add(DEQUANTIZER[16 - i]), "delta {i}");
        }
    }

    #[test]
    fn neutral_chroma_is_grey() {
        assert_eq!(Color::rgb(16, 16, 16), yuv_to_rgb(16, 128, 128));
        assert_eq!(Color::rgb(235, 235, 235), yuv_to_rgb(235, 128, 128));
    }

    #[test]
    fn matrix_clamps() {
        let color = yuv_to_rgb(255, 255, 255);
        assert_eq!((255, 255), (color.r, color.b));

        // Both chroma terms subtract from green: 0 - (-43 + -89)
        let color = yuv_to_rgb(0, 0, 0);
        assert_eq!(Color::rgb(0, 132, 0), color);
    }

    #[test]
    fn luma_fixture() {
        let mut out = [Color::TRANSPARENT; 4];
        let consumed = decode_dyuv_line(
            &mut out,
            2,
            Resolution::Normal,
            &[0x08, 0x08],
            DyuvState::from_seed(BLACK_SEED),
        );

        assert_eq!(2, consumed);
        // 16 + 128 = 144, then 144 + 128 wraps back to 16
        assert_eq!(
            [
                Color::rgb(144, 144, 144),
                Color::rgb(144, 144, 144),
                Color::rgb(16, 16, 16),
                Color::rgb(16, 16, 16)
            ],
            out
        );
    }

    #[test]
    fn chroma_fixture() {
        let mut out = [Color::TRANSPARENT; 2];
        // U delta 2 (+4), Y1 delta 8 (+128), V delta 0, Y2 delta 0
        decode_dyuv_line(
            &mut out,
            2,
            Resolution::Double,
            &[0x28, 0x00],
            DyuvState::from_seed(BLACK_SEED),
        );

        // First pixel uses the averaged U of 130: B = 144 + (444 * 2) / 256
        assert_eq!(Color::rgb(144, 144, 147), out[0]);
        // Second pixel uses U of 132: G = 144 - (86 * 4) / 256, B = 144 + (444 * 4) / 256
        assert_eq!(Color::rgb(144, 143, 150), out[1]);
    }

    #[test]
    fn state_carries_across_words() {
        let mut out = [Color::TRANSPARENT; 4];
        let consumed = decode_dyuv_line(
            &mut out,
            4,
            Resolution::Double,
            &[0x01, 0x01, 0x0F, 0x0F],
            DyuvState::from_seed(BLACK_SEED),
        );

        assert_eq!(4, consumed);
        // +1, +1, then -1, -1
        let lumas: Vec<u8> = out.iter().map(|color| color.r).collect();
        assert_eq!(vec![17, 18, 17, 16], lumas);
    }

    #[test]
    fn decoding_is_deterministic_and_seed_dependent() {
        let src: Vec<u8> = (0..64_u8).map(|i| i.wrapping_mul(37)).collect();

        let decode = |seed| {
            let mut out = vec![Color::TRANSPARENT; 128];
            decode_dyuv_line(&mut out, 64, Resolution::Normal, &src, DyuvState::from_seed(seed));
            out
        };

        assert_eq!(decode(BLACK_SEED), decode(BLACK_SEED));
        assert_ne!(decode(BLACK_SEED)[0], decode(0x80_8080)[0]);
    }
}
