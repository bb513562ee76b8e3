//! Run-length decoding
//!
//! Each control byte's top bit says whether a repeat count byte follows; a count of 0 fills the
//! rest of the line. RL7 control bytes hold one 7-bit color code and emit single pixels; RL3
//! control bytes hold two 3-bit color codes (bits 4-6 and 0-2) and emit pixel pairs. Color codes
//! are looked up in the CLUT the same way as the plane's CLUT coding method.

use crate::frame::Color;
use crate::mcd212::clut::ColorTable;
use crate::mcd212::decode::{ClutSelect, Resolution, put_pixel, put_run};
use crate::mcd212::registers::BitsPerPixel;
use crate::num::GetBit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLengthForm {
    Rl3,
    Rl7,
}

impl RunLengthForm {
    #[must_use]
    pub fn from_bits_per_pixel(bits_per_pixel: BitsPerPixel) -> Self {
        match bits_per_pixel {
            BitsPerPixel::Double4 => Self::Rl3,
            BitsPerPixel::Normal8 | BitsPerPixel::High8 => Self::Rl7,
        }
    }
}

/// Decode `width` pixels; returns the number of control and count bytes read.
pub fn decode_run_length_line(
    out: &mut [Color],
    width: usize,
    resolution: Resolution,
    src: &[u8],
    clut: &ColorTable,
    select: ClutSelect,
    form: RunLengthForm,
) -> usize {
    let mut x = 0;
    let mut i = 0;

    while x < width {
        let control = src[i];
        i += 1;

        // None means fill to the end of the line
        let repeat = if control.bit(7) {
            let count = src[i];
            i += 1;
            (count != 0).then_some(usize::from(count))
        } else {
            Some(1)
        };

        match form {
            RunLengthForm::Rl7 => {
                let color = clut.color(select.index(control & 0x7F));
                let remaining = width - x;
                let len = repeat.map_or(remaining, |count| count.min(remaining));

                put_run(out, x, len, resolution, color);
                x += len;
            }
            RunLengthForm::Rl3 => {
                let first = clut.color(select.index(control.bits(4..=6)));
                let second = clut.color(select.index(control.bits(0..=2)));
                let remaining_pairs = (width - x).div_ceil(2);
                let pairs = repeat.map_or(remaining_pairs, |count| count.min(remaining_pairs));

                for _ in 0..pairs {
                    put_pixel(out, x, resolution, first);
                    if x + 1 < width {
                        put_pixel(out, x + 1, resolution, second);
                    }
                    x += 2;
                }
                x = x.min(width);
            }
        }
    }

    log::trace!("Run-length {form:?} line: {width} pixels from {i} bytes");

    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcd212::registers::{CodingMethod, Plane};

    fn test_clut() -> ColorTable {
        let mut clut = ColorTable::new();
        for i in 0..256 {
            clut.write(i, 0x01_0000 * i as u32 + 0x80);
        }
        clut
    }

    fn clut7_a() -> ClutSelect {
        ClutSelect::new(CodingMethod::Clut7, Plane::A, false)
    }

    #[test]
    fn rl7_single_pixels_and_runs() {
        let clut = test_clut();
        let mut out = vec![Color::TRANSPARENT; 6];

        // pixel 5, run of 2 x color 9
        let consumed = decode_run_length_line(
            &mut out,
            3,
            Resolution::Normal,
            &[0x05, 0x89, 0x02, 0xFF],
            &clut,
            clut7_a(),
            RunLengthForm::Rl7,
        );

        assert_eq!(3, consumed);
        let (c5, c9) = (clut.color(5), clut.color(9));
        assert_eq!(vec![c5, c5, c9, c9, c9, c9], out);
    }

    #[test]
    fn rl7_zero_count_fills_exactly_remaining() {
        let clut = test_clut();
        let mut out = vec![Color::TRANSPARENT; 10];

        let consumed = decode_run_length_line(
            &mut out,
            10,
            Resolution::Double,
            &[0x01, 0x02, 0x83, 0x00, 0x7F],
            &clut,
            clut7_a(),
            RunLengthForm::Rl7,
        );

        assert_eq!(4, consumed);
        assert_eq!(clut.color(1), out[0]);
        assert_eq!(clut.color(2), out[1]);
        assert!(out[2..].iter().all(|&color| color == clut.color(3)));
    }

    #[test]
    fn rl7_long_run_is_clamped_to_line() {
        let clut = test_clut();
        let mut out = vec![Color::TRANSPARENT; 8];

        let consumed = decode_run_length_line(
            &mut out,
            4,
            Resolution::Normal,
            &[0x01, 0x84, 0xC8],
            &clut,
            clut7_a(),
            RunLengthForm::Rl7,
        );

        assert_eq!(3, consumed);
        assert_eq!(clut.color(1), out[0]);
        assert!(out[2..].iter().all(|&color| color == clut.color(4)));
    }

    #[test]
    fn rl3_pairs() {
        let clut = test_clut();
        let mut out = vec![Color::TRANSPARENT; 8];

        // one pair (1, 2), then two pairs of (3, 4), then fill with (5, 6)
        let consumed = decode_run_length_line(
            &mut out,
            8,
            Resolution::Double,
            &[0x12, 0xB4, 0x02, 0xD6, 0x00],
            &clut,
            clut7_a(),
            RunLengthForm::Rl3,
        );

        assert_eq!(5, consumed);
        let expected: Vec<Color> = [1, 2, 3, 4, 3, 4, 5, 6].iter().map(|&i| clut.color(i)).collect();
        assert_eq!(expected, out);
    }

    #[test]
    fn rl3_plane_b_offset() {
        let clut = test_clut();
        let mut out = vec![Color::TRANSPARENT; 2];

        decode_run_length_line(
            &mut out,
            2,
            Resolution::Double,
            &[0x71],
            &clut,
            ClutSelect::new(CodingMethod::Clut7, Plane::B, false),
            RunLengthForm::Rl3,
        );

        assert_eq!(vec![clut.color(135), clut.color(129)], out);
    }
}
