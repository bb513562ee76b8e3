//! Per-line pixel decoders for the plane coding methods
//!
//! Every decoder writes into a destination line that is always allocated at double resolution
//! width. Normal resolution pixels are written twice; double/high resolution pixels once. Each
//! decoder returns the exact number of source bytes it consumed so the caller can advance its read
//! cursor.
//!
//! Source slices must hold at least as many bytes as the line needs; decoders index them directly
//! and will panic on a short slice.

mod dyuv;
mod runlength;

use crate::api::VideoError;
use crate::frame::Color;
use crate::mcd212::clut::ColorTable;
use crate::mcd212::registers::{BitsPerPixel, CodingMethod, ImageType, Plane, Registers};
use crate::num::GetBit;

pub use dyuv::{DyuvState, decode_dyuv_line};
pub use runlength::{RunLengthForm, decode_run_length_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Normal,
    Double,
}

impl Resolution {
    #[must_use]
    pub fn from_bits_per_pixel(bits_per_pixel: BitsPerPixel) -> Self {
        if bits_per_pixel.is_double_resolution() { Self::Double } else { Self::Normal }
    }

    /// Destination pixels covered by one decoded pixel.
    #[inline]
    #[must_use]
    pub fn repeat(self) -> usize {
        match self {
            Self::Normal => 2,
            Self::Double => 1,
        }
    }
}

#[inline]
fn put_pixel(out: &mut [Color], x: usize, resolution: Resolution, color: Color) {
    match resolution {
        Resolution::Normal => {
            out[2 * x] = color;
            out[2 * x + 1] = color;
        }
        Resolution::Double => out[x] = color,
    }
}

#[inline]
fn put_run(out: &mut [Color], x: usize, len: usize, resolution: Resolution, color: Color) {
    let repeat = resolution.repeat();
    out[x * repeat..(x + len) * repeat].fill(color);
}

/// How pixel codes map to CLUT entries for a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClutSelect {
    mask: u8,
    offset: usize,
    nibbles: bool,
}

impl ClutSelect {
    /// CLUT7 variants use the low 7 bits of each code; plane B (and plane A in CLUT7+7 mode with
    /// the high bank selected) is offset into the upper half of the table.
    #[must_use]
    pub fn new(method: CodingMethod, plane: Plane, high_bank: bool) -> Self {
        let upper_half = match method {
            CodingMethod::Clut8 => return Self { mask: 0xFF, offset: 0, nibbles: false },
            CodingMethod::Clut77 if plane == Plane::A => high_bank,
            _ => plane == Plane::B,
        };

        Self {
            mask: 0x7F,
            offset: if upper_half { 128 } else { 0 },
            nibbles: method == CodingMethod::Clut4,
        }
    }

    #[inline]
    #[must_use]
    pub fn index(self, code: u8) -> usize {
        usize::from(code & self.mask) + self.offset
    }
}

/// CLUT4/7/7+7/8: one byte (or nibble, high nibble first) per pixel. Output is always opaque.
pub fn decode_clut_line(
    out: &mut [Color],
    width: usize,
    resolution: Resolution,
    src: &[u8],
    clut: &ColorTable,
    select: ClutSelect,
) -> usize {
    if select.nibbles {
        for x in (0..width).step_by(2) {
            let byte = src[x / 2];
            put_pixel(out, x, resolution, clut.color(select.index(byte >> 4)));
            if x + 1 < width {
                put_pixel(out, x + 1, resolution, clut.color(select.index(byte & 0x0F)));
            }
        }

        width.div_ceil(2)
    } else {
        for (x, &byte) in src[..width].iter().enumerate() {
            put_pixel(out, x, resolution, clut.color(select.index(byte)));
        }

        width
    }
}

/// RGB555: plane A's stream supplies the high byte and plane B's the low byte of each 1:5:5:5
/// pixel. Bit 15 is the transparency bit; when clear the pixel is transparent.
///
/// Returns the bytes consumed from each stream.
pub fn decode_rgb555_line(
    out: &mut [Color],
    width: usize,
    resolution: Resolution,
    src_high: &[u8],
    src_low: &[u8],
) -> usize {
    for x in 0..width {
        let pixel = u16::from_be_bytes([src_high[x], src_low[x]]);

        let r = (pixel.bits(10..=14) as u8) << 3;
        let g = (pixel.bits(5..=9) as u8) << 3;
        let b = (pixel.bits(0..=4) as u8) << 3;
        let a = if pixel.bit(15) { Color::OPAQUE_ALPHA } else { 0 };

        put_pixel(out, x, resolution, Color::rgba(r, g, b, a));
    }

    width
}

/// Horizontal sample-and-hold: every pixel repeats the first pixel of its hold period. The factor
/// is in normal resolution pixels.
pub fn apply_pixel_hold(line: &mut [Color], factor: u8) {
    let period = 2 * usize::from(factor.max(1));
    if period == 2 {
        // A hold of one normal pixel changes nothing at double width
        return;
    }

    for x in 0..line.len() {
        let held = x - x % period;
        if held != x {
            line[x] = line[held];
        }
    }
}

/// Bytes consumed from each plane's stream for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineBytes {
    pub plane_a: usize,
    pub plane_b: usize,
}

impl LineBytes {
    #[must_use]
    pub fn get(self, plane: Plane) -> usize {
        match plane {
            Plane::A => self.plane_a,
            Plane::B => self.plane_b,
        }
    }

    fn set(&mut self, plane: Plane, value: usize) {
        match plane {
            Plane::A => self.plane_a = value,
            Plane::B => self.plane_b = value,
        }
    }
}

/// Decode one line of both planes according to the current register state.
///
/// `base_width` is the normal resolution line width; each output line holds `2 * base_width`
/// pixels. Planes with coding method OFF are filled with transparent pixels and consume nothing.
///
/// # Errors
///
/// Returns [`VideoError::MosaicUnsupported`] if an active plane is configured for the mosaic image
/// type.
pub fn decode_plane_lines(
    registers: &Registers,
    base_width: usize,
    sources: [&[u8]; 2],
    out_a: &mut [Color],
    out_b: &mut [Color],
) -> Result<LineBytes, VideoError> {
    let mut consumed = LineBytes::default();

    if registers.coding_method(Plane::B) == CodingMethod::Rgb555 {
        let params = &registers.display_parameters[Plane::B.index()];
        let resolution = Resolution::from_bits_per_pixel(params.bits_per_pixel);
        let width = base_width * (2 / resolution.repeat());

        let bytes = decode_rgb555_line(out_b, width, resolution, sources[0], sources[1]);
        if params.pixel_hold_enabled {
            apply_pixel_hold(out_b, params.pixel_hold_factor);
        }

        // Both streams are consumed by the one combined image
        out_a.fill(Color::TRANSPARENT);
        return Ok(LineBytes { plane_a: bytes, plane_b: bytes });
    }

    for (plane, out) in [(Plane::A, out_a), (Plane::B, out_b)] {
        let bytes = decode_plane_line(registers, plane, base_width, sources[plane.index()], out)?;
        consumed.set(plane, bytes);
    }

    Ok(consumed)
}

fn decode_plane_line(
    registers: &Registers,
    plane: Plane,
    base_width: usize,
    src: &[u8],
    out: &mut [Color],
) -> Result<usize, VideoError> {
    let method = registers.coding_method(plane);
    if method == CodingMethod::Off {
        out.fill(Color::TRANSPARENT);
        return Ok(0);
    }

    let params = &registers.display_parameters[plane.index()];
    let resolution = Resolution::from_bits_per_pixel(params.bits_per_pixel);
    let width = base_width * (2 / resolution.repeat());

    let high_bank = registers.control.image_coding_method.clut_high_bank();
    let select = ClutSelect::new(method, plane, high_bank);

    let consumed = match params.image_type {
        ImageType::Mosaic => {
            log::error!("Plane {plane} is configured for mosaic images, which are not supported");
            return Err(VideoError::MosaicUnsupported { plane });
        }
        ImageType::RunLength => {
            let form = RunLengthForm::from_bits_per_pixel(params.bits_per_pixel);
            decode_run_length_line(out, width, resolution, src, &registers.clut, select, form)
        }
        ImageType::Normal => match method {
            CodingMethod::Clut8
            | CodingMethod::Clut7
            | CodingMethod::Clut77
            | CodingMethod::Clut4 => {
                decode_clut_line(out, width, resolution, src, &registers.clut, select)
            }
            CodingMethod::Dyuv => {
                let seed = DyuvState::from_seed(registers.control.dyuv_seed[plane.index()]);
                decode_dyuv_line(out, width, resolution, src, seed)
            }
            CodingMethod::Rgb555 | CodingMethod::Off => {
                unreachable!("RGB555 and OFF are handled before per-plane decoding")
            }
        },
    };

    if params.pixel_hold_enabled {
        apply_pixel_hold(out, params.pixel_hold_factor);
    }

    Ok(consumed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcd212::registers::{DisplayParameters, ImageCodingMethod};

    fn test_clut() -> ColorTable {
        let mut clut = ColorTable::new();
        for i in 0..256 {
            clut.write(i, (i as u32 * 0x010203) & 0x00FF_FFFF);
        }
        clut
    }

    #[test]
    fn clut8_every_index_matches_table() {
        let clut = test_clut();
        let src: Vec<u8> = (0..=255).collect();
        let mut out = vec![Color::TRANSPARENT; 512];

        let select = ClutSelect::new(CodingMethod::Clut8, Plane::A, false);
        let consumed = decode_clut_line(&mut out, 256, Resolution::Double, &src, &clut, select);

        assert_eq!(256, consumed);
        for i in 0..256 {
            assert_eq!(Color::from_rgb24(clut.read(i)), out[i], "index {i}");
            assert_eq!(Color::OPAQUE_ALPHA, out[i].a);
        }
    }

    #[test]
    fn clut7_plane_b_uses_upper_half() {
        let clut = test_clut();
        let src: Vec<u8> = (0..128).map(|i| i | 0x80).collect();
        let mut out = vec![Color::TRANSPARENT; 256];

        let select = ClutSelect::new(CodingMethod::Clut7, Plane::B, false);
        let consumed = decode_clut_line(&mut out, 128, Resolution::Normal, &src, &clut, select);

        assert_eq!(128, consumed);
        for i in 0..128 {
            let expected = clut.color(128 + i);
            assert_eq!([expected, expected], out[2 * i..2 * i + 2], "index {i}");
        }
    }

    #[test]
    fn clut77_high_bank_select() {
        assert_eq!(0x85, ClutSelect::new(CodingMethod::Clut77, Plane::A, true).index(0x05));
        assert_eq!(0x05, ClutSelect::new(CodingMethod::Clut77, Plane::A, false).index(0x85));
        assert_eq!(0x05, ClutSelect::new(CodingMethod::Clut7, Plane::A, true).index(0x85));
    }

    #[test]
    fn clut4_high_nibble_first() {
        let clut = test_clut();
        let mut out = vec![Color::TRANSPARENT; 4];

        let select = ClutSelect::new(CodingMethod::Clut4, Plane::A, false);
        let consumed = decode_clut_line(&mut out, 4, Resolution::Double, &[0x3A, 0x0F], &clut, select);

        assert_eq!(2, consumed);
        assert_eq!(vec![clut.color(3), clut.color(10), clut.color(0), clut.color(15)], out);
    }

    #[test]
    fn rgb555_transparency_bit() {
        let mut out = vec![Color::BLACK; 4];
        let consumed =
            decode_rgb555_line(&mut out, 2, Resolution::Normal, &[0xFC, 0x7C], &[0x1F, 0x00]);

        assert_eq!(2, consumed);
        assert_eq!(Color::rgba(0xF8, 0, 0xF8, 255), out[0]);
        assert_eq!(out[0], out[1]);
        assert_eq!(Color::rgba(0xF8, 0, 0, 0), out[2]);
        assert!(out[3].is_transparent());
    }

    #[test]
    fn pixel_hold_repeats_period_start() {
        let colors: Vec<Color> = (0..8).map(|i| Color::rgb(i, i, i)).collect();
        let mut line = colors.clone();

        apply_pixel_hold(&mut line, 2);
        assert_eq!(
            vec![colors[0], colors[0], colors[0], colors[0], colors[4], colors[4], colors[4], colors[4]],
            line
        );

        let mut line = colors.clone();
        apply_pixel_hold(&mut line, 1);
        assert_eq!(colors, line);
    }

    #[test]
    fn off_planes_are_transparent_and_consume_nothing() {
        let registers = Registers::new();
        let mut out_a = vec![Color::BLACK; 8];
        let mut out_b = vec![Color::BLACK; 8];

        let consumed =
            decode_plane_lines(&registers, 4, [&[0; 16], &[0; 16]], &mut out_a, &mut out_b).unwrap();

        assert_eq!(LineBytes::default(), consumed);
        assert!(out_a.iter().chain(&out_b).all(|color| color.is_transparent()));
    }

    #[test]
    fn rgb555_consumes_both_streams() {
        let mut registers = Registers::new();
        registers.control.image_coding_method = ImageCodingMethod(0x0100);

        let mut out_a = vec![Color::BLACK; 8];
        let mut out_b = vec![Color::BLACK; 8];
        let consumed = decode_plane_lines(
            &registers,
            4,
            [&[0x80; 16], &[0x00; 16]],
            &mut out_a,
            &mut out_b,
        )
        .unwrap();

        assert_eq!(LineBytes { plane_a: 4, plane_b: 4 }, consumed);
        assert!(out_a.iter().all(|color| color.is_transparent()));
        assert!(out_b.iter().all(|&color| color == Color::BLACK));
    }

    #[test]
    fn rgb555_high_resolution_line() {
        let mut registers = Registers::new();
        registers.control.image_coding_method = ImageCodingMethod(0x0100);
        registers.display_parameters[1] =
            DisplayParameters { bits_per_pixel: BitsPerPixel::High8, ..DisplayParameters::default() };

        let high: Vec<u8> = (0..8).map(|x| 0x80 | (x << 2)).collect();
        let low: Vec<u8> = (0..8).collect();
        let mut out_a = vec![Color::BLACK; 8];
        let mut out_b = vec![Color::BLACK; 8];
        let consumed = decode_plane_lines(&registers, 4, [&high[..], &low[..]], &mut out_a, &mut out_b)
            .unwrap();

        assert_eq!(LineBytes { plane_a: 8, plane_b: 8 }, consumed);
        for x in 0..8_u8 {
            assert_eq!(Color::rgba(x << 3, 0, x << 3, 255), out_b[usize::from(x)], "pixel {x}");
        }
        assert!(out_a.iter().all(|color| color.is_transparent()));
    }

    #[test]
    fn double_resolution_doubles_byte_count() {
        let mut registers = Registers::new();
        registers.control.image_coding_method = ImageCodingMethod(0x0003);
        registers.display_parameters[0] =
            DisplayParameters { bits_per_pixel: BitsPerPixel::High8, ..DisplayParameters::default() };

        let mut out_a = vec![Color::TRANSPARENT; 8];
        let mut out_b = vec![Color::TRANSPARENT; 8];
        let consumed =
            decode_plane_lines(&registers, 4, [&[0; 16], &[0; 16]], &mut out_a, &mut out_b).unwrap();

        assert_eq!(LineBytes { plane_a: 8, plane_b: 0 }, consumed);
    }

    #[test]
    fn mosaic_is_rejected() {
        let mut registers = Registers::new();
        registers.control.image_coding_method = ImageCodingMethod(0x0B00);
        registers.display_parameters[1].image_type = ImageType::Mosaic;

        let mut out_a = vec![Color::TRANSPARENT; 8];
        let mut out_b = vec![Color::TRANSPARENT; 8];
        let result = decode_plane_lines(&registers, 4, [&[0; 16], &[0; 16]], &mut out_a, &mut out_b);

        assert!(matches!(result, Err(VideoError::MosaicUnsupported { plane: Plane::B })));
    }
}
