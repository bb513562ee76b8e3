//! Pixel and frame buffer types shared by the decoders, the compositor, and the frame consumer

use crate::num::Rgb24Ext;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const OPAQUE_ALPHA: u8 = 255;

    #[must_use]
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: Self::OPAQUE_ALPHA }
    }

    #[must_use]
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from the low 24 bits of a register value; the top byte is ignored.
    #[must_use]
    #[inline]
    pub fn from_rgb24(rgb: u32) -> Self {
        Self::rgb(rgb.red(), rgb.green(), rgb.blue())
    }

    #[must_use]
    #[inline]
    pub fn to_rgb24(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }

    #[must_use]
    #[inline]
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    #[must_use]
    #[inline]
    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Decode a 4-bit YRGB color code as used by the backdrop and cursor registers.
    ///
    /// Bit 3 selects full or half intensity, bits 2/1/0 enable red/green/blue.
    #[must_use]
    pub fn from_yrgb(code: u8) -> Self {
        let level = if code & 0x08 != 0 { 255 } else { 128 };
        let channel = |bit: u8| if code & (1 << bit) != 0 { level } else { 0 };
        Self::rgb(channel(2), channel(1), channel(0))
    }
}

impl Default for Color {
    #[inline]
    fn default() -> Self {
        Self::BLACK
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    #[must_use]
    pub fn len(self) -> usize {
        (self.width * self.height) as usize
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// A width×height grid of pixels, stored row-major.
#[derive(Debug, Clone)]
pub struct PlaneBuffer {
    size: FrameSize,
    pixels: Box<[Color]>,
}

impl PlaneBuffer {
    #[must_use]
    pub fn new(size: FrameSize) -> Self {
        Self { size, pixels: vec![Color::TRANSPARENT; size.len()].into_boxed_slice() }
    }

    #[must_use]
    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Reallocate if the size changed; contents are unspecified afterwards.
    pub fn resize(&mut self, size: FrameSize) {
        if size != self.size {
            *self = Self::new(size);
        }
    }

    #[must_use]
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// # Panics
    ///
    /// Panics if `y` is outside the buffer.
    #[must_use]
    pub fn line(&self, y: u32) -> &[Color] {
        let start = (y * self.size.width) as usize;
        &self.pixels[start..start + self.size.width as usize]
    }

    /// # Panics
    ///
    /// Panics if `y` is outside the buffer.
    pub fn line_mut(&mut self, y: u32) -> &mut [Color] {
        let start = (y * self.size.width) as usize;
        &mut self.pixels[start..start + self.size.width as usize]
    }

    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        (x < self.size.width && y < self.size.height)
            .then(|| self.pixels[(y * self.size.width + x) as usize])
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        if x < self.size.width && y < self.size.height {
            self.pixels[(y * self.size.width + x) as usize] = color;
        }
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }
}
