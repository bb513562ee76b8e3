//! 256-entry color look-up table, addressed by control programs as 4 banks of 64 entries

use crate::frame::Color;

pub const CLUT_LEN: usize = 256;
pub const CLUT_BANK_LEN: usize = 64;

const RGB_MASK: u32 = 0x00FF_FFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    entries: Box<[u32; CLUT_LEN]>,
}

impl ColorTable {
    pub fn new() -> Self {
        Self { entries: Box::new([0; CLUT_LEN]) }
    }

    /// Entry index for `offset` (0-63) within `bank` (0-3).
    #[inline]
    #[must_use]
    pub fn banked_index(bank: u8, offset: u8) -> usize {
        (usize::from(bank & 3) * CLUT_BANK_LEN) + usize::from(offset & 0x3F)
    }

    #[inline]
    #[must_use]
    pub fn read(&self, index: usize) -> u32 {
        self.entries[index & (CLUT_LEN - 1)]
    }

    #[inline]
    pub fn write(&mut self, index: usize, rgb: u32) {
        self.entries[index & (CLUT_LEN - 1)] = rgb & RGB_MASK;
    }

    #[must_use]
    pub fn read_banked(&self, bank: u8, offset: u8) -> u32 {
        self.read(Self::banked_index(bank, offset))
    }

    pub fn write_banked(&mut self, bank: u8, offset: u8, rgb: u32) {
        self.write(Self::banked_index(bank, offset), rgb);
    }

    /// The entry as an opaque pixel.
    #[inline]
    #[must_use]
    pub fn color(&self, index: usize) -> Color {
        Color::from_rgb24(self.read(index))
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banked_addressing() {
        let mut clut = ColorTable::new();
        clut.write_banked(2, 5, 0xFF12_3456);

        assert_eq!(0x12_3456, clut.read(133));
        assert_eq!(0x12_3456, clut.read_banked(2, 5));
        assert_eq!(Color::rgb(0x12, 0x34, 0x56), clut.color(133));
    }
}
