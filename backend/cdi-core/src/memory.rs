//! Video RAM as seen by the display decoder
//!
//! The decoder reads plane data and control programs from a flat byte region of at most 1 MiB;
//! every address wraps within that region. The decoder never writes to it.

pub const VIDEO_RAM_LEN: usize = 1024 * 1024;

const ADDRESS_MASK: u32 = (VIDEO_RAM_LEN - 1) as u32;

/// Read-only view of the region the display decoder fetches from.
pub trait VideoMemory {
    /// Read a byte; `address` wraps within the addressable region.
    fn read_byte(&self, address: u32) -> u8;

    /// Read a big-endian 32-bit control program word.
    fn read_longword(&self, address: u32) -> u32 {
        u32::from_be_bytes([
            self.read_byte(address),
            self.read_byte(address.wrapping_add(1)),
            self.read_byte(address.wrapping_add(2)),
            self.read_byte(address.wrapping_add(3)),
        ])
    }

    /// Copy `out.len()` bytes starting at `address`, wrapping at the end of the region.
    fn copy_wrapping(&self, address: u32, out: &mut [u8]) {
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.read_byte(address.wrapping_add(i as u32));
        }
    }
}

#[must_use]
#[inline]
pub fn mask_address(address: u32) -> u32 {
    address & ADDRESS_MASK
}

#[derive(Debug, Clone)]
pub struct VideoRam(Box<[u8]>);

impl VideoRam {
    #[must_use]
    pub fn new() -> Self {
        Self(vec![0; VIDEO_RAM_LEN].into_boxed_slice())
    }

    pub fn write_byte(&mut self, address: u32, value: u8) {
        self.0[mask_address(address) as usize] = value;
    }

    pub fn write_word(&mut self, address: u32, value: u16) {
        let [msb, lsb] = value.to_be_bytes();
        self.write_byte(address & !1, msb);
        self.write_byte((address & !1).wrapping_add(1), lsb);
    }

    #[must_use]
    pub fn read_word(&self, address: u32) -> u16 {
        u16::from_be_bytes([
            self.read_byte(address & !1),
            self.read_byte((address & !1).wrapping_add(1)),
        ])
    }

    /// Copy a block into video RAM, wrapping at the end of the region.
    pub fn load(&mut self, address: u32, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            self.write_byte(address.wrapping_add(i as u32), byte);
        }
    }
}

impl Default for VideoRam {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoMemory for VideoRam {
    #[inline]
    fn read_byte(&self, address: u32) -> u8 {
        self.0[mask_address(address) as usize]
    }

    fn copy_wrapping(&self, address: u32, out: &mut [u8]) {
        let start = mask_address(address) as usize;
        let first_len = out.len().min(VIDEO_RAM_LEN - start);
        out[..first_len].copy_from_slice(&self.0[start..start + first_len]);

        let mut copied = first_len;
        while copied < out.len() {
            let chunk_len = (out.len() - copied).min(VIDEO_RAM_LEN);
            out[copied..copied + chunk_len].copy_from_slice(&self.0[..chunk_len]);
            copied += chunk_len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_wrap_at_end_of_region() {
        let mut ram = VideoRam::new();
        ram.load(0xFFFFE, &[0x12, 0x34, 0x56, 0x78]);

        assert_eq!(0x12345678, ram.read_longword(0xFFFFE));
        assert_eq!(0x56, ram.read_byte(0));
        assert_eq!(0x12, ram.read_byte(0x1FFFFE));

        let mut out = [0; 4];
        ram.copy_wrapping(0xFFFFE, &mut out);
        assert_eq!([0x12, 0x34, 0x56, 0x78], out);
    }

    #[test]
    fn word_access_is_big_endian_and_aligned() {
        let mut ram = VideoRam::new();
        ram.write_word(0x101, 0xABCD);
        assert_eq!(0xAB, ram.read_byte(0x100));
        assert_eq!(0xCD, ram.read_byte(0x101));
        assert_eq!(0xABCD, ram.read_word(0x100));
    }
}
