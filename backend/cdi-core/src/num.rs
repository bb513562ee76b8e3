//! Bitfield accessors for hardware register values
//!
//! Registers are stored as plain integers and decoded on read through these helpers rather than
//! through packed structs, so every field's position is spelled out at the point of use.

use std::ops::RangeInclusive;

pub trait GetBit {
    #[must_use]
    fn bit(self, i: u8) -> bool;

    /// Extract an inclusive bit range, shifted down to bit 0.
    #[must_use]
    fn bits(self, range: RangeInclusive<u8>) -> Self;
}

macro_rules! impl_get_bit {
    ($($t:ty),* $(,)?) => {
        $(
            impl GetBit for $t {
                #[inline]
                fn bit(self, i: u8) -> bool {
                    debug_assert!(u32::from(i) < <$t>::BITS);
                    self & (1 << i) != 0
                }

                #[inline]
                fn bits(self, range: RangeInclusive<u8>) -> Self {
                    let (start, end) = (*range.start(), *range.end());
                    debug_assert!(start <= end && u32::from(end) < <$t>::BITS);

                    let len = u32::from(end - start + 1);
                    let mask = if len == <$t>::BITS { <$t>::MAX } else { (1 << len) - 1 };
                    (self >> start) & mask
                }
            }
        )*
    };
}

impl_get_bit!(u8, u16, u32);

/// Accessors for the 24-bit RGB values held in color registers and CLUT entries.
pub trait Rgb24Ext {
    fn red(self) -> u8;

    fn green(self) -> u8;

    fn blue(self) -> u8;
}

impl Rgb24Ext for u32 {
    #[inline(always)]
    fn red(self) -> u8 {
        (self >> 16) as u8
    }

    #[inline(always)]
    fn green(self) -> u8 {
        (self >> 8) as u8
    }

    #[inline(always)]
    fn blue(self) -> u8 {
        self as u8
    }
}
