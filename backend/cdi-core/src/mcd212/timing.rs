//! Display format, latched once per frame from the display command register and the planes'
//! display parameters

use crate::frame::FrameSize;
use crate::mcd212::registers::{DisplayParameters, SystemRegisters};

const WIDE_LINE_WIDTH: u32 = 384;
const NARROW_LINE_WIDTH: u32 = 360;

const ACTIVE_LINES_60HZ: u32 = 240;
const ACTIVE_LINES_50HZ: u32 = 280;

const TOTAL_LINES_60HZ: u32 = 262;
const TOTAL_LINES_50HZ: u32 = 312;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayFormat {
    /// Normal resolution line width
    pub base_width: u32,
    pub active_lines: u32,
    pub total_lines: u32,
    /// The screen is output at double horizontal resolution
    pub double_width: bool,
    pub sixty_hz: bool,
}

impl DisplayFormat {
    #[must_use]
    pub fn from_registers(system: &SystemRegisters, display_parameters: &[DisplayParameters; 2]) -> Self {
        let base_width = if system.wide_line() { WIDE_LINE_WIDTH } else { NARROW_LINE_WIDTH };
        let sixty_hz = system.sixty_hz();

        let (mut active_lines, mut total_lines) = if sixty_hz {
            (ACTIVE_LINES_60HZ, TOTAL_LINES_60HZ)
        } else {
            (ACTIVE_LINES_50HZ, TOTAL_LINES_50HZ)
        };

        if system.interlaced() {
            active_lines *= 2;
            total_lines *= 2;
        }

        let double_width =
            display_parameters.iter().any(|params| params.bits_per_pixel.is_double_resolution());

        Self { base_width, active_lines, total_lines, double_width, sixty_hz }
    }

    /// Width of each decoded plane line, always at double resolution.
    #[inline]
    #[must_use]
    pub fn plane_width(self) -> u32 {
        2 * self.base_width
    }

    #[must_use]
    pub fn screen_size(self) -> FrameSize {
        let width = if self.double_width { self.plane_width() } else { self.base_width };
        FrameSize { width, height: self.active_lines }
    }
}

impl Default for DisplayFormat {
    fn default() -> Self {
        Self::from_registers(&SystemRegisters::default(), &[DisplayParameters::default(); 2])
    }
}
