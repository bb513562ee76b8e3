//! Hardware cursor: a 16x16 one-bit pattern drawn over the finished frame

use crate::api::VideoError;
use crate::frame::{Color, PlaneBuffer};
use crate::mcd212::registers::{CURSOR_SIZE, ControlRegisters, CursorControl};

// One blink period unit is 1/5 of a second
const FIELDS_PER_UNIT_50HZ: u32 = 10;
const FIELDS_PER_UNIT_60HZ: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlinkPhase {
    On,
    Off,
}

#[derive(Debug, Clone)]
pub struct CursorOverlay {
    phase: BlinkPhase,
    fields: u32,
}

impl CursorOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self { phase: BlinkPhase::On, fields: 0 }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance the blink timer by one field.
    pub fn end_field(&mut self, control: CursorControl, sixty_hz: bool) {
        if control.off_period() == 0 {
            self.phase = BlinkPhase::On;
            self.fields = 0;
            return;
        }

        let fields_per_unit = if sixty_hz { FIELDS_PER_UNIT_60HZ } else { FIELDS_PER_UNIT_50HZ };
        let period = match self.phase {
            BlinkPhase::On => control.on_period().max(1),
            BlinkPhase::Off => control.off_period(),
        };

        self.fields += 1;
        if self.fields >= period * fields_per_unit {
            self.fields = 0;
            self.phase = match self.phase {
                BlinkPhase::On => BlinkPhase::Off,
                BlinkPhase::Off => BlinkPhase::On,
            };
            log::trace!("Cursor blink phase now {:?}", self.phase);
        }
    }

    /// Cursor color for the current blink phase, or `None` if the cursor is hidden.
    fn color(&self, control: CursorControl) -> Option<Color> {
        let code = control.color_code();
        match self.phase {
            BlinkPhase::On => Some(Color::from_yrgb(code)),
            BlinkPhase::Off if control.blink_complement() => Some(Color::from_yrgb(code ^ 0x07)),
            BlinkPhase::Off => None,
        }
    }

    /// Overwrite frame pixels wherever the cursor pattern has a bit set.
    ///
    /// `double_width` indicates a frame at double horizontal resolution; otherwise the cursor X
    /// position is halved.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::DoubleResolutionCursor`] if the cursor is enabled in double
    /// resolution mode.
    pub fn draw(
        &self,
        frame: &mut PlaneBuffer,
        control: &ControlRegisters,
        double_width: bool,
    ) -> Result<(), VideoError> {
        let cursor_control = control.cursor_control;
        if !cursor_control.enabled() {
            return Ok(());
        }

        if cursor_control.double_resolution() {
            log::error!("Double resolution cursor is not supported");
            return Err(VideoError::DoubleResolutionCursor);
        }

        let Some(color) = self.color(cursor_control) else { return Ok(()) };

        let position = control.cursor_position;
        let (x0, pixel_width) = if double_width { (position.x(), 2) } else { (position.x() >> 1, 1) };
        let y0 = position.y();

        for (row, &pattern) in control.cursor_pattern.iter().enumerate() {
            let y = y0 + row as u32;
            for col in 0..CURSOR_SIZE {
                if pattern & (0x8000 >> col) == 0 {
                    continue;
                }

                let x = x0 + col as u32 * pixel_width;
                for dx in 0..pixel_width {
                    frame.set(x + dx, y, color);
                }
            }
        }

        Ok(())
    }
}

impl Default for CursorOverlay {
    fn default() -> Self {
        Self::new()
    }
}
