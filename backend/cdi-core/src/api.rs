//! CD-i video public interface

use crate::frame::{Color, FrameSize, PlaneBuffer};
use crate::mcd212::Mcd212;
use crate::mcd212::registers::Plane;
use crate::memory::{VideoMemory, VideoRam, mask_address};
use cdi_config::{CdiAspectRatio, CodingMethodPolicy};
use cdi_proc_macros::ConfigDisplay;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ConfigDisplay)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct CdiVideoConfig {
    #[cfg_attr(feature = "clap", arg(long, value_enum, default_value_t))]
    pub coding_method_policy: CodingMethodPolicy,
    /// Instruction budget for each channel's initial control area per frame
    #[cfg_attr(feature = "clap", arg(long, default_value_t = 4096))]
    pub ica_instruction_limit: u32,
    /// Instructions executed from each channel's display control area per line
    #[cfg_attr(feature = "clap", arg(long, default_value_t = 16))]
    pub dca_instructions_per_line: u32,
    /// Interrupt line passed to the interrupt sink
    #[cfg_attr(feature = "clap", arg(long, default_value_t = 4))]
    pub interrupt_line: u8,
    #[cfg_attr(feature = "clap", arg(long, value_enum, default_value_t))]
    pub aspect_ratio: CdiAspectRatio,
}

impl Default for CdiVideoConfig {
    fn default() -> Self {
        Self {
            coding_method_policy: CodingMethodPolicy::default(),
            ica_instruction_limit: 4096,
            dca_instructions_per_line: 16,
            interrupt_line: 4,
            aspect_ratio: CdiAspectRatio::default(),
        }
    }
}

/// Unimplemented hardware features. These abort the current operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VideoError {
    #[error("Plane {plane} uses the mosaic image type, which is not supported")]
    MosaicUnsupported { plane: Plane },
    #[error("Plane {plane} selected reserved bits-per-pixel value {value}")]
    ReservedBitsPerPixel { plane: Plane, value: u32 },
    #[error("Double resolution cursor is not supported")]
    DoubleResolutionCursor,
}

#[derive(Debug, Error)]
pub enum CdiError<RErr> {
    #[error("Video decoder error: {0}")]
    Video(#[from] VideoError),
    #[error("Error rendering video output: {0}")]
    Render(RErr),
}

/// Receives interrupt requests from the display control programs.
pub trait InterruptSink {
    fn raise_interrupt(&mut self, line: u8);
}

/// Consumer of completed frames.
pub trait Renderer {
    type Err;

    /// Render a frame.
    ///
    /// If pixel aspect ratio is None, the frame should be stretched to fill the output.
    ///
    /// # Errors
    ///
    /// This method will return an error if it is unable to render the frame.
    fn render_frame(
        &mut self,
        frame_buffer: &[Color],
        frame_size: FrameSize,
        pixel_aspect_ratio: Option<f64>,
    ) -> Result<(), Self::Err>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEffect {
    None,
    FrameRendered,
}

const VSR_OFFSETS: [u32; 2] = [0x14, 0x04];

/// Video RAM, the two plane read cursors, and line scheduling around the video decoder.
#[derive(Debug, Clone)]
pub struct CdiVideo {
    mcd212: Mcd212,
    ram: VideoRam,
    vsr: [u32; 2],
    line: u32,
    sources: [Vec<u8>; 2],
    config: CdiVideoConfig,
}

impl CdiVideo {
    #[must_use]
    pub fn new(config: CdiVideoConfig) -> Self {
        log::info!("Running with config: {config}");

        Self {
            mcd212: Mcd212::new(config),
            ram: VideoRam::new(),
            vsr: [0; 2],
            line: 0,
            sources: [Vec::new(), Vec::new()],
            config,
        }
    }

    pub fn reload_config(&mut self, config: CdiVideoConfig) {
        log::info!("Reloading config: {config}");

        self.config = config;
        self.mcd212.reload_config(config);
    }

    /// Run one scanline. Line 0 starts a new frame; the last line of the frame hands the finished
    /// frame to the renderer.
    ///
    /// # Errors
    ///
    /// Returns an error if the video decoder hits an unsupported mode or the renderer fails.
    pub fn tick_scanline<I: InterruptSink, R: Renderer>(
        &mut self,
        interrupts: &mut I,
        renderer: &mut R,
    ) -> Result<TickEffect, CdiError<R::Err>> {
        if self.line == 0 {
            let reloads = self.mcd212.start_frame(&self.ram, interrupts)?;
            self.apply_vsr_reloads(reloads);
        }

        let format = self.mcd212.format();
        if self.line < format.active_lines {
            // Run-length lines can read up to two bytes per double resolution pixel
            let source_len = 2 * format.plane_width() as usize + 2;
            for (plane, source) in self.sources.iter_mut().enumerate() {
                source.resize(source_len, 0);
                self.ram.copy_wrapping(self.vsr[plane], source);
            }

            let [source_a, source_b] = &self.sources;
            let result = self.mcd212.advance_scanline(&self.ram, [source_a, source_b], interrupts)?;

            for plane in Plane::ALL {
                let consumed = result.consumed.get(plane) as u32;
                self.vsr[plane.index()] = mask_address(self.vsr[plane.index()].wrapping_add(consumed));
            }
            self.apply_vsr_reloads(result.vsr);
        }

        self.line += 1;
        if self.line < format.total_lines {
            return Ok(TickEffect::None);
        }

        self.line = 0;

        let pixel_aspect_ratio =
            self.config.aspect_ratio.to_pixel_aspect_ratio(!format.sixty_hz, format.double_width);
        let frame = self.mcd212.finalize_frame()?;
        renderer
            .render_frame(frame.pixels(), frame.size(), pixel_aspect_ratio)
            .map_err(CdiError::Render)?;

        Ok(TickEffect::FrameRendered)
    }

    fn apply_vsr_reloads(&mut self, reloads: [Option<u32>; 2]) {
        for (vsr, reload) in self.vsr.iter_mut().zip(reloads) {
            if let Some(address) = reload {
                *vsr = address;
            }
        }
    }

    #[must_use]
    pub fn frame(&self) -> &PlaneBuffer {
        self.mcd212.frame()
    }

    #[must_use]
    pub fn scanline(&self) -> u32 {
        self.line
    }

    #[must_use]
    pub fn read_cursor(&self, plane: Plane) -> u32 {
        self.vsr[plane.index()]
    }

    #[must_use]
    pub fn mcd212(&self) -> &Mcd212 {
        &self.mcd212
    }

    pub fn mcd212_mut(&mut self) -> &mut Mcd212 {
        &mut self.mcd212
    }

    #[must_use]
    pub fn read_ram_byte(&self, address: u32) -> u8 {
        self.ram.read_byte(address)
    }

    #[must_use]
    pub fn read_ram_word(&self, address: u32) -> u16 {
        self.ram.read_word(address)
    }

    pub fn write_ram_byte(&mut self, address: u32, value: u8) {
        self.ram.write_byte(address, value);
    }

    pub fn write_ram_word(&mut self, address: u32, value: u16) {
        self.ram.write_word(address, value);
    }

    pub fn load_ram(&mut self, address: u32, bytes: &[u8]) {
        self.ram.load(address, bytes);
    }

    /// Read a register in the system register block.
    ///
    /// The video start registers hold the low 16 bits of each plane's read cursor; the high bits
    /// come from the low 4 bits of the channel's display command register.
    pub fn read_register(&mut self, offset: u32) -> u16 {
        match vsr_plane(offset) {
            Some(plane) => self.vsr[plane.index()] as u16,
            None => self.mcd212.read_system_register(offset),
        }
    }

    pub fn write_register(&mut self, offset: u32, value: u16) {
        if let Some(plane) = vsr_plane(offset) {
            let vsr = &mut self.vsr[plane.index()];
            *vsr = (*vsr & !0xFFFF) | u32::from(value);
            log::trace!("VSR{} set to {:05X}", plane.index() + 1, *vsr);
            return;
        }

        self.mcd212.write_system_register(offset, value);

        // DCRx low bits hold the high bits of the read cursor
        if let Some(plane) = display_command_plane(offset) {
            let vsr = &mut self.vsr[plane.index()];
            *vsr = mask_address((u32::from(value & 0xF) << 16) | (*vsr & 0xFFFF));
        }
    }

    pub fn reset(&mut self) {
        self.mcd212.reset();
        self.vsr = [0; 2];
        self.line = 0;
    }
}

fn vsr_plane(offset: u32) -> Option<Plane> {
    Plane::ALL.into_iter().find(|plane| VSR_OFFSETS[plane.index()] == offset & 0x1E)
}

fn display_command_plane(offset: u32) -> Option<Plane> {
    match offset & 0x1E {
        0x12 => Some(Plane::A),
        0x02 => Some(Plane::B),
        _ => None,
    }
}
