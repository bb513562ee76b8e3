//! MCD212 video decoder: two image planes driven by per-channel display control programs,
//! composited with a backdrop and overlaid with a hardware cursor

mod clut;
mod compositor;
mod cursor;
mod dcp;
mod decode;
mod matte;
pub mod registers;
mod timing;
mod transparency;


use crate::api::{CdiVideoConfig, InterruptSink, VideoError};
use crate::frame::{Color, FrameSize, PlaneBuffer};
use crate::mcd212::compositor::CompositeMode;
use crate::mcd212::cursor::CursorOverlay;
use crate::mcd212::dcp::{ControlPrograms, ProgramLimits, ProgramOutcome};
use crate::mcd212::matte::MatteTracker;
use crate::mcd212::registers::{CodingMethod, Plane, Registers, SystemRegister};
use crate::mcd212::transparency::TransparencyKey;
use crate::memory::VideoMemory;

pub use clut::{CLUT_BANK_LEN, CLUT_LEN, ColorTable};
pub use decode::LineBytes;
pub use timing::DisplayFormat;

/// Result of one scanline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanlineResult {
    /// Bytes consumed from each plane's read cursor
    pub consumed: LineBytes,
    /// New read cursors loaded by the display control programs
    pub vsr: [Option<u32>; 2],
}

#[derive(Debug, Clone)]
pub struct Mcd212 {
    registers: Registers,
    programs: ControlPrograms,
    matte: MatteTracker,
    cursor: CursorOverlay,
    format: DisplayFormat,
    line: u32,
    plane_lines: [Vec<Color>; 2],
    frame: PlaneBuffer,
    backdrop: PlaneBuffer,
    config: CdiVideoConfig,
}

impl Mcd212 {
    #[must_use]
    pub fn new(config: CdiVideoConfig) -> Self {
        let format = DisplayFormat::default();
        let mut mcd212 = Self {
            registers: Registers::new(),
            programs: ControlPrograms::new(),
            matte: MatteTracker::new(),
            cursor: CursorOverlay::new(),
            format,
            line: 0,
            plane_lines: [Vec::new(), Vec::new()],
            frame: PlaneBuffer::new(format.screen_size()),
            backdrop: PlaneBuffer::new(FrameSize { width: 1, height: format.active_lines }),
            config,
        };
        mcd212.apply_format();

        mcd212
    }

    pub fn reload_config(&mut self, config: CdiVideoConfig) {
        self.config = config;
    }

    fn limits(&self) -> ProgramLimits {
        ProgramLimits {
            ica_instructions: self.config.ica_instruction_limit,
            dca_instructions_per_line: self.config.dca_instructions_per_line,
            policy: self.config.coding_method_policy,
        }
    }

    fn apply_format(&mut self) {
        let plane_width = self.format.plane_width() as usize;
        for line in &mut self.plane_lines {
            line.resize(plane_width, Color::TRANSPARENT);
        }

        self.frame.resize(self.format.screen_size());
        self.backdrop.resize(FrameSize { width: 1, height: self.format.active_lines });
    }

    /// Latch the display format for the new frame and run both channels' initial control areas.
    ///
    /// Returns read cursors loaded by the initial programs.
    ///
    /// # Errors
    ///
    /// Propagates fatal errors from the control programs.
    pub fn start_frame<M: VideoMemory, I: InterruptSink>(
        &mut self,
        memory: &M,
        interrupts: &mut I,
    ) -> Result<[Option<u32>; 2], VideoError> {
        let format =
            DisplayFormat::from_registers(&self.registers.system, &self.registers.display_parameters);
        if format != self.format {
            log::debug!("Display format changed: {format:?}");
        }
        self.format = format;

        self.begin_frame(memory, interrupts)
    }

    fn begin_frame<M: VideoMemory, I: InterruptSink>(
        &mut self,
        memory: &M,
        interrupts: &mut I,
    ) -> Result<[Option<u32>; 2], VideoError> {
        self.apply_format();
        self.line = 0;

        let limits = self.limits();
        let outcomes = self.programs.run_initial_programs(memory, &mut self.registers, limits)?;
        self.raise_interrupts(outcomes, interrupts);

        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Control registers after initial programs: {:#?}", self.registers.control);
            log::trace!("Display parameters: {:?}", self.registers.display_parameters);
        }

        Ok(outcomes.map(|outcome| outcome.vsr))
    }

    /// Decode, resolve and composite one line from the given plane source bytes, then run the
    /// display control programs that configure the next line.
    ///
    /// Each source slice must hold at least as many bytes as the plane's current coding method
    /// needs for one line; twice the plane line width is always enough.
    ///
    /// # Errors
    ///
    /// Returns an error if a plane uses an unsupported image type or a control program selects an
    /// unsupported mode.
    pub fn advance_scanline<M: VideoMemory, I: InterruptSink>(
        &mut self,
        memory: &M,
        sources: [&[u8]; 2],
        interrupts: &mut I,
    ) -> Result<ScanlineResult, VideoError> {
        let consumed = if self.registers.system.display_enabled() {
            self.render_line(sources)?
        } else {
            if self.line < self.format.active_lines {
                self.frame.line_mut(self.line).fill(Color::BLACK);
            }
            LineBytes::default()
        };

        let limits = self.limits();
        let outcomes = self.programs.run_display_programs(memory, &mut self.registers, limits)?;
        self.raise_interrupts(outcomes, interrupts);

        self.line += 1;

        Ok(ScanlineResult { consumed, vsr: outcomes.map(|outcome| outcome.vsr) })
    }

    fn render_line(&mut self, sources: [&[u8]; 2]) -> Result<LineBytes, VideoError> {
        let [line_a, line_b] = &mut self.plane_lines;
        let consumed = decode::decode_plane_lines(
            &self.registers,
            self.format.base_width as usize,
            sources,
            line_a,
            line_b,
        )?;

        // Plane A carries no image of its own while plane B decodes RGB555
        let rgb555 = self.registers.coding_method(Plane::B) == CodingMethod::Rgb555;
        let control = &self.registers.control;
        let keys = Plane::ALL.map(|plane| {
            let visible = match plane {
                Plane::A => !rgb555 && self.registers.coding_method(plane) != CodingMethod::Off,
                Plane::B => self.registers.coding_method(plane) != CodingMethod::Off,
            };
            visible.then(|| TransparencyKey {
                condition: control.transparency_control.condition(plane),
                transparent_color: control.transparent_color[plane.index()],
                mask_color: control.mask_color[plane.index()],
            })
        });
        let mode = CompositeMode {
            plane_order: control.plane_order,
            mix: control.transparency_control.mix_enabled(),
        };
        let backdrop = Color::from_yrgb(control.backdrop_color);

        log::trace!("Line {}: consumed {consumed:?}, {mode:?}", self.line);

        if self.line >= self.format.active_lines {
            return Ok(consumed);
        }

        self.backdrop.set(0, self.line, backdrop);

        self.matte.start_line(&self.registers.control);

        let double_width = self.format.double_width;
        let out = self.frame.line_mut(self.line);
        for x in 0..self.format.plane_width() as usize {
            if x % 2 == 0 {
                self.matte.step((x >> 1) as u32, &mut self.registers.control);
            }

            let pixels = Plane::ALL.map(|plane| {
                let pixel = self.plane_lines[plane.index()][x];
                match keys[plane.index()] {
                    Some(key) => transparency::resolve(
                        pixel,
                        key,
                        [self.matte.flag(plane, 0), self.matte.flag(plane, 1)],
                    ),
                    None => pixel,
                }
            });

            let color = compositor::composite_pixel(
                pixels,
                backdrop,
                self.registers.control.contribution_factor,
                mode,
            );

            if double_width {
                out[x] = color;
            } else if x % 2 == 0 {
                out[x / 2] = color;
            }
        }

        Ok(consumed)
    }

    fn raise_interrupts<I: InterruptSink>(&self, outcomes: [ProgramOutcome; 2], interrupts: &mut I) {
        for (channel, outcome) in Plane::ALL.into_iter().zip(outcomes) {
            if outcome.interrupt {
                log::trace!("Channel {channel} raised interrupt on line {}", self.line);
                interrupts.raise_interrupt(self.config.interrupt_line);
            }
        }
    }

    /// Draw the cursor over the completed frame and advance the cursor blink timer.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::DoubleResolutionCursor`] if the cursor is enabled in double
    /// resolution mode.
    pub fn finalize_frame(&mut self) -> Result<&PlaneBuffer, VideoError> {
        self.cursor.draw(&mut self.frame, &self.registers.control, self.format.double_width)?;
        self.cursor.end_field(self.registers.control.cursor_control, self.format.sixty_hz);

        Ok(&self.frame)
    }

    #[must_use]
    pub fn frame(&self) -> &PlaneBuffer {
        &self.frame
    }

    /// Backdrop color per line, as a 1-pixel-wide strip.
    #[must_use]
    pub fn backdrop(&self) -> &PlaneBuffer {
        &self.backdrop
    }

    /// The last decoded line of a plane, at double resolution and before transparency resolution.
    #[must_use]
    pub fn plane_line(&self, plane: Plane) -> &[Color] {
        &self.plane_lines[plane.index()]
    }

    #[must_use]
    pub fn format(&self) -> DisplayFormat {
        self.format
    }

    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[must_use]
    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Read a control register by its instruction opcode.
    #[must_use]
    pub fn read_register(&self, opcode: u8) -> Option<u32> {
        self.registers.read_control(opcode)
    }

    /// Write a control register by its instruction opcode, with the same effects as a control
    /// program instruction from the channel that owns the register.
    pub fn write_register(&mut self, opcode: u8, value: u32) {
        if opcode < 0x80 {
            log::warn!("Bus write to control opcode {opcode:02X} is not a register; ignoring");
            return;
        }

        let channel = dcp::register_owner(opcode).unwrap_or(Plane::A);
        dcp::write_control_register(
            &mut self.registers,
            channel,
            opcode,
            value & 0x00FF_FFFF,
            self.config.coding_method_policy,
        );
    }

    /// A plane's display parameters in LOAD DISPLAY PARAMETERS operand form.
    #[must_use]
    pub fn display_parameters(&self, plane: Plane) -> u32 {
        self.registers.display_parameters[plane.index()].to_operand()
    }

    #[must_use]
    pub fn clut_entry(&self, index: usize) -> u32 {
        self.registers.clut.read(index)
    }

    pub fn write_clut_entry(&mut self, index: usize, rgb: u32) {
        self.registers.clut.write(index, rgb);
    }

    #[must_use]
    pub fn matte_command(&self, index: usize) -> u32 {
        self.registers.control.matte_commands[index % registers::MATTE_TABLE_LEN].0
    }

    pub fn write_matte_command(&mut self, index: usize, value: u32) {
        self.registers.control.matte_commands[index % registers::MATTE_TABLE_LEN] =
            registers::MatteCommand(value & 0x00FF_FFFF);
    }

    #[must_use]
    pub fn cursor_pattern_row(&self, row: usize) -> u16 {
        self.registers.control.cursor_pattern[row % registers::CURSOR_SIZE]
    }

    pub fn write_cursor_pattern_row(&mut self, row: usize, pattern: u16) {
        self.registers.control.cursor_pattern[row % registers::CURSOR_SIZE] = pattern;
    }

    /// Read a system register by its offset in the register block. Reading the channel 2 status
    /// register clears the interrupt flags.
    pub fn read_system_register(&mut self, offset: u32) -> u16 {
        let system = &mut self.registers.system;
        match SystemRegister::from_offset(offset) {
            Some(SystemRegister::ControlStatus1) => {
                let display_active =
                    system.display_enabled() && self.line < self.format.active_lines;
                u16::from(display_active) << 7
            }
            Some(SystemRegister::ControlStatus2) => {
                let status =
                    (u16::from(system.interrupt_flags[0]) << 2) | (u16::from(system.interrupt_flags[1]) << 1);
                system.interrupt_flags = [false; 2];
                status
            }
            Some(SystemRegister::DisplayCommand1) => system.display_command[0],
            Some(SystemRegister::DisplayCommand2) => system.display_command[1],
            Some(SystemRegister::DisplayDecoder1) => system.display_decoder[0],
            Some(SystemRegister::DisplayDecoder2) => system.display_decoder[1],
            None => {
                log::warn!("Read from unmapped video register offset {offset:02X}");
                0
            }
        }
    }

    pub fn write_system_register(&mut self, offset: u32, value: u16) {
        let system = &mut self.registers.system;
        match SystemRegister::from_offset(offset) {
            Some(SystemRegister::ControlStatus1) => system.control_status[0] = value,
            Some(SystemRegister::ControlStatus2) => system.control_status[1] = value,
            Some(register @ (SystemRegister::DisplayCommand1 | SystemRegister::DisplayCommand2)) => {
                let channel = if register == SystemRegister::DisplayCommand1 { Plane::A } else { Plane::B };
                system.display_command[channel.index()] = value;
                log::debug!(
                    "DCR{} write {value:04X}: ICA {} DCA {}",
                    channel.index() + 1,
                    system.ica_enabled(channel),
                    system.dca_enabled(channel)
                );
            }
            Some(SystemRegister::DisplayDecoder1) => system.display_decoder[0] = value,
            Some(SystemRegister::DisplayDecoder2) => system.display_decoder[1] = value,
            None => log::warn!("Write to unmapped video register offset {offset:02X}: {value:04X}"),
        }
    }

    /// Turn both planes and the cursor off and restart control program sequencing. CLUT contents
    /// and the selected bank are kept.
    pub fn reset(&mut self) {
        self.registers.reset();
        self.programs.reset();
        self.matte = MatteTracker::new();
        self.cursor.reset();
        self.line = 0;
        self.frame.fill(Color::BLACK);
    }
}
