//! Display control program interpreter and the per-channel area driver
//!
//! Each channel runs an "initial" control area (ICA) once per frame and a "display" control area
//! (DCA) once per line. Instructions are 32-bit big-endian words: the top byte is the opcode and the
//! low 24 bits are the operand.

use crate::api::VideoError;
use crate::mcd212::registers::{
    CURSOR_SIZE, CursorControl, CursorPosition, ImageCodingMethod, MatteCommand, Plane,
    PlaneOrder, Registers, TransparencyControl,
};
use crate::memory::{VideoMemory, mask_address};
use crate::num::GetBit;
use cdi_config::CodingMethodPolicy;

const ICA_START: [u32; 2] = [0x00_0400, 0x08_0400];

/// Control flow requested by a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
    /// Latch an interrupt request and continue with the next instruction
    Interrupt,
    ReloadDcp { address: u32, stop: bool },
    ReloadIca(u32),
    ReloadVsrAndStop(u32),
}

/// Execute one control program instruction from `channel` against the register file.
///
/// # Errors
///
/// Returns [`VideoError::ReservedBitsPerPixel`] if LOAD DISPLAY PARAMETERS selects the reserved
/// bits-per-pixel value.
pub fn execute_instruction(
    registers: &mut Registers,
    channel: Plane,
    instruction: u32,
    policy: CodingMethodPolicy,
) -> Result<Flow, VideoError> {
    let opcode = (instruction >> 24) as u8;
    let operand = instruction & 0x00FF_FFFF;

    log::trace!("Channel {channel} DCP instruction {instruction:08X}");

    let flow = match opcode {
        0x00..=0x0F => Flow::Stop,
        0x10..=0x1F => Flow::Continue,
        0x20..=0x2F => Flow::ReloadDcp { address: mask_address(operand), stop: false },
        0x30..=0x3F => Flow::ReloadDcp { address: mask_address(operand), stop: true },
        0x40..=0x4F => Flow::ReloadIca(mask_address(operand)),
        0x50..=0x5F => Flow::ReloadVsrAndStop(mask_address(operand)),
        0x60..=0x6F => Flow::Interrupt,
        0x70..=0x7F => {
            load_display_parameters(registers, channel, operand)?;
            Flow::Continue
        }
        0x80..=0xFF => {
            write_control_register(registers, channel, opcode, operand, policy);
            Flow::Continue
        }
    };

    Ok(flow)
}

fn load_display_parameters(
    registers: &mut Registers,
    channel: Plane,
    operand: u32,
) -> Result<(), VideoError> {
    let params = &mut registers.display_parameters[channel.index()];
    if let Err(value) = params.load(operand) {
        log::error!("Channel {channel} selected reserved bits-per-pixel value {value}");
        return Err(VideoError::ReservedBitsPerPixel { plane: channel, value });
    }

    log::debug!("Plane {channel} display parameters: {params:?}");

    Ok(())
}

/// The channel that owns a plane-specific register, or `None` if either channel may write it.
#[must_use]
pub fn register_owner(opcode: u8) -> Option<Plane> {
    match opcode {
        0xC0..=0xC2 | 0xC4 | 0xC7 | 0xCA | 0xCD..=0xCF | 0xD8 | 0xD9 | 0xDB => Some(Plane::A),
        0xC6 | 0xC9 | 0xCB | 0xDA | 0xDC => Some(Plane::B),
        _ => None,
    }
}

/// Apply a register load instruction (opcodes 0x80-0xFF).
///
/// Writes from a channel that does not own the register are ignored, as are CLUT writes from
/// channel B to banks 0-1.
pub fn write_control_register(
    registers: &mut Registers,
    channel: Plane,
    opcode: u8,
    value: u32,
    policy: CodingMethodPolicy,
) {
    if register_owner(opcode).is_some_and(|owner| owner != channel) {
        log::warn!("Channel {channel} write to register {opcode:02X} owned by the other channel; ignoring");
        return;
    }

    let control = &mut registers.control;
    match opcode {
        0x80..=0xBF => {
            let bank = control.clut_bank;
            if channel == Plane::B && bank < 2 {
                log::trace!("Ignoring channel B CLUT write to bank {bank}");
                return;
            }

            registers.clut.write_banked(bank, opcode - 0x80, value);
        }
        0xC0 => {
            let icm = ImageCodingMethod(value);
            if let Some(rule) = icm.disallowed_combination() {
                if policy.rejects_disallowed() {
                    log::warn!("Rejecting image coding method {value:06X}: {rule}");
                    return;
                }
                log::warn!("Disallowed image coding method {value:06X}: {rule}");
            }

            if icm.external_video() {
                log::warn!("External video requested but not available; backdrop is used instead");
            }

            control.image_coding_method = icm;
            log::debug!(
                "Coding methods: A={:?} B={:?}, high bank {}, two mattes {}",
                icm.coding_method(Plane::A),
                icm.coding_method(Plane::B),
                icm.clut_high_bank(),
                icm.two_mattes()
            );
        }
        0xC1 => {
            control.transparency_control = TransparencyControl(value);
            log::debug!(
                "Transparency control: A={:?} B={:?} mix={}",
                control.transparency_control.condition(Plane::A),
                control.transparency_control.condition(Plane::B),
                control.transparency_control.mix_enabled()
            );
        }
        0xC2 => {
            control.plane_order = PlaneOrder::from_bit(value.bit(0));
            log::debug!("Plane order: {:?}", control.plane_order);
        }
        0xC3 => control.clut_bank = value.bits(0..=1) as u8,
        0xC4 => control.transparent_color[0] = value,
        0xC6 => control.transparent_color[1] = value,
        0xC7 => control.mask_color[0] = value,
        0xC9 => control.mask_color[1] = value,
        0xCA => control.dyuv_seed[0] = value,
        0xCB => control.dyuv_seed[1] = value,
        0xCD => control.cursor_position = CursorPosition(value),
        0xCE => control.cursor_control = CursorControl(value),
        0xCF => {
            let row = value.bits(16..=19) as usize;
            control.cursor_pattern[row % CURSOR_SIZE] = value as u16;
        }
        0xD0..=0xD7 => {
            control.matte_commands[usize::from(opcode - 0xD0)] = MatteCommand(value);
        }
        0xD8 => control.backdrop_color = value.bits(0..=3) as u8,
        0xD9 | 0xDA => {
            let plane = if opcode == 0xD9 { Plane::A } else { Plane::B };
            control.mosaic_factor[plane.index()] = value;
            registers.display_parameters[plane.index()].load_pixel_hold(value);
        }
        0xDB => control.contribution_factor[0] = value.bits(0..=5) as u8,
        0xDC => control.contribution_factor[1] = value.bits(0..=5) as u8,
        _ => {
            log::warn!("Channel {channel} unknown DCP opcode {opcode:02X} (operand {value:06X}); ignoring");
        }
    }
}

/// What a channel's program produced that the caller has to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgramOutcome {
    /// New read cursor from RELOAD VSR
    pub vsr: Option<u32>,
    /// An INTERRUPT instruction ran and the channel's interrupts are not disabled
    pub interrupt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramLimits {
    pub ica_instructions: u32,
    pub dca_instructions_per_line: u32,
    pub policy: CodingMethodPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ChannelState {
    /// Start of the next line's display control area
    dcp: Option<u32>,
    dca_halted: bool,
}

/// ICA/DCA sequencing for both channels.
#[derive(Debug, Clone, Default)]
pub struct ControlPrograms {
    channels: [ChannelState; 2],
}

impl ControlPrograms {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Run each enabled channel's initial control area.
    ///
    /// # Errors
    ///
    /// Propagates fatal errors from instruction execution.
    pub fn run_initial_programs<M: VideoMemory>(
        &mut self,
        memory: &M,
        registers: &mut Registers,
        limits: ProgramLimits,
    ) -> Result<[ProgramOutcome; 2], VideoError> {
        let mut outcomes = [ProgramOutcome::default(); 2];

        for channel in Plane::ALL {
            let state = &mut self.channels[channel.index()];
            state.dca_halted = false;

            if !registers.system.ica_enabled(channel) {
                continue;
            }

            let outcome = &mut outcomes[channel.index()];
            let mut address = ICA_START[channel.index()];

            for _ in 0..limits.ica_instructions {
                let instruction = memory.read_longword(address);
                address = mask_address(address.wrapping_add(4));

                match execute_instruction(registers, channel, instruction, limits.policy)? {
                    Flow::Continue => {}
                    Flow::Interrupt => latch_interrupt(registers, channel, outcome),
                    Flow::Stop => break,
                    Flow::ReloadDcp { address: dcp, stop } => {
                        state.dcp = Some(dcp);
                        if stop {
                            break;
                        }
                    }
                    Flow::ReloadIca(target) => address = target,
                    Flow::ReloadVsrAndStop(vsr) => {
                        outcome.vsr = Some(vsr);
                        break;
                    }
                }
            }
        }

        Ok(outcomes)
    }

    /// Run one line's worth of each enabled channel's display control area.
    ///
    /// # Errors
    ///
    /// Propagates fatal errors from instruction execution.
    pub fn run_display_programs<M: VideoMemory>(
        &mut self,
        memory: &M,
        registers: &mut Registers,
        limits: ProgramLimits,
    ) -> Result<[ProgramOutcome; 2], VideoError> {
        let mut outcomes = [ProgramOutcome::default(); 2];

        for channel in Plane::ALL {
            let state = &mut self.channels[channel.index()];
            if !registers.system.dca_enabled(channel) || state.dca_halted {
                continue;
            }

            let Some(start) = state.dcp else { continue };

            let outcome = &mut outcomes[channel.index()];
            let mut address = start;
            let mut next_dcp = mask_address(start.wrapping_add(4 * limits.dca_instructions_per_line));

            for _ in 0..limits.dca_instructions_per_line {
                let instruction = memory.read_longword(address);
                address = mask_address(address.wrapping_add(4));

                match execute_instruction(registers, channel, instruction, limits.policy)? {
                    Flow::Continue => {}
                    Flow::Interrupt => latch_interrupt(registers, channel, outcome),
                    Flow::Stop => {
                        log::trace!("Channel {channel} display program stopped until next frame");
                        state.dca_halted = true;
                        break;
                    }
                    Flow::ReloadDcp { address: dcp, stop } => {
                        next_dcp = dcp;
                        if stop {
                            break;
                        }
                    }
                    Flow::ReloadIca(target) => address = target,
                    Flow::ReloadVsrAndStop(vsr) => {
                        outcome.vsr = Some(vsr);
                        break;
                    }
                }
            }

            state.dcp = Some(next_dcp);
        }

        Ok(outcomes)
    }
}

fn latch_interrupt(registers: &mut Registers, channel: Plane, outcome: &mut ProgramOutcome) {
    if registers.system.interrupt_disabled(channel) {
        log::trace!("Channel {channel} interrupt suppressed");
        return;
    }

    registers.system.interrupt_flags[channel.index()] = true;
    outcome.interrupt = true;
}
