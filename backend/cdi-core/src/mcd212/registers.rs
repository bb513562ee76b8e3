//! Register file: control registers written by the display control programs, per-plane display
//! parameters, and the bus-visible system registers

use crate::mcd212::clut::ColorTable;
use crate::num::GetBit;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    A = 0,
    B = 1,
}

impl Plane {
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl Display for Plane {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodingMethod {
    #[default]
    Off,
    Clut8,
    Clut7,
    Clut77,
    Clut4,
    Dyuv,
    Rgb555,
}

impl CodingMethod {
    /// Plane A coding method field (bits 0-3 of the image coding method register).
    #[must_use]
    pub fn from_plane_a_bits(bits: u32) -> Self {
        match bits & 0xF {
            0x1 => Self::Clut8,
            0x3 => Self::Clut7,
            0x4 => Self::Clut77,
            0x5 => Self::Dyuv,
            0xB => Self::Clut4,
            _ => Self::Off,
        }
    }

    /// Plane B coding method field (bits 8-11 of the image coding method register).
    #[must_use]
    pub fn from_plane_b_bits(bits: u32) -> Self {
        match bits & 0xF {
            0x1 => Self::Rgb555,
            0x3 => Self::Clut7,
            0x5 => Self::Dyuv,
            0xB => Self::Clut4,
            _ => Self::Off,
        }
    }
}

/// Image coding method register (0xC0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageCodingMethod(pub u32);

impl ImageCodingMethod {
    #[must_use]
    pub fn coding_method(self, plane: Plane) -> CodingMethod {
        match plane {
            Plane::A => CodingMethod::from_plane_a_bits(self.0.bits(0..=3)),
            Plane::B => CodingMethod::from_plane_b_bits(self.0.bits(8..=11)),
        }
    }

    /// CS: plane A uses the upper 128 CLUT entries in CLUT7+7 mode
    #[must_use]
    pub fn clut_high_bank(self) -> bool {
        self.0.bit(22)
    }

    /// NM: two independent mattes instead of one
    #[must_use]
    pub fn two_mattes(self) -> bool {
        self.0.bit(19)
    }

    /// EV: external video replaces the backdrop
    #[must_use]
    pub fn external_video(self) -> bool {
        self.0.bit(18)
    }

    /// Returns a description of the rule violated if the plane A/B combination is not allowed.
    #[must_use]
    pub fn disallowed_combination(self) -> Option<&'static str> {
        let a = self.coding_method(Plane::A);
        let b = self.coding_method(Plane::B);

        if b == CodingMethod::Rgb555 && a != CodingMethod::Off {
            return Some("plane B RGB555 requires plane A OFF");
        }

        if matches!(a, CodingMethod::Clut8 | CodingMethod::Clut77)
            && !matches!(b, CodingMethod::Dyuv | CodingMethod::Off)
        {
            return Some("plane A CLUT8/CLUT7+7 requires plane B DYUV or OFF");
        }

        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransparencyMode {
    Always,
    ColorKey,
    TransparencyBit,
    MatteFlag0,
    MatteFlag1,
    MatteFlag0OrColorKey,
    MatteFlag1OrColorKey,
    Reserved,
}

impl TransparencyMode {
    fn from_bits(bits: u32) -> Self {
        match bits & 7 {
            0 => Self::Always,
            1 => Self::ColorKey,
            2 => Self::TransparencyBit,
            3 => Self::MatteFlag0,
            4 => Self::MatteFlag1,
            5 => Self::MatteFlag0OrColorKey,
            6 => Self::MatteFlag1OrColorKey,
            7 => Self::Reserved,
            _ => unreachable!("value & 7 is always <= 7"),
        }
    }
}

/// One plane's 4-bit transparency control nibble: 3-bit mode + 1-bit polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransparencyCondition {
    pub mode: TransparencyMode,
    /// When set the condition is inverted
    pub invert: bool,
}

impl TransparencyCondition {
    #[must_use]
    pub fn from_nibble(nibble: u32) -> Self {
        Self { mode: TransparencyMode::from_bits(nibble), invert: nibble.bit(3) }
    }
}

/// Transparency control register (0xC1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransparencyControl(pub u32);

impl TransparencyControl {
    #[must_use]
    pub fn mix_enabled(self) -> bool {
        self.0.bit(23)
    }

    #[must_use]
    pub fn condition(self, plane: Plane) -> TransparencyCondition {
        match plane {
            Plane::A => TransparencyCondition::from_nibble(self.0.bits(0..=3)),
            Plane::B => TransparencyCondition::from_nibble(self.0.bits(8..=11)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaneOrder {
    #[default]
    AFront,
    BFront,
}

impl PlaneOrder {
    #[must_use]
    pub fn from_bit(bit: bool) -> Self {
        if bit { Self::BFront } else { Self::AFront }
    }

    #[must_use]
    pub fn front(self) -> Plane {
        match self {
            Self::AFront => Plane::A,
            Self::BFront => Plane::B,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatteOpcode {
    Terminate,
    SetContributionFactorA,
    SetContributionFactorB,
    ClearFlag,
    SetFlag,
    SetContributionFactorAClearFlag,
    SetContributionFactorASetFlag,
    SetContributionFactorBClearFlag,
    SetContributionFactorBSetFlag,
    Reserved(u8),
}

impl MatteOpcode {
    fn from_bits(bits: u32) -> Self {
        match bits & 0xF {
            0b0000 => Self::Terminate,
            0b0100 => Self::SetContributionFactorA,
            0b0110 => Self::SetContributionFactorB,
            0b1000 => Self::ClearFlag,
            0b1001 => Self::SetFlag,
            0b1100 => Self::SetContributionFactorAClearFlag,
            0b1101 => Self::SetContributionFactorASetFlag,
            0b1110 => Self::SetContributionFactorBClearFlag,
            0b1111 => Self::SetContributionFactorBSetFlag,
            other => Self::Reserved(other as u8),
        }
    }
}

/// Region/matte control word (0xD0-0xD7).
///
/// Bits 20-23 opcode, bit 16 matte flag select, bits 10-15 contribution factor, bits 0-9 X position
/// in double resolution pixels (bit 0 is not significant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatteCommand(pub u32);

impl MatteCommand {
    #[must_use]
    pub fn opcode(self) -> MatteOpcode {
        MatteOpcode::from_bits(self.0.bits(20..=23))
    }

    #[must_use]
    pub fn flag_index(self) -> usize {
        self.0.bit(16).into()
    }

    #[must_use]
    pub fn contribution_factor(self) -> u8 {
        self.0.bits(10..=15) as u8
    }

    /// X position in normal resolution pixels (9 bits).
    #[must_use]
    pub fn x_position(self) -> u32 {
        self.0.bits(1..=9)
    }
}

/// Cursor control register (0xCE).
///
/// Bit 23 enable, bit 22 blink type, bits 19-21 ON period, bits 16-18 OFF period, bit 15 double
/// resolution, bits 0-3 YRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorControl(pub u32);

impl CursorControl {
    #[must_use]
    pub fn enabled(self) -> bool {
        self.0.bit(23)
    }

    /// If set the cursor shows its complementary color during the OFF phase instead of hiding
    #[must_use]
    pub fn blink_complement(self) -> bool {
        self.0.bit(22)
    }

    #[must_use]
    pub fn on_period(self) -> u32 {
        self.0.bits(19..=21)
    }

    #[must_use]
    pub fn off_period(self) -> u32 {
        self.0.bits(16..=18)
    }

    #[must_use]
    pub fn double_resolution(self) -> bool {
        self.0.bit(15)
    }

    #[must_use]
    pub fn color_code(self) -> u8 {
        self.0.bits(0..=3) as u8
    }
}

/// Cursor position register (0xCD): X (double resolution) in bits 0-9, Y in bits 12-21.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition(pub u32);

impl CursorPosition {
    #[must_use]
    pub fn x(self) -> u32 {
        self.0.bits(0..=9)
    }

    #[must_use]
    pub fn y(self) -> u32 {
        self.0.bits(12..=21)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageType {
    #[default]
    Normal,
    RunLength,
    Mosaic,
}

impl ImageType {
    fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 | 1 => Self::Normal,
            2 => Self::RunLength,
            3 => Self::Mosaic,
            _ => unreachable!("value & 3 is always <= 3"),
        }
    }

    fn to_bits(self) -> u32 {
        match self {
            Self::Normal => 0,
            Self::RunLength => 2,
            Self::Mosaic => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitsPerPixel {
    #[default]
    Normal8,
    Double4,
    High8,
}

impl BitsPerPixel {
    /// Returns `None` for the reserved value 3.
    #[must_use]
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits & 3 {
            0 => Some(Self::Normal8),
            1 => Some(Self::Double4),
            2 => Some(Self::High8),
            _ => None,
        }
    }

    fn to_bits(self) -> u32 {
        self as u32
    }

    #[must_use]
    pub fn is_double_resolution(self) -> bool {
        self != Self::Normal8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayParameters {
    pub image_type: ImageType,
    pub pixel_repeat: u8,
    pub bits_per_pixel: BitsPerPixel,
    pub pixel_hold_enabled: bool,
    pub pixel_hold_factor: u8,
}

impl DisplayParameters {
    /// Apply a LOAD DISPLAY PARAMETERS operand. Returns the reserved value on an invalid
    /// bits-per-pixel field, in which case nothing is changed.
    pub fn load(&mut self, operand: u32) -> Result<(), u32> {
        let bits_per_pixel = BitsPerPixel::from_bits(operand.bits(8..=9)).ok_or(operand.bits(8..=9))?;

        self.image_type = ImageType::from_bits(operand.bits(0..=1));
        self.pixel_repeat = 1 << (1 + operand.bits(2..=3));
        self.bits_per_pixel = bits_per_pixel;

        Ok(())
    }

    /// The operand encoding of the current parameters, as read back through the bus.
    #[must_use]
    pub fn to_operand(&self) -> u32 {
        let repeat_bits = self.pixel_repeat.trailing_zeros().saturating_sub(1);
        (self.bits_per_pixel.to_bits() << 8) | (repeat_bits << 2) | self.image_type.to_bits()
    }

    /// Mosaic pixel hold register (0xD9/0xDA): bit 23 enable, bits 0-7 hold factor.
    pub fn load_pixel_hold(&mut self, value: u32) {
        self.pixel_hold_enabled = value.bit(23);
        self.pixel_hold_factor = value.bits(0..=7) as u8;
    }
}

impl Default for DisplayParameters {
    fn default() -> Self {
        Self {
            image_type: ImageType::Normal,
            pixel_repeat: 2,
            bits_per_pixel: BitsPerPixel::Normal8,
            pixel_hold_enabled: false,
            pixel_hold_factor: 0,
        }
    }
}

pub const MATTE_TABLE_LEN: usize = 8;
pub const CURSOR_SIZE: usize = 16;

/// Registers written by the control programs (and by the bus for cursor access).
#[derive(Debug, Clone, Default)]
pub struct ControlRegisters {
    pub image_coding_method: ImageCodingMethod,
    pub transparency_control: TransparencyControl,
    pub plane_order: PlaneOrder,
    pub clut_bank: u8,
    pub transparent_color: [u32; 2],
    pub mask_color: [u32; 2],
    pub dyuv_seed: [u32; 2],
    pub cursor_position: CursorPosition,
    pub cursor_control: CursorControl,
    pub cursor_pattern: [u16; CURSOR_SIZE],
    pub matte_commands: [MatteCommand; MATTE_TABLE_LEN],
    pub backdrop_color: u8,
    pub mosaic_factor: [u32; 2],
    pub contribution_factor: [u8; 2],
}

/// Register file owned by the video coprocessor.
#[derive(Debug, Clone)]
pub struct Registers {
    pub control: ControlRegisters,
    pub clut: ColorTable,
    pub display_parameters: [DisplayParameters; 2],
    pub system: SystemRegisters,
}

impl Registers {
    pub fn new() -> Self {
        Self {
            control: ControlRegisters {
                contribution_factor: [MAX_CONTRIBUTION_FACTOR; 2],
                ..ControlRegisters::default()
            },
            clut: ColorTable::new(),
            display_parameters: [DisplayParameters::default(); 2],
            system: SystemRegisters::default(),
        }
    }

    /// Clears coding methods and cursor enable; CLUT bank selection and contents survive.
    pub fn reset(&mut self) {
        self.control.image_coding_method = ImageCodingMethod(0);
        self.control.cursor_control.0 &= !(1 << 23);
        self.system = SystemRegisters::default();

        log::debug!(
            "Register reset: coding methods OFF, cursor disabled, CLUT bank {} retained",
            self.control.clut_bank
        );
    }

    pub fn coding_method(&self, plane: Plane) -> CodingMethod {
        self.control.image_coding_method.coding_method(plane)
    }

    /// Raw value of a control register by its instruction opcode, for bus read-back.
    ///
    /// CLUT entries read from the currently selected bank.
    pub fn read_control(&self, opcode: u8) -> Option<u32> {
        let value = match opcode {
            0x80..=0xBF => self.clut.read_banked(self.control.clut_bank, opcode - 0x80),
            0xC0 => self.control.image_coding_method.0,
            0xC1 => self.control.transparency_control.0,
            0xC2 => u32::from(self.control.plane_order == PlaneOrder::BFront),
            0xC3 => self.control.clut_bank.into(),
            0xC4 => self.control.transparent_color[0],
            0xC6 => self.control.transparent_color[1],
            0xC7 => self.control.mask_color[0],
            0xC9 => self.control.mask_color[1],
            0xCA => self.control.dyuv_seed[0],
            0xCB => self.control.dyuv_seed[1],
            0xCD => self.control.cursor_position.0,
            0xCE => self.control.cursor_control.0,
            0xD0..=0xD7 => self.control.matte_commands[(opcode - 0xD0) as usize].0,
            0xD8 => self.control.backdrop_color.into(),
            0xD9 => self.control.mosaic_factor[0],
            0xDA => self.control.mosaic_factor[1],
            0xDB => self.control.contribution_factor[0].into(),
            0xDC => self.control.contribution_factor[1].into(),
            _ => return None,
        };

        Some(value)
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

pub const MAX_CONTRIBUTION_FACTOR: u8 = 63;

/// Bus-visible system registers addressed relative to the register block base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemRegister {
    ControlStatus2,
    DisplayCommand2,
    DisplayDecoder2,
    ControlStatus1,
    DisplayCommand1,
    DisplayDecoder1,
}

impl SystemRegister {
    /// Map a register block offset to a register. Video start registers (0x04/0x14) are owned by
    /// the read cursor logic and are not covered here.
    #[must_use]
    pub fn from_offset(offset: u32) -> Option<Self> {
        match offset & 0x1E {
            0x00 => Some(Self::ControlStatus2),
            0x02 => Some(Self::DisplayCommand2),
            0x08 => Some(Self::DisplayDecoder2),
            0x10 => Some(Self::ControlStatus1),
            0x12 => Some(Self::DisplayCommand1),
            0x18 => Some(Self::DisplayDecoder1),
            _ => None,
        }
    }
}

/// Display command (DCR1/DCR2), control/status (CSR1W/CSR2W) and display decoder (DDR1/DDR2)
/// registers, plus the interrupt flags reported through the status read register.
///
/// Index 0 is channel 1 (plane A), index 1 is channel 2 (plane B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemRegisters {
    pub display_command: [u16; 2],
    pub control_status: [u16; 2],
    pub display_decoder: [u16; 2],
    pub interrupt_flags: [bool; 2],
}

impl SystemRegisters {
    /// DE: display enable (DCR1 bit 15)
    #[must_use]
    pub fn display_enabled(&self) -> bool {
        self.display_command[0].bit(15)
    }

    /// CF: crystal frequency; set selects the 384-pixel line (DCR1 bit 14)
    #[must_use]
    pub fn wide_line(&self) -> bool {
        self.display_command[0].bit(14)
    }

    /// FD: frame duration; set selects 60 Hz (DCR1 bit 13)
    #[must_use]
    pub fn sixty_hz(&self) -> bool {
        self.display_command[0].bit(13)
    }

    /// SM: interlaced scan (DCR1 bit 12)
    #[must_use]
    pub fn interlaced(&self) -> bool {
        self.display_command[0].bit(12)
    }

    /// IC: initial control program enabled for the channel (DCRx bit 9)
    #[must_use]
    pub fn ica_enabled(&self, plane: Plane) -> bool {
        self.display_command[plane.index()].bit(9)
    }

    /// DC: display control program enabled for the channel (DCRx bit 8)
    #[must_use]
    pub fn dca_enabled(&self, plane: Plane) -> bool {
        self.display_command[plane.index()].bit(8)
    }

    /// DI: interrupts from the channel's control programs are suppressed (CSRxW bit 15)
    #[must_use]
    pub fn interrupt_disabled(&self, plane: Plane) -> bool {
        self.control_status[plane.index()].bit(15)
    }
}
