//! Region/matte tracking
//!
//! The 8 matte control registers form an ordered command queue sorted by X position. Each plane
//! walks its own pointer through the queue as the scan position advances, updating contribution
//! factors and its two matte flags. In one-matte mode a single pointer walks the whole table; bit 16
//! of the first command selects which plane owns it. In two-matte mode plane A owns entries 0-3 and
//! plane B owns entries 4-7.

use crate::mcd212::registers::{
    ControlRegisters, MATTE_TABLE_LEN, MatteCommand, MatteOpcode, Plane,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct PlaneMatteState {
    index: usize,
    end: usize,
    flags: [bool; 2],
}

impl PlaneMatteState {
    fn active(start: usize, end: usize) -> Self {
        Self { index: start, end, flags: [false; 2] }
    }

    fn disabled() -> Self {
        Self { index: MATTE_TABLE_LEN, end: MATTE_TABLE_LEN, flags: [false; 2] }
    }

    fn is_disabled(&self) -> bool {
        self.index >= self.end
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatteTracker {
    planes: [PlaneMatteState; 2],
}

impl MatteTracker {
    #[must_use]
    pub fn new() -> Self {
        Self { planes: [PlaneMatteState::disabled(); 2] }
    }

    /// Reset pointers and flags for a new scanline.
    pub fn start_line(&mut self, control: &ControlRegisters) {
        if control.image_coding_method.two_mattes() {
            self.planes[Plane::A.index()] = PlaneMatteState::active(0, MATTE_TABLE_LEN / 2);
            self.planes[Plane::B.index()] =
                PlaneMatteState::active(MATTE_TABLE_LEN / 2, MATTE_TABLE_LEN);
        } else {
            let owner = if control.matte_commands[0].flag_index() == 0 { Plane::A } else { Plane::B };
            self.planes[owner.index()] = PlaneMatteState::active(0, MATTE_TABLE_LEN);
            self.planes[owner.other().index()] = PlaneMatteState::disabled();
        }
    }

    /// Advance both planes to normal resolution position `x`, executing at most one queued command
    /// per plane. Call once per normal resolution position.
    pub fn step(&mut self, x: u32, control: &mut ControlRegisters) {
        for plane in Plane::ALL {
            let state = &mut self.planes[plane.index()];
            if state.is_disabled() {
                continue;
            }

            let command = control.matte_commands[state.index];
            if x < command.x_position() {
                continue;
            }

            execute_command(plane, state, command, control);
        }
    }

    #[inline]
    #[must_use]
    pub fn flag(&self, plane: Plane, index: usize) -> bool {
        self.planes[plane.index()].flags[index]
    }
}

fn execute_command(
    plane: Plane,
    state: &mut PlaneMatteState,
    command: MatteCommand,
    control: &mut ControlRegisters,
) {
    let factor = command.contribution_factor();
    let flag = command.flag_index();

    match command.opcode() {
        MatteOpcode::Terminate => {
            state.index = state.end;
            return;
        }
        MatteOpcode::SetContributionFactorA => {
            control.contribution_factor[Plane::A.index()] = factor;
        }
        MatteOpcode::SetContributionFactorB => {
            control.contribution_factor[Plane::B.index()] = factor;
        }
        MatteOpcode::ClearFlag => state.flags[flag] = false,
        MatteOpcode::SetFlag => state.flags[flag] = true,
        MatteOpcode::SetContributionFactorAClearFlag => {
            control.contribution_factor[Plane::A.index()] = factor;
            state.flags[flag] = false;
        }
        MatteOpcode::SetContributionFactorASetFlag => {
            control.contribution_factor[Plane::A.index()] = factor;
            state.flags[flag] = true;
        }
        MatteOpcode::SetContributionFactorBClearFlag => {
            control.contribution_factor[Plane::B.index()] = factor;
            state.flags[flag] = false;
        }
        MatteOpcode::SetContributionFactorBSetFlag => {
            control.contribution_factor[Plane::B.index()] = factor;
            state.flags[flag] = true;
        }
        MatteOpcode::Reserved(opcode) => {
            log::warn!("Plane {plane} matte command with reserved opcode {opcode:04b}; ignoring");
        }
    }

    state.index += 1;
}
