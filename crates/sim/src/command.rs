use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Button bitmask carried by one tick's input command.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Buttons: u16 {
        const ACCELERATE = 1 << 0;
        const BRAKE      = 1 << 1;
        const DRIFT      = 1 << 2;
        const ITEM       = 1 << 3;
        const LOOK_BACK  = 1 << 4;
        const RESPAWN    = 1 << 5;
    }
}

/// One player's input for one tick. The simulation only ever consumes these;
/// it never re-derives input from device state, so a recorded stream of
/// commands is a complete replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputCommand {
    /// Forward/reverse axis, -128..=127.
    pub throttle: i8,
    /// Steering axis, -128 (full left)..=127 (full right).
    pub steer: i8,
    /// Aim offset for look-around; consumed by the camera, never physics.
    pub aim: i16,
    pub buttons: Buttons,
}

impl InputCommand {
    pub fn neutral() -> InputCommand {
        InputCommand::default()
    }

    pub fn is_pressed(&self, button: Buttons) -> bool {
        self.buttons.contains(button)
    }
}
