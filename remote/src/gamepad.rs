//! Gamepad puppeteering: controller state in, servo steps out.
//!
//! Bumpers work the mouth, triggers the eyes and the right stick the ears.
//! Nothing here touches a device; `main` feeds it events and writes the
//! steps it returns.

use servobridge::config::{
    SERVO_EAR_BL, SERVO_EAR_BR, SERVO_EAR_TL, SERVO_EAR_TR, SERVO_EYE_BL, SERVO_EYE_BR,
    SERVO_EYE_TL, SERVO_EYE_TR, SERVO_MOUTH,
};

use crate::script::Step;

/// Stick travel below this reads as centred.
pub const STICK_DEADZONE: f32 = 0.48;

const MID: u8 = 128;

const MOUTH_OPEN: u8 = 255;
const MOUTH_CLOSED: u8 = 0;

/// Per-eyelid positions, `(open, closed)`.  The servos are mirrored, so open
/// is not the same end on every lid.
const EYE_TL: (u8, u8) = (255, 0);
const EYE_BL: (u8, u8) = (0, 255);
const EYE_TR: (u8, u8) = (0, 255);
const EYE_BR: (u8, u8) = (255, 0);

const EAR_TL_FORWARD: u8 = 255;
const EAR_TL_BACKWARD: u8 = 0;
const EAR_TR_FORWARD: u8 = 0;
const EAR_TR_BACKWARD: u8 = 255;
const EAR_BL_UP: u8 = 255;
const EAR_BL_DOWN: u8 = 0;
const EAR_BR_UP: u8 = 0;
const EAR_BR_DOWN: u8 = 255;

/// One controller change, already stripped of the device it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    LeftBumper(bool),
    RightBumper(bool),
    /// Analog trigger travel, `0.0..=1.0`.
    LeftTrigger(f32),
    RightTrigger(f32),
    RightStickX(f32),
    RightStickY(f32),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GamepadState {
    pub left_bumper: bool,
    pub right_bumper: bool,
    pub left_trigger: f32,
    pub right_trigger: f32,
    /// Stick axes after the deadzone: `-1.0`, `0.0` or `1.0`.
    pub right_stick_x: f32,
    pub right_stick_y: f32,
}

impl GamepadState {
    pub fn apply(&self, control: Control) -> Self {
        let mut next = *self;
        match control {
            Control::LeftBumper(pressed) => next.left_bumper = pressed,
            Control::RightBumper(pressed) => next.right_bumper = pressed,
            Control::LeftTrigger(v) => next.left_trigger = v,
            Control::RightTrigger(v) => next.right_trigger = v,
            Control::RightStickX(v) => next.right_stick_x = deadzone(v),
            Control::RightStickY(v) => next.right_stick_y = deadzone(v),
        }
        next
    }
}

/// Snap a stick axis to full deflection or centre.
pub fn deadzone(val: f32) -> f32 {
    let mag = val.abs();
    if mag > STICK_DEADZONE && mag <= 1.0 {
        val.signum()
    } else {
        0.0
    }
}

/// Linear map of `val` from one range onto another.
pub fn map_from_to(val: f32, from_min: f32, from_max: f32, to_min: f32, to_max: f32) -> f32 {
    (val - from_min) / (from_max - from_min) * (to_max - to_min) + to_min
}

fn step(index: usize, raw_value: u8) -> Step {
    Step {
        index: index as u8,
        raw_value,
        hold_ms: 0,
    }
}

/// Trigger travel from mid towards `end`, for each lid.
fn eyes(travel: f32, end: fn((u8, u8)) -> u8) -> [Step; 4] {
    let lid = |index: usize, positions: (u8, u8)| {
        let target = map_from_to(travel, 0.0, 1.0, f32::from(MID), f32::from(end(positions)));
        step(index, target as u8)
    };
    [
        lid(SERVO_EYE_TL, EYE_TL),
        lid(SERVO_EYE_BL, EYE_BL),
        lid(SERVO_EYE_TR, EYE_TR),
        lid(SERVO_EYE_BR, EYE_BR),
    ]
}

/// Steps that move the servos from `prev` to `next`.  Only controls that
/// changed produce steps.
///
/// The right bumper takes the mouth fully open and wins over the left, which
/// only opens it halfway.  Likewise the right trigger squints and wins over
/// the left, which widens.
pub fn commands(prev: &GamepadState, next: &GamepadState) -> Vec<Step> {
    let mut out = Vec::new();

    if next.right_bumper != prev.right_bumper {
        let pos = if next.right_bumper {
            MOUTH_OPEN
        } else {
            MOUTH_CLOSED
        };
        out.push(step(SERVO_MOUTH, pos));
    } else if next.left_bumper != prev.left_bumper {
        let pos = if next.left_bumper { MID } else { MOUTH_CLOSED };
        out.push(step(SERVO_MOUTH, pos));
    }

    if next.right_trigger != prev.right_trigger {
        out.extend(eyes(next.right_trigger, |(_, closed)| closed));
    } else if next.left_trigger != prev.left_trigger {
        out.extend(eyes(next.left_trigger, |(open, _)| open));
    }

    if next.right_stick_x != prev.right_stick_x {
        let (tr, tl) = if next.right_stick_x >= STICK_DEADZONE {
            (EAR_TR_BACKWARD, EAR_TL_BACKWARD)
        } else if next.right_stick_x <= -STICK_DEADZONE {
            (EAR_TR_FORWARD, EAR_TL_FORWARD)
        } else {
            (MID, MID)
        };
        out.push(step(SERVO_EAR_TR, tr));
        out.push(step(SERVO_EAR_TL, tl));
    }

    if next.right_stick_y != prev.right_stick_y {
        let (br, bl) = if next.right_stick_y >= STICK_DEADZONE {
            (EAR_BR_UP, EAR_BL_UP)
        } else if next.right_stick_y <= -STICK_DEADZONE {
            (EAR_BR_DOWN, EAR_BL_DOWN)
        } else {
            (MID, MID)
        };
        out.push(step(SERVO_EAR_BR, br));
        out.push(step(SERVO_EAR_BL, bl));
    }

    out
}
