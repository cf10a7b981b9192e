//! Pose scripts: JSON lists of timed servo commands.

use std::io::Write;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use servobridge::config::{
    SERVO_EAR_BL, SERVO_EAR_BR, SERVO_EAR_TL, SERVO_EAR_TR, SERVO_EYE_BL, SERVO_EYE_BR,
    SERVO_EYE_TL, SERVO_EYE_TR, SERVO_MOUTH,
};
use servobridge::protocol::ActuatorCommand;
use servobridge::protocol::frame;

const MOUTH_CLOSED: u8 = 0;
const MID: u8 = 128;

/// One command plus how long to wait after sending it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub index: u8,
    pub raw_value: u8,
    #[serde(default)]
    pub hold_ms: u64,
}

impl Step {
    pub fn command(&self) -> ActuatorCommand {
        ActuatorCommand::new(self.index, self.raw_value)
    }
}

/// Mouth closed, eyes and ears centred.
pub fn neutral_pose() -> Vec<Step> {
    let mut steps = vec![Step {
        index: SERVO_MOUTH as u8,
        raw_value: MOUTH_CLOSED,
        hold_ms: 0,
    }];
    for index in [
        SERVO_EYE_BL,
        SERVO_EYE_BR,
        SERVO_EYE_TL,
        SERVO_EYE_TR,
        SERVO_EAR_BL,
        SERVO_EAR_BR,
        SERVO_EAR_TL,
        SERVO_EAR_TR,
    ] {
        steps.push(Step {
            index: index as u8,
            raw_value: MID,
            hold_ms: 0,
        });
    }
    steps
}

pub fn parse(json: &str) -> Result<Vec<Step>> {
    serde_json::from_str(json).context("script must be a JSON list of {index, raw_value, hold_ms}")
}

/// Write one frame per step, flushing each and holding as asked.
pub fn play<W: Write>(out: &mut W, steps: &[Step]) -> Result<()> {
    for step in steps {
        out.write_all(&frame::encode(step.command()))
            .with_context(|| format!("writing frame for servo {}", step.index))?;
        out.flush()?;
        if step.hold_ms > 0 {
            thread::sleep(Duration::from_millis(step.hold_ms));
        }
    }
    Ok(())
}
