//! servo-remote: drive a servobridge board from the host.
//!
//! ```text
//! servo-remote send <port> <index> <value>
//! servo-remote home <port>
//! servo-remote play <port> <script.json>
//! servo-remote gamepad <port>
//! ```

mod gamepad;
mod script;

use std::time::Duration;
use std::{env, fs};

use anyhow::{Context, Result, anyhow, bail};
use gilrs::{Axis, Button, EventType, Gilrs};
use serialport::{SerialPort, StopBits};
use servobridge::bus::serial::SerialConfig;

use gamepad::{Control, GamepadState};
use script::Step;

const USAGE: &str = "usage:
  servo-remote send <port> <index> <value>
  servo-remote home <port>
  servo-remote play <port> <script.json>
  servo-remote gamepad <port>";

fn open(path: &str) -> Result<Box<dyn SerialPort>> {
    let cfg = SerialConfig::default();
    serialport::new(path, cfg.baud_rate)
        .stop_bits(StopBits::One)
        .timeout(Duration::from_millis(u64::from(cfg.timeout_ms)))
        .open()
        .with_context(|| format!("opening {path}"))
}

/// The gilrs events the puppet mapping listens to.  Bumpers are the
/// shoulder buttons, triggers the analog pair below them.
fn control(event: EventType) -> Option<Control> {
    match event {
        EventType::ButtonPressed(Button::LeftTrigger, _) => Some(Control::LeftBumper(true)),
        EventType::ButtonReleased(Button::LeftTrigger, _) => Some(Control::LeftBumper(false)),
        EventType::ButtonPressed(Button::RightTrigger, _) => Some(Control::RightBumper(true)),
        EventType::ButtonReleased(Button::RightTrigger, _) => Some(Control::RightBumper(false)),
        EventType::ButtonChanged(Button::LeftTrigger2, v, _) => Some(Control::LeftTrigger(v)),
        EventType::ButtonChanged(Button::RightTrigger2, v, _) => Some(Control::RightTrigger(v)),
        EventType::AxisChanged(Axis::RightStickX, v, _) => Some(Control::RightStickX(v)),
        EventType::AxisChanged(Axis::RightStickY, v, _) => Some(Control::RightStickY(v)),
        _ => None,
    }
}

/// Home the board, then follow the gamepad until interrupted.  A frame goes
/// out only when a control actually changes the pose.
fn puppet(port: &str) -> Result<()> {
    let mut gilrs = Gilrs::new().map_err(|e| anyhow!("gamepad init failed: {e}"))?;
    for (_id, pad) in gilrs.gamepads() {
        println!("{} connected", pad.name());
    }

    let mut serial = open(port)?;
    script::play(&mut serial, &script::neutral_pose())?;

    let mut state = GamepadState::default();
    loop {
        let Some(event) = gilrs.next_event_blocking(None) else {
            continue;
        };
        let Some(change) = control(event.event) else {
            continue;
        };
        let next = state.apply(change);
        script::play(&mut serial, &gamepad::commands(&state, &next))?;
        state = next;
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let (port, steps) = match args.as_slice() {
        ["send", port, index, value] => {
            let index: u8 = index.parse().context("index must be 0-255")?;
            let raw_value: u8 = value.parse().context("value must be 0-255")?;
            (
                *port,
                vec![Step {
                    index,
                    raw_value,
                    hold_ms: 0,
                }],
            )
        }
        ["home", port] => (*port, script::neutral_pose()),
        ["gamepad", port] => return puppet(port),
        ["play", port, path] => {
            let json = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            (*port, script::parse(&json)?)
        }
        _ => bail!("{USAGE}"),
    };

    let mut serial = open(port)?;
    script::play(&mut serial, &steps)?;
    println!("sent {} frame(s) to {}", steps.len(), port);
    Ok(())
}
