//! Integration tests for the dispatcher lifecycle: boot → homing → serving
//! → shutdown, against the recording mock board.

use servobridge::app::service::{ActuatorDispatcher, Phase, RunOutcome};
use servobridge::config::{BridgeConfig, SERVO_EAR_TR, SERVO_MOUTH};
use servobridge::drivers::status_indicator::{
    BUS_LED, COLOUR_BUS_READING, COLOUR_FAULT, COLOUR_OFF, COLOUR_POWER, COLOUR_STARTUP,
    POWER_LED, STARTUP_LED,
};
use servobridge::error::{BusError, ConfigError, Error};
use servobridge::pins::SENSOR_6_ADDR;
use servobridge::protocol::ActuatorCommand;

use crate::mock_hw::{MockDelay, MockHardware, ScriptedBus, ServoCall};

type Dispatcher = ActuatorDispatcher<MockHardware, ScriptedBus, MockDelay>;

/// Default config at full brightness so LED colours compare unscaled.
fn config() -> BridgeConfig {
    BridgeConfig {
        led_brightness: 1.0,
        ..BridgeConfig::default()
    }
}

fn dispatcher(hw: MockHardware, bus: ScriptedBus) -> Dispatcher {
    ActuatorDispatcher::new(config(), hw, bus, MockDelay::new()).unwrap()
}

// ── Construction ──────────────────────────────────────────────

#[test]
fn board_with_too_few_outputs_is_rejected() {
    let hw = MockHardware {
        servo_count: 8,
        ..MockHardware::new()
    };
    let err = ActuatorDispatcher::new(config(), hw, ScriptedBus::new(), MockDelay::new())
        .err()
        .unwrap();
    assert_eq!(err, Error::Config(ConfigError::ActuatorCount(12)));
}

#[test]
fn nothing_touches_hardware_before_run() {
    let d = dispatcher(MockHardware::new(), ScriptedBus::new());
    assert_eq!(d.phase(), Phase::Boot);
    assert!(d.hw().calls.is_empty());
    assert!(d.hw().led_writes.is_empty());
}

// ── Boot and homing ───────────────────────────────────────────

#[test]
fn homing_enables_then_centres_every_actuator() {
    let mut d = dispatcher(MockHardware::new(), ScriptedBus::new());
    assert_eq!(d.run(), Ok(RunOutcome::Served));

    let cfg = config();
    let (hw, _, delay) = d.into_parts();

    let mut expected = vec![ServoCall::Frequency(SERVO_MOUTH, 300)];
    expected.extend((0..12).map(ServoCall::Enable));
    expected.extend(
        (0..12).map(|i| ServoCall::Pulse(i, cfg.calibration.get(i).unwrap().mid())),
    );
    expected.extend((0..16).map(ServoCall::Disable));
    assert_eq!(hw.calls, expected);

    // Spot-check a couple of midpoints against the measured table.
    assert!(hw.calls.contains(&ServoCall::Pulse(SERVO_MOUTH, 1430)));
    assert!(hw.calls.contains(&ServoCall::Pulse(SERVO_EAR_TR, 1380)));

    let mut waits = vec![100; 12];
    waits.push(2000);
    waits.extend([100; 12]);
    waits.push(2000);
    assert_eq!(delay.waits_ms, waits);
}

#[test]
fn boot_lights_power_then_startup() {
    let mut d = dispatcher(MockHardware::new(), ScriptedBus::new());
    d.run().unwrap();
    let writes = &d.hw().led_writes;
    assert_eq!(writes[0], (POWER_LED, COLOUR_POWER));
    assert_eq!(writes[1], (STARTUP_LED, COLOUR_STARTUP));
}

#[test]
fn actuator_state_tracks_homing() {
    let mut d = dispatcher(MockHardware::new().pressed_after(1), ScriptedBus::new());
    d.run().unwrap();
    assert_eq!(d.bus_mut().polls, 1);
    for (i, state) in d.actuators().iter().enumerate() {
        assert!(!state.enabled, "servo {i} still enabled after shutdown");
        assert!(state.current_pulse_us.is_some());
    }
}

// ── Serving ───────────────────────────────────────────────────

#[test]
fn commands_are_mapped_through_calibration() {
    let hw = MockHardware::new().pressed_after(3);
    let bus = ScriptedBus::new()
        .command(SERVO_MOUTH as u8, 255)
        .command(SERVO_EAR_TR as u8, 0)
        .command(20, 10);
    let mut d = dispatcher(hw, bus);
    d.run().unwrap();

    let pulses = d.hw().pulses();
    let served = &pulses[12..];
    assert_eq!(served, &[(SERVO_MOUTH, 1480), (SERVO_EAR_TR, 940)]);

    let stats = d.stats();
    assert_eq!(stats.written, 2);
    assert_eq!(stats.out_of_range, 1);
    assert_eq!(d.actuators()[SERVO_MOUTH].current_pulse_us, Some(1480));
}

#[test]
fn out_of_range_index_writes_nothing() {
    let mut d = dispatcher(MockHardware::new(), ScriptedBus::new());
    assert_eq!(
        d.dispatch(ActuatorCommand::new(12, 100)),
        Err(Error::IndexOutOfRange {
            index: 12,
            count: 12
        })
    );
    assert!(d.hw().calls.is_empty());
}

#[test]
fn only_addressed_actuator_changes() {
    let hw = MockHardware::new().pressed_after(1);
    let mut d = dispatcher(hw, ScriptedBus::new().command(4, 128));
    d.run().unwrap();

    let before: Vec<_> = d.hw().pulses()[..12].to_vec();
    let after = &d.hw().pulses()[12..];
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].0, 4);
    for (i, state) in d.actuators().iter().enumerate() {
        if i != 4 {
            assert_eq!(state.current_pulse_us, Some(before[i].1));
        }
    }
}

#[test]
fn motor_disable_jumper_suppresses_all_motion() {
    let hw = MockHardware::new()
        .with_voltage(SENSOR_6_ADDR, 3.3)
        .pressed_after(2);
    let bus = ScriptedBus::new().command(0, 255).command(1, 0);
    let mut d = dispatcher(hw, bus);
    assert_eq!(d.run(), Ok(RunOutcome::Served));

    assert!(!d.boot_flags().motors_enabled);
    assert!(d.hw().enabled().is_empty());
    assert!(d.hw().pulses().is_empty());
    assert_eq!(d.stats().suppressed, 2);
    assert_eq!(d.stats().written, 0);
}

#[test]
fn jumper_exactly_at_threshold_reads_low() {
    let hw = MockHardware::new().with_voltage(SENSOR_6_ADDR, 3.0);
    let mut d = dispatcher(hw, ScriptedBus::new());
    d.run().unwrap();
    assert!(d.boot_flags().motors_enabled);
}

#[test]
fn bus_error_shows_fault_and_cools_down() {
    let hw = MockHardware::new().pressed_after(2);
    let bus = ScriptedBus::new().error(BusError::SerialFault).idle();
    let mut d = dispatcher(hw, bus);
    assert_eq!(d.run(), Ok(RunOutcome::Served));
    assert_eq!(d.stats().bus_errors, 1);

    let bus_led: Vec<_> = d
        .hw()
        .led_writes
        .iter()
        .filter(|(i, _)| *i == BUS_LED)
        .map(|(_, c)| *c)
        .collect();
    // Reading, fault, reading again, then the shutdown fill.
    assert_eq!(
        bus_led,
        vec![COLOUR_BUS_READING, COLOUR_FAULT, COLOUR_BUS_READING, COLOUR_FAULT]
    );

    let (_, _, delay) = d.into_parts();
    // Homing waits, then one cooldown.
    assert_eq!(delay.waits_ms.last(), Some(&2000));
    assert_eq!(delay.waits_ms.len(), 12 + 1 + 12 + 1 + 1);
}

#[test]
fn bus_led_is_not_rewritten_while_healthy() {
    let hw = MockHardware::new().pressed_after(5);
    let mut d = dispatcher(hw, ScriptedBus::new().idle().idle().idle());
    d.run().unwrap();
    let reading = d
        .hw()
        .led_writes
        .iter()
        .filter(|w| **w == (BUS_LED, COLOUR_BUS_READING))
        .count();
    assert_eq!(reading, 1);
    assert_eq!(d.bus_mut().polls, 5);
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_disables_every_output_and_paints_red() {
    let mut d = dispatcher(MockHardware::new(), ScriptedBus::new());
    d.run().unwrap();
    assert_eq!(d.phase(), Phase::Shutdown);
    assert_eq!(d.hw().disabled(), (0..16).collect::<Vec<_>>());
    assert_eq!(d.hw().leds, [COLOUR_FAULT; 6]);
    assert!(d.actuators().iter().all(|a| !a.enabled));
}

// ── Alarm ─────────────────────────────────────────────────────

#[test]
fn table_mismatch_alarms_then_fails_without_moving() {
    let cfg = BridgeConfig {
        actuator_count: 13,
        ..config()
    };
    let hw = MockHardware::new().pressed_after(1);
    let mut d = ActuatorDispatcher::new(cfg, hw, ScriptedBus::new(), MockDelay::new()).unwrap();

    assert_eq!(
        d.run(),
        Err(Error::CalibrationTableMismatch {
            expected: 13,
            actual: 12
        })
    );
    assert_eq!(d.phase(), Phase::Alarm);
    assert!(d.hw().calls.is_empty());
    assert_eq!(d.hw().leds, [COLOUR_OFF; 6]);

    let writes = &d.hw().led_writes;
    assert_eq!(writes[0], (POWER_LED, COLOUR_POWER));
    assert!(writes[1..7].iter().all(|(_, c)| *c == COLOUR_FAULT));
    assert!(writes[7..13].iter().all(|(_, c)| *c == COLOUR_OFF));

    let (_, bus, delay) = d.into_parts();
    assert_eq!(bus.polls, 0);
    let mut waits = vec![100; 6];
    waits.push(1000);
    waits.extend([100; 6]);
    waits.push(1000);
    assert_eq!(delay.waits_ms, waits);
}
