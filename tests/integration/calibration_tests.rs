//! Manual calibration driven end to end through the dispatcher.

use servobridge::app::service::{ActuatorDispatcher, Phase, RunOutcome};
use servobridge::calibration::manual::{CalibrationReport, run_manual_calibration};
use servobridge::calibration::table::CalibrationRange;
use servobridge::config::{BridgeConfig, SERVO_MOUTH};
use servobridge::drivers::boot_sensors::SensorChannels;
use servobridge::drivers::status_indicator::{COLOUR_CALIBRATION, COLOUR_FAULT};
use servobridge::pins::{SENSOR_1_ADDR, SENSOR_2_ADDR, SENSOR_5_ADDR, SENSOR_6_ADDR};

use crate::mock_hw::{MockDelay, MockHardware, ScriptedBus, ServoCall};

fn config() -> BridgeConfig {
    BridgeConfig {
        led_brightness: 1.0,
        ..BridgeConfig::default()
    }
}

#[test]
fn calibration_mode_nudges_reference_actuator() {
    // Mouth range 1380..1480: small step is 1us, start at 1430.
    let hw = MockHardware::new()
        .with_voltage(SENSOR_1_ADDR, 3.3)
        .with_voltage(SENSOR_2_ADDR, 3.3)
        .pressed_after(3);
    let mut d =
        ActuatorDispatcher::new(config(), hw, ScriptedBus::new(), MockDelay::new()).unwrap();

    let outcome = d.run().unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Calibrated(Some(CalibrationReport {
            last_pulse_us: 1433,
            lowest_pulse_us: 1430,
            highest_pulse_us: 1433,
        }))
    );
    assert_eq!(d.phase(), Phase::Shutdown);
    assert_eq!(d.actuators()[SERVO_MOUTH].current_pulse_us, Some(1433));

    let pulses = d.hw().pulses();
    assert_eq!(
        &pulses[12..],
        &[(SERVO_MOUTH, 1431), (SERVO_MOUTH, 1432), (SERVO_MOUTH, 1433)]
    );

    // Calibration colour went up at boot, then the shutdown fill.
    assert!(
        d.hw()
            .led_writes
            .iter()
            .any(|(i, c)| *i == 1 && *c == COLOUR_CALIBRATION)
    );
    assert_eq!(d.hw().leds, [COLOUR_FAULT; 6]);

    // Never served.
    let (_, bus, _) = d.into_parts();
    assert_eq!(bus.polls, 0);
}

#[test]
fn calibration_ignored_when_motors_disabled() {
    let hw = MockHardware::new()
        .with_voltage(SENSOR_1_ADDR, 3.3)
        .with_voltage(SENSOR_6_ADDR, 3.3)
        .pressed_after(1);
    let mut d =
        ActuatorDispatcher::new(config(), hw, ScriptedBus::new(), MockDelay::new()).unwrap();
    assert_eq!(d.run(), Ok(RunOutcome::Served));
    assert!(d.boot_flags().calibration_requested);
    assert!(!d.boot_flags().motors_enabled);
    assert!(d.hw().pulses().is_empty());
}

#[test]
fn idle_buttons_leave_pulse_alone() {
    let range = CalibrationRange::new(1000, 2000).unwrap();
    let mut hw = MockHardware::new().pressed_after(4);
    let mut delay = MockDelay::new();
    let report =
        run_manual_calibration(&mut hw, &mut delay, 0, range, &SensorChannels::default(), 100)
            .unwrap();
    assert_eq!(report.last_pulse_us, 1500);
    assert!(hw.calls.is_empty());
    assert!(delay.waits_ms.is_empty());
}

#[test]
fn large_step_down_stops_at_minimum() {
    // Span 1000: large step 50us, 12 presses would go below 1000.
    let range = CalibrationRange::new(1000, 2000).unwrap();
    let mut hw = MockHardware::new()
        .with_voltage(SENSOR_5_ADDR, 3.3)
        .pressed_after(12);
    let mut delay = MockDelay::new();
    let report =
        run_manual_calibration(&mut hw, &mut delay, 3, range, &SensorChannels::default(), 100)
            .unwrap();

    assert_eq!(report.last_pulse_us, 1000);
    assert_eq!(report.lowest_pulse_us, 1000);
    assert_eq!(report.highest_pulse_us, 1500);
    // 1500 → 1000 in ten writes; later samples change nothing.
    assert_eq!(hw.pulses().len(), 10);
    assert_eq!(hw.calls.last(), Some(&ServoCall::Pulse(3, 1000)));
    assert_eq!(delay.waits_ms, vec![100; 10]);
}
