//! I2C slave bring-up and command flow against the simulated register file.

use servobridge::app::ports::CommandBus;
use servobridge::app::service::{ActuatorDispatcher, RunOutcome};
use servobridge::bus::BusConfig;
use servobridge::bus::i2c_slave::{I2cCommandSource, I2cSlaveConfig, I2cSlaveDriver};
use servobridge::bus::registers::{
    GPIO_FUNCSEL_I2C, GPIO_FUNCSEL_MASK, I2C0_BASE, IC_CON, IC_CON_SLAVE_MASK, IC_ENABLE,
    IC_ENABLE_ENABLE, IC_SAR, PAD_IE, PAD_PUE, RegisterBank, SimRegisterFile, gpio_ctrl,
    pad_ctrl,
};
use servobridge::config::BridgeConfig;
use servobridge::protocol::ActuatorCommand;

use crate::mock_hw::{MockDelay, MockHardware};

fn source() -> I2cCommandSource<SimRegisterFile> {
    let bank = RegisterBank::new(SimRegisterFile::new(I2C0_BASE), I2C0_BASE);
    let mut driver = I2cSlaveDriver::new(bank);
    assert!(driver.release_reset());
    driver.configure(&I2cSlaveConfig::default());
    I2cCommandSource::new(driver)
}

#[test]
fn configure_leaves_controller_enabled_as_slave() {
    let src = source();
    let file = src.driver().bank().file();

    assert_eq!(file.peek(I2C0_BASE + IC_SAR), 0x08);
    assert_eq!(file.peek(I2C0_BASE + IC_CON) & IC_CON_SLAVE_MASK, 0);
    assert_eq!(file.peek(I2C0_BASE + IC_ENABLE) & IC_ENABLE_ENABLE, IC_ENABLE_ENABLE);
    for pin in [20, 21] {
        assert_eq!(file.peek(gpio_ctrl(pin)) & GPIO_FUNCSEL_MASK, GPIO_FUNCSEL_I2C);
        assert_eq!(file.peek(pad_ctrl(pin)) & (PAD_PUE | PAD_IE), PAD_PUE | PAD_IE);
    }
}

#[test]
fn reconfigure_changes_address() {
    let mut src = source();
    src.driver_mut().configure(&I2cSlaveConfig {
        address: 0x42,
        ..I2cSlaveConfig::default()
    });
    assert_eq!(src.driver().bank().file().peek(I2C0_BASE + IC_SAR), 0x42);
}

#[test]
fn burst_is_handed_out_across_polls() {
    let mut src = source();
    src.driver_mut().bank_mut().file_mut().receive(&[0, 0, 1, 255, 2, 128]);
    assert_eq!(src.poll(), Ok(Some(ActuatorCommand::new(0, 0))));

    // More bytes arrive while the queue still holds two commands.
    src.driver_mut().bank_mut().file_mut().receive(&[3, 9]);
    assert_eq!(src.poll(), Ok(Some(ActuatorCommand::new(1, 255))));
    assert_eq!(src.poll(), Ok(Some(ActuatorCommand::new(2, 128))));
    assert_eq!(src.poll(), Ok(Some(ActuatorCommand::new(3, 9))));
    assert_eq!(src.poll(), Ok(None));
}

#[test]
fn write_split_across_polls_keeps_its_pairing() {
    let mut src = source();
    src.driver_mut().bank_mut().file_mut().receive(&[1]);
    assert_eq!(src.poll(), Ok(None));

    src.driver_mut().bank_mut().file_mut().receive(&[10, 2]);
    assert_eq!(src.poll(), Ok(Some(ActuatorCommand::new(1, 10))));
    assert_eq!(src.poll(), Ok(None));

    src.driver_mut().bank_mut().file_mut().receive(&[20, 3, 30]);
    assert_eq!(src.poll(), Ok(Some(ActuatorCommand::new(2, 20))));
    assert_eq!(src.poll(), Ok(Some(ActuatorCommand::new(3, 30))));
    assert_eq!(src.poll(), Ok(None));
    assert_eq!(src.carry(), None);
}

#[test]
fn i2c_commands_drive_servos() {
    let cfg = BridgeConfig {
        bus: BusConfig::I2c(I2cSlaveConfig::default()),
        ..BridgeConfig::default()
    };
    let mut src = source();
    // Mouth to max, then an index byte whose value never arrives.
    src.driver_mut().bank_mut().file_mut().receive(&[0, 255, 7]);

    let hw = MockHardware::new().pressed_after(2);
    let mut d = ActuatorDispatcher::new(cfg, hw, src, MockDelay::new()).unwrap();
    assert_eq!(d.run(), Ok(RunOutcome::Served));

    let pulses = d.hw().pulses();
    assert_eq!(&pulses[12..], &[(0, 1480)]);
    assert_eq!(d.stats().written, 1);
}
