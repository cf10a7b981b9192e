//! Servobridge firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Board (PWM · WS2812 · ADC mux · button)   UartLinePort        │
//! │  MmioRegisterFile (I2C0 slave)             defmt logger        │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          ActuatorDispatcher (pure logic)               │    │
//! │  │  boot · homing · calibration · serving · shutdown      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One pass through the dispatcher per power cycle.  After shutdown the
//! board idles until it is reset.
#![no_std]
#![no_main]
#![deny(unused_must_use)]

use core::ptr::addr_of_mut;

use cortex_m_rt::entry;
use defmt_rtt as _;
use embassy_rp::adc::{self, Adc, Channel};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::{PIO0, UART0};
use embassy_rp::pio::{self, Pio};
use embassy_rp::pio_programs::ws2812::{PioWs2812, PioWs2812Program};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{self, BufferedInterruptHandler, BufferedUart};
use embassy_time::Delay;
use log::{LevelFilter, error, info, warn};
use panic_probe as _;

use servobridge::adapters::hardware::{Board, ServoBank, UartLinePort};
use servobridge::adapters::logger;
use servobridge::app::ports::CommandBus;
use servobridge::app::service::{ActuatorDispatcher, RunOutcome};
use servobridge::bus::BusConfig;
use servobridge::bus::i2c_slave::{I2cCommandSource, I2cSlaveDriver};
use servobridge::bus::registers::{I2C0_BASE, MmioRegisterFile, RegisterBank};
use servobridge::bus::serial::SerialFrameSource;
use servobridge::config::BridgeConfig;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    PIO0_IRQ_0 => pio::InterruptHandler<PIO0>;
});

const UART_BUF_SIZE: usize = 256;

#[entry]
fn main() -> ! {
    logger::init(LevelFilter::Info);
    info!("servobridge v{}", env!("CARGO_PKG_VERSION"));

    let p = embassy_rp::init(Default::default());
    let config = BridgeConfig::default();

    // ── Servo outputs 1–16 ────────────────────────────────────
    let servos = ServoBank::new([
        Pwm::new_output_ab(p.PWM_SLICE0, p.PIN_0, p.PIN_1, PwmConfig::default()),
        Pwm::new_output_ab(p.PWM_SLICE1, p.PIN_2, p.PIN_3, PwmConfig::default()),
        Pwm::new_output_ab(p.PWM_SLICE2, p.PIN_4, p.PIN_5, PwmConfig::default()),
        Pwm::new_output_ab(p.PWM_SLICE3, p.PIN_6, p.PIN_7, PwmConfig::default()),
        Pwm::new_output_ab(p.PWM_SLICE4, p.PIN_8, p.PIN_9, PwmConfig::default()),
        Pwm::new_output_ab(p.PWM_SLICE5, p.PIN_10, p.PIN_11, PwmConfig::default()),
        Pwm::new_output_ab(p.PWM_SLICE6, p.PIN_12, p.PIN_13, PwmConfig::default()),
        Pwm::new_output_ab(p.PWM_SLICE7, p.PIN_14, p.PIN_15, PwmConfig::default()),
    ]);

    // ── LED bar ───────────────────────────────────────────────
    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO0, Irqs);
    let program = PioWs2812Program::new(&mut common);
    let leds = PioWs2812::new(&mut common, sm0, p.DMA_CH0, p.PIN_18, &program);

    // ── Sensor mux, button ────────────────────────────────────
    let mux_addr = [
        Output::new(p.PIN_22, Level::Low),
        Output::new(p.PIN_24, Level::Low),
        Output::new(p.PIN_25, Level::Low),
    ];
    let adc = Adc::new_blocking(p.ADC, adc::Config::default());
    let sensor = Channel::new_pin(p.PIN_29, Pull::None);
    let button = Input::new(p.PIN_23, Pull::Up);

    let board = Board::new(servos, leds, mux_addr, adc, sensor, button);

    // ── Command bus ───────────────────────────────────────────
    match config.bus {
        BusConfig::Serial(serial) => {
            static mut RX_BUF: [u8; UART_BUF_SIZE] = [0; UART_BUF_SIZE];
            static mut TX_BUF: [u8; UART_BUF_SIZE] = [0; UART_BUF_SIZE];

            let mut uart_config = uart::Config::default();
            uart_config.baudrate = serial.baud_rate;
            // SAFETY: the buffers are only ever borrowed here, once.
            let uart = BufferedUart::new(
                p.UART0,
                p.PIN_16,
                p.PIN_17,
                Irqs,
                unsafe { &mut *addr_of_mut!(TX_BUF) },
                unsafe { &mut *addr_of_mut!(RX_BUF) },
                uart_config,
            );
            info!("serial bus at {} baud", serial.baud_rate);
            let bus = SerialFrameSource::new(UartLinePort::new(uart, serial.timeout_ms));
            run(config, board, bus);
        }
        BusConfig::I2c(i2c) => {
            // SAFETY: I2C0 and its pins are not handed to any HAL driver.
            let file = unsafe { MmioRegisterFile::new() };
            let mut driver = I2cSlaveDriver::new(RegisterBank::new(file, I2C0_BASE));
            if !driver.release_reset() {
                warn!("i2c0 did not leave reset");
            }
            driver.configure(&i2c);
            run(config, board, I2cCommandSource::new(driver));
        }
    }

    loop {
        cortex_m::asm::wfi();
    }
}

fn run<B: CommandBus>(config: BridgeConfig, board: Board, bus: B) {
    let mut dispatcher = match ActuatorDispatcher::new(config, board, bus, Delay) {
        Ok(d) => d,
        Err(e) => {
            error!("bad configuration: {}", e);
            return;
        }
    };

    match dispatcher.run() {
        Ok(RunOutcome::Served) => info!("serving stopped by button"),
        Ok(RunOutcome::Calibrated(Some(r))) => info!(
            "calibration done: last {}us, range {}..{}us",
            r.last_pulse_us, r.lowest_pulse_us, r.highest_pulse_us
        ),
        Ok(RunOutcome::Calibrated(None)) => warn!("calibration ended without a reading"),
        Err(e) => error!("halted: {}", e),
    }
    let stats = dispatcher.stats();
    info!(
        "written={} suppressed={} out_of_range={} bus_errors={}",
        stats.written, stats.suppressed, stats.out_of_range, stats.bus_errors
    );
}
