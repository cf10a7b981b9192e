//! GPIO / peripheral pin assignments for the RP2040 servo controller board.
//!
//! Adapters and config defaults reference this module rather than hard-coding
//! pin numbers.

// ---------------------------------------------------------------------------
// Servo outputs
// ---------------------------------------------------------------------------

/// GPIO of servo output 1.  Outputs are consecutive: servo `n` is GPIO `n - 1`.
pub const SERVO_1_GPIO: u8 = 0;
/// Number of servo headers on the board.
pub const SERVO_OUTPUTS: usize = 18;

// ---------------------------------------------------------------------------
// Status LED bar (WS2812, driven by PIO0 SM0)
// ---------------------------------------------------------------------------

pub const LED_DATA_GPIO: u8 = 18;
pub const NUM_LEDS: usize = 6;

// ---------------------------------------------------------------------------
// Analog multiplexer (3 address lines into the shared ADC)
// ---------------------------------------------------------------------------

pub const ADC_ADDR_0_GPIO: u8 = 22;
pub const ADC_ADDR_1_GPIO: u8 = 24;
pub const ADC_ADDR_2_GPIO: u8 = 25;
/// Shared ADC input behind the mux (ADC3).
pub const SHARED_ADC_GPIO: u8 = 29;

/// Mux address of sensor header 1.  Headers 1–6 are addresses 0–5.
pub const SENSOR_1_ADDR: u8 = 0b000;
pub const SENSOR_2_ADDR: u8 = 0b001;
pub const SENSOR_3_ADDR: u8 = 0b010;
pub const SENSOR_4_ADDR: u8 = 0b011;
pub const SENSOR_5_ADDR: u8 = 0b100;
pub const SENSOR_6_ADDR: u8 = 0b101;

// ---------------------------------------------------------------------------
// User button (active-low, external pull-up)
// ---------------------------------------------------------------------------

pub const USER_SW_GPIO: u8 = 23;

// ---------------------------------------------------------------------------
// Command buses
// ---------------------------------------------------------------------------

/// UART0 TX.  Shares the header with servo 17, so only 16 servos remain usable
/// while the serial bus is active.
pub const UART_TX_GPIO: u8 = 16;
/// UART0 RX.  Shares the header with servo 18.
pub const UART_RX_GPIO: u8 = 17;

/// I2C0 SDA on the Qw/ST connector.
pub const I2C_SDA_GPIO: u8 = 20;
/// I2C0 SCL on the Qw/ST connector.
pub const I2C_SCL_GPIO: u8 = 21;

/// Highest GPIO number on the RP2040 (bank 0).
pub const MAX_GPIO: u8 = 29;
