//! GPIO / peripheral pin assignments for the Droplet main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// I²C bus (DS3231 RTC + PCF8574 LCD backpack share the bus)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;

/// 7-bit I²C address of the DS3231 real-time clock.
pub const DS3231_I2C_ADDR: u8 = 0x68;
/// 7-bit I²C address of the PCF8574 backpack behind the 16×2 LCD.
pub const LCD_I2C_ADDR: u8 = 0x27;

// ---------------------------------------------------------------------------
// Interrupt lines (both active-low, falling-edge)
// ---------------------------------------------------------------------------

/// Shared button-activity interrupt; any directional button pulls it low.
pub const BUTTON_INT_GPIO: i32 = 27;
/// DS3231 INT/SQW output, latched low while the alarm flag is set.
pub const RTC_INT_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// Directional buttons (hardware pull-ups, active-low)
// ---------------------------------------------------------------------------

pub const BTN_UP_GPIO: i32 = 32;
pub const BTN_DOWN_GPIO: i32 = 33;
/// Input-only pad; relies on the external pull-up on the button board.
pub const BTN_LEFT_GPIO: i32 = 34;
/// Input-only pad; relies on the external pull-up on the button board.
pub const BTN_RIGHT_GPIO: i32 = 35;

// ---------------------------------------------------------------------------
// Safety sensor
// ---------------------------------------------------------------------------

/// Reservoir float switch.  Raw level only; tripped polarity is a
/// `SystemConfig` field, never assumed here.
pub const FLOAT_SWITCH_GPIO: i32 = 25;

// ---------------------------------------------------------------------------
// Battery monitor (ADC1)
// ---------------------------------------------------------------------------

// Battery voltage arrives through a 2:1 divider on GPIO 36 (SENSOR_VP),
// which is ADC1 channel 0. The ADC driver addresses it by channel, not
// pin; see `hw_init::ADC1_CH_BATTERY` and the attenuation set in
// `hw_init::init_adc`.

// ---------------------------------------------------------------------------
// Actuators (all active-high)
// ---------------------------------------------------------------------------

/// Water pump relay driver.
pub const PUMP_GPIO: i32 = 12;
/// Zone solenoid valve driver.
pub const SOLENOID_GPIO: i32 = 13;
/// Discrete fault LED (clock fault / interlock blink patterns).
/// The LCD backlight is not here, it hangs off the PCF8574 expander.
pub const FAULT_LED_GPIO: i32 = 14;
