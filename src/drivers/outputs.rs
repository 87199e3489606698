//! Discrete output drivers: solenoid valve, pump relay, fault LED.
//!
//! All three are plain active-high GPIOs. Each driver tracks the last
//! commanded state so the rest of the firmware can query without touching
//! the hardware.
//!
//! ## Safety contract
//!
//! The pump must never be energised against a closed valve, and neither
//! output may run while the reservoir interlock is tripped. That ordering
//! is enforced above (the actuator port applies valve-before-pump);
//! these drivers are dumb actuators.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: real GPIO writes via hw_init helpers.
//! On host/test: state tracking only (hw_init's sim write is a no-op).

use crate::drivers::hw_init;
use crate::pins;

/// Zone solenoid valve driver (normally-closed valve, opens when driven).
pub struct SolenoidValve {
    open: bool,
}

impl SolenoidValve {
    /// Driver starts with the valve de-energised (closed).
    pub fn new() -> Self {
        hw_init::gpio_write(pins::SOLENOID_GPIO, false);
        Self { open: false }
    }

    pub fn set(&mut self, open: bool) {
        hw_init::gpio_write(pins::SOLENOID_GPIO, open);
        self.open = open;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Default for SolenoidValve {
    fn default() -> Self {
        Self::new()
    }
}

/// Water pump relay driver.
pub struct PumpSwitch {
    on: bool,
}

impl PumpSwitch {
    /// Driver starts with the relay released (pump off).
    pub fn new() -> Self {
        hw_init::gpio_write(pins::PUMP_GPIO, false);
        Self { on: false }
    }

    pub fn set(&mut self, on: bool) {
        hw_init::gpio_write(pins::PUMP_GPIO, on);
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl Default for PumpSwitch {
    fn default() -> Self {
        Self::new()
    }
}

/// Discrete fault LED. Blink patterns are timed by the state machine;
/// this driver only switches the pin.
pub struct FaultLed {
    lit: bool,
}

impl FaultLed {
    pub fn new() -> Self {
        hw_init::gpio_write(pins::FAULT_LED_GPIO, false);
        Self { lit: false }
    }

    pub fn set(&mut self, lit: bool) {
        hw_init::gpio_write(pins::FAULT_LED_GPIO, lit);
        self.lit = lit;
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

impl Default for FaultLed {
    fn default() -> Self {
        Self::new()
    }
}
