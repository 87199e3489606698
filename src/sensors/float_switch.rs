//! Reservoir float switch.
//!
//! A magnetic float riding on the reservoir level closes (or opens,
//! board revisions differ) a reed contact wired to a GPIO input.  This
//! driver reports the **raw input level only**; whether that level means
//! "reservoir low" is decided against `SystemConfig::float_tripped_level`
//! in the application core.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the real GPIO level via hw_init helpers.
//! On host/test: reads from a static `AtomicBool` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(not(target_os = "espidf"))]
static SIM_FLOAT_LEVEL: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_float_level(level: bool) {
    SIM_FLOAT_LEVEL.store(level, Ordering::Relaxed);
}

pub struct FloatSwitch;

impl FloatSwitch {
    pub fn new() -> Self {
        Self
    }

    /// Sample the switch and return the raw level.
    pub fn read(&mut self) -> bool {
        self.read_gpio()
    }

    #[cfg(target_os = "espidf")]
    fn read_gpio(&self) -> bool {
        hw_init::gpio_read(pins::FLOAT_SWITCH_GPIO)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_gpio(&self) -> bool {
        SIM_FLOAT_LEVEL.load(Ordering::Relaxed)
    }
}

impl Default for FloatSwitch {
    fn default() -> Self {
        Self::new()
    }
}
