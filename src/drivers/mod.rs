//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod buttons;
pub mod hw_init;
pub mod outputs;
pub mod watchdog;
