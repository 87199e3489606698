//! Battery voltage monitor.
//!
//! The battery rail feeds ADC1 through a 2:1 resistive divider (two
//! matched 100 kΩ), so a 6.2 V fresh pack lands comfortably inside the
//! 11 dB attenuation range.  The reading is a coarse health indicator
//! for the front-panel battery screen, not a fuel gauge; a plain
//! linear conversion is all it gets.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the battery channel via the oneshot ADC in hw_init.
//! On host/test: reads from a static `AtomicU16` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_BATTERY_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_battery_adc(raw: u16) {
    SIM_BATTERY_ADC.store(raw, Ordering::Relaxed);
}

/// Full-scale pin voltage at 11 dB attenuation, millivolts.
const ADC_FULL_SCALE_MV: u32 = 3100;
/// 12-bit conversion ceiling.
const ADC_MAX_COUNTS: u32 = 4095;
/// External divider: battery volts per pin volt.
const DIVIDER_RATIO: u32 = 2;

pub struct BatteryMonitor;

impl BatteryMonitor {
    pub fn new() -> Self {
        Self
    }

    /// Sample the ADC and return battery millivolts.
    pub fn read(&mut self) -> u16 {
        Self::raw_to_battery_mv(self.read_adc())
    }

    fn raw_to_battery_mv(raw: u16) -> u16 {
        let pin_mv = (raw as u32) * ADC_FULL_SCALE_MV / ADC_MAX_COUNTS;
        (pin_mv * DIVIDER_RATIO).min(u16::MAX as u32) as u16
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(hw_init::ADC1_CH_BATTERY)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_BATTERY_ADC.load(Ordering::Relaxed)
    }
}

impl Default for BatteryMonitor {
    fn default() -> Self {
        Self::new()
    }
}
