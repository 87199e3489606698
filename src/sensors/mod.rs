//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver and produces a [`SensorSnapshot`] each
//! tick that gets written into `FsmContext.sensors`.

pub mod battery;
pub mod float_switch;

use crate::fsm::context::SensorSnapshot;
use battery::BatteryMonitor;
use float_switch::FloatSwitch;

/// Aggregates all sensor drivers and produces a unified snapshot.
pub struct SensorHub {
    pub float_switch: FloatSwitch,
    pub battery: BatteryMonitor,
}

impl SensorHub {
    /// Construct a new hub.  Pass in pre-built drivers (built in main
    /// where peripheral ownership is established).
    pub fn new(float_switch: FloatSwitch, battery: BatteryMonitor) -> Self {
        Self {
            float_switch,
            battery,
        }
    }

    /// Read every sensor and return a unified snapshot.
    pub fn read_all(&mut self) -> SensorSnapshot {
        SensorSnapshot {
            float_switch_level: self.float_switch.read(),
            battery_mv: self.battery.read(),
        }
    }
}
