//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`], the button bank, the three discrete outputs,
//! and the LCD, exposing them through [`SensorPort`], [`InputPort`],
//! [`ActuatorPort`] and [`DisplayPort`].  This is the only module in the
//! system that touches actual hardware.  On non-espidf targets, the
//! underlying drivers use cfg-gated simulation stubs.

use crate::app::ports::{ActuatorPort, ButtonStates, DisplayPort, InputPort, ScreenView, SensorPort};
use crate::drivers::buttons::ButtonBank;
use crate::drivers::outputs::{FaultLed, PumpSwitch, SolenoidValve};
use crate::fsm::context::SensorSnapshot;
use crate::sensors::SensorHub;

use super::display::Lcd1602;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    sensor_hub: SensorHub,
    buttons: ButtonBank,
    solenoid: SolenoidValve,
    pump: PumpSwitch,
    fault_led: FaultLed,
    lcd: Lcd1602,
}

impl HardwareAdapter {
    pub fn new(
        sensor_hub: SensorHub,
        buttons: ButtonBank,
        solenoid: SolenoidValve,
        pump: PumpSwitch,
        fault_led: FaultLed,
        lcd: Lcd1602,
    ) -> Self {
        Self {
            sensor_hub,
            buttons,
            solenoid,
            pump,
            fault_led,
            lcd,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn read_all(&mut self) -> SensorSnapshot {
        self.sensor_hub.read_all()
    }
}

// ── InputPort implementation ──────────────────────────────────

impl InputPort for HardwareAdapter {
    fn read(&mut self) -> ButtonStates {
        self.buttons.read()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_solenoid(&mut self, open: bool) {
        self.solenoid.set(open);
    }

    fn set_pump(&mut self, on: bool) {
        self.pump.set(on);
    }

    fn set_fault_led(&mut self, lit: bool) {
        self.fault_led.set(lit);
    }
}

// ── DisplayPort implementation ────────────────────────────────

impl DisplayPort for HardwareAdapter {
    fn show(&mut self, view: &ScreenView) {
        self.lcd.show(view);
    }

    fn set_backlight(&mut self, on: bool) {
        self.lcd.set_backlight(on);
    }
}
