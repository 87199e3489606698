//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (clock, sensors, actuators, display, storage, event
//! sinks) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! ## Conventions
//!
//! - Float-switch **polarity is resolved in the core**, never in the
//!   adapter: `SensorPort` reports the raw input level and the service
//!   compares it against the configured tripped level.
//! - Fallible ports (clock, storage) return typed errors; callers must
//!   handle every variant explicitly.  GPIO-backed ports are infallible;
//!   their adapters log transport problems internally.

use crate::config::WateringInterval;
use crate::fsm::context::SensorSnapshot;

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain ↔ battery-backed RTC)
// ───────────────────────────────────────────────────────────────

/// A calendar time-of-day read from the RTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RtcTime {
    /// Hour of day, 0–23.
    pub hour: u8,
    /// Minute, 0–59.
    pub minute: u8,
    /// Second, 0–59.
    pub second: u8,
    /// Day of week, 1–7 (device-defined epoch; only logged).
    pub weekday: u8,
}

/// Alarm repetition mode.
///
/// The RTC supports richer match modes, but the controller only ever
/// programs a daily hour:minute:second match; intervals are realised by
/// re-arming with a new hour after every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmMode {
    /// Fire when hour, minute, and second all match, once per day.
    Daily,
}

/// Battery-backed real-time clock with a single wake alarm.
pub trait ClockPort {
    /// Read the current time of day.
    fn now(&mut self) -> Result<RtcTime, ClockError>;

    /// Program the wake alarm.
    fn set_alarm(
        &mut self,
        hour: u8,
        minute: u8,
        second: u8,
        mode: AlarmMode,
    ) -> Result<(), ClockError>;

    /// Whether the oscillator has run continuously since the last check.
    /// `false` means the stop flag is latched and the time cannot be
    /// trusted until an operator intervenes.
    fn oscillator_is_valid(&mut self) -> Result<bool, ClockError>;

    /// Clear the latched oscillator-stop flag and restart the seconds
    /// count from zero.  Called once the fault has been acknowledged.
    fn clear_oscillator_fault(&mut self) -> Result<(), ClockError>;

    /// Clear the latched alarm-fired flag so the interrupt line releases
    /// and the next alarm can assert it again.
    fn clear_alarm_flag(&mut self) -> Result<(), ClockError>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// Read every sensor and return a unified snapshot.
    fn read_all(&mut self) -> SensorSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: button bank → domain)
// ───────────────────────────────────────────────────────────────

/// Level of each directional button at sample time.
///
/// The interrupt path only records *that* a press happened; which button
/// is held is read through this port when the press is consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonStates {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl ButtonStates {
    /// Any button currently held.
    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

/// Read-side port for the four-button front panel.
pub trait InputPort {
    /// Sample all button levels.
    fn read(&mut self) -> ButtonStates;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command outputs.
pub trait ActuatorPort {
    /// Open (`true`) or close (`false`) the solenoid valve.
    fn set_solenoid(&mut self, open: bool);

    /// Energise (`true`) or stop (`false`) the pump.
    fn set_pump(&mut self, on: bool);

    /// Drive the fault LED level.
    fn set_fault_led(&mut self, on: bool);

    /// Kill every output; safe shutdown.
    fn all_off(&mut self) {
        self.set_pump(false);
        self.set_solenoid(false);
        self.set_fault_led(false);
    }
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → LCD)
// ───────────────────────────────────────────────────────────────

/// Identity of each screen the display can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenId {
    /// Manual-test screen; Up/Down edit the pump duration here too.
    Test,
    /// Pump duration editor.
    Duration,
    /// Watering interval selector.
    Interval,
    /// Battery voltage readout.
    Battery,
    /// RTC oscillator fault notice (blocks until acknowledged).
    FaultClock,
    /// Reservoir-low notice (shown while the interlock is tripped).
    FaultLowWater,
}

/// Everything the display needs to render one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenView {
    pub screen: ScreenId,
    pub interval: WateringInterval,
    pub duration_secs: u16,
    pub battery_mv: u16,
}

/// Write-side port for the character LCD.
pub trait DisplayPort {
    /// Render the given view.  Called only when content changed.
    fn show(&mut self, view: &ScreenView);

    /// Light or blank the backlight.
    fn set_backlight(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, a
/// count in a test harness, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Byte-addressed persistent cells for operator settings.
///
/// Reads of never-written cells return `0xFF` (erased-flash convention);
/// the config codec treats that as "no stored value".  Writes MUST be
/// atomic: no partial cells on power loss.  The ESP-IDF NVS API
/// guarantees this natively; in-memory simulation achieves it trivially.
pub trait StoragePort {
    /// Read one cell.
    fn read_byte(&self, addr: u8) -> Result<u8, StorageError>;

    /// Write one cell atomically.
    fn write_byte(&mut self, addr: u8, value: u8) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ClockPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The I²C transaction failed (NAK, bus timeout, arbitration loss).
    Bus,
    /// The device answered but the register contents do not decode to a
    /// valid time (corrupt BCD digits, field out of range).
    InvalidTime,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Storage partition is full.
    Full,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ClockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus => write!(f, "RTC bus error"),
            Self::InvalidTime => write!(f, "RTC returned an invalid time"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
