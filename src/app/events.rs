//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, count in a test
//! harness.  State handlers queue them on the context; the service
//! drains the queue after every tick.

use crate::fsm::StateId;

use super::ports::ScreenId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// The RTC oscillator-stop flag was found latched at startup.
    ClockFaultDetected,
    /// An operator press acknowledged the clock fault.
    ClockFaultAcknowledged,
    /// The oscillator-stop flag was cleared and timekeeping restarted.
    ClockFaultCleared,

    /// The RTC wake alarm fired.
    AlarmFired,
    /// The next wake alarm was programmed for `hour`:00:00.
    AlarmScheduled { hour: u8 },

    /// A watering pass began with the given pump time.
    WateringStarted { duration_secs: u16 },
    /// The pass ran to completion and the valve is closed.
    WateringFinished,
    /// The pass was skipped because the configured duration is zero.
    WateringSkipped,
    /// A reservoir trip stopped the pump mid-pass.
    WateringAborted,

    /// The reservoir interlock latched a trip.
    InterlockTripped,
    /// The float switch reads safe again; the settle window started.
    InterlockCleared,

    /// Stored settings were found and decoded at startup.
    ConfigLoaded {
        interval_hours: u8,
        duration_secs: u16,
    },
    /// No (or undecodable) stored settings; defaults are in effect.
    ConfigDefaulted,
    /// An operator edit changed the watering settings.
    ConfigEdited {
        interval_hours: u8,
        duration_secs: u16,
    },
    /// Settings were written back to persistent storage.
    ConfigSaved,

    /// The visible screen changed.
    ScreenChanged { screen: ScreenId },
    /// A press was consumed solely to light the backlight.
    BacklightWoken,

    /// The idle window elapsed; the device is about to light-sleep.
    EnteringSleep,
}
