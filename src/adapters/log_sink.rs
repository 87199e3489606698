//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! A future radio or storage-backed audit adapter would implement the
//! same trait.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::ClockFaultDetected => {
                info!("CLOCK | oscillator stop flag set, time unreliable");
            }
            AppEvent::ClockFaultAcknowledged => {
                info!("CLOCK | fault acknowledged by operator");
            }
            AppEvent::ClockFaultCleared => {
                info!("CLOCK | oscillator flag cleared, timekeeping restarted");
            }
            AppEvent::AlarmFired => {
                info!("ALARM | RTC alarm fired");
            }
            AppEvent::AlarmScheduled { hour } => {
                info!("ALARM | next pass armed for {:02}:00", hour);
            }
            AppEvent::WateringStarted { duration_secs } => {
                info!("WATER | pass started ({}s pump time)", duration_secs);
            }
            AppEvent::WateringFinished => {
                info!("WATER | pass complete");
            }
            AppEvent::WateringSkipped => {
                info!("WATER | pass skipped (duration is zero)");
            }
            AppEvent::WateringAborted => {
                info!("WATER | pass aborted by interlock");
            }
            AppEvent::InterlockTripped => {
                info!("SAFETY | reservoir low, outputs locked");
            }
            AppEvent::InterlockCleared => {
                info!("SAFETY | reservoir recovered, settling before actuation");
            }
            AppEvent::ConfigLoaded {
                interval_hours,
                duration_secs,
            } => {
                info!(
                    "CONFIG | loaded (every {}h, {}s per pass)",
                    interval_hours, duration_secs
                );
            }
            AppEvent::ConfigDefaulted => {
                info!("CONFIG | no stored settings, using defaults");
            }
            AppEvent::ConfigEdited {
                interval_hours,
                duration_secs,
            } => {
                info!(
                    "CONFIG | edited (every {}h, {}s per pass)",
                    interval_hours, duration_secs
                );
            }
            AppEvent::ConfigSaved => {
                info!("CONFIG | saved");
            }
            AppEvent::ScreenChanged { screen } => {
                info!("MENU | screen -> {:?}", screen);
            }
            AppEvent::BacklightWoken => {
                info!("MENU | backlight woken");
            }
            AppEvent::EnteringSleep => {
                info!("POWER | entering light sleep");
            }
        }
    }
}
