//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It contains the latest sensor and button samples, actuator
//! command outputs, timing information, configuration, the interactive
//! menu model, and the watering collaborators (interlock gate, cycle
//! sequencer, idle tracker).  Think of it as the "blackboard" in a
//! blackboard architecture: handlers are plain `fn` pointers, so every
//! piece of state they touch lives here.
//!
//! Port I/O never happens inside a handler.  Handlers raise *requests*
//! (`request_arm`, `request_clear_clock_fault`, `request_sleep`) and the
//! service performs the clock/storage calls after the tick returns.

use crate::app::events::AppEvent;
use crate::app::ports::{ButtonStates, ScreenId};
use crate::config::{SystemConfig, WateringConfig};
use crate::interlock::SafetyGate;
use crate::menu::MenuModel;
use crate::power::IdleTracker;
use crate::watering::WateringSequencer;

use log::warn;

/// Most events a single tick can raise (alarm consume + gate edge +
/// cycle resolution + menu activity fits well inside this).
const EVENT_QUEUE_DEPTH: usize = 8;

// ---------------------------------------------------------------------------
// Sensor snapshot (read-only to state handlers; written by the service)
// ---------------------------------------------------------------------------

/// A point-in-time snapshot of every sensor in the system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorSnapshot {
    /// Raw float-switch input level.  Polarity is resolved against
    /// [`SystemConfig::float_tripped_level`] by
    /// [`FsmContext::reservoir_tripped`], never here.
    pub float_switch_level: bool,
    /// Battery rail voltage in millivolts (after divider correction).
    pub battery_mv: u16,
}

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

/// Commands that state handlers write to request output levels.
/// The service applies these to the actual drivers each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorCommands {
    /// Solenoid valve open.
    pub solenoid_on: bool,
    /// Pump energised.  Never asserted without `solenoid_on`.
    pub pump_on: bool,
    /// Fault LED level (blink patterns are computed per tick).
    pub fault_led_on: bool,
    /// LCD backlight lit.
    pub backlight_on: bool,
}

impl Default for ActuatorCommands {
    fn default() -> Self {
        Self {
            solenoid_on: false,
            pump_on: false,
            fault_led_on: false,
            backlight_on: true, // display readable at power-on
        }
    }
}

impl ActuatorCommands {
    /// Water path and fault LED off, backlight lit; safe power-on levels.
    pub fn all_off() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,
    /// Duration of one tick in milliseconds.
    pub tick_period_ms: u32,
    /// Wrapping millisecond uptime, sampled by the service before the tick.
    pub now_ms: u32,

    // -- Inputs --
    /// Latest sensor readings.  Updated before each FSM tick.
    pub sensors: SensorSnapshot,
    /// Button levels sampled this tick.  Only meaningful while
    /// `pending_input` is set.
    pub buttons: ButtonStates,
    /// A button interrupt fired since the last time a handler consumed one.
    pub pending_input: bool,
    /// The RTC alarm fired since the last completed watering pass.
    pub pending_alarm: bool,
    /// Timestamp the interrupt path recorded for the most recent press.
    pub last_input_ms: u32,
    /// Oscillator verdict sampled from the RTC at startup.  `None` until
    /// the service has asked the clock.
    pub clock_ok: Option<bool>,

    // -- Outputs --
    /// Commands to be applied to actuators after the FSM tick.
    pub commands: ActuatorCommands,
    /// Screen the display should show.
    pub active_screen: ScreenId,
    /// The display content is stale and needs a redraw.
    pub display_dirty: bool,

    // -- Requests to the service (consumed after the tick) --
    /// Program the next RTC alarm from the current interval.
    pub request_arm: bool,
    /// Clear the RTC oscillator-stop fault (operator acknowledged it).
    pub request_clear_clock_fault: bool,
    /// Persist config and enter light sleep.
    pub request_sleep: bool,

    // -- Configuration --
    /// Fixed tuning parameters.
    pub config: SystemConfig,
    /// Operator-editable watering parameters (persisted across sleep).
    pub watering: WateringConfig,

    // -- Collaborators --
    /// Screen selection and edit handling.
    pub menu: MenuModel,
    /// Reservoir interlock with its post-clear settling window.
    pub gate: SafetyGate,
    /// Open → settle → pump → settle → close sequencer.
    pub sequencer: WateringSequencer,
    /// Inactivity window driving light sleep.
    pub idle: IdleTracker,
    /// The first alarm has been programmed.
    pub alarm_armed: bool,

    // -- Event queue --
    /// Events raised by handlers this tick; drained to the sink by the
    /// service after the tick.
    pub events: heapless::Vec<AppEvent, EVENT_QUEUE_DEPTH>,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: SystemConfig) -> Self {
        let menu = MenuModel::new();
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            tick_period_ms: config.tick_period_ms,
            now_ms: 0,
            sensors: SensorSnapshot::default(),
            buttons: ButtonStates::default(),
            pending_input: false,
            pending_alarm: false,
            last_input_ms: 0,
            clock_ok: None,
            commands: ActuatorCommands::all_off(),
            active_screen: menu.screen(),
            display_dirty: true,
            request_arm: false,
            request_clear_clock_fault: false,
            request_sleep: false,
            watering: WateringConfig::default(),
            menu,
            gate: SafetyGate::new(&config),
            sequencer: WateringSequencer::new(&config),
            idle: IdleTracker::new(&config, 0),
            alarm_armed: false,
            events: heapless::Vec::new(),
            config,
        }
    }

    /// Milliseconds elapsed since the current state was entered.
    pub fn ms_in_state(&self) -> u32 {
        (self.ticks_in_state as u32).wrapping_mul(self.tick_period_ms)
    }

    /// Whether the float switch currently reads the tripped level.
    pub fn reservoir_tripped(&self) -> bool {
        self.sensors.float_switch_level == self.config.float_tripped_level
    }

    /// Queue an event for the sink.  The queue is sized for the worst
    /// tick; if it ever overflows the event is dropped, not the tick.
    pub fn push_event(&mut self, event: AppEvent) {
        if self.events.push(event).is_err() {
            warn!("event queue full, dropping event");
        }
    }
}
