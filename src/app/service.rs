//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the FSM, alarm scheduler, and shared context.
//! It exposes a clean, hardware-agnostic API.  All I/O flows through
//! port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  ClockPort ◀──▶ ┌────────────────────────┐ ──▶ EventSink
//!  SensorPort ──▶ │       AppService        │
//!  InputPort  ──▶ │  FSM · Gate · Scheduler │ ──▶ ActuatorPort
//!  StoragePort ◀─▶└────────────────────────┘ ──▶ DisplayPort
//! ```
//!
//! Per tick: consume interrupt signals → sample inputs → FSM → perform
//! the clock work the handlers requested → apply outputs → drain events.

use core::mem::take;

use log::{info, warn};

use crate::config::SystemConfig;
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::persist;
use crate::scheduler::AlarmScheduler;
use crate::signals::SignalSample;

use super::events::AppEvent;
use super::ports::{
    ActuatorPort, ClockPort, DisplayPort, EventSink, InputPort, ScreenView, SensorPort,
    StoragePort,
};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// What the caller must do after a tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickOutcome {
    /// The idle window elapsed: persist and light-sleep now.
    pub sleep_requested: bool,
}

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    scheduler: AlarmScheduler,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let ctx = FsmContext::new(config);
        let state_table = build_state_table();
        let fsm = Fsm::new(state_table, StateId::Boot);

        Self {
            fsm,
            ctx,
            scheduler: AlarmScheduler::new(),
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load persisted settings, sample the oscillator verdict, and run
    /// the initial `on_enter`.  Call once before the first `tick()`.
    ///
    /// Nothing here is fatal: unreadable storage falls back to defaults
    /// and an unreadable clock is treated as faulted (the operator can
    /// acknowledge and retry from the front panel).
    pub fn start(
        &mut self,
        now_ms: u32,
        clock: &mut impl ClockPort,
        storage: &impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        match persist::load(storage) {
            Ok(Some(cfg)) => {
                self.ctx.watering = cfg;
                self.ctx.push_event(AppEvent::ConfigLoaded {
                    interval_hours: cfg.interval.hours(),
                    duration_secs: cfg.duration_secs,
                });
            }
            Ok(None) => self.ctx.push_event(AppEvent::ConfigDefaulted),
            Err(e) => {
                warn!("Persist: load failed ({e}), using defaults");
                self.ctx.push_event(AppEvent::ConfigDefaulted);
            }
        }

        self.ctx.clock_ok = Some(match clock.oscillator_is_valid() {
            Ok(valid) => valid,
            Err(e) => {
                warn!("Scheduler: oscillator check failed ({e}), treating clock as faulted");
                false
            }
        });

        self.ctx.now_ms = now_ms;
        self.ctx.idle.note_input(now_ms);

        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        self.drain_events(sink);
        info!("AppService started in {:?}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    ///
    /// The `hw` parameter satisfies **all four** hardware-facing ports;
    /// this avoids a pile of mutable borrows while keeping the port
    /// boundary explicit.  The clock stays separate because the scheduler
    /// needs it on its own.
    pub fn tick(
        &mut self,
        now_ms: u32,
        signals: SignalSample,
        hw: &mut (impl SensorPort + InputPort + ActuatorPort + DisplayPort),
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> TickOutcome {
        self.tick_count += 1;
        let prev_state = self.fsm.current_state();
        self.ctx.now_ms = now_ms;

        // 1. Consume interrupt signals.  The alarm flag in the RTC is
        //    released here, at consumption, so the INT line deasserts and
        //    the next armed alarm can pull it low again.
        if signals.alarm_pending {
            if let Err(e) = clock.clear_alarm_flag() {
                warn!("Scheduler: alarm flag clear failed ({e})");
            }
            self.ctx.pending_alarm = true;
            self.ctx.push_event(AppEvent::AlarmFired);
        }
        if signals.input_pending {
            self.ctx.pending_input = true;
        }
        self.ctx.last_input_ms = signals.last_input_ms;

        // 2. Sample inputs via SensorPort / InputPort.
        self.ctx.sensors = hw.read_all();
        self.ctx.buttons = hw.read();

        // 3. FSM tick (pure state logic).
        self.fsm.tick(&mut self.ctx);

        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            self.ctx.push_event(AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }

        // 4. Clock work the handlers requested.
        if take(&mut self.ctx.request_clear_clock_fault) {
            match clock.clear_oscillator_fault() {
                Ok(()) => {
                    self.ctx.clock_ok = Some(true);
                    self.ctx.push_event(AppEvent::ClockFaultCleared);
                }
                Err(e) => warn!("Scheduler: oscillator fault clear failed ({e})"),
            }
        }
        if take(&mut self.ctx.request_arm) {
            match self.scheduler.arm(clock, self.ctx.watering.interval) {
                Ok(hour) => self.ctx.push_event(AppEvent::AlarmScheduled { hour }),
                Err(e) => {
                    // An unarmed device never wakes again; keep retrying.
                    warn!("Scheduler: alarm arm failed ({e}), will retry");
                    self.ctx.request_arm = true;
                }
            }
        }

        // 5. Apply outputs via ActuatorPort / DisplayPort.
        self.apply_actuators(hw);
        hw.set_backlight(self.ctx.commands.backlight_on);
        if take(&mut self.ctx.display_dirty) {
            hw.show(&self.screen_view());
        }

        // 6. Hand queued events to the sink.
        self.drain_events(sink);

        TickOutcome {
            sleep_requested: take(&mut self.ctx.request_sleep),
        }
    }

    /// Persist settings and blank the display ahead of light sleep.
    ///
    /// The caller owns the actual sleep call; on wake it re-posts the
    /// wake cause through the signal cells and resumes ticking.
    pub fn prepare_sleep(
        &mut self,
        storage: &mut impl StoragePort,
        hw: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        match persist::save(storage, &self.ctx.watering) {
            Ok(true) => self.ctx.push_event(AppEvent::ConfigSaved),
            Ok(false) => {}
            Err(e) => warn!("Persist: save failed ({e}), settings may revert"),
        }

        self.ctx.menu.blank_backlight();
        self.ctx.commands.backlight_on = false;
        hw.set_backlight(false);

        self.ctx.push_event(AppEvent::EnteringSleep);
        self.drain_events(sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Copy of the live watering settings (for logs and read-back).
    pub fn watering_config(&self) -> crate::config::WateringConfig {
        self.ctx.watering
    }

    /// Hour the next alarm is armed for, if one has been programmed.
    pub fn armed_hour(&self) -> Option<u8> {
        self.scheduler.armed_hour()
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate FSM actuator commands into port calls.
    ///
    /// Ordering matters at the hardware: the pump is never energised
    /// against a closed valve, even transiently, so the valve opens
    /// before the pump starts and the pump stops before anything closes.
    fn apply_actuators(&self, hw: &mut impl ActuatorPort) {
        let cmds = &self.ctx.commands;

        if cmds.pump_on && cmds.solenoid_on {
            hw.set_solenoid(true);
            hw.set_pump(true);
        } else {
            hw.set_pump(false);
            hw.set_solenoid(cmds.solenoid_on);
        }
        hw.set_fault_led(cmds.fault_led_on);
    }

    fn screen_view(&self) -> ScreenView {
        ScreenView {
            screen: self.ctx.active_screen,
            interval: self.ctx.watering.interval,
            duration_secs: self.ctx.watering.duration_secs,
            battery_mv: self.ctx.sensors.battery_mv,
        }
    }

    fn drain_events(&mut self, sink: &mut impl EventSink) {
        for event in self.ctx.events.iter() {
            sink.emit(event);
        }
        self.ctx.events.clear();
    }
}
