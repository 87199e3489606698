//! Mock adapters and the bench driver for the integration suite.
//!
//! `MockHardware` records every actuator and display call with a bench
//! timestamp, so scenarios can assert on ordering and timing margins
//! rather than just final levels.  `Bench` owns a full service instance
//! plus the clocking and signal plumbing a real main loop would provide.

use droplet::app::events::AppEvent;
use droplet::app::ports::{
    ActuatorPort, AlarmMode, ButtonStates, ClockError, ClockPort, DisplayPort, EventSink,
    InputPort, RtcTime, ScreenView, SensorPort, StorageError, StoragePort,
};
use droplet::app::service::{AppService, TickOutcome};
use droplet::config::SystemConfig;
use droplet::fsm::context::SensorSnapshot;
use droplet::signals::SignalSample;
use std::collections::HashMap;

/// One control tick, matching `SystemConfig::default().tick_period_ms`.
pub const TICK_MS: u32 = 50;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Solenoid { open: bool, at_ms: u32 },
    Pump { on: bool, at_ms: u32 },
    FaultLed { on: bool },
}

// ── MockHardware ──────────────────────────────────────────────

/// Satisfies all four hardware-facing ports.  Sensor and button levels
/// are plain public fields the test pokes between ticks.
pub struct MockHardware {
    /// Bench time, copied in before each tick so records carry timestamps.
    pub now_ms: u32,
    /// Raw float-switch level (`true` is the tripped level by default).
    pub float_switch_level: bool,
    pub battery_mv: u16,
    /// Buttons currently held, as the input port will report them.
    pub held: ButtonStates,
    pub calls: Vec<ActuatorCall>,
    pub frames: Vec<ScreenView>,
    pub backlight: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            float_switch_level: false,
            battery_mv: 4_150,
            held: ButtonStates::default(),
            calls: Vec::new(),
            frames: Vec::new(),
            backlight: false,
        }
    }

    /// Current solenoid level (last commanded).
    pub fn solenoid_open(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Solenoid { open, .. } => Some(*open),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Current pump level (last commanded).
    pub fn pump_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Pump { on, .. } => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Level transitions of the pump line as `(at_ms, on)` pairs.  The
    /// service re-commands levels every tick, so edges have to be
    /// recovered from the call history.
    pub fn pump_edges(&self) -> Vec<(u32, bool)> {
        let mut edges = Vec::new();
        let mut level = false;
        for call in &self.calls {
            if let ActuatorCall::Pump { on, at_ms } = call {
                if *on != level {
                    edges.push((*at_ms, *on));
                    level = *on;
                }
            }
        }
        edges
    }

    /// Level transitions of the solenoid line as `(at_ms, open)` pairs.
    pub fn solenoid_edges(&self) -> Vec<(u32, bool)> {
        let mut edges = Vec::new();
        let mut level = false;
        for call in &self.calls {
            if let ActuatorCall::Solenoid { open, at_ms } = call {
                if *open != level {
                    edges.push((*at_ms, *open));
                    level = *open;
                }
            }
        }
        edges
    }

    /// The most recently rendered frame, if any.
    pub fn last_frame(&self) -> Option<&ScreenView> {
        self.frames.last()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_all(&mut self) -> SensorSnapshot {
        SensorSnapshot {
            float_switch_level: self.float_switch_level,
            battery_mv: self.battery_mv,
        }
    }
}

impl InputPort for MockHardware {
    fn read(&mut self) -> ButtonStates {
        self.held
    }
}

impl ActuatorPort for MockHardware {
    fn set_solenoid(&mut self, open: bool) {
        self.calls.push(ActuatorCall::Solenoid {
            open,
            at_ms: self.now_ms,
        });
    }

    fn set_pump(&mut self, on: bool) {
        self.calls.push(ActuatorCall::Pump {
            on,
            at_ms: self.now_ms,
        });
    }

    fn set_fault_led(&mut self, on: bool) {
        self.calls.push(ActuatorCall::FaultLed { on });
    }
}

impl DisplayPort for MockHardware {
    fn show(&mut self, view: &ScreenView) {
        self.frames.push(*view);
    }

    fn set_backlight(&mut self, on: bool) {
        self.backlight = on;
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Scriptable RTC: fixed time of day, settable oscillator verdict, and a
/// record of every alarm programmed and every flag cleared.
pub struct MockClock {
    pub time: RtcTime,
    pub oscillator_ok: bool,
    pub alarms: Vec<(u8, u8, u8)>,
    pub alarm_flag_clears: usize,
    pub fault_clears: usize,
}

#[allow(dead_code)]
impl MockClock {
    pub fn healthy_at(hour: u8) -> Self {
        Self {
            time: RtcTime {
                hour,
                minute: 0,
                second: 0,
                weekday: 1,
            },
            oscillator_ok: true,
            alarms: Vec::new(),
            alarm_flag_clears: 0,
            fault_clears: 0,
        }
    }

    /// Backup battery died: the oscillator-stop flag is latched.
    pub fn with_stopped_oscillator() -> Self {
        Self {
            oscillator_ok: false,
            ..Self::healthy_at(0)
        }
    }
}

impl ClockPort for MockClock {
    fn now(&mut self) -> Result<RtcTime, ClockError> {
        Ok(self.time)
    }

    fn set_alarm(
        &mut self,
        hour: u8,
        minute: u8,
        second: u8,
        _mode: AlarmMode,
    ) -> Result<(), ClockError> {
        self.alarms.push((hour, minute, second));
        Ok(())
    }

    fn oscillator_is_valid(&mut self) -> Result<bool, ClockError> {
        Ok(self.oscillator_ok)
    }

    fn clear_oscillator_fault(&mut self) -> Result<(), ClockError> {
        self.oscillator_ok = true;
        self.fault_clears += 1;
        Ok(())
    }

    fn clear_alarm_flag(&mut self) -> Result<(), ClockError> {
        self.alarm_flag_clears += 1;
        Ok(())
    }
}

// ── MapStorage ────────────────────────────────────────────────

/// Byte-cell store.  Missing cells read as erased (`0xFF`); writes are
/// counted so wear behaviour is observable.
pub struct MapStorage {
    pub cells: HashMap<u8, u8>,
    pub writes: usize,
}

#[allow(dead_code)]
impl MapStorage {
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
            writes: 0,
        }
    }

    /// Storage as a previous run would have left it.
    pub fn seeded(interval_hours: u8, duration_minutes: u8) -> Self {
        let mut storage = Self::new();
        storage
            .cells
            .insert(droplet::persist::ADDR_INTERVAL_HOURS, interval_hours);
        storage
            .cells
            .insert(droplet::persist::ADDR_DURATION_MINUTES, duration_minutes);
        storage
    }
}

impl Default for MapStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePort for MapStorage {
    fn read_byte(&self, addr: u8) -> Result<u8, StorageError> {
        Ok(self.cells.get(&addr).copied().unwrap_or(0xFF))
    }

    fn write_byte(&mut self, addr: u8, value: u8) -> Result<(), StorageError> {
        self.writes += 1;
        self.cells.insert(addr, value);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Bench ─────────────────────────────────────────────────────

/// A booted service wired to the mocks above, with the tick clocking and
/// interrupt-signal plumbing the firmware's main loop normally provides.
pub struct Bench {
    pub service: AppService,
    pub hw: MockHardware,
    pub clock: MockClock,
    pub storage: MapStorage,
    pub sink: RecordingSink,
    pub now_ms: u32,
    last_input_ms: u32,
}

#[allow(dead_code)]
impl Bench {
    /// Boot with virgin storage and a healthy RTC reading `hour`:00.
    pub fn boot(hour: u8) -> Self {
        Self::boot_with(MockClock::healthy_at(hour), MapStorage::new())
    }

    pub fn boot_with(clock: MockClock, storage: MapStorage) -> Self {
        let mut bench = Self {
            service: AppService::new(SystemConfig::default()),
            hw: MockHardware::new(),
            clock,
            storage,
            sink: RecordingSink::default(),
            now_ms: 0,
            last_input_ms: 0,
        };
        bench
            .service
            .start(0, &mut bench.clock, &bench.storage, &mut bench.sink);
        bench
    }

    /// Advance one quiet tick.
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_signals(false, false)
    }

    /// Advance one tick, delivering the given interrupt flags the way the
    /// signal cells would.
    pub fn tick_signals(&mut self, input: bool, alarm: bool) -> TickOutcome {
        self.now_ms += TICK_MS;
        if input {
            self.last_input_ms = self.now_ms;
        }
        self.hw.now_ms = self.now_ms;
        let signals = SignalSample {
            input_pending: input,
            alarm_pending: alarm,
            last_input_ms: self.last_input_ms,
        };
        self.service
            .tick(self.now_ms, signals, &mut self.hw, &mut self.clock, &mut self.sink)
    }

    /// Run quiet ticks for `ms` of bench time.
    pub fn run_ms(&mut self, ms: u32) {
        for _ in 0..ms / TICK_MS {
            self.tick();
        }
    }

    /// Run quiet ticks until `done` holds, failing after `limit_ms`.
    pub fn run_until(&mut self, limit_ms: u32, mut done: impl FnMut(&Bench) -> bool) {
        let deadline = self.now_ms + limit_ms;
        while !done(self) {
            assert!(
                self.now_ms < deadline,
                "bench condition not reached within {limit_ms} ms"
            );
            self.tick();
        }
    }

    /// Run quiet ticks until the service requests sleep.
    pub fn run_until_sleep(&mut self, limit_ms: u32) {
        let deadline = self.now_ms + limit_ms;
        loop {
            let outcome = self.tick();
            if outcome.sleep_requested {
                return;
            }
            assert!(self.now_ms < deadline, "no sleep request within {limit_ms} ms");
        }
    }

    /// Press and release one button combination, delivering the interrupt
    /// edge alongside the level sample.
    pub fn press(&mut self, up: bool, down: bool, left: bool, right: bool) -> TickOutcome {
        self.hw.held = ButtonStates {
            up,
            down,
            left,
            right,
        };
        let outcome = self.tick_signals(true, false);
        self.hw.held = ButtonStates::default();
        outcome
    }

    pub fn press_up(&mut self) -> TickOutcome {
        self.press(true, false, false, false)
    }

    pub fn press_down(&mut self) -> TickOutcome {
        self.press(false, true, false, false)
    }

    pub fn press_left(&mut self) -> TickOutcome {
        self.press(false, false, true, false)
    }

    pub fn press_right(&mut self) -> TickOutcome {
        self.press(false, false, false, true)
    }

    /// The RTC alarm line fires.
    pub fn fire_alarm(&mut self) -> TickOutcome {
        self.tick_signals(false, true)
    }

    /// The caller-side half of entering sleep: persist and blank.
    pub fn sleep_now(&mut self) {
        self.service
            .prepare_sleep(&mut self.storage, &mut self.hw, &mut self.sink);
    }
}
