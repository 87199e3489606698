//! Watering actuation sequencer.
//!
//! Drives the solenoid/pump pair through the fixed cycle
//!
//! ```text
//!   valve open ──1s──▶ pump on ──duration──▶ pump off ──1s──▶ valve close
//! ```
//!
//! The two 1 s holds are the ordering guarantee, not cosmetics: the pump
//! only ever runs against an open, pressurised line, and the valve only
//! closes against a stopped pump.  The structure of the phase machine makes
//! the guarantee unconditional: `pump` can only be asserted in the
//! `Pumping` phase, and `Pumping` is reachable solely from `PreOpen` and
//! exits solely into `PostStop`, both of which hold the valve open.
//!
//! A safety trip mid-cycle stops the pump on the same tick but still runs
//! the depressurise hold and valve close; the cycle then reports
//! `NeedsRestart` so the controller can re-enter the interlock wait and run
//! the whole cycle again with the full configured duration.
//!
//! Each phase is a monotonic-millisecond deadline checked per tick; the
//! sequencer never blocks the control loop.

use log::{info, warn};

use crate::config::{SystemConfig, ZeroDurationPolicy};

/// How the cycle resolved, reported on the tick the valve closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Full duration delivered; arm the next alarm.
    Finished,
    /// Aborted by a safety trip; wait for the gate, then run again.
    NeedsRestart,
}

/// Result of [`WateringSequencer::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAction {
    /// Cycle is underway; tick the sequencer until it resolves.
    Started,
    /// Zero duration with [`ZeroDurationPolicy::Skip`]: nothing to do.
    SkippedZero,
}

/// Commanded output levels plus progress for one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequencerTick {
    pub solenoid_on: bool,
    pub pump_on: bool,
    /// Set on the single tick the cycle resolves (valve closed).
    pub outcome: Option<CycleOutcome>,
    /// Set on the single tick a safety trip stopped the pump early.
    pub aborted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Valve open, pressure settling before the pump may start.  The hold
    /// is anchored at the tick the valve output first asserts (`None`
    /// until then), so the open→pump margin is measured at the wire.
    PreOpen { opened_at_ms: Option<u32> },
    /// Pump running for the configured duration.
    Pumping { deadline_ms: u32 },
    /// Pump stopped, line depressurising before the valve closes.
    PostStop { deadline_ms: u32, then: CycleOutcome },
}

/// The sequencer.  Pure logic: commanded levels come out of [`tick`], the
/// controller applies them through the actuator port.
pub struct WateringSequencer {
    valve_settle_ms: u32,
    zero_duration_policy: ZeroDurationPolicy,
    phase: Phase,
    /// Pump window for the in-flight cycle, captured at `start()`.  A
    /// concurrent config edit never alters a running cycle.
    duration_ms: u32,
}

impl WateringSequencer {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            valve_settle_ms: config.valve_settle_ms,
            zero_duration_policy: config.zero_duration_policy,
            phase: Phase::Idle,
            duration_ms: 0,
        }
    }

    /// Begin a cycle.  Caller must already hold a safe interlock verdict.
    pub fn start(&mut self, duration_secs: u16) -> StartAction {
        debug_assert!(matches!(self.phase, Phase::Idle), "cycle already running");

        if duration_secs == 0 && self.zero_duration_policy == ZeroDurationPolicy::Skip {
            info!("Watering: zero duration, policy skip");
            return StartAction::SkippedZero;
        }

        self.duration_ms = u32::from(duration_secs) * 1_000;
        self.phase = Phase::PreOpen { opened_at_ms: None };
        info!("Watering: valve opening, pump window {} s", duration_secs);
        StartAction::Started
    }

    /// Advance the cycle by one tick.
    ///
    /// `safe` is the interlock verdict for this tick.  A trip stops the
    /// pump immediately but the valve still closes through the normal
    /// depressurise hold.
    pub fn tick(&mut self, now_ms: u32, safe: bool) -> SequencerTick {
        let mut out = SequencerTick::default();

        match self.phase {
            Phase::Idle => {}

            Phase::PreOpen { opened_at_ms } => {
                out.solenoid_on = true;
                let opened_at = match opened_at_ms {
                    Some(t) => t,
                    None => {
                        self.phase = Phase::PreOpen {
                            opened_at_ms: Some(now_ms),
                        };
                        now_ms
                    }
                };
                if !safe {
                    warn!("Watering: interlock trip before pump start");
                    self.phase = Phase::PostStop {
                        deadline_ms: now_ms.wrapping_add(self.valve_settle_ms),
                        then: CycleOutcome::NeedsRestart,
                    };
                    out.aborted = true;
                } else if now_ms.wrapping_sub(opened_at) >= self.valve_settle_ms {
                    self.phase = Phase::Pumping {
                        deadline_ms: now_ms.wrapping_add(self.duration_ms),
                    };
                    out.pump_on = self.duration_ms > 0;
                    if self.duration_ms > 0 {
                        info!("Watering: pump on");
                    }
                }
            }

            Phase::Pumping { deadline_ms } => {
                out.solenoid_on = true;
                if !safe {
                    warn!("Watering: interlock trip, pump stopped early");
                    self.phase = Phase::PostStop {
                        deadline_ms: now_ms.wrapping_add(self.valve_settle_ms),
                        then: CycleOutcome::NeedsRestart,
                    };
                    out.aborted = true;
                } else if deadline_reached(now_ms, deadline_ms) {
                    if self.duration_ms > 0 {
                        info!("Watering: pump off, depressurising");
                    }
                    self.phase = Phase::PostStop {
                        deadline_ms: now_ms.wrapping_add(self.valve_settle_ms),
                        then: CycleOutcome::Finished,
                    };
                } else {
                    out.pump_on = true;
                }
            }

            Phase::PostStop { deadline_ms, then } => {
                if deadline_reached(now_ms, deadline_ms) {
                    info!("Watering: valve closed");
                    self.phase = Phase::Idle;
                    out.outcome = Some(then);
                } else {
                    out.solenoid_on = true;
                }
            }
        }

        out
    }

    /// A cycle is in flight.
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }
}

/// Wrapping "now has reached deadline" check.  Treats up to half the u32
/// range as "in the past", the same convention as the button driver.
fn deadline_reached(now_ms: u32, deadline_ms: u32) -> bool {
    now_ms.wrapping_sub(deadline_ms) < i32::MAX as u32
}
