//! Reservoir safety interlock.
//!
//! The gate runs **every tick before any actuation decision** and turns the
//! raw float-switch level into a single `safe` verdict.  Actuation is only
//! permitted while the verdict is safe; a trip mid-watering is handled by
//! the sequencer, which stops the pump and re-enters this gate.
//!
//! ## Trip lifecycle
//!
//! 1. The float switch reads the tripped level → gate latches `Tripped`,
//!    the fault screen is forced, and the fault LED blinks at 100 ms.
//! 2. The sensor clears → gate enters `Settling`, the prior screen is
//!    restored, and a 30 s continuous-safe window starts.
//! 3. Any trip during `Settling` re-latches `Tripped` and the window starts
//!    over; the gate only opens after the sensor has read safe without
//!    interruption for the whole window.  This is a bounded loop over
//!    ticks, not recursion, so sensor chatter costs nothing but time.
//! 4. Window elapses → gate is `Clear` and the verdict is safe again.
//!
//! All timing is deadline arithmetic on the monotonic millisecond clock;
//! the gate never blocks the control loop.

use log::{error, info};

use crate::config::SystemConfig;

/// Result of one gate poll.  `entered_fault` / `cleared` fire exactly once
/// per transition so the caller can drive screen changes from the edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatePoll {
    /// Actuation is permitted this tick.
    pub safe: bool,
    /// Fault-LED level for this tick (blink pattern while tripped).
    pub indicator_on: bool,
    /// The gate just latched a trip: force the low-water fault screen.
    pub entered_fault: bool,
    /// The sensor just cleared: restore the prior screen (settling begins).
    pub cleared: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    /// Sensor safe, settling window long since elapsed.
    Clear,
    /// Sensor reads the tripped level.  `since_ms` anchors the blink phase.
    Tripped { since_ms: u32 },
    /// Sensor cleared at `since_ms`; safe only after the full window.
    Settling { since_ms: u32 },
}

/// Safety gate.
pub struct SafetyGate {
    settle_ms: u32,
    blink_ms: u32,
    state: GateState,
}

impl SafetyGate {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            settle_ms: config.settle_ms,
            blink_ms: config.interlock_blink_ms,
            state: GateState::Clear,
        }
    }

    /// Evaluate the gate against the current sensor reading.
    ///
    /// `sensor_tripped` is the polarity-resolved reading (true = reservoir
    /// low).  `now_ms` is the monotonic millisecond clock; all comparisons
    /// use wrapping arithmetic so counter rollover cannot wedge the gate.
    pub fn poll(&mut self, now_ms: u32, sensor_tripped: bool) -> GatePoll {
        let mut out = GatePoll::default();

        match self.state {
            GateState::Clear => {
                if sensor_tripped {
                    error!("SAFETY FAULT SET: reservoir low");
                    self.state = GateState::Tripped { since_ms: now_ms };
                    out.entered_fault = true;
                    out.indicator_on = true;
                } else {
                    out.safe = true;
                }
            }

            GateState::Tripped { since_ms } => {
                if sensor_tripped {
                    out.indicator_on = self.blink_phase_on(now_ms, since_ms);
                } else {
                    info!(
                        "SAFETY FAULT CLEARED: reservoir refilled, settling {} ms",
                        self.settle_ms
                    );
                    self.state = GateState::Settling { since_ms: now_ms };
                    out.cleared = true;
                }
            }

            GateState::Settling { since_ms } => {
                if sensor_tripped {
                    // Chatter: the continuous-safe window restarts from zero.
                    error!("SAFETY FAULT SET: reservoir low (during settling)");
                    self.state = GateState::Tripped { since_ms: now_ms };
                    out.entered_fault = true;
                    out.indicator_on = true;
                } else if now_ms.wrapping_sub(since_ms) >= self.settle_ms {
                    info!("Interlock: settling complete, actuation permitted");
                    self.state = GateState::Clear;
                    out.safe = true;
                }
            }
        }

        out
    }

    /// True while the gate denies actuation (tripped or settling).
    pub fn is_blocking(&self) -> bool {
        self.state != GateState::Clear
    }

    fn blink_phase_on(&self, now_ms: u32, since_ms: u32) -> bool {
        (now_ms.wrapping_sub(since_ms) / self.blink_ms) % 2 == 0
    }
}
