//! ISR → main-loop signalling.
//!
//! Exactly two interrupt sources exist (button activity, RTC alarm) and each
//! communicates through its own minimal-width atomic cell.  There is no
//! queue: a second edge before the loop runs collapses into the same pending
//! flag, which is the correct semantics for "some input changed" and "the
//! alarm fired".
//!
//! ```text
//! ┌────────────────┐  store(Release)   ┌─────────────────────┐
//! │ button ISR     │──────────────────▶│ INPUT_PENDING       │
//! │                │──────────────────▶│ LAST_INPUT_MS       │
//! ├────────────────┤                   ├─────────────────────┤
//! │ RTC alarm ISR  │──────────────────▶│ ALARM_PENDING       │
//! └────────────────┘                   └─────────────────────┘
//!                       swap/load(Acquire) by the main loop only
//! ```
//!
//! The cells are independently owned: the loop reads each one on its own and
//! never assumes two of them are mutually consistent, so an ISR landing
//! between two loads cannot produce a torn observation.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Set by the button ISR; drained by the main loop at the top of every
/// tick.  What the edge means (menu input, wake, fault acknowledge) is
/// decided by the service for whatever state it is in.
static INPUT_PENDING: AtomicBool = AtomicBool::new(false);

/// Timestamp of the most recent button edge (milliseconds since boot,
/// truncated to u32).  Read by the idle timer; only the button ISR and the
/// boot seed ever write it.
static LAST_INPUT_MS: AtomicU32 = AtomicU32::new(0);

/// Set by the RTC alarm ISR; drained by the main loop at the top of every
/// tick.  The DS3231 INT line latches low until the service clears the
/// alarm flag over I²C, so one firing produces exactly one edge here.
static ALARM_PENDING: AtomicBool = AtomicBool::new(false);

/// Button ISR entry point; register on the shared button-interrupt edge.
/// Safe in interrupt context: two independent lock-free stores.
#[allow(unused)]
pub fn note_input(now_ms: u32) {
    LAST_INPUT_MS.store(now_ms, Ordering::Release);
    INPUT_PENDING.store(true, Ordering::Release);
}

/// RTC alarm ISR entry point; register on the RTC INT falling edge.
#[allow(unused)]
pub fn note_alarm() {
    ALARM_PENDING.store(true, Ordering::Release);
}

/// Consume the pending-input flag.  Returns `true` at most once per edge
/// burst.
pub fn take_input() -> bool {
    INPUT_PENDING.swap(false, Ordering::AcqRel)
}

/// Consume the pending-alarm flag.
pub fn take_alarm() -> bool {
    ALARM_PENDING.swap(false, Ordering::AcqRel)
}

/// Most recent button-edge timestamp.
pub fn last_input_ms() -> u32 {
    LAST_INPUT_MS.load(Ordering::Acquire)
}

/// Seed the input clock at boot so the idle timer starts from "now", not
/// from zero.  Does not raise the pending flag.
pub fn seed_input_clock(now_ms: u32) {
    LAST_INPUT_MS.store(now_ms, Ordering::Release);
}

/// What the interrupt cells held at the top of one control tick.
///
/// The main loop builds this with [`sample`]; tests construct it
/// directly, which keeps the service free of the process-global cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalSample {
    pub input_pending: bool,
    pub alarm_pending: bool,
    pub last_input_ms: u32,
}

/// Drain the cells into a [`SignalSample`].  Pending flags are consumed;
/// a second call before any new edge reports nothing pending.
pub fn sample() -> SignalSample {
    SignalSample {
        input_pending: take_input(),
        alarm_pending: take_alarm(),
        last_input_ms: last_input_ms(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: the cells are process-global, so interleaved parallel
    // tests would race each other.
    #[test]
    fn isr_to_loop_handoff() {
        seed_input_clock(500);
        assert_eq!(last_input_ms(), 500);
        assert!(!take_input(), "seeding must not raise the pending flag");
        assert!(!take_alarm());

        note_input(1200);
        assert_eq!(last_input_ms(), 1200);
        assert!(take_input());
        assert!(!take_input(), "flag consumed exactly once");

        // A burst of edges collapses into one pending flag, and the
        // timestamp tracks the latest edge.
        note_input(2000);
        note_input(2050);
        assert_eq!(last_input_ms(), 2050);
        assert!(take_input());
        assert!(!take_input());

        note_alarm();
        assert!(take_alarm());
        assert!(!take_alarm());

        // The two sources are independent cells.
        note_alarm();
        assert!(!take_input());
        assert!(take_alarm());
    }
}
