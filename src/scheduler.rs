//! Watering alarm scheduler.
//!
//! Programs the RTC's alarm register so the device can power down between
//! waterings and be woken by hardware.  The arithmetic is deliberately
//! trivial, next alarm is `(current hour + interval) mod 24` on the hour,
//! and lives in a pure function so it can be exhaustively tested.
//!
//! ```text
//! ┌───────────┐   now()            ┌────────────────┐
//! │ RTC clock │◀───────────────────│ AlarmScheduler │
//! │ (DS3231)  │   set_alarm(h,0,0) │   arm()        │
//! └─────┬─────┘◀───────────────────└────────────────┘
//!       │ INT (falling edge when hour:00:00 matches)
//!       ▼
//!  signals::note_alarm() ──▶ main loop ──▶ watering cycle ──▶ arm() again
//! ```
//!
//! `arm()` is called exactly twice per lifecycle position: once at boot
//! (first entry to normal operation) and once after each completed watering
//! cycle.  An interval edit between calls takes effect at the next arming;
//! an already-armed alarm is never retroactively moved.

use log::info;

use crate::app::ports::{AlarmMode, ClockError, ClockPort};
use crate::config::WateringInterval;

// ═══════════════════════════════════════════════════════════════
//  Pure schedule arithmetic
// ═══════════════════════════════════════════════════════════════

/// Hour-of-day at which the next watering alarm should fire.
pub fn next_alarm_hour(current_hour: u8, interval: WateringInterval) -> u8 {
    debug_assert!(current_hour < 24, "hour out of range: {current_hour}");
    (current_hour + interval.hours()) % 24
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// Owns the armed-alarm bookkeeping.  The only mutable state is the
/// diagnostic memo of what was last programmed; the authoritative copy
/// lives in the RTC's alarm register.
pub struct AlarmScheduler {
    armed_hour: Option<u8>,
}

impl AlarmScheduler {
    pub fn new() -> Self {
        Self { armed_hour: None }
    }

    /// Compute the next watering hour from the RTC's current time and
    /// program the alarm to fire at `hh:00:00` daily.  Returns the armed
    /// hour for event reporting.
    pub fn arm<C: ClockPort>(
        &mut self,
        clock: &mut C,
        interval: WateringInterval,
    ) -> Result<u8, ClockError> {
        let now = clock.now()?;
        let hour = next_alarm_hour(now.hour, interval);
        clock.set_alarm(hour, 0, 0, AlarmMode::Daily)?;
        self.armed_hour = Some(hour);
        info!(
            "Scheduler: alarm armed for {:02}:00 (now {:02}:{:02}, every {})",
            hour, now.hour, now.minute, interval
        );
        Ok(hour)
    }

    /// Hour the alarm was last armed for, if any.
    pub fn armed_hour(&self) -> Option<u8> {
        self.armed_hour
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::RtcTime;

    /// Minimal clock stub: fixed time, records the last programmed alarm.
    struct StubClock {
        hour: u8,
        minute: u8,
        programmed: Option<(u8, u8, u8, AlarmMode)>,
    }

    impl StubClock {
        fn at(hour: u8, minute: u8) -> Self {
            Self {
                hour,
                minute,
                programmed: None,
            }
        }
    }

    impl ClockPort for StubClock {
        fn now(&mut self) -> Result<RtcTime, ClockError> {
            Ok(RtcTime {
                hour: self.hour,
                minute: self.minute,
                second: 0,
                weekday: 1,
            })
        }

        fn set_alarm(
            &mut self,
            hour: u8,
            minute: u8,
            second: u8,
            mode: AlarmMode,
        ) -> Result<(), ClockError> {
            self.programmed = Some((hour, minute, second, mode));
            Ok(())
        }

        fn oscillator_is_valid(&mut self) -> Result<bool, ClockError> {
            Ok(true)
        }

        fn clear_oscillator_fault(&mut self) -> Result<(), ClockError> {
            Ok(())
        }

        fn clear_alarm_flag(&mut self) -> Result<(), ClockError> {
            Ok(())
        }
    }

    #[test]
    fn next_hour_wraps_past_midnight() {
        assert_eq!(next_alarm_hour(10, WateringInterval::Every4h), 14);
        assert_eq!(next_alarm_hour(22, WateringInterval::Every4h), 2);
        assert_eq!(next_alarm_hour(20, WateringInterval::Every6h), 2);
        assert_eq!(next_alarm_hour(23, WateringInterval::Every12h), 11);
        assert_eq!(next_alarm_hour(0, WateringInterval::Every12h), 12);
    }

    #[test]
    fn arm_programs_top_of_hour_daily() {
        let mut clock = StubClock::at(9, 37);
        let mut sched = AlarmScheduler::new();

        let hour = sched.arm(&mut clock, WateringInterval::Every6h).unwrap();
        assert_eq!(hour, 15);
        assert_eq!(sched.armed_hour(), Some(15));
        assert_eq!(clock.programmed, Some((15, 0, 0, AlarmMode::Daily)));
    }

    #[test]
    fn interval_edit_applies_at_next_arm() {
        let mut clock = StubClock::at(8, 0);
        let mut sched = AlarmScheduler::new();

        sched.arm(&mut clock, WateringInterval::Every4h).unwrap();
        assert_eq!(clock.programmed.unwrap().0, 12);

        // User switches to 12h; the already-armed alarm stays put until the
        // next arm call uses the new interval.
        sched.arm(&mut clock, WateringInterval::Every12h).unwrap();
        assert_eq!(clock.programmed.unwrap().0, 20);
    }
}
