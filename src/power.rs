//! Idle tracking and light-sleep power management.
//!
//! The device spends most of its life asleep: after `idle_timeout_ms`
//! without user input the main loop persists the watering config, blanks
//! the backlight and calls [`SleepController::enter_light_sleep`].  Light
//! sleep (not deep sleep) is deliberate: execution resumes in place on the
//! line after the call, so no state is rebuilt and no boot-time clock
//! validation re-runs.
//!
//! Wake sources are the two interrupt lines: button activity and the RTC
//! alarm (both active-low, level wake).  Edge ISRs can be swallowed while
//! the core sleeps, so the wake path re-derives "what woke us" from the
//! wake cause plus the pin levels and re-posts the corresponding signal.
//!
//! The idle timer itself is pure arithmetic, testable on the host.

use log::{info, warn};

use crate::config::SystemConfig;

// ---------------------------------------------------------------------------
// Idle timer
// ---------------------------------------------------------------------------

/// Verdict of one idle-timer check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleAction {
    Continue,
    EnterSleep,
}

/// Tracks time since the last user input on the wrapping millisecond clock.
///
/// Wraparound is handled conservatively: when `now` reads *below* the last
/// input timestamp the tracker re-bases to `now` instead of computing a
/// huge elapsed value.  Understating idle time can only delay sleep by one
/// timeout; overstating it would sleep in the user's face.
pub struct IdleTracker {
    timeout_ms: u32,
    last_input_ms: u32,
}

impl IdleTracker {
    pub fn new(config: &SystemConfig, now_ms: u32) -> Self {
        Self {
            timeout_ms: config.idle_timeout_ms,
            last_input_ms: now_ms,
        }
    }

    /// Record the latest button-edge timestamp.  Only real input moves the
    /// window forward; alarm wakes deliberately do not, so an alarm-only
    /// wake goes back to sleep one timeout after the cycle completes.
    pub fn note_input(&mut self, at_ms: u32) {
        self.last_input_ms = at_ms;
    }

    /// Check the idle window.  Call once per tick while no higher-priority
    /// work (alarm, pending input) is queued.
    pub fn tick(&mut self, now_ms: u32) -> IdleAction {
        if now_ms < self.last_input_ms {
            self.last_input_ms = now_ms;
            return IdleAction::Continue;
        }
        if now_ms - self.last_input_ms > self.timeout_ms {
            IdleAction::EnterSleep
        } else {
            IdleAction::Continue
        }
    }
}

// ---------------------------------------------------------------------------
// Sleep controller
// ---------------------------------------------------------------------------

/// What ended a light-sleep period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// Button interrupt line went low.
    Button,
    /// RTC alarm line went low (latched until the alarm flag is cleared).
    Alarm,
    /// Anything else (simulation, unexpected wake source).
    Other,
}

/// Wraps ESP-IDF light sleep.  On the host target sleeping is a logged
/// no-op that reports [`WakeReason::Other`].
pub struct SleepController {
    wake_sources_armed: bool,
}

impl SleepController {
    pub fn new() -> Self {
        Self {
            wake_sources_armed: false,
        }
    }

    /// Enter light sleep until a wake line goes low.  Returns what woke us;
    /// the caller re-posts the matching signal because the edge ISR may
    /// have been swallowed while interrupts were gated.
    pub fn enter_light_sleep(&mut self) -> WakeReason {
        info!("Power: entering light sleep");
        self.sleep_hw()
    }

    #[cfg(target_os = "espidf")]
    fn sleep_hw(&mut self) -> WakeReason {
        use esp_idf_svc::sys::{
            esp_light_sleep_start, esp_sleep_enable_gpio_wakeup, esp_sleep_get_wakeup_cause,
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_GPIO, gpio_int_type_t_GPIO_INTR_LOW_LEVEL,
            gpio_wakeup_enable,
        };

        use crate::drivers::hw_init;
        use crate::pins;

        if !self.wake_sources_armed {
            // SAFETY: plain register configuration on pins owned by this
            // firmware; no aliasing with Rust-managed memory.
            let rc = unsafe {
                gpio_wakeup_enable(pins::BUTTON_INT_GPIO, gpio_int_type_t_GPIO_INTR_LOW_LEVEL)
            };
            if rc != 0 {
                warn!("Power: button wake source config failed ({rc})");
            }
            let rc = unsafe {
                gpio_wakeup_enable(pins::RTC_INT_GPIO, gpio_int_type_t_GPIO_INTR_LOW_LEVEL)
            };
            if rc != 0 {
                warn!("Power: alarm wake source config failed ({rc})");
            }
            let rc = unsafe { esp_sleep_enable_gpio_wakeup() };
            if rc != 0 {
                warn!("Power: gpio wakeup enable failed ({rc})");
            }
            self.wake_sources_armed = true;
        }

        let rc = unsafe { esp_light_sleep_start() };
        if rc != 0 {
            warn!("Power: light sleep rejected ({rc})");
            return WakeReason::Other;
        }

        let cause = unsafe { esp_sleep_get_wakeup_cause() };
        if cause != esp_sleep_source_t_ESP_SLEEP_WAKEUP_GPIO {
            return WakeReason::Other;
        }
        // The RTC INT line latches low until the alarm flag is cleared, so
        // reading it after wake is race-free.  The button line is momentary
        // and may already be high again; GPIO wake without the alarm line
        // low is therefore attributed to the button.
        if !hw_init::gpio_read(pins::RTC_INT_GPIO) {
            WakeReason::Alarm
        } else {
            WakeReason::Button
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn sleep_hw(&mut self) -> WakeReason {
        self.wake_sources_armed = true;
        info!("Power: light sleep (simulated, waking immediately)");
        WakeReason::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(now: u32) -> IdleTracker {
        IdleTracker::new(&SystemConfig::default(), now)
    }

    #[test]
    fn sleeps_after_quiet_timeout() {
        let mut idle = tracker(0);
        assert_eq!(idle.tick(1_000), IdleAction::Continue);
        assert_eq!(idle.tick(3_000), IdleAction::Continue, "exactly at timeout");
        assert_eq!(idle.tick(3_050), IdleAction::EnterSleep);
    }

    #[test]
    fn input_restarts_the_window() {
        let mut idle = tracker(0);
        idle.tick(2_900);
        idle.note_input(2_950);
        assert_eq!(idle.tick(3_100), IdleAction::Continue);
        assert_eq!(idle.tick(5_950), IdleAction::Continue);
        assert_eq!(idle.tick(6_000), IdleAction::EnterSleep);
    }

    #[test]
    fn wraparound_rebases_instead_of_sleeping() {
        let mut idle = tracker(u32::MAX - 100);

        // Clock wraps: now < last input.  Must not claim a huge idle span.
        assert_eq!(idle.tick(50), IdleAction::Continue);

        // The window now measures from the rebased timestamp.
        assert_eq!(idle.tick(3_000), IdleAction::Continue);
        assert_eq!(idle.tick(3_101), IdleAction::EnterSleep);
    }

    #[test]
    fn alarm_wake_does_not_touch_the_window() {
        let mut idle = tracker(0);
        // Simulates: slept at 4s, alarm woke us at 10s, watering ran, and
        // the next idle check happens at 12s with no button press since 0.
        assert_eq!(idle.tick(12_000), IdleAction::EnterSleep);
    }
}
