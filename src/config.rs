//! System configuration parameters
//!
//! Two layers: [`WateringConfig`] is the user-editable pair that persists
//! across power loss; [`SystemConfig`] holds the boot-time tunables that
//! never leave flash-resident code.

use core::fmt;

// ---------------------------------------------------------------------------
// Watering interval
// ---------------------------------------------------------------------------

/// Hours between scheduled waterings.  The hardware UI cycles through this
/// fixed set; arbitrary intervals are deliberately not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WateringInterval {
    #[default]
    Every4h,
    Every6h,
    Every12h,
}

impl WateringInterval {
    /// Interval length in hours.
    pub const fn hours(self) -> u8 {
        match self {
            Self::Every4h => 4,
            Self::Every6h => 6,
            Self::Every12h => 12,
        }
    }

    /// Next interval in the UI cycle: 4 → 6 → 12 → 4.
    pub const fn cycled(self) -> Self {
        match self {
            Self::Every4h => Self::Every6h,
            Self::Every6h => Self::Every12h,
            Self::Every12h => Self::Every4h,
        }
    }

    /// Decode a stored hour count.  Returns `None` for anything outside the
    /// supported set (including the 0xFF virgin-storage sentinel).
    pub const fn from_hours(hours: u8) -> Option<Self> {
        match hours {
            4 => Some(Self::Every4h),
            6 => Some(Self::Every6h),
            12 => Some(Self::Every12h),
            _ => None,
        }
    }
}

impl fmt::Display for WateringInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.hours())
    }
}

// ---------------------------------------------------------------------------
// Watering configuration (persisted)
// ---------------------------------------------------------------------------

/// Longest watering the UI can configure (6 minutes).
pub const DURATION_MAX_SECS: u16 = 360;
/// Up/Down edit granularity (one minute).
pub const DURATION_STEP_SECS: u16 = 60;

/// The two scalars the user actually edits.  Loaded from storage at boot,
/// written back right before entering sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WateringConfig {
    /// Hours between scheduled waterings.
    pub interval: WateringInterval,
    /// Pump-on window per watering, seconds.  Always a whole number of
    /// minutes in `0..=DURATION_MAX_SECS`; the UI edits in minute steps.
    pub duration_secs: u16,
}

impl WateringConfig {
    /// Add one minute, saturating at the maximum.
    pub fn increment_duration(&mut self) -> bool {
        if self.duration_secs < DURATION_MAX_SECS {
            self.duration_secs += DURATION_STEP_SECS;
            true
        } else {
            false
        }
    }

    /// Remove one minute, saturating at zero.
    pub fn decrement_duration(&mut self) -> bool {
        if self.duration_secs > 0 {
            self.duration_secs -= DURATION_STEP_SECS;
            true
        } else {
            false
        }
    }

    /// Advance the interval through the UI cycle.
    pub fn cycle_interval(&mut self) {
        self.interval = self.interval.cycled();
    }

    /// Duration in whole minutes, as the display shows it.
    pub const fn duration_minutes(&self) -> u16 {
        self.duration_secs / 60
    }
}

impl Default for WateringConfig {
    fn default() -> Self {
        // Factory defaults for virgin storage: water every 4 hours, zero
        // duration until the user dials one in.
        Self {
            interval: WateringInterval::Every4h,
            duration_secs: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Zero-duration policy
// ---------------------------------------------------------------------------

/// What a scheduled watering does when the configured duration is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroDurationPolicy {
    /// Run the full open → settle → settle → close valve pulse with an empty
    /// pump window.  Flushes the line and exercises the valve.
    #[default]
    DryCycle,
    /// Skip actuation entirely and go straight to rescheduling.
    Skip,
}

// ---------------------------------------------------------------------------
// System configuration (boot-time, not persisted)
// ---------------------------------------------------------------------------

/// Core system configuration
#[derive(Debug, Clone)]
pub struct SystemConfig {
    // --- Safety ---
    /// GPIO level of the float switch that means "reservoir low, do not
    /// pump".  This is wiring-dependent and must be set consciously: a
    /// normally-closed switch to ground reads HIGH when tripped *and* when
    /// a wire breaks, which is the fail-safe arrangement.
    pub float_tripped_level: bool,
    /// Continuous-safe window required after the interlock clears before
    /// actuation may resume (milliseconds).
    pub settle_ms: u32,

    // --- Actuation ---
    /// Hold between solenoid-open and pump-start, and between pump-stop and
    /// solenoid-close (milliseconds).  Guarantees the pump only ever runs
    /// against an open valve.
    pub valve_settle_ms: u32,
    /// What to do when a watering fires with duration zero.
    pub zero_duration_policy: ZeroDurationPolicy,

    // --- Power ---
    /// Idle period without user input before the device sleeps (milliseconds).
    pub idle_timeout_ms: u32,

    // --- Indication ---
    /// Fault-LED half-period while the clock oscillator fault is shown.
    pub clock_fault_blink_ms: u32,
    /// Fault-LED half-period while the safety interlock is tripped.
    pub interlock_blink_ms: u32,

    // --- Timing ---
    /// Control loop tick period (milliseconds).
    pub tick_period_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Safety
            float_tripped_level: true,
            settle_ms: 30_000,

            // Actuation
            valve_settle_ms: 1_000,
            zero_duration_policy: ZeroDurationPolicy::DryCycle,

            // Power
            idle_timeout_ms: 3_000,

            // Indication
            clock_fault_blink_ms: 249,
            interlock_blink_ms: 100,

            // Timing
            tick_period_ms: 50,
        }
    }
}
