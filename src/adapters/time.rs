//! Monotonic uptime source.
//!
//! The whole control core runs on a single millisecond timebase:
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()`, the same
//!   counter the button ISR timestamps with, so loop-side and ISR-side
//!   times compare directly.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` for
//!   host-side testing and simulation.
//!
//! Values are truncated to `u32` and wrap roughly every 49.7 days;
//! consumers compare with wrapping arithmetic throughout.

pub struct Uptime {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Uptime {
    fn default() -> Self {
        Self::new()
    }
}

impl Uptime {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot, truncated to the wrapping `u32` domain.
    #[cfg(target_os = "espidf")]
    pub fn now_ms(&self) -> u32 {
        ((unsafe { esp_idf_svc::sys::esp_timer_get_time() }) / 1_000) as u32
    }

    /// Milliseconds since boot, truncated to the wrapping `u32` domain.
    #[cfg(not(target_os = "espidf"))]
    pub fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}
