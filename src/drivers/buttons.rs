//! Directional button bank (Up / Down / Left / Right).
//!
//! ## Hardware
//!
//! Four active-low momentary switches. Up and Down sit on ordinary GPIOs
//! with internal pull-ups; Left and Right live on input-only pads (34/35)
//! and rely on the external pull-ups of the button board. A diode-OR of
//! all four lines drives the shared `BUTTON_INT_GPIO`, so any press fires
//! a single falling-edge interrupt.
//!
//! ## Design
//!
//! The ISR does not decide *which* button was pressed; it only timestamps
//! the activity (see [`button_isr_handler`]). The main loop then samples
//! the four raw levels through [`ButtonBank::read`] on its next tick and
//! hands the snapshot to the menu. Sampling at control-tick rate (50 ms)
//! doubles as the debounce: contact bounce has settled long before the
//! loop looks at the pins.

use crate::app::ports::ButtonStates;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU8, Ordering};

/// Host-side simulated button levels, one bit per button (1 = pressed).
/// Bit 0 = Up, 1 = Down, 2 = Left, 3 = Right.
#[cfg(not(target_os = "espidf"))]
static SIM_PRESSED: AtomicU8 = AtomicU8::new(0);

/// Set the simulated button levels (host builds only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_buttons(states: ButtonStates) {
    let mut bits = 0u8;
    if states.up {
        bits |= 1 << 0;
    }
    if states.down {
        bits |= 1 << 1;
    }
    if states.left {
        bits |= 1 << 2;
    }
    if states.right {
        bits |= 1 << 3;
    }
    SIM_PRESSED.store(bits, Ordering::SeqCst);
}

/// Release all simulated buttons (host builds only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_release_all() {
    SIM_PRESSED.store(0, Ordering::SeqCst);
}

/// Samples the four directional inputs as a single snapshot.
pub struct ButtonBank {
    last: ButtonStates,
}

impl ButtonBank {
    pub fn new() -> Self {
        Self {
            last: ButtonStates::default(),
        }
    }

    /// Sample all four buttons. Active-low: a pressed button reads 0.
    pub fn read(&mut self) -> ButtonStates {
        self.last = Self::read_hw();
        self.last
    }

    /// Most recent snapshot without touching the hardware.
    pub fn last(&self) -> ButtonStates {
        self.last
    }

    #[cfg(target_os = "espidf")]
    fn read_hw() -> ButtonStates {
        ButtonStates {
            up: !hw_init::gpio_read(pins::BTN_UP_GPIO),
            down: !hw_init::gpio_read(pins::BTN_DOWN_GPIO),
            left: !hw_init::gpio_read(pins::BTN_LEFT_GPIO),
            right: !hw_init::gpio_read(pins::BTN_RIGHT_GPIO),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_hw() -> ButtonStates {
        let bits = SIM_PRESSED.load(Ordering::SeqCst);
        ButtonStates {
            up: bits & (1 << 0) != 0,
            down: bits & (1 << 1) != 0,
            left: bits & (1 << 2) != 0,
            right: bits & (1 << 3) != 0,
        }
    }
}

impl Default for ButtonBank {
    fn default() -> Self {
        Self::new()
    }
}

/// ISR handler; register this on the shared button interrupt line
/// (falling edge). Safe to call from interrupt context: it only latches
/// the activity timestamp into a lock-free atomic.
#[allow(unused)]
pub fn button_isr_handler(now_ms: u32) {
    crate::signals::note_input(now_ms);
}
