//! Four-button menu model.
//!
//! Owns the screen ring and the edit rules; rendering belongs to the
//! display adapter.  The ring covers the four normal screens:
//!
//! ```text
//!   ◀── Test ── Duration ── Interval ── Battery ──▶ (wraps)
//! ```
//!
//! Fault screens are not part of the ring; the controller forces them on
//! the display directly and restores `screen()` afterwards, so a fault
//! never loses the user's place.
//!
//! One quirk carried over from the hardware UI: the first press while the
//! backlight is off only lights the backlight.  It is consumed and neither
//! navigates nor edits.

use crate::app::ports::{ButtonStates, ScreenId};
use crate::config::WateringConfig;

/// What a handled input did, for event reporting and refresh decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuOutcome {
    /// Press was consumed to light the backlight; nothing else happened.
    pub woke_backlight: bool,
    /// The watering config was modified.
    pub edited: bool,
    /// The selected screen changed.
    pub screen_changed: bool,
}

pub struct MenuModel {
    screen: ScreenId,
    backlight_on: bool,
}

impl MenuModel {
    pub fn new() -> Self {
        Self {
            screen: ScreenId::Test,
            backlight_on: true,
        }
    }

    /// Currently selected ring screen.
    pub fn screen(&self) -> ScreenId {
        self.screen
    }

    pub fn backlight_on(&self) -> bool {
        self.backlight_on
    }

    /// The controller blanks the backlight when entering sleep; the next
    /// press then goes through the wake-consume path.
    pub fn blank_backlight(&mut self) {
        self.backlight_on = false;
    }

    /// Apply one debounced button snapshot.  At most one button acts per
    /// event; priority order matches the wiring scan (Up, Down, Left,
    /// Right).
    pub fn handle(&mut self, buttons: ButtonStates, cfg: &mut WateringConfig) -> MenuOutcome {
        let mut out = MenuOutcome::default();

        if !self.backlight_on {
            self.backlight_on = true;
            out.woke_backlight = true;
            return out;
        }

        if buttons.up {
            out.edited = match self.screen {
                ScreenId::Test | ScreenId::Duration => cfg.increment_duration(),
                ScreenId::Interval => {
                    cfg.cycle_interval();
                    true
                }
                _ => false,
            };
        } else if buttons.down {
            out.edited = match self.screen {
                ScreenId::Test | ScreenId::Duration => cfg.decrement_duration(),
                _ => false,
            };
        } else if buttons.left {
            self.screen = prev_in_ring(self.screen);
            out.screen_changed = true;
        } else if buttons.right {
            self.screen = next_in_ring(self.screen);
            out.screen_changed = true;
        }

        out
    }
}

fn next_in_ring(screen: ScreenId) -> ScreenId {
    match screen {
        ScreenId::Test => ScreenId::Duration,
        ScreenId::Duration => ScreenId::Interval,
        ScreenId::Interval => ScreenId::Battery,
        ScreenId::Battery => ScreenId::Test,
        // Fault screens never navigate; the controller owns them.
        other => other,
    }
}

fn prev_in_ring(screen: ScreenId) -> ScreenId {
    match screen {
        ScreenId::Test => ScreenId::Battery,
        ScreenId::Duration => ScreenId::Test,
        ScreenId::Interval => ScreenId::Duration,
        ScreenId::Battery => ScreenId::Interval,
        other => other,
    }
}
