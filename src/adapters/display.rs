//! 16×2 character LCD adapter (HD44780 behind a PCF8574 I²C backpack).
//!
//! Implements [`DisplayPort`]. The controller decides *what* to show by
//! handing over a [`ScreenView`]; this adapter owns the text layout and
//! the 4-bit bus protocol.
//!
//! ## PCF8574 wiring (standard backpack)
//!
//! | Bit | Line      |
//! |-----|-----------|
//! | P0  | RS        |
//! | P1  | R/W (held low, write only) |
//! | P2  | EN        |
//! | P3  | Backlight |
//! | P4–P7 | D4–D7   |
//!
//! The backlight is just another expander bit, so it rides along with
//! every data byte and [`set_backlight`](DisplayPort::set_backlight) is
//! a single bus write.
//!
//! Display failures never stop the controller; bus errors are logged
//! and swallowed here.

use crate::app::ports::{DisplayPort, ScreenId, ScreenView};
use core::fmt::Write as _;
use heapless::String;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;
#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use log::debug;

const COLS: usize = 16;

#[cfg(target_os = "espidf")]
const RS: u8 = 0b0000_0001;
#[cfg(target_os = "espidf")]
const EN: u8 = 0b0000_0100;
#[cfg(target_os = "espidf")]
const BACKLIGHT: u8 = 0b0000_1000;

#[cfg(target_os = "espidf")]
const CMD_CLEAR: u8 = 0x01;
#[cfg(target_os = "espidf")]
const CMD_ENTRY_MODE: u8 = 0x06; // increment cursor, no shift
#[cfg(target_os = "espidf")]
const CMD_DISPLAY_ON: u8 = 0x0C; // display on, cursor off
#[cfg(target_os = "espidf")]
const CMD_FUNCTION_SET: u8 = 0x28; // 4-bit, 2 lines, 5x8 font
#[cfg(target_os = "espidf")]
const CMD_SET_DDRAM: u8 = 0x80;
#[cfg(target_os = "espidf")]
const LINE2_ADDR: u8 = 0x40;

pub struct Lcd1602 {
    backlight_on: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_lines: (String<COLS>, String<COLS>),
}

impl Lcd1602 {
    /// Create the adapter and run the HD44780 4-bit init sequence.
    /// A dead backpack is logged, not fatal.
    pub fn new() -> Self {
        #[allow(unused_mut)]
        let mut lcd = Self {
            backlight_on: true,
            #[cfg(not(target_os = "espidf"))]
            sim_lines: (String::new(), String::new()),
        };

        #[cfg(target_os = "espidf")]
        if let Err(rc) = lcd.init() {
            warn!("Display: init failed (rc={}), continuing blind", rc);
        }

        lcd
    }

    // ── 4-bit bus protocol (hardware target) ──────────────────

    /// One raw expander write with the backlight bit folded in.
    #[cfg(target_os = "espidf")]
    fn expander_write(&self, bits: u8) -> Result<(), i32> {
        let bl = if self.backlight_on { BACKLIGHT } else { 0 };
        hw_init::i2c_write(pins::LCD_I2C_ADDR, &[bits | bl])
    }

    /// Clock one nibble into the controller: EN high, then low.
    #[cfg(target_os = "espidf")]
    fn write_nibble(&self, nibble: u8, flags: u8) -> Result<(), i32> {
        let bits = (nibble << 4) | flags;
        self.expander_write(bits | EN)?;
        self.expander_write(bits)
    }

    #[cfg(target_os = "espidf")]
    fn send(&self, byte: u8, flags: u8) -> Result<(), i32> {
        self.write_nibble(byte >> 4, flags)?;
        self.write_nibble(byte & 0x0F, flags)
        // No explicit instruction delay: at 100 kHz each nibble is ~200 µs
        // on the wire, well past the 37 µs the controller needs.
    }

    #[cfg(target_os = "espidf")]
    fn command(&self, byte: u8) -> Result<(), i32> {
        self.send(byte, 0)
    }

    #[cfg(target_os = "espidf")]
    fn init(&mut self) -> Result<(), i32> {
        // SAFETY: esp_rom_delay_us is a busy-wait; only used in this
        // one-shot init path, never in the control loop.
        let delay_us = |us: u32| unsafe { esp_idf_svc::sys::esp_rom_delay_us(us) };

        delay_us(50_000); // power-on settle

        // Three 8-bit function-set knocks, then the switch to 4-bit mode.
        self.write_nibble(0x03, 0)?;
        delay_us(4_500);
        self.write_nibble(0x03, 0)?;
        delay_us(4_500);
        self.write_nibble(0x03, 0)?;
        delay_us(150);
        self.write_nibble(0x02, 0)?;

        self.command(CMD_FUNCTION_SET)?;
        self.command(CMD_DISPLAY_ON)?;
        self.command(CMD_CLEAR)?;
        delay_us(2_000); // clear is the one slow instruction
        self.command(CMD_ENTRY_MODE)?;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn paint(&self, view: &ScreenView) -> Result<(), i32> {
        let (top, bottom) = render(view);

        self.command(CMD_SET_DDRAM)?;
        self.write_line(&top)?;
        self.command(CMD_SET_DDRAM | LINE2_ADDR)?;
        self.write_line(&bottom)
    }

    /// Write one rendered line padded to the full width, so leftovers
    /// from the previous screen never linger.
    #[cfg(target_os = "espidf")]
    fn write_line(&self, text: &String<COLS>) -> Result<(), i32> {
        for ch in text.chars().chain(core::iter::repeat(' ')).take(COLS) {
            let byte = if ch.is_ascii() { ch as u8 } else { b'?' };
            self.send(byte, RS)?;
        }
        Ok(())
    }

    // ── Simulation introspection (host builds only) ───────────

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_lines(&self) -> (&str, &str) {
        (&self.sim_lines.0, &self.sim_lines.1)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_backlight(&self) -> bool {
        self.backlight_on
    }
}

impl Default for Lcd1602 {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayPort for Lcd1602 {
    fn show(&mut self, view: &ScreenView) {
        #[cfg(target_os = "espidf")]
        {
            if let Err(rc) = self.paint(view) {
                warn!("Display: paint failed (rc={})", rc);
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim_lines = render(view);
            debug!(
                "Display: [{:<16}] [{:<16}]",
                self.sim_lines.0, self.sim_lines.1
            );
        }
    }

    fn set_backlight(&mut self, on: bool) {
        if self.backlight_on == on {
            return;
        }
        self.backlight_on = on;

        #[cfg(target_os = "espidf")]
        {
            // Data lines zero; only the backlight bit changes.
            if let Err(rc) = self.expander_write(0) {
                warn!("Display: backlight write failed (rc={})", rc);
            }
        }

        #[cfg(not(target_os = "espidf"))]
        debug!("Display: backlight {}", if on { "on" } else { "off" });
    }
}

// ── Text layout ───────────────────────────────────────────────

/// Render a view into the two 16-column lines.
///
/// Layout follows the original control panel: the Test and Duration
/// screens both show the watering time, Interval shows the cadence, and
/// the clock-fault screen tells the operator which battery to change.
fn render(view: &ScreenView) -> (String<COLS>, String<COLS>) {
    let mut top: String<COLS> = String::new();
    let mut bottom: String<COLS> = String::new();

    match view.screen {
        ScreenId::Test => {
            let _ = top.push_str("Test pump");
            let _ = write!(bottom, "{} minutes", view.duration_secs / 60);
        }
        ScreenId::Duration => {
            let _ = top.push_str("Duration");
            let _ = write!(bottom, "{} minutes", view.duration_secs / 60);
        }
        ScreenId::Interval => {
            let _ = top.push_str("Interval");
            let _ = write!(bottom, "{}", view.interval);
        }
        ScreenId::Battery => {
            let _ = top.push_str("Battery");
            let _ = write!(
                bottom,
                "{}.{:02}V",
                view.battery_mv / 1000,
                (view.battery_mv % 1000) / 10
            );
        }
        ScreenId::FaultClock => {
            let _ = top.push_str("Backup Battery");
            let _ = bottom.push_str("Change Battery");
        }
        ScreenId::FaultLowWater => {
            let _ = top.push_str("Water Low");
            let _ = bottom.push_str("Check Reservoir");
        }
    }

    (top, bottom)
}
