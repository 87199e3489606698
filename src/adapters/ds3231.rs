//! DS3231 real-time clock adapter.
//!
//! Implements [`ClockPort`] over the shared I²C bus. The DS3231 keeps
//! time on its own battery backup and drives the `RTC_INT` line low
//! whenever alarm 1 matches, which is what wakes the ESP32 from light
//! sleep for a scheduled watering pass.
//!
//! ## Register map (subset used here)
//!
//! | Addr | Register        | Notes                                  |
//! |------|-----------------|----------------------------------------|
//! | 0x00 | Seconds (BCD)   | time-of-day block runs 0x00..=0x06     |
//! | 0x03 | Day of week     | 1–7, free-running counter              |
//! | 0x07 | Alarm 1 seconds | A1M1 in bit 7                          |
//! | 0x08 | Alarm 1 minutes | A1M2 in bit 7                          |
//! | 0x09 | Alarm 1 hours   | A1M3 in bit 7                          |
//! | 0x0A | Alarm 1 day     | A1M4 in bit 7, set for daily match    |
//! | 0x0E | Control         | INTCN + A1IE route alarm 1 to INT/SQW  |
//! | 0x0F | Status          | OSF in bit 7, A1F in bit 0             |
//!
//! The status register is read-modify-write: OSF and A1F clear when a
//! zero is written back, so the unrelated bits are always preserved.

use crate::app::ports::{AlarmMode, ClockError, ClockPort, RtcTime};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;
#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
const REG_SECONDS: u8 = 0x00;
#[cfg(target_os = "espidf")]
const REG_ALARM1_SECONDS: u8 = 0x07;
#[cfg(target_os = "espidf")]
const REG_CONTROL: u8 = 0x0E;
#[cfg(target_os = "espidf")]
const REG_STATUS: u8 = 0x0F;

/// Control register: interrupt output (not square wave) + alarm 1 enable.
#[cfg(target_os = "espidf")]
const CTRL_INTCN: u8 = 0b0000_0100;
#[cfg(target_os = "espidf")]
const CTRL_A1IE: u8 = 0b0000_0001;

/// Status register: oscillator-stop flag and alarm 1 flag.
#[cfg(target_os = "espidf")]
const STAT_OSF: u8 = 0b1000_0000;
#[cfg(target_os = "espidf")]
const STAT_A1F: u8 = 0b0000_0001;

/// Alarm 1 mask bit; set in the day register so the alarm matches on
/// hh:mm:ss every day, ignoring the day counter.
#[cfg(target_os = "espidf")]
const A1M4: u8 = 0b1000_0000;

pub struct Ds3231 {
    #[cfg(target_os = "espidf")]
    addr: u8,
    #[cfg(not(target_os = "espidf"))]
    sim: SimRtc,
}

/// Host-side stand-in so the firmware binary runs (and logs sensibly)
/// without a bus. Time is frozen at the default; flags are settable
/// from tests.
#[cfg(not(target_os = "espidf"))]
struct SimRtc {
    time: RtcTime,
    osf: bool,
    a1f: bool,
    armed: Option<(u8, u8, u8)>,
}

impl Ds3231 {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            addr: pins::DS3231_I2C_ADDR,
            #[cfg(not(target_os = "espidf"))]
            sim: SimRtc {
                time: RtcTime {
                    hour: 0,
                    minute: 0,
                    second: 0,
                    weekday: 1,
                },
                osf: false,
                a1f: false,
                armed: None,
            },
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_reg(&mut self, reg: u8) -> Result<u8, ClockError> {
        let mut buf = [0u8; 1];
        hw_init::i2c_write_read(self.addr, &[reg], &mut buf).map_err(|_| ClockError::Bus)?;
        Ok(buf[0])
    }

    #[cfg(target_os = "espidf")]
    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), ClockError> {
        hw_init::i2c_write(self.addr, &[reg, value]).map_err(|_| ClockError::Bus)
    }

    // ── Simulation controls (host builds only) ────────────────

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_time(&mut self, time: RtcTime) {
        self.sim.time = time;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_oscillator_fault(&mut self, faulted: bool) {
        self.sim.osf = faulted;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_raise_alarm(&mut self) {
        self.sim.a1f = true;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_alarm_flag(&self) -> bool {
        self.sim.a1f
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_armed_alarm(&self) -> Option<(u8, u8, u8)> {
        self.sim.armed
    }
}

impl Default for Ds3231 {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for Ds3231 {
    #[cfg(target_os = "espidf")]
    fn now(&mut self) -> Result<RtcTime, ClockError> {
        let mut regs = [0u8; 4];
        hw_init::i2c_write_read(self.addr, &[REG_SECONDS], &mut regs)
            .map_err(|_| ClockError::Bus)?;

        // Mask the CH/mode bits before BCD decode: bit 7 of seconds and
        // bit 6 of hours are not part of the value in 24-hour mode.
        let second = bcd_decode(regs[0] & 0x7F);
        let minute = bcd_decode(regs[1] & 0x7F);
        let hour = bcd_decode(regs[2] & 0x3F);
        let weekday = regs[3] & 0x07;

        if hour > 23 || minute > 59 || second > 59 || weekday == 0 {
            return Err(ClockError::InvalidTime);
        }
        Ok(RtcTime {
            hour,
            minute,
            second,
            weekday,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn now(&mut self) -> Result<RtcTime, ClockError> {
        Ok(self.sim.time)
    }

    #[cfg(target_os = "espidf")]
    fn set_alarm(
        &mut self,
        hour: u8,
        minute: u8,
        second: u8,
        mode: AlarmMode,
    ) -> Result<(), ClockError> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(ClockError::InvalidTime);
        }
        let AlarmMode::Daily = mode;

        // Alarm 1 block in one burst: ss, mm, hh exact, day masked out.
        hw_init::i2c_write(
            self.addr,
            &[
                REG_ALARM1_SECONDS,
                bcd_encode(second),
                bcd_encode(minute),
                bcd_encode(hour),
                A1M4,
            ],
        )
        .map_err(|_| ClockError::Bus)?;

        // Drop any stale alarm flag before enabling the interrupt, or the
        // INT line would assert the moment A1IE goes high.
        let status = self.read_reg(REG_STATUS)?;
        self.write_reg(REG_STATUS, status & !STAT_A1F)?;

        let control = self.read_reg(REG_CONTROL)?;
        self.write_reg(REG_CONTROL, control | CTRL_INTCN | CTRL_A1IE)?;

        info!(
            "Ds3231: alarm 1 set for {:02}:{:02}:{:02} daily",
            hour, minute, second
        );
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_alarm(
        &mut self,
        hour: u8,
        minute: u8,
        second: u8,
        mode: AlarmMode,
    ) -> Result<(), ClockError> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(ClockError::InvalidTime);
        }
        let AlarmMode::Daily = mode;
        self.sim.a1f = false;
        self.sim.armed = Some((hour, minute, second));
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn oscillator_is_valid(&mut self) -> Result<bool, ClockError> {
        let status = self.read_reg(REG_STATUS)?;
        Ok(status & STAT_OSF == 0)
    }

    #[cfg(not(target_os = "espidf"))]
    fn oscillator_is_valid(&mut self) -> Result<bool, ClockError> {
        Ok(!self.sim.osf)
    }

    #[cfg(target_os = "espidf")]
    fn clear_oscillator_fault(&mut self) -> Result<(), ClockError> {
        let status = self.read_reg(REG_STATUS)?;
        self.write_reg(REG_STATUS, status & !STAT_OSF)?;
        // Time-of-day is unreliable after an oscillator stop; restart the
        // seconds counter so the chip at least ticks from a known point.
        self.write_reg(REG_SECONDS, 0)?;
        info!("Ds3231: oscillator fault cleared, seconds restarted");
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn clear_oscillator_fault(&mut self) -> Result<(), ClockError> {
        self.sim.osf = false;
        self.sim.time.second = 0;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn clear_alarm_flag(&mut self) -> Result<(), ClockError> {
        let status = self.read_reg(REG_STATUS)?;
        self.write_reg(REG_STATUS, status & !STAT_A1F)
    }

    #[cfg(not(target_os = "espidf"))]
    fn clear_alarm_flag(&mut self) -> Result<(), ClockError> {
        self.sim.a1f = false;
        Ok(())
    }
}

// ── BCD codec ─────────────────────────────────────────────────

#[cfg(any(target_os = "espidf", test))]
fn bcd_decode(byte: u8) -> u8 {
    (byte >> 4) * 10 + (byte & 0x0F)
}

#[cfg(any(target_os = "espidf", test))]
fn bcd_encode(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}
