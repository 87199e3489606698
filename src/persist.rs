//! Watering-config persistence.
//!
//! The stored form is two addressed byte cells, the same layout the
//! hardware has always used:
//!
//! | address | content            |
//! |---------|--------------------|
//! | `0x00`  | interval, hours    |
//! | `0x01`  | duration, minutes  |
//!
//! A `0xFF` cell is the virgin-storage sentinel (erased flash / EEPROM
//! reads all-ones).  Any byte that does not decode is treated the same way:
//! the caller falls back to [`WateringConfig::default`] and nothing is
//! written back until the first real save, which happens on entry to sleep
//! rather than at edit time.
//!
//! Saves use the read-compare-write idiom so an unchanged value costs a
//! read, not an erase cycle.

use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};
use crate::config::{WateringConfig, WateringInterval, DURATION_MAX_SECS};

/// Cell holding the interval in hours.
pub const ADDR_INTERVAL_HOURS: u8 = 0x00;
/// Cell holding the duration in whole minutes.
pub const ADDR_DURATION_MINUTES: u8 = 0x01;

/// Never-written cell value.
const VIRGIN: u8 = 0xFF;

/// Load the stored config.  `Ok(None)` means virgin or undecodable storage;
/// the caller applies defaults and carries on.
pub fn load<S: StoragePort>(storage: &S) -> Result<Option<WateringConfig>, StorageError> {
    let hours = storage.read_byte(ADDR_INTERVAL_HOURS)?;
    let minutes = storage.read_byte(ADDR_DURATION_MINUTES)?;

    if hours == VIRGIN && minutes == VIRGIN {
        info!("Persist: virgin storage, using defaults");
        return Ok(None);
    }

    let Some(interval) = WateringInterval::from_hours(hours) else {
        warn!("Persist: interval cell 0x{hours:02X} undecodable, using defaults");
        return Ok(None);
    };

    if u16::from(minutes) > DURATION_MAX_SECS / 60 {
        warn!("Persist: duration cell 0x{minutes:02X} undecodable, using defaults");
        return Ok(None);
    }

    let cfg = WateringConfig {
        interval,
        duration_secs: u16::from(minutes) * 60,
    };
    info!(
        "Persist: loaded interval {} duration {} min",
        cfg.interval,
        cfg.duration_minutes()
    );
    Ok(Some(cfg))
}

/// Store the config.  Returns `true` if any cell actually changed.
pub fn save<S: StoragePort>(storage: &mut S, cfg: &WateringConfig) -> Result<bool, StorageError> {
    let mut wrote = update_cell(storage, ADDR_INTERVAL_HOURS, cfg.interval.hours())?;
    wrote |= update_cell(storage, ADDR_DURATION_MINUTES, cfg.duration_minutes() as u8)?;
    if wrote {
        info!(
            "Persist: stored interval {} duration {} min",
            cfg.interval,
            cfg.duration_minutes()
        );
    }
    Ok(wrote)
}

fn update_cell<S: StoragePort>(storage: &mut S, addr: u8, value: u8) -> Result<bool, StorageError> {
    if storage.read_byte(addr)? == value {
        return Ok(false);
    }
    storage.write_byte(addr, value)?;
    Ok(true)
}
