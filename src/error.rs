//! Unified error types for the Droplet firmware.
//!
//! A single `Error` enum that every subsystem error converts into, so code
//! above the port boundary handles one type.  All variants are `Copy` and
//! pass through the controller and FSM without allocation.
//!
//! The taxonomy is deliberately small: the safety interlock, the clock
//! oscillator fault and virgin storage are *states* the controller handles
//! in its loop (see the FSM), not errors that propagate.  Only genuine I/O
//! failures travel through `Result`.

use core::fmt;

use crate::app::ports::{ClockError, StorageError};
use crate::drivers::hw_init::HwInitError;

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The RTC peripheral could not be reached or returned garbage.
    Clock(ClockError),
    /// Persistent storage read/write failed.
    Storage(StorageError),
    /// One-shot peripheral bring-up failed; the device cannot start.
    Init(HwInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clock(e) => write!(f, "clock: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Init(e) => write!(f, "hw init: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ClockError> for Error {
    fn from(e: ClockError) -> Self {
        Self::Clock(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
