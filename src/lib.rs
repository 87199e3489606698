//! Droplet irrigation controller firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod interlock;
pub mod menu;
pub mod persist;
pub mod power;
pub mod scheduler;
pub mod signals;
pub mod watering;

pub mod pins;

// Hardware-facing modules; the actual peripheral implementations are
// guarded by cfg attributes inside, so the crate compiles on the host.
pub mod adapters;
pub mod drivers;
pub mod sensors;
