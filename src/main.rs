//! Droplet Firmware: Main Entry Point
//!
//! Hexagonal architecture around a duty-cycled control loop: wake, tick,
//! and go back to light sleep when nobody is pressing buttons.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        Ds3231        NvsStorage   LogEventSink│
//! │  (Sensor+Input+         (ClockPort)   (StoragePort) (EventSink)│
//! │   Actuator+Display)                                            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  FSM · Safety gate · Watering sequencer · Menu         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  AlarmScheduler (RTC alarms) · SleepController (light sleep)   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
pub mod app;
pub mod config;
pub mod fsm;

mod adapters;
mod drivers;
mod interlock;
mod menu;
mod persist;
mod pins;
mod power;
mod scheduler;
mod sensors;
mod signals;
mod watering;

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{info, warn};

use adapters::display::Lcd1602;
use adapters::ds3231::Ds3231;
use adapters::hardware::HardwareAdapter;
use adapters::log_sink::LogEventSink;
use adapters::nvs::NvsStorage;
use adapters::time::Uptime;
use app::service::AppService;
use config::SystemConfig;
use drivers::buttons::ButtonBank;
use drivers::outputs::{FaultLed, PumpSwitch, SolenoidValve};
use drivers::watchdog::Watchdog;
use power::{SleepController, WakeReason};
use sensors::battery::BatteryMonitor;
use sensors::float_switch::FloatSwitch;
use sensors::SensorHub;

/// The loop must feed this often or the device resets.  Generous next to
/// the 50 ms tick; only a wedged loop can miss it.
const WATCHDOG_TIMEOUT_MS: u32 = 10_000;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Droplet v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = drivers::hw_init::init_peripherals() {
        // Peripheral init failure is critical. Halting with every output
        // still at its de-energised reset level beats boot-looping a
        // device that drives a water valve. The sleep keeps the idle
        // task fed so the default task watchdog does not force a reset.
        log::error!("HAL init failed: {}, halting", e);
        loop {
            std::thread::sleep(std::time::Duration::from_secs(1));
        }
    }
    if let Err(e) = drivers::hw_init::init_isr_service() {
        log::error!(
            "ISR service init failed: {}, continuing without interrupts",
            e
        );
    }
    let watchdog = Watchdog::new(WATCHDOG_TIMEOUT_MS);

    // ── 3. Storage, clock, timebase ───────────────────────────
    let mut storage = match NvsStorage::new() {
        Ok(s) => s,
        Err(e) => {
            // Continue without persistence; settings revert on reboot but
            // watering still works. NVS usually self-heals on next boot.
            warn!("NVS init failed ({}), settings will not persist", e);
            NvsStorage::default()
        }
    };
    let mut rtc = Ds3231::new();
    let uptime = Uptime::new();
    signals::seed_input_clock(uptime.now_ms());

    // ── 4. Construct adapters ─────────────────────────────────
    let sensor_hub = SensorHub::new(FloatSwitch::new(), BatteryMonitor::new());

    let mut hw = HardwareAdapter::new(
        sensor_hub,
        ButtonBank::new(),
        SolenoidValve::new(),
        PumpSwitch::new(),
        FaultLed::new(),
        Lcd1602::new(),
    );

    let mut sink = LogEventSink::new();
    let mut sleep = SleepController::new();

    // ── 5. Construct app service ──────────────────────────────
    let config = SystemConfig::default();
    let tick_period = std::time::Duration::from_millis(config.tick_period_ms as u64);

    let mut service = AppService::new(config);
    service.start(uptime.now_ms(), &mut rtc, &storage, &mut sink);

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        watchdog.feed();

        let now_ms = uptime.now_ms();
        let signals = signals::sample();
        let outcome = service.tick(now_ms, signals, &mut hw, &mut rtc, &mut sink);

        if outcome.sleep_requested {
            service.prepare_sleep(&mut storage, &mut hw, &mut sink);

            // The wake edge fires while interrupts are gated, so the ISR
            // may never run; re-post the cause by hand.
            match sleep.enter_light_sleep() {
                WakeReason::Alarm => signals::note_alarm(),
                WakeReason::Button => signals::note_input(uptime.now_ms()),
                WakeReason::Other => {}
            }
            // Skip the pacing delay: consume the wake signal right away.
            continue;
        }

        // Pace the loop. On ESP-IDF, std::thread::sleep is vTaskDelay
        // underneath, so other tasks (and the idle task) get the core.
        std::thread::sleep(tick_period);
    }
}
