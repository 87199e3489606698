//! End-to-end controller scenarios: boot paths, the clock-fault hold, and
//! complete watering passes driven through the mock ports.
//!
//! Timing assertions work on the actuator call record, so the valve and
//! pump margins are checked at the port boundary rather than inferred
//! from internal state.

use droplet::app::events::AppEvent;
use droplet::app::ports::ScreenId;
use droplet::fsm::StateId;

use crate::mock_hw::{ActuatorCall, Bench, MapStorage, MockClock, MockHardware, TICK_MS};

/// Pump edges must sit inside the valve-open window with at least
/// `margin_ms` of open, settled line on both sides.
fn assert_watering_margins(hw: &MockHardware, margin_ms: u32) {
    // In-tick ordering: walking the raw call list, the pump may only be
    // commanded on while the valve level is open.
    let mut valve_level = false;
    for call in &hw.calls {
        match call {
            ActuatorCall::Solenoid { open, .. } => valve_level = *open,
            ActuatorCall::Pump { on: true, .. } => {
                assert!(valve_level, "pump commanded against a closed valve");
            }
            _ => {}
        }
    }

    let valve = hw.solenoid_edges();
    for &(at, on) in &hw.pump_edges() {
        if on {
            let opened = valve
                .iter()
                .rev()
                .find(|&&(t, open)| open && t <= at)
                .map(|&(t, _)| t)
                .expect("pump-on edge without a prior valve-open edge");
            assert!(
                at - opened >= margin_ms,
                "open to pump margin {} ms, need {}",
                at - opened,
                margin_ms
            );
        } else {
            let closed = valve
                .iter()
                .find(|&&(t, open)| !open && t >= at)
                .map(|&(t, _)| t)
                .expect("pump-off edge without a following valve-close edge");
            assert!(
                closed - at >= margin_ms,
                "pump to close margin {} ms, need {}",
                closed - at,
                margin_ms
            );
        }
    }
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_reaches_running_and_arms_the_first_alarm() {
    let mut bench = Bench::boot(9);
    assert_eq!(bench.service.state(), StateId::Boot);

    bench.run_ms(150);

    assert_eq!(bench.service.state(), StateId::Running);
    // Virgin storage: factory interval of 4 h from the current hour.
    assert!(bench.sink.contains(&AppEvent::ConfigDefaulted));
    assert_eq!(bench.service.armed_hour(), Some(13));
    assert_eq!(bench.clock.alarms, vec![(13, 0, 0)]);
    assert!(bench.sink.contains(&AppEvent::AlarmScheduled { hour: 13 }));

    // The water path never moves during bring-up.
    assert!(bench.hw.pump_edges().is_empty());
    assert!(bench.hw.solenoid_edges().is_empty());
}

// ── Clock fault ───────────────────────────────────────────────

#[test]
fn stopped_oscillator_holds_until_acknowledged() {
    let mut bench = Bench::boot_with(MockClock::with_stopped_oscillator(), MapStorage::new());
    bench.run_ms(500);

    assert_eq!(bench.service.state(), StateId::ClockFault);
    assert!(bench.sink.contains(&AppEvent::ClockFaultDetected));
    assert_eq!(
        bench.hw.last_frame().map(|f| f.screen),
        Some(ScreenId::FaultClock)
    );
    // No alarm may be armed off an untrusted clock.
    assert_eq!(bench.service.armed_hour(), None);
    assert!(bench.clock.alarms.is_empty());
    // The fault LED blinks: both levels appear in the record.
    assert!(bench
        .hw
        .calls
        .iter()
        .any(|c| matches!(c, ActuatorCall::FaultLed { on: true })));
    assert!(bench
        .hw
        .calls
        .iter()
        .any(|c| matches!(c, ActuatorCall::FaultLed { on: false })));

    // The acknowledging press clears the fault and must not edit config.
    let duration_before = bench.service.watering_config().duration_secs;
    bench.press_up();

    assert_eq!(bench.service.state(), StateId::Running);
    assert_eq!(bench.clock.fault_clears, 1);
    assert!(bench.sink.contains(&AppEvent::ClockFaultAcknowledged));
    assert!(bench.sink.contains(&AppEvent::ClockFaultCleared));
    assert_eq!(
        bench.service.watering_config().duration_secs,
        duration_before,
        "the ack press is consumed, not routed to the menu"
    );
    // With the clock trusted again the first alarm is armed at once.
    assert_eq!(bench.service.armed_hour(), Some(4));
}

// ── Watering pass ─────────────────────────────────────────────

#[test]
fn alarm_runs_a_full_pass_and_rearms() {
    // Two stored minutes: long enough for real margins, short to run.
    let mut bench = Bench::boot_with(MockClock::healthy_at(9), MapStorage::seeded(6, 2));
    bench.run_ms(150);

    assert!(bench.sink.contains(&AppEvent::ConfigLoaded {
        interval_hours: 6,
        duration_secs: 120,
    }));
    assert_eq!(bench.service.armed_hour(), Some(15));

    bench.fire_alarm();
    assert!(bench.sink.contains(&AppEvent::AlarmFired));
    assert_eq!(
        bench.clock.alarm_flag_clears, 1,
        "the alarm flag must be released so the INT line deasserts"
    );
    assert_eq!(bench.service.state(), StateId::Watering);

    // 1 s open hold + 120 s pump + 1 s close hold.
    bench.run_until(130_000, |b| b.service.state() == StateId::Running);

    assert!(bench.sink.contains(&AppEvent::WateringStarted { duration_secs: 120 }));
    assert!(bench.sink.contains(&AppEvent::WateringFinished));
    assert!(!bench.hw.pump_on());
    assert!(!bench.hw.solenoid_open());

    assert_watering_margins(&bench.hw, 1_000);

    // The pump window is the configured duration, within a tick.
    let edges = bench.hw.pump_edges();
    assert_eq!(edges.len(), 2, "one clean pump window");
    let window = edges[1].0 - edges[0].0;
    assert!(
        (120_000 - TICK_MS..=120_000 + TICK_MS).contains(&window),
        "pump window {window} ms for a 120 s setting"
    );

    // Completion re-arms from the same clock hour.
    assert_eq!(bench.clock.alarms.len(), 2);
    assert_eq!(bench.clock.alarms[1], (15, 0, 0));
}

#[test]
fn zero_duration_runs_a_dry_valve_pulse() {
    // Virgin storage: factory duration is zero and the policy is a dry
    // cycle, so a pass exercises the valve without pumping.
    let mut bench = Bench::boot(23);
    bench.run_ms(150);
    assert_eq!(bench.service.armed_hour(), Some(3), "4 h wraps past midnight");

    bench.fire_alarm();
    bench.run_until(10_000, |b| b.service.state() == StateId::Running);

    assert!(bench.sink.contains(&AppEvent::WateringStarted { duration_secs: 0 }));
    assert!(bench.sink.contains(&AppEvent::WateringFinished));
    assert!(bench.hw.pump_edges().is_empty(), "dry cycle never pumps");

    let valve = bench.hw.solenoid_edges();
    assert_eq!(valve.len(), 2, "one open, one close");
    assert!(
        valve[1].0 - valve[0].0 >= 2_000,
        "both settle holds run even with an empty pump window"
    );
    assert_eq!(bench.clock.alarms.len(), 2, "dry pass still re-arms");
}

// ── Reservoir interlock ───────────────────────────────────────

#[test]
fn tripped_reservoir_defers_the_pass_through_settling() {
    let mut bench = Bench::boot_with(MockClock::healthy_at(7), MapStorage::seeded(4, 1));
    bench.run_ms(150);

    // Reservoir is low when the alarm fires.
    bench.hw.float_switch_level = true;
    bench.fire_alarm();
    assert_eq!(bench.service.state(), StateId::Watering);

    bench.run_ms(1_000);
    assert!(bench.sink.contains(&AppEvent::InterlockTripped));
    assert_eq!(
        bench.hw.last_frame().map(|f| f.screen),
        Some(ScreenId::FaultLowWater)
    );
    assert!(bench.hw.solenoid_edges().is_empty(), "no valve while low");
    assert!(bench.hw.pump_edges().is_empty(), "no pump while low");

    // Refill.  The gate must hold actuation for the full settle window.
    bench.hw.float_switch_level = false;
    bench.run_ms(29_000);
    assert!(bench.sink.contains(&AppEvent::InterlockCleared));
    assert!(
        bench.hw.pump_edges().is_empty(),
        "still settling, the pass must not start yet"
    );
    // The menu screen came back when the sensor cleared.
    assert_eq!(bench.hw.last_frame().map(|f| f.screen), Some(ScreenId::Test));

    // Window elapses, then the held pass finally runs in full.
    bench.run_until(5_000, |b| {
        b.sink.contains(&AppEvent::WateringStarted { duration_secs: 60 })
    });
    bench.run_until(70_000, |b| b.service.state() == StateId::Running);

    assert!(bench.sink.contains(&AppEvent::WateringFinished));
    assert_watering_margins(&bench.hw, 1_000);
    assert_eq!(bench.clock.alarms.len(), 2);
}

#[test]
fn trip_mid_pass_stops_the_pump_then_restarts_in_full() {
    let mut bench = Bench::boot_with(MockClock::healthy_at(12), MapStorage::seeded(4, 2));
    bench.run_ms(150);
    bench.fire_alarm();

    // Let the pump run ~30 s of its 120 s window.
    bench.run_until(5_000, |b| b.hw.pump_on());
    bench.run_ms(30_000);
    assert!(bench.hw.pump_on());

    bench.hw.float_switch_level = true;
    bench.tick();
    assert!(!bench.hw.pump_on(), "trip stops the pump on the next tick");
    assert!(
        bench.hw.solenoid_open(),
        "valve holds open for the depressurise margin"
    );
    assert!(bench.sink.contains(&AppEvent::WateringAborted));
    assert!(bench.sink.contains(&AppEvent::InterlockTripped));

    // The valve closes after the hold even though the fault persists, and
    // the pass stays parked rather than counting as done.
    bench.run_ms(1_500);
    assert!(!bench.hw.solenoid_open());
    assert_eq!(bench.service.state(), StateId::Watering);
    assert!(!bench.sink.contains(&AppEvent::WateringFinished));
    assert_eq!(bench.clock.alarms.len(), 1, "an aborted pass must not re-arm");

    // Refill, settle out, and the pass restarts with the full window.
    bench.hw.float_switch_level = false;
    bench.run_until(40_000, |b| {
        b.sink
            .count(|e| matches!(e, AppEvent::WateringStarted { .. }))
            == 2
    });
    bench.run_until(130_000, |b| b.service.state() == StateId::Running);

    assert!(bench.sink.contains(&AppEvent::WateringFinished));
    assert_watering_margins(&bench.hw, 1_000);

    let edges = bench.hw.pump_edges();
    assert_eq!(edges.len(), 4, "two pump windows: aborted, then complete");
    let rerun = edges[3].0 - edges[2].0;
    assert!(
        (120_000 - TICK_MS..=120_000 + TICK_MS).contains(&rerun),
        "restart delivers the full configured window, got {rerun} ms"
    );
    assert_eq!(bench.clock.alarms.len(), 2, "re-arm only after completion");
}
