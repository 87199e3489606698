//! Front-panel scenarios: ring navigation, editing, and settings
//! persistence across a simulated reboot.

use droplet::app::events::AppEvent;
use droplet::app::ports::ScreenId;
use droplet::config::{WateringConfig, WateringInterval, DURATION_MAX_SECS};
use droplet::persist::{ADDR_DURATION_MINUTES, ADDR_INTERVAL_HOURS};

use crate::mock_hw::{Bench, MapStorage, MockClock};

#[test]
fn ring_navigation_renders_each_screen() {
    let mut bench = Bench::boot(10);
    bench.run_ms(150);
    bench.hw.battery_mv = 4_123;

    bench.press_right();
    assert_eq!(
        bench.hw.last_frame().map(|f| f.screen),
        Some(ScreenId::Duration)
    );
    bench.press_right();
    assert_eq!(
        bench.hw.last_frame().map(|f| f.screen),
        Some(ScreenId::Interval)
    );
    bench.press_right();

    // The battery screen renders the live rail voltage.
    let frame = *bench.hw.last_frame().expect("battery frame rendered");
    assert_eq!(frame.screen, ScreenId::Battery);
    assert_eq!(frame.battery_mv, 4_123);

    bench.press_right();
    assert_eq!(bench.hw.last_frame().map(|f| f.screen), Some(ScreenId::Test));
    bench.press_left();
    assert_eq!(
        bench.hw.last_frame().map(|f| f.screen),
        Some(ScreenId::Battery),
        "left wraps backwards"
    );

    assert_eq!(
        bench
            .sink
            .count(|e| matches!(e, AppEvent::ScreenChanged { .. })),
        5
    );
}

#[test]
fn edits_flow_into_config_and_frames() {
    let mut bench = Bench::boot(10);
    bench.run_ms(150);

    // Up on the Test screen adds a minute; the redraw shows it.
    bench.press_up();
    assert_eq!(bench.service.watering_config().duration_secs, 60);
    assert_eq!(bench.hw.last_frame().map(|f| f.duration_secs), Some(60));

    // The Duration screen edits the same scalar.
    bench.press_right();
    bench.press_down();
    assert_eq!(bench.service.watering_config().duration_secs, 0);

    // Down at zero saturates without raising an edit event.
    let edits = bench
        .sink
        .count(|e| matches!(e, AppEvent::ConfigEdited { .. }));
    bench.press_down();
    assert_eq!(bench.service.watering_config().duration_secs, 0);
    assert_eq!(
        bench
            .sink
            .count(|e| matches!(e, AppEvent::ConfigEdited { .. })),
        edits
    );

    // Interval cycles through its fixed set on the Interval screen only.
    bench.press_right();
    bench.press_up();
    assert_eq!(
        bench.service.watering_config().interval,
        WateringInterval::Every6h
    );
    bench.press_up();
    assert_eq!(
        bench.service.watering_config().interval,
        WateringInterval::Every12h
    );
    bench.press_up();
    assert_eq!(
        bench.service.watering_config().interval,
        WateringInterval::Every4h,
        "cycle wraps back around"
    );
}

#[test]
fn duration_stops_at_the_ui_maximum() {
    let mut bench = Bench::boot(10);
    bench.run_ms(150);

    for _ in 0..8 {
        bench.press_up();
    }
    assert_eq!(
        bench.service.watering_config().duration_secs,
        DURATION_MAX_SECS
    );
}

#[test]
fn edits_persist_across_a_reboot() {
    let mut bench = Bench::boot(8);
    bench.run_ms(150);

    bench.press_up(); // 1 minute
    bench.press_up(); // 2 minutes
    bench.press_right();
    bench.press_right(); // -> Interval
    bench.press_up(); // 4 h -> 6 h

    // Nothing is written at edit time; the save happens on the way into
    // sleep so flash wear tracks sleep cycles, not button presses.
    assert_eq!(bench.storage.writes, 0);

    bench.run_until_sleep(5_000);
    bench.sleep_now();

    assert!(bench.sink.contains(&AppEvent::ConfigSaved));
    assert_eq!(bench.storage.cells.get(&ADDR_INTERVAL_HOURS), Some(&6));
    assert_eq!(bench.storage.cells.get(&ADDR_DURATION_MINUTES), Some(&2));

    // Power cycle: a fresh service over the same cells.
    let carried = MapStorage {
        cells: bench.storage.cells.clone(),
        writes: 0,
    };
    let mut rebooted = Bench::boot_with(MockClock::healthy_at(8), carried);
    rebooted.run_ms(150);

    assert!(rebooted.sink.contains(&AppEvent::ConfigLoaded {
        interval_hours: 6,
        duration_secs: 120,
    }));
    assert_eq!(
        rebooted.service.watering_config(),
        WateringConfig {
            interval: WateringInterval::Every6h,
            duration_secs: 120,
        }
    );
    // The restored interval drives scheduling straight away.
    assert_eq!(rebooted.service.armed_hour(), Some(14));
}

#[test]
fn unchanged_settings_cost_no_writes_on_later_sleeps() {
    let mut bench = Bench::boot(8);
    bench.run_ms(150);
    bench.press_up();

    bench.run_until_sleep(5_000);
    bench.sleep_now();
    let writes_after_first = bench.storage.writes;
    assert!(writes_after_first > 0);

    // Wake with a press, edit nothing, idle back out.
    bench.press_right();
    bench.run_until_sleep(5_000);
    bench.sleep_now();

    assert_eq!(
        bench.storage.writes, writes_after_first,
        "identical settings must not rewrite their cells"
    );
    assert_eq!(
        bench.sink.count(|e| matches!(e, AppEvent::ConfigSaved)),
        1,
        "the unchanged save is silent"
    );
}
