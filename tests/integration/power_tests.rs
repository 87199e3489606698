//! Idle-window and sleep/wake scenarios.
//!
//! The bench stands in for the main loop around light sleep: it honours
//! `sleep_requested` by calling `prepare_sleep`, then re-posts the wake
//! cause as the loop does after `esp_light_sleep_start` returns.

use droplet::app::events::AppEvent;
use droplet::app::ports::ScreenId;
use droplet::fsm::StateId;

use crate::mock_hw::Bench;

#[test]
fn idle_window_requests_sleep_and_persists() {
    let mut bench = Bench::boot(6);
    bench.run_ms(150);

    bench.run_until_sleep(5_000);
    // One idle timeout after entering normal operation, give or take a
    // couple of ticks.
    assert!(
        (3_100..=3_300).contains(&bench.now_ms),
        "slept at {} ms",
        bench.now_ms
    );

    bench.sleep_now();
    assert!(bench.sink.contains(&AppEvent::EnteringSleep));
    // Factory defaults hit virgin cells on the first sleep.
    assert!(bench.sink.contains(&AppEvent::ConfigSaved));
    assert!(!bench.hw.backlight, "backlight blanked for sleep");
}

#[test]
fn a_press_restarts_the_idle_window() {
    let mut bench = Bench::boot(6);
    bench.run_ms(150);
    bench.run_ms(2_000);

    bench.press_right();
    let pressed_at = bench.now_ms;

    bench.run_until_sleep(6_000);
    assert!(
        bench.now_ms - pressed_at >= 3_000,
        "the window must restart from the press"
    );
}

#[test]
fn wake_press_lights_the_display_without_acting() {
    let mut bench = Bench::boot(6);
    bench.run_ms(150);
    bench.run_until_sleep(5_000);
    bench.sleep_now();
    assert!(!bench.hw.backlight);

    // First press after waking only lights the display.
    bench.press_right();
    assert!(bench.sink.contains(&AppEvent::BacklightWoken));
    assert!(bench.hw.backlight);
    assert_eq!(
        bench.hw.last_frame().map(|f| f.screen),
        Some(ScreenId::Test),
        "the wake press must not navigate"
    );
    assert_eq!(
        bench.service.watering_config().duration_secs,
        0,
        "the wake press must not edit"
    );

    // The next press acts normally again.
    bench.press_right();
    assert_eq!(
        bench.hw.last_frame().map(|f| f.screen),
        Some(ScreenId::Duration)
    );
}

#[test]
fn alarm_wake_runs_dark_and_sleeps_again() {
    let mut bench = Bench::boot(5);
    bench.run_ms(150);
    bench.run_until_sleep(5_000);
    bench.sleep_now();

    // The RTC wakes the device with nobody in the room: the pass (a dry
    // valve pulse on factory settings) runs without the backlight.
    bench.fire_alarm();
    assert_eq!(bench.service.state(), StateId::Watering);
    bench.run_until(10_000, |b| b.service.state() == StateId::Running);
    assert!(!bench.hw.backlight, "an alarm-only wake stays dark");
    assert!(bench.sink.contains(&AppEvent::WateringFinished));

    // Exactly one idle window after the pass, the device asks to sleep
    // again without any button involvement.
    let pass_done_at = bench.now_ms;
    bench.run_until_sleep(5_000);
    assert!(
        (3_000..=3_300).contains(&(bench.now_ms - pass_done_at)),
        "slept {} ms after the pass",
        bench.now_ms - pass_done_at
    );

    bench.sleep_now();
    assert_eq!(
        bench.sink.count(|e| matches!(e, AppEvent::EnteringSleep)),
        2
    );
}
