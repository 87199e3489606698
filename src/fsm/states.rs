//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.  This is the classic embedded C FSM pattern
//! expressed in safe Rust.
//!
//! ```text
//!  BOOT ──▶ CLOCK CHECK ──[oscillator ok]──▶ RUNNING
//!               │                             │    ▲
//!          [OSF latched]                 [alarm]   │ [done / skipped]
//!               ▼                             ▼    │
//!          CLOCK FAULT ──[any press]──▶    WATERING
//!                        (ack + clear)
//! ```
//!
//! RUNNING is where the device spends its life: consuming deferred button
//! presses through the menu, counting down the idle window, and handing
//! off to WATERING when the RTC alarm fires.  WATERING owns the reservoir
//! gate and the valve/pump sequencer until the cycle resolves, then
//! requests a re-arm and returns.  CLOCK FAULT is absorbing until the
//! operator acknowledges it; every press there is the acknowledgement and
//! nothing else.

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use crate::app::events::AppEvent;
use crate::app::ports::ScreenId;
use crate::power::IdleAction;
use crate::watering::{CycleOutcome, StartAction};
use log::{error, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Boot
        StateDescriptor {
            id: StateId::Boot,
            name: "Boot",
            on_enter: Some(boot_enter),
            on_exit: None,
            on_update: boot_update,
        },
        // Index 1: ClockCheck
        StateDescriptor {
            id: StateId::ClockCheck,
            name: "ClockCheck",
            on_enter: None,
            on_exit: None,
            on_update: clock_check_update,
        },
        // Index 2: ClockFault
        StateDescriptor {
            id: StateId::ClockFault,
            name: "ClockFault",
            on_enter: Some(clock_fault_enter),
            on_exit: Some(clock_fault_exit),
            on_update: clock_fault_update,
        },
        // Index 3: Running
        StateDescriptor {
            id: StateId::Running,
            name: "Running",
            on_enter: Some(running_enter),
            on_exit: None,
            on_update: running_update,
        },
        // Index 4: Watering
        StateDescriptor {
            id: StateId::Watering,
            name: "Watering",
            on_enter: Some(watering_enter),
            on_exit: Some(watering_exit),
            on_update: watering_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  BOOT state
// ═══════════════════════════════════════════════════════════════════════════

fn boot_enter(ctx: &mut FsmContext) {
    ctx.commands = super::context::ActuatorCommands::all_off();
    ctx.active_screen = ctx.menu.screen();
    ctx.display_dirty = true;
    info!(
        "BOOT: control core up, tick period {}ms",
        ctx.config.tick_period_ms
    );
}

fn boot_update(_ctx: &mut FsmContext) -> Option<StateId> {
    // Nothing to wait for; hardware bring-up happened before the FSM
    // started.  Move straight on to validating the clock.
    Some(StateId::ClockCheck)
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLOCK CHECK state: is the RTC's notion of time trustworthy?
// ═══════════════════════════════════════════════════════════════════════════

fn clock_check_update(ctx: &mut FsmContext) -> Option<StateId> {
    match ctx.clock_ok {
        Some(true) => {
            info!("CLOCK CHECK: oscillator healthy");
            Some(StateId::Running)
        }
        Some(false) => {
            warn!("CLOCK CHECK: oscillator-stop flag latched, time is untrustworthy");
            ctx.push_event(AppEvent::ClockFaultDetected);
            Some(StateId::ClockFault)
        }
        // The service has not sampled the RTC yet.
        None => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLOCK FAULT state: absorbing until the operator acknowledges
// ═══════════════════════════════════════════════════════════════════════════

fn clock_fault_enter(ctx: &mut FsmContext) {
    ctx.active_screen = ScreenId::FaultClock;
    ctx.display_dirty = true;
    ctx.commands.backlight_on = true;
    ctx.commands.fault_led_on = true;
    error!("CLOCK FAULT: holding for operator acknowledgement, alarms suspended");
}

fn clock_fault_exit(ctx: &mut FsmContext) {
    ctx.commands.fault_led_on = false;
}

fn clock_fault_update(ctx: &mut FsmContext) -> Option<StateId> {
    ctx.commands.fault_led_on =
        (ctx.ms_in_state() / ctx.config.clock_fault_blink_ms) % 2 == 0;

    // Any press is the acknowledgement; the menu never sees it.
    if ctx.pending_input {
        ctx.pending_input = false;
        ctx.request_clear_clock_fault = true;
        ctx.push_event(AppEvent::ClockFaultAcknowledged);
        info!("CLOCK FAULT: acknowledged, requesting oscillator fault clear");
        return Some(StateId::Running);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING state: interactive idle (menu, idle window, alarm dispatch)
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut FsmContext) {
    ctx.commands.solenoid_on = false;
    ctx.commands.pump_on = false;
    ctx.commands.fault_led_on = false;
    ctx.active_screen = ctx.menu.screen();
    ctx.display_dirty = true;

    // Restart the inactivity window so a fault ack or a finished cycle
    // leaves the display readable before sleep is considered.
    ctx.idle.note_input(ctx.now_ms);

    if !ctx.alarm_armed {
        ctx.request_arm = true;
        ctx.alarm_armed = true;
    }
    info!("RUNNING: menu live, every {}", ctx.watering.interval);
}

fn running_update(ctx: &mut FsmContext) -> Option<StateId> {
    // Alarm beats input: a press that raced the alarm stays pending and
    // is consumed after the watering pass.
    if ctx.pending_alarm {
        ctx.pending_alarm = false;
        info!("RUNNING: alarm fired, starting watering pass");
        return Some(StateId::Watering);
    }

    if ctx.pending_input {
        ctx.pending_input = false;
        ctx.idle.note_input(ctx.last_input_ms);

        let buttons = ctx.buttons;
        let outcome = ctx.menu.handle(buttons, &mut ctx.watering);
        if outcome.woke_backlight {
            ctx.commands.backlight_on = true;
            ctx.display_dirty = true;
            ctx.push_event(AppEvent::BacklightWoken);
        }
        if outcome.screen_changed {
            ctx.active_screen = ctx.menu.screen();
            ctx.display_dirty = true;
            ctx.push_event(AppEvent::ScreenChanged {
                screen: ctx.active_screen,
            });
        }
        if outcome.edited {
            ctx.display_dirty = true;
            ctx.push_event(AppEvent::ConfigEdited {
                interval_hours: ctx.watering.interval.hours(),
                duration_secs: ctx.watering.duration_secs,
            });
        }
    }

    if ctx.idle.tick(ctx.now_ms) == IdleAction::EnterSleep {
        ctx.request_sleep = true;
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  WATERING state: gate wait, then open → pump → close
// ═══════════════════════════════════════════════════════════════════════════

fn watering_enter(ctx: &mut FsmContext) {
    info!(
        "WATERING: pass requested, {}s pump time configured",
        ctx.watering.duration_secs
    );
}

fn watering_exit(ctx: &mut FsmContext) {
    // The sequencer releases its outputs when the cycle resolves; zero the
    // commands again so no level survives the state change.
    ctx.commands.solenoid_on = false;
    ctx.commands.pump_on = false;
    ctx.commands.fault_led_on = false;
}

fn watering_update(ctx: &mut FsmContext) -> Option<StateId> {
    let tripped = ctx.reservoir_tripped();
    let gate = ctx.gate.poll(ctx.now_ms, tripped);

    if gate.entered_fault {
        ctx.active_screen = ScreenId::FaultLowWater;
        ctx.commands.backlight_on = true;
        ctx.display_dirty = true;
        ctx.push_event(AppEvent::InterlockTripped);
    }
    if gate.cleared {
        ctx.active_screen = ctx.menu.screen();
        ctx.display_dirty = true;
        ctx.push_event(AppEvent::InterlockCleared);
    }
    ctx.commands.fault_led_on = gate.indicator_on;

    if ctx.sequencer.is_active() {
        let step = ctx.sequencer.tick(ctx.now_ms, gate.safe);
        ctx.commands.solenoid_on = step.solenoid_on;
        ctx.commands.pump_on = step.pump_on;

        if step.aborted {
            ctx.push_event(AppEvent::WateringAborted);
        }
        match step.outcome {
            Some(CycleOutcome::Finished) => {
                ctx.push_event(AppEvent::WateringFinished);
                ctx.request_arm = true;
                return Some(StateId::Running);
            }
            // Aborted mid-cycle: stay here, wait out the gate, then the
            // next start runs the full configured duration again.
            Some(CycleOutcome::NeedsRestart) | None => {}
        }
        return None;
    }

    // No cycle in flight; the gate decides when one may begin.
    if gate.safe {
        match ctx.sequencer.start(ctx.watering.duration_secs) {
            StartAction::Started => {
                ctx.push_event(AppEvent::WateringStarted {
                    duration_secs: ctx.watering.duration_secs,
                });
            }
            StartAction::SkippedZero => {
                ctx.push_event(AppEvent::WateringSkipped);
                ctx.request_arm = true;
                return Some(StateId::Running);
            }
        }
    }

    None
}
