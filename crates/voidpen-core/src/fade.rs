//! Attention-fade engine.
//!
//! Each fading element keeps an activity counter: words typed since it was
//! last made visible. Opacity is derived from the counter, 5% per word, so 10
//! words leaves an element at half opacity and 20 words hides it. An idle
//! timer per element brings it back to half opacity when typing stops.
//!
//! ## Elements
//!
//! - **UI group** (title, progress, encouragement): starts fully visible.
//!   Idle delay is 20 s before the threshold and 5 s after it.
//! - **Done button**: only relevant after the threshold. Starts hidden
//!   (counter at the ceiling, `visible == false`) and is revealed by its first
//!   idle timeout, 5 s after the threshold edge or the last word typed.
//! - **Glow**: one-shot pulse on the threshold edge. Jumps to 1, holds for
//!   1.2 s, then drops to 0 for the rest of the session.
//!
//! Hovering the done area forces every counter-driven opacity to 1 without
//! touching the counters.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::timer::{Fired, Scheduler, TimerId, TimerKind};

/// Opacity lost per counted word.
pub const FADE_PER_WORD: f64 = 0.05;

/// Counter value at which an element is fully hidden.
pub const COUNTER_CEILING: u32 = 20;

/// Opacity for an activity counter: `max(0, 1 - 0.05 * counter)`.
pub fn opacity(counter: u32) -> f64 {
    (1.0 - FADE_PER_WORD * f64::from(counter)).max(0.0)
}

/// Delays and reset values used by the fade engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FadeTimings {
    pub pre_threshold_idle_ms: u64,
    pub post_threshold_idle_ms: u64,
    /// Counter value restored on idle timeout (10 → 50% opacity).
    pub idle_reset_counter: u32,
    pub glow_hold_ms: u64,
}

impl Default for FadeTimings {
    fn default() -> Self {
        Self {
            pre_threshold_idle_ms: 20_000,
            post_threshold_idle_ms: 5_000,
            idle_reset_counter: 10,
            glow_hold_ms: 1_200,
        }
    }
}

/// Activity counter plus the single idle timer that may be pending for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FadeState {
    counter: u32,
    idle_timer: Option<TimerId>,
}

impl FadeState {
    pub fn new(counter: u32) -> Self {
        Self {
            counter: counter.min(COUNTER_CEILING),
            idle_timer: None,
        }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn opacity(&self) -> f64 {
        opacity(self.counter)
    }

    pub fn idle_timer(&self) -> Option<TimerId> {
        self.idle_timer
    }

    fn add_words(&mut self, n: u32) {
        self.counter = self.counter.saturating_add(n).min(COUNTER_CEILING);
    }

    /// Cancel the pending idle timer, if any, and schedule a fresh one.
    fn rearm(&mut self, timers: &mut Scheduler, delay_ms: u64, kind: TimerKind) {
        if let Some(old) = self.idle_timer.take() {
            timers.cancel(old);
        }
        self.idle_timer = Some(timers.schedule(delay_ms, kind));
    }

    fn disarm(&mut self, timers: &mut Scheduler) {
        if let Some(old) = self.idle_timer.take() {
            timers.cancel(old);
        }
    }

    /// Claim a fired timer. Only the currently armed id is accepted.
    fn claim(&mut self, id: TimerId) -> bool {
        if self.idle_timer == Some(id) {
            self.idle_timer = None;
            true
        } else {
            false
        }
    }
}

/// What an idle or glow timer changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeOutcome {
    UiReset,
    DoneRevealed,
    GlowFaded,
}

#[derive(Debug, Clone, PartialEq)]
struct Glow {
    opacity: f64,
    hold_timer: Option<TimerId>,
}

/// Fade state for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeEngine {
    timings: FadeTimings,
    ui: FadeState,
    done: FadeState,
    done_visible: bool,
    glow: Glow,
    hovering: bool,
}

impl FadeEngine {
    pub fn new(timings: FadeTimings) -> Self {
        Self {
            timings,
            ui: FadeState::new(0),
            done: FadeState::new(COUNTER_CEILING),
            done_visible: false,
            glow: Glow {
                opacity: 0.0,
                hold_timer: None,
            },
            hovering: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timings(&self) -> FadeTimings {
        self.timings
    }

    pub fn ui(&self) -> &FadeState {
        &self.ui
    }

    pub fn done(&self) -> &FadeState {
        &self.done
    }

    pub fn hovering(&self) -> bool {
        self.hovering
    }

    pub fn ui_opacity(&self) -> f64 {
        if self.hovering {
            1.0
        } else {
            self.ui.opacity()
        }
    }

    pub fn done_button_opacity(&self) -> f64 {
        if self.hovering {
            1.0
        } else {
            self.done.opacity()
        }
    }

    /// Latched once the first post-threshold idle timeout fires.
    pub fn done_button_visible(&self) -> bool {
        self.done_visible
    }

    pub fn glow_opacity(&self) -> f64 {
        self.glow.opacity
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Feed words added by an edit. Non-positive deltas are ignored.
    ///
    /// Returns `true` if the words were counted.
    pub fn record_words_added(
        &mut self,
        n: i64,
        threshold_reached: bool,
        timers: &mut Scheduler,
    ) -> bool {
        let Ok(n) = u32::try_from(n) else {
            return false;
        };
        if n == 0 {
            return false;
        }

        self.ui.add_words(n);
        let delay = if threshold_reached {
            self.timings.post_threshold_idle_ms
        } else {
            self.timings.pre_threshold_idle_ms
        };
        self.ui.rearm(timers, delay, TimerKind::UiIdle);

        if threshold_reached {
            self.done.add_words(n);
            self.done
                .rearm(timers, self.timings.post_threshold_idle_ms, TimerKind::DoneIdle);
        }
        debug!(
            words = n,
            ui_counter = self.ui.counter,
            done_counter = self.done.counter,
            "activity recorded"
        );
        true
    }

    /// Threshold edge: start the glow pulse and arm the done-button reveal.
    pub fn on_threshold_reached(&mut self, timers: &mut Scheduler) {
        self.glow.opacity = 1.0;
        if let Some(old) = self.glow.hold_timer.take() {
            timers.cancel(old);
        }
        self.glow.hold_timer =
            Some(timers.schedule(self.timings.glow_hold_ms, TimerKind::GlowHold));
        self.done
            .rearm(timers, self.timings.post_threshold_idle_ms, TimerKind::DoneIdle);
    }

    /// Apply a fired timer. Timers this engine no longer owns are ignored.
    pub fn on_timer(&mut self, fired: Fired) -> Option<FadeOutcome> {
        match fired.kind {
            TimerKind::UiIdle if self.ui.claim(fired.id) => {
                self.ui.counter = self.timings.idle_reset_counter.min(COUNTER_CEILING);
                Some(FadeOutcome::UiReset)
            }
            TimerKind::DoneIdle if self.done.claim(fired.id) => {
                self.done.counter = self.timings.idle_reset_counter.min(COUNTER_CEILING);
                self.done_visible = true;
                Some(FadeOutcome::DoneRevealed)
            }
            TimerKind::GlowHold if self.glow.hold_timer == Some(fired.id) => {
                self.glow.hold_timer = None;
                self.glow.opacity = 0.0;
                Some(FadeOutcome::GlowFaded)
            }
            _ => None,
        }
    }

    /// Hover override. Counters are untouched.
    pub fn force_visible(&mut self, hovering: bool) {
        self.hovering = hovering;
    }

    /// Drop every timer this engine owns. A glow still holding is put out.
    pub fn cancel_timers(&mut self, timers: &mut Scheduler) {
        self.ui.disarm(timers);
        self.done.disarm(timers);
        if let Some(old) = self.glow.hold_timer.take() {
            timers.cancel(old);
            self.glow.opacity = 0.0;
        }
    }
}
