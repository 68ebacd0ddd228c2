//! Virtual-time timer service.
//!
//! The scheduler does not use internal threads or the wall clock. The caller
//! owns time: it moves the clock forward with [`Scheduler::pop_due`] and
//! [`Scheduler::settle`], and dispatches whatever fires as ordinary events.
//!
//! ## Guarantees
//!
//! - Timers fire in `(due time, id)` order, so two timers due at the same
//!   instant fire in the order they were scheduled.
//! - A cancelled id never fires. Cancellation is a plain removal from the
//!   pending table, so there is no window where a stale callback can run.
//! - Repeating timers keep their id across firings. A repeating timer whose
//!   next due time would overflow the clock is retired instead of re-armed.
//! - [`Scheduler::pop_due_batch`] folds consecutive firings of a repeating
//!   timer into one [`Fired`], stopping before any other timer comes due.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timers = Scheduler::new();
//! let id = timers.schedule(5_000, TimerKind::DoneIdle);
//! let until = timers.now_ms() + 5_000;
//! while let Some(fired) = timers.pop_due(until) {
//!     // dispatch fired.kind
//! }
//! timers.settle(until);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

/// What a timer is for. The session routes fired timers by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// 1 Hz elapsed-time ticker (time mode only).
    Tick,
    /// Main UI fade idle timeout.
    UiIdle,
    /// Done-button fade idle timeout.
    DoneIdle,
    /// End of the threshold glow hold.
    GlowHold,
    /// Auto-clear for the exit warning.
    ExitWarning,
    /// Auto-clear for the fullscreen hint.
    FullscreenHint,
    /// Auto-clear for the "copied" flag.
    Copied,
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub kind: TimerKind,
    /// Virtual time at which it fired. For a batch, the last firing.
    pub at_ms: u64,
    /// Number of firings folded into this one. Always 1 for one-shots.
    pub count: u64,
}

#[derive(Debug, Clone)]
struct Pending {
    due_ms: u64,
    kind: TimerKind,
    period_ms: Option<u64>,
}

/// Single-threaded one-shot and repeating timer table over virtual time.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_id: u64,
    pending: BTreeMap<TimerId, Pending>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of pending timers of the given kind.
    pub fn pending_of(&self, kind: TimerKind) -> usize {
        self.pending.values().filter(|p| p.kind == kind).count()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Schedule a one-shot timer `delay_ms` from now.
    pub fn schedule(&mut self, delay_ms: u64, kind: TimerKind) -> TimerId {
        self.insert(delay_ms, kind, None)
    }

    /// Schedule a repeating timer; the first firing is one period from now.
    ///
    /// A zero period is treated as 1 ms so the timer cannot fire forever
    /// within a single advance.
    pub fn schedule_repeating(&mut self, period_ms: u64, kind: TimerKind) -> TimerId {
        let period = period_ms.max(1);
        self.insert(period, kind, Some(period))
    }

    /// Cancel a timer. Returns `false` if it was not pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let removed = self.pending.remove(&id);
        if let Some(ref p) = removed {
            debug!(?id, kind = ?p.kind, "timer cancelled");
        }
        removed.is_some()
    }

    /// Cancel every pending timer. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        if n > 0 {
            debug!(count = n, "all timers cancelled");
        }
        n
    }

    /// Pop the earliest timer due at or before `until_ms`, moving the clock
    /// to its due time. Repeating timers are re-armed under the same id.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Fired> {
        self.pop_due_batch(until_ms, 1)
    }

    /// Like [`pop_due`](Self::pop_due), but a repeating timer fires up to
    /// `max_repeats` times in one call. The batch ends before the next other
    /// pending timer is due, so ordering against other timers is unchanged.
    pub fn pop_due_batch(&mut self, until_ms: u64, max_repeats: u64) -> Option<Fired> {
        let (&id, due_ms) = self
            .pending
            .iter()
            .filter(|(_, p)| p.due_ms <= until_ms)
            .min_by_key(|(id, p)| (p.due_ms, **id))
            .map(|(id, p)| (id, p.due_ms))?;

        let horizon = self
            .pending
            .iter()
            .filter(|(other, _)| **other != id)
            .map(|(_, p)| p.due_ms)
            .min();

        let p = self.pending.get_mut(&id)?;
        let kind = p.kind;
        let (at_ms, count) = match p.period_ms {
            Some(period) => {
                let last_allowed = match horizon {
                    Some(h) => until_ms.min(h.saturating_sub(1)),
                    None => until_ms,
                };
                let count = if last_allowed < due_ms {
                    1
                } else {
                    ((last_allowed - due_ms) / period + 1).min(max_repeats.max(1))
                };
                let last = due_ms + (count - 1) * period;
                match last.checked_add(period) {
                    Some(next) if next < u64::MAX => p.due_ms = next,
                    _ => {
                        self.pending.remove(&id);
                        debug!(?id, ?kind, "repeating timer retired at end of clock");
                    }
                }
                (last, count)
            }
            None => {
                self.pending.remove(&id);
                (due_ms, 1)
            }
        };

        self.now_ms = self.now_ms.max(at_ms);
        debug!(?id, ?kind, at_ms = self.now_ms, count, "timer fired");
        Some(Fired {
            id,
            kind,
            at_ms: self.now_ms,
            count,
        })
    }

    /// Move the clock to `until_ms` once every due timer has been popped.
    pub fn settle(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn insert(&mut self, delay_ms: u64, kind: TimerKind, period_ms: Option<u64>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due_ms = self.now_ms.saturating_add(delay_ms);
        debug!(?id, ?kind, due_ms, "timer scheduled");
        self.pending.insert(
            id,
            Pending {
                due_ms,
                kind,
                period_ms,
            },
        );
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(timers: &mut Scheduler, until: u64) -> Vec<Fired> {
        let mut out = Vec::new();
        while let Some(f) = timers.pop_due(until) {
            out.push(f);
        }
        timers.settle(until);
        out
    }

    #[test]
    fn one_shot_fires_once_at_due_time() {
        let mut timers = Scheduler::new();
        let id = timers.schedule(5_000, TimerKind::DoneIdle);

        assert!(drain(&mut timers, 4_999).is_empty());
        let fired = drain(&mut timers, 5_000);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].id, id);
        assert_eq!(fired[0].at_ms, 5_000);
        assert!(!timers.is_pending(id));
        assert!(drain(&mut timers, 60_000).is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timers = Scheduler::new();
        let t1 = timers.schedule(1_000, TimerKind::UiIdle);
        assert!(timers.cancel(t1));
        let t2 = timers.schedule(1_000, TimerKind::UiIdle);

        let fired = drain(&mut timers, 10_000);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].id, t2);
        assert!(!timers.cancel(t1));
    }

    #[test]
    fn fires_in_due_then_schedule_order() {
        let mut timers = Scheduler::new();
        let late = timers.schedule(3_000, TimerKind::ExitWarning);
        let a = timers.schedule(1_000, TimerKind::GlowHold);
        let b = timers.schedule(1_000, TimerKind::Copied);

        let ids: Vec<_> = drain(&mut timers, 5_000).iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![a, b, late]);
    }

    #[test]
    fn repeating_timer_rearms_with_same_id() {
        let mut timers = Scheduler::new();
        let id = timers.schedule_repeating(1_000, TimerKind::Tick);

        let fired = drain(&mut timers, 3_500);
        assert_eq!(fired.len(), 3);
        assert!(fired.iter().all(|f| f.id == id));
        assert_eq!(fired[2].at_ms, 3_000);
        assert!(timers.is_pending(id));
        assert_eq!(timers.now_ms(), 3_500);

        // Next firing stays on the 1 s grid.
        let fired = drain(&mut timers, 4_000);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].at_ms, 4_000);
    }

    #[test]
    fn batch_folds_repeats_up_to_next_other_timer() {
        let mut timers = Scheduler::new();
        let tick = timers.schedule_repeating(1_000, TimerKind::Tick);
        let idle = timers.schedule(5_000, TimerKind::DoneIdle);

        let first = timers.pop_due_batch(60_000, u64::MAX).unwrap();
        assert_eq!((first.id, first.count, first.at_ms), (tick, 4, 4_000));

        // Tick at 5 s was scheduled first, so it still goes before the idle timer.
        let second = timers.pop_due_batch(60_000, u64::MAX).unwrap();
        assert_eq!((second.id, second.count, second.at_ms), (tick, 1, 5_000));
        let third = timers.pop_due_batch(60_000, u64::MAX).unwrap();
        assert_eq!((third.id, third.count), (idle, 1));

        let rest = timers.pop_due_batch(60_000, u64::MAX).unwrap();
        assert_eq!((rest.count, rest.at_ms), (55, 60_000));
        assert!(timers.pop_due_batch(60_000, u64::MAX).is_none());
    }

    #[test]
    fn batch_respects_max_repeats() {
        let mut timers = Scheduler::new();
        timers.schedule_repeating(1_000, TimerKind::Tick);
        let fired = timers.pop_due_batch(10_000, 3).unwrap();
        assert_eq!((fired.count, fired.at_ms), (3, 3_000));
        assert_eq!(timers.now_ms(), 3_000);
    }

    #[test]
    fn repeating_timer_is_retired_at_end_of_clock() {
        let mut timers = Scheduler::new();
        timers.settle(u64::MAX - 1_500);
        let id = timers.schedule_repeating(1_000, TimerKind::Tick);

        let fired = drain(&mut timers, u64::MAX);
        assert_eq!(fired.len(), 1);
        assert!(!timers.is_pending(id));
        assert_eq!(timers.now_ms(), u64::MAX);
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut timers = Scheduler::new();
        timers.schedule_repeating(1_000, TimerKind::Tick);
        timers.schedule(20_000, TimerKind::UiIdle);
        assert_eq!(timers.cancel_all(), 2);
        assert_eq!(timers.pending_count(), 0);
        assert!(drain(&mut timers, 100_000).is_empty());
    }

    #[test]
    fn delay_is_relative_to_current_time() {
        let mut timers = Scheduler::new();
        timers.settle(10_000);
        timers.schedule(500, TimerKind::Copied);
        assert!(drain(&mut timers, 10_499).is_empty());
        assert_eq!(drain(&mut timers, 10_500).len(), 1);
    }
}
