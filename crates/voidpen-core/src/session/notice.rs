//! Transient flags that clear themselves after a delay.

use crate::timer::{Scheduler, TimerId, TimerKind};

/// A flag with at most one pending auto-clear timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    kind: TimerKind,
    shown: bool,
    timer: Option<TimerId>,
}

impl Notice {
    pub fn new(kind: TimerKind) -> Self {
        Self {
            kind,
            shown: false,
            timer: None,
        }
    }

    pub fn shown(&self) -> bool {
        self.shown
    }

    /// Show the flag and (re)start its auto-clear timer.
    pub fn show(&mut self, timers: &mut Scheduler, clear_after_ms: u64) {
        self.cancel(timers);
        self.shown = true;
        self.timer = Some(timers.schedule(clear_after_ms, self.kind));
    }

    /// Hide immediately. Returns `true` if it was showing.
    pub fn clear(&mut self, timers: &mut Scheduler) -> bool {
        self.cancel(timers);
        std::mem::replace(&mut self.shown, false)
    }

    /// Handle a fired timer; only the current auto-clear timer counts.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        if self.timer == Some(id) {
            self.timer = None;
            self.shown = false;
            true
        } else {
            false
        }
    }

    fn cancel(&mut self, timers: &mut Scheduler) {
        if let Some(old) = self.timer.take() {
            timers.cancel(old);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reshow_restarts_the_clear_timer() {
        let mut timers = Scheduler::new();
        let mut notice = Notice::new(TimerKind::ExitWarning);

        notice.show(&mut timers, 3_000);
        timers.settle(2_000);
        notice.show(&mut timers, 3_000);
        assert_eq!(timers.pending_of(TimerKind::ExitWarning), 1);

        // The first timer would have fired at 3 s.
        while let Some(f) = timers.pop_due(4_999) {
            assert!(!notice.on_timer(f.id));
        }
        assert!(notice.shown());

        let f = timers.pop_due(5_000).unwrap();
        assert!(notice.on_timer(f.id));
        assert!(!notice.shown());
    }

    #[test]
    fn clear_cancels_pending_timer() {
        let mut timers = Scheduler::new();
        let mut notice = Notice::new(TimerKind::FullscreenHint);
        notice.show(&mut timers, 5_000);
        assert!(notice.clear(&mut timers));
        assert!(!notice.clear(&mut timers));
        assert_eq!(timers.pending_count(), 0);
    }
}
