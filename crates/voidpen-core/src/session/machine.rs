//! Session state machine.
//!
//! The session owns every piece of mutable state for one writing session:
//! stage, commitment, content, elapsed time, the threshold latch, the fade
//! engine and the timer table. Nothing outside it mutates those fields.
//! Derived values (word count, progress, opacities) are recomputed on read.
//!
//! ## State Transitions
//!
//! ```text
//! Setup -> Focus -> Complete -> (new_session) -> Setup
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = Session::new(SessionSettings::default());
//! session.set_commitment("Write the introduction")?;
//! session.begin()?;
//! session.set_content("It was a bright cold day")?;
//! // Drive time forward; fired timers come back as events.
//! let events = session.advance(5_000);
//! ```
//!
//! Time is virtual: the caller moves it with [`Session::advance`]. In time
//! mode the 1 Hz ticker is a repeating timer dispatched by `advance`, and its
//! handler is [`Session::tick`]. An adapter that drives ticks from its own
//! platform timer calls `tick` directly and must not also advance past tick
//! boundaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::notice::Notice;
use super::summary::{preview, SessionSummary};
use super::{SessionSettings, Stage, Targets, TrackingMode};
use crate::error::SessionError;
use crate::events::Event;
use crate::fade::{FadeEngine, FadeOutcome};
use crate::progress::{self, Measure, ThresholdState};
use crate::timer::{Fired, Scheduler, TimerId, TimerKind};
use crate::words;

/// What the adapter should do with a platform exit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterruptDecision {
    /// Cancel the platform action; the session is in focus.
    Suppress,
    /// Let it through.
    Allow,
}

/// One writing session, from setup to export.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    settings: SessionSettings,
    stage: Stage,
    commitment: String,
    mode: TrackingMode,
    targets: Targets,
    content: String,
    /// Word count after the last applied edit.
    previous_word_count: usize,
    elapsed_secs: u64,
    threshold: ThresholdState,
    fade: FadeEngine,
    timers: Scheduler,
    ticker: Option<TimerId>,
    exit_warning: Notice,
    fullscreen_hint: Notice,
    copied: Notice,
    began_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

impl Session {
    /// Create a session in the `Setup` stage.
    ///
    /// Targets outside their allowed ranges are clamped.
    pub fn new(settings: SessionSettings) -> Self {
        let settings = SessionSettings {
            targets: settings.targets.clamped(),
            ..settings
        };
        Self {
            id: Uuid::new_v4(),
            settings,
            stage: Stage::Setup,
            commitment: String::new(),
            mode: settings.mode,
            targets: settings.targets,
            content: String::new(),
            previous_word_count: 0,
            elapsed_secs: 0,
            threshold: ThresholdState::new(),
            fade: FadeEngine::new(settings.timings.fade),
            timers: Scheduler::new(),
            ticker: None,
            exit_warning: Notice::new(TimerKind::ExitWarning),
            fullscreen_hint: Notice::new(TimerKind::FullscreenHint),
            copied: Notice::new(TimerKind::Copied),
            began_at: None,
            finished_at: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn commitment(&self) -> &str {
        &self.commitment
    }

    pub fn tracking_mode(&self) -> TrackingMode {
        self.mode
    }

    /// Target for the active mode (words or minutes).
    pub fn target(&self) -> u32 {
        self.targets.for_mode(self.mode)
    }

    pub fn targets(&self) -> Targets {
        self.targets
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn word_count(&self) -> usize {
        words::count(&self.content)
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn elapsed_label(&self) -> String {
        progress::format_elapsed(self.elapsed_secs)
    }

    fn measure(&self) -> Measure {
        match self.mode {
            TrackingMode::Words => Measure::Words {
                count: self.word_count(),
                target: self.targets.words,
            },
            TrackingMode::Time => Measure::Time {
                elapsed_secs: self.elapsed_secs,
                target_minutes: self.targets.minutes,
            },
        }
    }

    /// 0.0 ..= 100.0
    pub fn progress_percent(&self) -> f64 {
        self.measure().percent()
    }

    pub fn progress_label(&self) -> String {
        progress::label(self.measure(), self.threshold_reached())
    }

    pub fn encouragement(&self) -> &'static str {
        progress::encouragement(self.progress_percent(), self.threshold_reached())
    }

    pub fn threshold_reached(&self) -> bool {
        self.threshold.reached()
    }

    pub fn bonus_words(&self) -> u32 {
        self.measure().bonus()
    }

    pub fn bonus_percent(&self) -> f64 {
        self.measure().bonus_percent()
    }

    pub fn fade(&self) -> &FadeEngine {
        &self.fade
    }

    pub fn ui_opacity(&self) -> f64 {
        self.fade.ui_opacity()
    }

    /// Opacity of the title, progress bar and encouragement.
    ///
    /// After the threshold these stay hidden unless the done area is hovered.
    pub fn progress_opacity(&self) -> f64 {
        if self.threshold_reached() {
            if self.fade.hovering() {
                1.0
            } else {
                0.0
            }
        } else {
            self.fade.ui_opacity()
        }
    }

    pub fn title_opacity(&self) -> f64 {
        self.progress_opacity()
    }

    pub fn done_button_opacity(&self) -> f64 {
        self.fade.done_button_opacity()
    }

    pub fn done_button_visible(&self) -> bool {
        self.fade.done_button_visible()
    }

    /// Whether the done control is on screen at all.
    pub fn done_button_shown(&self) -> bool {
        self.threshold_reached() && (self.fade.done_button_visible() || self.fade.hovering())
    }

    pub fn hovering_done(&self) -> bool {
        self.fade.hovering()
    }

    pub fn glow_opacity(&self) -> f64 {
        self.fade.glow_opacity()
    }

    pub fn exit_warning_visible(&self) -> bool {
        self.exit_warning.shown()
    }

    pub fn fullscreen_hint_visible(&self) -> bool {
        self.fullscreen_hint.shown()
    }

    pub fn copied(&self) -> bool {
        self.copied.shown()
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending_count()
    }

    /// Completion export. `None` until the session is complete.
    pub fn summary(&self) -> Option<SessionSummary> {
        (self.stage == Stage::Complete).then(|| self.build_summary())
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            stage: self.stage,
            commitment: self.commitment.clone(),
            mode: self.mode,
            target: self.target(),
            word_count: self.word_count(),
            elapsed_secs: self.elapsed_secs,
            progress_pct: self.progress_percent(),
            progress_label: self.progress_label(),
            encouragement: self.encouragement().to_string(),
            threshold_reached: self.threshold_reached(),
            bonus_words: self.bonus_words(),
            ui_opacity: self.ui_opacity(),
            title_opacity: self.title_opacity(),
            done_button_opacity: self.done_button_opacity(),
            done_button_visible: self.done_button_visible(),
            done_button_shown: self.done_button_shown(),
            glow_opacity: self.glow_opacity(),
            exit_warning_visible: self.exit_warning_visible(),
            fullscreen_hint_visible: self.fullscreen_hint_visible(),
            copied: self.copied(),
            now_ms: self.timers.now_ms(),
            at: Utc::now(),
        }
    }

    // ── Setup commands ───────────────────────────────────────────────

    pub fn set_commitment(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.require(Stage::Setup, "edit the commitment")?;
        self.commitment = text.into();
        Ok(())
    }

    pub fn set_tracking_mode(&mut self, mode: TrackingMode) -> Result<(), SessionError> {
        self.require(Stage::Setup, "change the tracking mode")?;
        self.mode = mode;
        Ok(())
    }

    /// Set the target for the active mode.
    pub fn set_target(&mut self, value: u32) -> Result<(), SessionError> {
        self.require(Stage::Setup, "change the target")?;
        self.targets.set(self.mode, value).inspect_err(|e| {
            warn!(error = %e, "target rejected");
        })
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Enter focus. Requires a non-blank commitment.
    pub fn begin(&mut self) -> Result<Vec<Event>, SessionError> {
        self.require(Stage::Setup, "begin")?;
        if self.commitment.trim().is_empty() {
            warn!("begin rejected: empty commitment");
            return Err(SessionError::EmptyCommitment);
        }

        self.cancel_all_timers();
        self.threshold = ThresholdState::new();
        self.fade = FadeEngine::new(self.settings.timings.fade);
        self.previous_word_count = self.word_count();
        self.elapsed_secs = 0;
        self.stage = Stage::Focus;
        self.began_at = Some(Utc::now());

        if self.mode == TrackingMode::Time {
            self.ticker = Some(
                self.timers
                    .schedule_repeating(self.settings.timings.tick_ms, TimerKind::Tick),
            );
        }

        info!(
            session_id = %self.id,
            mode = ?self.mode,
            target = self.target(),
            "session began"
        );
        let at = Utc::now();
        Ok(vec![
            Event::SessionBegan {
                session_id: self.id,
                commitment: self.commitment.clone(),
                mode: self.mode,
                target: self.target(),
                at,
            },
            Event::PresentationRequested { at },
        ])
    }

    /// Leave focus on the user's explicit request. Never automatic.
    pub fn finish(&mut self) -> Result<Vec<Event>, SessionError> {
        self.require(Stage::Focus, "finish")?;

        self.cancel_all_timers();
        self.exit_warning.clear(&mut self.timers);
        self.fullscreen_hint.clear(&mut self.timers);
        self.fade.force_visible(false);
        self.stage = Stage::Complete;
        self.finished_at = Some(Utc::now());

        let summary = self.build_summary();
        info!(
            session_id = %self.id,
            words = summary.word_count,
            elapsed_secs = summary.elapsed_secs,
            "session finished"
        );
        let at = Utc::now();
        Ok(vec![
            Event::PresentationReleased { at },
            Event::SessionFinished { summary, at },
        ])
    }

    /// Discard the completed session and start a fresh one in `Setup`.
    ///
    /// Only a completed session can be replaced; focus is left through
    /// [`finish`](Self::finish) alone. Timers of the old session are dropped
    /// with its scheduler, while virtual time carries on from where it was.
    pub fn new_session(&mut self) -> Result<Vec<Event>, SessionError> {
        self.require(Stage::Complete, "start a new session")?;
        self.cancel_all_timers();
        let old = self.id;
        let now_ms = self.timers.now_ms();
        *self = Session::new(self.settings);
        self.timers.settle(now_ms);
        info!(previous = %old, session_id = %self.id, "new session");
        Ok(vec![Event::SessionReset { at: Utc::now() }])
    }

    // ── Focus commands ───────────────────────────────────────────────

    /// Replace the content. Recounts words, feeds the threshold latch and the
    /// fade engine with the words added since the previous edit.
    pub fn set_content(&mut self, text: impl Into<String>) -> Result<Vec<Event>, SessionError> {
        self.require(Stage::Focus, "edit content")?;
        self.content = text.into();

        let count = self.word_count();
        let added = words::delta(self.previous_word_count, count);
        self.previous_word_count = count;

        let mut events = Vec::new();
        self.refresh_progress(&mut events);

        let reached = self.threshold.reached();
        if self.fade.record_words_added(added, reached, &mut self.timers)
            && self.fullscreen_hint.clear(&mut self.timers)
        {
            events.push(Event::FullscreenHintCleared);
        }
        Ok(events)
    }

    /// Append to the content, as typing does.
    pub fn append_content(&mut self, text: &str) -> Result<Vec<Event>, SessionError> {
        self.require(Stage::Focus, "edit content")?;
        let next = format!("{}{text}", self.content);
        self.set_content(next)
    }

    /// 1 Hz handler. Only counts in focus with time tracking.
    pub fn tick(&mut self) -> Vec<Event> {
        self.apply_ticks(1)
    }

    /// Hover over the done area.
    pub fn set_hovering_done(&mut self, hovering: bool) {
        self.fade.force_visible(hovering);
    }

    /// Ask for full-screen presentation again (double-click in the void).
    pub fn request_presentation(&mut self) -> Result<Vec<Event>, SessionError> {
        self.require(Stage::Focus, "request presentation")?;
        let mut events = vec![Event::PresentationRequested { at: Utc::now() }];
        if self.fullscreen_hint.clear(&mut self.timers) {
            events.push(Event::FullscreenHintCleared);
        }
        Ok(events)
    }

    // ── Platform notifications ───────────────────────────────────────

    /// Close/quit/escape attempt from the platform.
    pub fn notify_interrupt_attempt(&mut self) -> (InterruptDecision, Vec<Event>) {
        if self.stage != Stage::Focus {
            return (InterruptDecision::Allow, Vec::new());
        }
        self.exit_warning
            .show(&mut self.timers, self.settings.timings.exit_warning_ms);
        debug!("interrupt suppressed");
        (
            InterruptDecision::Suppress,
            vec![Event::InterruptSuppressed { at: Utc::now() }],
        )
    }

    /// Full-screen presentation was lost without a finish.
    pub fn notify_presentation_lost(&mut self) -> Vec<Event> {
        if self.stage != Stage::Focus {
            return Vec::new();
        }
        self.fullscreen_hint
            .show(&mut self.timers, self.settings.timings.fullscreen_hint_ms);
        debug!("presentation lost");
        vec![Event::FullscreenHintShown { at: Utc::now() }]
    }

    pub fn notify_presentation_regained(&mut self) -> Vec<Event> {
        if self.fullscreen_hint.clear(&mut self.timers) {
            vec![Event::FullscreenHintCleared]
        } else {
            Vec::new()
        }
    }

    // ── Complete commands ────────────────────────────────────────────

    /// Request a clipboard write of the full content. Content is not touched.
    pub fn copy_to_clipboard(&mut self) -> Result<Vec<Event>, SessionError> {
        self.require(Stage::Complete, "copy")?;
        self.copied.show(&mut self.timers, self.settings.timings.copied_ms);
        Ok(vec![Event::ClipboardWrite {
            text: self.content.clone(),
            at: Utc::now(),
        }])
    }

    // ── Time ─────────────────────────────────────────────────────────

    /// Move virtual time forward by `ms`, dispatching every timer that comes
    /// due in order.
    ///
    /// Consecutive ticker firings with nothing else due in between are folded
    /// into one [`Event::Tick`] carrying the final elapsed time. A fold never
    /// crosses the threshold second, so the threshold edge and everything it
    /// schedules land at the same virtual time as with single ticks. The
    /// number of events and loop iterations is therefore bounded by the other
    /// timers, not by the length of the wait.
    pub fn advance(&mut self, ms: u64) -> Vec<Event> {
        let until = self.timers.now_ms().saturating_add(ms);
        let mut events = Vec::new();
        loop {
            let max_ticks = self.ticks_to_threshold();
            let Some(fired) = self.timers.pop_due_batch(until, max_ticks) else {
                break;
            };
            self.dispatch(fired, &mut events);
        }
        self.timers.settle(until);
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn require(&self, stage: Stage, action: &'static str) -> Result<(), SessionError> {
        if self.stage == stage {
            Ok(())
        } else {
            warn!(action, stage = ?self.stage, "command rejected in this stage");
            Err(SessionError::WrongStage {
                action,
                stage: self.stage,
            })
        }
    }

    fn apply_ticks(&mut self, count: u64) -> Vec<Event> {
        if self.stage != Stage::Focus || self.mode != TrackingMode::Time {
            return Vec::new();
        }
        self.elapsed_secs = self.elapsed_secs.saturating_add(count);
        let mut events = vec![Event::Tick {
            elapsed_secs: self.elapsed_secs,
        }];
        self.refresh_progress(&mut events);
        events
    }

    /// How many ticks may be folded together before the threshold second.
    fn ticks_to_threshold(&self) -> u64 {
        if self.mode != TrackingMode::Time || self.threshold.reached() {
            return u64::MAX;
        }
        let target_secs = u64::from(self.targets.minutes) * 60;
        target_secs.saturating_sub(self.elapsed_secs).max(1)
    }

    fn refresh_progress(&mut self, events: &mut Vec<Event>) {
        let measure = self.measure();
        let update = self.threshold.update(measure);
        if update.threshold_just_reached {
            info!(
                session_id = %self.id,
                bonus = update.bonus,
                "threshold reached"
            );
            self.fade.on_threshold_reached(&mut self.timers);
            events.push(Event::ThresholdReached {
                word_count: self.word_count(),
                elapsed_secs: self.elapsed_secs,
                at: Utc::now(),
            });
        }
    }

    fn dispatch(&mut self, fired: Fired, events: &mut Vec<Event>) {
        match fired.kind {
            TimerKind::Tick => {
                if self.ticker == Some(fired.id) {
                    events.extend(self.apply_ticks(fired.count));
                }
            }
            TimerKind::UiIdle | TimerKind::DoneIdle | TimerKind::GlowHold => {
                match self.fade.on_timer(fired) {
                    Some(FadeOutcome::UiReset) => events.push(Event::UiFadeReset {
                        opacity: self.fade.ui_opacity(),
                    }),
                    Some(FadeOutcome::DoneRevealed) => events.push(Event::DoneButtonRevealed {
                        opacity: self.fade.done_button_opacity(),
                    }),
                    Some(FadeOutcome::GlowFaded) => events.push(Event::GlowFaded),
                    None => {}
                }
            }
            TimerKind::ExitWarning => {
                if self.exit_warning.on_timer(fired.id) {
                    events.push(Event::ExitWarningCleared);
                }
            }
            TimerKind::FullscreenHint => {
                if self.fullscreen_hint.on_timer(fired.id) {
                    events.push(Event::FullscreenHintCleared);
                }
            }
            TimerKind::Copied => {
                if self.copied.on_timer(fired.id) {
                    events.push(Event::CopiedCleared);
                }
            }
        }
    }

    /// Drop the ticker and every fade timer. Notices keep their own timers
    /// until cleared.
    fn cancel_all_timers(&mut self) {
        if let Some(id) = self.ticker.take() {
            self.timers.cancel(id);
        }
        self.fade.cancel_timers(&mut self.timers);
    }

    fn build_summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            commitment: self.commitment.clone(),
            mode: self.mode,
            target: self.target(),
            word_count: self.word_count(),
            elapsed_secs: self.elapsed_secs,
            elapsed: self.elapsed_label(),
            bonus_words: self.bonus_words(),
            threshold_reached: self.threshold_reached(),
            preview: preview(&self.content),
            began_at: self.began_at,
            finished_at: self.finished_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    fn focused(mode: TrackingMode, target: u32) -> Session {
        let mut s = Session::default();
        s.set_tracking_mode(mode).unwrap();
        s.set_target(target).unwrap();
        s.set_commitment("Write the introduction").unwrap();
        s.begin().unwrap();
        s
    }

    #[test]
    fn starts_in_setup_with_defaults() {
        let s = Session::default();
        assert_eq!(s.stage(), Stage::Setup);
        assert_eq!(s.tracking_mode(), TrackingMode::Words);
        assert_eq!(s.target(), 500);
        assert_eq!(s.pending_timers(), 0);
        assert!(s.summary().is_none());
    }

    #[test]
    fn begin_requires_commitment() {
        let mut s = Session::default();
        assert_eq!(s.begin(), Err(SessionError::EmptyCommitment));
        s.set_commitment("   \n").unwrap();
        assert_eq!(s.begin(), Err(SessionError::EmptyCommitment));
        assert_eq!(s.stage(), Stage::Setup);

        s.set_commitment("Chapter 3").unwrap();
        let events = s.begin().unwrap();
        assert_eq!(s.stage(), Stage::Focus);
        assert!(matches!(events[0], Event::SessionBegan { target: 500, .. }));
        assert!(matches!(events[1], Event::PresentationRequested { .. }));
    }

    #[test]
    fn setup_edits_are_rejected_after_begin() {
        let mut s = focused(TrackingMode::Words, 100);
        assert!(matches!(
            s.set_commitment("other"),
            Err(SessionError::WrongStage { .. })
        ));
        assert!(s.set_tracking_mode(TrackingMode::Time).is_err());
        assert!(s.set_target(200).is_err());
        assert_eq!(s.commitment(), "Write the introduction");
        assert_eq!(s.target(), 100);
        assert!(s.begin().is_err());
    }

    #[test]
    fn targets_are_kept_per_mode() {
        let mut s = Session::default();
        s.set_target(800).unwrap();
        s.set_tracking_mode(TrackingMode::Time).unwrap();
        assert_eq!(s.target(), 30);
        s.set_target(45).unwrap();
        s.set_tracking_mode(TrackingMode::Words).unwrap();
        assert_eq!(s.target(), 800);
        assert_eq!(s.targets().minutes, 45);
        assert!(s.set_target(50).is_err());
        assert_eq!(s.target(), 800);
    }

    #[test]
    fn content_only_editable_in_focus() {
        let mut s = Session::default();
        assert!(s.set_content("early").is_err());
        assert_eq!(s.content(), "");
    }

    #[test]
    fn typing_fades_ui_and_progress() {
        let mut s = focused(TrackingMode::Words, 100);
        s.set_content(words(10)).unwrap();
        assert_eq!(s.ui_opacity(), 0.5);
        assert_eq!(s.title_opacity(), 0.5);
        assert_eq!(s.progress_percent(), 10.0);
        assert_eq!(s.progress_label(), "10 / 100 words");

        // Deleting words never un-fades.
        s.set_content(words(4)).unwrap();
        assert_eq!(s.ui_opacity(), 0.5);
        s.set_content(words(6)).unwrap();
        assert!((s.ui_opacity() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn pre_threshold_idle_restores_half_opacity() {
        let mut s = focused(TrackingMode::Words, 100);
        s.set_content(words(20)).unwrap();
        assert_eq!(s.ui_opacity(), 0.0);

        assert!(s.advance(19_999).is_empty());
        let events = s.advance(1);
        assert_eq!(events, vec![Event::UiFadeReset { opacity: 0.5 }]);
        assert_eq!(s.ui_opacity(), 0.5);
    }

    #[test]
    fn append_counts_only_new_words() {
        let mut s = focused(TrackingMode::Words, 100);
        s.append_content("one two ").unwrap();
        s.append_content("three").unwrap();
        assert_eq!(s.word_count(), 3);
        assert_eq!(s.fade().ui().counter(), 3);
        // Finishing a word already counted adds nothing.
        s.append_content("four").unwrap();
        assert_eq!(s.word_count(), 3);
        assert_eq!(s.content(), "one two threefour");
    }

    #[test]
    fn threshold_in_words_mode() {
        let mut s = focused(TrackingMode::Words, 100);
        let events = s.set_content(words(100)).unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::ThresholdReached { word_count: 100, .. })));
        assert!(s.threshold_reached());
        assert_eq!(s.glow_opacity(), 1.0);
        assert_eq!(s.progress_opacity(), 0.0);
        assert_eq!(s.encouragement(), "You've done what you came to do.");

        // Not shown until the idle reveal.
        assert!(!s.done_button_shown());
        s.set_hovering_done(true);
        assert!(s.done_button_shown());
        assert_eq!(s.progress_opacity(), 1.0);
        s.set_hovering_done(false);

        let events = s.advance(1_200);
        assert_eq!(events, vec![Event::GlowFaded]);
        let events = s.advance(3_800);
        assert!(events.contains(&Event::DoneButtonRevealed { opacity: 0.5 }));
        assert!(s.done_button_visible());
        assert!(s.done_button_shown());
    }

    #[test]
    fn threshold_never_fires_twice() {
        let mut s = focused(TrackingMode::Words, 100);
        let mut fired = 0;
        for n in [99, 101, 99, 101, 150] {
            fired += s
                .set_content(words(n))
                .unwrap()
                .iter()
                .filter(|e| matches!(e, Event::ThresholdReached { .. }))
                .count();
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn finish_is_never_automatic() {
        let mut s = focused(TrackingMode::Words, 100);
        s.set_content(words(300)).unwrap();
        s.advance(600_000);
        assert_eq!(s.stage(), Stage::Focus);
    }

    #[test]
    fn time_mode_ticks_and_reaches_threshold() {
        let mut s = focused(TrackingMode::Time, 5);
        assert_eq!(s.advance(1_000), vec![Event::Tick { elapsed_secs: 1 }]);
        assert_eq!(s.advance(2_000), vec![Event::Tick { elapsed_secs: 3 }]);
        assert_eq!(s.progress_label(), "0:03 / 5:00");

        let events = s.advance(297_000);
        assert_eq!(s.elapsed_seconds(), 300);
        assert!(matches!(
            events.as_slice(),
            [
                Event::Tick { elapsed_secs: 300 },
                Event::ThresholdReached { elapsed_secs: 300, .. },
            ]
        ));
        assert_eq!(s.bonus_words(), 0);

        s.advance(4_999);
        assert!(!s.done_button_visible());
        s.advance(1);
        assert!(s.done_button_visible());
    }

    #[test]
    fn long_wait_folds_ticks() {
        let mut s = focused(TrackingMode::Time, 5);
        let events = s.advance(14 * 3_600_000);
        assert_eq!(s.elapsed_seconds(), 14 * 3_600);
        let ticks = events
            .iter()
            .filter(|e| matches!(e, Event::Tick { .. }))
            .count();
        assert!(ticks <= 8, "too many tick events: {ticks}");
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, Event::ThresholdReached { .. }))
                .count(),
            1
        );
        assert!(s.done_button_visible());
        assert_eq!(events.last(), Some(&Event::Tick { elapsed_secs: 14 * 3_600 }));
    }

    #[test]
    fn advance_to_end_of_clock_terminates() {
        let mut s = focused(TrackingMode::Time, 5);
        let events = s.advance(u64::MAX);
        assert!(events.len() < 10, "{} events", events.len());
        assert!(s.threshold_reached());
        assert_eq!(s.now_ms(), u64::MAX);
        assert!(s.advance(u64::MAX).is_empty());
    }

    #[test]
    fn ticks_ignored_outside_time_focus() {
        let mut s = Session::default();
        assert!(s.tick().is_empty());
        let mut s = focused(TrackingMode::Words, 100);
        assert!(s.tick().is_empty());
        assert_eq!(s.elapsed_seconds(), 0);
    }

    #[test]
    fn finish_stops_the_clock_and_every_timer() {
        let mut s = focused(TrackingMode::Time, 5);
        s.set_content(words(30)).unwrap();
        s.notify_interrupt_attempt();
        s.notify_presentation_lost();
        s.advance(2_500);
        assert_eq!(s.elapsed_seconds(), 2);

        let events = s.finish().unwrap();
        assert!(matches!(events[0], Event::PresentationReleased { .. }));
        assert!(matches!(events[1], Event::SessionFinished { .. }));
        assert_eq!(s.stage(), Stage::Complete);
        assert_eq!(s.pending_timers(), 0);
        assert!(!s.exit_warning_visible());
        assert!(!s.fullscreen_hint_visible());

        let opacity = s.ui_opacity();
        assert!(s.advance(600_000).is_empty());
        assert_eq!(s.elapsed_seconds(), 2);
        assert_eq!(s.ui_opacity(), opacity);
    }

    #[test]
    fn complete_freezes_content() {
        let mut s = focused(TrackingMode::Words, 100);
        s.set_content("the words").unwrap();
        s.finish().unwrap();
        assert!(s.set_content("changed").is_err());
        assert!(s.finish().is_err());
        assert_eq!(s.content(), "the words");
    }

    #[test]
    fn interrupts_are_suppressed_only_in_focus() {
        let mut s = Session::default();
        assert_eq!(s.notify_interrupt_attempt().0, InterruptDecision::Allow);
        assert!(!s.exit_warning_visible());

        let mut s = focused(TrackingMode::Words, 100);
        let (decision, events) = s.notify_interrupt_attempt();
        assert_eq!(decision, InterruptDecision::Suppress);
        assert!(matches!(events[0], Event::InterruptSuppressed { .. }));
        assert!(s.exit_warning_visible());
        assert_eq!(s.stage(), Stage::Focus);

        assert!(s.advance(2_999).is_empty());
        assert_eq!(s.advance(1), vec![Event::ExitWarningCleared]);
        assert!(!s.exit_warning_visible());
    }

    #[test]
    fn presentation_hint_clears_on_timeout_regain_or_typing() {
        let mut s = focused(TrackingMode::Words, 100);

        s.notify_presentation_lost();
        assert!(s.fullscreen_hint_visible());
        assert_eq!(s.advance(5_000), vec![Event::FullscreenHintCleared]);

        s.notify_presentation_lost();
        assert_eq!(
            s.notify_presentation_regained(),
            vec![Event::FullscreenHintCleared]
        );
        assert!(s.notify_presentation_regained().is_empty());

        s.notify_presentation_lost();
        let events = s.set_content("typing again").unwrap();
        assert!(events.contains(&Event::FullscreenHintCleared));
        assert!(!s.fullscreen_hint_visible());

        s.notify_presentation_lost();
        let events = s.request_presentation().unwrap();
        assert!(matches!(events[0], Event::PresentationRequested { .. }));
        assert!(!s.fullscreen_hint_visible());
        assert_eq!(s.stage(), Stage::Focus);
    }

    #[test]
    fn presentation_loss_ignored_outside_focus() {
        let mut s = Session::default();
        assert!(s.notify_presentation_lost().is_empty());
        assert!(!s.fullscreen_hint_visible());
    }

    #[test]
    fn copy_sets_copied_flag_briefly() {
        let mut s = focused(TrackingMode::Words, 100);
        assert!(s.copy_to_clipboard().is_err());
        s.set_content("keep me").unwrap();
        s.finish().unwrap();

        let events = s.copy_to_clipboard().unwrap();
        assert!(matches!(
            &events[0],
            Event::ClipboardWrite { text, .. } if text == "keep me"
        ));
        assert!(s.copied());
        assert_eq!(s.content(), "keep me");
        assert_eq!(s.advance(2_000), vec![Event::CopiedCleared]);
        assert!(!s.copied());
    }

    #[test]
    fn summary_reports_bonus() {
        let mut s = focused(TrackingMode::Words, 500);
        s.set_content(words(560)).unwrap();
        s.finish().unwrap();
        let summary = s.summary().unwrap();
        assert_eq!(summary.bonus_words, 60);
        assert_eq!(summary.word_count, 560);
        assert!(summary.threshold_reached);
        assert!(summary.began_at.is_some());
        assert!(summary.finished_at.is_some());
        assert_eq!(
            summary.headline(),
            "560 words written — 60 beyond your goal"
        );
    }

    #[test]
    fn new_session_discards_everything() {
        let mut s = focused(TrackingMode::Words, 100);
        let old_id = s.id();
        s.set_content(words(120)).unwrap();
        s.notify_interrupt_attempt();
        s.set_hovering_done(true);
        s.finish().unwrap();
        s.copy_to_clipboard().unwrap();

        let events = s.new_session().unwrap();
        assert!(matches!(events.as_slice(), [Event::SessionReset { .. }]));
        assert_ne!(s.id(), old_id);
        assert_eq!(s.stage(), Stage::Setup);
        assert_eq!(s.commitment(), "");
        assert_eq!(s.content(), "");
        assert_eq!(s.target(), 500);
        assert!(!s.threshold_reached());
        assert!(!s.done_button_visible());
        assert!(!s.hovering_done());
        assert!(!s.exit_warning_visible());
        assert!(!s.copied());
        assert_eq!(s.fade().ui().counter(), 0);
        assert_eq!(s.fade().done().counter(), 20);
        assert_eq!(s.pending_timers(), 0);
        assert!(s.advance(600_000).is_empty());
    }

    #[test]
    fn new_session_rejected_outside_complete() {
        let mut s = focused(TrackingMode::Words, 100);
        s.set_content("a b c").unwrap();
        assert_eq!(
            s.new_session(),
            Err(SessionError::WrongStage {
                action: "start a new session",
                stage: Stage::Focus,
            })
        );
        assert_eq!(s.stage(), Stage::Focus);
        assert_eq!(s.content(), "a b c");

        let mut s = Session::default();
        assert!(s.new_session().is_err());
        assert_eq!(s.stage(), Stage::Setup);
    }

    #[test]
    fn new_session_keeps_virtual_time() {
        let mut s = focused(TrackingMode::Words, 100);
        s.advance(10_000);
        s.finish().unwrap();
        s.new_session().unwrap();
        assert_eq!(s.now_ms(), 10_000);

        s.set_commitment("Again").unwrap();
        s.begin().unwrap();
        s.set_content(words(3)).unwrap();
        assert!(s.advance(19_999).is_empty());
        assert_eq!(s.advance(1), vec![Event::UiFadeReset { opacity: 0.5 }]);
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut s = focused(TrackingMode::Words, 100);
        s.set_content(words(50)).unwrap();
        match s.snapshot() {
            Event::StateSnapshot {
                stage,
                word_count,
                progress_pct,
                encouragement,
                ..
            } => {
                assert_eq!(stage, Stage::Focus);
                assert_eq!(word_count, 50);
                assert_eq!(progress_pct, 50.0);
                assert_eq!(encouragement, "Halfway there. Keep going.");
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
