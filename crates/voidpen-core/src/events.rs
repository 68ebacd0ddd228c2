use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::{SessionSummary, Stage, TrackingMode};

/// Every state change in a session produces an Event.
/// The presentation adapter applies the side-effect requests
/// (`PresentationRequested`, `ClipboardWrite`, ...) and may ignore the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionBegan {
        session_id: Uuid,
        commitment: String,
        mode: TrackingMode,
        target: u32,
        at: DateTime<Utc>,
    },
    /// Adapter should enter exclusive full-screen presentation. Best-effort.
    PresentationRequested {
        at: DateTime<Utc>,
    },
    /// Adapter should leave full-screen presentation. Best-effort.
    PresentationReleased {
        at: DateTime<Utc>,
    },
    /// 1 Hz tick applied in time mode.
    Tick {
        elapsed_secs: u64,
    },
    ThresholdReached {
        word_count: usize,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// UI group came back to half opacity after idling.
    UiFadeReset {
        opacity: f64,
    },
    /// Done button revealed (or re-revealed) after idling.
    DoneButtonRevealed {
        opacity: f64,
    },
    GlowFaded,
    /// A platform exit attempt was swallowed; the warning is showing.
    InterruptSuppressed {
        at: DateTime<Utc>,
    },
    ExitWarningCleared,
    FullscreenHintShown {
        at: DateTime<Utc>,
    },
    FullscreenHintCleared,
    /// Adapter should put `text` on the clipboard.
    ClipboardWrite {
        text: String,
        at: DateTime<Utc>,
    },
    CopiedCleared,
    SessionFinished {
        summary: SessionSummary,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        stage: Stage,
        commitment: String,
        mode: TrackingMode,
        target: u32,
        word_count: usize,
        elapsed_secs: u64,
        progress_pct: f64,
        progress_label: String,
        encouragement: String,
        threshold_reached: bool,
        bonus_words: u32,
        ui_opacity: f64,
        title_opacity: f64,
        done_button_opacity: f64,
        done_button_visible: bool,
        done_button_shown: bool,
        glow_opacity: f64,
        exit_warning_visible: bool,
        fullscreen_hint_visible: bool,
        copied: bool,
        now_ms: u64,
        at: DateTime<Utc>,
    },
}
