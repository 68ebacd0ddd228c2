mod machine;
mod notice;
mod summary;

pub use machine::{InterruptDecision, Session};
pub use notice::Notice;
pub use summary::{SessionSummary, PREVIEW_CHARS};

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::SessionError;
use crate::fade::FadeTimings;

/// Session lifecycle. Moves forward only; `new_session` starts over at Setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Setup,
    Focus,
    Complete,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    #[default]
    Words,
    Time,
}

/// Allowed word targets.
pub const WORD_TARGETS: RangeInclusive<u32> = 100..=2000;
/// Allowed minute targets.
pub const MINUTE_TARGETS: RangeInclusive<u32> = 5..=120;

/// Word and minute targets. Both are kept; the mode picks which one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targets {
    pub words: u32,
    pub minutes: u32,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            words: 500,
            minutes: 30,
        }
    }
}

impl Targets {
    pub fn for_mode(&self, mode: TrackingMode) -> u32 {
        match mode {
            TrackingMode::Words => self.words,
            TrackingMode::Time => self.minutes,
        }
    }

    /// Replace the target for `mode`, rejecting values outside its range.
    pub fn set(&mut self, mode: TrackingMode, value: u32) -> Result<(), SessionError> {
        let range = range_for(mode);
        if !range.contains(&value) {
            return Err(SessionError::TargetOutOfRange {
                mode,
                value,
                min: *range.start(),
                max: *range.end(),
            });
        }
        match mode {
            TrackingMode::Words => self.words = value,
            TrackingMode::Time => self.minutes = value,
        }
        Ok(())
    }

    /// Pull both targets into their allowed ranges.
    pub fn clamped(self) -> Self {
        Self {
            words: self.words.clamp(*WORD_TARGETS.start(), *WORD_TARGETS.end()),
            minutes: self
                .minutes
                .clamp(*MINUTE_TARGETS.start(), *MINUTE_TARGETS.end()),
        }
    }
}

pub fn range_for(mode: TrackingMode) -> RangeInclusive<u32> {
    match mode {
        TrackingMode::Words => WORD_TARGETS,
        TrackingMode::Time => MINUTE_TARGETS,
    }
}

/// Every delay the session schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    pub fade: FadeTimings,
    pub tick_ms: u64,
    pub exit_warning_ms: u64,
    pub fullscreen_hint_ms: u64,
    pub copied_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            fade: FadeTimings::default(),
            tick_ms: 1_000,
            exit_warning_ms: 3_000,
            fullscreen_hint_ms: 5_000,
            copied_ms: 2_000,
        }
    }
}

/// What a fresh session starts with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub mode: TrackingMode,
    pub targets: Targets,
    pub timings: Timings,
}
