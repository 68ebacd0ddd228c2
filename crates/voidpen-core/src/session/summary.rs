use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TrackingMode;
use crate::progress::format_elapsed;

/// Characters of content shown in the completion preview.
pub const PREVIEW_CHARS: usize = 500;

/// Read-only export of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub commitment: String,
    pub mode: TrackingMode,
    pub target: u32,
    pub word_count: usize,
    pub elapsed_secs: u64,
    pub elapsed: String,
    pub bonus_words: u32,
    pub threshold_reached: bool,
    pub preview: String,
    pub began_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SessionSummary {
    /// `"312 words written — 12 beyond your goal"` or `"30:00 focused"`.
    pub fn headline(&self) -> String {
        match self.mode {
            TrackingMode::Words if self.bonus_words > 0 => format!(
                "{} words written — {} beyond your goal",
                self.word_count, self.bonus_words
            ),
            TrackingMode::Words => format!("{} words written", self.word_count),
            TrackingMode::Time => format!("{} focused", format_elapsed(self.elapsed_secs)),
        }
    }
}

/// First [`PREVIEW_CHARS`] characters of `content`, with `...` if cut.
pub fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}
