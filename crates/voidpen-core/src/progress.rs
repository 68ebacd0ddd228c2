//! Progress toward the release threshold.
//!
//! Progress is derived on demand from the current word count or elapsed time;
//! only the threshold latch is stored. The latch is edge-triggered: once a
//! session reaches 100% it stays reached, even if words are later deleted.

use serde::{Deserialize, Serialize};

/// What progress is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Words { count: usize, target: u32 },
    Time { elapsed_secs: u64, target_minutes: u32 },
}

impl Measure {
    /// 0.0 ..= 100.0 completion.
    pub fn percent(self) -> f64 {
        let (done, total) = match self {
            Measure::Words { count, target } => (count as f64, f64::from(target)),
            Measure::Time {
                elapsed_secs,
                target_minutes,
            } => (elapsed_secs as f64, f64::from(target_minutes) * 60.0),
        };
        if total <= 0.0 {
            return 0.0;
        }
        (done / total * 100.0).min(100.0)
    }

    /// Words written beyond the target. Always 0 in time mode.
    pub fn bonus(self) -> u32 {
        match self {
            Measure::Words { count, target } => {
                u32::try_from(count).unwrap_or(u32::MAX).saturating_sub(target)
            }
            Measure::Time { .. } => 0,
        }
    }

    /// Bonus as a percentage of the target, capped at 100.
    pub fn bonus_percent(self) -> f64 {
        match self {
            Measure::Words { target, .. } if target > 0 => {
                (f64::from(self.bonus()) / f64::from(target) * 100.0).min(100.0)
            }
            _ => 0.0,
        }
    }
}

/// Result of feeding the tracker a new measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub percent: f64,
    /// True only on the update where the threshold is first reached.
    pub threshold_just_reached: bool,
    pub bonus: u32,
}

/// One-way threshold latch for a single session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdState {
    reached: bool,
    bonus: u32,
}

impl ThresholdState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reached(&self) -> bool {
        self.reached
    }

    pub fn bonus(&self) -> u32 {
        self.bonus
    }

    pub fn update(&mut self, measure: Measure) -> ProgressUpdate {
        let percent = measure.percent();
        let just_reached = !self.reached && percent >= 100.0;
        if just_reached {
            self.reached = true;
        }
        self.bonus = measure.bonus();
        ProgressUpdate {
            percent,
            threshold_just_reached: just_reached,
            bonus: self.bonus,
        }
    }
}

/// Encouragement line shown under the writing area.
pub fn encouragement(percent: f64, threshold_reached: bool) -> &'static str {
    if threshold_reached {
        return "You've done what you came to do.";
    }
    if percent < 25.0 {
        "The hardest part is starting. You're already here."
    } else if percent < 50.0 {
        "You're finding your rhythm."
    } else if percent < 75.0 {
        "Halfway there. Keep going."
    } else {
        "Almost. Don't stop now."
    }
}

/// `m:ss`, minutes unbounded.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Progress line, e.g. `"120 / 500 words"` or `"4:05 / 30:00 ✓"`.
pub fn label(measure: Measure, threshold_reached: bool) -> String {
    let mut out = match measure {
        Measure::Words { count, target } => format!("{count} / {target} words"),
        Measure::Time {
            elapsed_secs,
            target_minutes,
        } => format!("{} / {target_minutes}:00", format_elapsed(elapsed_secs)),
    };
    if threshold_reached {
        out.push_str(" ✓");
    }
    out
}
