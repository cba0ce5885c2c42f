// Subtitle construction and SubRip output
//
// - Builder: turns parsed records into timed entries and trims overlaps
// - Writer: renders entries relative to a baseline in SubRip format

pub mod builder;
pub mod writer;

use chrono::NaiveDateTime;

pub use builder::*;
pub use writer::*;

use crate::config::{DEFAULT_CHARS_PER_SECOND, DEFAULT_MIN_DISPLAY_SECONDS};

/// Reading-speed heuristic for sizing the display window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingRules {
    pub min_display_seconds: u32,
    pub chars_per_second: u32,
}

impl Default for TimingRules {
    fn default() -> Self {
        Self {
            min_display_seconds: DEFAULT_MIN_DISPLAY_SECONDS,
            chars_per_second: DEFAULT_CHARS_PER_SECOND,
        }
    }
}

impl TimingRules {
    /// `max(ceil(chars / chars_per_second), min_display_seconds)`
    pub fn display_seconds(&self, text: &str) -> i64 {
        let chars = text.chars().count() as u64;
        let reading = chars.div_ceil(u64::from(self.chars_per_second.max(1)));
        reading.max(u64::from(self.min_display_seconds)) as i64
    }
}

/// One numbered subtitle with absolute start and end times
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    pub sequence_number: u64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub text: String,
}
