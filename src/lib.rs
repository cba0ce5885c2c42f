//! LiveTalk SubRip Converter
//!
//! Converts timestamped LiveTalk CSV transcript logs into SubRip (.srt)
//! subtitle files, timed relative to the first record plus an offset.

pub mod cli;
pub mod config;
pub mod error;
pub mod progress;
pub mod record;
pub mod subtitle;
pub mod workflow;
