use chrono::{NaiveDateTime, TimeDelta};
use tracing::debug;

use super::{SubtitleEntry, TimingRules};
use crate::error::{ConvertError, Result};
use crate::record::RawRecord;

/// Collects records into numbered subtitle entries
pub struct SubtitleBuilder {
    rules: TimingRules,
    entries: Vec<SubtitleEntry>,
}

impl SubtitleBuilder {
    pub fn new(rules: TimingRules) -> Self {
        Self {
            rules,
            entries: Vec::new(),
        }
    }

    /// Append a record and return the sequence number assigned to it
    pub fn push(&mut self, record: RawRecord) -> u64 {
        let sequence_number = self.entries.len() as u64 + 1;
        let display = TimeDelta::seconds(self.rules.display_seconds(&record.text));
        let end_time = record
            .timestamp
            .checked_add_signed(display)
            .unwrap_or(NaiveDateTime::MAX);

        self.entries.push(SubtitleEntry {
            sequence_number,
            start_time: record.timestamp,
            end_time,
            text: record.text,
        });
        sequence_number
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Trim overlaps and hand back the finished entries.
    ///
    /// `on_check` sees the sequence number of every entry that is compared
    /// against its successor.
    pub fn finish<F: FnMut(u64)>(mut self, on_check: F) -> Vec<SubtitleEntry> {
        trim_overlaps(&mut self.entries, on_check);
        self.entries
    }
}

/// Build and trim entries in one call
pub fn build_entries<I>(records: I, rules: TimingRules) -> Vec<SubtitleEntry>
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut builder = SubtitleBuilder::new(rules);
    for record in records {
        builder.push(record);
    }
    builder.finish(|_| {})
}

/// Cut each end time back to the next entry's start. End times only shrink.
pub fn trim_overlaps<F: FnMut(u64)>(entries: &mut [SubtitleEntry], mut on_check: F) {
    for index in 0..entries.len().saturating_sub(1) {
        on_check(entries[index].sequence_number);

        let next_start = entries[index + 1].start_time;
        let entry = &mut entries[index];
        if entry.end_time > next_start {
            debug!(
                "Trimming subtitle {} end from {} to {}",
                entry.sequence_number, entry.end_time, next_start
            );
            entry.end_time = next_start;
        }
    }
}

/// Zero point for rendering: the first start minus the offset's magnitude.
///
/// A negative offset shifts the output later just like a positive one.
/// `Ok(None)` when there are no entries; an offset that leaves the
/// representable date range is an error.
pub fn baseline(entries: &[SubtitleEntry], offset_seconds: i64) -> Result<Option<NaiveDateTime>> {
    let Some(first) = entries.first() else {
        return Ok(None);
    };

    let out_of_range = || {
        ConvertError::Config(format!("Offset of {} seconds is out of range", offset_seconds))
    };
    let offset = i64::try_from(offset_seconds.unsigned_abs())
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(out_of_range)?;

    first
        .start_time
        .checked_sub_signed(offset)
        .map(Some)
        .ok_or_else(out_of_range)
}
