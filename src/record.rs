//! LiveTalk CSV record parsing.
//!
//! Every line of a LiveTalk transcript log holds four quoted fields:
//! `"<timestamp>","<speaker>","<text>","<translation>"`. Commas inside a
//! quoted field belong to the field.

use chrono::{DateTime, NaiveDateTime};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::debug;

use crate::error::{ConvertError, Result};

const FIELD_COUNT: usize = 4;
const BOM: char = '\u{feff}';

/// One transcript line as written by LiveTalk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub timestamp: NaiveDateTime,
    pub speaker_name: String,
    pub text: String,
    pub translated_text: String,
}

/// Parses free-form timestamp text against a list of chrono formats
#[derive(Debug, Clone)]
pub struct TimestampParser {
    formats: Vec<String>,
}

impl TimestampParser {
    pub fn new(formats: Vec<String>) -> Self {
        Self { formats }
    }

    /// RFC 3339 first (normalized to UTC), then each configured format in order.
    pub fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.naive_utc());
        }

        self.formats
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    }
}

/// Split a line on commas that sit outside double quotes.
///
/// Each field must be wrapped in quotes; the wrapping quotes are removed and
/// doubled quotes inside a field collapse to one.
pub fn split_quoted_fields(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut raw_fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => raw_fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err("unbalanced quotes".to_string());
    }
    raw_fields.push(current);

    raw_fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let field = field.trim();
            if field.len() < 2 || !field.starts_with('"') || !field.ends_with('"') {
                return Err(format!("field {} is not quoted", index + 1));
            }
            Ok(field[1..field.len() - 1].replace("\"\"", "\""))
        })
        .collect()
}

/// Parse a single CSV line into a record. `line_number` is 1-based.
pub fn parse_line(
    line: &str,
    line_number: usize,
    timestamps: &TimestampParser,
) -> Result<RawRecord> {
    let fields = split_quoted_fields(line)
        .map_err(|reason| ConvertError::parse(line_number, line, reason))?;

    let [timestamp, speaker_name, text, translated_text]: [String; FIELD_COUNT] =
        fields.try_into().map_err(|fields: Vec<String>| {
            ConvertError::parse(
                line_number,
                line,
                format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
            )
        })?;

    let timestamp = timestamps.parse(&timestamp).ok_or_else(|| {
        ConvertError::parse(line_number, line, format!("invalid timestamp '{}'", timestamp))
    })?;

    Ok(RawRecord {
        timestamp,
        speaker_name,
        text,
        translated_text,
    })
}

/// Lazy reader yielding one record per source line.
///
/// Iteration ends after the first error; reopen the source to start over.
pub struct RecordReader<R: BufRead> {
    lines: Lines<R>,
    timestamps: TimestampParser,
    line_number: usize,
    failed: bool,
}

impl RecordReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P, timestamps: TimestampParser) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConvertError::FileNotFound(path.display().to_string()),
            _ => ConvertError::Io(e),
        })?;
        debug!("Opened transcript: {}", path.display());
        Ok(Self::new(BufReader::new(file), timestamps))
    }
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R, timestamps: TimestampParser) -> Self {
        Self {
            lines: reader.lines(),
            timestamps,
            line_number: 0,
            failed: false,
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => {
                self.failed = true;
                return Some(Err(ConvertError::Io(e)));
            }
        };
        self.line_number += 1;

        let line = if self.line_number == 1 {
            line.strip_prefix(BOM).unwrap_or(&line)
        } else {
            &line
        };

        let record = parse_line(line, self.line_number, &self.timestamps);
        if record.is_err() {
            self.failed = true;
        }
        Some(record)
    }
}
