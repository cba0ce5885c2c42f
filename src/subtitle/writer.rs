use chrono::{NaiveDateTime, TimeDelta};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info};

use super::SubtitleEntry;
use crate::config::OutputConfig;
use crate::error::{ConvertError, Result};

const BOM: &str = "\u{feff}";

/// Format an elapsed duration as `HH:MM:SS,mmm`.
///
/// Hours are not capped at 99. Negative durations render as zero and
/// sub-millisecond precision is truncated.
pub fn format_srt_time(elapsed: TimeDelta) -> String {
    let total_milliseconds = elapsed.num_milliseconds().max(0).unsigned_abs();
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Streams SubRip blocks into any writer
pub struct SrtWriter<W: Write> {
    inner: W,
    newline: &'static str,
}

impl<W: Write> SrtWriter<W> {
    pub fn new(inner: W, newline: &'static str) -> Self {
        Self { inner, newline }
    }

    pub fn write_bom(&mut self) -> Result<()> {
        self.inner.write_all(BOM.as_bytes())?;
        Ok(())
    }

    /// Write one block. Fails if the entry starts before `baseline` or ends
    /// before it starts.
    pub fn write_entry(&mut self, entry: &SubtitleEntry, baseline: NaiveDateTime) -> Result<()> {
        let nl = self.newline;
        let start = entry.start_time.signed_duration_since(baseline);
        let end = entry.end_time.signed_duration_since(baseline);

        if start < TimeDelta::zero() || end < start {
            return Err(ConvertError::Timing(format!(
                "subtitle {} spans {} to {}, relative to {}",
                entry.sequence_number, entry.start_time, entry.end_time, baseline
            )));
        }

        let start = format_srt_time(start);
        let end = format_srt_time(end);

        write!(
            self.inner,
            "{}{nl}{} --> {}{nl}{}{nl}{nl}",
            entry.sequence_number, start, end, entry.text
        )?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Render entries to an in-memory SRT document
pub fn render_srt(
    entries: &[SubtitleEntry],
    baseline: NaiveDateTime,
    newline: &'static str,
) -> Result<String> {
    let mut writer = SrtWriter::new(Vec::new(), newline);
    for entry in entries {
        writer.write_entry(entry, baseline)?;
    }
    let bytes = writer.finish()?;
    String::from_utf8(bytes)
        .map_err(|e| ConvertError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Write entries to `output_path`, overwriting any existing file.
///
/// With `baseline` of `None` (no entries) the file is still created empty.
/// `on_write` receives each sequence number after its block is written.
pub fn write_srt_file<P, F>(
    output_path: P,
    entries: &[SubtitleEntry],
    baseline: Option<NaiveDateTime>,
    options: &OutputConfig,
    on_write: F,
) -> Result<()>
where
    P: AsRef<Path>,
    F: FnMut(u64),
{
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {}", output_path.display());

    if options.atomic {
        let dir = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = create_temp_output(dir, output_path)?;
        write_blocks(temp.as_file_mut(), entries, baseline, options, on_write)?;
        temp.persist(output_path).map_err(|e| ConvertError::Io(e.error))?;
        debug!("Persisted temporary output to {}", output_path.display());
    } else {
        let file = File::create(output_path)?;
        write_blocks(file, entries, baseline, options, on_write)?;
    }

    info!("SRT file generated successfully");
    Ok(())
}

/// Temporary file that ends up with the same mode a plain create would give.
///
/// New files get `0o666` minus the umask; an existing destination keeps its mode.
fn create_temp_output(dir: &Path, output_path: &Path) -> Result<NamedTempFile> {
    let mut builder = Builder::new();
    builder.prefix(".livetalk-srt").suffix(".tmp");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }

    let temp = builder.tempfile_in(dir)?;

    #[cfg(unix)]
    {
        if let Ok(existing) = std::fs::metadata(output_path) {
            temp.as_file().set_permissions(existing.permissions())?;
        }
    }
    #[cfg(not(unix))]
    let _ = output_path;

    Ok(temp)
}

fn write_blocks<W: Write, F: FnMut(u64)>(
    target: W,
    entries: &[SubtitleEntry],
    baseline: Option<NaiveDateTime>,
    options: &OutputConfig,
    mut on_write: F,
) -> Result<()> {
    let mut writer = SrtWriter::new(BufWriter::new(target), options.line_ending.as_str());

    if options.byte_order_mark {
        writer.write_bom()?;
    }

    if let Some(baseline) = baseline {
        for entry in entries {
            writer.write_entry(entry, baseline)?;
            on_write(entry.sequence_number);
        }
    }

    writer.finish()?;
    Ok(())
}
