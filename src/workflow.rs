use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{ConvertError, Result};
use crate::progress::{StatusEvent, StatusSender};
use crate::record::{RecordReader, TimestampParser};
use crate::subtitle::{baseline, write_srt_file, SubtitleBuilder};

/// Source, destination and offset for one conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub offset_seconds: i64,
}

impl ConversionRequest {
    /// Destination is the source path with its extension replaced by `.srt`
    pub fn new<P: AsRef<Path>>(source: P, offset_seconds: i64) -> Self {
        let source = source.as_ref().to_path_buf();
        let destination = source.with_extension("srt");
        Self {
            source,
            destination,
            offset_seconds,
        }
    }

    pub fn with_destination<P: AsRef<Path>>(mut self, destination: P) -> Self {
        self.destination = destination.as_ref().to_path_buf();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub entries: usize,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub converted: Vec<ConversionSummary>,
    pub failed: Vec<(PathBuf, String)>,
}

/// State owned by a single read-build-write pass
struct ConversionRun<'a> {
    request: &'a ConversionRequest,
    config: &'a Config,
    status: &'a StatusSender,
}

impl ConversionRun<'_> {
    fn execute(self) -> Result<ConversionSummary> {
        let request = self.request;

        if request.source == request.destination {
            return Err(ConvertError::Config(format!(
                "Destination would overwrite source: {}",
                request.source.display()
            )));
        }

        let timestamps = TimestampParser::new(self.config.conversion.timestamp_formats.clone());
        let reader = RecordReader::open(&request.source, timestamps)?;

        let mut builder = SubtitleBuilder::new(self.config.timing_rules());
        for record in reader {
            let seq_no = builder.push(record?);
            self.status.send(StatusEvent::Read { seq_no });
        }
        info!("Read {} records from {}", builder.len(), request.source.display());

        if builder.is_empty() {
            warn!("No records found in {}", request.source.display());
        }

        let entries = builder.finish(|seq_no| self.status.send(StatusEvent::Check { seq_no }));
        let baseline = baseline(&entries, request.offset_seconds)?;

        write_srt_file(
            &request.destination,
            &entries,
            baseline,
            &self.config.output,
            |seq_no| self.status.send(StatusEvent::Write { seq_no }),
        )?;

        self.status.send(StatusEvent::EndOfFile);
        Ok(ConversionSummary {
            source: request.source.clone(),
            destination: request.destination.clone(),
            entries: entries.len(),
        })
    }
}

pub struct Workflow {
    config: Config,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a conversion on the current thread.
    ///
    /// A failure is reported once as `StatusEvent::Failed` and returned.
    pub fn convert_blocking(
        &self,
        request: &ConversionRequest,
        status: &StatusSender,
    ) -> Result<ConversionSummary> {
        info!(
            "Converting {} -> {} (offset {}s)",
            request.source.display(),
            request.destination.display(),
            request.offset_seconds
        );

        let result = ConversionRun {
            request,
            config: &self.config,
            status,
        }
        .execute();

        if let Err(e) = &result {
            error!("Conversion of {} failed: {}", request.source.display(), e);
            status.send(StatusEvent::Failed { message: e.to_string() });
        }
        result
    }

    /// Run a conversion on a blocking worker thread.
    ///
    /// A worker that panics is reported like any other failure.
    pub async fn convert(
        &self,
        request: ConversionRequest,
        status: StatusSender,
    ) -> Result<ConversionSummary> {
        let workflow = Workflow {
            config: self.config.clone(),
        };
        let worker_status = status.clone();
        let source = request.source.clone();

        run_on_worker(&source, &status, move || {
            workflow.convert_blocking(&request, &worker_status)
        })
        .await
    }

    /// Start a conversion in the background and return its status stream
    pub fn spawn(
        &self,
        request: ConversionRequest,
    ) -> (JoinHandle<Result<ConversionSummary>>, UnboundedReceiver<StatusEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let workflow = Workflow {
            config: self.config.clone(),
        };
        let handle =
            tokio::spawn(async move { workflow.convert(request, StatusSender::new(tx)).await });
        (handle, rx)
    }

    /// Convert every `.csv` file below `input_dir`, continuing past failures
    pub async fn convert_directory<P: AsRef<Path>>(
        &self,
        input_dir: P,
        offset_seconds: i64,
    ) -> Result<BatchSummary> {
        let input_dir = input_dir.as_ref();
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(ConvertError::Config(format!(
                "Input path is not a directory: {}",
                input_dir.display()
            )));
        }

        let mut csv_files: Vec<PathBuf> = WalkDir::new(input_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        csv_files.sort();

        info!("Found {} CSV files to convert", csv_files.len());

        let mut summary = BatchSummary::default();
        for csv_path in csv_files {
            let request = ConversionRequest::new(&csv_path, offset_seconds);
            match self.convert(request, StatusSender::silent()).await {
                Ok(done) => {
                    info!("Successfully converted: {}", csv_path.display());
                    summary.converted.push(done);
                }
                Err(e) => {
                    warn!("Failed to convert {}: {}", csv_path.display(), e);
                    summary.failed.push((csv_path, e.to_string()));
                }
            }
        }

        Ok(summary)
    }
}

/// Run `job` on the blocking pool. A panicked or cancelled worker becomes
/// `ConvertError::Worker` and is reported on `status`.
async fn run_on_worker<F>(source: &Path, status: &StatusSender, job: F) -> Result<ConversionSummary>
where
    F: FnOnce() -> Result<ConversionSummary> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => result,
        Err(e) => {
            let e = ConvertError::Worker(e.to_string());
            error!("Conversion of {} failed: {}", source.display(), e);
            status.send(StatusEvent::Failed { message: e.to_string() });
            Err(e)
        }
    }
}
