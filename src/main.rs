//! LiveTalk SubRip Converter
//!
//! Command-line entry point: loads configuration, converts LiveTalk CSV
//! transcripts to SubRip files and renders progress on the console.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use livetalk_srt::cli::{Args, Commands, ConfigAction};
use livetalk_srt::config::Config;
use livetalk_srt::error::ConvertError;
use livetalk_srt::progress::StatusEvent;
use livetalk_srt::workflow::{ConversionRequest, ConversionSummary, Workflow};

const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    // Explicit path, else ./config.toml when present, else defaults
    let config_path = args.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = if args.config.is_some() || config_path.exists() {
        info!("Loading configuration from {}", config_path.display());
        Config::from_file(&config_path)?
    } else {
        Config::default()
    };

    match args.command {
        Commands::Convert { input, offset, output, no_remember } => {
            let input = match input {
                Some(path) => path,
                None => config
                    .recent
                    .file_name
                    .clone()
                    .map(PathBuf::from)
                    .ok_or_else(|| ConvertError::Config(
                        "No input file given and no recent file in configuration".to_string(),
                    ))?,
            };
            let offset = offset.unwrap_or(config.conversion.offset_seconds);

            let mut request = ConversionRequest::new(&input, offset);
            if let Some(output) = output {
                request = request.with_destination(output);
            }

            let workflow = Workflow::new(config.clone())?;
            let summary = convert_with_progress(&workflow, request).await?;
            println!(
                "Wrote {} subtitles to {}",
                summary.entries,
                summary.destination.display()
            );

            if !no_remember {
                config.recent.file_name = Some(input.display().to_string());
                config.save_to_file(&config_path)?;
                info!("Remembered {} in {}", input.display(), config_path.display());
            }
        }
        Commands::Batch { input_dir, offset } => {
            let offset = offset.unwrap_or(config.conversion.offset_seconds);
            let workflow = Workflow::new(config)?;
            let summary = workflow.convert_directory(&input_dir, offset).await?;

            for done in &summary.converted {
                println!("{:<8} {}", done.entries, done.destination.display());
            }
            for (path, reason) in &summary.failed {
                println!("{:<8} {}: {}", "FAILED", path.display(), reason);
            }
            println!(
                "Converted {} files, {} failed",
                summary.converted.len(),
                summary.failed.len()
            );

            if !summary.failed.is_empty() {
                anyhow::bail!("{} file(s) could not be converted", summary.failed.len());
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigAction::Init { force } => {
                init_config(&config_path, force)?;
                println!("Wrote default configuration to {}", config_path.display());
            }
        },
    }

    Ok(())
}

/// Run the conversion in the background and mirror its status on a spinner
async fn convert_with_progress(
    workflow: &Workflow,
    request: ConversionRequest,
) -> Result<ConversionSummary> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let (handle, mut status) = workflow.spawn(request);
    while let Some(event) = status.recv().await {
        match &event {
            StatusEvent::Failed { .. } => spinner.abandon_with_message(event.to_string()),
            StatusEvent::EndOfFile => spinner.finish_with_message(event.to_string()),
            _ => spinner.set_message(event.to_string()),
        }
    }

    let summary = handle
        .await
        .map_err(|e| ConvertError::Worker(e.to_string()))??;
    Ok(summary)
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Configuration file {} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Config::default().save_to_file(path)?;
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".livetalk-srt").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation; the guard must outlive main
    let file_appender = rolling::daily(&log_dir, "livetalk-srt.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("livetalk-srt.log").display());

    Ok(())
}
