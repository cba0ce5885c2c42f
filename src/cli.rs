use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a LiveTalk CSV transcript into a SubRip file
    Convert {
        /// Input CSV file (defaults to the last converted file)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Seconds before the first subtitle (may be negative)
        #[arg(short = 's', long, allow_hyphen_values = true)]
        offset: Option<i64>,

        /// Output SRT file (defaults to the input with an .srt extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not remember the input file in the configuration
        #[arg(long)]
        no_remember: bool,
    },

    /// Convert all CSV transcripts in a directory
    Batch {
        /// Input directory containing CSV files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Seconds before the first subtitle (may be negative)
        #[arg(short = 's', long, allow_hyphen_values = true)]
        offset: Option<i64>,
    },

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
