use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, ConvertError};
use crate::subtitle::TimingRules;

/// Minimum number of seconds a subtitle stays on screen
pub const DEFAULT_MIN_DISPLAY_SECONDS: u32 = 3;

/// Approximate reading speed used to size the display window
pub const DEFAULT_CHARS_PER_SECOND: u32 = 5;

fn default_timestamp_formats() -> Vec<String> {
    [
        "%Y/%m/%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S%.f",
        "%d.%m.%Y %H:%M:%S%.f",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub conversion: ConversionConfig,
    pub output: OutputConfig,
    pub recent: RecentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Seconds added in front of the first subtitle
    pub offset_seconds: i64,
    /// Display floor for every subtitle
    pub min_display_seconds: u32,
    /// Reading speed divisor, rounded up per subtitle
    pub chars_per_second: u32,
    /// chrono format strings tried in order after RFC 3339
    pub timestamp_formats: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// CRLF on Windows, LF elsewhere
    Platform,
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Platform => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub line_ending: LineEnding,
    /// Prefix the SRT file with a UTF-8 byte order mark
    pub byte_order_mark: bool,
    /// Write through a temporary file and rename on success
    pub atomic: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentConfig {
    /// Last converted source file
    pub file_name: Option<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            offset_seconds: 0,
            min_display_seconds: DEFAULT_MIN_DISPLAY_SECONDS,
            chars_per_second: DEFAULT_CHARS_PER_SECOND,
            timestamp_formats: default_timestamp_formats(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            line_ending: LineEnding::Platform,
            byte_order_mark: false,
            atomic: true,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConvertError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConvertError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        std::fs::write(path, content)
            .map_err(|e| ConvertError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.conversion.chars_per_second == 0 {
            return Err(ConvertError::Config(
                "conversion.chars_per_second must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timing_rules(&self) -> TimingRules {
        TimingRules {
            min_display_seconds: self.conversion.min_display_seconds,
            chars_per_second: self.conversion.chars_per_second,
        }
    }
}
