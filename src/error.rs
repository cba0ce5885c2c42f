use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Parse error at line {line}: {reason} (line: {content:?})")]
    Parse {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("Timing error: {0}")]
    Timing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Conversion worker failed: {0}")]
    Worker(String),
}

impl ConvertError {
    pub fn parse(line: usize, content: &str, reason: impl Into<String>) -> Self {
        ConvertError::Parse {
            line,
            content: content.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
