use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("{file}:{line}: {reason}")]
    Parse {
        file: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("invalid log file name: {0}")]
    BadFileName(String),

    #[error("no {context} recorded for {key}")]
    MissingKey { key: String, context: &'static str },

    #[error("chart rendering error: {0}")]
    Plot(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for AnalyzerError {
    fn from(err: toml::de::Error) -> Self {
        AnalyzerError::Config(format!("TOML parse error: {err}"))
    }
}
