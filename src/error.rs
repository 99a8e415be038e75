use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetimeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input file not found: {0}")]
    MissingInput(String),

    #[error("Unparseable subtitle file: {0}")]
    UnparseableSubtitle(String),

    #[error("Duration probe failed: {0}")]
    Probe(String),

    #[error("Time stretch failed: {0}")]
    Stretch(String),

    #[error("{0} timed out after {1}s")]
    Timeout(String, u64),
}

pub type Result<T> = std::result::Result<T, RetimeError>;
