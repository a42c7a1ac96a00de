use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("invalid data format: {0}")]
    Format(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PulseError>;
