use thiserror::Error;

#[derive(Error, Debug)]
pub enum BorderForgeError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Parsing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Invalid Command: {0}")]
    InvalidCommand(String),

    #[error("Data Integrity Error: {0}")]
    DataIntegrity(String),
}

pub type BfResult<T> = Result<T, BorderForgeError>;
