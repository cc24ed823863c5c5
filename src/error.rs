use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("{0}")]
    Validation(String),

    #[error("Validation failed: {0}")]
    Invariant(#[from] validator::ValidationErrors),

    #[error("Settings error: {0}")]
    Settings(#[from] ::config::ConfigError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database not found: {} (run `init` first)", .0.display())]
    DatabaseNotFound(PathBuf),

    #[error("Data directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// True when the caller supplied bad input (the 4xx side of the house).
    /// Everything else is a fault of the pipeline or its storage.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Validation(_) | PipelineError::MalformedRecord(_)
        )
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        if self.is_client_error() {
            2
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let validation = PipelineError::Validation("Date must be in YYYY-MM-DD format".into());
        assert!(validation.is_client_error());
        assert_eq!(validation.exit_code(), 2);
        assert_eq!(validation.to_string(), "Date must be in YYYY-MM-DD format");

        let storage = PipelineError::Database(rusqlite::Error::InvalidQuery);
        assert!(!storage.is_client_error());
        assert_eq!(storage.exit_code(), 1);
    }
}
