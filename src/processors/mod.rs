pub mod ingestion;

pub use ingestion::{FailedFile, FileReport, IngestionLoader, IngestionReport, LineOutcome};
