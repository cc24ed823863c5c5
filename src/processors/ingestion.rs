use crate::error::{PipelineError, Result};
use crate::readers::{parse_observation_line, ObservationReader};
use crate::storage::observations::insert_observation;
use crate::storage::{Database, InsertOutcome};
use crate::utils::constants::DEFAULT_FILE_EXTENSION;
use crate::utils::progress::ProgressReporter;
use chrono::{DateTime, Local};
use rayon::prelude::*;
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Classification of one non-blank input line. Every line lands in exactly one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Inserted,
    Duplicate,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file_name: String,
    pub station_id: String,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl FileReport {
    fn record(&mut self, outcome: &LineOutcome) {
        match outcome {
            LineOutcome::Inserted => self.inserted += 1,
            LineOutcome::Duplicate => self.skipped += 1,
            LineOutcome::Failed(_) => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub file_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    pub files_found: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub file_reports: Vec<FileReport>,
    pub failed_files: Vec<FailedFile>,
}

impl IngestionReport {
    fn new(files_found: usize) -> Self {
        Self {
            started_at: Local::now(),
            duration: Duration::ZERO,
            files_found,
            inserted: 0,
            skipped: 0,
            failed: 0,
            file_reports: Vec::new(),
            failed_files: Vec::new(),
        }
    }

    fn add_file(&mut self, report: FileReport) {
        self.inserted += report.inserted;
        self.skipped += report.skipped;
        self.failed += report.failed;
        self.file_reports.push(report);
    }

    pub fn files_processed(&self) -> usize {
        self.file_reports.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "=== Ingestion Report ===\n\
            Started: {}\n\
            Duration: {:.2?}\n\
            Files: {} found, {} processed, {} failed\n\
            Records inserted: {}\n\
            Records skipped (duplicates): {}\n\
            Records failed: {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.duration,
            self.files_found,
            self.files_processed(),
            self.failed_files.len(),
            self.inserted,
            self.skipped,
            self.failed
        )
    }
}

/// Loads per-station observation files into the database.
pub struct IngestionLoader {
    db: Database,
    max_workers: usize,
    file_extension: String,
    use_mmap: bool,
    show_progress: bool,
}

impl IngestionLoader {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            max_workers: num_cpus::get(),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            use_mmap: false,
            show_progress: false,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_file_extension(mut self, extension: &str) -> Self {
        self.file_extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Draw a per-file progress bar on the terminal while ingesting.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Station files in `dir`, sorted by file name.
    pub fn discover_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(PipelineError::DirectoryNotFound(dir.to_path_buf()));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == self.file_extension)
            })
            .collect();

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    pub fn ingest_directory(&self, dir: &Path) -> Result<IngestionReport> {
        let files = self.discover_files(dir)?;

        if files.is_empty() {
            warn!("No weather data files found in {}", dir.display());
        }

        self.ingest_files(&files)
    }

    /// Ingest the given files in name order. A file that fails with a storage or I/O
    /// error is logged and skipped; rows it inserted before failing stay committed.
    pub fn ingest_files(&self, files: &[PathBuf]) -> Result<IngestionReport> {
        let mut files = files.to_vec();
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let start = Instant::now();
        let mut report = IngestionReport::new(files.len());
        info!("Found {} weather data files to process", files.len());
        info!(
            "Ingestion started at: {}",
            report.started_at.format("%Y-%m-%d %H:%M:%S")
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let session = self.db.session()?;
        let progress = ProgressReporter::new(
            files.len() as u64,
            "Ingesting observations...",
            !self.show_progress,
        );

        for (index, path) in files.iter().enumerate() {
            let file_name = display_name(path);
            progress.set_message(&format!("Ingesting {}", file_name));

            match self.ingest_file_with(session.connection(), &pool, path) {
                Ok(file_report) => {
                    debug!(
                        "{}: {} inserted, {} skipped (duplicates), {} failed",
                        file_name, file_report.inserted, file_report.skipped, file_report.failed
                    );
                    report.add_file(file_report);
                }
                Err(e) => {
                    error!("Failed to process {}: {}", file_name, e);
                    report.failed_files.push(FailedFile {
                        file_name,
                        reason: e.to_string(),
                    });
                }
            }

            progress.update((index + 1) as u64);
        }

        progress.finish_with_message("Ingestion finished");
        report.duration = start.elapsed();

        info!("Duration: {:.2?}", report.duration);
        info!("Total records inserted: {}", report.inserted);
        info!("Total records skipped (duplicates): {}", report.skipped);
        info!("Total records failed: {}", report.failed);
        info!("Total files processed: {}", report.files_processed());
        if report.failed > 0 {
            warn!(
                "{} records failed to process - check logs above",
                report.failed
            );
        }
        if !report.failed_files.is_empty() {
            warn!("{} files could not be processed", report.failed_files.len());
        }

        Ok(report)
    }

    /// Ingest a single station file in its own session.
    pub fn ingest_file(&self, path: &Path) -> Result<FileReport> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let session = self.db.session()?;
        self.ingest_file_with(session.connection(), &pool, path)
    }

    fn ingest_file_with(
        &self,
        conn: &Connection,
        pool: &rayon::ThreadPool,
        path: &Path,
    ) -> Result<FileReport> {
        let file_name = display_name(path);
        let station_id = ObservationReader::station_id_from_path(path)?;
        debug!("Processing file: {}", file_name);

        let lines = ObservationReader::with_mmap(self.use_mmap).read_lines(path)?;

        // Parsing is pure, so it fans out; persistence stays in line order.
        let parsed: Vec<_> = pool.install(|| {
            lines
                .par_iter()
                .map(|line| parse_observation_line(&line.text, &station_id))
                .collect()
        });

        let mut report = FileReport {
            file_name: file_name.clone(),
            station_id,
            ..FileReport::default()
        };

        for (line, result) in lines.iter().zip(parsed) {
            let outcome = match result {
                Ok(observation) => match insert_observation(conn, &observation)? {
                    InsertOutcome::Inserted => LineOutcome::Inserted,
                    InsertOutcome::Duplicate => LineOutcome::Duplicate,
                },
                Err(e) => LineOutcome::Failed(e.to_string()),
            };

            if let LineOutcome::Failed(reason) = &outcome {
                warn!(
                    "Skipping invalid line {} in {}: {}",
                    line.number, file_name, reason
                );
            }

            report.record(&outcome);
        }

        Ok(report)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
