use crate::error::Result;
use crate::models::AnnualStatistic;
use crate::storage::observations::{readings_for_station_year, station_years};
use crate::storage::statistics::upsert_statistic;
use crate::storage::{Database, UpsertOutcome};
use crate::utils::constants::{AGGREGATION_PROGRESS_INTERVAL, TENTHS_MM_PER_CM, TENTHS_PER_UNIT};
use crate::utils::progress::ProgressReporter;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use validator::Validate;

/// Running sums for one station-year. Missing readings are skipped per metric.
#[derive(Debug, Clone, Default)]
pub struct AnnualAccumulator {
    max_temp_sum: i128,
    max_temp_count: usize,
    min_temp_sum: i128,
    min_temp_count: usize,
    precipitation_sum: i128,
    precipitation_count: usize,
}

impl AnnualAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, max_temp: Option<i64>, min_temp: Option<i64>, precipitation: Option<i64>) {
        if let Some(v) = max_temp {
            self.max_temp_sum += i128::from(v);
            self.max_temp_count += 1;
        }
        if let Some(v) = min_temp {
            self.min_temp_sum += i128::from(v);
            self.min_temp_count += 1;
        }
        if let Some(v) = precipitation {
            self.precipitation_sum += i128::from(v);
            self.precipitation_count += 1;
        }
    }

    /// Temperatures become mean degrees; precipitation becomes the yearly total in cm.
    pub fn finish(&self, station_id: &str, year: i32) -> AnnualStatistic {
        AnnualStatistic::new(
            station_id,
            year,
            mean_in_units(self.max_temp_sum, self.max_temp_count),
            mean_in_units(self.min_temp_sum, self.min_temp_count),
            (self.precipitation_count > 0)
                .then(|| self.precipitation_sum as f64 / TENTHS_MM_PER_CM),
        )
    }
}

fn mean_in_units(sum: i128, count: usize) -> Option<f64> {
    if count > 0 {
        Some(sum as f64 / count as f64 / TENTHS_PER_UNIT)
    } else {
        None
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregationReport {
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    pub groups: usize,
    pub inserted: usize,
    pub updated: usize,
    pub rejected: usize,
}

impl AggregationReport {
    pub fn summary(&self) -> String {
        format!(
            "=== Aggregation Report ===\n\
            Started: {}\n\
            Duration: {:.2?}\n\
            Station-years: {}\n\
            Statistics inserted: {}\n\
            Statistics updated: {}\n\
            Rejected: {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.duration,
            self.groups,
            self.inserted,
            self.updated,
            self.rejected
        )
    }
}

/// Recomputes every annual statistic from the stored observations.
pub struct StatisticsAggregator {
    db: Database,
    show_progress: bool,
}

impl StatisticsAggregator {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            show_progress: false,
        }
    }

    /// Draw a per station-year progress bar on the terminal while aggregating.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Aggregate all station-years inside a single transaction, so a failed run
    /// leaves the previous statistics untouched.
    pub fn run(&self) -> Result<AggregationReport> {
        let started_at = Local::now();
        let start = Instant::now();
        info!(
            "Aggregation started at: {}",
            started_at.format("%Y-%m-%d %H:%M:%S")
        );

        let mut session = self.db.session()?;

        let (groups, inserted, updated, rejected) = session.with_transaction(|tx| {
            let pairs = station_years(tx)?;
            info!("Found {} station-year combinations", pairs.len());

            let progress = ProgressReporter::new(
                pairs.len() as u64,
                "Aggregating annual statistics...",
                !self.show_progress,
            );

            let (mut inserted, mut updated, mut rejected) = (0, 0, 0);

            for (index, (station_id, year)) in pairs.iter().enumerate() {
                let mut acc = AnnualAccumulator::new();
                for (max_temp, min_temp, precipitation) in
                    readings_for_station_year(tx, station_id, *year)?
                {
                    acc.add(max_temp, min_temp, precipitation);
                }

                let stat = acc.finish(station_id, *year);
                if let Err(e) = stat.validate() {
                    warn!("Skipping statistic for {} {}: {}", station_id, year, e);
                    rejected += 1;
                    continue;
                }

                match upsert_statistic(tx, &stat)? {
                    UpsertOutcome::Inserted => inserted += 1,
                    UpsertOutcome::Updated => updated += 1,
                }

                if (index + 1) % AGGREGATION_PROGRESS_INTERVAL == 0 {
                    debug!("Processed {}/{} station-years", index + 1, pairs.len());
                }
                progress.update((index + 1) as u64);
            }

            progress.finish_with_message("Aggregation finished");
            Ok((pairs.len(), inserted, updated, rejected))
        })?;

        let report = AggregationReport {
            started_at,
            duration: start.elapsed(),
            groups,
            inserted,
            updated,
            rejected,
        };

        info!("Duration: {:.2?}", report.duration);
        info!("Statistics inserted: {}", report.inserted);
        info!("Statistics updated: {}", report.updated);
        if report.rejected > 0 {
            warn!("{} station-years rejected - check logs above", report.rejected);
        }

        Ok(report)
    }
}
