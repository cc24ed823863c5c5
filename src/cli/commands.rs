use crate::analyzers::StatisticsAggregator;
use crate::cli::args::{Cli, Commands, OutputFormat};
use crate::config::Settings;
use crate::error::Result;
use crate::processors::IngestionLoader;
use crate::query::{ObservationQuery, Page, QueryService, StatisticQuery};
use crate::storage::Database;
use serde::Serialize;
use std::io::{self, Write};
use tracing::{debug, info};

/// Set up structured logging on stderr. `RUST_LOG` takes precedence over the flags.
pub fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let log_level = cli.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("weather_pipeline={}", log_level)));

    // try_init so a second call (e.g. from tests) is harmless
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init();

    debug!("Logging initialized at level: {}", log_level);
}

pub async fn run(cli: Cli) -> Result<()> {
    setup_logging(&cli);

    let settings = Settings::load(cli.config.as_deref())?.with_database_path(cli.database.clone());
    let quiet = cli.quiet;

    match cli.command {
        Commands::Init => {
            let db = Database::open(&settings.database_path)?;
            info!("Database initialized at {}", db.path().display());
        }

        Commands::Ingest {
            data_dir,
            extension,
            max_workers,
            mmap,
        } => {
            let mut settings = settings.with_data_dir(data_dir).with_max_workers(max_workers);
            if let Some(extension) = extension {
                settings.file_extension = extension;
            }
            settings.validate_settings()?;

            info!("Ingesting weather data from {}", settings.data_dir.display());
            info!("Database: {}", settings.database_path.display());
            info!("Workers: {}", settings.max_workers);

            let db = Database::open(&settings.database_path)?;
            let loader = IngestionLoader::new(db)
                .with_max_workers(settings.max_workers)
                .with_file_extension(&settings.file_extension)
                .with_mmap(mmap)
                .with_progress(!quiet);
            let data_dir = settings.data_dir.clone();

            let report =
                tokio::task::spawn_blocking(move || loader.ingest_directory(&data_dir)).await??;

            println!("{}", report.summary());
        }

        Commands::Aggregate => {
            let db = Database::open(&settings.database_path)?;
            let aggregator = StatisticsAggregator::new(db).with_progress(!quiet);

            let report = tokio::task::spawn_blocking(move || aggregator.run()).await??;

            println!("{}", report.summary());
        }

        Commands::Observations {
            station_id,
            date,
            start_date,
            end_date,
            page,
            page_size,
            format,
        } => {
            let service = QueryService::new(
                Database::connect(&settings.database_path)?,
                settings.pagination(),
            );
            let filters = ObservationQuery {
                station_id,
                date,
                start_date,
                end_date,
            };

            let result = service.list_observations(&filters, page, page_size)?;
            write_page(&result, format, io::stdout().lock())?;
        }

        Commands::Statistics {
            station_id,
            year,
            start_year,
            end_year,
            page,
            page_size,
            format,
        } => {
            let service = QueryService::new(
                Database::connect(&settings.database_path)?,
                settings.pagination(),
            );
            let filters = StatisticQuery {
                station_id,
                year,
                start_year,
                end_year,
            };

            let result = service.list_statistics(&filters, page, page_size)?;
            write_page(&result, format, io::stdout().lock())?;
        }

        Commands::Info => {
            let db = Database::connect(&settings.database_path)?;
            println!("Database: {}", db.path().display());
            println!("{}", db.summary()?);
        }
    }

    Ok(())
}

/// Render a result page. JSON carries the pagination block; CSV holds only the rows,
/// so the block is logged instead.
pub fn write_page<T: Serialize, W: Write>(page: &Page<T>, format: OutputFormat, mut out: W) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, page)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for row in &page.data {
                writer.serialize(row)?;
            }
            writer.flush()?;

            let meta = &page.pagination;
            info!(
                "Page {}/{} ({} per page, {} records total)",
                meta.page, meta.total_pages, meta.page_size, meta.total_records
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObservationView;
    use crate::query::{PageRequest, PaginationMeta, PaginationSettings};

    fn sample_page() -> Page<ObservationView> {
        let request = PageRequest::new(None, Some(1), &PaginationSettings::default());
        Page {
            data: vec![ObservationView {
                id: 1,
                station_id: "USC00110072".into(),
                date: "1985-01-03".into(),
                max_temp: Some(-10.6),
                min_temp: Some(-24.4),
                precipitation: None,
            }],
            pagination: PaginationMeta::new(&request, 3),
        }
    }

    #[test]
    fn test_write_page_json() {
        let mut buf = Vec::new();
        write_page(&sample_page(), OutputFormat::Json, &mut buf).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json["data"][0]["station_id"], "USC00110072");
        assert!(json["data"][0]["precipitation"].is_null());
        assert_eq!(json["pagination"]["total_pages"], 3);
    }

    #[test]
    fn test_write_page_csv() {
        let mut buf = Vec::new();
        write_page(&sample_page(), OutputFormat::Csv, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,station_id,date,max_temp,min_temp,precipitation")
        );
        assert_eq!(lines.next(), Some("1,USC00110072,1985-01-03,-10.6,-24.4,"));
    }
}
