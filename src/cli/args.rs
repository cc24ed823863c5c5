use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weather-pipeline")]
#[command(about = "Weather station observation ingestion, annual statistics and queries")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Only log warnings and errors"
    )]
    pub quiet: bool,

    #[arg(long, global = true, help = "Settings file [default: weather-pipeline.toml]")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "SQLite database file [default: weather.db]")]
    pub database: Option<PathBuf>,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database tables if they do not exist
    Init,

    /// Load station observation files into the database
    Ingest {
        #[arg(short, long, help = "Directory of station files [default: wx_data]")]
        data_dir: Option<PathBuf>,

        #[arg(short, long, help = "Station file extension [default: txt]")]
        extension: Option<String>,

        #[arg(long)]
        max_workers: Option<usize>,

        #[arg(long, default_value = "false", help = "Read files through memory mapping")]
        mmap: bool,
    },

    /// Recompute annual statistics from stored observations
    Aggregate,

    /// List observations
    Observations {
        #[arg(short, long)]
        station_id: Option<String>,

        #[arg(long, help = "Exact date (YYYY-MM-DD)")]
        date: Option<String>,

        #[arg(long, help = "Inclusive lower bound (YYYY-MM-DD)")]
        start_date: Option<String>,

        #[arg(long, help = "Inclusive upper bound (YYYY-MM-DD)")]
        end_date: Option<String>,

        #[arg(short, long, allow_negative_numbers = true)]
        page: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,

        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// List annual statistics
    Statistics {
        #[arg(short, long)]
        station_id: Option<String>,

        #[arg(short, long)]
        year: Option<i32>,

        #[arg(long)]
        start_year: Option<i32>,

        #[arg(long)]
        end_year: Option<i32>,

        #[arg(short, long, allow_negative_numbers = true)]
        page: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,

        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Show row counts and ranges for both tables
    Info,
}
