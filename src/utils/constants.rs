/// Raw-file sentinel for a missing reading
pub const MISSING_VALUE_SENTINEL: i64 = -9999;

/// Fields per observation line: date, max temp, min temp, precipitation
pub const OBSERVATION_FIELD_COUNT: usize = 4;

/// Date layouts
pub const RAW_DATE_FORMAT: &str = "%Y%m%d";
pub const RAW_DATE_LEN: usize = 8;
pub const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";
pub const QUERY_DATE_LEN: usize = 10;

/// Unit conversion divisors
pub const TENTHS_PER_UNIT: f64 = 10.0;
pub const TENTHS_MM_PER_CM: f64 = 100.0;

/// Pagination defaults
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 1000;

/// File and directory defaults
pub const DEFAULT_DATABASE_PATH: &str = "weather.db";
pub const DEFAULT_DATA_DIR: &str = "wx_data";
pub const DEFAULT_FILE_EXTENSION: &str = "txt";
pub const DEFAULT_CONFIG_FILE: &str = "weather-pipeline.toml";
pub const ENV_PREFIX: &str = "WEATHER";

/// I/O and progress tuning
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
pub const AGGREGATION_PROGRESS_INTERVAL: usize = 100;
