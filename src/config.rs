use crate::error::{PipelineError, Result};
use crate::query::PaginationSettings;
use crate::utils::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_DATABASE_PATH, DEFAULT_DATA_DIR, DEFAULT_FILE_EXTENSION,
    DEFAULT_PAGE_SIZE, ENV_PREFIX, MAX_PAGE_SIZE,
};
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

/// Runtime settings, layered as: built-in defaults, then the TOML file, then
/// `WEATHER_*` environment variables, then command-line overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Settings {
    pub database_path: PathBuf,
    pub data_dir: PathBuf,

    #[validate(length(min = 1))]
    pub file_extension: String,

    #[validate(range(min = 1))]
    pub default_page_size: u32,

    #[validate(range(min = 1))]
    pub max_page_size: u32,

    #[validate(range(min = 1))]
    pub max_workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            max_workers: num_cpus::get(),
        }
    }
}

impl Settings {
    /// Load settings. An explicitly named file must exist; the default
    /// `weather-pipeline.toml` is only read when present.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();

        let file_source = match config_file {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let settings: Settings = Config::builder()
            .set_default(
                "database_path",
                defaults.database_path.to_string_lossy().to_string(),
            )?
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .set_default("file_extension", defaults.file_extension.clone())?
            .set_default("default_page_size", defaults.default_page_size as i64)?
            .set_default("max_page_size", defaults.max_page_size as i64)?
            .set_default("max_workers", defaults.max_workers as i64)?
            .add_source(file_source)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate_settings()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn with_database_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.database_path = path;
        }
        self
    }

    pub fn with_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.data_dir = dir;
        }
        self
    }

    pub fn with_max_workers(mut self, max_workers: Option<usize>) -> Self {
        if let Some(max_workers) = max_workers {
            self.max_workers = max_workers;
        }
        self
    }

    pub fn validate_settings(&self) -> Result<()> {
        self.validate()?;

        if self.default_page_size > self.max_page_size {
            return Err(PipelineError::Config(format!(
                "default_page_size {} exceeds max_page_size {}",
                self.default_page_size, self.max_page_size
            )));
        }

        Ok(())
    }

    pub fn pagination(&self) -> PaginationSettings {
        PaginationSettings {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate_settings().is_ok());
        assert_eq!(settings.pagination(), PaginationSettings::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            "database_path = \"/tmp/other.db\"\ndefault_page_size = 25\nmax_workers = 2\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();

        assert_eq!(settings.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(settings.default_page_size, 25);
        assert_eq!(settings.max_page_size, MAX_PAGE_SIZE);
        assert_eq!(settings.max_workers, 2);
        assert_eq!(settings.file_extension, "txt");
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        assert!(Settings::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_inconsistent_page_sizes() {
        let settings = Settings {
            default_page_size: 500,
            max_page_size: 100,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate_settings(),
            Err(PipelineError::Config(_))
        ));

        let zero_workers = Settings {
            max_workers: 0,
            ..Settings::default()
        };
        assert!(matches!(
            zero_workers.validate_settings(),
            Err(PipelineError::Invariant(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::default()
            .with_database_path(Some(PathBuf::from("x.db")))
            .with_data_dir(None)
            .with_max_workers(Some(3));

        assert_eq!(settings.database_path, PathBuf::from("x.db"));
        assert_eq!(settings.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(settings.max_workers, 3);
    }
}
