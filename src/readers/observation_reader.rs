use crate::error::{PipelineError, Result};
use crate::models::Observation;
use crate::utils::constants::{
    DEFAULT_BUFFER_SIZE, MISSING_VALUE_SENTINEL, OBSERVATION_FIELD_COUNT, RAW_DATE_FORMAT,
    RAW_DATE_LEN,
};
use chrono::NaiveDate;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse one raw observation line for a station.
///
/// Expected format: `YYYYMMDD  MAXTEMP  MINTEMP  PRECIP`, separated by tabs or any
/// other whitespace. `-9999` in a numeric field becomes `None`; every other integer is
/// kept as-is.
pub fn parse_observation_line(line: &str, station_id: &str) -> Result<Observation> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.len() != OBSERVATION_FIELD_COUNT {
        return Err(PipelineError::MalformedRecord(format!(
            "Expected {} fields, got {}",
            OBSERVATION_FIELD_COUNT,
            parts.len()
        )));
    }

    let date = parse_raw_date(parts[0])?;
    let max_temp = parse_reading(parts[1], "max temperature")?;
    let min_temp = parse_reading(parts[2], "min temperature")?;
    let precipitation = parse_reading(parts[3], "precipitation")?;

    Ok(Observation::new(
        station_id,
        date,
        max_temp,
        min_temp,
        precipitation,
    ))
}

fn parse_raw_date(date_str: &str) -> Result<NaiveDate> {
    // chrono's %Y accepts short years, so the width is checked up front
    if date_str.len() != RAW_DATE_LEN || !date_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PipelineError::MalformedRecord(format!(
            "Invalid date '{}': expected YYYYMMDD",
            date_str
        )));
    }

    NaiveDate::parse_from_str(date_str, RAW_DATE_FORMAT).map_err(|_| {
        PipelineError::MalformedRecord(format!("Invalid calendar date: '{}'", date_str))
    })
}

fn parse_reading(value_str: &str, field: &str) -> Result<Option<i64>> {
    let value = value_str.trim().parse::<i64>().map_err(|_| {
        PipelineError::MalformedRecord(format!("Invalid {}: '{}'", field, value_str))
    })?;

    Ok(if value == MISSING_VALUE_SENTINEL {
        None
    } else {
        Some(value)
    })
}

/// A non-blank line from a station file with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub number: usize,
    pub text: String,
}

pub struct ObservationReader {
    use_mmap: bool,
}

impl ObservationReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    /// Station identifier is the file's base name without its extension
    /// (e.g. `wx_data/USC00110072.txt` -> `USC00110072`).
    pub fn station_id_from_path(path: &Path) -> Result<String> {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                PipelineError::InvalidFormat(format!(
                    "Cannot derive station id from path: {}",
                    path.display()
                ))
            })
    }

    /// Read every non-blank line of a station file.
    pub fn read_lines(&self, path: &Path) -> Result<Vec<RawLine>> {
        if self.use_mmap {
            self.read_lines_mmap(path)
        } else {
            self.read_lines_buffered(path)
        }
    }

    fn read_lines_buffered(&self, path: &Path) -> Result<Vec<RawLine>> {
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let mut lines = Vec::new();

        for (index, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            lines.push(RawLine {
                number: index + 1,
                text: line,
            });
        }

        Ok(lines)
    }

    fn read_lines_mmap(&self, path: &Path) -> Result<Vec<RawLine>> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            // mapping a zero-length file fails on some platforms
            return Ok(Vec::new());
        }

        let mmap = unsafe { Mmap::map(&file)? };
        let content = std::str::from_utf8(&mmap)
            .map_err(|e| PipelineError::InvalidFormat(format!("Invalid UTF-8: {}", e)))?;

        Ok(content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| RawLine {
                number: index + 1,
                text: line.to_string(),
            })
            .collect())
    }
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}
