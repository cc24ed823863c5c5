use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::constants::{QUERY_DATE_FORMAT, TENTHS_PER_UNIT};

/// One station's readings for one calendar day, in raw tenths encoding.
///
/// Temperatures are tenths of a degree Celsius and precipitation is tenths of a
/// millimetre. `None` marks a reading that was missing (`-9999`) in the source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub station_id: String,
    pub date: NaiveDate,
    pub max_temp: Option<i64>,
    pub min_temp: Option<i64>,
    pub precipitation: Option<i64>,
}

impl Observation {
    pub fn new(
        station_id: impl Into<String>,
        date: NaiveDate,
        max_temp: Option<i64>,
        min_temp: Option<i64>,
        precipitation: Option<i64>,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            date,
            max_temp,
            min_temp,
            precipitation,
        }
    }
}

/// An observation as stored, carrying its surrogate key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObservation {
    pub id: i64,
    pub observation: Observation,
}

/// Display form: degrees Celsius and millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationView {
    pub id: i64,
    pub station_id: String,
    pub date: String,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub precipitation: Option<f64>,
}

/// Tenths to whole units. No rounding beyond the division itself.
pub fn tenths_to_units(value: Option<i64>) -> Option<f64> {
    value.map(|v| v as f64 / TENTHS_PER_UNIT)
}

impl From<&StoredObservation> for ObservationView {
    fn from(stored: &StoredObservation) -> Self {
        let obs = &stored.observation;
        Self {
            id: stored.id,
            station_id: obs.station_id.clone(),
            date: obs.date.format(QUERY_DATE_FORMAT).to_string(),
            max_temp: tenths_to_units(obs.max_temp),
            min_temp: tenths_to_units(obs.min_temp),
            precipitation: tenths_to_units(obs.precipitation),
        }
    }
}
