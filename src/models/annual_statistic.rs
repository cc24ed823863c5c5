use serde::{Deserialize, Serialize};
use validator::Validate;

/// Yearly aggregate for one station, already in final units:
/// degrees Celsius for the temperature means and centimetres for precipitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AnnualStatistic {
    #[validate(length(min = 1))]
    pub station_id: String,

    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,

    pub avg_max_temp: Option<f64>,
    pub avg_min_temp: Option<f64>,
    pub total_precipitation: Option<f64>,
}

impl AnnualStatistic {
    pub fn new(
        station_id: impl Into<String>,
        year: i32,
        avg_max_temp: Option<f64>,
        avg_min_temp: Option<f64>,
        total_precipitation: Option<f64>,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            year,
            avg_max_temp,
            avg_min_temp,
            total_precipitation,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredAnnualStatistic {
    pub id: i64,
    pub statistic: AnnualStatistic,
}

/// Display form, rounded to two decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualStatisticView {
    pub id: i64,
    pub station_id: String,
    pub year: i32,
    pub avg_max_temp: Option<f64>,
    pub avg_min_temp: Option<f64>,
    pub total_precipitation: Option<f64>,
}

pub fn round_to_hundredths(value: Option<f64>) -> Option<f64> {
    value.map(|v| (v * 100.0).round() / 100.0)
}

impl From<&StoredAnnualStatistic> for AnnualStatisticView {
    fn from(stored: &StoredAnnualStatistic) -> Self {
        let stat = &stored.statistic;
        Self {
            id: stored.id,
            station_id: stat.station_id.clone(),
            year: stat.year,
            avg_max_temp: round_to_hundredths(stat.avg_max_temp),
            avg_min_temp: round_to_hundredths(stat.avg_min_temp),
            total_precipitation: round_to_hundredths(stat.total_precipitation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_validation() {
        let valid = AnnualStatistic::new("USC00110072", 1985, Some(-8.33), None, Some(0.94));
        assert!(valid.validate().is_ok());

        let too_early = AnnualStatistic::new("USC00110072", 1899, None, None, None);
        assert!(too_early.validate().is_err());

        let too_late = AnnualStatistic::new("USC00110072", 2101, None, None, None);
        assert!(too_late.validate().is_err());

        let no_station = AnnualStatistic::new("", 1985, None, None, None);
        assert!(no_station.validate().is_err());

        let bounds = AnnualStatistic::new("USC00110072", 2100, None, None, None);
        assert!(bounds.validate().is_ok());
    }

    #[test]
    fn test_display_rounding() {
        let stored = StoredAnnualStatistic {
            id: 7,
            statistic: AnnualStatistic::new(
                "USC00110072",
                1985,
                Some(-8.333333),
                Some(-19.6285),
                Some(0.9444),
            ),
        };

        let view = AnnualStatisticView::from(&stored);

        assert_eq!(view.id, 7);
        assert_eq!(view.avg_max_temp, Some(-8.33));
        assert_eq!(view.avg_min_temp, Some(-19.63));
        assert_eq!(view.total_precipitation, Some(0.94));
    }

    #[test]
    fn test_display_keeps_nulls() {
        let stored = StoredAnnualStatistic {
            id: 1,
            statistic: AnnualStatistic::new("USC00110072", 1985, None, None, None),
        };

        let view = AnnualStatisticView::from(&stored);

        assert_eq!(view.avg_max_temp, None);
        assert_eq!(view.avg_min_temp, None);
        assert_eq!(view.total_precipitation, None);
    }
}
