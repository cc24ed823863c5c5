use crate::error::{PipelineError, Result};
use crate::storage::WhereClause;
use crate::utils::constants::{QUERY_DATE_FORMAT, QUERY_DATE_LEN};
use chrono::NaiveDate;
use serde::Deserialize;

pub const DATE_FORMAT_MESSAGE: &str = "Date must be in YYYY-MM-DD format";

/// Parse a caller-supplied `YYYY-MM-DD` date.
pub fn parse_query_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();

    // chrono's %Y accepts signs and short years, so the layout is checked up front
    if !has_query_date_shape(value) {
        return Err(PipelineError::Validation(DATE_FORMAT_MESSAGE.to_string()));
    }

    NaiveDate::parse_from_str(value, QUERY_DATE_FORMAT)
        .map_err(|_| PipelineError::Validation(DATE_FORMAT_MESSAGE.to_string()))
}

fn has_query_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == QUERY_DATE_LEN
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Observation filters as received from the caller. All fields are optional and
/// AND-combined; dates are still unparsed text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ObservationQuery {
    pub station_id: Option<String>,
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl ObservationQuery {
    /// Validate every date before any condition is built, so a bad value never
    /// results in a partially applied filter.
    pub fn to_where_clause(&self) -> Result<WhereClause> {
        let date = non_empty(&self.date).map(parse_query_date).transpose()?;
        let start_date = non_empty(&self.start_date)
            .map(parse_query_date)
            .transpose()?;
        let end_date = non_empty(&self.end_date).map(parse_query_date).transpose()?;

        let mut clause = WhereClause::new();
        if let Some(station_id) = non_empty(&self.station_id) {
            clause.push("station_id = ?", station_id.to_string());
        }
        if let Some(date) = date {
            clause.push("date = ?", date.to_string());
        }
        if let Some(start) = start_date {
            clause.push("date >= ?", start.to_string());
        }
        if let Some(end) = end_date {
            clause.push("date <= ?", end.to_string());
        }

        Ok(clause)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatisticQuery {
    pub station_id: Option<String>,
    pub year: Option<i32>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
}

impl StatisticQuery {
    pub fn to_where_clause(&self) -> WhereClause {
        let mut clause = WhereClause::new();
        if let Some(station_id) = non_empty(&self.station_id) {
            clause.push("station_id = ?", station_id.to_string());
        }
        if let Some(year) = self.year {
            clause.push("year = ?", year as i64);
        }
        if let Some(start) = self.start_year {
            clause.push("year >= ?", start as i64);
        }
        if let Some(end) = self.end_year {
            clause.push("year <= ?", end as i64);
        }
        clause
    }
}
