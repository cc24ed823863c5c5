use super::WhereClause;
use crate::error::Result;
use crate::models::{Observation, StoredObservation};
use rusqlite::{params, params_from_iter, Connection, Row};

/// What happened to a single insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same (station, date) already exists and was left untouched.
    Duplicate,
}

const INSERT_OBSERVATION: &str = "
    INSERT INTO observations (station_id, date, max_temp, min_temp, precipitation)
    VALUES (?1, ?2, ?3, ?4, ?5)
";

const SELECT_COLUMNS: &str = "id, station_id, date, max_temp, min_temp, precipitation";

/// Insert one observation. The UNIQUE (station_id, date) constraint decides duplicates.
pub fn insert_observation(conn: &Connection, obs: &Observation) -> Result<InsertOutcome> {
    let mut stmt = conn.prepare_cached(INSERT_OBSERVATION)?;

    match stmt.execute(params![
        obs.station_id,
        obs.date,
        obs.max_temp,
        obs.min_temp,
        obs.precipitation,
    ]) {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Ok(InsertOutcome::Duplicate)
        }
        Err(err) => Err(err.into()),
    }
}

pub fn count_observations(conn: &Connection, filter: &WhereClause) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM observations{}", filter.to_sql());
    let count: i64 = conn.query_row(&sql, params_from_iter(filter.params()), |row| row.get(0))?;
    Ok(count as u64)
}

/// One page of observations ordered by (date, station_id).
pub fn query_observations(
    conn: &Connection,
    filter: &WhereClause,
    limit: u64,
    offset: u64,
) -> Result<Vec<StoredObservation>> {
    let sql = format!(
        "SELECT {} FROM observations{} ORDER BY date, station_id LIMIT {} OFFSET {}",
        SELECT_COLUMNS,
        filter.to_sql(),
        limit,
        offset
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filter.params()), parse_row_to_observation)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Distinct (station, year) pairs that have at least one observation.
pub fn station_years(conn: &Connection) -> Result<Vec<(String, i32)>> {
    let mut stmt = conn.prepare(
        "
            SELECT DISTINCT station_id, CAST(strftime('%Y', date) AS INTEGER) AS year
            FROM observations
            ORDER BY station_id, year
        ",
    )?;

    let pairs = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(pairs)
}

/// Raw (max_temp, min_temp, precipitation) readings for one station-year.
pub fn readings_for_station_year(
    conn: &Connection,
    station_id: &str,
    year: i32,
) -> Result<Vec<(Option<i64>, Option<i64>, Option<i64>)>> {
    let mut stmt = conn.prepare_cached(
        "
            SELECT max_temp, min_temp, precipitation
            FROM observations
            WHERE station_id = ?1 AND date >= ?2 AND date <= ?3
            ORDER BY date
        ",
    )?;

    let first_day = format!("{:04}-01-01", year);
    let last_day = format!("{:04}-12-31", year);

    let readings = stmt
        .query_map(params![station_id, first_day, last_day], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(readings)
}

fn parse_row_to_observation(row: &Row) -> std::result::Result<StoredObservation, rusqlite::Error> {
    Ok(StoredObservation {
        id: row.get(0)?,
        observation: Observation {
            station_id: row.get(1)?,
            date: row.get(2)?,
            max_temp: row.get(3)?,
            min_temp: row.get(4)?,
            precipitation: row.get(5)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::create_test_database;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_insert_and_duplicate() {
        let test = create_test_database();
        let session = test.db.session().unwrap();
        let conn = session.connection();

        let obs = Observation::new("USC00110072", date(1985, 1, 1), Some(-22), Some(-128), Some(94));
        assert_eq!(insert_observation(conn, &obs).unwrap(), InsertOutcome::Inserted);

        let changed = Observation::new("USC00110072", date(1985, 1, 1), Some(0), None, None);
        assert_eq!(insert_observation(conn, &changed).unwrap(), InsertOutcome::Duplicate);

        let rows = query_observations(conn, &WhereClause::new(), 10, 0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].observation, obs);
    }

    #[test]
    fn test_nulls_round_trip() {
        let test = create_test_database();
        let session = test.db.session().unwrap();
        let conn = session.connection();

        let obs = Observation::new("USC00110072", date(1985, 1, 3), None, None, None);
        insert_observation(conn, &obs).unwrap();

        let rows = query_observations(conn, &WhereClause::new(), 10, 0).unwrap();
        assert_eq!(rows[0].observation, obs);
    }

    #[test]
    fn test_readings_beyond_i32() {
        let test = create_test_database();
        let session = test.db.session().unwrap();
        let conn = session.connection();

        let obs = Observation::new("S", date(1985, 1, 1), Some(3_000_000_000), Some(-3_000_000_000), None);
        insert_observation(conn, &obs).unwrap();

        let rows = query_observations(conn, &WhereClause::new(), 10, 0).unwrap();
        assert_eq!(rows[0].observation, obs);
        assert_eq!(
            readings_for_station_year(conn, "S", 1985).unwrap(),
            vec![(Some(3_000_000_000), Some(-3_000_000_000), None)]
        );
    }

    #[test]
    fn test_station_years() {
        let test = create_test_database();
        let session = test.db.session().unwrap();
        let conn = session.connection();

        for (station, day) in [
            ("B", date(1986, 1, 1)),
            ("A", date(1985, 12, 31)),
            ("A", date(1985, 1, 1)),
            ("B", date(1985, 6, 1)),
        ] {
            insert_observation(conn, &Observation::new(station, day, Some(1), Some(1), Some(1)))
                .unwrap();
        }

        let pairs = station_years(conn).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("A".to_string(), 1985),
                ("B".to_string(), 1985),
                ("B".to_string(), 1986)
            ]
        );

        let readings = readings_for_station_year(conn, "A", 1985).unwrap();
        assert_eq!(readings.len(), 2);
    }
}
