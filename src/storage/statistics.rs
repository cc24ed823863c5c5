use super::WhereClause;
use crate::error::Result;
use crate::models::{AnnualStatistic, StoredAnnualStatistic};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

const SELECT_COLUMNS: &str =
    "id, station_id, year, avg_max_temp, avg_min_temp, total_precipitation";

/// Insert the statistic, or overwrite the three metric fields of an existing
/// (station, year) row.
pub fn upsert_statistic(conn: &Connection, stat: &AnnualStatistic) -> Result<UpsertOutcome> {
    let existing: Option<i64> = conn
        .prepare_cached("SELECT id FROM annual_statistics WHERE station_id = ?1 AND year = ?2")?
        .query_row(params![stat.station_id, stat.year], |row| row.get(0))
        .optional()?;

    match existing {
        Some(id) => {
            conn.prepare_cached(
                "
                    UPDATE annual_statistics
                    SET avg_max_temp = ?2, avg_min_temp = ?3, total_precipitation = ?4
                    WHERE id = ?1
                ",
            )?
            .execute(params![
                id,
                stat.avg_max_temp,
                stat.avg_min_temp,
                stat.total_precipitation,
            ])?;
            Ok(UpsertOutcome::Updated)
        }
        None => {
            conn.prepare_cached(
                "
                    INSERT INTO annual_statistics
                        (station_id, year, avg_max_temp, avg_min_temp, total_precipitation)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )?
            .execute(params![
                stat.station_id,
                stat.year,
                stat.avg_max_temp,
                stat.avg_min_temp,
                stat.total_precipitation,
            ])?;
            Ok(UpsertOutcome::Inserted)
        }
    }
}

pub fn count_statistics(conn: &Connection, filter: &WhereClause) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM annual_statistics{}", filter.to_sql());
    let count: i64 = conn.query_row(&sql, params_from_iter(filter.params()), |row| row.get(0))?;
    Ok(count as u64)
}

/// One page of statistics ordered by (year, station_id).
pub fn query_statistics(
    conn: &Connection,
    filter: &WhereClause,
    limit: u64,
    offset: u64,
) -> Result<Vec<StoredAnnualStatistic>> {
    let sql = format!(
        "SELECT {} FROM annual_statistics{} ORDER BY year, station_id LIMIT {} OFFSET {}",
        SELECT_COLUMNS,
        filter.to_sql(),
        limit,
        offset
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filter.params()), parse_row_to_statistic)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn parse_row_to_statistic(
    row: &Row,
) -> std::result::Result<StoredAnnualStatistic, rusqlite::Error> {
    Ok(StoredAnnualStatistic {
        id: row.get(0)?,
        statistic: AnnualStatistic {
            station_id: row.get(1)?,
            year: row.get(2)?,
            avg_max_temp: row.get(3)?,
            avg_min_temp: row.get(4)?,
            total_precipitation: row.get(5)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::create_test_database;

    #[test]
    fn test_upsert_inserts_then_updates() {
        let test = create_test_database();
        let session = test.db.session().unwrap();
        let conn = session.connection();

        let first = AnnualStatistic::new("USC00110187", 1985, Some(5.0), Some(-5.0), Some(1.0));
        assert_eq!(upsert_statistic(conn, &first).unwrap(), UpsertOutcome::Inserted);

        let second = AnnualStatistic::new("USC00110187", 1985, Some(6.0), None, Some(2.5));
        assert_eq!(upsert_statistic(conn, &second).unwrap(), UpsertOutcome::Updated);

        let rows = query_statistics(conn, &WhereClause::new(), 10, 0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].statistic, second);
    }

    #[test]
    fn test_year_check_constraint() {
        let test = create_test_database();
        let session = test.db.session().unwrap();
        let conn = session.connection();

        let stat = AnnualStatistic::new("USC00110187", 1850, None, None, None);
        assert!(upsert_statistic(conn, &stat).is_err());
        assert_eq!(count_statistics(conn, &WhereClause::new()).unwrap(), 0);
    }
}
