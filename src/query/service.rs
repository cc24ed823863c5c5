use super::filters::{ObservationQuery, StatisticQuery};
use super::pagination::{Page, PageRequest, PaginationMeta, PaginationSettings};
use crate::error::Result;
use crate::models::{AnnualStatisticView, ObservationView};
use crate::storage::observations::{count_observations, query_observations};
use crate::storage::statistics::{count_statistics, query_statistics};
use crate::storage::Database;
use tracing::debug;

/// Read-only, paginated access to observations and annual statistics.
///
/// Each call opens its own session and drops it before returning, so any number of
/// callers can query concurrently with each other and with ingestion.
#[derive(Debug, Clone)]
pub struct QueryService {
    db: Database,
    pagination: PaginationSettings,
}

impl QueryService {
    pub fn new(db: Database, pagination: PaginationSettings) -> Self {
        Self { db, pagination }
    }

    pub fn page_request(&self, page: Option<i64>, page_size: Option<i64>) -> PageRequest {
        PageRequest::new(page, page_size, &self.pagination)
    }

    pub fn list_observations(
        &self,
        filters: &ObservationQuery,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Page<ObservationView>> {
        let clause = filters.to_where_clause()?;
        let request = self.page_request(page, page_size);
        debug!(
            "Observation query{} page {} size {}",
            clause.to_sql(),
            request.page,
            request.page_size
        );

        let session = self.db.read_session()?;
        let conn = session.connection();

        let total = count_observations(conn, &clause)?;
        let rows = query_observations(conn, &clause, request.limit(), request.offset())?;

        Ok(Page {
            data: rows.iter().map(ObservationView::from).collect(),
            pagination: PaginationMeta::new(&request, total),
        })
    }

    pub fn list_statistics(
        &self,
        filters: &StatisticQuery,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Page<AnnualStatisticView>> {
        let clause = filters.to_where_clause();
        let request = self.page_request(page, page_size);
        debug!(
            "Statistic query{} page {} size {}",
            clause.to_sql(),
            request.page,
            request.page_size
        );

        let session = self.db.read_session()?;
        let conn = session.connection();

        let total = count_statistics(conn, &clause)?;
        let rows = query_statistics(conn, &clause, request.limit(), request.offset())?;

        Ok(Page {
            data: rows.iter().map(AnnualStatisticView::from).collect(),
            pagination: PaginationMeta::new(&request, total),
        })
    }
}
