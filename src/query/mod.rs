//! Filtered, paginated reads for observations and annual statistics.

pub mod filters;
pub mod pagination;
pub mod service;

pub use filters::{parse_query_date, ObservationQuery, StatisticQuery};
pub use pagination::{Page, PageRequest, PaginationMeta, PaginationSettings};
pub use service::QueryService;
