pub mod annual_statistics;

pub use annual_statistics::{AggregationReport, AnnualAccumulator, StatisticsAggregator};
