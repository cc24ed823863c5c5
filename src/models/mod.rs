pub mod annual_statistic;
pub mod observation;

pub use annual_statistic::{AnnualStatistic, AnnualStatisticView, StoredAnnualStatistic};
pub use observation::{Observation, ObservationView, StoredObservation};
