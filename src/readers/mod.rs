pub mod observation_reader;

pub use observation_reader::{parse_observation_line, ObservationReader, RawLine};
