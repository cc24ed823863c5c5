pub mod args;
pub mod commands;

pub use args::{Cli, Commands, OutputFormat};
pub use commands::{run, setup_logging};
