mod args;
mod error;
mod logger;

pub use args::{CliArgs, Command};
pub use error::DocValuesError;
pub use logger::setup_logging;
