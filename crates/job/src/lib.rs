mod config;
mod error;
mod tick;
mod ticklog;

pub use config::MeterConfig;
pub use error::{JobError, Result};
pub use tick::run_tick;
pub use ticklog::{TickLog, TickWriter};
