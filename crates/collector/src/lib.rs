mod client;
mod dimension;
mod merge;

pub use client::{FetchError, MetricsClient, RetryPolicy, Sample};
pub use dimension::Dimension;
pub use merge::merge_samples;
