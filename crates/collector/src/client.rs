use std::collections::{BTreeMap, HashMap};
use std::thread;
use std::time::Duration;

use meter_core::ResourceUsage;
use serde::Deserialize;

use crate::dimension::Dimension;
use crate::merge::merge_samples;

/// Fixed-pause retry for transport failures. The same request is re-sent
/// `retries` times after the initial attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 10,
            pause: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("metrics source unreachable after {attempts} attempts: {source}")]
    Unreachable {
        attempts: u32,
        source: reqwest::Error,
    },
}

/// One parsed sample: a namespace label and its raw value string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub namespace: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct MetricResponse {
    data: MetricData,
}

#[derive(Debug, Default, Deserialize)]
struct MetricData {
    #[serde(default)]
    result: Vec<MetricResult>,
}

#[derive(Debug, Deserialize)]
struct MetricResult {
    #[serde(default)]
    metric: HashMap<String, String>,
    /// `[unix-timestamp, "<string-number>"]`
    value: (f64, String),
}

/// Client for the external time-series metrics source.
pub struct MetricsClient {
    endpoint: String,
    retry: RetryPolicy,
    http: reqwest::blocking::Client,
}

impl MetricsClient {
    pub fn new(endpoint: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            endpoint: endpoint.into(),
            retry,
            http: reqwest::blocking::Client::new(),
        }
    }

    /// Fetch one dimension's per-namespace samples.
    ///
    /// Transport failures are retried and, once exhausted, surface as the
    /// typed `Unreachable` error that aborts the tick's collection. A body
    /// that fails to decode degrades to an empty result for this dimension
    /// only.
    pub fn fetch(&self, dimension: Dimension) -> Result<Vec<Sample>, FetchError> {
        let body = self.get_with_retry(dimension.query())?;
        let response: MetricResponse = match serde_json::from_str(&body) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    query = dimension.query(),
                    error = %err,
                    "malformed metrics response, dimension degraded to empty"
                );
                return Ok(Vec::new());
            }
        };
        Ok(response
            .data
            .result
            .into_iter()
            .filter_map(|entry| {
                let namespace = entry.metric.get("namespace").cloned().unwrap_or_default();
                if namespace.is_empty() {
                    return None;
                }
                Some(Sample {
                    namespace,
                    value: entry.value.1,
                })
            })
            .collect())
    }

    /// Fetch all six collected dimensions in their fixed order and merge
    /// them into one record per namespace.
    pub fn collect(&self) -> Result<BTreeMap<String, ResourceUsage>, FetchError> {
        let mut merged = BTreeMap::new();
        for dimension in Dimension::COLLECTED {
            let samples = self.fetch(dimension)?;
            merge_samples(&mut merged, dimension, &samples);
        }
        Ok(merged)
    }

    fn get_with_retry(&self, query: &str) -> Result<String, FetchError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.send(query) {
                Ok(body) => return Ok(body),
                Err(err) => {
                    if attempts > self.retry.retries {
                        return Err(FetchError::Unreachable {
                            attempts,
                            source: err,
                        });
                    }
                    tracing::warn!(
                        attempt = attempts,
                        error = %err,
                        "metrics source connection failed, retrying"
                    );
                    thread::sleep(self.retry.pause);
                }
            }
        }
    }

    fn send(&self, query: &str) -> Result<String, reqwest::Error> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("query", query)])
            .send()?;
        // A body read failure is treated like an undecodable body.
        Ok(response.text().unwrap_or_default())
    }
}
