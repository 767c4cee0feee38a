use serde::Serialize;
use thiserror::Error;

use crate::UnixTimestamp;

/// Host name reported when the platform hostname is unavailable or not valid UTF-8.
const FALLBACK_HOSTNAME: &str = "localhost";

/// Error returned from [`Metric::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MetricError {
    /// The item key was empty.
    #[error("metric key must not be empty")]
    EmptyKey,
}

/// Returns the hostname of the local machine.
///
/// Falls back to `"localhost"` if the hostname cannot be determined.
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|s| s.into_string().ok())
        .unwrap_or_else(|| FALLBACK_HOSTNAME.to_owned())
}

/// A single timestamped observation of a monitored item.
///
/// The `host` defaults to the local hostname and the `clock` to the time of construction. Both can
/// be overridden before the metric is added to a [`Packet`](crate::Packet):
///
/// ```
/// use trapper_protocol::{Metric, UnixTimestamp};
///
/// let metric = Metric::new("queue.size", "17")
///     .unwrap()
///     .with_hostname("worker-3")
///     .with_timestamp(UnixTimestamp::from_secs(1_700_000_000));
///
/// assert_eq!(metric.host(), "worker-3");
/// assert_eq!(metric.clock().as_secs(), 1_700_000_000);
/// ```
///
/// Serializes to `{"host", "key", "value", "clock"}` in exactly this order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Metric {
    host: String,
    key: String,
    value: String,
    clock: UnixTimestamp,
}

impl Metric {
    /// Creates a new metric for the item `key`.
    ///
    /// The value is transmitted as-is; numbers should be formatted by the caller.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self, MetricError> {
        let key = key.into();
        if key.is_empty() {
            return Err(MetricError::EmptyKey);
        }

        Ok(Self {
            host: local_hostname(),
            key,
            value: value.into(),
            clock: UnixTimestamp::now(),
        })
    }

    /// Overrides the host this metric is attributed to.
    pub fn with_hostname(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Overrides the time of the observation.
    pub fn with_timestamp(mut self, clock: UnixTimestamp) -> Self {
        self.clock = clock;
        self
    }

    /// The host this metric is attributed to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The key of the monitored item.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The raw value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The time of the observation.
    pub fn clock(&self) -> UnixTimestamp {
        self.clock
    }
}
