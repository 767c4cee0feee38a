use serde::Serialize;

use crate::Metric;

/// The request discriminator for pushing item values.
pub const DEFAULT_REQUEST: &str = "sender data";

/// An ordered collection of [`Metric`]s transmitted as one JSON document.
///
/// The server answers with per-item counters, so metrics keep their insertion order. The
/// serialized form is an object with the keys `request` and `data`; `data` is omitted while the
/// packet is empty.
///
/// ```
/// use trapper_protocol::{Metric, Packet};
///
/// let packet: Packet = ["cpu.user", "cpu.system"]
///     .into_iter()
///     .map(|key| Metric::new(key, "0").unwrap())
///     .collect();
///
/// assert_eq!(packet.len(), 2);
/// assert_eq!(packet.request(), "sender data");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Packet {
    request: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    data: Vec<Metric>,
}

impl Packet {
    /// Creates an empty packet with the default `"sender data"` request.
    pub fn new() -> Self {
        Self::with_request(DEFAULT_REQUEST)
    }

    /// Creates an empty packet with a custom request discriminator.
    pub fn with_request(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            data: Vec::new(),
        }
    }

    /// Appends a metric to the end of the packet.
    pub fn add_metric(&mut self, metric: Metric) {
        self.data.push(metric);
    }

    /// The request discriminator.
    pub fn request(&self) -> &str {
        &self.request
    }

    /// The metrics in insertion order.
    pub fn metrics(&self) -> &[Metric] {
        &self.data
    }

    /// The number of metrics in this packet.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no metric has been added.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the structured JSON form of this packet.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Serializes this packet into its JSON body.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<Metric> for Packet {
    fn extend<T: IntoIterator<Item = Metric>>(&mut self, iter: T) {
        self.data.extend(iter);
    }
}

impl FromIterator<Metric> for Packet {
    fn from_iter<T: IntoIterator<Item = Metric>>(iter: T) -> Self {
        let mut packet = Self::new();
        packet.extend(iter);
        packet
    }
}
