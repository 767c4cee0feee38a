use std::fs;
use std::num::ParseIntError;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;
use trapper_protocol::{Metric, MetricError, Packet, UnixTimestamp};

/// Host placeholder that keeps the local hostname.
const DEFAULT_HOST: &str = "-";

/// A malformed line in a batch file.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The line has fewer than three or more than four fields.
    #[error("line {line}: expected `<host> <key> <value> [<clock>]`, got {fields} fields")]
    FieldCount { line: usize, fields: usize },

    /// The clock is not a non-negative integer.
    #[error("line {line}: invalid clock '{clock}'")]
    InvalidClock {
        line: usize,
        clock: String,
        #[source]
        source: ParseIntError,
    },

    /// The metric was rejected.
    #[error("line {line}: invalid metric")]
    Metric {
        line: usize,
        #[source]
        source: MetricError,
    },
}

/// Parses batch input into a single packet.
///
/// Every non-empty line that does not start with `#` has the form `<host> <key> <value> [<clock>]`.
/// A host of `-` keeps the local hostname and a missing clock defaults to the current time.
pub fn parse(input: &str) -> Result<Packet, BatchError> {
    let mut packet = Packet::new();

    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let (host, key, value, clock) = match fields[..] {
            [host, key, value] => (host, key, value, None),
            [host, key, value, clock] => (host, key, value, Some(clock)),
            _ => {
                return Err(BatchError::FieldCount {
                    line,
                    fields: fields.len(),
                });
            }
        };

        let mut metric =
            Metric::new(key, value).map_err(|source| BatchError::Metric { line, source })?;

        if host != DEFAULT_HOST {
            metric = metric.with_hostname(host);
        }

        if let Some(clock) = clock {
            let secs = clock.parse().map_err(|source| BatchError::InvalidClock {
                line,
                clock: clock.to_owned(),
                source,
            })?;
            metric = metric.with_timestamp(UnixTimestamp::from_secs(secs));
        }

        packet.add_metric(metric);
    }

    Ok(packet)
}

/// Reads and parses a batch file.
pub fn read(path: &Path) -> Result<Packet> {
    let input = fs::read_to_string(path)
        .with_context(|| format!("failed to read batch file {}", path.display()))?;

    let packet =
        parse(&input).with_context(|| format!("invalid batch file {}", path.display()))?;

    if packet.is_empty() {
        anyhow::bail!("batch file {} contains no metrics", path.display());
    }

    Ok(packet)
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;
    use trapper_protocol::local_hostname;

    use super::*;

    #[test]
    fn test_parse() {
        let packet = parse(
            "# uptime of the edge routers\n\
             router-1 system.uptime 3600 1700000000\n\
             \n\
             - agent.ping 1\n",
        )
        .unwrap();

        let metrics = packet.metrics();
        assert_eq!(metrics.len(), 2);

        assert_eq!(metrics[0].host(), "router-1");
        assert_eq!(metrics[0].key(), "system.uptime");
        assert_eq!(metrics[0].value(), "3600");
        assert_eq!(metrics[0].clock(), UnixTimestamp::from_secs(1_700_000_000));

        assert_eq!(metrics[1].host(), local_hostname());
        assert_eq!(metrics[1].key(), "agent.ping");
    }

    #[test]
    fn test_parse_field_count() {
        let error = parse("host key\n").unwrap_err();
        assert_eq!(
            error.to_string(),
            "line 1: expected `<host> <key> <value> [<clock>]`, got 2 fields"
        );

        assert!(matches!(
            parse("# header\nhost key value 1 extra").unwrap_err(),
            BatchError::FieldCount { line: 2, fields: 5 }
        ));
    }

    #[test]
    fn test_parse_invalid_clock() {
        let error = parse("host key value yesterday").unwrap_err();
        assert_eq!(error.to_string(), "line 1: invalid clock 'yesterday'");
    }

    #[test]
    fn test_read_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let error = read(file.path()).unwrap_err();
        assert!(error.to_string().ends_with("contains no metrics"));
    }
}
