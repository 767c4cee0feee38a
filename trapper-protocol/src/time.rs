use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// A unix timestamp (full seconds elapsed since 1970-01-01 00:00 UTC).
///
/// Serializes as a plain integer, which is what the server expects in the `clock` field.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UnixTimestamp(u64);

impl UnixTimestamp {
    /// Creates a unix timestamp from the given number of seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Creates a unix timestamp from the given system time.
    ///
    /// Times before the UNIX epoch are clamped to `0`.
    pub fn from_system(time: SystemTime) -> Self {
        let duration = time
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Self(duration)
    }

    /// Returns the current timestamp.
    #[inline]
    pub fn now() -> Self {
        Self::from_system(SystemTime::now())
    }

    /// Returns the number of seconds since the UNIX epoch start.
    pub fn as_secs(self) -> u64 {
        self.0
    }
}

impl From<u64> for UnixTimestamp {
    fn from(secs: u64) -> Self {
        Self::from_secs(secs)
    }
}

impl fmt::Debug for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnixTimestamp({})", self.as_secs())
    }
}

impl fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_secs().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_from_system() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_millis(1_700_000_000_999);
        assert_eq!(UnixTimestamp::from_system(time).as_secs(), 1_700_000_000);
    }

    #[test]
    fn test_before_epoch() {
        let time = SystemTime::UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(UnixTimestamp::from_system(time).as_secs(), 0);
    }

    #[test]
    fn test_serialize_as_integer() {
        let json = serde_json::to_string(&UnixTimestamp::from_secs(42)).unwrap();
        assert_eq!(json, "42");
    }
}
