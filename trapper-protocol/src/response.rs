use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Number of bytes skipped at the start of a server response.
///
/// This is the size of the frame header. The body length declared in the header is not used to
/// locate the body.
pub const RESPONSE_HEADER_LENGTH: usize = crate::frame::HEADER_LENGTH;

/// The `response` value of a successful delivery.
pub const SUCCESS_RESPONSE: &str = "success";

/// Pattern for the free-text `info` summary, capturing processed, failed, total and seconds spent.
const INFO_PATTERN: &str = r"\w+: (\d+); \w+: (\d+); \w+: (\d+); [a-z ]+: (\d+\.\d+)";

static INFO_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(INFO_PATTERN).unwrap());

/// Errors raised while interpreting a server response.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// The body is not valid JSON.
    #[error("can't decode server response {payload:?}: {source}")]
    InvalidJson {
        /// The body as received, with invalid UTF-8 replaced.
        payload: String,
        /// The decoder diagnostic.
        #[source]
        source: serde_json::Error,
    },

    /// A required string field is absent.
    #[error("invalid server response, missing `{0}` field")]
    MissingField(&'static str),

    /// The `info` summary does not have the expected shape.
    #[error("pattern '{pattern}' didn't match info '{info}'", pattern = INFO_PATTERN)]
    InvalidInfo {
        /// The unparsed `info` value.
        info: String,
    },

    /// The server answered, but did not accept the packet.
    #[error("server returned non-successful response '{response}' ({info})")]
    Unsuccessful {
        /// The `response` value.
        response: String,
        /// The `info` summary.
        info: String,
    },
}

/// Whether the server accepted the delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseStatus {
    /// The server reported `"success"`.
    Success,
    /// Any other value.
    Other,
}

/// The acknowledgement of a delivery.
///
/// Counters are taken as reported, in particular `total` is not checked against
/// `processed + failed`.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    status: ResponseStatus,
    response: String,
    info: String,
    processed: u64,
    failed: u64,
    total: u64,
    seconds_spent: f64,
}

impl Response {
    /// Parses the raw bytes received from the server.
    ///
    /// The first [`RESPONSE_HEADER_LENGTH`] bytes are skipped unconditionally and the remainder is
    /// decoded as JSON with the string fields `response` and `info`.
    ///
    /// ```
    /// use trapper_protocol::{Response, ResponseStatus};
    ///
    /// let mut raw = b"ZBXD\x01\x5a\x00\x00\x00\x00\x00\x00\x00".to_vec();
    /// raw.extend_from_slice(
    ///     br#"{"response":"success","info":"processed: 2; failed: 0; total: 2; seconds spent: 0.000059"}"#,
    /// );
    ///
    /// let response = Response::parse(&raw).unwrap();
    /// assert_eq!(response.status(), ResponseStatus::Success);
    /// assert_eq!(response.processed(), 2);
    /// ```
    pub fn parse(raw: &[u8]) -> Result<Self, ResponseError> {
        let body = raw.get(RESPONSE_HEADER_LENGTH..).unwrap_or_default();

        let value: Value =
            serde_json::from_slice(body).map_err(|source| ResponseError::InvalidJson {
                payload: String::from_utf8_lossy(body).into_owned(),
                source,
            })?;

        let response = value
            .get("response")
            .and_then(Value::as_str)
            .ok_or(ResponseError::MissingField("response"))?;

        let info = value
            .get("info")
            .and_then(Value::as_str)
            .ok_or(ResponseError::MissingField("info"))?;

        let invalid_info = || ResponseError::InvalidInfo {
            info: info.to_owned(),
        };

        let captures = INFO_REGEX.captures(info).ok_or_else(invalid_info)?;
        let counter = |index: usize| captures[index].parse::<u64>().map_err(|_| invalid_info());

        let status = match response {
            SUCCESS_RESPONSE => ResponseStatus::Success,
            _ => ResponseStatus::Other,
        };

        Ok(Self {
            status,
            response: response.to_owned(),
            info: info.to_owned(),
            processed: counter(1)?,
            failed: counter(2)?,
            total: counter(3)?,
            seconds_spent: captures[4].parse().map_err(|_| invalid_info())?,
        })
    }

    /// Turns a response with a status other than [`ResponseStatus::Success`] into an error.
    pub fn into_result(self) -> Result<Self, ResponseError> {
        match self.status {
            ResponseStatus::Success => Ok(self),
            ResponseStatus::Other => Err(ResponseError::Unsuccessful {
                response: self.response,
                info: self.info,
            }),
        }
    }

    /// Whether the server accepted the delivery.
    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    /// Returns `true` if the status is [`ResponseStatus::Success`].
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// The raw `response` value.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// The raw `info` summary.
    pub fn info(&self) -> &str {
        &self.info
    }

    /// Number of items the server processed.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Number of items the server rejected.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// Number of items the server received.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Processing time reported by the server.
    pub fn seconds_spent(&self) -> f64 {
        self.seconds_spent
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    fn framed(body: &str) -> Vec<u8> {
        let mut raw = b"ZBXD\x01".to_vec();
        raw.extend_from_slice(&(body.len() as u64).to_le_bytes());
        raw.extend_from_slice(body.as_bytes());
        raw
    }

    #[test]
    fn test_parse_success() {
        let raw = framed(
            r#"{"response":"success","info":"processed: 2; failed: 0; total: 2; seconds spent: 0.000059"}"#,
        );
        let response = Response::parse(&raw).unwrap();

        assert_eq!(response.status(), ResponseStatus::Success);
        assert_eq!(response.processed(), 2);
        assert_eq!(response.failed(), 0);
        assert_eq!(response.total(), 2);
        assert!((response.seconds_spent() - 0.000059).abs() < 1e-9);
    }

    #[test]
    fn test_parse_other_status_is_not_an_error() {
        let raw = framed(
            r#"{"response":"failed","info":"processed: 0; failed: 3; total: 3; seconds spent: 0.000101"}"#,
        );
        let response = Response::parse(&raw).unwrap();

        assert_eq!(response.status(), ResponseStatus::Other);
        assert_eq!(response.failed(), 3);
        assert!(matches!(
            response.into_result(),
            Err(ResponseError::Unsuccessful { response, .. }) if response == "failed"
        ));
    }

    #[test]
    fn test_status_is_case_sensitive() {
        let raw = framed(
            r#"{"response":"Success","info":"processed: 1; failed: 0; total: 1; seconds spent: 0.000010"}"#,
        );
        assert!(!Response::parse(&raw).unwrap().is_success());
    }

    #[test]
    fn test_header_is_skipped_by_offset() {
        // The declared length is bogus, only the fixed offset matters.
        let mut raw = b"ZBXD\x01\xff\xff\xff\xff\xff\xff\xff\xff".to_vec();
        raw.extend_from_slice(
            br#"{"response":"success","info":"processed: 1; failed: 0; total: 1; seconds spent: 0.5"}"#,
        );
        assert_eq!(Response::parse(&raw).unwrap().total(), 1);
    }

    #[test]
    fn test_missing_response() {
        let raw = framed(r#"{"info":"processed: 1; failed: 0; total: 1; seconds spent: 0.1"}"#);
        let error = Response::parse(&raw).unwrap_err();

        assert!(matches!(error, ResponseError::MissingField("response")));
        assert_eq!(
            error.to_string(),
            "invalid server response, missing `response` field"
        );
    }

    #[test]
    fn test_missing_info() {
        let raw = framed(r#"{"response":"success"}"#);
        let error = Response::parse(&raw).unwrap_err();
        assert!(matches!(error, ResponseError::MissingField("info")));
    }

    #[test]
    fn test_non_string_response_counts_as_missing() {
        let raw = framed(r#"{"response":1,"info":"processed: 1; failed: 0; total: 1; seconds spent: 0.1"}"#);
        assert!(matches!(
            Response::parse(&raw).unwrap_err(),
            ResponseError::MissingField("response")
        ));
    }

    #[test]
    fn test_info_mismatch() {
        let raw = framed(r#"{"response":"success","info":"bad data"}"#);
        let error = Response::parse(&raw).unwrap_err();

        assert!(matches!(&error, ResponseError::InvalidInfo { info } if info == "bad data"));
        assert!(error.to_string().ends_with("didn't match info 'bad data'"));
    }

    #[test]
    fn test_seconds_require_decimal() {
        let raw = framed(
            r#"{"response":"success","info":"processed: 1; failed: 0; total: 1; seconds spent: 1"}"#,
        );
        assert!(matches!(
            Response::parse(&raw).unwrap_err(),
            ResponseError::InvalidInfo { .. }
        ));
    }

    #[test]
    fn test_counter_overflow() {
        let raw = framed(
            r#"{"response":"success","info":"processed: 99999999999999999999999; failed: 0; total: 1; seconds spent: 0.1"}"#,
        );
        assert!(matches!(
            Response::parse(&raw).unwrap_err(),
            ResponseError::InvalidInfo { .. }
        ));
    }

    #[test]
    fn test_invalid_json() {
        let raw = framed("{not json");
        let error = Response::parse(&raw).unwrap_err();

        let ResponseError::InvalidJson { payload, .. } = &error else {
            panic!("expected invalid json, got {error:?}");
        };
        assert_eq!(payload, "{not json");
        assert!(error.to_string().starts_with(r#"can't decode server response "{not json": "#));
    }

    #[test]
    fn test_empty_body() {
        assert!(matches!(
            Response::parse(b"ZBXD\x01").unwrap_err(),
            ResponseError::InvalidJson { .. }
        ));
        assert!(matches!(
            Response::parse(&framed("")).unwrap_err(),
            ResponseError::InvalidJson { .. }
        ));
    }
}
