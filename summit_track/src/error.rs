use std::fmt;

/// Failures reported by a position provider.
///
/// Only `UnsupportedCapability` stops tracking from starting, the rest fail a
/// single read attempt and the subscription carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    UnsupportedCapability(String),
    ReadTimeout,
    SignalLost,
    PermissionDenied(String),
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionError::UnsupportedCapability(reason) => write!(f, "positioning is not supported: {reason}"),
            PositionError::ReadTimeout => write!(f, "no position fix within the read timeout"),
            PositionError::SignalLost => write!(f, "position signal lost"),
            PositionError::PermissionDenied(reason) => write!(f, "permission denied: {reason}"),
        }
    }
}

impl std::error::Error for PositionError {}

/// The advisory request failed or came back unusable.
#[derive(Debug)]
pub enum AdvisoryError {
    Request(String),
    Status(u16),
    Malformed(String),
}

impl fmt::Display for AdvisoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdvisoryError::Request(err) => write!(f, "advisory request failed: {err}"),
            AdvisoryError::Status(status) => write!(f, "advisory service answered with status {status}"),
            AdvisoryError::Malformed(err) => write!(f, "malformed advisory response: {err}"),
        }
    }
}

impl std::error::Error for AdvisoryError {}

impl From<reqwest::Error> for AdvisoryError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AdvisoryError::Status(status.as_u16()),
            None => AdvisoryError::Request(err.to_string()),
        }
    }
}
