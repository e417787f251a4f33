//! Error types for control and metrics requests.

use blockwatch_types::ErrorKind;
use thiserror::Error;

/// Errors from control-API operations and metrics fetches.
///
/// No operation retries internally; callers decide retry policy.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection refused, DNS failure, or other transport-level failure.
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The server explicitly refused a control command.
    #[error("server rejected the command: HTTP {status}")]
    ServerRejected {
        /// HTTP status code returned by the server.
        status: u16,
    },

    /// Unexpected HTTP status or malformed response body.
    #[error("unexpected control-API response: {0}")]
    Unexpected(String),
}

impl ControlError {
    /// Classify this error for snapshot health fields.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ControlError::Timeout | ControlError::Unreachable(_) => ErrorKind::Transport,
            ControlError::ServerRejected { .. } => ErrorKind::Rejected,
            ControlError::Unexpected(_) => ErrorKind::Protocol,
        }
    }
}

impl From<reqwest::Error> for ControlError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ControlError::Timeout
        } else if err.is_connect() {
            ControlError::Unreachable(err.to_string())
        } else {
            ControlError::Unexpected(err.to_string())
        }
    }
}

/// Malformed metrics exposition text.
///
/// Individual bad lines are skipped; this error is raised only when the
/// input yields no valid samples at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("metrics parse failed: {reason}")]
pub struct ParseError {
    /// Human-readable description of what was wrong with the input.
    pub reason: String,
}

/// Failure of a full metrics collection (fetch then parse).
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The HTTP fetch of the exposition text failed.
    #[error(transparent)]
    Fetch(#[from] ControlError),

    /// The exposition text could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl MetricsError {
    /// Classify this error for snapshot health fields.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetricsError::Fetch(e) => e.kind(),
            MetricsError::Parse(_) => ErrorKind::Parse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_error_kinds() {
        assert_eq!(ControlError::Timeout.kind(), ErrorKind::Transport);
        assert_eq!(
            ControlError::Unreachable("refused".into()).kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            ControlError::ServerRejected { status: 403 }.kind(),
            ErrorKind::Rejected
        );
        assert_eq!(
            ControlError::Unexpected("boom".into()).kind(),
            ErrorKind::Protocol
        );
    }

    #[test]
    fn metrics_error_kinds() {
        let fetch: MetricsError = ControlError::Timeout.into();
        assert_eq!(fetch.kind(), ErrorKind::Transport);

        let parse: MetricsError = ParseError {
            reason: "empty".into(),
        }
        .into();
        assert_eq!(parse.kind(), ErrorKind::Parse);
    }

    #[test]
    fn error_messages() {
        let err = ControlError::ServerRejected { status: 500 };
        assert_eq!(err.to_string(), "server rejected the command: HTTP 500");

        let err = ParseError {
            reason: "empty or fully malformed input".into(),
        };
        assert!(err.to_string().contains("empty or fully malformed"));
    }
}
