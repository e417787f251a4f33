//! Snapshot - the published, versioned view of filter-server state.

use crate::{BlockingState, MetricsSnapshot};

/// Coarse error classification carried in snapshot health fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// Connection refused, DNS failure, or timeout on the path to the server.
    Transport,
    /// Unexpected HTTP status or malformed control-API response body.
    Protocol,
    /// Malformed metrics exposition text.
    Parse,
    /// The server explicitly refused a control command.
    Rejected,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Parse => "parse",
            ErrorKind::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Overall health of the monitored connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Health {
    /// Recent polls are succeeding.
    #[default]
    Healthy,
    /// Too many consecutive polls failed; the snapshot may be stale.
    Unavailable,
}

/// A point-in-time view of the filter server, published atomically.
///
/// Consumers only ever observe complete snapshots. The version increases
/// monotonically: a new version is published when underlying facts changed,
/// or on a heartbeat cadence to signal liveness.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Monotonically increasing publish version. Zero before the first poll.
    pub version: u64,

    /// Blocking state reconciled from the server and the local timer.
    pub blocking: BlockingState,

    /// Latest parsed metrics. Stays stale when a metrics fetch fails.
    pub metrics: MetricsSnapshot,

    /// Unix timestamp in milliseconds of the last successful status poll.
    pub last_success_ms: Option<u64>,

    /// Classification of the most recent failure, cleared on success.
    pub last_error: Option<ErrorKind>,

    /// Number of consecutive failed status polls.
    pub consecutive_failures: u32,

    /// Health derived from the consecutive-failure threshold.
    pub health: Health,
}

impl Snapshot {
    /// The placeholder published before the first poll completes.
    pub fn initial() -> Self {
        Self {
            version: 0,
            blocking: BlockingState::enabled(),
            metrics: MetricsSnapshot::new(),
            last_success_ms: None,
            last_error: None,
            consecutive_failures: 0,
            health: Health::Unavailable,
        }
    }

    /// Whether at least one poll has succeeded since startup.
    pub fn is_initialized(&self) -> bool {
        self.last_success_ms.is_some()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_snapshot_is_version_zero_and_unavailable() {
        let snapshot = Snapshot::initial();
        assert_eq!(snapshot.version, 0);
        assert_eq!(snapshot.health, Health::Unavailable);
        assert!(!snapshot.is_initialized());
        assert!(snapshot.metrics.is_empty());
    }

    #[test]
    fn initialized_after_first_success() {
        let mut snapshot = Snapshot::initial();
        snapshot.last_success_ms = Some(1_703_160_000_000);
        assert!(snapshot.is_initialized());
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Transport.to_string(), "transport");
        assert_eq!(ErrorKind::Protocol.to_string(), "protocol");
        assert_eq!(ErrorKind::Parse.to_string(), "parse");
        assert_eq!(ErrorKind::Rejected.to_string(), "rejected");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip() {
        let mut snapshot = Snapshot::initial();
        snapshot.version = 7;
        snapshot.blocking = BlockingState::disabled(["ads"]);
        snapshot.last_error = Some(ErrorKind::Transport);
        snapshot.consecutive_failures = 2;

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, parsed);
    }
}
