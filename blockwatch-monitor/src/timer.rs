//! Client-side disable timer.
//!
//! The filter server does not track how long a disable should last, so the
//! client owns the "when to re-enable" fact while deferring to the server
//! on the binary enabled/disabled fact. This module is pure state; the
//! reconciliation loop feeds it observations and the clock and issues the
//! actual enable command when the deadline expires.

use std::collections::BTreeSet;
use std::time::Duration;

use blockwatch_client::ServerStatus;
use blockwatch_types::BlockingState;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Enabled,
    DisabledIndefinite,
    DisabledTimed { auto_enable_at_ms: u64 },
}

/// State machine tracking whether blocking is disabled and until when.
///
/// Runs for the process lifetime; there is no terminal state. All times are
/// Unix milliseconds supplied by the caller, which keeps transitions
/// deterministic under test.
#[derive(Debug)]
pub struct BlockingTimer {
    mode: Mode,
    disabled_groups: BTreeSet<String>,
}

impl BlockingTimer {
    /// Start out enabled; the first status observation overwrites this.
    pub fn new() -> Self {
        Self {
            mode: Mode::Enabled,
            disabled_groups: BTreeSet::new(),
        }
    }

    /// Reconcile with an authoritative status read.
    ///
    /// The server wins on enabled/disabled and on the group set. A
    /// server-reported remaining time re-arms the deadline; otherwise a
    /// local deadline is carried forward, and with neither the state is
    /// conservatively indefinite (never assume a duration the client did
    /// not set).
    pub fn apply_status(&mut self, status: &ServerStatus, now_ms: u64) {
        if status.enabled {
            if self.mode != Mode::Enabled {
                debug!("server reports blocking enabled, collapsing local timer");
            }
            self.mode = Mode::Enabled;
            self.disabled_groups.clear();
            return;
        }

        self.disabled_groups = status.disabled_groups.clone();
        match status.auto_enable_in_sec {
            Some(sec) if sec > 0 => {
                self.mode = Mode::DisabledTimed {
                    auto_enable_at_ms: now_ms + sec * 1000,
                };
            }
            _ => {
                if !matches!(self.mode, Mode::DisabledTimed { .. }) {
                    self.mode = Mode::DisabledIndefinite;
                }
            }
        }
    }

    /// Record a disable command. Re-arming replaces any existing deadline;
    /// the new group set replaces the old one.
    pub fn disable(
        &mut self,
        groups: BTreeSet<String>,
        duration: Option<Duration>,
        now_ms: u64,
    ) {
        self.disabled_groups = groups;
        self.mode = match duration {
            Some(d) => Mode::DisabledTimed {
                auto_enable_at_ms: now_ms + d.as_millis() as u64,
            },
            None => Mode::DisabledIndefinite,
        };
    }

    /// Record an enable, whether user-initiated or the auto re-enable.
    pub fn enable(&mut self) {
        self.mode = Mode::Enabled;
        self.disabled_groups.clear();
    }

    /// Whether the deadline has passed and an enable command is owed.
    ///
    /// Stays true until the enable actually succeeds, so a missed deadline
    /// is retried on the next successful contact rather than dropped.
    pub fn auto_enable_due(&self, now_ms: u64) -> bool {
        matches!(self.mode, Mode::DisabledTimed { auto_enable_at_ms } if now_ms >= auto_enable_at_ms)
    }

    /// Whether blocking is currently considered enabled.
    pub fn is_enabled(&self) -> bool {
        self.mode == Mode::Enabled
    }

    /// The value-type view published in snapshots.
    pub fn blocking_state(&self) -> BlockingState {
        match self.mode {
            Mode::Enabled => BlockingState::enabled(),
            Mode::DisabledIndefinite => {
                BlockingState::disabled(self.disabled_groups.iter().cloned())
            }
            Mode::DisabledTimed { auto_enable_at_ms } => BlockingState::disabled_until(
                self.disabled_groups.iter().cloned(),
                auto_enable_at_ms,
            ),
        }
    }
}

impl Default for BlockingTimer {
    fn default() -> Self {
        Self::new()
    }
}
