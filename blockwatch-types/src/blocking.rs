//! Blocking state - whether the filter server is currently blocking queries.

use alloc::collections::BTreeSet;
use alloc::string::String;

/// The blocking state of the filter server as seen by the client.
///
/// The server is authoritative for `enabled` and `disabled_groups`; the
/// auto-enable deadline is tracked client-side when the server does not
/// report a remaining time itself.
///
/// `auto_enable_at_ms` is `Some` exactly when blocking is disabled *and* the
/// disable was time-bounded. A manually (indefinitely) disabled server has no
/// deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockingState {
    /// Whether blocking is currently active.
    pub enabled: bool,

    /// Groups excluded from blocking while disabled. Empty when enabled.
    pub disabled_groups: BTreeSet<String>,

    /// Unix timestamp in milliseconds at which blocking re-enables itself,
    /// if the disable was time-bounded.
    pub auto_enable_at_ms: Option<u64>,
}

impl BlockingState {
    /// Blocking is active.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            disabled_groups: BTreeSet::new(),
            auto_enable_at_ms: None,
        }
    }

    /// Blocking is disabled with no deadline.
    pub fn disabled<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: false,
            disabled_groups: groups.into_iter().map(Into::into).collect(),
            auto_enable_at_ms: None,
        }
    }

    /// Blocking is disabled until the given deadline.
    pub fn disabled_until<I, S>(groups: I, auto_enable_at_ms: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: false,
            disabled_groups: groups.into_iter().map(Into::into).collect(),
            auto_enable_at_ms: Some(auto_enable_at_ms),
        }
    }

    /// Whether the disable carries an auto-enable deadline.
    pub fn is_timed(&self) -> bool {
        !self.enabled && self.auto_enable_at_ms.is_some()
    }

    /// Remaining time until auto-enable in milliseconds, `None` when enabled
    /// or disabled indefinitely. Saturates at zero once the deadline passed.
    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        match self.auto_enable_at_ms {
            Some(at) if !self.enabled => Some(at.saturating_sub(now_ms)),
            _ => None,
        }
    }
}

impl Default for BlockingState {
    fn default() -> Self {
        Self::enabled()
    }
}
