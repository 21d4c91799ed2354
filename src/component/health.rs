//! # Health verdicts.

use std::fmt;

/// Answer of [`Component::healthy`](crate::Component::healthy).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Health {
    /// Not expected to be running (before `run`, after `stop`).
    NotRunning,
    /// Supervision requested; the process is starting or waiting to restart.
    Starting,
    /// The managed process is running.
    Healthy,
    /// Lifecycle failed or supervision gave up.
    Unhealthy {
        /// Human-readable cause.
        reason: String,
    },
}

impl Health {
    /// Returns `true` only for [`Health::Healthy`].
    pub fn is_healthy(&self) -> bool {
        matches!(self, Health::Healthy)
    }

    /// Builds an [`Health::Unhealthy`] verdict.
    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Health::Unhealthy {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Health::NotRunning => f.write_str("not running"),
            Health::Starting => f.write_str("starting"),
            Health::Healthy => f.write_str("healthy"),
            Health::Unhealthy { reason } => write!(f, "unhealthy: {reason}"),
        }
    }
}
