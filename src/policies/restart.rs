//! # Restart policies for supervised processes.
//!
//! [`RestartPolicy`] decides whether the supervisor starts the process again after
//! it exits.
//!
//! ```text
//! Node daemons (kubelet, containerd, ...):
//!   RestartPolicy::Always { interval: None }   → exit of any kind → start again
//!
//! Daemons that may legitimately finish:
//!   RestartPolicy::OnFailure                   → restart only on non-zero exit / spawn error
//!
//! One-shot helpers:
//!   RestartPolicy::Never                       → run once
//! ```
//!
//! Failure-driven restarts always wait for the [`BackoffPolicy`](crate::BackoffPolicy)
//! delay; success-driven restarts under `Always` wait `interval` (if any).

use std::time::Duration;

/// Policy controlling whether a process is restarted after it exits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Never restart.
    Never,
    /// Restart only when the process failed to spawn or exited non-zero.
    #[default]
    OnFailure,
    /// Restart after every exit.
    Always {
        /// Delay before restarting after a clean exit (`None` = immediately).
        interval: Option<Duration>,
    },
}

impl RestartPolicy {
    /// Returns `true` if a process that exited with `succeeded` should start again.
    pub fn should_restart(&self, succeeded: bool) -> bool {
        match self {
            RestartPolicy::Never => false,
            RestartPolicy::OnFailure => !succeeded,
            RestartPolicy::Always { .. } => true,
        }
    }
}
