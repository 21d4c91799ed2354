//! # Lifecycle state machine.
//!
//! ```text
//! Uninitialized ──init ok──► Initialized ──run ok──► Running ──stop ok──► Stopped
//!       │                        │                      │
//!    init err                 run err                stop err
//!       └──────────► Failed ◄────┴──────────────────────┘
//!
//! Initialized | Stopped | Failed ──init ok──► Initialized
//! Stopped | Failed (paths resolved) ──run──► (fresh run)
//! ```
//!
//! [`StateCell`] stores the state in an atomic so probes never contend with
//! lifecycle operations.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle phase of a component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    /// `init` not called yet.
    Uninitialized = 0,
    /// Binary staged and directories provisioned.
    Initialized = 1,
    /// Supervisor active.
    Running = 2,
    /// Supervisor stopped on request.
    Stopped = 3,
    /// The last lifecycle operation failed.
    Failed = 4,
}

impl LifecycleState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => LifecycleState::Initialized,
            2 => LifecycleState::Running,
            3 => LifecycleState::Stopped,
            4 => LifecycleState::Failed,
            _ => LifecycleState::Uninitialized,
        }
    }

    /// Short stable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Running => "running",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Failed => "failed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic holder of a [`LifecycleState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: LifecycleState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: LifecycleState) {
        self.0.store(state as u8, Ordering::Release);
    }
}
