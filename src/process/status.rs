//! # Lock-free process status probe.
//!
//! [`ProcessStatus`] is shared between the supervision actor (single writer) and
//! any number of readers such as a component's `healthy` check. All fields are
//! atomics, so reading never blocks and never observes a torn value per field.

use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

/// Observable phase of a supervised process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ProcessState {
    /// Supervision not started.
    Idle = 0,
    /// About to spawn the process.
    Starting = 1,
    /// Process is running.
    Running = 2,
    /// Waiting before the next start.
    Backoff = 3,
    /// Process exited, restart decision pending.
    Exited = 4,
    /// Supervision stopped on request.
    Stopped = 5,
    /// Restart policy forbids another start.
    Exhausted = 6,
}

impl ProcessState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => ProcessState::Starting,
            2 => ProcessState::Running,
            3 => ProcessState::Backoff,
            4 => ProcessState::Exited,
            5 => ProcessState::Stopped,
            6 => ProcessState::Exhausted,
            _ => ProcessState::Idle,
        }
    }

    /// Short stable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Idle => "idle",
            ProcessState::Starting => "starting",
            ProcessState::Running => "running",
            ProcessState::Backoff => "backoff",
            ProcessState::Exited => "exited",
            ProcessState::Stopped => "stopped",
            ProcessState::Exhausted => "exhausted",
        }
    }
}

/// Atomic snapshot cells for one supervised process.
#[derive(Debug)]
pub struct ProcessStatus {
    state: AtomicU8,
    pid: AtomicU32,
    restarts: AtomicU32,
}

impl Default for ProcessStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessStatus {
    /// Creates an `Idle` status.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ProcessState::Idle as u8),
            pid: AtomicU32::new(0),
            restarts: AtomicU32::new(0),
        }
    }

    /// Current phase.
    pub fn state(&self) -> ProcessState {
        ProcessState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Pid of the running process, if any.
    pub fn pid(&self) -> Option<u32> {
        match self.pid.load(Ordering::Acquire) {
            0 => None,
            pid => Some(pid),
        }
    }

    /// Number of restarts performed so far.
    pub fn restarts(&self) -> u32 {
        self.restarts.load(Ordering::Acquire)
    }

    pub(crate) fn set_state(&self, state: ProcessState) {
        if state != ProcessState::Running {
            self.pid.store(0, Ordering::Release);
        }
        self.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn set_running(&self, pid: u32) {
        self.pid.store(pid, Ordering::Release);
        self.state.store(ProcessState::Running as u8, Ordering::Release);
    }

    pub(crate) fn record_restart(&self) {
        self.restarts.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_cleared_when_leaving_running() {
        let status = ProcessStatus::new();
        assert_eq!(status.state(), ProcessState::Idle);
        assert_eq!(status.pid(), None);

        status.set_running(4242);
        assert_eq!(status.state(), ProcessState::Running);
        assert_eq!(status.pid(), Some(4242));

        status.set_state(ProcessState::Exited);
        assert_eq!(status.pid(), None);
        assert_eq!(status.state().as_str(), "exited");
    }

    #[test]
    fn test_restart_counter() {
        let status = ProcessStatus::new();
        status.record_restart();
        status.record_restart();
        assert_eq!(status.restarts(), 2);
    }
}
