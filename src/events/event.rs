//! # Lifecycle events emitted by components and process supervisors.
//!
//! The [`EventKind`] enum classifies events across three categories:
//! - **Component events**: lifecycle controller progress (initialized, config fetched/persisted, stopped)
//! - **Process events**: supervised process flow (starting, started, exited, backoff, stopped)
//! - **Subscriber events**: delivery problems inside the fan-out (overflow, panic)
//!
//! The [`Event`] struct carries the metadata: timestamp, subject name, reason,
//! attempt number, pid, exit code and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use nodevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ConfigFetchFailed)
//!     .with_subject("kubelet")
//!     .with_reason("not ready")
//!     .with_attempt(3)
//!     .with_delay(Duration::from_millis(400));
//!
//! assert_eq!(ev.kind, EventKind::ConfigFetchFailed);
//! assert_eq!(ev.subject.as_deref(), Some("kubelet"));
//! assert_eq!(ev.delay_ms, Some(400));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `subject` (subscriber name) and `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `subject` (subscriber name) and `reason`.
    SubscriberOverflow,

    // === Component events ===
    /// Binary staged and directories provisioned.
    ///
    /// Sets `subject` (component name) and `path` (data directory).
    ComponentInitialized,

    /// One configuration fetch attempt failed.
    ///
    /// Sets `subject`, `attempt`, `reason`, and `delay_ms` when another attempt follows.
    ConfigFetchFailed,

    /// Configuration written to disk.
    ///
    /// Sets `subject` and `path` (config file).
    ConfigPersisted,

    /// Process descriptor handed to the supervisor.
    ///
    /// Sets `subject`.
    SupervisionRequested,

    /// Component stopped its supervisor cleanly.
    ///
    /// Sets `subject`.
    ComponentStopped,

    /// A lifecycle operation failed.
    ///
    /// Sets `subject` and `reason` (error label and message).
    ComponentFailed,

    // === Process events ===
    /// Supervisor is about to spawn the process.
    ///
    /// Sets `subject` (process name) and `attempt` (1-based, monotonic).
    ProcessStarting,

    /// Process spawned.
    ///
    /// Sets `subject`, `attempt` and `pid`.
    ProcessStarted,

    /// Process exited on its own.
    ///
    /// Sets `subject`, `attempt`, `pid`, and `exit_code` when the OS reports one.
    ProcessExited,

    /// Process could not be spawned or exited unsuccessfully.
    ///
    /// Sets `subject`, `attempt` and `reason`.
    ProcessFailed,

    /// Next start scheduled.
    ///
    /// Sets `subject`, `attempt` (previous attempt), `delay_ms` and `backoff_source`.
    BackoffScheduled,

    /// Stop requested for a supervised process.
    ///
    /// Sets `subject`.
    StopRequested,

    /// Process terminated by the supervisor during stop.
    ///
    /// Sets `subject`, `pid`, and `reason` when SIGKILL was needed.
    ProcessStopped,

    /// Restart policy forbids another start; supervision ended.
    ///
    /// Sets `subject` and `attempt`.
    ProcessExhausted,
}

impl EventKind {
    /// Returns `true` for kinds that report a failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EventKind::SubscriberPanicked
                | EventKind::SubscriberOverflow
                | EventKind::ConfigFetchFailed
                | EventKind::ComponentFailed
                | EventKind::ProcessFailed
                | EventKind::ProcessExhausted
        )
    }
}

/// Reason for scheduling the next start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffSource {
    /// Previous run exited cleanly (`RestartPolicy::Always` interval).
    Success,
    /// Previous run failed.
    Failure,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Component, process or subscriber name.
    pub subject: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Filesystem path related to the event.
    pub path: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// OS process id.
    pub pid: Option<u32>,
    /// Exit code of a finished process.
    pub exit_code: Option<i32>,
    /// Delay before next attempt in milliseconds.
    pub delay_ms: Option<u32>,
    /// Source for backoff scheduling (success vs failure).
    pub backoff_source: Option<BackoffSource>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            subject: None,
            reason: None,
            path: None,
            attempt: None,
            pid: None,
            exit_code: None,
            delay_ms: None,
            backoff_source: None,
        }
    }

    /// Attaches the subject name.
    #[inline]
    pub fn with_subject(mut self, name: impl Into<Arc<str>>) -> Self {
        self.subject = Some(name.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a filesystem path (lossy UTF-8).
    #[inline]
    pub fn with_path(mut self, path: &std::path::Path) -> Self {
        self.path = Some(path.to_string_lossy().into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches an OS process id.
    #[inline]
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Attaches an exit code.
    #[inline]
    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    /// Attaches a backoff delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(u32::try_from(d.as_millis()).unwrap_or(u32::MAX));
        self
    }

    /// Marks the source of a scheduled backoff.
    #[inline]
    pub fn with_backoff_source(mut self, source: BackoffSource) -> Self {
        self.backoff_source = Some(source);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_subject(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_subject(subscriber)
            .with_reason(info)
    }

    /// Returns the delay as a [`Duration`], if set.
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(|ms| Duration::from_millis(u64::from(ms)))
    }
}
