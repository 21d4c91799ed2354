//! # LogWriter: renders events through `tracing`.
//!
//! Failures go out at `warn`/`error`, progress at `info`, chatty process
//! transitions at `debug`. Every record carries `seq` and `subject` fields.
//!
//! ```text
//! INFO  seq=3 subject="kubelet" path="/var/lib/k0s/kubelet-config.yaml" config persisted
//! WARN  seq=9 subject="kubelet" attempt=2 exit_code=Some(1) process failed
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let seq = e.seq;
        let subject = e.subject.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::SubscriberPanicked => {
                error!(seq, subject, reason, "subscriber panicked");
            }
            EventKind::SubscriberOverflow => {
                warn!(seq, subject, reason, "subscriber dropped event");
            }
            EventKind::ComponentInitialized => {
                info!(seq, subject, path = e.path.as_deref(), "component initialized");
            }
            EventKind::ConfigFetchFailed => {
                warn!(seq, subject, attempt = e.attempt, delay_ms = e.delay_ms, reason, "config fetch failed");
            }
            EventKind::ConfigPersisted => {
                info!(seq, subject, path = e.path.as_deref(), "config persisted");
            }
            EventKind::SupervisionRequested => {
                info!(seq, subject, "supervision requested");
            }
            EventKind::ComponentStopped => {
                info!(seq, subject, "component stopped");
            }
            EventKind::ComponentFailed => {
                error!(seq, subject, reason, "component failed");
            }
            EventKind::ProcessStarting => {
                debug!(seq, subject, attempt = e.attempt, "process starting");
            }
            EventKind::ProcessStarted => {
                info!(seq, subject, attempt = e.attempt, pid = e.pid, "process started");
            }
            EventKind::ProcessExited => {
                info!(seq, subject, pid = e.pid, exit_code = e.exit_code, "process exited");
            }
            EventKind::ProcessFailed => {
                warn!(seq, subject, attempt = e.attempt, exit_code = e.exit_code, reason, "process failed");
            }
            EventKind::BackoffScheduled => {
                debug!(seq, subject, attempt = e.attempt, delay_ms = e.delay_ms, source = ?e.backoff_source, "restart scheduled");
            }
            EventKind::StopRequested => {
                info!(seq, subject, "stop requested");
            }
            EventKind::ProcessStopped => {
                info!(seq, subject, pid = e.pid, reason, "process stopped");
            }
            EventKind::ProcessExhausted => {
                warn!(seq, subject, attempt = e.attempt, "restart policy exhausted");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
