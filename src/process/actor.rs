//! # ProcessActor: restart loop for one OS process.
//!
//! Runs a [`ProcessSpec`] repeatedly according to:
//! - restarts per [`RestartPolicy`],
//! - failure delays per [`BackoffPolicy`],
//! - cooperative cancellation via [`CancellationToken`].
//!
//! ## Architecture
//! ```text
//! loop {
//!   ├─► publish ProcessStarting
//!   ├─► run_once() ──► spawn, wait / cancel
//!   │       ▼
//!   │   SpawnFailed | Exited{success} | Stopped ──► return
//!   │       ▼
//!   ├─► apply RestartPolicy
//!   │     └─► no restart → publish ProcessExhausted, return
//!   └─► delay:
//!        ├─► success: Always { interval }
//!        ├─► failure: backoff.next(consecutive_failures)
//!        ├─► publish BackoffScheduled
//!        └─► sleep (cancellable)
//! }
//! ```
//!
//! ## Rules
//! - Incarnations run **sequentially**, never in parallel
//! - The attempt counter is **monotonic** over the actor's lifetime
//! - The consecutive-failure counter **resets on success**

use std::sync::Arc;
use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use super::runner::{RunOutcome, run_once};
use super::spec::ProcessSpec;
use super::status::{ProcessState, ProcessStatus};
use crate::events::{BackoffSource, Bus, Event, EventKind};
use crate::policies::{BackoffPolicy, RestartPolicy};

/// Policies applied by a [`ProcessActor`].
#[derive(Clone, Copy, Debug)]
pub(crate) struct ProcessActorParams {
    pub restart: RestartPolicy,
    pub backoff: BackoffPolicy,
    pub stop_timeout: Duration,
}

/// Supervises one [`ProcessSpec`] with restarts, backoff and event publishing.
pub(crate) struct ProcessActor {
    spec: ProcessSpec,
    params: ProcessActorParams,
    bus: Bus,
    status: Arc<ProcessStatus>,
}

impl ProcessActor {
    pub(crate) fn new(
        spec: ProcessSpec,
        params: ProcessActorParams,
        bus: Bus,
        status: Arc<ProcessStatus>,
    ) -> Self {
        Self {
            spec,
            params,
            bus,
            status,
        }
    }

    /// Runs until the restart policy gives up or `token` is cancelled.
    pub(crate) async fn run(self, token: CancellationToken) {
        let name = self.spec.name();
        let mut attempt: u32 = 0;
        let mut failures: u32 = 0;

        loop {
            if token.is_cancelled() {
                self.status.set_state(ProcessState::Stopped);
                return;
            }

            attempt = attempt.saturating_add(1);
            self.status.set_state(ProcessState::Starting);
            self.bus.publish(
                Event::new(EventKind::ProcessStarting)
                    .with_subject(name)
                    .with_attempt(attempt),
            );

            let outcome = run_once(
                &self.spec,
                &token,
                self.params.stop_timeout,
                attempt,
                &self.bus,
                &self.status,
            )
            .await;

            if matches!(outcome, RunOutcome::Stopped) {
                self.status.set_state(ProcessState::Stopped);
                return;
            }
            self.status.set_state(ProcessState::Exited);

            let succeeded = outcome.succeeded();
            if !self.params.restart.should_restart(succeeded) {
                self.status.set_state(ProcessState::Exhausted);
                self.bus.publish(
                    Event::new(EventKind::ProcessExhausted)
                        .with_subject(name)
                        .with_attempt(attempt),
                );
                return;
            }

            let (delay, source) = if succeeded {
                failures = 0;
                let interval = match self.params.restart {
                    RestartPolicy::Always { interval } => interval,
                    _ => None,
                };
                (interval, BackoffSource::Success)
            } else {
                let d = self.params.backoff.next(failures);
                failures = failures.saturating_add(1);
                (Some(d), BackoffSource::Failure)
            };

            if let Some(delay) = delay.filter(|d| !d.is_zero()) {
                self.status.set_state(ProcessState::Backoff);
                self.bus.publish(
                    Event::new(EventKind::BackoffScheduled)
                        .with_subject(name)
                        .with_attempt(attempt)
                        .with_delay(delay)
                        .with_backoff_source(source),
                );

                let sleep = time::sleep(delay);
                tokio::pin!(sleep);
                select! {
                    _ = &mut sleep => {}
                    _ = token.cancelled() => {
                        self.status.set_state(ProcessState::Stopped);
                        return;
                    }
                }
            }
            self.status.record_restart();
        }
    }
}
