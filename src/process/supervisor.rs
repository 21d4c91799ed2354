//! # Process supervisor handle.
//!
//! [`Supervise`] is the seam components drive: start supervision without
//! blocking, stop it, and read a lock-free [`ProcessStatus`]. [`ProcessSupervisor`]
//! is the tokio implementation; it owns one [`ProcessActor`](super::actor) task.
//!
//! ```text
//! supervise() ──► tokio::spawn(ProcessActor::run(token))
//!                          │
//! stop() ──► token.cancel()│──► SIGTERM ─(stop_timeout)→ SIGKILL
//!        └─► join actor (stop_timeout + margin)
//!              ├─ Ok        → Ok(())
//!              ├─ panicked  → SupervisorError::ActorPanicked
//!              └─ elapsed   → abort actor, SupervisorError::StopTimeout
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use nodevisor::{Bus, ProcessSpec, ProcessSupervisor, RestartPolicy, Supervise};
//!
//! # async fn demo() -> Result<(), nodevisor::SupervisorError> {
//! let spec = ProcessSpec::new("sleeper", "/bin/sleep").arg("30");
//! let mut sup = ProcessSupervisor::new(spec, Bus::default())
//!     .with_restart(RestartPolicy::OnFailure)
//!     .with_stop_timeout(Duration::from_secs(5));
//!
//! sup.supervise();
//! // ...
//! sup.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::actor::{ProcessActor, ProcessActorParams};
use super::spec::ProcessSpec;
use super::status::ProcessStatus;
use crate::config::NodeConfig;
use crate::error::SupervisorError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::{BackoffPolicy, RestartPolicy};

/// Extra time granted to the actor on top of `stop_timeout` to reap the child.
const STOP_MARGIN: Duration = Duration::from_secs(2);

/// Handle to a supervised process.
#[async_trait]
pub trait Supervise: Send + Sync {
    /// Name of the supervised process.
    fn name(&self) -> &str;

    /// Starts supervision in the background. Calling it again while supervision
    /// is active has no effect.
    fn supervise(&mut self);

    /// Stops supervision and the process. Stopping twice, or before
    /// [`supervise`](Self::supervise), returns `Ok(())`.
    async fn stop(&mut self) -> Result<(), SupervisorError>;

    /// Lock-free status probe, shared with the supervision task.
    fn status(&self) -> Arc<ProcessStatus>;
}

/// Builds supervisors from process descriptors.
pub trait SupervisorFactory: Send + Sync {
    /// Returns an idle supervisor for `spec`.
    fn build(&self, spec: ProcessSpec) -> Box<dyn Supervise>;
}

struct Running {
    token: CancellationToken,
    join: JoinHandle<()>,
}

/// Tokio-backed [`Supervise`] implementation.
pub struct ProcessSupervisor {
    spec: ProcessSpec,
    params: ProcessActorParams,
    bus: Bus,
    status: Arc<ProcessStatus>,
    running: Option<Running>,
}

impl ProcessSupervisor {
    /// Creates a supervisor with `RestartPolicy::default()`, `BackoffPolicy::default()`
    /// and a 10s stop timeout.
    pub fn new(spec: ProcessSpec, bus: Bus) -> Self {
        Self {
            spec,
            params: ProcessActorParams {
                restart: RestartPolicy::default(),
                backoff: BackoffPolicy::default(),
                stop_timeout: Duration::from_secs(10),
            },
            bus,
            status: Arc::new(ProcessStatus::new()),
            running: None,
        }
    }

    /// Sets the restart policy.
    pub fn with_restart(mut self, restart: RestartPolicy) -> Self {
        self.params.restart = restart;
        self
    }

    /// Sets the failure backoff.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.params.backoff = backoff;
        self
    }

    /// Sets the SIGTERM → SIGKILL grace period.
    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.params.stop_timeout = stop_timeout;
        self
    }

    /// Descriptor of the supervised process.
    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    /// Returns `true` while the supervision task is alive.
    pub fn is_active(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.join.is_finished())
    }
}

#[async_trait]
impl Supervise for ProcessSupervisor {
    fn name(&self) -> &str {
        self.spec.name()
    }

    fn supervise(&mut self) {
        if self.is_active() {
            return;
        }
        let token = CancellationToken::new();
        let actor = ProcessActor::new(
            self.spec.clone(),
            self.params,
            self.bus.clone(),
            self.status.clone(),
        );
        tracing::debug!(process = self.spec.name(), "supervision started");
        let join = tokio::spawn(actor.run(token.clone()));
        self.running = Some(Running { token, join });
    }

    async fn stop(&mut self) -> Result<(), SupervisorError> {
        let Some(Running { token, mut join }) = self.running.take() else {
            return Ok(());
        };

        self.bus
            .publish(Event::new(EventKind::StopRequested).with_subject(self.spec.name()));
        token.cancel();

        let deadline = self.params.stop_timeout + STOP_MARGIN;
        match tokio::time::timeout(deadline, &mut join).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SupervisorError::ActorPanicked {
                name: self.spec.name().to_string(),
                reason: e.to_string(),
            }),
            Err(_elapsed) => {
                join.abort();
                Err(SupervisorError::StopTimeout {
                    name: self.spec.name().to_string(),
                    timeout: deadline,
                })
            }
        }
    }

    fn status(&self) -> Arc<ProcessStatus> {
        self.status.clone()
    }
}

/// Builds [`ProcessSupervisor`]s sharing one set of policies and one bus.
#[derive(Clone, Debug)]
pub struct ProcessSupervisorFactory {
    restart: RestartPolicy,
    backoff: BackoffPolicy,
    stop_timeout: Duration,
    bus: Bus,
}

impl ProcessSupervisorFactory {
    /// Creates a factory with explicit policies.
    pub fn new(restart: RestartPolicy, backoff: BackoffPolicy, stop_timeout: Duration, bus: Bus) -> Self {
        Self {
            restart,
            backoff,
            stop_timeout,
            bus,
        }
    }

    /// Takes `restart`, `backoff` and `stop_timeout` from `cfg`.
    pub fn from_config(cfg: &NodeConfig, bus: Bus) -> Self {
        Self::new(cfg.restart, cfg.backoff, cfg.stop_timeout, bus)
    }
}

impl SupervisorFactory for ProcessSupervisorFactory {
    fn build(&self, spec: ProcessSpec) -> Box<dyn Supervise> {
        Box::new(
            ProcessSupervisor::new(spec, self.bus.clone())
                .with_restart(self.restart)
                .with_backoff(self.backoff)
                .with_stop_timeout(self.stop_timeout),
        )
    }
}
