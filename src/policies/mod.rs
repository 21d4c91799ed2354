//! Retry, restart and backoff policies.
//!
//! This module groups the knobs that control **if/when** a process is restarted,
//! **how often** a configuration fetch is retried, and **how long** to wait between
//! attempts.
//!
//! ## Contents
//! - [`RestartPolicy`] when the supervisor restarts a process (never / on-failure / always)
//! - [`BackoffPolicy`] how delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid thundering herd
//! - [`RetryPolicy`] + [`retry`] bounded retry of a fallible async operation
//!
//! ## Quick wiring
//! ```text
//! NodeConfig { fetch_retry, restart, backoff, .. }
//!      ├─► Kubelet::run         uses fetch_retry with retry()
//!      └─► ProcessSupervisor    uses restart to decide continue/exit
//!                               and backoff.next(failures) to schedule the next start
//! ```

mod backoff;
mod jitter;
mod restart;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use restart::RestartPolicy;
pub use retry::{RetryExhausted, RetryPolicy, retry, retry_if};
