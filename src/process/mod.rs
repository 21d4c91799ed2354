//! Supervision of external OS processes.
//!
//! - [`ProcessSpec`]: what to run
//! - [`Supervise`] / [`SupervisorFactory`]: the seam components drive
//! - [`ProcessSupervisor`]: tokio implementation with restarts, backoff and SIGTERM → SIGKILL stop
//! - [`ProcessStatus`]: lock-free probe shared with the supervision task

mod actor;
mod runner;
mod spec;
mod status;
mod supervisor;

pub use spec::ProcessSpec;
pub use status::{ProcessState, ProcessStatus};
pub use supervisor::{ProcessSupervisor, ProcessSupervisorFactory, Supervise, SupervisorFactory};
