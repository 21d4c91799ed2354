//! # Node components.
//!
//! A [`Component`] is a node-level subsystem driven through a fixed lifecycle by
//! an external orchestrator:
//!
//! ```text
//! init()  ── stage binary, provision directories
//! run()   ── fetch config, persist it, hand the process to a supervisor
//! stop()  ── stop the supervisor
//! healthy() ── non-blocking probe, callable at any time from any task
//! ```
//!
//! [`Kubelet`] is the component managing the node's kubelet.

mod health;
mod kubelet;
mod state;

use async_trait::async_trait;

use crate::error::ComponentError;

pub use health::Health;
pub use kubelet::{Kubelet, KubeletBuilder};
pub use state::LifecycleState;

/// Lifecycle contract of a managed node component.
///
/// Operations take `&self`, so an `Arc<dyn Component>` can be probed with
/// [`healthy`](Self::healthy) while a lifecycle call is in flight.
#[async_trait]
pub trait Component: Send + Sync {
    /// Stable component name.
    fn name(&self) -> &str;

    /// Prepares the component: stages its binary and provisions directories.
    ///
    /// Idempotent.
    async fn init(&self) -> Result<(), ComponentError>;

    /// Starts the component. Returns once supervision is requested; the
    /// process may not be running yet.
    async fn run(&self) -> Result<(), ComponentError>;

    /// Stops the component. A no-op when nothing is running.
    async fn stop(&self) -> Result<(), ComponentError>;

    /// Current health verdict. Never blocks.
    fn healthy(&self) -> Health;
}
