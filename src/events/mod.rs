//! Lifecycle events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Kubelet` (component events), `ProcessSupervisor` actor
//!   (process events), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `SubscriberSet::listen` fans events out to subscribers.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{BackoffSource, Event, EventKind};
