//! # nodevisor
//!
//! **Nodevisor** manages node-level components that wrap an external binary
//! (the kubelet first of all): it stages the binary, provisions its
//! directories, fetches and persists its configuration, and hands the process
//! to a supervisor that restarts it when it exits.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                  orchestrator
//!        init() / run() / stop() / healthy()
//!                       │
//!                       ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Kubelet (Component)                                          │
//! │  - Stage           (binary → bin_dir)                         │
//! │  - Provision       (data dirs with modes)                     │
//! │  - ConfigFetcher   (retry → atomic write of kubelet-config)   │
//! │  - SupervisorFactory → Box<dyn Supervise>                     │
//! │  - Logger          (injected, TracingLogger by default)       │
//! └──────┬──────────────────────────────────────────────┬─────────┘
//!        │ supervise()                                  │ publishes
//!        ▼                                              │ ComponentInitialized,
//! ┌────────────────────────────┐                        │ ConfigFetchFailed, ...
//! │  ProcessSupervisor         │                        │
//! │  └─► ProcessActor (task)   │── publishes ───────────┤
//! │       spawn / wait / kill  │   ProcessStarting,     │
//! │       RestartPolicy        │   ProcessExited, ...   │
//! │       BackoffPolicy        │                        │
//! │  ProcessStatus (atomics) ◄─┼── healthy() reads      │
//! └────────────────────────────┘                        ▼
//!                                    ┌────────────────────────────────┐
//!                                    │      Bus (broadcast channel)   │
//!                                    └───────────────┬────────────────┘
//!                                                    ▼
//!                                          SubscriberSet::listen()
//!                                       ┌────────────┼────────────┐
//!                                       ▼            ▼            ▼
//!                                   LogWriter     worker2      workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! Uninitialized ──init──► Initialized ──run──► Running ──stop──► Stopped
//!        └──── any error ──► Failed ◄────────────┘
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Components**    | Lifecycle contract and the kubelet implementation.       | [`Component`], [`Kubelet`], [`Health`]      |
//! | **Supervision**   | Restart an OS process, stop it with SIGTERM → SIGKILL.   | [`ProcessSupervisor`], [`Supervise`]        |
//! | **Policies**      | Restart, backoff and bounded retry.                      | [`RestartPolicy`], [`BackoffPolicy`], [`retry`] |
//! | **Collaborators** | Staging, provisioning and config fetching seams.         | [`Stage`], [`Provision`], [`ConfigFetcher`] |
//! | **Subscriber API**| Hook into lifecycle events.                              | [`Subscribe`], [`SubscriberSet`]            |
//! | **Logging**       | Injected logger and syslog severity shim.                | [`Logger`], [`SyslogAdapter`]               |
//! | **Errors**        | Typed errors with stable labels.                         | [`ComponentError`], [`SupervisorError`]     |
//! | **Configuration** | Node layout, modes and policies.                         | [`NodeConfig`]                              |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use nodevisor::{
//!     Component, FetchError, FetcherFn, Kubelet, LogWriter, NodeConfig, Subscribe, SubscriberSet,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = FetcherFn::arc(|_profile: String| async move {
//!         Ok::<_, FetchError>("kind: KubeletConfiguration\n".to_string())
//!     });
//!
//!     let kubelet = Kubelet::builder_with("default", fetcher)
//!         .with_config(NodeConfig::default())
//!         .build();
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let set = Arc::new(SubscriberSet::new(subs, kubelet.bus().clone()));
//!     let _listener = set.listen();
//!
//!     kubelet.init().await?;
//!     kubelet.run().await?;
//!     println!("kubelet: {}", kubelet.healthy());
//!     kubelet.stop().await?;
//!     Ok(())
//! }
//! ```

mod component;
mod config;
mod error;
mod events;
mod fetcher;
mod logging;
mod policies;
mod process;
mod staging;
mod subscribers;

// ---- Public re-exports ----

pub use component::{Component, Health, Kubelet, KubeletBuilder, LifecycleState};
pub use config::NodeConfig;
pub use error::{ComponentError, FetchError, ProvisionError, StageError, SupervisorError};
pub use events::{BackoffSource, Bus, Event, EventKind};
pub use fetcher::{ConfigFetcher, FetcherFn, FetcherRef, FileFetcher};
pub use logging::{Logger, LoggerRef, SyslogAdapter, SyslogWriter, TracingLogger};
pub use policies::{
    BackoffPolicy, JitterPolicy, RestartPolicy, RetryExhausted, RetryPolicy, retry, retry_if,
};
pub use process::{
    ProcessSpec, ProcessState, ProcessStatus, ProcessSupervisor, ProcessSupervisorFactory,
    Supervise, SupervisorFactory,
};
pub use staging::{AssetStager, FsProvisioner, Provision, Stage};
pub use subscribers::{LogWriter, SubscriberSet, Subscribe};
