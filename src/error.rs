//! Error types used by components, their collaborators and the process supervisor.
//!
//! This module defines the error enums for every failure-prone step of a
//! component lifecycle:
//!
//! - [`ComponentError`]: errors surfaced by [`Component`](crate::Component) operations.
//! - [`FetchError`]: errors raised by a [`ConfigFetcher`](crate::ConfigFetcher).
//! - [`StageError`]: errors raised while staging a binary.
//! - [`ProvisionError`]: errors raised while provisioning a directory.
//! - [`SupervisorError`]: errors raised while stopping a supervised process.
//!
//! Every enum provides `as_label` (a short stable label for logs/metrics).

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by component lifecycle operations.
///
/// Underlying causes are preserved as [`std::error::Error::source`], so a
/// configuration-fetch failure still reports the last fetch error verbatim.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ComponentError {
    /// Binary staging failed during `init`.
    #[error("failed to stage {binary}: {source}")]
    Stage {
        /// Name of the binary being staged.
        binary: String,
        /// Underlying staging error.
        #[source]
        source: StageError,
    },

    /// Directory provisioning failed during `init`.
    #[error("failed to create {}: {source}", path.display())]
    Provision {
        /// Directory that could not be provisioned.
        path: PathBuf,
        /// Underlying provisioning error.
        #[source]
        source: ProvisionError,
    },

    /// `run` was called before a successful `init`.
    #[error("component {component} is not initialized")]
    NotInitialized {
        /// Component name.
        component: String,
    },

    /// `run` was called while the component already has an active supervisor.
    #[error("component {component} is already running")]
    AlreadyRunning {
        /// Component name.
        component: String,
    },

    /// Configuration could not be fetched within the retry budget.
    #[error("failed to fetch config for profile {profile:?} after {attempts} attempts: {source}")]
    ConfigFetch {
        /// Profile that was requested.
        profile: String,
        /// Number of attempts made.
        attempts: u32,
        /// The error returned by the last attempt.
        #[source]
        source: FetchError,
    },

    /// The fetched configuration could not be written to disk.
    #[error("failed to write config to {}: {source}", path.display())]
    Persist {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The supervisor failed to stop the managed process cleanly.
    #[error("failed to stop {component}: {source}")]
    Stop {
        /// Component name.
        component: String,
        /// Underlying supervisor error.
        #[source]
        source: SupervisorError,
    },
}

impl ComponentError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use nodevisor::ComponentError;
    ///
    /// let err = ComponentError::NotInitialized { component: "kubelet".into() };
    /// assert_eq!(err.as_label(), "component_not_initialized");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ComponentError::Stage { .. } => "component_stage_failed",
            ComponentError::Provision { .. } => "component_provision_failed",
            ComponentError::NotInitialized { .. } => "component_not_initialized",
            ComponentError::AlreadyRunning { .. } => "component_already_running",
            ComponentError::ConfigFetch { .. } => "component_config_fetch_failed",
            ComponentError::Persist { .. } => "component_config_persist_failed",
            ComponentError::Stop { .. } => "component_stop_failed",
        }
    }
}

/// # Errors produced by configuration fetchers.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FetchError {
    /// The remote source is not ready yet (transient).
    #[error("{reason}")]
    NotReady {
        /// Human-readable reason reported by the source.
        reason: String,
    },

    /// The source answered with an empty document.
    #[error("empty config returned for profile {profile:?}")]
    Empty {
        /// Profile that was requested.
        profile: String,
    },

    /// I/O failure while reading the document.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl FetchError {
    /// Shorthand for [`FetchError::NotReady`].
    pub fn not_ready(reason: impl Into<String>) -> Self {
        FetchError::NotReady {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchError::NotReady { .. } => "fetch_not_ready",
            FetchError::Empty { .. } => "fetch_empty",
            FetchError::Io(_) => "fetch_io",
        }
    }

    /// Indicates whether another attempt may succeed.
    ///
    /// Every variant is transient from the caller's perspective; an I/O error
    /// is retryable unless it is a permission problem.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::NotReady { .. } | FetchError::Empty { .. } => true,
            FetchError::Io(e) => e.kind() != io::ErrorKind::PermissionDenied,
        }
    }
}

/// # Errors produced while staging a binary.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StageError {
    /// The asset to install does not exist.
    #[error("asset {} not found", path.display())]
    MissingAsset {
        /// Expected asset location.
        path: PathBuf,
    },

    /// The requested owner group does not exist.
    #[error("unknown group {group:?}")]
    UnknownGroup {
        /// Group name.
        group: String,
    },

    /// Changing ownership of the staged binary failed.
    #[error("chown {} failed: {reason}", path.display())]
    Chown {
        /// Staged file.
        path: PathBuf,
        /// OS error message.
        reason: String,
    },

    /// Generic I/O failure while copying or setting permissions.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl StageError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StageError::MissingAsset { .. } => "stage_missing_asset",
            StageError::UnknownGroup { .. } => "stage_unknown_group",
            StageError::Chown { .. } => "stage_chown_failed",
            StageError::Io(_) => "stage_io",
        }
    }
}

/// # Errors produced while provisioning a directory.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// The path exists but is not a directory.
    #[error("{} exists and is not a directory", path.display())]
    NotADirectory {
        /// Offending path.
        path: PathBuf,
    },

    /// Generic I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ProvisionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProvisionError::NotADirectory { .. } => "provision_not_a_directory",
            ProvisionError::Io(_) => "provision_io",
        }
    }
}

/// # Errors produced by a process supervisor.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The supervision task did not finish within the stop deadline.
    ///
    /// The process may still be alive; the caller decides on follow-up action.
    #[error("supervisor {name} did not stop within {timeout:?}")]
    StopTimeout {
        /// Supervised process name.
        name: String,
        /// Deadline that was exceeded.
        timeout: Duration,
    },

    /// The supervision task panicked.
    #[error("supervisor {name} panicked: {reason}")]
    ActorPanicked {
        /// Supervised process name.
        name: String,
        /// Panic or join error message.
        reason: String,
    },
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use nodevisor::SupervisorError;
    /// use std::time::Duration;
    ///
    /// let err = SupervisorError::StopTimeout { name: "kubelet".into(), timeout: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "supervisor_stop_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::StopTimeout { .. } => "supervisor_stop_timeout",
            SupervisorError::ActorPanicked { .. } => "supervisor_actor_panicked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_config_fetch_keeps_last_cause() {
        let err = ComponentError::ConfigFetch {
            profile: "default".into(),
            attempts: 3,
            source: FetchError::not_ready("not ready"),
        };
        assert!(err.to_string().contains("not ready"));
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("not ready"));
    }

    #[test]
    fn test_fetch_retryable() {
        assert!(FetchError::not_ready("x").is_retryable());
        assert!(FetchError::Empty { profile: "p".into() }.is_retryable());
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(!FetchError::Io(denied).is_retryable());
    }

    #[test]
    fn test_labels_are_stable() {
        let err = ComponentError::AlreadyRunning {
            component: "kubelet".into(),
        };
        assert_eq!(err.as_label(), "component_already_running");
        let err = ProvisionError::NotADirectory {
            path: PathBuf::from("/tmp/x"),
        };
        assert_eq!(err.as_label(), "provision_not_a_directory");
    }
}
