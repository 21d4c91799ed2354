//! # Injected logging capability.
//!
//! Components log through a [`Logger`] handed to them at construction instead of
//! reaching for a process-wide logger. Production code uses [`TracingLogger`];
//! tests can plug in a recorder.

use std::sync::Arc;

/// Four-level logging sink.
pub trait Logger: Send + Sync {
    /// Debug-level message.
    fn debug(&self, msg: &str);
    /// Info-level message.
    fn info(&self, msg: &str);
    /// Warn-level message.
    fn warn(&self, msg: &str);
    /// Error-level message.
    fn error(&self, msg: &str);
}

/// Shared logger handle.
pub type LoggerRef = Arc<dyn Logger>;

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn debug(&self, msg: &str) {
        (**self).debug(msg);
    }

    fn info(&self, msg: &str) {
        (**self).info(msg);
    }

    fn warn(&self, msg: &str) {
        (**self).warn(msg);
    }

    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
}

/// [`Logger`] backed by the `tracing` macros.
///
/// Every record carries a `component` field.
#[derive(Clone, Debug)]
pub struct TracingLogger {
    component: Arc<str>,
}

impl TracingLogger {
    /// Creates a logger tagging records with `component`.
    pub fn new(component: impl Into<Arc<str>>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Same as [`new`](Self::new), returned as a [`LoggerRef`].
    pub fn arc(component: impl Into<Arc<str>>) -> LoggerRef {
        Arc::new(Self::new(component))
    }
}

impl Logger for TracingLogger {
    fn debug(&self, msg: &str) {
        tracing::debug!(component = %self.component, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!(component = %self.component, "{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(component = %self.component, "{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!(component = %self.component, "{msg}");
    }
}
