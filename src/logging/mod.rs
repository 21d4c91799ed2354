//! Logging capability.
//!
//! - [`Logger`] four-level sink injected into components ([`TracingLogger`] by default)
//! - [`SyslogWriter`] + [`SyslogAdapter`] severity shim for syslog-style callers

mod logger;
mod syslog;

pub use logger::{Logger, LoggerRef, TracingLogger};
pub use syslog::{SyslogAdapter, SyslogWriter};
