//! # Syslog-style severity shim.
//!
//! Libraries written against a syslog-like writer (six severities) can log into
//! any four-level [`Logger`] through [`SyslogAdapter`]:
//!
//! ```text
//! debug   ──► debug
//! info    ──► info
//! warning ──► warn
//! err     ──┐
//! crit    ──┼► error
//! emerg   ──┘
//! ```
//!
//! The collapse of `err`/`crit`/`emerg` is intentional: the target has no
//! finer error levels.

use crate::logging::Logger;

/// Syslog-flavoured writer interface.
pub trait SyslogWriter {
    /// Debug-level message.
    fn debug(&self, msg: &str);
    /// Informational message.
    fn info(&self, msg: &str);
    /// Warning condition.
    fn warning(&self, msg: &str);
    /// Error condition.
    fn err(&self, msg: &str);
    /// Critical condition.
    fn crit(&self, msg: &str);
    /// System is unusable.
    fn emerg(&self, msg: &str);
}

/// Forwards [`SyslogWriter`] calls to a [`Logger`].
#[derive(Clone, Debug)]
pub struct SyslogAdapter<L> {
    inner: L,
}

impl<L: Logger> SyslogAdapter<L> {
    /// Wraps `inner`.
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    /// Returns the wrapped logger.
    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L: Logger> SyslogWriter for SyslogAdapter<L> {
    fn debug(&self, msg: &str) {
        self.inner.debug(msg);
    }

    fn info(&self, msg: &str) {
        self.inner.info(msg);
    }

    fn warning(&self, msg: &str) {
        self.inner.warn(msg);
    }

    fn err(&self, msg: &str) {
        self.inner.error(msg);
    }

    fn crit(&self, msg: &str) {
        self.inner.error(msg);
    }

    fn emerg(&self, msg: &str) {
        self.inner.error(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture {
        lines: Mutex<Vec<(&'static str, String)>>,
    }

    impl Capture {
        fn push(&self, level: &'static str, msg: &str) {
            if let Ok(mut lines) = self.lines.lock() {
                lines.push((level, msg.to_string()));
            }
        }
    }

    impl Logger for &Capture {
        fn debug(&self, msg: &str) {
            self.push("debug", msg);
        }
        fn info(&self, msg: &str) {
            self.push("info", msg);
        }
        fn warn(&self, msg: &str) {
            self.push("warn", msg);
        }
        fn error(&self, msg: &str) {
            self.push("error", msg);
        }
    }

    #[test]
    fn test_severity_mapping() {
        let capture = Capture::default();
        let adapter = SyslogAdapter::new(&capture);

        adapter.debug("d");
        adapter.info("i");
        adapter.warning("w");
        adapter.err("e");
        adapter.crit("c");
        adapter.emerg("x");

        let lines = capture.lines.lock().map(|l| l.clone()).unwrap_or_default();
        let levels: Vec<&str> = lines.iter().map(|(level, _)| *level).collect();
        assert_eq!(levels, ["debug", "info", "warn", "error", "error", "error"]);
        assert_eq!(lines[5].1, "x");
    }
}
