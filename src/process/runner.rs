//! # Run a single incarnation of a supervised process.
//!
//! Spawns the process once, waits for it to exit or for cancellation, and
//! publishes lifecycle events to the [`Bus`].
//!
//! ## Event flow
//!
//! ```text
//! Spawn error:
//!   spawn() → Err → publish ProcessFailed              → SpawnFailed
//!
//! Exit:
//!   spawn() → ProcessStarted → wait() → ProcessExited  → Exited { success }
//!                                     → ProcessFailed   (non-zero exit)
//!
//! Cancellation:
//!   spawn() → ProcessStarted → cancelled → SIGTERM ─(stop_timeout)→ SIGKILL
//!                                        → publish ProcessStopped → Stopped
//! ```
//!
//! Output lines of the child are forwarded to `tracing` with a `process` field.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use super::spec::ProcessSpec;
use super::status::ProcessStatus;
use crate::events::{Bus, Event, EventKind};

/// Result of one incarnation.
#[derive(Debug)]
pub(crate) enum RunOutcome {
    /// The process could not be spawned.
    SpawnFailed,
    /// The process exited on its own.
    Exited { success: bool },
    /// Cancellation terminated the process.
    Stopped,
}

impl RunOutcome {
    pub(crate) fn succeeded(&self) -> bool {
        matches!(self, RunOutcome::Exited { success: true })
    }
}

/// Spawns `spec` once and supervises it until exit or cancellation of `token`.
pub(crate) async fn run_once(
    spec: &ProcessSpec,
    token: &CancellationToken,
    stop_timeout: Duration,
    attempt: u32,
    bus: &Bus,
    status: &ProcessStatus,
) -> RunOutcome {
    let mut child = match spawn(spec) {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!(process = spec.name(), attempt, error = %e, "spawn failed");
            bus.publish(
                Event::new(EventKind::ProcessFailed)
                    .with_subject(spec.name())
                    .with_attempt(attempt)
                    .with_reason(format!("spawn {}: {e}", spec.bin_path().display())),
            );
            return RunOutcome::SpawnFailed;
        }
    };

    let pid = child.id().unwrap_or(0);
    forward_output(spec.name(), &mut child);
    status.set_running(pid);
    bus.publish(
        Event::new(EventKind::ProcessStarted)
            .with_subject(spec.name())
            .with_attempt(attempt)
            .with_pid(pid),
    );

    select! {
        res = child.wait() => exited(spec.name(), attempt, pid, res, bus),
        _ = token.cancelled() => {
            let killed = terminate(&mut child, pid, stop_timeout).await;
            let mut ev = Event::new(EventKind::ProcessStopped)
                .with_subject(spec.name())
                .with_pid(pid);
            if killed {
                ev = ev.with_reason("sigkill after stop timeout");
            }
            bus.publish(ev);
            RunOutcome::Stopped
        }
    }
}

fn spawn(spec: &ProcessSpec) -> io::Result<Child> {
    let mut cmd = Command::new(spec.bin_path());
    cmd.args(spec.argv())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = spec.working_dir() {
        cmd.current_dir(dir);
    }
    cmd.spawn()
}

fn exited(
    name: &str,
    attempt: u32,
    pid: u32,
    res: io::Result<ExitStatus>,
    bus: &Bus,
) -> RunOutcome {
    match res {
        Ok(status) => {
            bus.publish(
                Event::new(EventKind::ProcessExited)
                    .with_subject(name)
                    .with_attempt(attempt)
                    .with_pid(pid)
                    .with_exit_code(status.code()),
            );
            if !status.success() {
                bus.publish(
                    Event::new(EventKind::ProcessFailed)
                        .with_subject(name)
                        .with_attempt(attempt)
                        .with_reason(format!("exited with {status}")),
                );
            }
            RunOutcome::Exited {
                success: status.success(),
            }
        }
        Err(e) => {
            bus.publish(
                Event::new(EventKind::ProcessFailed)
                    .with_subject(name)
                    .with_attempt(attempt)
                    .with_reason(format!("wait failed: {e}")),
            );
            RunOutcome::Exited { success: false }
        }
    }
}

/// Sends SIGTERM, waits `grace`, then SIGKILL. Returns `true` if SIGKILL was needed.
async fn terminate(child: &mut Child, pid: u32, grace: Duration) -> bool {
    if !send_sigterm(pid) {
        let _ = child.kill().await;
        return true;
    }
    match time::timeout(grace, child.wait()).await {
        Ok(_) => false,
        Err(_elapsed) => {
            tracing::warn!(pid, grace_ms = grace.as_millis() as u64, "process ignored SIGTERM, killing");
            if let Err(e) = child.kill().await {
                tracing::warn!(pid, error = %e, "failed to kill process");
            }
            true
        }
    }
}

#[cfg(unix)]
fn send_sigterm(pid: u32) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw == 0 {
        return false;
    }
    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(pid, error = %e, "failed to send SIGTERM");
            false
        }
    }
}

#[cfg(not(unix))]
fn send_sigterm(_pid: u32) -> bool {
    false
}

fn forward_output(name: &str, child: &mut Child) {
    if let Some(out) = child.stdout.take() {
        tokio::spawn(forward_lines(name.to_string(), "stdout", out));
    }
    if let Some(err) = child.stderr.take() {
        tokio::spawn(forward_lines(name.to_string(), "stderr", err));
    }
}

async fn forward_lines<R>(process: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::info!(process = %process, stream, "{line}");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::process::status::ProcessState;

    fn sh(script: &str) -> ProcessSpec {
        ProcessSpec::new("sh", "/bin/sh").args(["-c", script])
    }

    #[tokio::test]
    async fn test_zero_exit_is_success() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let status = ProcessStatus::new();
        let token = CancellationToken::new();

        let outcome = run_once(&sh("exit 0"), &token, Duration::from_secs(1), 1, &bus, &status).await;
        assert!(outcome.succeeded());

        assert_eq!(rx.recv().await.expect("started").kind, EventKind::ProcessStarted);
        let exited = rx.recv().await.expect("exited");
        assert_eq!(exited.kind, EventKind::ProcessExited);
        assert_eq!(exited.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_failure() {
        let bus = Bus::new(16);
        let status = ProcessStatus::new();
        let token = CancellationToken::new();

        let outcome = run_once(&sh("exit 3"), &token, Duration::from_secs(1), 1, &bus, &status).await;
        assert!(matches!(outcome, RunOutcome::Exited { success: false }));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let status = ProcessStatus::new();
        let token = CancellationToken::new();
        let spec = ProcessSpec::new("ghost", "/nonexistent/nodevisor-binary");

        let outcome = run_once(&spec, &token, Duration::from_secs(1), 1, &bus, &status).await;
        assert!(matches!(outcome, RunOutcome::SpawnFailed));
        assert_eq!(rx.recv().await.expect("failed").kind, EventKind::ProcessFailed);
        assert_eq!(status.state(), ProcessState::Idle);
    }

    #[tokio::test]
    async fn test_cancel_terminates_with_sigterm() {
        let bus = Bus::new(16);
        let status = ProcessStatus::new();
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let outcome = run_once(&sh("sleep 30"), &token, Duration::from_secs(5), 1, &bus, &status).await;
        assert!(matches!(outcome, RunOutcome::Stopped));
    }

    #[tokio::test]
    async fn test_cancel_escalates_to_sigkill() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let status = ProcessStatus::new();
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(200)).await;
            canceller.cancel();
        });

        let spec = sh("trap '' TERM; while true; do sleep 1; done");
        let outcome = run_once(&spec, &token, Duration::from_millis(200), 1, &bus, &status).await;
        assert!(matches!(outcome, RunOutcome::Stopped));

        let _started = rx.recv().await.expect("started");
        let stopped = rx.recv().await.expect("stopped");
        assert_eq!(stopped.kind, EventKind::ProcessStopped);
        assert_eq!(stopped.reason.as_deref(), Some("sigkill after stop timeout"));
    }
}
