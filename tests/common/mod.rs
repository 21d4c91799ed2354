#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nodevisor::{
    BackoffPolicy, ConfigFetcher, FetchError, Logger, NodeConfig, ProcessSpec, ProcessStatus,
    RetryPolicy, Supervise, SupervisorError, SupervisorFactory,
};

/// Logger that keeps every line as `"<level>: <msg>"`.
#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("lock").clone()
    }

    pub fn count(&self, level: &str) -> usize {
        let prefix = format!("{level}: ");
        self.lines().iter().filter(|l| l.starts_with(&prefix)).count()
    }

    fn push(&self, level: &str, msg: &str) {
        self.lines.lock().expect("lock").push(format!("{level}: {msg}"));
    }
}

impl Logger for RecordingLogger {
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

/// Fetcher returning scripted answers in order; the last answer repeats.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicU32,
}

impl ScriptedFetcher {
    /// `Ok(doc)` answers with `doc`, `Err(reason)` with `FetchError::NotReady`.
    pub fn new(script: Vec<Result<&str, &str>>) -> Arc<Self> {
        let script = script
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        Arc::new(Self {
            script: Mutex::new(script),
            calls: AtomicU32::new(0),
        })
    }

    pub fn always_not_ready(reason: &str) -> Arc<Self> {
        Self::new(vec![Err(reason)])
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigFetcher for ScriptedFetcher {
    async fn get(&self, _profile: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = {
            let mut script = self.script.lock().expect("lock");
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        };
        match answer {
            Some(Ok(doc)) => Ok(doc),
            Some(Err(reason)) => Err(FetchError::not_ready(reason)),
            None => Err(FetchError::not_ready("empty script")),
        }
    }
}

/// Shared view into what a [`MockFactory`] and its supervisors did.
#[derive(Default)]
pub struct MockRecord {
    pub specs: Mutex<Vec<ProcessSpec>>,
    pub supervise_calls: AtomicU32,
    pub stop_calls: AtomicU32,
}

impl MockRecord {
    pub fn built(&self) -> usize {
        self.specs.lock().expect("lock").len()
    }

    pub fn last_spec(&self) -> Option<ProcessSpec> {
        self.specs.lock().expect("lock").last().cloned()
    }
}

/// Factory producing supervisors that only record calls.
pub struct MockFactory {
    pub record: Arc<MockRecord>,
    fail_stop: bool,
    stop_delay: Duration,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Self::with(false, Duration::ZERO)
    }

    pub fn failing_stop() -> Arc<Self> {
        Self::with(true, Duration::ZERO)
    }

    /// Supervisors whose `stop` takes `delay` before succeeding.
    pub fn slow_stop(delay: Duration) -> Arc<Self> {
        Self::with(false, delay)
    }

    fn with(fail_stop: bool, stop_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            record: Arc::new(MockRecord::default()),
            fail_stop,
            stop_delay,
        })
    }
}

impl SupervisorFactory for MockFactory {
    fn build(&self, spec: ProcessSpec) -> Box<dyn Supervise> {
        self.record.specs.lock().expect("lock").push(spec.clone());
        Box::new(MockSupervisor {
            name: spec.name().to_string(),
            record: self.record.clone(),
            status: Arc::new(ProcessStatus::new()),
            fail_stop: self.fail_stop,
            stop_delay: self.stop_delay,
        })
    }
}

struct MockSupervisor {
    name: String,
    record: Arc<MockRecord>,
    status: Arc<ProcessStatus>,
    fail_stop: bool,
    stop_delay: Duration,
}

#[async_trait]
impl Supervise for MockSupervisor {
    fn name(&self) -> &str {
        &self.name
    }

    fn supervise(&mut self) {
        self.record.supervise_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn stop(&mut self) -> Result<(), SupervisorError> {
        self.record.stop_calls.fetch_add(1, Ordering::SeqCst);
        if !self.stop_delay.is_zero() {
            tokio::time::sleep(self.stop_delay).await;
        }
        if self.fail_stop {
            return Err(SupervisorError::StopTimeout {
                name: self.name.clone(),
                timeout: Duration::from_secs(1),
            });
        }
        Ok(())
    }

    fn status(&self) -> Arc<ProcessStatus> {
        self.status.clone()
    }
}

/// Node layout under `root` with a fast retry budget and a staged kubelet asset.
pub fn node_config(root: &Path, attempts: u32) -> NodeConfig {
    let mut cfg = NodeConfig::rooted(root);
    cfg.fetch_retry = RetryPolicy::new(attempts, BackoffPolicy::constant(Duration::from_millis(5)));
    cfg.backoff = BackoffPolicy::constant(Duration::from_millis(20));
    cfg.stop_timeout = Duration::from_secs(2);

    std::fs::create_dir_all(&cfg.asset_dir).expect("asset dir");
    std::fs::write(
        cfg.asset_dir.join("kubelet"),
        "#!/bin/sh\nexec sleep 30\n",
    )
    .expect("asset");
    cfg
}
