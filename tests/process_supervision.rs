#![cfg(unix)]

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::node_config;
use nodevisor::{
    Component, Event, EventKind, FetchError, FetcherFn, Health, Kubelet, LifecycleState, LogWriter,
    NodeConfig, RestartPolicy, Subscribe, SubscriberSet,
};

#[derive(Default)]
struct Recorder {
    kinds: Mutex<Vec<EventKind>>,
}

impl Recorder {
    fn seen(&self, kind: EventKind) -> bool {
        self.kinds.lock().expect("lock").contains(&kind)
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.kinds.lock().expect("lock").push(event.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

fn kubelet(cfg: NodeConfig) -> Kubelet {
    let fetcher = FetcherFn::arc(|_profile: String| async move {
        Ok::<_, FetchError>("kind: KubeletConfiguration\n".to_string())
    });
    Kubelet::builder_with("default", fetcher).with_config(cfg).build()
}

fn stage_script(cfg: &NodeConfig, script: &str) {
    std::fs::write(cfg.asset_dir.join("kubelet"), script).expect("asset");
}

async fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    for _ in 0..300 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_kubelet_runs_and_stops_real_process() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = node_config(tmp.path(), 1);
    let k = kubelet(cfg);

    let recorder = Arc::new(Recorder::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![
        recorder.clone() as Arc<dyn Subscribe>,
        Arc::new(LogWriter::new()) as Arc<dyn Subscribe>,
    ];
    let set = Arc::new(SubscriberSet::new(subs, k.bus().clone()));
    let _listener = set.listen();

    k.init().await.expect("init");
    k.run().await.expect("run");
    assert!(wait_until(|| k.healthy() == Health::Healthy).await, "kubelet never became healthy");

    k.stop().await.expect("stop");
    assert_eq!(k.state(), LifecycleState::Stopped);
    assert_eq!(k.healthy(), Health::NotRunning);

    assert!(wait_until(|| recorder.seen(EventKind::ComponentStopped)).await);
    assert!(recorder.seen(EventKind::ProcessStarted));
    assert!(recorder.seen(EventKind::ProcessStopped));
    assert!(recorder.seen(EventKind::ConfigPersisted));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_crashing_process_is_restarted() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = node_config(tmp.path(), 1);
    stage_script(&cfg, "#!/bin/sh\nexit 1\n");
    let k = kubelet(cfg);
    let mut rx = k.bus().subscribe();

    k.init().await.expect("init");
    k.run().await.expect("run");

    let mut starts = 0;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while starts < 3 {
        let ev = tokio::time::timeout_at(deadline, rx.recv())
            .await
            .expect("restarts in time")
            .expect("bus open");
        if ev.kind == EventKind::ProcessStarting {
            starts += 1;
        }
    }
    assert!(matches!(k.healthy(), Health::Starting | Health::Healthy));

    k.stop().await.expect("stop");
    assert_eq!(k.state(), LifecycleState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_exhausted_process_is_unhealthy() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut cfg = node_config(tmp.path(), 1);
    cfg.restart = RestartPolicy::Never;
    stage_script(&cfg, "#!/bin/sh\nexit 1\n");
    let k = kubelet(cfg);

    k.init().await.expect("init");
    k.run().await.expect("run");

    assert!(wait_until(|| matches!(k.healthy(), Health::Unhealthy { .. })).await);
    assert_eq!(k.state(), LifecycleState::Running);

    k.stop().await.expect("stop after exit");
    assert_eq!(k.state(), LifecycleState::Stopped);
}
