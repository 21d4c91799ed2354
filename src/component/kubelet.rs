//! # Kubelet component.
//!
//! Drives the kubelet binary through the [`Component`] lifecycle.
//!
//! ```text
//! init():
//!   stage "kubelet" ──► bin_dir/kubelet (bin_dir_mode, group)
//!   provision data_dir/kubelet (data_dir_mode)
//!   provision volume_plugin_dir (volume_plugin_dir_mode)
//!
//! run():
//!   retry(fetcher.get(profile)) ──► data_dir/kubelet-config.yaml (atomic, config_file_mode)
//!   ProcessSpec { bin_dir/kubelet, argv, dir = data_dir/kubelet }
//!   factory.build(spec).supervise()
//!
//! stop():
//!   supervisor.stop()
//! ```
//!
//! Lifecycle calls serialize on an async mutex. [`healthy`](Component::healthy)
//! only reads an atomic state and a status probe slot, so it never waits for a
//! lifecycle call in flight (including a `run` that is retrying its fetch).
//!
//! ## Example
//! ```rust,no_run
//! use nodevisor::{Component, FileFetcher, Kubelet, NodeConfig};
//!
//! # async fn demo() -> Result<(), nodevisor::ComponentError> {
//! let kubelet = Kubelet::builder("default", FileFetcher::new("/etc/k0s/profiles"))
//!     .with_config(NodeConfig::default())
//!     .build();
//!
//! kubelet.init().await?;
//! kubelet.run().await?;
//! println!("{}", kubelet.healthy());
//! kubelet.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::health::Health;
use super::state::{LifecycleState, StateCell};
use super::Component;
use crate::config::NodeConfig;
use crate::error::{ComponentError, FetchError, StageError};
use crate::events::{Bus, Event, EventKind};
use crate::fetcher::{ConfigFetcher, FetcherRef};
use crate::logging::{LoggerRef, TracingLogger};
use crate::policies::retry_if;
use crate::process::{
    ProcessSpec, ProcessState, ProcessStatus, ProcessSupervisorFactory, Supervise,
    SupervisorFactory,
};
use crate::staging::{AssetStager, FsProvisioner, Provision, Stage};

const NAME: &str = "kubelet";
const CONFIG_FILE: &str = "kubelet-config.yaml";

#[derive(Clone, Debug)]
struct ResolvedPaths {
    binary_path: PathBuf,
    data_dir: PathBuf,
}

#[derive(Default)]
struct Inner {
    paths: Option<ResolvedPaths>,
    supervisor: Option<Box<dyn Supervise>>,
}

/// Lifecycle controller for the kubelet.
pub struct Kubelet {
    profile: String,
    cfg: NodeConfig,
    fetcher: FetcherRef,
    stager: Arc<dyn Stage>,
    provisioner: Arc<dyn Provision>,
    factory: Arc<dyn SupervisorFactory>,
    logger: LoggerRef,
    bus: Bus,

    state: StateCell,
    probe: RwLock<Option<Arc<ProcessStatus>>>,
    failure: RwLock<Option<String>>,
    inner: Mutex<Inner>,
}

/// Builder for [`Kubelet`].
///
/// Unset collaborators default to the filesystem implementations
/// ([`AssetStager`] over `asset_dir`, [`FsProvisioner`]), a
/// [`ProcessSupervisorFactory`] configured from [`NodeConfig`], a
/// [`TracingLogger`] and a fresh [`Bus`].
pub struct KubeletBuilder {
    profile: String,
    fetcher: FetcherRef,
    cfg: NodeConfig,
    stager: Option<Arc<dyn Stage>>,
    provisioner: Option<Arc<dyn Provision>>,
    factory: Option<Arc<dyn SupervisorFactory>>,
    logger: Option<LoggerRef>,
    bus: Option<Bus>,
}

impl KubeletBuilder {
    /// Node configuration (paths, modes, policies).
    pub fn with_config(mut self, cfg: NodeConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Binary stager.
    pub fn with_stager(mut self, stager: Arc<dyn Stage>) -> Self {
        self.stager = Some(stager);
        self
    }

    /// Directory provisioner.
    pub fn with_provisioner(mut self, provisioner: Arc<dyn Provision>) -> Self {
        self.provisioner = Some(provisioner);
        self
    }

    /// Supervisor factory used by `run`.
    pub fn with_supervisor_factory(mut self, factory: Arc<dyn SupervisorFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Logger for lifecycle messages.
    pub fn with_logger(mut self, logger: LoggerRef) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Event bus shared with the supervisor.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builds the component in [`LifecycleState::Uninitialized`].
    pub fn build(self) -> Kubelet {
        let bus = self
            .bus
            .unwrap_or_else(|| Bus::new(self.cfg.bus_capacity_clamped()));
        let stager = self
            .stager
            .unwrap_or_else(|| Arc::new(AssetStager::new(&self.cfg.asset_dir)));
        let provisioner = self
            .provisioner
            .unwrap_or_else(|| Arc::new(FsProvisioner));
        let factory = self.factory.unwrap_or_else(|| {
            Arc::new(ProcessSupervisorFactory::from_config(&self.cfg, bus.clone()))
        });
        let logger = self.logger.unwrap_or_else(|| TracingLogger::arc(NAME));

        Kubelet {
            profile: self.profile,
            cfg: self.cfg,
            fetcher: self.fetcher,
            stager,
            provisioner,
            factory,
            logger,
            bus,
            state: StateCell::new(LifecycleState::Uninitialized),
            probe: RwLock::new(None),
            failure: RwLock::new(None),
            inner: Mutex::new(Inner::default()),
        }
    }
}

impl Kubelet {
    /// Starts building a kubelet that fetches its configuration for `profile`.
    pub fn builder(
        profile: impl Into<String>,
        fetcher: impl ConfigFetcher + 'static,
    ) -> KubeletBuilder {
        Self::builder_with(profile, Arc::new(fetcher))
    }

    /// Like [`builder`](Self::builder) with an already shared fetcher.
    pub fn builder_with(profile: impl Into<String>, fetcher: FetcherRef) -> KubeletBuilder {
        KubeletBuilder {
            profile: profile.into(),
            fetcher,
            cfg: NodeConfig::default(),
            stager: None,
            provisioner: None,
            factory: None,
            logger: None,
            bus: None,
        }
    }

    /// Configuration profile.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Where the fetched configuration is persisted.
    pub fn config_path(&self) -> PathBuf {
        self.cfg.data_dir.join(CONFIG_FILE)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// Event bus this component publishes on.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Staged binary path, once `init` succeeded.
    pub async fn binary_path(&self) -> Option<PathBuf> {
        let inner = self.inner.lock().await;
        inner.paths.as_ref().map(|p| p.binary_path.clone())
    }

    /// Component data directory, once `init` succeeded.
    pub async fn data_dir(&self) -> Option<PathBuf> {
        let inner = self.inner.lock().await;
        inner.paths.as_ref().map(|p| p.data_dir.clone())
    }

    async fn stage_and_provision(&self) -> Result<ResolvedPaths, ComponentError> {
        let stager = self.stager.clone();
        let provisioner = self.provisioner.clone();
        let cfg = self.cfg.clone();

        tokio::task::spawn_blocking(move || -> Result<ResolvedPaths, ComponentError> {
            let binary_path = stager
                .stage(&cfg.bin_dir, NAME, cfg.bin_dir_mode, cfg.group.as_deref())
                .map_err(|source| ComponentError::Stage {
                    binary: NAME.to_string(),
                    source,
                })?;

            let data_dir = cfg.data_dir.join(NAME);
            provision(provisioner.as_ref(), &data_dir, cfg.data_dir_mode)?;
            provision(
                provisioner.as_ref(),
                &cfg.volume_plugin_dir,
                cfg.volume_plugin_dir_mode,
            )?;

            Ok(ResolvedPaths {
                binary_path,
                data_dir,
            })
        })
        .await
        .unwrap_or_else(|e| {
            Err(ComponentError::Stage {
                binary: NAME.to_string(),
                source: StageError::Io(io::Error::other(e.to_string())),
            })
        })
    }

    async fn fetch_once(&self) -> Result<String, FetchError> {
        let doc = self.fetcher.get(&self.profile).await?;
        if doc.trim().is_empty() {
            return Err(FetchError::Empty {
                profile: self.profile.clone(),
            });
        }
        Ok(doc)
    }

    async fn fetch_config(&self) -> Result<String, ComponentError> {
        retry_if(
            &self.cfg.fetch_retry,
            move |_attempt| self.fetch_once(),
            FetchError::is_retryable,
            |attempt, err, next| {
                let mut ev = Event::new(EventKind::ConfigFetchFailed)
                    .with_subject(NAME)
                    .with_attempt(attempt)
                    .with_reason(err.to_string());
                match next {
                    Some(delay) => {
                        self.logger.warn(&format!(
                            "failed to fetch kubelet config for profile {:?} (attempt {attempt}), retrying in {delay:?}: {err}",
                            self.profile
                        ));
                        ev = ev.with_delay(delay);
                    }
                    None => self.logger.warn(&format!(
                        "failed to fetch kubelet config for profile {:?} (attempt {attempt}): {err}",
                        self.profile
                    )),
                }
                self.bus.publish(ev);
            },
        )
        .await
        .map_err(|e| ComponentError::ConfigFetch {
            profile: self.profile.clone(),
            attempts: e.attempts,
            source: e.into_last(),
        })
    }

    async fn persist_config(&self, path: &Path, doc: &str) -> Result<(), ComponentError> {
        write_atomic(path, doc.as_bytes(), self.cfg.config_file_mode)
            .await
            .map_err(|source| ComponentError::Persist {
                path: path.to_path_buf(),
                source,
            })
    }

    fn process_spec(&self, paths: &ResolvedPaths, config_path: &Path) -> ProcessSpec {
        ProcessSpec::new(NAME, &paths.binary_path)
            .args(kubelet_args(&self.cfg, &paths.data_dir, config_path))
            .dir(&paths.data_dir)
    }

    fn fail(&self, err: &ComponentError) {
        self.state.set(LifecycleState::Failed);
        *self.failure.write().unwrap_or_else(PoisonError::into_inner) = Some(err.to_string());
        self.logger.error(&err.to_string());
        self.bus.publish(
            Event::new(EventKind::ComponentFailed)
                .with_subject(NAME)
                .with_reason(format!("{}: {err}", err.as_label())),
        );
    }

    fn set_probe(&self, status: Option<Arc<ProcessStatus>>) {
        *self.probe.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    fn clear_failure(&self) {
        *self.failure.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[async_trait]
impl Component for Kubelet {
    fn name(&self) -> &str {
        NAME
    }

    async fn init(&self) -> Result<(), ComponentError> {
        let mut inner = self.inner.lock().await;

        let paths = match self.stage_and_provision().await {
            Ok(paths) => paths,
            Err(e) if inner.supervisor.is_some() => {
                // The supervised process keeps its previous paths and state.
                self.logger.error(&format!("re-init of running kubelet failed: {e}"));
                return Err(e);
            }
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        self.bus.publish(
            Event::new(EventKind::ComponentInitialized)
                .with_subject(NAME)
                .with_path(&paths.data_dir),
        );
        self.logger.debug(&format!(
            "kubelet staged at {}, data dir {}",
            paths.binary_path.display(),
            paths.data_dir.display()
        ));
        inner.paths = Some(paths);

        if inner.supervisor.is_none() {
            self.clear_failure();
            self.state.set(LifecycleState::Initialized);
        } else if self.state.get() != LifecycleState::Running {
            self.clear_failure();
            self.state.set(LifecycleState::Running);
        }
        Ok(())
    }

    async fn run(&self) -> Result<(), ComponentError> {
        let mut inner = self.inner.lock().await;

        if inner.supervisor.is_some() {
            return Err(ComponentError::AlreadyRunning {
                component: NAME.to_string(),
            });
        }
        let Some(paths) = inner.paths.clone() else {
            return Err(ComponentError::NotInitialized {
                component: NAME.to_string(),
            });
        };

        self.logger.info("Starting kubelet");
        let config_path = self.config_path();

        let doc = match self.fetch_config().await {
            Ok(doc) => doc,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };
        if let Err(e) = self.persist_config(&config_path, &doc).await {
            self.fail(&e);
            return Err(e);
        }
        self.bus.publish(
            Event::new(EventKind::ConfigPersisted)
                .with_subject(NAME)
                .with_path(&config_path),
        );

        let mut supervisor = self.factory.build(self.process_spec(&paths, &config_path));
        supervisor.supervise();
        self.set_probe(Some(supervisor.status()));
        inner.supervisor = Some(supervisor);

        self.clear_failure();
        self.state.set(LifecycleState::Running);
        self.bus
            .publish(Event::new(EventKind::SupervisionRequested).with_subject(NAME));
        Ok(())
    }

    async fn stop(&self) -> Result<(), ComponentError> {
        let mut inner = self.inner.lock().await;

        let Some(mut supervisor) = inner.supervisor.take() else {
            return Ok(());
        };
        self.logger.info("Stopping kubelet");

        let res = supervisor.stop().await;
        self.set_probe(None);
        match res {
            Ok(()) => {
                self.state.set(LifecycleState::Stopped);
                self.bus
                    .publish(Event::new(EventKind::ComponentStopped).with_subject(NAME));
                Ok(())
            }
            Err(source) => {
                let err = ComponentError::Stop {
                    component: NAME.to_string(),
                    source,
                };
                self.fail(&err);
                Err(err)
            }
        }
    }

    fn healthy(&self) -> Health {
        match self.state.get() {
            LifecycleState::Uninitialized
            | LifecycleState::Initialized
            | LifecycleState::Stopped => Health::NotRunning,
            LifecycleState::Failed => {
                let reason = self
                    .failure
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
                    .unwrap_or_else(|| "lifecycle operation failed".to_string());
                Health::Unhealthy { reason }
            }
            LifecycleState::Running => {
                let probe = self
                    .probe
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                match probe.map(|s| s.state()) {
                    None => Health::Starting,
                    Some(ProcessState::Running) => Health::Healthy,
                    Some(
                        ProcessState::Idle
                        | ProcessState::Starting
                        | ProcessState::Backoff
                        | ProcessState::Exited,
                    ) => Health::Starting,
                    Some(ProcessState::Stopped) => Health::NotRunning,
                    Some(ProcessState::Exhausted) => {
                        Health::unhealthy("kubelet exited and will not be restarted")
                    }
                }
            }
        }
    }
}

fn provision(provisioner: &dyn Provision, path: &Path, mode: u32) -> Result<(), ComponentError> {
    provisioner
        .init_directory(path, mode)
        .map_err(|source| ComponentError::Provision {
            path: path.to_path_buf(),
            source,
        })
}

/// Kubelet argument vector. Order and spelling are a deployment contract.
fn kubelet_args(cfg: &NodeConfig, data_dir: &Path, config_path: &Path) -> Vec<String> {
    vec![
        format!("--root-dir={}", data_dir.display()),
        format!("--volume-plugin-dir={}", cfg.volume_plugin_dir.display()),
        "--container-runtime=remote".to_string(),
        format!(
            "--container-runtime-endpoint=unix://{}",
            cfg.containerd_socket().display()
        ),
        format!("--config={}", config_path.display()),
        format!(
            "--bootstrap-kubeconfig={}",
            cfg.bootstrap_kubeconfig.display()
        ),
        format!("--kubeconfig={}", cfg.auth_kubeconfig.display()),
        "--kube-reserved-cgroup=system.slice".to_string(),
        "--runtime-cgroups=/system.slice/containerd.service".to_string(),
        "--kubelet-cgroups=/system.slice/containerd.service".to_string(),
    ]
}

/// Writes `data` to a sibling temp file with `mode`, then renames it over `path`.
///
/// A failed write leaves `path` untouched.
async fn write_atomic(path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    match tokio::fs::remove_file(&tmp).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let res = async {
        let mut opts = tokio::fs::OpenOptions::new();
        opts.write(true).create_new(true);
        #[cfg(unix)]
        opts.mode(mode);

        let mut file = opts.open(&tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        crate::staging::set_mode(&tmp, mode)?;
        tokio::fs::rename(&tmp, path).await
    }
    .await;

    if res.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_exact_order() {
        let cfg = NodeConfig::default();
        let args = kubelet_args(
            &cfg,
            Path::new("/var/lib/k0s/kubelet"),
            Path::new("/var/lib/k0s/kubelet-config.yaml"),
        );
        assert_eq!(
            args,
            vec![
                "--root-dir=/var/lib/k0s/kubelet",
                "--volume-plugin-dir=/usr/libexec/k0s/kubelet-plugins/volume/exec",
                "--container-runtime=remote",
                "--container-runtime-endpoint=unix:///run/k0s/containerd.sock",
                "--config=/var/lib/k0s/kubelet-config.yaml",
                "--bootstrap-kubeconfig=/var/lib/k0s/kubelet-bootstrap.conf",
                "--kubeconfig=/var/lib/k0s/kubelet.conf",
                "--kube-reserved-cgroup=system.slice",
                "--runtime-cgroups=/system.slice/containerd.service",
                "--kubelet-cgroups=/system.slice/containerd.service",
            ]
        );
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_content() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("kubelet-config.yaml");

        write_atomic(&path, b"first: 1\nsecond: 2\n", 0o600).await.expect("first");
        write_atomic(&path, b"x: 1\n", 0o600).await.expect("second");

        assert_eq!(std::fs::read(&path).expect("read"), b"x: 1\n");
        assert!(!tmp.path().join(".kubelet-config.yaml.tmp").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_atomic_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("kubelet-config.yaml");
        std::fs::write(&path, b"old").expect("seed");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).expect("chmod");

        write_atomic(&path, b"new", 0o600).await.expect("write");

        let mode = std::fs::metadata(&path).expect("meta").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[tokio::test]
    async fn test_write_atomic_missing_dir_fails() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("missing/kubelet-config.yaml");
        let err = write_atomic(&path, b"x", 0o600).await.expect_err("no dir");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
