//! # Node-wide configuration.
//!
//! [`NodeConfig`] centralizes the filesystem layout, permission modes and
//! timing policies shared by all components on a node.
//!
//! Paths are deployment constants: the argument vector handed to managed
//! processes is assembled from them, so changing one is a compatibility break
//! for the managed process.
//!
//! ## Sentinel values
//! - `group = None` → staged binaries keep the current owner group
//! - `bus_capacity = 0` → clamped to 1

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::policies::{BackoffPolicy, RestartPolicy, RetryPolicy};

/// Global configuration for components on a node.
///
/// ## Field semantics
/// - `bin_dir`: where binaries are staged
/// - `data_dir`: root of component data directories and persisted configs
/// - `run_dir`: runtime sockets (container runtime endpoint lives here)
/// - `asset_dir`: source directory the default stager copies binaries from
/// - `volume_plugin_dir`: kubelet volume plugin directory
/// - `bootstrap_kubeconfig` / `auth_kubeconfig`: credential files passed to kubelet
/// - `*_mode`: unix permission bits
/// - `fetch_retry`: retry budget for configuration fetches
/// - `restart` / `backoff`: supervision policies for managed processes
/// - `stop_timeout`: SIGTERM → SIGKILL escalation delay
/// - `bus_capacity`: event bus ring buffer size
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Directory binaries are staged into.
    pub bin_dir: PathBuf,
    /// Root data directory.
    pub data_dir: PathBuf,
    /// Runtime directory (sockets, pid files).
    pub run_dir: PathBuf,
    /// Directory holding the binaries to stage.
    pub asset_dir: PathBuf,
    /// Kubelet volume plugin directory.
    pub volume_plugin_dir: PathBuf,
    /// Kubelet bootstrap kubeconfig.
    pub bootstrap_kubeconfig: PathBuf,
    /// Kubelet authenticated kubeconfig.
    pub auth_kubeconfig: PathBuf,

    /// Mode of `bin_dir` and staged binaries.
    pub bin_dir_mode: u32,
    /// Mode of component data directories.
    pub data_dir_mode: u32,
    /// Mode of the volume plugin directory.
    pub volume_plugin_dir_mode: u32,
    /// Mode of persisted configuration files (may hold credentials).
    pub config_file_mode: u32,
    /// Owner group for staged binaries.
    pub group: Option<String>,

    /// Retry budget for configuration fetches.
    pub fetch_retry: RetryPolicy,
    /// Restart policy for managed processes.
    pub restart: RestartPolicy,
    /// Restart backoff for managed processes.
    pub backoff: BackoffPolicy,
    /// Grace period between SIGTERM and SIGKILL on stop.
    pub stop_timeout: Duration,
    /// Event bus capacity.
    pub bus_capacity: usize,
}

impl NodeConfig {
    /// Relocates every path under `root`, keeping the default layout.
    ///
    /// `rooted("/tmp/x").data_dir == "/tmp/x/var/lib/k0s"`.
    pub fn rooted(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let reroot = |p: PathBuf| match p.strip_prefix("/") {
            Ok(rel) => root.join(rel),
            Err(_) => root.join(p),
        };

        let d = Self::default();
        Self {
            bin_dir: reroot(d.bin_dir),
            data_dir: reroot(d.data_dir),
            run_dir: reroot(d.run_dir),
            asset_dir: reroot(d.asset_dir),
            volume_plugin_dir: reroot(d.volume_plugin_dir),
            bootstrap_kubeconfig: reroot(d.bootstrap_kubeconfig),
            auth_kubeconfig: reroot(d.auth_kubeconfig),
            ..d
        }
    }

    /// Path a staged binary named `name` ends up at.
    #[inline]
    pub fn bin_path(&self, name: &str) -> PathBuf {
        self.bin_dir.join(name)
    }

    /// Container runtime endpoint socket.
    #[inline]
    pub fn containerd_socket(&self) -> PathBuf {
        self.run_dir.join("containerd.sock")
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for NodeConfig {
    /// Standard node layout under `/var/lib/k0s`, `/run/k0s` and `/usr/libexec/k0s`,
    /// with `RestartPolicy::Always` and a 10s stop timeout.
    fn default() -> Self {
        Self {
            bin_dir: PathBuf::from("/var/lib/k0s/bin"),
            data_dir: PathBuf::from("/var/lib/k0s"),
            run_dir: PathBuf::from("/run/k0s"),
            asset_dir: PathBuf::from("/usr/libexec/k0s"),
            volume_plugin_dir: PathBuf::from("/usr/libexec/k0s/kubelet-plugins/volume/exec"),
            bootstrap_kubeconfig: PathBuf::from("/var/lib/k0s/kubelet-bootstrap.conf"),
            auth_kubeconfig: PathBuf::from("/var/lib/k0s/kubelet.conf"),
            bin_dir_mode: 0o755,
            data_dir_mode: 0o755,
            volume_plugin_dir_mode: 0o700,
            config_file_mode: 0o600,
            group: None,
            fetch_retry: RetryPolicy::default(),
            restart: RestartPolicy::Always { interval: None },
            backoff: BackoffPolicy::default(),
            stop_timeout: Duration::from_secs(10),
            bus_capacity: 1024,
        }
    }
}
