//! # Declarative description of a supervised process.

use std::path::{Path, PathBuf};

/// What to run: name, executable, argument vector and working directory.
///
/// ## Example
/// ```rust
/// use nodevisor::ProcessSpec;
///
/// let spec = ProcessSpec::new("kubelet", "/var/lib/k0s/bin/kubelet")
///     .arg("--config=/var/lib/k0s/kubelet-config.yaml")
///     .dir("/var/lib/k0s/kubelet");
///
/// assert_eq!(spec.name(), "kubelet");
/// assert_eq!(spec.argv(), ["--config=/var/lib/k0s/kubelet-config.yaml"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessSpec {
    name: String,
    bin_path: PathBuf,
    args: Vec<String>,
    dir: Option<PathBuf>,
}

impl ProcessSpec {
    /// Creates a spec without arguments or working directory.
    pub fn new(name: impl Into<String>, bin_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            bin_path: bin_path.into(),
            args: Vec::new(),
            dir: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Process name (supervisor identity, log correlation).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Executable path.
    pub fn bin_path(&self) -> &Path {
        &self.bin_path
    }

    /// Argument vector (without `argv[0]`).
    pub fn argv(&self) -> &[String] {
        &self.args
    }

    /// Working directory, if any.
    pub fn working_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Value of the first `--key=value` argument with the given key.
    pub fn flag(&self, key: &str) -> Option<&str> {
        self.args.iter().find_map(|a| {
            a.strip_prefix("--")
                .and_then(|rest| rest.strip_prefix(key))
                .and_then(|rest| rest.strip_prefix('='))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_lookup() {
        let spec = ProcessSpec::new("kubelet", "/bin/kubelet").args([
            "--config=/etc/kubelet.yaml",
            "--kubeconfig=/etc/kubelet.conf",
            "--container-runtime=remote",
        ]);
        assert_eq!(spec.flag("config"), Some("/etc/kubelet.yaml"));
        assert_eq!(spec.flag("kubeconfig"), Some("/etc/kubelet.conf"));
        assert_eq!(spec.flag("container"), None);
        assert_eq!(spec.flag("missing"), None);
    }

    #[test]
    fn test_builder_and_accessors() {
        let spec = ProcessSpec::new("kubelet", "/bin/kubelet")
            .arg("--a=1")
            .args(["--b=2", "--c=3"])
            .dir("/var/lib/k0s/kubelet");

        assert_eq!(spec.bin_path(), Path::new("/bin/kubelet"));
        assert_eq!(spec.argv(), ["--a=1", "--b=2", "--c=3"]);
        assert_eq!(spec.working_dir(), Some(Path::new("/var/lib/k0s/kubelet")));
        assert_eq!(ProcessSpec::new("x", "/bin/x").working_dir(), None);
    }
}
