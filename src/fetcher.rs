//! # Runtime configuration fetchers.
//!
//! A [`ConfigFetcher`] returns the configuration document for a profile. Sources
//! are typically remote and eventually consistent, so callers wrap it in
//! [`retry`](crate::retry).
//!
//! - [`FetcherFn`] wraps a closure `Fn(String) -> Future<Output = Result<String, FetchError>>`
//! - [`FileFetcher`] reads `<dir>/<profile>.yaml`; a missing file reads as "not ready"
//!
//! ## Example
//! ```rust
//! use nodevisor::{ConfigFetcher, FetcherFn, FetchError};
//!
//! let fetcher = FetcherFn::arc(|profile: String| async move {
//!     if profile == "default" {
//!         Ok("clusterDNS: 10.0.0.10\n".to_string())
//!     } else {
//!         Err(FetchError::not_ready("unknown profile"))
//!     }
//! });
//! # let _ = fetcher;
//! ```

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FetchError;

/// Retrieves named configuration documents.
#[async_trait]
pub trait ConfigFetcher: Send + Sync {
    /// Returns the document for `profile`. May fail transiently.
    async fn get(&self, profile: &str) -> Result<String, FetchError>;
}

/// Shared fetcher handle.
pub type FetcherRef = Arc<dyn ConfigFetcher>;

type BoxFetch = Pin<Box<dyn Future<Output = Result<String, FetchError>> + Send>>;

/// Closure-backed fetcher. Each call creates a fresh future.
pub struct FetcherFn<F> {
    f: F,
}

impl<F, Fut> FetcherFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, FetchError>> + Send + 'static,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps `f` and returns a [`FetcherRef`].
    pub fn arc(f: F) -> FetcherRef {
        Arc::new(Self::new(f))
    }

    fn call(&self, profile: &str) -> BoxFetch {
        Box::pin((self.f)(profile.to_string()))
    }
}

#[async_trait]
impl<F, Fut> ConfigFetcher for FetcherFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, FetchError>> + Send + 'static,
{
    async fn get(&self, profile: &str) -> Result<String, FetchError> {
        self.call(profile).await
    }
}

/// Reads `<dir>/<profile>.yaml`.
#[derive(Clone, Debug)]
pub struct FileFetcher {
    dir: PathBuf,
}

impl FileFetcher {
    /// Creates a fetcher reading profiles from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing `profile`.
    pub fn path_for(&self, profile: &str) -> PathBuf {
        self.dir.join(format!("{profile}.yaml"))
    }
}

#[async_trait]
impl ConfigFetcher for FileFetcher {
    async fn get(&self, profile: &str) -> Result<String, FetchError> {
        let path = self.path_for(profile);
        match tokio::fs::read_to_string(&path).await {
            Ok(doc) => Ok(doc),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FetchError::not_ready(format!(
                "{} not found",
                path.display()
            ))),
            Err(e) => Err(FetchError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetcher_fn_passes_profile() {
        let fetcher = FetcherFn::arc(|profile: String| async move { Ok::<_, FetchError>(format!("profile={profile}")) });
        let doc = fetcher.get("worker").await.expect("doc");
        assert_eq!(doc, "profile=worker");
    }

    #[tokio::test]
    async fn test_file_fetcher_reads_profile() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(tmp.path().join("default.yaml"), "clusterDomain: cluster.local\n")
            .expect("write");

        let fetcher = FileFetcher::new(tmp.path());
        let doc = fetcher.get("default").await.expect("doc");
        assert_eq!(doc, "clusterDomain: cluster.local\n");
    }

    #[tokio::test]
    async fn test_file_fetcher_missing_is_not_ready() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let fetcher = FileFetcher::new(tmp.path());
        let err = fetcher.get("default").await.expect_err("missing");
        assert_eq!(err.as_label(), "fetch_not_ready");
        assert!(err.is_retryable());
    }
}
