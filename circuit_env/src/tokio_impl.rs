//! Production implementation of CircuitContext using Tokio.

use crate::error::EnvError;
use crate::types::DataSource;
use crate::CircuitContext;
use async_trait::async_trait;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Production context backed by Tokio, the filesystem and OS entropy.
///
/// Data sources are resolved as paths relative to `root`. A leading `/`
/// is treated as "relative to the root", the way a static web server
/// resolves `/data/path-1.json`.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,
    
    /// Directory data sources are resolved against
    root: PathBuf,
}

impl TokioContext {
    /// Creates a new TokioContext resolving sources against the working directory.
    pub fn new() -> Self {
        Self::with_root(".")
    }
    
    /// Creates a context resolving sources against `root`.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            start: Instant::now(),
            root: root.as_ref().to_path_buf(),
        }
    }
    
    /// Resolves a data source to a filesystem path.
    pub fn resolve(&self, source: &DataSource) -> PathBuf {
        self.root.join(source.as_str().trim_start_matches('/'))
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CircuitContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
    
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
    
    async fn fetch(&self, source: &DataSource) -> Result<Vec<u8>, EnvError> {
        let path = self.resolve(source);
        tracing::debug!("Fetching {} from {}", source, path.display());
        
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EnvError::unreachable(source),
            _ => EnvError::io(source, e),
        })
    }
    
    fn random_int(&self, low: i64, high: i64) -> i64 {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        rand::thread_rng().gen_range(low..=high)
    }
    
    fn seed(&self) -> u64 {
        // Production is not seeded
        0
    }
}
