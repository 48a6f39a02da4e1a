//! Core environment context trait for the circuit engine.

use async_trait::async_trait;
use crate::error::EnvError;
use crate::types::DataSource;
use std::time::Duration;

/// The central interface for Environment Interaction.
///
/// This trait abstracts the "real world" so that paths and cars can be
/// loaded and driven both in production (tokio, real files) and in the
/// headless simulation harness (virtual clock, in-memory sources).
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`, `tokio::fs`, thread RNG
/// - **Simulation**: `SimContext` - virtual clock, `ChaCha8Rng(seed)`, source map
///
/// # Determinism
///
/// For reproducible races, everything that would normally introduce
/// non-determinism (time, randomness, I/O) is controlled by the implementation.
#[async_trait]
pub trait CircuitContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;
    
    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances virtual clock
    async fn sleep(&self, duration: Duration);
    
    /// Fetches the raw bytes behind a data source.
    ///
    /// # Returns
    /// * `Ok(bytes)` - The full contents of the source
    /// * `Err(EnvError::SourceUnreachable)` - The source does not exist
    /// * `Err(EnvError::Io)` - The source exists but could not be read
    ///
    /// No timeout is imposed here; a context may wrap the fetch in one.
    async fn fetch(&self, source: &DataSource) -> Result<Vec<u8>, EnvError>;
    
    /// Draws a uniformly distributed integer in `[low, high]` (inclusive).
    ///
    /// Used for race speeds. In simulation the draw sequence is fixed by the seed.
    fn random_int(&self, low: i64, high: i64) -> i64;
    
    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    /// In simulation, returns the master seed.
    fn seed(&self) -> u64;
}
