//! Simulation context implementing CircuitContext for deterministic runs.

use async_trait::async_trait;
use circuit_env::{CircuitContext, DataSource, EnvError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Simulation context backed by deterministic time, RNG and data.
///
/// This implements `CircuitContext` using:
/// - A virtual clock that can be advanced manually
/// - A seeded ChaCha8 RNG, so race speeds repeat for a given seed
/// - An in-memory map of data sources with optional simulated fetch latency
pub struct SimContext {
    /// Master seed for this simulation
    seed: u64,
    
    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<Mutex<u64>>,
    
    /// Deterministic RNG
    rng: Arc<Mutex<ChaCha8Rng>>,
    
    /// Data served by `fetch`
    sources: Arc<Mutex<HashMap<DataSource, Vec<u8>>>>,
    
    /// Virtual time each fetch takes
    fetch_latency: Duration,
}

/// Locks a mutex, recovering the data if a panicking holder poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SimContext {
    /// Creates a new SimContext with the given seed and no data sources.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            virtual_time_ns: Arc::new(Mutex::new(0)),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            sources: Arc::new(Mutex::new(HashMap::new())),
            fetch_latency: Duration::ZERO,
        }
    }
    
    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }
    
    /// Sets how much virtual time each fetch consumes.
    pub fn with_fetch_latency(mut self, latency: Duration) -> Self {
        self.fetch_latency = latency;
        self
    }
    
    /// Registers (or replaces) the bytes served for `source`.
    pub fn insert_source(&self, source: impl Into<DataSource>, bytes: Vec<u8>) {
        lock(&self.sources).insert(source.into(), bytes);
    }
    
    /// Removes a data source, making later fetches fail.
    pub fn remove_source(&self, source: &DataSource) -> Option<Vec<u8>> {
        lock(&self.sources).remove(source)
    }
    
    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        let mut time = lock(&self.virtual_time_ns);
        *time += duration.as_nanos() as u64;
    }
    
    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        *lock(&self.virtual_time_ns)
    }
}

impl Clone for SimContext {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed,
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
            rng: Arc::clone(&self.rng),
            sources: Arc::clone(&self.sources),
            fetch_latency: self.fetch_latency,
        }
    }
}

#[async_trait]
impl CircuitContext for SimContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }
    
    async fn sleep(&self, duration: Duration) {
        // In simulation, sleep advances virtual time
        self.advance_time(duration);
    }
    
    async fn fetch(&self, source: &DataSource) -> Result<Vec<u8>, EnvError> {
        if !self.fetch_latency.is_zero() {
            self.sleep(self.fetch_latency).await;
        }
        
        lock(&self.sources)
            .get(source)
            .cloned()
            .ok_or_else(|| EnvError::unreachable(source))
    }
    
    fn random_int(&self, low: i64, high: i64) -> i64 {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        lock(&self.rng).gen_range(low..=high)
    }
    
    fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_sim_context_time() {
        let ctx = SimContext::new(42);
        assert_eq!(ctx.now(), Duration::ZERO);
        
        ctx.advance_time(Duration::from_secs(1));
        assert_eq!(ctx.now(), Duration::from_secs(1));
        
        ctx.advance_time(Duration::from_millis(500));
        assert_eq!(ctx.now(), Duration::from_millis(1500));
    }
    
    #[test]
    fn test_sim_context_deterministic_random() {
        let ctx1 = SimContext::new(42);
        let ctx2 = SimContext::new(42);
        
        let draws1: Vec<i64> = (0..10).map(|_| ctx1.random_int(45, 75)).collect();
        let draws2: Vec<i64> = (0..10).map(|_| ctx2.random_int(45, 75)).collect();
        
        // Same seed = same speeds
        assert_eq!(draws1, draws2);
        assert!(draws1.iter().all(|v| (45..=75).contains(v)));
    }
    
    #[test]
    fn test_sim_context_seed() {
        let ctx = SimContext::new(12345);
        assert_eq!(ctx.seed(), 12345);
    }
    
    #[test]
    fn test_sim_context_clone_shares_time_and_sources() {
        let ctx1 = SimContext::new(42);
        let ctx2 = ctx1.clone();
        
        ctx1.advance_time(Duration::from_secs(5));
        ctx1.insert_source("/data/a.json", b"[]".to_vec());
        
        // Both should see the same time and data
        assert_eq!(ctx1.now(), ctx2.now());
        assert_eq!(ctx2.remove_source(&DataSource::new("/data/a.json")), Some(b"[]".to_vec()));
    }
    
    #[tokio::test]
    async fn test_sim_context_fetch() {
        let ctx = SimContext::new(1).with_fetch_latency(Duration::from_millis(250));
        ctx.insert_source("/data/a.json", b"[[1,2,3]]".to_vec());
        
        let bytes = ctx.fetch(&DataSource::new("/data/a.json")).await.unwrap();
        assert_eq!(bytes, b"[[1,2,3]]");
        assert_eq!(ctx.now(), Duration::from_millis(250));
        
        let missing = ctx.fetch(&DataSource::new("/data/b.json")).await;
        assert!(matches!(missing, Err(EnvError::SourceUnreachable(_))));
    }
}
