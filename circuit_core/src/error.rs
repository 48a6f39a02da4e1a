//! Error types for path construction and loading.

use circuit_env::EnvError;
use thiserror::Error;

/// Errors raised while loading or building a circuit path.
///
/// A failed load leaves no usable path behind; callers abort scene
/// initialization rather than retrying.
#[derive(Debug, Error)]
pub enum PathError {
    /// The data source could not be fetched
    #[error("Failed to fetch path data: {0}")]
    Fetch(#[from] EnvError),
    
    /// The data is not a JSON array of `[x, y, z]` numeric tuples
    #[error("Malformed path data: {0}")]
    Malformed(#[from] serde_json::Error),
    
    /// A closed curve needs at least three points
    #[error("A closed curve needs at least 3 points, got {0}")]
    TooFewPoints(usize),
    
    /// A sample point contains NaN or infinity
    #[error("Non-finite coordinate in sample point {index}")]
    NonFinite { index: usize },
}
