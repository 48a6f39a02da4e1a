//! Common types for the circuit environment abstraction.

use serde::{Deserialize, Serialize};

/// Reference to an external data source (a path or URL-like key).
///
/// The context decides how to resolve it: `TokioContext` treats it as a
/// filesystem path, `SimContext` as a key into its in-memory source map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSource(String);

impl DataSource {
    /// Creates a data source reference.
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }
    
    /// Returns the location string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DataSource {
    fn from(location: &str) -> Self {
        Self::new(location)
    }
}

impl From<String> for DataSource {
    fn from(location: String) -> Self {
        Self(location)
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
