//! Circuit Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the circuit engine
//! to run both in **Production** (tokio, real data files) and in the headless
//! **Simulation** harness (virtual clock, in-memory sources).
//!
//! # Core Concept
//!
//! Everything the engine needs from the outside world goes through
//! [`CircuitContext`]:
//! - Time (`now()`, `sleep()`)
//! - Data (`fetch()`)
//! - Randomness (`random_int()`)
//!
//! By deriving all entropy from a single 64-bit seed, any race becomes
//! reproducible via its seed number.
//!
//! # Example
//!
//! ```ignore
//! use circuit_env::{CircuitContext, DataSource, TokioContext};
//!
//! let ctx = TokioContext::with_root("public");
//! let bytes = ctx.fetch(&DataSource::new("/data/path-1.json")).await?;
//! ```

mod context;
mod types;
mod error;
mod tokio_impl;

pub use context::CircuitContext;
pub use types::DataSource;
pub use error::EnvError;
pub use tokio_impl::TokioContext;
