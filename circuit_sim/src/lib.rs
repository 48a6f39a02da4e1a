//! Circuit Sim - headless scene and deterministic scenario harness
//!
//! This crate owns the two-car circuit scene and runs it without a renderer:
//! frames are driven by a virtual clock, race speeds come from a seeded RNG,
//! and path data is served from memory.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     ScenarioRunner                      │
//! │   SimContext (virtual clock + ChaCha8 + data sources)   │
//! │                          │                              │
//! │  ┌───────────────────────▼──────────────────────────┐   │
//! │  │                  CircuitScene                    │   │
//! │  │   Path 1 ── Car 1        Path 2 ── Car 2         │   │
//! │  │        ╲                   ╱                     │   │
//! │  │         lap channel ──► race outcome             │   │
//! │  │   SunCycle              FollowCamera             │   │
//! │  └──────────────────────────────────────────────────┘   │
//! │                          │                              │
//! │              SimExport (JSON) / RerunLogger             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use circuit_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42)
//!     .with_duration(15.0)
//!     .run(ScenarioId::Race)
//!     .await;
//! assert!(result.passed);
//! ```

mod context;
pub mod circuits;
pub mod scene;
pub mod scenarios;
pub mod runner;
pub mod exporter;
pub mod visualizer;

pub use context::SimContext;
pub use scene::{CameraMode, CarSlot, CircuitScene, RaceOutcome, SceneError, SceneEvent};
pub use runner::{ScenarioResult, ScenarioRunner, SimConfig};
pub use exporter::{CarFrame, PathLine, PoseFrame, SimEvent, SimExport, SimFrame};
pub use visualizer::RerunLogger;
