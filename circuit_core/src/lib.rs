//! Circuit Core - path following and placement for racing circuits
//!
//! This library turns authored sample points into closed racing lines and
//! drives cars along them:
//! 1. **Curve**: closed centripetal Catmull-Rom spline with arc-length parametrization
//! 2. **Path**: progress remapping (start offset + inverted direction) and look-at placement
//! 3. **Car**: per-frame progress update, lap wrap-around and race state
//!
//! Rendering, asset loading and input stay outside: models are anything
//! implementing [`Placeable`], and controls are optional bindings.
//!
//! # Example
//!
//! ```ignore
//! use circuit_core::{Car, CarSettings, CircuitConfig, CircuitPath, Transform};
//! use std::sync::Arc;
//!
//! let config = CircuitConfig::default();
//! let path = Arc::new(CircuitPath::load(&ctx, &config.path1, config.scale).await?);
//! let mut car = Car::load(config.car1.clone(), path, Transform::identity(), config.car.clone());
//!
//! car.set_autonomous(true);
//! car.update(1.0 / 60.0);
//! ```

pub mod curve;
pub mod orientation;
pub mod placement;
pub mod circuit_path;
pub mod car;
pub mod camera;
pub mod sky;
pub mod config;
pub mod error;

// Re-export key types for convenience
pub use curve::ClosedCatmullRom;
pub use orientation::look_at;
pub use placement::{Placeable, Transform};
pub use circuit_path::{CircuitPath, DebugLine, PathSource, SamplePoint, BLENDER_SCALE};
pub use car::{Car, CarSettings, CarSpec, CheckboxBinding, DriveMode, LapCallback, SliderBinding};
pub use camera::{follow_target, CameraSettings, FollowCamera};
pub use sky::{SunCycle, SunSettings};
pub use config::CircuitConfig;
pub use error::PathError;
