//! Built-in synthetic circuits.
//!
//! Sample points are produced in the authoring coordinate system (Z up),
//! exactly like exported path files, so they go through the same load path.

use circuit_core::SamplePoint;
use std::f64::consts::TAU;

/// Shape of a synthetic oval lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OvalSpec {
    /// Number of sample points
    pub samples: usize,
    
    /// Half extent along X
    pub half_length: f64,
    
    /// Half extent along Y
    pub half_width: f64,
    
    /// Amplitude of the height undulation (two crests per lap)
    pub undulation: f64,
}

impl OvalSpec {
    /// Inner lane of the default circuit.
    pub fn inner() -> Self {
        Self {
            samples: 48,
            half_length: 16.0,
            half_width: 8.0,
            undulation: 0.3,
        }
    }
    
    /// Outer lane of the default circuit.
    pub fn outer() -> Self {
        Self {
            half_length: 16.6,
            half_width: 8.6,
            ..Self::inner()
        }
    }
}

/// Samples an undulating ellipse, wound counter-clockwise seen from above.
pub fn oval(spec: OvalSpec) -> Vec<SamplePoint> {
    (0..spec.samples)
        .map(|i| {
            let angle = i as f64 / spec.samples as f64 * TAU;
            [
                spec.half_length * angle.cos(),
                spec.half_width * angle.sin(),
                spec.undulation * (2.0 * angle).sin(),
            ]
        })
        .collect()
}

/// Encodes samples as a path data file (JSON array of `[x, y, z]`).
pub fn to_json(samples: &[SamplePoint]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(samples)
}
