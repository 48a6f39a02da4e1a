//! Day/night sun cycle.
//!
//! The sun is described by an elevation and a rotation (both in degrees).
//! While the cycle runs, both values sweep linearly towards their maxima
//! and back, forever.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Allowed sun elevation in degrees.
pub const ELEVATION_RANGE: (f64, f64) = (10.0, 60.0);

/// Allowed sun rotation in degrees.
pub const ROTATION_RANGE: (f64, f64) = (-180.0, 180.0);

/// Distance of the directional light from the origin.
pub const SUN_LIGHT_DISTANCE: f64 = 400.0;

/// Initial sun placement and cycle length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunSettings {
    pub initial_elevation: f64,
    pub initial_rotation: f64,
    
    /// Duration of one sweep, in minutes
    pub cycle_minutes: f64,
}

impl Default for SunSettings {
    fn default() -> Self {
        Self {
            initial_elevation: 20.0,
            initial_rotation: -150.0,
            cycle_minutes: 3.0,
        }
    }
}

/// Unit direction towards the sun.
///
/// Spherical coordinates with polar angle `90° - elevation` from `+Y` and
/// azimuth `rotation` from `+Z` towards `+X`.
pub fn sun_direction(elevation_deg: f64, rotation_deg: f64) -> Vector3<f64> {
    let phi = (90.0 - elevation_deg).to_radians();
    let theta = rotation_deg.to_radians();
    
    Vector3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos())
}

/// Linear tween that reverses at each end and never stops.
#[derive(Debug, Clone, Copy, PartialEq)]
struct YoyoTween {
    from: f64,
    to: f64,
    duration: f64,
    elapsed: f64,
}

impl YoyoTween {
    fn new(from: f64, to: f64, duration: f64) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: 0.0,
        }
    }
    
    fn advance(&mut self, delta: f64) {
        self.elapsed += delta;
    }
    
    fn value(&self) -> f64 {
        if self.duration <= 0.0 {
            return self.to;
        }
        
        let legs = self.elapsed / self.duration;
        let leg = legs.floor();
        let fraction = legs - leg;
        
        // Even legs run forward, odd legs run back
        if leg as u64 % 2 == 0 {
            self.from + (self.to - self.from) * fraction
        } else {
            self.to - (self.to - self.from) * fraction
        }
    }
}

/// Animated sun position.
#[derive(Debug, Clone, PartialEq)]
pub struct SunCycle {
    elevation: f64,
    rotation: f64,
    
    /// Sweep length in seconds
    cycle_duration: f64,
    
    /// `None` until `start`
    tweens: Option<(YoyoTween, YoyoTween)>,
    
    paused: bool,
}

impl SunCycle {
    /// Creates a stationary sun.
    pub fn new(settings: &SunSettings) -> Self {
        Self {
            elevation: clamp_to(settings.initial_elevation, ELEVATION_RANGE),
            rotation: clamp_to(settings.initial_rotation, ROTATION_RANGE),
            cycle_duration: settings.cycle_minutes * 60.0,
            tweens: None,
            paused: false,
        }
    }
    
    /// Starts sweeping from the current values towards the range maxima.
    pub fn start(&mut self) {
        self.tweens = Some((
            YoyoTween::new(self.elevation, ELEVATION_RANGE.1, self.cycle_duration),
            YoyoTween::new(self.rotation, ROTATION_RANGE.1, self.cycle_duration),
        ));
        self.paused = false;
    }
    
    /// Advances the cycle by `delta` seconds (no-op when paused or not started).
    pub fn advance(&mut self, delta: f64) {
        if self.paused || !delta.is_finite() || delta <= 0.0 {
            return;
        }
        
        if let Some((elevation, rotation)) = self.tweens.as_mut() {
            elevation.advance(delta);
            rotation.advance(delta);
            self.elevation = elevation.value();
            self.rotation = rotation.value();
        }
    }
    
    pub fn pause(&mut self) {
        self.paused = true;
    }
    
    pub fn resume(&mut self) {
        self.paused = false;
    }
    
    /// True when started and not paused.
    pub fn is_animating(&self) -> bool {
        self.tweens.is_some() && !self.paused
    }
    
    /// Manual elevation (slider); overwritten by the next `advance` while animating.
    pub fn set_elevation(&mut self, elevation: f64) {
        self.elevation = clamp_to(elevation, ELEVATION_RANGE);
    }
    
    /// Manual rotation (slider); overwritten by the next `advance` while animating.
    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = clamp_to(rotation, ROTATION_RANGE);
    }
    
    pub fn elevation(&self) -> f64 {
        self.elevation
    }
    
    pub fn rotation(&self) -> f64 {
        self.rotation
    }
    
    /// Unit direction towards the sun.
    pub fn direction(&self) -> Vector3<f64> {
        sun_direction(self.elevation, self.rotation)
    }
    
    /// Position of the directional light.
    pub fn light_position(&self) -> Vector3<f64> {
        self.direction() * SUN_LIGHT_DISTANCE
    }
}

fn clamp_to(value: f64, (low, high): (f64, f64)) -> f64 {
    value.max(low).min(high)
}
