//! Placement capability for externally owned visual representations.
//!
//! The engine never owns renderable objects. Whatever the rendering
//! collaborator hands over only has to accept a position and an
//! orientation; [`Transform`] is the plain-data implementation used by the
//! headless harness and by tests.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Something that can be positioned and oriented in the world.
pub trait Placeable {
    /// Current world position.
    fn position(&self) -> Point3<f64>;
    
    /// Current world orientation.
    fn orientation(&self) -> UnitQuaternion<f64>;
    
    /// Moves the object to `position`.
    fn set_position(&mut self, position: Point3<f64>);
    
    /// Rotates the object to `orientation`.
    fn set_orientation(&mut self, orientation: UnitQuaternion<f64>);
    
    /// Shifts the object by `offset` in world space.
    fn translate(&mut self, offset: Vector3<f64>) {
        let position = self.position();
        self.set_position(position + offset);
    }
}

/// Position + orientation of an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Point3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Transform {
    /// Creates a transform.
    pub fn new(position: Point3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }
    
    /// Transform at the origin with no rotation.
    pub fn identity() -> Self {
        Self::new(Point3::origin(), UnitQuaternion::identity())
    }
    
    /// World direction of the local `+Z` axis.
    ///
    /// For a car placed on a path this is the direction of travel.
    pub fn forward(&self) -> Vector3<f64> {
        self.orientation * Vector3::z()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Placeable for Transform {
    fn position(&self) -> Point3<f64> {
        self.position
    }
    
    fn orientation(&self) -> UnitQuaternion<f64> {
        self.orientation
    }
    
    fn set_position(&mut self, position: Point3<f64>) {
        self.position = position;
    }
    
    fn set_orientation(&mut self, orientation: UnitQuaternion<f64>) {
        self.orientation = orientation;
    }
}
