//! Chase camera placement.

use crate::orientation::look_at;
use crate::placement::Transform;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Camera position relative to a followed car, in the car's local frame.
pub const FOLLOW_CAMERA_OFFSET: Vector3<f64> = Vector3::new(0.0, 5.0, -10.0);

/// Static camera parameters handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees
    pub fov: f64,
    pub near: f64,
    pub far: f64,
    
    /// Distance of the free camera from the origin
    pub orbit_radius: f64,
    
    /// Where the free camera starts
    pub initial_position: Point3<f64>,
    
    /// Chase offset in the followed car's frame
    pub follow_offset: Vector3<f64>,
    
    /// Added to the chase look point in world space
    pub look_offset: Vector3<f64>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 3.0,
            far: 10000.0,
            orbit_radius: 300.0,
            initial_position: Point3::new(165.0, 55.0, 280.0),
            follow_offset: FOLLOW_CAMERA_OFFSET,
            look_offset: Vector3::zeros(),
        }
    }
}

/// Camera transform chasing `target`.
///
/// The camera sits at `target.position + target.orientation * position_offset`
/// and looks at one unit ahead of the target (its local `+Z`) shifted by
/// `rotation_offset`. The camera views along its local `-Z`.
pub fn follow_target(
    target: &Transform,
    position_offset: &Vector3<f64>,
    rotation_offset: &Vector3<f64>,
) -> Transform {
    let position = target.position + target.orientation * position_offset;
    let look_point = target.position + target.forward() + rotation_offset;
    
    Transform::new(position, look_at(&position, &look_point, &Vector3::y()))
}

/// Places a camera behind a target and points it along the target's heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowCamera {
    /// Offset in the target's local frame
    pub position_offset: Vector3<f64>,
    
    /// Offset added to the look point in world space
    pub rotation_offset: Vector3<f64>,
}

impl FollowCamera {
    pub fn new(position_offset: Vector3<f64>, rotation_offset: Vector3<f64>) -> Self {
        Self {
            position_offset,
            rotation_offset,
        }
    }
    
    /// Camera transform chasing `target` with this camera's offsets.
    pub fn follow(&self, target: &Transform) -> Transform {
        follow_target(target, &self.position_offset, &self.rotation_offset)
    }
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self::new(FOLLOW_CAMERA_OFFSET, Vector3::zeros())
    }
}

impl From<&CameraSettings> for FollowCamera {
    fn from(settings: &CameraSettings) -> Self {
        Self::new(settings.follow_offset, settings.look_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;
    
    #[test]
    fn test_camera_sits_behind_and_above() {
        let camera = FollowCamera::default().follow(&Transform::identity());
        
        assert_relative_eq!(camera.position, Point3::new(0.0, 5.0, -10.0), epsilon = 1e-12);
        
        let view = camera.orientation * -Vector3::z();
        let expected = Vector3::new(0.0, -5.0, 11.0).normalize();
        assert_relative_eq!(view, expected, epsilon = 1e-12);
    }
    
    #[test]
    fn test_offset_rotates_with_target() {
        let heading = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f64::consts::FRAC_PI_2);
        let target = Transform::new(Point3::new(100.0, 0.0, 50.0), heading);
        
        let camera = FollowCamera::default().follow(&target);
        
        // +Z rotated a quarter turn about Y is +X, so "behind" is -X
        assert_relative_eq!(camera.position, Point3::new(90.0, 5.0, 50.0), epsilon = 1e-9);
        assert!((camera.orientation * -Vector3::z()).x > 0.8);
    }
    
    #[test]
    fn test_rotation_offset_shifts_look_point() {
        let camera = follow_target(&Transform::identity(), &Vector3::zeros(), &Vector3::new(0.0, 1.0, 0.0));
        
        assert_relative_eq!(camera.position, Point3::origin(), epsilon = 1e-12);
        let view = camera.orientation * -Vector3::z();
        assert_relative_eq!(view, Vector3::new(0.0, 1.0, 1.0).normalize(), epsilon = 1e-12);
    }
    
    #[test]
    fn test_from_settings() {
        let settings = CameraSettings::default();
        assert_eq!(FollowCamera::from(&settings), FollowCamera::default());
    }
}
