//! Look-at orientation construction.

use nalgebra::{Matrix3, Point3, Rotation3, UnitQuaternion, Vector3};

/// Nudge applied to the view axis when it is parallel to `up`.
const PARALLEL_NUDGE: f64 = 1e-4;

/// Builds the orientation of an object at `eye` looking at `target`.
///
/// The returned rotation has columns `x, y, z` where
/// `z = normalize(eye - target)`, `x = normalize(up × z)` and `y = z × x`.
/// The object's local `-Z` therefore points at `target` and its local `+Z`
/// points away from it.
///
/// Degenerate inputs never produce NaN:
/// - `eye == target`: `z` falls back to world `+Z`
/// - `z` parallel to `up`: `z` is nudged off-axis before `x` is computed
pub fn look_at(eye: &Point3<f64>, target: &Point3<f64>, up: &Vector3<f64>) -> UnitQuaternion<f64> {
    let mut z = eye - target;
    if z.norm_squared() == 0.0 {
        z.z = 1.0;
    }
    z.normalize_mut();
    
    let mut x = up.cross(&z);
    if x.norm_squared() == 0.0 {
        if up.z.abs() == 1.0 {
            z.x += PARALLEL_NUDGE;
        } else {
            z.z += PARALLEL_NUDGE;
        }
        z.normalize_mut();
        x = up.cross(&z);
    }
    x.normalize_mut();
    
    let y = z.cross(&x);
    
    let rotation = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]));
    UnitQuaternion::from_rotation_matrix(&rotation)
}
