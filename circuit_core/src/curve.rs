//! Closed centripetal Catmull-Rom curve with arc-length parametrization.
//!
//! The curve interpolates every control point and loops back to the first.
//! Two parametrizations are exposed:
//! - **native** `t` (`point`, `tangent`): each segment gets an equal share of [0,1]
//! - **arc-length** `u` (`point_at`, `tangent_at`): equal steps in `u` cover
//!   equal distances along the curve
//!
//! Arc length is approximated with a cumulative-length table sampled at
//! [`ARC_LENGTH_DIVISIONS`] uniform native steps.

use crate::error::PathError;
use nalgebra::{Point3, Unit, Vector3};

/// Number of uniform native-parameter steps used for the arc-length table.
pub const ARC_LENGTH_DIVISIONS: usize = 200;

/// Half-width of the finite difference used for tangents.
const TANGENT_DELTA: f64 = 1e-4;

/// Knot spacings below this are replaced (coincident control points).
const MIN_KNOT_SPACING: f64 = 1e-4;

/// Below this length a finite-difference tangent is considered degenerate.
const MIN_TANGENT_NORM: f64 = 1e-9;

/// One axis of a cubic Hermite segment: `c0 + c1 t + c2 t² + c3 t³`.
#[derive(Debug, Clone, Copy)]
struct CubicSegment {
    c0: f64,
    c1: f64,
    c2: f64,
    c3: f64,
}

impl CubicSegment {
    /// Hermite cubic from endpoint values `x0, x1` and tangents `t0, t1`.
    fn hermite(x0: f64, x1: f64, t0: f64, t1: f64) -> Self {
        Self {
            c0: x0,
            c1: t0,
            c2: -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1,
            c3: 2.0 * x0 - 2.0 * x1 + t0 + t1,
        }
    }
    
    /// Non-uniform Catmull-Rom segment between `x1` and `x2`.
    ///
    /// `dt0..dt2` are the knot spacings of the three spans around the segment.
    fn nonuniform(x0: f64, x1: f64, x2: f64, x3: f64, dt0: f64, dt1: f64, dt2: f64) -> Self {
        let t1 = (x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1;
        let t2 = (x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2;
        
        // Rescale tangents for parameter in [0,1]
        Self::hermite(x1, x2, t1 * dt1, t2 * dt1)
    }
    
    fn eval(&self, t: f64) -> f64 {
        let t2 = t * t;
        let t3 = t2 * t;
        self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t3
    }
}

/// A closed (looping) centripetal Catmull-Rom spline.
#[derive(Debug, Clone)]
pub struct ClosedCatmullRom {
    /// Control points, in winding order
    points: Vec<Point3<f64>>,
    
    /// Cumulative length at each of the `ARC_LENGTH_DIVISIONS + 1` table entries
    arc_lengths: Vec<f64>,
}

impl ClosedCatmullRom {
    /// Builds a closed curve through `points`.
    ///
    /// # Errors
    /// * `PathError::TooFewPoints` - fewer than 3 control points
    /// * `PathError::NonFinite` - a coordinate is NaN or infinite
    pub fn new(points: Vec<Point3<f64>>) -> Result<Self, PathError> {
        if points.len() < 3 {
            return Err(PathError::TooFewPoints(points.len()));
        }
        
        if let Some(index) = points
            .iter()
            .position(|p| p.coords.iter().any(|c| !c.is_finite()))
        {
            return Err(PathError::NonFinite { index });
        }
        
        let mut curve = Self {
            points,
            arc_lengths: Vec::new(),
        };
        curve.arc_lengths = curve.compute_arc_lengths(ARC_LENGTH_DIVISIONS);
        
        Ok(curve)
    }
    
    /// Returns the control points.
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }
    
    /// Returns the approximate total length of the loop.
    pub fn length(&self) -> f64 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }
    
    /// Evaluates the curve at native parameter `t` (0 and 1 both map to the first point).
    pub fn point(&self, t: f64) -> Point3<f64> {
        let n = self.points.len() as i64;
        let p = n as f64 * t;
        let base = p.floor();
        let weight = p - base;
        let index = base as i64;
        
        let at = |offset: i64| &self.points[(index + offset).rem_euclid(n) as usize];
        let (p0, p1, p2, p3) = (at(-1), at(0), at(1), at(2));
        
        // Centripetal knot spacing: |Pi+1 - Pi|^0.5
        let mut dt0 = nalgebra::distance_squared(p0, p1).powf(0.25);
        let mut dt1 = nalgebra::distance_squared(p1, p2).powf(0.25);
        let mut dt2 = nalgebra::distance_squared(p2, p3).powf(0.25);
        
        if dt1 < MIN_KNOT_SPACING {
            dt1 = 1.0;
        }
        if dt0 < MIN_KNOT_SPACING {
            dt0 = dt1;
        }
        if dt2 < MIN_KNOT_SPACING {
            dt2 = dt1;
        }
        
        let axis = |i: usize| {
            CubicSegment::nonuniform(p0[i], p1[i], p2[i], p3[i], dt0, dt1, dt2).eval(weight)
        };
        
        Point3::new(axis(0), axis(1), axis(2))
    }
    
    /// Unit tangent at native parameter `t`, or `None` where the curve is stationary.
    pub fn tangent(&self, t: f64) -> Option<Unit<Vector3<f64>>> {
        let t1 = (t - TANGENT_DELTA).max(0.0);
        let t2 = (t + TANGENT_DELTA).min(1.0);
        
        let difference = self.point(t2) - self.point(t1);
        Unit::try_new(difference, MIN_TANGENT_NORM)
    }
    
    /// Evaluates the curve at arc-length parameter `u` (clamped to [0,1]).
    pub fn point_at(&self, u: f64) -> Point3<f64> {
        self.point(self.u_to_t(u))
    }
    
    /// Unit tangent at arc-length parameter `u` (clamped to [0,1]).
    pub fn tangent_at(&self, u: f64) -> Option<Unit<Vector3<f64>>> {
        self.tangent(self.u_to_t(u))
    }
    
    /// Maps an arc-length fraction `u` to the native parameter `t`.
    pub fn u_to_t(&self, u: f64) -> f64 {
        // max/min (not clamp) so NaN collapses to 0
        let u = u.max(0.0).min(1.0);
        let last_index = self.arc_lengths.len() - 1;
        let target = u * self.length();
        
        // First entry not shorter than the target
        let upper = self.arc_lengths.partition_point(|&len| len < target);
        if upper <= last_index && self.arc_lengths[upper] == target {
            return upper as f64 / last_index as f64;
        }
        
        let i = upper.saturating_sub(1).min(last_index);
        let before = self.arc_lengths[i];
        let after = self.arc_lengths[(i + 1).min(last_index)];
        let segment_length = after - before;
        
        let fraction = if segment_length > 0.0 {
            (target - before) / segment_length
        } else {
            0.0
        };
        
        (i as f64 + fraction) / last_index as f64
    }
    
    /// Samples `divisions + 1` points at uniform native-parameter steps.
    pub fn sample_points(&self, divisions: usize) -> Vec<Point3<f64>> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|d| self.point(d as f64 / divisions as f64))
            .collect()
    }
    
    fn compute_arc_lengths(&self, divisions: usize) -> Vec<f64> {
        let mut lengths = Vec::with_capacity(divisions + 1);
        let mut last = self.point(0.0);
        let mut sum = 0.0;
        lengths.push(0.0);
        
        for d in 1..=divisions {
            let current = self.point(d as f64 / divisions as f64);
            sum += nalgebra::distance(&current, &last);
            lengths.push(sum);
            last = current;
        }
        
        lengths
    }
}
