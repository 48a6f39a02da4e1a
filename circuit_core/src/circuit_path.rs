//! The circuit path - progress-parametrized placement along a closed curve.
//!
//! A `CircuitPath` turns authored sample points into a [`ClosedCatmullRom`]
//! and answers "where is progress `t`, and which way does it face?".
//! Progress is decoupled from the curve's own parameter by [`CircuitPath::remap_t`]:
//! the authored curves wind against the direction of travel and start
//! somewhere other than the race start line, and one remap fixes both.

use crate::curve::ClosedCatmullRom;
use crate::error::PathError;
use crate::orientation::look_at;
use crate::placement::Placeable;
use circuit_env::{CircuitContext, DataSource};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Scale applied to coordinates authored in Blender units.
pub const BLENDER_SCALE: f64 = 10.0;

/// Height added to debug line points to avoid z-fighting with the ground.
pub const DEBUG_LINE_LIFT: f64 = 0.15;

/// A sample point in the authoring coordinate system (`[x, y, z]`, Z up).
pub type SamplePoint = [f64; 3];

/// Where a path's data lives and where its start line is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSource {
    /// JSON array of `[x, y, z]` tuples
    pub data_file: DataSource,
    
    /// Native curve parameter of the start line, in [0,1)
    pub t_start: f64,
}

impl PathSource {
    /// Creates a path source.
    pub fn new(data_file: impl Into<DataSource>, t_start: f64) -> Self {
        Self {
            data_file: data_file.into(),
            t_start,
        }
    }
}

/// A renderable polyline for inspecting a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugLine {
    pub points: Vec<Point3<f64>>,
    pub color: [u8; 3],
}

/// A closed racing line with a start offset and inverted travel direction.
///
/// Immutable once built; share it between cars with an `Arc`.
#[derive(Debug, Clone)]
pub struct CircuitPath {
    /// Start offset on the native curve parameter
    t_start: f64,
    
    /// The fitted loop (owns the transformed points)
    curve: ClosedCatmullRom,
    
    /// Pre-sampled polyline for debug rendering
    debug_points: Vec<Point3<f64>>,
}

impl CircuitPath {
    /// Fetches and builds a path from its data source.
    ///
    /// The source must be a JSON array of `[x, y, z]` numeric tuples in the
    /// authoring coordinate system; each is converted with
    /// [`CircuitPath::to_render_space`].
    ///
    /// # Errors
    /// * `PathError::Fetch` - the source is unreachable
    /// * `PathError::Malformed` - the JSON is not an array of 3-tuples
    /// * `PathError::TooFewPoints` / `PathError::NonFinite` - unusable geometry
    pub async fn load<C>(ctx: &C, source: &PathSource, scale: f64) -> Result<Self, PathError>
    where
        C: CircuitContext + ?Sized,
    {
        let bytes = ctx.fetch(&source.data_file).await?;
        let samples: Vec<SamplePoint> = serde_json::from_slice(&bytes)?;
        
        let path = Self::from_samples(&samples, source.t_start, scale)?;
        debug!(
            "Loaded path {} ({} points, length {:.1}, t_start {})",
            source.data_file,
            samples.len(),
            path.curve.length(),
            source.t_start
        );
        
        Ok(path)
    }
    
    /// Builds a path from authoring-space samples.
    pub fn from_samples(samples: &[SamplePoint], t_start: f64, scale: f64) -> Result<Self, PathError> {
        let points = samples
            .iter()
            .map(|&sample| Self::to_render_space(sample, scale))
            .collect();
        
        Self::from_points(points, t_start)
    }
    
    /// Builds a path from points already in render space.
    pub fn from_points(points: Vec<Point3<f64>>, t_start: f64) -> Result<Self, PathError> {
        let curve = ClosedCatmullRom::new(points)?;
        let debug_points = curve.sample_points(curve.points().len());
        
        Ok(Self {
            t_start,
            curve,
            debug_points,
        })
    }
    
    /// Converts an authoring-space sample (Z up) into render space (Y up).
    ///
    /// `[x, y, z]` becomes `(x, z, -y) * scale`.
    pub fn to_render_space([x, y, z]: SamplePoint, scale: f64) -> Point3<f64> {
        Point3::new(x, z, -y) * scale
    }
    
    /// Maps progress `t` to the native curve parameter.
    ///
    /// Computes `(t_start + (1 - t)) mod 1`. Progress runs against the
    /// authored winding, and progress 0 lands on `t_start`. The result is
    /// always in [0,1); out-of-range `t` wraps instead of clamping.
    pub fn remap_t(&self, t: f64) -> f64 {
        let inverted = 1.0 - t;
        let remapped = (self.t_start + inverted).rem_euclid(1.0);
        
        // rem_euclid can round a tiny negative up to exactly 1.0
        if remapped >= 1.0 {
            0.0
        } else {
            remapped
        }
    }
    
    /// Position on the curve at progress `t`.
    pub fn point(&self, t: f64) -> Point3<f64> {
        self.curve.point_at(self.remap_t(t))
    }
    
    /// Facing at progress `t`.
    ///
    /// Looks from the curve point along the native tangent with world up
    /// `+Y`; the resulting local `+Z` is the direction of travel. Returns
    /// `None` where the tangent vanishes (stacked or duplicate points).
    pub fn rotation(&self, t: f64) -> Option<UnitQuaternion<f64>> {
        let remapped = self.remap_t(t);
        let point = self.curve.point_at(remapped);
        let tangent = self.curve.tangent_at(remapped)?;
        
        let target = point + tangent.into_inner();
        Some(look_at(&point, &target, &Vector3::y()))
    }
    
    /// Places `model` at progress `t`.
    ///
    /// Where the tangent is degenerate the model keeps its previous
    /// orientation; the position is always updated.
    pub fn place_model<M>(&self, model: &mut M, t: f64)
    where
        M: Placeable + ?Sized,
    {
        model.set_position(self.point(t));
        
        match self.rotation(t) {
            Some(orientation) => model.set_orientation(orientation),
            None => debug!("Degenerate tangent at progress {}, keeping orientation", t),
        }
    }
    
    /// Polyline through the pre-sampled curve, lifted above the ground.
    pub fn debug_line(&self, color: [u8; 3]) -> DebugLine {
        let lift = Vector3::new(0.0, DEBUG_LINE_LIFT, 0.0);
        
        DebugLine {
            points: self.debug_points.iter().map(|p| p + lift).collect(),
            color,
        }
    }
    
    /// Returns the start offset.
    pub fn t_start(&self) -> f64 {
        self.t_start
    }
    
    /// Returns the transformed points the curve interpolates.
    pub fn points(&self) -> &[Point3<f64>] {
        self.curve.points()
    }
    
    /// Returns the underlying curve.
    pub fn curve(&self) -> &ClosedCatmullRom {
        &self.curve
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::Transform;
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use circuit_env::EnvError;
    use std::collections::HashMap;
    use std::time::Duration;
    
    /// Unit square in authoring space.
    const SQUARE: [SamplePoint; 4] = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ];
    
    fn square_path(t_start: f64) -> CircuitPath {
        CircuitPath::from_samples(&SQUARE, t_start, 1.0).unwrap()
    }
    
    /// Serves fixed bytes per source.
    struct FixtureContext {
        sources: HashMap<String, Vec<u8>>,
    }
    
    impl FixtureContext {
        fn with(source: &str, body: &str) -> Self {
            let mut sources = HashMap::new();
            sources.insert(source.to_string(), body.as_bytes().to_vec());
            Self { sources }
        }
    }
    
    #[async_trait]
    impl CircuitContext for FixtureContext {
        fn now(&self) -> Duration {
            Duration::ZERO
        }
        
        async fn sleep(&self, _duration: Duration) {}
        
        async fn fetch(&self, source: &DataSource) -> Result<Vec<u8>, EnvError> {
            self.sources
                .get(source.as_str())
                .cloned()
                .ok_or_else(|| EnvError::unreachable(source))
        }
        
        fn random_int(&self, low: i64, _high: i64) -> i64 {
            low
        }
        
        fn seed(&self) -> u64 {
            0
        }
    }
    
    #[test]
    fn test_axis_remap_and_scale() {
        let p = CircuitPath::to_render_space([1.0, 2.0, 3.0], 10.0);
        assert_eq!(p, Point3::new(10.0, 30.0, -20.0));
    }
    
    #[test]
    fn test_remap_t_start_offset() {
        let path = square_path(0.1432);
        
        assert_relative_eq!(path.remap_t(0.0), 0.1432, epsilon = 1e-12);
        assert_relative_eq!(path.remap_t(1.0), 0.1432, epsilon = 1e-12);
        assert_relative_eq!(path.remap_t(0.25), 0.8932, epsilon = 1e-12);
    }
    
    #[test]
    fn test_remap_t_wraps_out_of_range() {
        let path = square_path(0.5);
        
        assert_relative_eq!(path.remap_t(1.25), 0.25, epsilon = 1e-12);
        assert_relative_eq!(path.remap_t(-0.25), 0.75, epsilon = 1e-12);
        
        let tiny = square_path(0.0).remap_t(1.0 + 1e-17);
        assert!((0.0..1.0).contains(&tiny));
    }
    
    #[test]
    fn test_remap_t_decreases_with_progress() {
        let path = square_path(0.0);
        
        // Start offset 0: remapped runs 1 - t for t in (0, 1)
        let mut previous = path.remap_t(0.01);
        for step in 2..100 {
            let current = path.remap_t(step as f64 / 100.0);
            assert!(current < previous);
            previous = current;
        }
    }
    
    #[test]
    fn test_start_and_end_of_lap_coincide() {
        let path = square_path(0.0);
        
        assert_relative_eq!(path.point(0.0), path.point(1.0), epsilon = 1e-9);
        assert_relative_eq!(path.point(0.0), path.curve().point(0.0), epsilon = 1e-12);
    }
    
    #[test]
    fn test_square_quarter_steps_stay_in_bounds() {
        let path = square_path(0.0);
        
        // Square spans x in [0,1], y = 0, z in [-1,0] after the axis remap
        for step in 0..=4 {
            let p = path.point(step as f64 * 0.25);
            assert!(p.x >= -1e-6 && p.x <= 1.0 + 1e-6, "x out of bounds: {:?}", p);
            assert!(p.y.abs() <= 1e-9, "y out of bounds: {:?}", p);
            assert!(p.z >= -1.0 - 1e-6 && p.z <= 1e-6, "z out of bounds: {:?}", p);
        }
    }
    
    #[test]
    fn test_rotation_faces_direction_of_travel() {
        let path = square_path(0.0);
        
        let t = 0.1;
        let ahead = path.point(t + 0.001) - path.point(t);
        let facing = path.rotation(t).unwrap() * Vector3::z();
        
        assert!(facing.dot(&ahead.normalize()) > 0.99);
        assert_relative_eq!(facing.y, 0.0, epsilon = 1e-9);
    }
    
    #[test]
    fn test_place_model_sets_position_and_orientation() {
        let path = square_path(0.3);
        let mut model = Transform::identity();
        
        path.place_model(&mut model, 0.4);
        
        assert_eq!(model.position, path.point(0.4));
        assert_eq!(Some(model.orientation), path.rotation(0.4));
    }
    
    #[test]
    fn test_degenerate_tangent_keeps_previous_orientation() {
        let path = CircuitPath::from_points(vec![Point3::new(1.0, 0.0, 1.0); 3], 0.0).unwrap();
        let previous = UnitQuaternion::from_euler_angles(0.0, 1.0, 0.0);
        let mut model = Transform::new(Point3::origin(), previous);
        
        assert!(path.rotation(0.5).is_none());
        path.place_model(&mut model, 0.5);
        
        assert_eq!(model.position, Point3::new(1.0, 0.0, 1.0));
        assert_eq!(model.orientation, previous);
    }
    
    #[test]
    fn test_debug_line_is_lifted() {
        let path = square_path(0.0);
        let line = path.debug_line([0, 0, 255]);
        
        assert_eq!(line.points.len(), SQUARE.len() + 1);
        assert_eq!(line.color, [0, 0, 255]);
        assert_relative_eq!(line.points[0].y, DEBUG_LINE_LIFT, epsilon = 1e-12);
    }
    
    #[tokio::test]
    async fn test_load_from_context() {
        let ctx = FixtureContext::with("/data/square.json", "[[0,0,0],[1,0,0],[1,1,0],[0,1,0]]");
        let source = PathSource::new("/data/square.json", 0.25);
        
        let path = CircuitPath::load(&ctx, &source, BLENDER_SCALE).await.unwrap();
        
        assert_eq!(path.points().len(), 4);
        assert_eq!(path.points()[2], Point3::new(10.0, 0.0, -10.0));
        assert_eq!(path.t_start(), 0.25);
    }
    
    #[tokio::test]
    async fn test_load_missing_source_fails() {
        let ctx = FixtureContext::with("/data/other.json", "[]");
        let source = PathSource::new("/data/square.json", 0.0);
        
        let result = CircuitPath::load(&ctx, &source, 1.0).await;
        assert!(matches!(result, Err(PathError::Fetch(EnvError::SourceUnreachable(_)))));
    }
    
    #[tokio::test]
    async fn test_load_rejects_wrong_arity() {
        let ctx = FixtureContext::with("/p.json", "[[0,0,0],[1,0],[1,1,0]]");
        let source = PathSource::new("/p.json", 0.0);
        
        let result = CircuitPath::load(&ctx, &source, 1.0).await;
        assert!(matches!(result, Err(PathError::Malformed(_))));
    }
    
    #[tokio::test]
    async fn test_load_rejects_long_tuples() {
        let ctx = FixtureContext::with("/p.json", "[[0,0,0,1],[1,0,0,1],[1,1,0,1]]");
        let source = PathSource::new("/p.json", 0.0);
        
        let result = CircuitPath::load(&ctx, &source, 1.0).await;
        assert!(matches!(result, Err(PathError::Malformed(_))));
    }
    
    #[tokio::test]
    async fn test_load_rejects_non_numeric() {
        let ctx = FixtureContext::with("/p.json", r#"[[0,0,0],[1,"a",0],[1,1,0]]"#);
        let source = PathSource::new("/p.json", 0.0);
        
        let result = CircuitPath::load(&ctx, &source, 1.0).await;
        assert!(matches!(result, Err(PathError::Malformed(_))));
    }
    
    #[tokio::test]
    async fn test_load_rejects_short_paths() {
        let ctx = FixtureContext::with("/p.json", "[[0,0,0],[1,0,0]]");
        let source = PathSource::new("/p.json", 0.0);
        
        let result = CircuitPath::load(&ctx, &source, 1.0).await;
        assert!(matches!(result, Err(PathError::TooFewPoints(2))));
    }
    
    mod properties {
        use super::*;
        use proptest::prelude::*;
        
        /// Distance between two parameters on the unit circle.
        fn circular_distance(a: f64, b: f64) -> f64 {
            let d = (a - b).abs();
            d.min(1.0 - d)
        }
        
        proptest! {
            #[test]
            fn prop_remap_t_stays_in_unit_interval(t in 0.0f64..=1.0, t_start in 0.0f64..1.0) {
                let path = square_path(t_start);
                let remapped = path.remap_t(t);
                prop_assert!((0.0..1.0).contains(&remapped), "remap_t({}) = {}", t, remapped);
            }
            
            #[test]
            fn prop_lap_endpoints_map_to_start_offset(t_start in 0.0f64..1.0) {
                let path = square_path(t_start);
                prop_assert!(circular_distance(path.remap_t(0.0), t_start) < 1e-12);
                prop_assert!(circular_distance(path.remap_t(1.0), t_start) < 1e-12);
            }
            
            #[test]
            fn prop_progress_moves_backward_on_curve(
                t in 0.0f64..0.99,
                step in 1e-6f64..0.01,
                t_start in 0.0f64..1.0,
            ) {
                let path = square_path(t_start);
                let before = path.remap_t(t);
                let after = path.remap_t(t + step);
                // Backward by `step`, modulo the wrap at 0
                prop_assert!(circular_distance((before - step).rem_euclid(1.0), after) < 1e-9);
            }
            
            #[test]
            fn prop_any_progress_yields_finite_point(t in -10.0f64..10.0) {
                let point = square_path(0.1432).point(t);
                prop_assert!(point.coords.iter().all(|c| c.is_finite()));
            }
        }
    }
}
