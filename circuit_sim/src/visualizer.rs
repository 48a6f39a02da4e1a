//! Rerun visualization for circuit runs.
//!
//! This module provides visualization of recorded runs using the Rerun SDK.
//! Visualization is optional and only available with the `visualization` feature.
//!
//! # What Gets Logged
//!
//! - Path polylines as line strips in their debug colors
//! - Cars as yellow / red points
//! - The chase camera as a white point
//! - Car progress as scalar timelines
//! - Race events as text logs

use crate::exporter::{PathLine, SimExport, SimFrame};
#[cfg(feature = "visualization")]
use rerun::{Color, LineStrips3D, Points3D, Position3D, Radius, RecordingStream};

/// Point colors of car 1 and car 2.
#[cfg(feature = "visualization")]
const CAR_COLORS: [[u8; 3]; 2] = [[255, 220, 0], [200, 30, 30]];

/// Rerun logger for circuit visualization.
pub struct RerunLogger {
    #[cfg(feature = "visualization")]
    rec: Option<RecordingStream>,
    
    /// Whether visualization is enabled
    enabled: bool,
}

impl RerunLogger {
    /// Creates a new logger with visualization disabled.
    pub fn disabled() -> Self {
        Self {
            #[cfg(feature = "visualization")]
            rec: None,
            enabled: false,
        }
    }
    
    /// Creates a new logger with visualization enabled.
    #[cfg(feature = "visualization")]
    pub fn new(name: &str) -> Self {
        match rerun::RecordingStreamBuilder::new(name).spawn() {
            Ok(rec) => {
                tracing::info!("Rerun visualization enabled - open Rerun Viewer to see the circuit");
                Self {
                    rec: Some(rec),
                    enabled: true,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to initialize Rerun: {:?}", e);
                Self::disabled()
            }
        }
    }
    
    /// Creates a logger - returns disabled if visualization feature not enabled.
    #[cfg(not(feature = "visualization"))]
    pub fn new(_name: &str) -> Self {
        tracing::info!("Rerun visualization not available (compile with --features visualization)");
        Self::disabled()
    }
    
    /// Returns whether visualization is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
    
    /// Replays a whole export: paths once, then every frame on the sim timeline.
    pub fn replay(&self, export: &SimExport) {
        if !self.enabled {
            return;
        }
        
        self.log_paths(&export.paths);
        for frame in &export.frames {
            self.log_frame(frame);
        }
    }
    
    /// Sets the simulation time for subsequent logs.
    #[cfg(feature = "visualization")]
    pub fn set_time(&self, seconds: f64) {
        if let Some(ref rec) = self.rec {
            rec.set_time_seconds("sim_time", seconds);
        }
    }
    
    #[cfg(not(feature = "visualization"))]
    pub fn set_time(&self, _seconds: f64) {}
    
    /// Logs the racing lines as static line strips.
    #[cfg(feature = "visualization")]
    pub fn log_paths(&self, paths: &[PathLine]) {
        if let Some(ref rec) = self.rec {
            for (index, path) in paths.iter().enumerate() {
                let strip: Vec<[f32; 3]> = path
                    .points
                    .iter()
                    .map(|[x, y, z]| [*x as f32, *y as f32, *z as f32])
                    .collect();
                let [r, g, b] = path.color;
                
                let _ = rec.log_static(
                    format!("world/paths/{}", index + 1),
                    &LineStrips3D::new([strip]).with_colors([Color::from_rgb(r, g, b)]),
                );
            }
        }
    }
    
    #[cfg(not(feature = "visualization"))]
    pub fn log_paths(&self, _paths: &[PathLine]) {}
    
    /// Logs cars, camera, progress and events of one frame.
    #[cfg(feature = "visualization")]
    pub fn log_frame(&self, frame: &SimFrame) {
        self.set_time(frame.time_sec);
        
        if let Some(ref rec) = self.rec {
            for (index, car) in frame.cars.iter().enumerate() {
                let [x, y, z] = car.pose.position;
                let [r, g, b] = CAR_COLORS[index % CAR_COLORS.len()];
                
                let _ = rec.log(
                    format!("world/cars/{}", index + 1),
                    &Points3D::new([Position3D::new(x as f32, y as f32, z as f32)])
                        .with_colors([Color::from_rgb(r, g, b)])
                        .with_radii([Radius::new_scene_units(2.0)]),
                );
                let _ = rec.log(
                    format!("metrics/car_{}/progress", index + 1),
                    &rerun::Scalar::new(car.progress),
                );
            }
            
            if let Some(camera) = frame.camera {
                let [x, y, z] = camera.position;
                let _ = rec.log(
                    "world/camera",
                    &Points3D::new([Position3D::new(x as f32, y as f32, z as f32)])
                        .with_colors([Color::from_rgb(255, 255, 255)])
                        .with_radii([Radius::new_scene_units(1.0)]),
                );
            }
            
            for event in &frame.events {
                self.log_event("events", &event.message);
            }
        }
    }
    
    #[cfg(not(feature = "visualization"))]
    pub fn log_frame(&self, _frame: &SimFrame) {}
    
    /// Logs a text annotation (e.g., race result).
    #[cfg(feature = "visualization")]
    pub fn log_event(&self, path: &str, message: &str) {
        if let Some(ref rec) = self.rec {
            let _ = rec.log(
                path,
                &rerun::TextLog::new(message),
            );
        }
    }
    
    #[cfg(not(feature = "visualization"))]
    pub fn log_event(&self, _path: &str, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_disabled_logger() {
        let logger = RerunLogger::disabled();
        assert!(!logger.is_enabled());
        
        // These should be no-ops
        logger.set_time(1.0);
        logger.replay(&SimExport::new("race", 1));
        logger.log_event("events", "The winner is Car 1!");
    }
}
