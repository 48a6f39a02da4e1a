//! JSON exporter for offline replay.
//!
//! Exports scene frames (car and camera transforms, sun direction, race
//! events) plus the path polylines as a single JSON document.

use crate::scene::{CarSlot, CircuitScene, SceneEvent};
use circuit_core::{Car, DebugLine, Transform};
use circuit_env::CircuitContext;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Simulation time in seconds
    pub time_sec: f64,
    
    /// Car 1 then car 2
    pub cars: Vec<CarFrame>,
    
    /// Chase camera, absent in free mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<PoseFrame>,
    
    /// Unit vector towards the sun
    pub sun_direction: [f64; 3],
    
    /// Events (race start, race result)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<SimEvent>,
}

impl SimFrame {
    /// Captures the current scene state.
    pub fn capture<C: CircuitContext>(scene: &CircuitScene<C>, events: &[SceneEvent]) -> Self {
        let sun = scene.sky().direction();
        
        Self {
            time_sec: scene.time(),
            cars: CarSlot::both()
                .into_iter()
                .map(|slot| CarFrame::new(scene.car(slot)))
                .collect(),
            camera: scene.camera().map(PoseFrame::from),
            sun_direction: [sun.x, sun.y, sun.z],
            events: events.iter().map(SimEvent::from).collect(),
        }
    }
}

/// Position and orientation (quaternion as `[x, y, z, w]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    pub position: [f64; 3],
    pub orientation: [f64; 4],
}

impl From<&Transform> for PoseFrame {
    fn from(transform: &Transform) -> Self {
        let p = transform.position;
        let q = transform.orientation.coords;
        
        Self {
            position: [p.x, p.y, p.z],
            orientation: [q.x, q.y, q.z, q.w],
        }
    }
}

/// Car state in a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarFrame {
    pub name: String,
    pub progress: f64,
    pub speed: f64,
    pub autonomous: bool,
    pub pose: PoseFrame,
}

impl CarFrame {
    pub fn new(car: &Car<Transform>) -> Self {
        Self {
            name: car.name().to_string(),
            progress: car.progress(),
            speed: car.speed(),
            autonomous: car.is_autonomous(),
            pose: PoseFrame::from(car.model()),
        }
    }
}

/// A path polyline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathLine {
    pub color: [u8; 3],
    pub points: Vec<[f64; 3]>,
}

impl From<&DebugLine> for PathLine {
    fn from(line: &DebugLine) -> Self {
        Self {
            color: line.color,
            points: line.points.iter().map(|p| [p.x, p.y, p.z]).collect(),
        }
    }
}

/// Simulation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

impl From<&SceneEvent> for SimEvent {
    fn from(event: &SceneEvent) -> Self {
        match event {
            SceneEvent::RaceStarted { speeds } => Self {
                message: format!("Race started at speeds {} and {}", speeds[0], speeds[1]),
                winner: None,
            },
            SceneEvent::RaceFinished(outcome) => Self {
                message: format!("The winner is {}!", outcome.winner),
                winner: Some(outcome.winner.clone()),
            },
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,
    
    /// Seed used
    pub seed: u64,
    
    /// Duration in seconds
    pub duration_sec: f64,
    
    /// Racing lines of path 1 and path 2
    pub paths: Vec<PathLine>,
    
    /// All frames
    pub frames: Vec<SimFrame>,
    
    /// Final results
    pub passed: bool,
    
    /// Winner of the last race, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            paths: Vec::new(),
            frames: Vec::new(),
            passed: false,
            winner: None,
        }
    }
    
    /// Stores the path polylines.
    pub fn set_paths(&mut self, lines: &[DebugLine]) {
        self.paths = lines.iter().map(PathLine::from).collect();
    }
    
    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }
    
    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, winner: Option<String>) {
        self.passed = passed;
        self.winner = winner;
    }
    
    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
