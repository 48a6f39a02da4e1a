//! CircuitScene - owns both paths, both cars, the sky and the camera.
//!
//! The scene is the only place that knows about more than one car. Races are
//! resolved here: each car's lap callback pushes its name into a channel and
//! the scene drains that channel after updating both cars, so a callback
//! never reenters `update`.

use circuit_core::{
    Car, CircuitConfig, CircuitPath, DebugLine, FollowCamera, PathError, SunCycle, Transform,
};
use circuit_env::CircuitContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

/// Debug polyline color of path 1.
pub const PATH1_DEBUG_COLOR: [u8; 3] = [0, 0, 255];

/// Debug polyline color of path 2.
pub const PATH2_DEBUG_COLOR: [u8; 3] = [255, 0, 0];

/// Errors raised while building a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Path load failed: {0}")]
    Path(#[from] PathError),
    
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// One of the two cars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarSlot {
    One,
    Two,
}

impl CarSlot {
    pub fn both() -> [CarSlot; 2] {
        [CarSlot::One, CarSlot::Two]
    }
}

/// What drives the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraMode {
    /// Orbit controls own the camera; the scene produces no transform
    Free,
    
    /// Chase camera behind a car
    Follow(CarSlot),
}

/// Result of a finished race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceOutcome {
    /// Name of the first car to complete a lap
    pub winner: String,
    
    /// Scene time (seconds) of the frame the race was decided in
    pub finished_at: f64,
    
    /// Speeds drawn for car 1 and car 2
    pub speeds: [f64; 2],
}

/// Notable scene happenings, drained by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    RaceStarted { speeds: [f64; 2] },
    RaceFinished(RaceOutcome),
}

/// The two-car circuit.
pub struct CircuitScene<C: CircuitContext> {
    ctx: Arc<C>,
    config: CircuitConfig,
    
    car1: Car<Transform>,
    car2: Car<Transform>,
    
    sky: SunCycle,
    
    camera_mode: CameraMode,
    follow_camera: FollowCamera,
    
    /// Chase camera transform of the last update (None in free mode)
    camera: Option<Transform>,
    
    debug: bool,
    
    /// Lap notifications from racing cars
    lap_tx: UnboundedSender<String>,
    lap_rx: UnboundedReceiver<String>,
    
    /// Speeds of the race in progress
    race_speeds: Option<[f64; 2]>,
    
    outcomes: Vec<RaceOutcome>,
    events: Vec<SceneEvent>,
    
    /// Time passed to the last update
    time: f64,
}

/// Rejects configurations the scene cannot run with.
fn validate(config: &CircuitConfig) -> Result<(), SceneError> {
    if !config.scale.is_finite() || config.scale <= 0.0 {
        return Err(SceneError::Config(format!("scale must be positive, got {}", config.scale)));
    }
    
    let (low, high) = config.race_speed;
    if low > high || low < 0 {
        return Err(SceneError::Config(format!(
            "race speed range must satisfy 0 <= low <= high, got ({}, {})",
            low, high
        )));
    }
    
    if !config.car.default_speed.is_finite() || !config.car.vertical_offset.is_finite() {
        return Err(SceneError::Config("car settings must be finite".to_string()));
    }
    
    Ok(())
}

impl<C: CircuitContext> CircuitScene<C> {
    /// Loads path 1, path 2, car 1 and car 2 (in that order).
    ///
    /// The sun cycle starts immediately; the camera starts free.
    pub async fn initialize(ctx: Arc<C>, config: CircuitConfig) -> Result<Self, SceneError> {
        validate(&config)?;
        
        let path1 = Arc::new(CircuitPath::load(ctx.as_ref(), &config.path1, config.scale).await?);
        let path2 = Arc::new(CircuitPath::load(ctx.as_ref(), &config.path2, config.scale).await?);
        
        let car1 = Car::load(config.car1.clone(), path1, Transform::identity(), config.car.clone());
        let car2 = Car::load(config.car2.clone(), path2, Transform::identity(), config.car.clone());
        
        let mut sky = SunCycle::new(&config.sun);
        sky.start();
        
        let (lap_tx, lap_rx) = unbounded_channel();
        
        info!(
            "Circuit ready: {} on {}, {} on {} (seed={})",
            car1.name(),
            config.path1.data_file,
            car2.name(),
            config.path2.data_file,
            ctx.seed()
        );
        
        Ok(Self {
            ctx,
            follow_camera: FollowCamera::from(&config.camera),
            config,
            car1,
            car2,
            sky,
            camera_mode: CameraMode::Free,
            camera: None,
            debug: false,
            lap_tx,
            lap_rx,
            race_speeds: None,
            outcomes: Vec::new(),
            events: Vec::new(),
            time: 0.0,
        })
    }
    
    /// Advances the scene by one frame.
    ///
    /// Returns the race outcome if a race was decided in this frame.
    pub fn update(&mut self, time: f64, delta: f64) -> Option<RaceOutcome> {
        self.time = time;
        self.sky.advance(delta);
        
        self.car1.update(delta);
        self.car2.update(delta);
        
        let outcome = self.resolve_laps();
        
        self.camera = match self.camera_mode {
            CameraMode::Free => None,
            CameraMode::Follow(slot) => Some(self.follow_camera.follow(self.car(slot).model())),
        };
        
        outcome
    }
    
    /// First lap notification wins; the rest of the frame's are dropped.
    fn resolve_laps(&mut self) -> Option<RaceOutcome> {
        let winner = self.lap_rx.try_recv().ok()?;
        while self.lap_rx.try_recv().is_ok() {}
        
        info!("🏁 The winner is {}!", winner);
        
        let outcome = RaceOutcome {
            winner,
            finished_at: self.time,
            speeds: self.race_speeds.take().unwrap_or([self.car1.speed(), self.car2.speed()]),
        };
        
        self.car1.reset();
        self.car2.reset();
        
        self.outcomes.push(outcome.clone());
        self.events.push(SceneEvent::RaceFinished(outcome.clone()));
        Some(outcome)
    }
    
    /// Puts both cars on the start line with random race speeds.
    ///
    /// Starting while a race is running restarts it with fresh speeds.
    pub fn start_race(&mut self) -> [f64; 2] {
        let (low, high) = self.config.race_speed;
        let speeds = [
            self.ctx.random_int(low, high) as f64,
            self.ctx.random_int(low, high) as f64,
        ];
        
        let tx = self.lap_tx.clone();
        self.car1.prepare_race(speeds[0], move |name: &str| {
            let _ = tx.send(name.to_string());
        });
        
        let tx = self.lap_tx.clone();
        self.car2.prepare_race(speeds[1], move |name: &str| {
            let _ = tx.send(name.to_string());
        });
        
        info!("Race started: {} at {}, {} at {}", self.car1.name(), speeds[0], self.car2.name(), speeds[1]);
        
        self.race_speeds = Some(speeds);
        self.events.push(SceneEvent::RaceStarted { speeds });
        speeds
    }
    
    /// True between `start_race` and the frame that decides it.
    pub fn is_racing(&self) -> bool {
        self.race_speeds.is_some()
    }
    
    /// Selects what drives the camera.
    pub fn set_camera_mode(&mut self, mode: CameraMode) {
        debug!("Camera mode {:?}", mode);
        self.camera_mode = mode;
        
        if mode == CameraMode::Free {
            self.camera = None;
        }
    }
    
    pub fn camera_mode(&self) -> CameraMode {
        self.camera_mode
    }
    
    /// Chase camera transform computed by the last update.
    pub fn camera(&self) -> Option<&Transform> {
        self.camera.as_ref()
    }
    
    /// Shows or hides the path polylines.
    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }
    
    /// Path polylines (blue for path 1, red for path 2) when debug is on.
    pub fn debug_lines(&self) -> Vec<DebugLine> {
        if !self.debug {
            return Vec::new();
        }
        
        vec![
            self.car1.path().debug_line(PATH1_DEBUG_COLOR),
            self.car2.path().debug_line(PATH2_DEBUG_COLOR),
        ]
    }
    
    pub fn car(&self, slot: CarSlot) -> &Car<Transform> {
        match slot {
            CarSlot::One => &self.car1,
            CarSlot::Two => &self.car2,
        }
    }
    
    pub fn car_mut(&mut self, slot: CarSlot) -> &mut Car<Transform> {
        match slot {
            CarSlot::One => &mut self.car1,
            CarSlot::Two => &mut self.car2,
        }
    }
    
    pub fn sky(&self) -> &SunCycle {
        &self.sky
    }
    
    pub fn sky_mut(&mut self) -> &mut SunCycle {
        &mut self.sky
    }
    
    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }
    
    pub fn context(&self) -> &Arc<C> {
        &self.ctx
    }
    
    /// Every race decided so far.
    pub fn outcomes(&self) -> &[RaceOutcome] {
        &self.outcomes
    }
    
    /// Takes the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }
    
    pub fn time(&self) -> f64 {
        self.time
    }
}
