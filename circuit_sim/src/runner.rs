//! Scenario runner - drives a headless scene frame by frame and checks it.

use crate::circuits::{self, OvalSpec};
use crate::context::SimContext;
use crate::exporter::{SimExport, SimFrame};
use crate::scenarios::ScenarioId;
use crate::scene::{CameraMode, CarSlot, CircuitScene, RaceOutcome};

use circuit_core::car::SPEED_DIVISOR;
use circuit_core::CircuitConfig;
use circuit_env::DataSource;
use nalgebra::Vector3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Tolerance on accumulated lap distance.
const DISTANCE_EPSILON: f64 = 1e-6;

/// Standard deviation of jittery frame deltas (seconds).
const JITTER_STD: f64 = 0.004;

/// Every this many ticks a jittery run stalls for `STALL_DELTA`.
const STALL_EVERY: u64 = 97;
const STALL_DELTA: f64 = 0.25;

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,
    
    /// Tick rate in Hz
    pub tick_rate_hz: u32,
    
    /// Simulation duration in seconds (races run at least one slow lap)
    pub max_duration_secs: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_rate_hz: 60,
            max_duration_secs: 10.0,
        }
    }
}

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,
    
    /// Seed used
    pub seed: u64,
    
    /// Whether scenario passed all assertions
    pub passed: bool,
    
    /// Total ticks executed
    pub total_ticks: u64,
    
    /// Final simulation time in seconds
    pub final_time_secs: f64,
    
    /// Laps completed by car 1 and car 2
    pub laps: [u64; 2],
    
    /// Race winner, for race scenarios
    pub winner: Option<String>,
    
    /// Failure message if any
    pub failure_reason: Option<String>,
}

/// Runs circuit scenarios against a `SimContext`.
pub struct ScenarioRunner {
    sim: SimConfig,
    
    circuit: CircuitConfig,
    
    /// Data served in place of the synthetic circuits
    sources: Vec<(DataSource, Vec<u8>)>,
    
    /// Ticks between exported frames
    export_interval: u64,
}

/// A scene being driven, with its bookkeeping.
struct Session<'a> {
    scene: CircuitScene<SimContext>,
    ctx: Arc<SimContext>,
    ticks: u64,
    time: f64,
    export: Option<&'a mut SimExport>,
    export_interval: u64,
}

impl Session<'_> {
    /// Advances clock and scene by one frame.
    fn step(&mut self, delta: f64) -> Option<RaceOutcome> {
        if delta.is_finite() && delta > 0.0 {
            self.time += delta;
            self.ctx.advance_time(Duration::from_secs_f64(delta));
        }
        
        let outcome = self.scene.update(self.time, delta);
        self.ticks += 1;
        
        let events = self.scene.take_events();
        if let Some(export) = self.export.as_deref_mut() {
            if self.ticks % self.export_interval == 0 || !events.is_empty() {
                export.add_frame(SimFrame::capture(&self.scene, &events));
            }
        }
        
        outcome
    }
    
    /// Progress in range and finite model positions for both cars.
    fn check_cars(&self) -> Result<(), String> {
        for slot in CarSlot::both() {
            let car = self.scene.car(slot);
            let progress = car.progress();
            
            if !(0.0..=1.0).contains(&progress) {
                return Err(format!("{} progress {} out of [0,1] at tick {}", car.name(), progress, self.ticks));
            }
            
            let position = car.model().position;
            if !position.coords.iter().all(|c| c.is_finite()) {
                return Err(format!("{} has non-finite position at tick {}", car.name(), self.ticks));
            }
        }
        Ok(())
    }
    
    /// Laps plus progress must equal the distance driven.
    fn check_distance(&self, slot: CarSlot, driven_secs: f64) -> Result<(), String> {
        let car = self.scene.car(slot);
        let expected = car.speed() * driven_secs / SPEED_DIVISOR;
        let actual = car.laps_completed() as f64 + car.progress();
        
        if (actual - expected).abs() > DISTANCE_EPSILON {
            return Err(format!(
                "{} covered {:.6} laps, expected {:.6}",
                car.name(),
                actual,
                expected
            ));
        }
        Ok(())
    }
    
    fn laps(&self) -> [u64; 2] {
        [
            self.scene.car(CarSlot::One).laps_completed(),
            self.scene.car(CarSlot::Two).laps_completed(),
        ]
    }
}

/// What a scenario body reports back.
#[derive(Default)]
struct Verdict {
    winner: Option<String>,
    failure: Option<String>,
}

impl Verdict {
    fn check(result: Result<(), String>) -> Self {
        Self {
            winner: None,
            failure: result.err(),
        }
    }
}

impl ScenarioRunner {
    /// Creates a runner on the default circuit configuration.
    pub fn new(seed: u64) -> Self {
        Self {
            sim: SimConfig {
                seed,
                ..SimConfig::default()
            },
            circuit: CircuitConfig::default(),
            sources: Vec::new(),
            export_interval: 10,
        }
    }
    
    /// Creates a runner from a full simulation config.
    pub fn from_config(mut sim: SimConfig) -> Self {
        sim.tick_rate_hz = sim.tick_rate_hz.max(1);
        Self {
            sim,
            ..Self::new(0)
        }
    }
    
    /// Sets the tick rate.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.sim.tick_rate_hz = hz.max(1);
        self
    }
    
    /// Sets the duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.sim.max_duration_secs = secs;
        self
    }
    
    /// Replaces the circuit configuration.
    pub fn with_circuit(mut self, circuit: CircuitConfig) -> Self {
        self.circuit = circuit;
        self
    }
    
    /// Serves `bytes` for `source` instead of a synthetic circuit.
    pub fn with_source(mut self, source: impl Into<DataSource>, bytes: Vec<u8>) -> Self {
        self.sources.push((source.into(), bytes));
        self
    }
    
    /// Sets how many ticks pass between exported frames.
    pub fn with_export_interval(mut self, ticks: u64) -> Self {
        self.export_interval = ticks.max(1);
        self
    }
    
    /// Runs a scenario and returns the result.
    pub async fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, None).await
    }
    
    /// Runs a scenario and records its frames.
    pub async fn run_with_export(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        let mut export = SimExport::new(scenario.name(), self.sim.seed);
        let result = self.execute(scenario, Some(&mut export)).await;
        export.finalize(result.passed, result.winner.clone());
        (result, export)
    }
    
    /// Context with explicit sources, falling back to the synthetic lanes.
    fn context(&self) -> Result<Arc<SimContext>, String> {
        let ctx = SimContext::shared(self.sim.seed);
        
        let lanes = [
            (&self.circuit.path1.data_file, OvalSpec::inner()),
            (&self.circuit.path2.data_file, OvalSpec::outer()),
        ];
        for (source, spec) in lanes {
            let bytes = circuits::to_json(&circuits::oval(spec))
                .map_err(|e| format!("Failed to encode synthetic circuit: {}", e))?;
            ctx.insert_source(source.clone(), bytes);
        }
        
        for (source, bytes) in &self.sources {
            ctx.insert_source(source.clone(), bytes.clone());
        }
        
        Ok(ctx)
    }
    
    async fn execute(&self, scenario: ScenarioId, mut export: Option<&mut SimExport>) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.sim.seed);
        
        let failed = |reason: String| ScenarioResult {
            scenario,
            seed: self.sim.seed,
            passed: false,
            total_ticks: 0,
            final_time_secs: 0.0,
            laps: [0, 0],
            winner: None,
            failure_reason: Some(reason),
        };
        
        let ctx = match self.context() {
            Ok(ctx) => ctx,
            Err(reason) => return failed(reason),
        };
        
        let mut scene = match CircuitScene::initialize(Arc::clone(&ctx), self.circuit.clone()).await {
            Ok(scene) => scene,
            Err(e) => return failed(e.to_string()),
        };
        
        if let Some(export) = export.as_deref_mut() {
            scene.set_debug(true);
            export.set_paths(&scene.debug_lines());
        }
        
        let mut session = Session {
            scene,
            ctx,
            ticks: 0,
            time: 0.0,
            export,
            export_interval: self.export_interval,
        };
        
        let verdict = match scenario {
            ScenarioId::FreeDrive => self.run_free_drive(&mut session),
            ScenarioId::Race => self.run_race(&mut session),
            ScenarioId::ManualScrub => self.run_manual_scrub(&mut session),
            ScenarioId::JitteryFrames => self.run_jittery_frames(&mut session),
        };
        
        let result = ScenarioResult {
            scenario,
            seed: self.sim.seed,
            passed: verdict.failure.is_none(),
            total_ticks: session.ticks,
            final_time_secs: session.time,
            laps: session.laps(),
            winner: verdict.winner,
            failure_reason: verdict.failure,
        };
        
        debug!(
            "Scenario {} finished: ticks={} time={:.2}s laps={:?}",
            scenario.name(),
            result.total_ticks,
            result.final_time_secs,
            result.laps
        );
        result
    }
    
    fn dt(&self) -> f64 {
        1.0 / self.sim.tick_rate_hz.max(1) as f64
    }
    
    fn target_ticks(&self) -> u64 {
        (self.sim.max_duration_secs.max(0.0) * self.sim.tick_rate_hz as f64) as u64
    }
    
    /// SIM-001: FreeDrive - both cars lap on their own.
    fn run_free_drive(&self, session: &mut Session<'_>) -> Verdict {
        for slot in CarSlot::both() {
            session.scene.car_mut(slot).set_autonomous(true);
        }
        
        let dt = self.dt();
        for _ in 0..self.target_ticks() {
            if session.step(dt).is_some() {
                return Verdict::check(Err("Race outcome without a race".to_string()));
            }
            if let Err(reason) = session.check_cars() {
                return Verdict::check(Err(reason));
            }
        }
        
        let driven = session.time;
        Verdict::check(
            session
                .check_distance(CarSlot::One, driven)
                .and_then(|_| session.check_distance(CarSlot::Two, driven)),
        )
    }
    
    /// SIM-002: Race - faster car wins, both cars go back to idle.
    fn run_race(&self, session: &mut Session<'_>) -> Verdict {
        let speeds = session.scene.start_race();
        let dt = self.dt();
        
        // Always leave room for the slowest possible lap
        let slowest = self.circuit.race_speed.0.max(1) as f64;
        let timeout = self.sim.max_duration_secs.max(SPEED_DIVISOR / slowest + 1.0);
        let max_ticks = (timeout / dt).ceil() as u64;
        
        let mut outcome = None;
        for _ in 0..max_ticks {
            outcome = session.step(dt);
            if outcome.is_some() {
                break;
            }
        }
        
        let Some(outcome) = outcome else {
            return Verdict::check(Err(format!("No winner after {:.1}s", session.time)));
        };
        
        let winner_speed = if outcome.winner == session.scene.car(CarSlot::One).name() {
            speeds[0]
        } else {
            speeds[1]
        };
        
        let mut verdict = Verdict {
            winner: Some(outcome.winner.clone()),
            failure: None,
        };
        
        // Frames quantize lap times, so only a frame-sized lead is decisive
        let best_lap = SPEED_DIVISOR / speeds[0].max(speeds[1]);
        let winner_lap = SPEED_DIVISOR / winner_speed;
        if winner_lap > best_lap + dt + DISTANCE_EPSILON {
            verdict.failure = Some(format!(
                "{} won at speed {} but speeds were {:?}",
                outcome.winner, winner_speed, speeds
            ));
            return verdict;
        }
        
        // The winning lap ends within one frame after its exact lap time
        if outcome.finished_at < winner_lap - DISTANCE_EPSILON
            || outcome.finished_at > winner_lap + dt + DISTANCE_EPSILON
        {
            verdict.failure = Some(format!(
                "Race decided at {:.3}s, lap time is {:.3}s",
                outcome.finished_at, winner_lap
            ));
            return verdict;
        }
        
        for slot in CarSlot::both() {
            let car = session.scene.car(slot);
            if car.progress() != 0.0 || car.is_autonomous() || car.has_lap_callback() {
                verdict.failure = Some(format!("{} was not reset after the race", car.name()));
                return verdict;
            }
        }
        
        verdict
    }
    
    /// SIM-003: ManualScrub - slider-driven progress with the chase camera.
    fn run_manual_scrub(&self, session: &mut Session<'_>) -> Verdict {
        session.scene.set_camera_mode(CameraMode::Follow(CarSlot::One));
        
        let dt = self.dt();
        let steps = self.target_ticks().max(2);
        let lift = Vector3::new(0.0, self.circuit.car.vertical_offset, 0.0);
        let offset = self.circuit.camera.follow_offset;
        
        let mut start = None;
        for i in 0..=steps {
            let progress = i as f64 / steps as f64;
            session.scene.car_mut(CarSlot::One).set_progress(progress);
            session.step(dt);
            
            let car = session.scene.car(CarSlot::One);
            let model = car.model();
            let expected = car.path().point(progress) + lift;
            
            if (model.position - expected).norm() > DISTANCE_EPSILON {
                return Verdict::check(Err(format!("Car off its path at progress {:.4}", progress)));
            }
            
            let Some(camera) = session.scene.camera() else {
                return Verdict::check(Err("Chase camera missing in follow mode".to_string()));
            };
            let camera_expected = model.position + model.orientation * offset;
            if (camera.position - camera_expected).norm() > DISTANCE_EPSILON {
                return Verdict::check(Err(format!("Camera not behind car at progress {:.4}", progress)));
            }
            
            if car.is_autonomous() || car.laps_completed() > 0 {
                return Verdict::check(Err("Scrubbing moved the car on its own".to_string()));
            }
            
            start.get_or_insert(model.position);
        }
        
        // Progress 1 is the start line again
        let end = session.scene.car(CarSlot::One).model().position;
        if let Some(start) = start {
            if (end - start).norm() > DISTANCE_EPSILON {
                return Verdict::check(Err("Lap end does not meet lap start".to_string()));
            }
        }
        
        // Out-of-range slider input is clamped on the next frame
        session.scene.car_mut(CarSlot::One).set_progress(1.5);
        session.step(dt);
        let clamped_high = session.scene.car(CarSlot::One).progress();
        session.scene.car_mut(CarSlot::One).set_progress(-0.25);
        session.step(dt);
        let clamped_low = session.scene.car(CarSlot::One).progress();
        
        if clamped_high != 1.0 || clamped_low != 0.0 {
            return Verdict::check(Err(format!(
                "Slider input not clamped ({}, {})",
                clamped_high, clamped_low
            )));
        }
        
        Verdict::check(session.check_cars())
    }
    
    /// SIM-004: JitteryFrames - noisy deltas, stalls and a zero first frame.
    fn run_jittery_frames(&self, session: &mut Session<'_>) -> Verdict {
        for slot in CarSlot::both() {
            session.scene.car_mut(slot).set_autonomous(true);
        }
        
        let mut rng = ChaCha8Rng::seed_from_u64(self.sim.seed.wrapping_mul(0x9e3779b97f4a7c15));
        let normal = match Normal::new(self.dt(), JITTER_STD) {
            Ok(normal) => normal,
            Err(e) => return Verdict::check(Err(format!("Invalid jitter distribution: {}", e))),
        };
        
        let target = self.target_ticks().max(1);
        for tick in 0..target {
            let delta = if tick == 0 {
                0.0
            } else if tick % STALL_EVERY == 0 {
                STALL_DELTA
            } else {
                normal.sample(&mut rng).max(0.0)
            };
            
            session.step(delta);
            if let Err(reason) = session.check_cars() {
                return Verdict::check(Err(reason));
            }
        }
        
        let driven = session.time;
        Verdict::check(
            session
                .check_distance(CarSlot::One, driven)
                .and_then(|_| session.check_distance(CarSlot::Two, driven)),
        )
    }
}
