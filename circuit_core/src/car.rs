//! Cars - progress-driven entities bound to a circuit path.
//!
//! A car owns a progress value in [0,1] and, when autonomous, advances it
//! every tick at its configured speed. Each tick it asks its path to place
//! the externally owned model.
//!
//! # States
//!
//! ```text
//!            prepare_race / set_autonomous(true)
//!    Idle ─────────────────────────────────────────► Autonomous
//!     ▲                                                  │
//!     └──────────────────── reset ───────────────────────┘
//! ```

use crate::circuit_path::CircuitPath;
use crate::placement::Placeable;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Converts `speed * seconds` into lap fractions.
///
/// Lap times depend on this exact value.
pub const SPEED_DIVISOR: f64 = 500.0;

/// Speed of a car outside of a race.
pub const DEFAULT_CAR_SPEED: f64 = 50.0;

/// Height of the model pivot above the curve samples.
pub const DEFAULT_VERTICAL_OFFSET: f64 = 0.8;

/// Inclusive range race speeds are drawn from.
pub const RACE_SPEED_RANGE: (i64, i64) = (45, 75);

/// Single-slot lap notification.
pub type LapCallback = Box<dyn FnMut() + Send>;

/// A progress slider mirroring a car's position on the lap.
pub trait SliderBinding: Send {
    /// Displays `value` without feeding it back into the car.
    fn set_value(&mut self, value: f64);
    
    /// Enables or disables user input.
    fn set_enabled(&mut self, enabled: bool);
}

/// A "move on its own" checkbox mirroring autonomous mode.
pub trait CheckboxBinding: Send {
    /// Displays `checked` without feeding it back into the car.
    fn set_checked(&mut self, checked: bool);
    
    /// Enables or disables user input.
    fn set_enabled(&mut self, enabled: bool);
}

/// Identity of a car and the assets the renderer uses for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarSpec {
    /// Display name (also reported as the race winner)
    pub name: String,
    
    /// Model asset, resolved by the rendering collaborator
    pub model_file: String,
    
    /// Material whose color the UI can change
    pub material_name: String,
}

impl CarSpec {
    /// Creates a car spec.
    pub fn new(name: &str, model_file: &str, material_name: &str) -> Self {
        Self {
            name: name.to_string(),
            model_file: model_file.to_string(),
            material_name: material_name.to_string(),
        }
    }
}

/// Tunables shared by every car.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarSettings {
    /// Speed restored on reset
    pub default_speed: f64,
    
    /// Height added to the model after placement
    pub vertical_offset: f64,
}

impl Default for CarSettings {
    fn default() -> Self {
        Self {
            default_speed: DEFAULT_CAR_SPEED,
            vertical_offset: DEFAULT_VERTICAL_OFFSET,
        }
    }
}

/// Whether a car advances by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveMode {
    /// Progress only changes through `move_to` / `set_progress`
    Idle,
    
    /// Progress advances every `update`
    Autonomous,
}

/// A car following a circuit path.
pub struct Car<M: Placeable> {
    spec: CarSpec,
    
    /// Shared, read-only path (the path does not know its cars)
    path: Arc<CircuitPath>,
    
    /// Visual representation owned by the rendering collaborator
    model: M,
    
    /// Lap completion in [0,1]
    progress: f64,
    
    /// Speed in `SPEED_DIVISOR`-scaled units
    speed: f64,
    
    mode: DriveMode,
    
    settings: CarSettings,
    
    /// At most one lap callback
    on_lap_completed: Option<LapCallback>,
    
    progress_slider: Option<Box<dyn SliderBinding>>,
    move_checkbox: Option<Box<dyn CheckboxBinding>>,
    
    /// Lap boundaries crossed since creation
    laps_completed: u64,
}

impl<M: Placeable> Car<M> {
    /// Binds a model to `path` and places it on the start line.
    pub fn load(spec: CarSpec, path: Arc<CircuitPath>, model: M, settings: CarSettings) -> Self {
        let mut car = Self {
            spec,
            path,
            model,
            progress: 0.0,
            speed: settings.default_speed,
            mode: DriveMode::Idle,
            settings,
            on_lap_completed: None,
            progress_slider: None,
            move_checkbox: None,
            laps_completed: 0,
        };
        car.move_to(0.0);
        
        debug!("Loaded car {} (model {})", car.spec.name, car.spec.model_file);
        car
    }
    
    /// Advances the car by `delta` seconds and re-places the model.
    ///
    /// In autonomous mode progress grows by `speed * delta / SPEED_DIVISOR`.
    /// Crossing 1 fires the lap callback once and subtracts exactly 1, keeping
    /// the overshoot. The model is re-placed in every mode so externally set
    /// progress is honoured. Negative or non-finite `delta` counts as 0.
    pub fn update(&mut self, delta: f64) {
        let delta = if delta.is_finite() && delta >= 0.0 {
            delta
        } else {
            warn!("Car {} ignoring invalid frame delta {}", self.spec.name, delta);
            0.0
        };
        
        if self.mode == DriveMode::Autonomous {
            self.progress += self.speed * delta / SPEED_DIVISOR;
            
            if self.progress > 1.0 {
                self.laps_completed += 1;
                debug!("Car {} completed lap {}", self.spec.name, self.laps_completed);
                
                if let Some(callback) = self.on_lap_completed.as_mut() {
                    callback();
                }
                self.progress -= 1.0;
            }
        }
        
        self.move_to(self.progress);
    }
    
    /// Clamps `t` into [0,1], stores it and places the model there.
    pub fn move_to(&mut self, t: f64) {
        // max/min (not clamp) so NaN collapses to 0
        self.progress = t.max(0.0).min(1.0);
        
        if let Some(slider) = self.progress_slider.as_mut() {
            slider.set_value(self.progress);
        }
        
        self.path.place_model(&mut self.model, self.progress);
        self.model
            .translate(Vector3::new(0.0, self.settings.vertical_offset, 0.0));
    }
    
    /// Puts the car on the start line in race mode.
    ///
    /// `on_finished` receives the car name when the first lap completes.
    /// UI controls are locked until `reset`.
    pub fn prepare_race<F>(&mut self, speed: f64, mut on_finished: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.move_to(0.0);
        
        let name = self.spec.name.clone();
        self.on_lap_completed = Some(Box::new(move || on_finished(&name)));
        
        self.speed = speed;
        self.mode = DriveMode::Autonomous;
        
        if let Some(checkbox) = self.move_checkbox.as_mut() {
            checkbox.set_checked(true);
            checkbox.set_enabled(false);
        }
        if let Some(slider) = self.progress_slider.as_mut() {
            slider.set_enabled(false);
        }
        
        debug!("Car {} ready to race at speed {}", self.spec.name, speed);
    }
    
    /// Returns the car to its idle, default-speed state on the start line.
    pub fn reset(&mut self) {
        self.move_to(0.0);
        
        if let Some(checkbox) = self.move_checkbox.as_mut() {
            checkbox.set_checked(false);
            checkbox.set_enabled(true);
        }
        if let Some(slider) = self.progress_slider.as_mut() {
            slider.set_enabled(true);
        }
        
        self.on_lap_completed = None;
        self.speed = self.settings.default_speed;
        self.mode = DriveMode::Idle;
    }
    
    /// Stores slider input clamped into [0,1]; the next `update` places the model.
    pub fn set_progress(&mut self, progress: f64) {
        self.progress = progress.max(0.0).min(1.0);
    }
    
    /// Switches autonomous mode (checkbox input).
    pub fn set_autonomous(&mut self, autonomous: bool) {
        self.mode = if autonomous {
            DriveMode::Autonomous
        } else {
            DriveMode::Idle
        };
    }
    
    /// Sets the speed.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }
    
    /// Replaces the lap callback (`None` clears it).
    pub fn set_on_lap_completed(&mut self, callback: Option<LapCallback>) {
        self.on_lap_completed = callback;
    }
    
    /// Binds a progress slider, replacing any previous one.
    pub fn bind_progress_slider(&mut self, mut slider: Box<dyn SliderBinding>) {
        slider.set_value(self.progress);
        self.progress_slider = Some(slider);
    }
    
    /// Binds a move checkbox, replacing any previous one.
    pub fn bind_move_checkbox(&mut self, mut checkbox: Box<dyn CheckboxBinding>) {
        checkbox.set_checked(self.is_autonomous());
        self.move_checkbox = Some(checkbox);
    }
    
    pub fn name(&self) -> &str {
        &self.spec.name
    }
    
    pub fn spec(&self) -> &CarSpec {
        &self.spec
    }
    
    pub fn progress(&self) -> f64 {
        self.progress
    }
    
    pub fn speed(&self) -> f64 {
        self.speed
    }
    
    pub fn mode(&self) -> DriveMode {
        self.mode
    }
    
    pub fn is_autonomous(&self) -> bool {
        self.mode == DriveMode::Autonomous
    }
    
    pub fn has_lap_callback(&self) -> bool {
        self.on_lap_completed.is_some()
    }
    
    pub fn laps_completed(&self) -> u64 {
        self.laps_completed
    }
    
    pub fn path(&self) -> &Arc<CircuitPath> {
        &self.path
    }
    
    pub fn model(&self) -> &M {
        &self.model
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::Transform;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    
    fn square_path() -> Arc<CircuitPath> {
        let samples = [
            [0.0, 0.0, 0.0],
            [10.0, 0.0, 0.0],
            [10.0, 10.0, 0.0],
            [0.0, 10.0, 0.0],
        ];
        Arc::new(CircuitPath::from_samples(&samples, 0.1432, 1.0).unwrap())
    }
    
    fn test_car() -> Car<Transform> {
        Car::load(
            CarSpec::new("Car 1", "/models/Car 1.glb", "yellow"),
            square_path(),
            Transform::identity(),
            CarSettings::default(),
        )
    }
    
    fn counting_callback(counter: &Arc<AtomicUsize>) -> LapCallback {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }
    
    #[derive(Default)]
    struct ControlLog {
        values: Vec<f64>,
        checked: Vec<bool>,
        enabled: Vec<bool>,
    }
    
    struct RecordingSlider(Arc<Mutex<ControlLog>>);
    
    impl SliderBinding for RecordingSlider {
        fn set_value(&mut self, value: f64) {
            self.0.lock().unwrap().values.push(value);
        }
        
        fn set_enabled(&mut self, enabled: bool) {
            self.0.lock().unwrap().enabled.push(enabled);
        }
    }
    
    struct RecordingCheckbox(Arc<Mutex<ControlLog>>);
    
    impl CheckboxBinding for RecordingCheckbox {
        fn set_checked(&mut self, checked: bool) {
            self.0.lock().unwrap().checked.push(checked);
        }
        
        fn set_enabled(&mut self, enabled: bool) {
            self.0.lock().unwrap().enabled.push(enabled);
        }
    }
    
    #[test]
    fn test_load_places_model_on_start_line() {
        let car = test_car();
        
        assert_eq!(car.progress(), 0.0);
        assert_eq!(car.mode(), DriveMode::Idle);
        assert_eq!(car.speed(), DEFAULT_CAR_SPEED);
        
        let expected = car.path().point(0.0) + Vector3::new(0.0, DEFAULT_VERTICAL_OFFSET, 0.0);
        assert_relative_eq!(car.model().position, expected, epsilon = 1e-12);
    }
    
    #[test]
    fn test_move_to_clamps() {
        let mut car = test_car();
        
        car.move_to(-0.5);
        assert_eq!(car.progress(), 0.0);
        
        car.move_to(1.5);
        assert_eq!(car.progress(), 1.0);
        
        car.move_to(f64::NAN);
        assert_eq!(car.progress(), 0.0);
    }
    
    #[test]
    fn test_move_to_is_idempotent() {
        let mut car = test_car();
        
        car.move_to(0.3);
        let first = (car.progress(), *car.model());
        car.move_to(0.3);
        let second = (car.progress(), *car.model());
        
        assert_eq!(first, second);
    }
    
    #[test]
    fn test_idle_update_keeps_progress() {
        let mut car = test_car();
        car.move_to(0.42);
        
        for delta in [0.0, 0.016, 1.0, 100.0] {
            car.update(delta);
            assert_eq!(car.progress(), 0.42);
        }
    }
    
    #[test]
    fn test_autonomous_update_advances() {
        let mut car = test_car();
        car.set_autonomous(true);
        
        car.update(0.0);
        assert_eq!(car.progress(), 0.0);
        
        car.update(1.0);
        assert_relative_eq!(car.progress(), DEFAULT_CAR_SPEED / SPEED_DIVISOR, epsilon = 1e-12);
    }
    
    #[test]
    fn test_lap_wraps_and_fires_once() {
        let mut car = test_car();
        let counter = Arc::new(AtomicUsize::new(0));
        car.set_on_lap_completed(Some(counting_callback(&counter)));
        car.set_autonomous(true);
        car.set_speed(500.0);
        car.move_to(0.5);
        
        car.update(1.0);
        
        assert_relative_eq!(car.progress(), 0.5, epsilon = 1e-12);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(car.laps_completed(), 1);
    }
    
    #[test]
    fn test_reaching_exactly_one_does_not_wrap() {
        let mut car = test_car();
        let counter = Arc::new(AtomicUsize::new(0));
        car.set_on_lap_completed(Some(counting_callback(&counter)));
        car.set_autonomous(true);
        car.set_speed(500.0);
        car.move_to(0.5);
        
        car.update(0.5);
        
        assert_eq!(car.progress(), 1.0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
    
    #[test]
    fn test_invalid_delta_does_not_advance() {
        let mut car = test_car();
        car.set_autonomous(true);
        car.move_to(0.2);
        
        car.update(-1.0);
        car.update(f64::NAN);
        car.update(f64::INFINITY);
        
        assert_eq!(car.progress(), 0.2);
    }
    
    #[test]
    fn test_external_progress_is_applied_on_update() {
        let mut car = test_car();
        
        car.set_progress(0.75);
        car.update(0.016);
        
        assert_eq!(car.progress(), 0.75);
        let expected = car.path().point(0.75) + Vector3::new(0.0, DEFAULT_VERTICAL_OFFSET, 0.0);
        assert_relative_eq!(car.model().position, expected, epsilon = 1e-12);
        
        car.set_progress(3.0);
        assert_eq!(car.progress(), 1.0);
        car.update(0.016);
        assert_eq!(car.progress(), 1.0);
    }
    
    #[test]
    fn test_out_of_range_progress_does_not_complete_lap() {
        let mut car = test_car();
        let laps = Arc::new(AtomicUsize::new(0));
        car.set_on_lap_completed(Some(counting_callback(&laps)));
        car.set_autonomous(true);
        
        car.set_progress(2.0);
        car.update(0.0);
        
        assert_eq!(laps.load(Ordering::SeqCst), 0);
        assert_eq!(car.laps_completed(), 0);
        assert_eq!(car.progress(), 1.0);
        
        car.set_progress(-4.0);
        assert_eq!(car.progress(), 0.0);
        car.set_progress(f64::NAN);
        assert_eq!(car.progress(), 0.0);
    }
    
    #[test]
    fn test_prepare_race_and_reset() {
        let mut car = test_car();
        let winners = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&winners);
        
        car.move_to(0.6);
        car.prepare_race(60.0, move |name| sink.lock().unwrap().push(name.to_string()));
        
        assert_eq!(car.progress(), 0.0);
        assert_eq!(car.speed(), 60.0);
        assert!(car.is_autonomous());
        assert!(car.has_lap_callback());
        
        // 60 / 500 per second: one lap takes 500/60 s
        for _ in 0..9 {
            car.update(1.0);
        }
        assert_eq!(winners.lock().unwrap().as_slice(), ["Car 1".to_string()]);
        
        car.reset();
        assert_eq!(car.progress(), 0.0);
        assert_eq!(car.speed(), DEFAULT_CAR_SPEED);
        assert!(!car.is_autonomous());
        assert!(!car.has_lap_callback());
    }
    
    #[test]
    fn test_bound_controls_follow_state() {
        let mut car = test_car();
        let slider_log = Arc::new(Mutex::new(ControlLog::default()));
        let checkbox_log = Arc::new(Mutex::new(ControlLog::default()));
        car.bind_progress_slider(Box::new(RecordingSlider(Arc::clone(&slider_log))));
        car.bind_move_checkbox(Box::new(RecordingCheckbox(Arc::clone(&checkbox_log))));
        
        car.move_to(0.25);
        assert_eq!(slider_log.lock().unwrap().values.last(), Some(&0.25));
        
        car.prepare_race(50.0, |_| {});
        {
            let slider = slider_log.lock().unwrap();
            let checkbox = checkbox_log.lock().unwrap();
            assert_eq!(slider.values.last(), Some(&0.0));
            assert_eq!(slider.enabled.last(), Some(&false));
            assert_eq!(checkbox.checked.last(), Some(&true));
            assert_eq!(checkbox.enabled.last(), Some(&false));
        }
        
        car.reset();
        let slider = slider_log.lock().unwrap();
        let checkbox = checkbox_log.lock().unwrap();
        assert_eq!(slider.enabled.last(), Some(&true));
        assert_eq!(checkbox.checked.last(), Some(&false));
        assert_eq!(checkbox.enabled.last(), Some(&true));
    }
    
    mod properties {
        use super::*;
        use proptest::prelude::*;
        
        proptest! {
            #[test]
            fn prop_move_to_keeps_progress_in_range(t in -10.0f64..10.0) {
                let mut car = test_car();
                car.move_to(t);
                prop_assert!((0.0..=1.0).contains(&car.progress()));
            }
            
            #[test]
            fn prop_autonomous_progress_stays_in_range(
                speed in 1.0f64..500.0,
                deltas in proptest::collection::vec(0.0f64..0.5, 1..50),
            ) {
                let mut car = test_car();
                car.set_autonomous(true);
                car.set_speed(speed);
                for delta in deltas {
                    car.update(delta);
                    prop_assert!((0.0..=1.0).contains(&car.progress()));
                }
            }
        }
    }
}
