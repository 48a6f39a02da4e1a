//! Circuit configuration.
//!
//! Every tunable of the circuit lives here with its default. A JSON file
//! only needs the keys it overrides:
//!
//! ```json
//! { "scale": 12.0, "car": { "vertical_offset": 1.0 }, "path1": { "data_file": "a.json", "t_start": 0.2 } }
//! ```

use crate::camera::CameraSettings;
use crate::car::{CarSettings, CarSpec, RACE_SPEED_RANGE};
use crate::circuit_path::{PathSource, BLENDER_SCALE};
use crate::sky::SunSettings;
use serde::{Deserialize, Serialize};

/// Full configuration of the two-car circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    /// Scale applied to authored path points
    pub scale: f64,
    
    pub path1: PathSource,
    pub path2: PathSource,
    
    pub car1: CarSpec,
    pub car2: CarSpec,
    
    pub car: CarSettings,
    
    /// Inclusive race speed range
    pub race_speed: (i64, i64),
    
    pub sun: SunSettings,
    pub camera: CameraSettings,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            scale: BLENDER_SCALE,
            path1: PathSource::new("/data/path-1.json", 0.1432),
            path2: PathSource::new("/data/path-2.json", 0.8581),
            car1: CarSpec::new("Car 1", "/models/Car 1.glb", "yellow"),
            car2: CarSpec::new("Car 2", "/models/Car 2.glb", "red.054"),
            car: CarSettings::default(),
            race_speed: RACE_SPEED_RANGE,
            sun: SunSettings::default(),
            camera: CameraSettings::default(),
        }
    }
}

impl CircuitConfig {
    /// Parses a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
    
    /// Serializes the configuration as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_defaults() {
        let config = CircuitConfig::default();
        
        assert_eq!(config.scale, 10.0);
        assert_eq!(config.path1.t_start, 0.1432);
        assert_eq!(config.path2.t_start, 0.8581);
        assert_eq!(config.car.default_speed, 50.0);
        assert_eq!(config.car.vertical_offset, 0.8);
        assert_eq!(config.race_speed, (45, 75));
    }
    
    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CircuitConfig::from_json(
            r#"{ "scale": 2.5, "car": { "vertical_offset": 1.2 }, "path2": { "data_file": "b.json", "t_start": 0.5 } }"#,
        )
        .unwrap();
        
        assert_eq!(config.scale, 2.5);
        assert_eq!(config.car.vertical_offset, 1.2);
        assert_eq!(config.car.default_speed, 50.0);
        assert_eq!(config.path2, PathSource::new("b.json", 0.5));
        assert_eq!(config.path1, CircuitConfig::default().path1);
    }
    
    #[test]
    fn test_json_round_trip() {
        let config = CircuitConfig::default();
        let parsed = CircuitConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
    
    #[test]
    fn test_rejects_wrong_types() {
        assert!(CircuitConfig::from_json(r#"{ "scale": "big" }"#).is_err());
    }
}
