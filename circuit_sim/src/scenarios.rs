//! Headless circuit scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// SIM-001: Both cars lap on their own at default speed
    FreeDrive,
    
    /// SIM-002: Random-speed race, first lap wins
    Race,
    
    /// SIM-003: Manual progress scrubbing with the chase camera
    ManualScrub,
    
    /// SIM-004: Autonomous laps under noisy and stalled frame deltas
    JitteryFrames,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::FreeDrive,
            ScenarioId::Race,
            ScenarioId::ManualScrub,
            ScenarioId::JitteryFrames,
        ]
    }
    
    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::FreeDrive => "free_drive",
            ScenarioId::Race => "race",
            ScenarioId::ManualScrub => "manual_scrub",
            ScenarioId::JitteryFrames => "jittery_frames",
        }
    }
    
    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::FreeDrive => "Both cars autonomous at default speed, lap count matches distance",
            ScenarioId::Race => "Random speeds in [45,75], faster car wins, both cars reset",
            ScenarioId::ManualScrub => "Scrub car 1 across the lap, chase camera stays behind it",
            ScenarioId::JitteryFrames => "Gaussian frame deltas with stalls, progress stays in [0,1]",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;
    
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free_drive" | "freedrive" | "sim-001" => Ok(ScenarioId::FreeDrive),
            "race" | "sim-002" => Ok(ScenarioId::Race),
            "manual_scrub" | "manualscrub" | "scrub" | "sim-003" => Ok(ScenarioId::ManualScrub),
            "jittery_frames" | "jitteryframes" | "jitter" | "sim-004" => Ok(ScenarioId::JitteryFrames),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_parse_names_and_aliases() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
        }
        assert_eq!("SIM-002".parse::<ScenarioId>(), Ok(ScenarioId::Race));
        assert_eq!("jitter".parse::<ScenarioId>(), Ok(ScenarioId::JitteryFrames));
    }
    
    #[test]
    fn test_parse_unknown() {
        let err = "split_brain".parse::<ScenarioId>().unwrap_err();
        assert!(err.contains("split_brain"));
    }
}
