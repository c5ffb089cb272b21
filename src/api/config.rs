use serde::{Deserialize, Serialize};

use crate::core::{DEFAULT_MAX_DEVIATION_DEG, GazePoint, ScreenGeometry, StimulusSpec};
use crate::error::{CalverError, CalverResult};

fn default_max_deviation_deg() -> f64 {
    DEFAULT_MAX_DEVIATION_DEG
}

/// Run configuration shared by every file of a batch.
///
/// This type is serializable so a lab can keep its screen and stimulus layout
/// in a JSON file next to the recordings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierConfig {
    pub geometry: ScreenGeometry,
    #[serde(default)]
    pub stimuli: StimulusSpec,
    #[serde(default = "default_max_deviation_deg")]
    pub max_deviation_deg: f64,
}

impl VerifierConfig {
    /// Creates a config with the default five-point layout and 6 degree threshold.
    #[must_use]
    pub fn new(geometry: ScreenGeometry) -> Self {
        Self {
            geometry,
            stimuli: StimulusSpec::default(),
            max_deviation_deg: default_max_deviation_deg(),
        }
    }

    /// Replaces the stimulus layout.
    #[must_use]
    pub fn with_stimuli(mut self, stimuli: StimulusSpec) -> Self {
        self.stimuli = stimuli;
        self
    }

    /// Adds or replaces one stimulus location.
    #[must_use]
    pub fn with_stimulus(mut self, name: impl Into<String>, location: GazePoint) -> Self {
        self.stimuli = self.stimuli.with_stimulus(name, location);
        self
    }

    /// Sets the exclusive accuracy threshold in degrees of visual angle.
    #[must_use]
    pub fn with_max_deviation_deg(mut self, max_deviation_deg: f64) -> Self {
        self.max_deviation_deg = max_deviation_deg;
        self
    }

    pub fn validate(&self) -> CalverResult<()> {
        self.geometry.validate()?;
        self.stimuli.validate()?;
        if !self.max_deviation_deg.is_finite() || self.max_deviation_deg <= 0.0 {
            return Err(CalverError::InvalidConfig(
                "max deviation must be finite and > 0".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn from_json_str(raw: &str) -> CalverResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> CalverResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::VerifierConfig;

    #[test]
    fn json_defaults_fill_stimuli_and_threshold() {
        let raw = r#"{"geometry":{"height_mm":344,"width_mm":594,"height_px":1080,"width_px":1920}}"#;
        let config = VerifierConfig::from_json_str(raw).expect("valid config");
        assert_eq!(config.stimuli.len(), 5);
        assert_eq!(config.max_deviation_deg, 6.0);
    }

    #[test]
    fn json_rejects_zero_threshold() {
        let raw = r#"{"geometry":{"height_mm":344,"width_mm":594,"height_px":1080,"width_px":1920},"max_deviation_deg":0}"#;
        let err = VerifierConfig::from_json_str(raw).expect_err("zero threshold");
        assert!(format!("{err}").contains("max deviation"));
    }
}
