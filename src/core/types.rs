use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CalverError, CalverResult};

/// Per-eye validity codes reported by the tracker. Code `0` marks a trusted eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EyeValidity {
    pub left: Option<u8>,
    pub right: Option<u8>,
}

impl EyeValidity {
    #[must_use]
    pub fn new(left: Option<u8>, right: Option<u8>) -> Self {
        Self { left, right }
    }

    #[must_use]
    pub fn both_valid() -> Self {
        Self::new(Some(0), Some(0))
    }

    #[must_use]
    pub fn left_valid(self) -> bool {
        self.left == Some(0)
    }

    #[must_use]
    pub fn right_valid(self) -> bool {
        self.right == Some(0)
    }

    #[must_use]
    pub fn any_valid(self) -> bool {
        self.left_valid() || self.right_valid()
    }

    #[must_use]
    pub fn all_valid(self) -> bool {
        self.left_valid() && self.right_valid()
    }
}

/// One recorded gaze instant after loader normalization.
///
/// Every "no data" representation of the export format is `None` here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GazeSample {
    pub timestamp: Option<i64>,
    pub stimulus: Option<String>,
    pub fixation_index: Option<String>,
    pub event_duration_ms: Option<i64>,
    pub gaze_x: Option<i32>,
    pub gaze_y: Option<i32>,
    /// `None` when the recording carries no validity columns.
    pub validity: Option<EyeValidity>,
    pub distance_left_mm: Option<f64>,
    pub distance_right_mm: Option<f64>,
}

impl GazeSample {
    #[must_use]
    pub fn at(timestamp: i64) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_stimulus(mut self, stimulus: impl Into<String>) -> Self {
        self.stimulus = Some(stimulus.into());
        self
    }

    #[must_use]
    pub fn with_fixation(mut self, fixation_index: impl Into<String>) -> Self {
        self.fixation_index = Some(fixation_index.into());
        self
    }

    #[must_use]
    pub fn with_gaze(mut self, x: i32, y: i32) -> Self {
        self.gaze_x = Some(x);
        self.gaze_y = Some(y);
        self
    }

    #[must_use]
    pub fn with_validity(mut self, validity: EyeValidity) -> Self {
        self.validity = Some(validity);
        self
    }

    #[must_use]
    pub fn with_distance(mut self, left_mm: f64, right_mm: f64) -> Self {
        self.distance_left_mm = Some(left_mm);
        self.distance_right_mm = Some(right_mm);
        self
    }

    #[must_use]
    pub fn gaze(&self) -> Option<GazePoint> {
        match (self.gaze_x, self.gaze_y) {
            (Some(x), Some(y)) => Some(GazePoint::new(f64::from(x), f64::from(y))),
            _ => None,
        }
    }
}

/// Pixel-space point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazePoint {
    pub x: f64,
    pub y: f64,
}

impl GazePoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(self, other: GazePoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Per-axis value pair used for dispersion measures.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisPair {
    pub x: f64,
    pub y: f64,
}

impl AxisPair {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Ordered mapping from stimulus name to its expected on-screen pixel coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StimulusSpec {
    locations: IndexMap<String, GazePoint>,
}

impl Default for StimulusSpec {
    /// The five-point calibration layout of a 1920x1080 presentation screen.
    fn default() -> Self {
        Self::from_pairs([
            ("TopLeft_converted.avi", GazePoint::new(480.0, 270.0)),
            ("TopRight_converted.avi", GazePoint::new(1440.0, 270.0)),
            ("Center_converted.avi", GazePoint::new(960.0, 540.0)),
            ("BottomLeft_converted.avi", GazePoint::new(480.0, 810.0)),
            ("BottomRight_converted.avi", GazePoint::new(1440.0, 810.0)),
        ])
    }
}

impl StimulusSpec {
    /// A layout without stimuli; add locations with `with_stimulus`.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            locations: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, GazePoint)>,
        S: Into<String>,
    {
        Self {
            locations: pairs
                .into_iter()
                .map(|(name, point)| (name.into(), point))
                .collect(),
        }
    }

    /// Adds or replaces one stimulus location.
    #[must_use]
    pub fn with_stimulus(mut self, name: impl Into<String>, location: GazePoint) -> Self {
        self.locations.insert(name.into(), location);
        self
    }

    #[must_use]
    pub fn location(&self, name: &str) -> Option<GazePoint> {
        self.locations.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.locations.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, GazePoint)> {
        self.locations
            .iter()
            .map(|(name, point)| (name.as_str(), *point))
    }

    /// Stimulus names in lexicographic order, the order used by every report.
    #[must_use]
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.locations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn validate(&self) -> CalverResult<()> {
        if self.locations.is_empty() {
            return Err(CalverError::InvalidConfig(
                "at least one stimulus location is required".to_owned(),
            ));
        }
        if let Some((name, _)) = self.locations.iter().find(|(_, point)| !point.is_finite()) {
            return Err(CalverError::InvalidConfig(format!(
                "stimulus `{name}` location must be finite"
            )));
        }
        Ok(())
    }
}

/// One recording, loaded and normalized, ready for the per-file pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleTable {
    pub participant: Option<String>,
    /// `false` switches the pipeline to treating every sample as valid.
    pub has_validity: bool,
    pub samples: Vec<GazeSample>,
}

impl SampleTable {
    #[must_use]
    pub fn new(samples: Vec<GazeSample>, has_validity: bool) -> Self {
        Self {
            participant: None,
            has_validity,
            samples,
        }
    }

    #[must_use]
    pub fn with_participant(mut self, participant: impl Into<String>) -> Self {
        self.participant = Some(participant.into());
        self
    }
}
