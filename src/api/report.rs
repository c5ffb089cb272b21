use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{AxisPair, Selection, StimulusOutcome, StimulusSpec, ViewingGeometry};
use crate::error::{CalverError, CalverResult};

/// Reported values of the winning fixation on one stimulus.
///
/// Deviation and dispersion are in degrees of visual angle; coordinates are pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixationRecord {
    pub fixation_index: String,
    pub deviation_deg: f64,
    pub mean_x: f64,
    pub mean_y: f64,
    pub duration_ms: i64,
    pub std_dev_deg: AxisPair,
    pub rms_deg: AxisPair,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusRow {
    pub stimulus: String,
    /// `None` when no fixation qualified.
    pub record: Option<FixationRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryAverages {
    pub deviation_deg: f64,
    pub mean_x: f64,
    pub mean_y: f64,
    pub duration_ms: f64,
    pub std_dev_deg: AxisPair,
    pub rms_deg: AxisPair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidCount {
    pub valid: usize,
    pub total: usize,
}

impl fmt::Display for ValidCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.valid, self.total)
    }
}

/// Calibration verification result of one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub participant: String,
    pub viewer_distance_mm: f64,
    /// One row per configured stimulus, sorted by stimulus name.
    pub rows: Vec<StimulusRow>,
    pub averages: SummaryAverages,
    pub valid: ValidCount,
}

impl ParticipantSummary {
    #[must_use]
    pub fn row(&self, stimulus: &str) -> Option<&StimulusRow> {
        self.rows.iter().find(|row| row.stimulus == stimulus)
    }

    pub fn records(&self) -> impl Iterator<Item = &FixationRecord> {
        self.rows.iter().filter_map(|row| row.record.as_ref())
    }
}

fn angle_pair(geometry: &ViewingGeometry, pixels: AxisPair) -> Option<AxisPair> {
    Some(AxisPair::new(
        geometry.visual_angle(pixels.x)?,
        geometry.visual_angle(pixels.y)?,
    ))
}

fn record_for(
    stimulus: &str,
    outcome: Option<&StimulusOutcome>,
    geometry: &ViewingGeometry,
) -> Option<FixationRecord> {
    let scored = outcome?.selected()?;
    let metrics = scored.metrics.as_ref().ok()?;
    let std_dev_deg = angle_pair(geometry, metrics.std_dev);
    let rms_deg = angle_pair(geometry, metrics.rms);
    let (Some(std_dev_deg), Some(rms_deg)) = (std_dev_deg, rms_deg) else {
        warn!(stimulus, "dispersion could not be converted to degrees");
        return None;
    };

    Some(FixationRecord {
        fixation_index: scored.episode.fixation_index.clone(),
        deviation_deg: metrics.angle_deviation_deg,
        mean_x: metrics.mean_point.x,
        mean_y: metrics.mean_point.y,
        duration_ms: scored.episode.duration_ms,
        std_dev_deg,
        rms_deg,
    })
}

fn averages(records: &[&FixationRecord]) -> SummaryAverages {
    if records.is_empty() {
        return SummaryAverages::default();
    }
    let n = records.len() as f64;
    let mean = |value: fn(&FixationRecord) -> f64| records.iter().map(|r| value(r)).sum::<f64>() / n;
    SummaryAverages {
        deviation_deg: mean(|r| r.deviation_deg),
        mean_x: mean(|r| r.mean_x),
        mean_y: mean(|r| r.mean_y),
        duration_ms: mean(|r| r.duration_ms as f64),
        std_dev_deg: AxisPair::new(mean(|r| r.std_dev_deg.x), mean(|r| r.std_dev_deg.y)),
        rms_deg: AxisPair::new(mean(|r| r.rms_deg.x), mean(|r| r.rms_deg.y)),
    }
}

/// Builds the per-participant summary from a selection.
///
/// Fails with `NoQualifyingStimulusData` when no configured stimulus has a winner.
pub fn assemble_summary(
    participant: impl Into<String>,
    selection: &Selection,
    stimuli: &StimulusSpec,
    geometry: &ViewingGeometry,
) -> CalverResult<ParticipantSummary> {
    let rows: Vec<StimulusRow> = stimuli
        .sorted_names()
        .into_iter()
        .map(|name| StimulusRow {
            stimulus: name.to_owned(),
            record: record_for(name, selection.outcome(name), geometry),
        })
        .collect();

    let records: Vec<&FixationRecord> = rows.iter().filter_map(|row| row.record.as_ref()).collect();
    if records.is_empty() {
        return Err(CalverError::NoQualifyingStimulusData);
    }

    let valid = ValidCount {
        valid: records.len(),
        total: stimuli.len(),
    };
    let averages = averages(&records);

    Ok(ParticipantSummary {
        participant: participant.into(),
        viewer_distance_mm: geometry.viewer_distance_mm,
        rows,
        averages,
        valid,
    })
}
