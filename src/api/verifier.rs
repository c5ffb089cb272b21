use tracing::{debug, info};

use crate::core::{
    SampleTable, SegmentationStats, Selection, dedup_timestamps, estimate_viewer_distance,
    score_episodes, segment_episodes, select_fixations,
};
use crate::error::CalverResult;

use super::{ParticipantSummary, VerifierConfig, assemble_summary};

/// Full result of one recording, including the intermediate selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub summary: ParticipantSummary,
    pub segmentation: SegmentationStats,
    pub selection: Selection,
}

/// Per-file calibration verification pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationVerifier {
    config: VerifierConfig,
}

impl CalibrationVerifier {
    pub fn new(config: VerifierConfig) -> CalverResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Runs the pipeline and returns only the participant summary.
    pub fn verify(&self, table: SampleTable) -> CalverResult<ParticipantSummary> {
        self.analyze(table).map(|analysis| analysis.summary)
    }

    /// Deduplicates, estimates viewer distance, segments, scores and selects.
    pub fn analyze(&self, table: SampleTable) -> CalverResult<Analysis> {
        let SampleTable {
            participant,
            has_validity,
            samples,
        } = table;
        let participant = participant.unwrap_or_default();
        let stimuli = &self.config.stimuli;

        let samples = dedup_timestamps(samples);
        let distance_mm = estimate_viewer_distance(&samples)?;
        let geometry = self.config.geometry.with_viewer_distance(distance_mm);

        let segmentation = segment_episodes(&samples, has_validity, stimuli)?;
        let scored = score_episodes(
            &samples,
            &segmentation.episodes,
            stimuli,
            &geometry,
            has_validity,
        );
        let selection = select_fixations(&scored, stimuli, self.config.max_deviation_deg);
        debug!(
            participant = %participant,
            scored = scored.len(),
            rejected = selection.rejected.len(),
            "selected fixations"
        );

        let summary = assemble_summary(participant, &selection, stimuli, &geometry)?;
        info!(
            participant = %summary.participant,
            valid = %summary.valid,
            distance_mm,
            "verified recording"
        );
        Ok(Analysis {
            summary,
            segmentation: segmentation.stats,
            selection,
        })
    }
}
