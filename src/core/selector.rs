use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{MetricsUnavailable, ScoredEpisode, StimulusSpec};

/// Fixations at or beyond this visual angle from the stimulus are rejected.
pub const DEFAULT_MAX_DEVIATION_DEG: f64 = 6.0;

/// Why an episode lost consideration before the longest-duration scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Rejection {
    MetricsUnavailable(MetricsUnavailable),
    AboveThreshold { deviation_deg: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedEpisode {
    pub stimulus: String,
    pub fixation_index: String,
    pub reason: Rejection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StimulusOutcome {
    Selected(ScoredEpisode),
    Unavailable,
}

impl StimulusOutcome {
    #[must_use]
    pub fn selected(&self) -> Option<&ScoredEpisode> {
        match self {
            Self::Selected(scored) => Some(scored),
            Self::Unavailable => None,
        }
    }
}

/// Per-stimulus outcome in configuration order, plus every rejected episode.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    pub outcomes: IndexMap<String, StimulusOutcome>,
    pub rejected: Vec<RejectedEpisode>,
}

impl Selection {
    #[must_use]
    pub fn outcome(&self, stimulus: &str) -> Option<&StimulusOutcome> {
        self.outcomes.get(stimulus)
    }
}

/// Running winner of the longest-fixation scan.
struct Best<'a> {
    scored: &'a ScoredEpisode,
    deviation: f64,
}

fn prefer<'a>(best: Option<Best<'a>>, candidate: Best<'a>) -> Option<Best<'a>> {
    let Some(best) = best else {
        return Some(candidate);
    };
    let best_duration = best.scored.episode.duration_ms;
    let candidate_duration = candidate.scored.episode.duration_ms;
    if candidate_duration > best_duration {
        return Some(candidate);
    }
    if candidate_duration == best_duration {
        debug!(
            stimulus = %candidate.scored.episode.stimulus,
            held = %best.scored.episode.fixation_index,
            held_deg = best.deviation,
            candidate = %candidate.scored.episode.fixation_index,
            candidate_deg = candidate.deviation,
            duration_ms = candidate_duration,
            "tie for longest fixation"
        );
        if OrderedFloat(candidate.deviation) < OrderedFloat(best.deviation) {
            return Some(candidate);
        }
    }
    Some(best)
}

/// Picks the longest fixation under `max_deviation_deg` for every configured stimulus.
///
/// Episodes are scanned in encounter order. An equal-duration candidate replaces
/// the held winner only when its deviation is strictly smaller, and is compared
/// against the held winner alone.
#[must_use]
pub fn select_fixations(
    scored: &[ScoredEpisode],
    stimuli: &StimulusSpec,
    max_deviation_deg: f64,
) -> Selection {
    let mut rejected = Vec::new();
    let mut survivors: Vec<(&ScoredEpisode, f64)> = Vec::with_capacity(scored.len());

    for candidate in scored {
        let reason = match &candidate.metrics {
            Err(reason) => Rejection::MetricsUnavailable(*reason),
            Ok(metrics) if metrics.angle_deviation_deg >= max_deviation_deg => {
                Rejection::AboveThreshold {
                    deviation_deg: metrics.angle_deviation_deg,
                }
            }
            Ok(metrics) => {
                survivors.push((candidate, metrics.angle_deviation_deg));
                continue;
            }
        };
        debug!(
            stimulus = %candidate.episode.stimulus,
            fixation = %candidate.episode.fixation_index,
            ?reason,
            "removing fixation from consideration"
        );
        rejected.push(RejectedEpisode {
            stimulus: candidate.episode.stimulus.clone(),
            fixation_index: candidate.episode.fixation_index.clone(),
            reason,
        });
    }

    let outcomes = stimuli
        .iter()
        .map(|(name, _)| {
            let best = survivors
                .iter()
                .filter(|(candidate, _)| candidate.episode.stimulus == name)
                .fold(None, |best, &(candidate, deviation)| {
                    prefer(
                        best,
                        Best {
                            scored: candidate,
                            deviation,
                        },
                    )
                });
            let outcome = match best {
                Some(best) => StimulusOutcome::Selected(best.scored.clone()),
                None => StimulusOutcome::Unavailable,
            };
            (name.to_owned(), outcome)
        })
        .collect();

    Selection { outcomes, rejected }
}
