use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::core::{AxisPair, Episode, EpisodeSet, GazePoint, GazeSample, StimulusSpec, ViewingGeometry};

/// Why an episode has no metrics. Unavailable metrics are never reported as zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MetricsUnavailable {
    #[error("no valid gaze points inside the episode")]
    NoValidPoints,
    #[error("stimulus has no configured location")]
    UnknownStimulus,
    #[error("visual angle is undefined for this geometry")]
    AngleUndefined,
}

/// Accuracy and precision of one fixation episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetrics {
    pub points: Vec<GazePoint>,
    pub mean_point: GazePoint,
    pub euclid_distance_px: f64,
    pub angle_deviation_deg: f64,
    pub std_dev: AxisPair,
    pub rms: AxisPair,
}

/// An episode together with its metrics or the reason they are missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEpisode {
    pub episode: Episode,
    pub metrics: Result<EpisodeMetrics, MetricsUnavailable>,
}

impl ScoredEpisode {
    #[must_use]
    pub fn deviation(&self) -> Option<f64> {
        self.metrics.as_ref().ok().map(|m| m.angle_deviation_deg)
    }
}

#[must_use]
pub fn mean_point(points: &[GazePoint]) -> Option<GazePoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(GazePoint::new(sum_x / n, sum_y / n))
}

/// Population standard deviation per axis (divides by N).
#[must_use]
pub fn std_dev(points: &[GazePoint]) -> Option<AxisPair> {
    let mean = mean_point(points)?;
    let n = points.len() as f64;
    let (var_x, var_y) = points.iter().fold((0.0, 0.0), |(vx, vy), p| {
        (vx + (p.x - mean.x).powi(2), vy + (p.y - mean.y).powi(2))
    });
    Some(AxisPair::new((var_x / n).sqrt(), (var_y / n).sqrt()))
}

/// Root mean square of successive sample-to-sample displacement per axis.
///
/// The sum of the N-1 squared differences is divided by N, the point count.
#[must_use]
pub fn rms(points: &[GazePoint]) -> Option<AxisPair> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sum_x, sum_y) = points.windows(2).fold((0.0, 0.0), |(sx, sy), pair| {
        (
            sx + (pair[0].x - pair[1].x).powi(2),
            sy + (pair[0].y - pair[1].y).powi(2),
        )
    });
    Some(AxisPair::new((sum_x / n).sqrt(), (sum_y / n).sqrt()))
}

/// Gaze points of `samples[start..end]` that fall on screen and have a trusted eye.
#[must_use]
pub fn collect_points(
    samples: &[GazeSample],
    episode: &Episode,
    geometry: &ViewingGeometry,
    has_validity: bool,
) -> Vec<GazePoint> {
    let end = episode.end_line.min(samples.len());
    let start = episode.start_line.min(end);
    samples[start..end]
        .iter()
        .filter(|sample| {
            !has_validity || sample.validity.is_some_and(|validity| validity.any_valid())
        })
        .filter_map(GazeSample::gaze)
        .filter(|point| geometry.screen.contains_pixel(point.x, point.y))
        .collect()
}

pub fn compute_metrics(
    samples: &[GazeSample],
    episode: &Episode,
    target: GazePoint,
    geometry: &ViewingGeometry,
    has_validity: bool,
) -> Result<EpisodeMetrics, MetricsUnavailable> {
    let points = collect_points(samples, episode, geometry, has_validity);
    let mean = mean_point(&points).ok_or(MetricsUnavailable::NoValidPoints)?;
    let euclid_distance_px = mean.distance_to(target);
    let angle_deviation_deg = geometry
        .visual_angle(euclid_distance_px)
        .ok_or(MetricsUnavailable::AngleUndefined)?;
    let std_dev = std_dev(&points).ok_or(MetricsUnavailable::NoValidPoints)?;
    let rms = rms(&points).ok_or(MetricsUnavailable::NoValidPoints)?;

    Ok(EpisodeMetrics {
        points,
        mean_point: mean,
        euclid_distance_px,
        angle_deviation_deg,
        std_dev,
        rms,
    })
}

/// Scores every episode of `episodes`, preserving per-stimulus encounter order.
#[must_use]
pub fn score_episodes(
    samples: &[GazeSample],
    episodes: &EpisodeSet,
    stimuli: &StimulusSpec,
    geometry: &ViewingGeometry,
    has_validity: bool,
) -> Vec<ScoredEpisode> {
    episodes
        .iter()
        .map(|episode| {
            let metrics = stimuli
                .location(&episode.stimulus)
                .ok_or(MetricsUnavailable::UnknownStimulus)
                .and_then(|target| {
                    compute_metrics(samples, episode, target, geometry, has_validity)
                });
            match &metrics {
                Ok(m) => trace!(
                    stimulus = %episode.stimulus,
                    fixation = %episode.fixation_index,
                    points = m.points.len(),
                    distance_px = m.euclid_distance_px,
                    deviation_deg = m.angle_deviation_deg,
                    "episode metrics"
                ),
                Err(reason) => trace!(
                    stimulus = %episode.stimulus,
                    fixation = %episode.fixation_index,
                    %reason,
                    "episode metrics unavailable"
                ),
            }
            ScoredEpisode {
                episode: episode.clone(),
                metrics,
            }
        })
        .collect()
}
