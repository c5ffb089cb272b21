use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::{EyeValidity, GazeSample, StimulusSpec};
use crate::error::{CalverError, CalverResult};

/// Drops samples repeating the last seen timestamp, keeping the first occurrence.
///
/// Key-press events are exported as extra rows sharing the gaze row's timestamp.
/// Samples without a timestamp are kept and leave the comparison value untouched.
#[must_use]
pub fn dedup_timestamps(samples: Vec<GazeSample>) -> Vec<GazeSample> {
    let original_count = samples.len();
    let mut last_seen: Option<i64> = None;
    let deduped: Vec<GazeSample> = samples
        .into_iter()
        .filter(|sample| match sample.timestamp {
            Some(ts) if last_seen == Some(ts) => false,
            Some(ts) => {
                last_seen = Some(ts);
                true
            }
            None => true,
        })
        .collect();
    debug!(
        original_count,
        deduped_count = deduped.len(),
        "deduplicated sample timestamps"
    );
    deduped
}

/// Snapshot of the sample where the fixation index changed.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryMarker {
    pub line: usize,
    pub stimulus: Option<String>,
    pub timestamp: Option<i64>,
    pub fixation_index: Option<String>,
    pub event_duration_ms: Option<i64>,
    pub gaze_x: Option<i32>,
    pub gaze_y: Option<i32>,
    pub validity: Option<EyeValidity>,
}

impl BoundaryMarker {
    fn from_sample(line: usize, sample: &GazeSample) -> Self {
        Self {
            line,
            stimulus: sample.stimulus.clone(),
            timestamp: sample.timestamp,
            fixation_index: sample.fixation_index.clone(),
            event_duration_ms: sample.event_duration_ms,
            gaze_x: sample.gaze_x,
            gaze_y: sample.gaze_y,
            validity: sample.validity,
        }
    }
}

/// Collects a marker for every fixation index change after the first stimulus sample.
///
/// Samples before the first sample with a stimulus are ignored; that sample's
/// fixation index seeds the comparison, so it never produces a marker itself.
#[must_use]
pub fn find_boundaries(samples: &[GazeSample]) -> Vec<BoundaryMarker> {
    let Some(first) = samples.iter().position(|sample| sample.stimulus.is_some()) else {
        debug!(samples = samples.len(), "no sample carries a stimulus");
        return Vec::new();
    };

    let mut current = samples[first].fixation_index.as_deref();
    let mut markers = Vec::new();
    for (line, sample) in samples.iter().enumerate().skip(first) {
        let index = sample.fixation_index.as_deref();
        if index != current {
            markers.push(BoundaryMarker::from_sample(line, sample));
            current = index;
        }
    }
    debug!(first_stimulus_line = first, markers = markers.len(), "found fixation boundaries");
    markers
}

/// One fixation episode: the half-open sample range `[start_line, end_line)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// Stimulus shown at the opening boundary; the whole episode is attributed to it.
    pub stimulus: String,
    pub fixation_index: String,
    pub start_line: usize,
    pub end_line: usize,
    pub duration_ms: i64,
}

/// Episodes grouped by stimulus, then by fixation index.
///
/// Re-inserting a (stimulus, fixation index) key replaces the stored episode
/// in place, so encounter order stays that of the key's first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeSet {
    by_stimulus: IndexMap<String, IndexMap<String, Episode>>,
}

impl EpisodeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `episode`, returning the episode it replaced, if any.
    pub fn insert(&mut self, episode: Episode) -> Option<Episode> {
        self.by_stimulus
            .entry(episode.stimulus.clone())
            .or_default()
            .insert(episode.fixation_index.clone(), episode)
    }

    #[must_use]
    pub fn get(&self, stimulus: &str, fixation_index: &str) -> Option<&Episode> {
        self.by_stimulus.get(stimulus)?.get(fixation_index)
    }

    pub fn episodes_for<'a>(&'a self, stimulus: &str) -> impl Iterator<Item = &'a Episode> + 'a {
        self.by_stimulus
            .get(stimulus)
            .into_iter()
            .flat_map(IndexMap::values)
    }

    pub fn stimuli(&self) -> impl Iterator<Item = &str> {
        self.by_stimulus.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Episode> {
        self.by_stimulus.values().flat_map(IndexMap::values)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_stimulus.values().map(IndexMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Counts of marker pairs that did not become episodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SegmentationStats {
    pub markers: usize,
    pub pairs: usize,
    pub no_stimulus: usize,
    pub invalid_eyes: usize,
    pub malformed_timestamps: usize,
    pub missing_fixation_index: usize,
    pub unconfigured_stimulus: usize,
    pub replaced: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub episodes: EpisodeSet,
    pub stats: SegmentationStats,
}

/// Milliseconds between two boundary timestamps.
///
/// `None` when either is absent or negative, when `end` precedes `start`, or
/// when the difference does not fit in an `i64`.
fn episode_duration(start: Option<i64>, end: Option<i64>) -> Option<i64> {
    let (start, end) = (start?, end?);
    if start < 0 || end < start {
        return None;
    }
    end.checked_sub(start)
}

/// Partitions a deduplicated sample stream into per-stimulus fixation episodes.
///
/// Boundary markers are paired `(0, 1), (2, 3), ...`: the first marker of a pair
/// opens a fixation and the second closes it. An episode is attributed to the
/// stimulus of its opening marker, so a fixation that runs past a stimulus change
/// ("leaks") counts entirely for the earlier stimulus.
pub fn segment_episodes(
    samples: &[GazeSample],
    has_validity: bool,
    stimuli: &StimulusSpec,
) -> CalverResult<Segmentation> {
    let mut markers = find_boundaries(samples);
    if markers.is_empty() {
        return Err(CalverError::NoFixationsFound);
    }

    let mut stats = SegmentationStats {
        markers: markers.len(),
        ..SegmentationStats::default()
    };

    if markers[0].fixation_index.is_none() {
        trace!(line = markers[0].line, "dropping leading marker without fixation index");
        markers.remove(0);
    }

    let mut episodes = EpisodeSet::new();
    for pair in markers.chunks_exact(2) {
        let (open, close) = (&pair[0], &pair[1]);
        stats.pairs += 1;

        if open.stimulus.is_none() && close.stimulus.is_none() {
            stats.no_stimulus += 1;
            continue;
        }

        if has_validity && !open.validity.is_some_and(EyeValidity::all_valid) {
            debug!(
                line = open.line,
                validity = ?open.validity,
                "ignoring fixation opened on an invalid eye sample"
            );
            stats.invalid_eyes += 1;
            continue;
        }

        let Some(duration_ms) = episode_duration(open.timestamp, close.timestamp) else {
            warn!(
                start_line = open.line,
                end_line = close.line,
                start = ?open.timestamp,
                end = ?close.timestamp,
                "excluding fixation with missing, negative or decreasing timestamps"
            );
            stats.malformed_timestamps += 1;
            continue;
        };

        let Some(stimulus) = &open.stimulus else {
            stats.no_stimulus += 1;
            continue;
        };
        let Some(fixation_index) = &open.fixation_index else {
            stats.missing_fixation_index += 1;
            continue;
        };
        if !stimuli.contains(stimulus) {
            trace!(stimulus = %stimulus, "fixation on unconfigured stimulus");
            stats.unconfigured_stimulus += 1;
            continue;
        }

        let episode = Episode {
            stimulus: stimulus.clone(),
            fixation_index: fixation_index.clone(),
            start_line: open.line,
            end_line: close.line,
            duration_ms,
        };
        trace!(
            stimulus = %episode.stimulus,
            fixation = %episode.fixation_index,
            start_line = episode.start_line,
            end_line = episode.end_line,
            duration_ms,
            "fixation episode"
        );
        if episodes.insert(episode).is_some() {
            stats.replaced += 1;
        }
    }

    debug!(episodes = episodes.len(), ?stats, "segmented fixation episodes");
    Ok(Segmentation { episodes, stats })
}

#[cfg(test)]
mod tests {
    use super::{Episode, EpisodeSet};

    fn episode(stimulus: &str, fixation: &str, duration_ms: i64) -> Episode {
        Episode {
            stimulus: stimulus.to_owned(),
            fixation_index: fixation.to_owned(),
            start_line: 0,
            end_line: 1,
            duration_ms,
        }
    }

    #[test]
    fn reinserted_fixation_keeps_its_position() {
        let mut set = EpisodeSet::new();
        set.insert(episode("A", "1", 10));
        set.insert(episode("A", "2", 20));
        let replaced = set.insert(episode("A", "1", 30)).expect("replaced");

        assert_eq!(replaced.duration_ms, 10);
        let durations: Vec<i64> = set.episodes_for("A").map(|e| e.duration_ms).collect();
        assert_eq!(durations, vec![30, 20]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn unknown_stimulus_yields_no_episodes() {
        let set = EpisodeSet::new();
        assert_eq!(set.episodes_for("missing").count(), 0);
        assert!(set.is_empty());
    }
}
