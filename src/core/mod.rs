pub mod distance;
pub mod geometry;
pub mod metrics;
pub mod segmenter;
pub mod selector;
pub mod types;

pub use distance::estimate_viewer_distance;
pub use geometry::{ScreenGeometry, ViewingGeometry, pixels_to_degrees};
pub use metrics::{
    EpisodeMetrics, MetricsUnavailable, ScoredEpisode, compute_metrics, mean_point, rms,
    score_episodes, std_dev,
};
pub use segmenter::{
    BoundaryMarker, Episode, EpisodeSet, Segmentation, SegmentationStats, dedup_timestamps,
    find_boundaries, segment_episodes,
};
pub use selector::{
    DEFAULT_MAX_DEVIATION_DEG, RejectedEpisode, Rejection, Selection, StimulusOutcome,
    select_fixations,
};
pub use types::{AxisPair, EyeValidity, GazePoint, GazeSample, SampleTable, StimulusSpec};
