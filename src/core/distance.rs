use tracing::debug;

use crate::core::GazeSample;
use crate::error::{CalverError, CalverResult};

fn usable(distance_mm: Option<f64>) -> Option<f64> {
    distance_mm.filter(|value| value.is_finite() && *value != 0.0)
}

/// Mean viewer-to-screen distance of one recording, in millimeters.
///
/// Samples missing either eye's distance (absent, zero or non-finite) are
/// ignored. The remaining samples contribute the mean of their two eyes.
pub fn estimate_viewer_distance(samples: &[GazeSample]) -> CalverResult<f64> {
    let (sum, count) = samples
        .iter()
        .filter_map(|sample| {
            let left = usable(sample.distance_left_mm)?;
            let right = usable(sample.distance_right_mm)?;
            Some((left + right) / 2.0)
        })
        .fold((0.0_f64, 0_usize), |(sum, count), value| {
            (sum + value, count + 1)
        });

    if count == 0 {
        return Err(CalverError::NoDistanceData);
    }

    let mean = sum / count as f64;
    debug!(
        usable_samples = count,
        total_samples = samples.len(),
        distance_mm = mean,
        "estimated viewer distance"
    );
    Ok(mean)
}
