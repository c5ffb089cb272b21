use approx::assert_abs_diff_eq;
use calver_rs::api::{CalibrationVerifier, ValidCount, VerifierConfig};
use calver_rs::core::{EyeValidity, GazePoint, GazeSample, SampleTable, ScreenGeometry, StimulusSpec};
use calver_rs::CalverError;

fn config() -> VerifierConfig {
    let geometry = ScreenGeometry::new(1000.0, 1000.0, 1000.0, 1000.0).expect("valid geometry");
    VerifierConfig::new(geometry).with_stimuli(
        StimulusSpec::empty()
            .with_stimulus("B", GazePoint::new(500.0, 500.0))
            .with_stimulus("A", GazePoint::new(100.0, 100.0)),
    )
}

fn row(ts: i64, stimulus: Option<&str>, fixation: Option<&str>, x: i32, y: i32) -> GazeSample {
    let mut sample = GazeSample::at(ts)
        .with_gaze(x, y)
        .with_validity(EyeValidity::both_valid())
        .with_distance(600.0, 600.0);
    sample.stimulus = stimulus.map(str::to_owned);
    sample.fixation_index = fixation.map(str::to_owned);
    sample
}

/// Two stimuli, one 80 ms fixation on each: 10 px off A and 42 px off B.
fn recording(b_offset_px: i32) -> Vec<GazeSample> {
    let mut samples = vec![row(0, None, None, 0, 0), row(100, Some("A"), None, 300, 300)];
    for ts in (116..=180).step_by(16) {
        samples.push(row(ts, Some("A"), Some("1"), 110, 100));
    }
    // key press exported on its own row
    samples.push(row(180, Some("A"), None, 0, 0));
    samples.push(row(196, Some("A"), None, 300, 300));
    samples.push(row(212, Some("B"), None, 300, 300));
    for ts in (228..=292).step_by(16) {
        samples.push(row(ts, Some("B"), Some("2"), 500 + b_offset_px, 500));
    }
    samples.push(row(308, Some("B"), None, 300, 300));
    samples
}

#[test]
fn verify_reports_longest_accurate_fixation_per_stimulus() {
    let verifier = CalibrationVerifier::new(config()).expect("valid config");
    let table = SampleTable::new(recording(42), true).with_participant("P01");

    let summary = verifier.verify(table).expect("summary");
    assert_eq!(summary.participant, "P01");
    assert_eq!(summary.valid, ValidCount { valid: 2, total: 2 });
    assert_eq!(summary.valid.to_string(), "2 / 2");
    assert_abs_diff_eq!(summary.viewer_distance_mm, 600.0, epsilon = 1e-12);

    let names: Vec<&str> = summary.rows.iter().map(|r| r.stimulus.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);

    let a = summary.row("A").and_then(|r| r.record.as_ref()).expect("A record");
    assert_eq!(a.fixation_index, "1");
    assert_eq!(a.duration_ms, 80);
    assert_abs_diff_eq!(a.deviation_deg, 0.954_907_554_619_154_8, epsilon = 1e-9);
    assert_abs_diff_eq!(a.mean_x, 110.0, epsilon = 1e-12);
    assert_abs_diff_eq!(a.std_dev_deg.x, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(a.rms_deg.y, 0.0, epsilon = 1e-12);

    let b = summary.row("B").and_then(|r| r.record.as_ref()).expect("B record");
    assert_eq!(b.duration_ms, 80);
    assert_abs_diff_eq!(b.deviation_deg, 4.009_068_064_211_808, epsilon = 1e-9);

    assert_abs_diff_eq!(summary.averages.mean_x, 326.0, epsilon = 1e-9);
    assert_abs_diff_eq!(summary.averages.mean_y, 300.0, epsilon = 1e-9);
    assert_abs_diff_eq!(summary.averages.duration_ms, 80.0, epsilon = 1e-9);
    assert_abs_diff_eq!(summary.averages.deviation_deg, 2.481_987_809_415_481_5, epsilon = 1e-9);
}

#[test]
fn stimulus_beyond_threshold_is_reported_unavailable() {
    let verifier = CalibrationVerifier::new(config()).expect("valid config");
    let analysis = verifier
        .analyze(SampleTable::new(recording(200), true))
        .expect("analysis");

    let summary = analysis.summary;
    assert_eq!(summary.valid.to_string(), "1 / 2");
    assert!(summary.row("B").expect("B row").record.is_none());
    assert_eq!(analysis.selection.rejected.len(), 1);
    assert_eq!(analysis.segmentation.pairs, 2);
    assert_abs_diff_eq!(summary.averages.mean_x, 110.0, epsilon = 1e-9);
}

#[test]
fn no_qualifying_fixation_is_an_error() {
    let config = config().with_max_deviation_deg(0.5);
    let verifier = CalibrationVerifier::new(config).expect("valid config");
    let err = verifier
        .verify(SampleTable::new(recording(42), true))
        .expect_err("nothing under threshold");
    assert!(matches!(err, CalverError::NoQualifyingStimulusData));
}

#[test]
fn missing_distance_stops_before_segmentation() {
    let verifier = CalibrationVerifier::new(config()).expect("valid config");
    let samples = recording(42)
        .into_iter()
        .map(|mut sample| {
            sample.distance_left_mm = None;
            sample
        })
        .collect();
    let err = verifier
        .verify(SampleTable::new(samples, true))
        .expect_err("no distance");
    assert!(matches!(err, CalverError::NoDistanceData));
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let config = config().with_stimuli(StimulusSpec::empty());
    let err = CalibrationVerifier::new(config).expect_err("empty stimuli");
    assert!(err.is_configuration_error());
}
