use calver_rs::core::{
    Episode, EpisodeSet, EyeValidity, GazePoint, GazeSample, MetricsUnavailable, ScreenGeometry,
    StimulusSpec, compute_metrics, mean_point, rms, score_episodes, std_dev,
};

fn square_screen() -> calver_rs::core::ViewingGeometry {
    ScreenGeometry::new(1000.0, 1000.0, 1000.0, 1000.0)
        .expect("valid geometry")
        .with_viewer_distance(600.0)
}

fn episode(stimulus: &str, start_line: usize, end_line: usize) -> Episode {
    Episode {
        stimulus: stimulus.to_owned(),
        fixation_index: "1".to_owned(),
        start_line,
        end_line,
        duration_ms: 80,
    }
}

fn gaze(ts: i64, x: i32, y: i32) -> GazeSample {
    GazeSample::at(ts)
        .with_gaze(x, y)
        .with_validity(EyeValidity::both_valid())
}

#[test]
fn single_point_has_zero_dispersion() {
    let points = [GazePoint::new(320.0, 240.0)];
    let sd = std_dev(&points).expect("sd");
    let jitter = rms(&points).expect("rms");
    assert_eq!((sd.x, sd.y), (0.0, 0.0));
    assert_eq!((jitter.x, jitter.y), (0.0, 0.0));
}

#[test]
fn empty_points_have_no_metrics() {
    assert!(mean_point(&[]).is_none());
    assert!(std_dev(&[]).is_none());
    assert!(rms(&[]).is_none());
}

#[test]
fn std_dev_uses_population_divisor() {
    let points = [GazePoint::new(0.0, 10.0), GazePoint::new(2.0, 10.0)];
    let sd = std_dev(&points).expect("sd");
    assert!((sd.x - 1.0).abs() <= 1e-12);
    assert!(sd.y.abs() <= 1e-12);
}

#[test]
fn rms_divides_successive_differences_by_point_count() {
    let points = [
        GazePoint::new(0.0, 0.0),
        GazePoint::new(3.0, 0.0),
        GazePoint::new(0.0, 0.0),
    ];
    let jitter = rms(&points).expect("rms");
    // (9 + 9) / 3 = 6
    assert!((jitter.x - 6.0_f64.sqrt()).abs() <= 1e-12);
    assert!(jitter.y.abs() <= 1e-12);
}

#[test]
fn metrics_ignore_off_screen_and_invalid_samples() {
    let mut invalid = gaze(48, 900, 900);
    invalid.validity = Some(EyeValidity::new(Some(4), Some(4)));
    let samples = vec![
        gaze(0, 110, 100),
        gaze(16, 0, 100),
        gaze(32, 1000, 100),
        invalid,
        gaze(64, 110, 100),
        GazeSample::at(80).with_validity(EyeValidity::both_valid()),
    ];

    let metrics = compute_metrics(
        &samples,
        &episode("A", 0, samples.len()),
        GazePoint::new(100.0, 100.0),
        &square_screen(),
        true,
    )
    .expect("metrics");

    assert_eq!(metrics.points.len(), 2);
    assert!((metrics.euclid_distance_px - 10.0).abs() <= 1e-12);
    assert!((metrics.angle_deviation_deg - 0.954_907_554_619_154_8).abs() <= 1e-9);
}

#[test]
fn one_valid_eye_is_enough_for_a_point() {
    let mut left_only = gaze(0, 110, 100);
    left_only.validity = Some(EyeValidity::new(Some(0), Some(4)));
    let samples = vec![left_only];

    let metrics = compute_metrics(
        &samples,
        &episode("A", 0, 1),
        GazePoint::new(100.0, 100.0),
        &square_screen(),
        true,
    )
    .expect("metrics");
    assert_eq!(metrics.points.len(), 1);
}

#[test]
fn episode_without_points_is_unavailable() {
    let samples = vec![gaze(0, 0, 0), gaze(16, -5, 20)];
    let err = compute_metrics(
        &samples,
        &episode("A", 0, 2),
        GazePoint::new(100.0, 100.0),
        &square_screen(),
        true,
    )
    .expect_err("no valid points");
    assert_eq!(err, MetricsUnavailable::NoValidPoints);
}

#[test]
fn end_line_sample_is_excluded() {
    let samples = vec![gaze(0, 110, 100), gaze(16, 110, 100), gaze(32, 900, 900)];
    let metrics = compute_metrics(
        &samples,
        &episode("A", 0, 2),
        GazePoint::new(100.0, 100.0),
        &square_screen(),
        true,
    )
    .expect("metrics");
    assert_eq!(metrics.points.len(), 2);
}

#[test]
fn scoring_marks_unknown_stimulus() {
    let samples = vec![gaze(0, 110, 100), gaze(16, 110, 100)];
    let mut episodes = EpisodeSet::new();
    episodes.insert(episode("A", 0, 2));
    episodes.insert(episode("Ghost", 0, 2));
    let stimuli = StimulusSpec::empty().with_stimulus("A", GazePoint::new(100.0, 100.0));

    let scored = score_episodes(&samples, &episodes, &stimuli, &square_screen(), true);
    assert_eq!(scored.len(), 2);
    assert!(scored[0].metrics.is_ok());
    assert_eq!(
        scored[1].metrics.as_ref().expect_err("unknown"),
        &MetricsUnavailable::UnknownStimulus
    );
}
