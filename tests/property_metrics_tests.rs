use calver_rs::core::{GazePoint, mean_point, rms, std_dev};
use proptest::prelude::*;

fn points_strategy() -> impl Strategy<Value = Vec<GazePoint>> {
    prop::collection::vec((1.0f64..1_919.0, 1.0f64..1_079.0), 1..64)
        .prop_map(|raw| raw.into_iter().map(|(x, y)| GazePoint::new(x, y)).collect())
}

proptest! {
    #[test]
    fn constant_gaze_has_zero_dispersion(x in 1.0f64..1_919.0, y in 1.0f64..1_079.0, n in 1usize..50) {
        let points = vec![GazePoint::new(x, y); n];
        let sd = std_dev(&points).expect("sd");
        let jitter = rms(&points).expect("rms");
        prop_assert!(sd.x.abs() <= 1e-9 && sd.y.abs() <= 1e-9);
        prop_assert!(jitter.x.abs() <= 1e-12 && jitter.y.abs() <= 1e-12);
    }

    #[test]
    fn mean_lies_inside_bounding_box(points in points_strategy()) {
        let mean = mean_point(&points).expect("mean");
        let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(mean.x >= min_x - 1e-9 && mean.x <= max_x + 1e-9);
    }

    #[test]
    fn dispersion_ignores_translation(points in points_strategy(), dx in -500.0f64..500.0, dy in -500.0f64..500.0) {
        let shifted: Vec<GazePoint> = points.iter().map(|p| GazePoint::new(p.x + dx, p.y + dy)).collect();
        let sd = std_dev(&points).expect("sd");
        let shifted_sd = std_dev(&shifted).expect("sd");
        let jitter = rms(&points).expect("rms");
        let shifted_jitter = rms(&shifted).expect("rms");

        prop_assert!((sd.x - shifted_sd.x).abs() <= 1e-6);
        prop_assert!((sd.y - shifted_sd.y).abs() <= 1e-6);
        prop_assert!((jitter.x - shifted_jitter.x).abs() <= 1e-6);
        prop_assert!((jitter.y - shifted_jitter.y).abs() <= 1e-6);
    }
}
