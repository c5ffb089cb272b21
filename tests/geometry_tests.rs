use approx::assert_abs_diff_eq;
use calver_rs::core::{ScreenGeometry, pixels_to_degrees};

#[test]
fn pixels_to_degrees_matches_reference_values() {
    let horizontal = pixels_to_degrees(500.0, 600.0, 1920.0, 594.0).expect("defined angle");
    let vertical = pixels_to_degrees(500.0, 600.0, 1080.0, 344.0).expect("defined angle");

    assert_abs_diff_eq!(horizontal, 14.690_555_502_328_182, epsilon = 1e-9);
    assert_abs_diff_eq!(vertical, 15.119_781_149_855_79, epsilon = 1e-9);
}

#[test]
fn zero_pixels_is_zero_degrees() {
    let degrees = pixels_to_degrees(0.0, 600.0, 1920.0, 594.0).expect("defined angle");
    assert!(degrees.abs() <= 1e-12);
}

#[test]
fn undefined_inputs_yield_none() {
    assert!(pixels_to_degrees(10.0, 0.0, 1920.0, 594.0).is_none());
    assert!(pixels_to_degrees(10.0, 600.0, 0.0, 594.0).is_none());
    assert!(pixels_to_degrees(10.0, 600.0, 1920.0, 0.0).is_none());
    assert!(pixels_to_degrees(f64::NAN, 600.0, 1920.0, 594.0).is_none());
}

#[test]
fn visual_angle_averages_both_axes() {
    let screen = ScreenGeometry::new(344.0, 594.0, 1080.0, 1920.0).expect("valid geometry");
    let viewing = screen.with_viewer_distance(600.0);

    let angle = viewing.visual_angle(500.0).expect("defined angle");
    let expected = (14.690_555_502_328_182 + 15.119_781_149_855_79) / 2.0;
    assert_abs_diff_eq!(angle, expected, epsilon = 1e-9);
}

#[test]
fn square_screen_angles_match_known_offsets() {
    let viewing = ScreenGeometry::new(1000.0, 1000.0, 1000.0, 1000.0)
        .expect("valid geometry")
        .with_viewer_distance(600.0);

    let ten = viewing.visual_angle(10.0).expect("defined angle");
    let forty_two = viewing.visual_angle(42.0).expect("defined angle");
    assert!((ten - 0.954_907_554_619_154_8).abs() <= 1e-9);
    assert!((forty_two - 4.009_068_064_211_808).abs() <= 1e-9);
}

#[test]
fn screen_contains_pixel_excludes_edges() {
    let screen = ScreenGeometry::new(344.0, 594.0, 1080.0, 1920.0).expect("valid geometry");
    assert!(screen.contains_pixel(1.0, 1.0));
    assert!(screen.contains_pixel(1919.0, 1079.0));
    assert!(!screen.contains_pixel(0.0, 500.0));
    assert!(!screen.contains_pixel(500.0, 0.0));
    assert!(!screen.contains_pixel(1920.0, 500.0));
    assert!(!screen.contains_pixel(500.0, 1080.0));
    assert!(!screen.contains_pixel(-3.0, 500.0));
}

#[test]
fn geometry_rejects_non_positive_values() {
    let err = ScreenGeometry::new(344.0, -1.0, 1080.0, 1920.0).expect_err("negative width");
    assert!(format!("{err}").contains("width_mm"));
}

#[test]
fn values_file_round_trips() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("calibrationvalues.txt");
    let screen = ScreenGeometry::new(344.0, 594.5, 1080.0, 1920.0).expect("valid geometry");

    screen.save_values_file(&path).expect("save values");
    let loaded = ScreenGeometry::load_values_file(&path).expect("load values");
    assert_eq!(loaded, screen);
}

#[test]
fn values_text_rejects_non_numeric_line() {
    let err = ScreenGeometry::from_values_text("344\nwide\n1080\n1920\n").expect_err("bad value");
    assert!(format!("{err}").contains("`wide` is not a number"));
}
