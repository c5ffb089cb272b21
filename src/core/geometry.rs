use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CalverError, CalverResult};

/// Converts a pixel extent into degrees of visual angle along one screen axis.
///
/// `reference_px` and `physical_mm` describe the same axis of the screen
/// (e.g. 1920 px spread over 594 mm). Returns `None` when any denominator term is
/// zero or an input is not finite.
#[must_use]
pub fn pixels_to_degrees(
    pixels: f64,
    viewer_distance_mm: f64,
    reference_px: f64,
    physical_mm: f64,
) -> Option<f64> {
    let inputs = [pixels, viewer_distance_mm, reference_px, physical_mm];
    if inputs.iter().any(|value| !value.is_finite()) {
        return None;
    }
    if viewer_distance_mm == 0.0 || reference_px == 0.0 || physical_mm == 0.0 {
        return None;
    }

    let distance_px = (viewer_distance_mm * reference_px) / physical_mm;
    let degrees = ((pixels / 2.0) / distance_px).atan().to_degrees() * 2.0;
    degrees.is_finite().then_some(degrees)
}

/// Physical size and resolution of the presentation screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub height_mm: f64,
    pub width_mm: f64,
    pub height_px: f64,
    pub width_px: f64,
}

impl ScreenGeometry {
    pub fn new(height_mm: f64, width_mm: f64, height_px: f64, width_px: f64) -> CalverResult<Self> {
        let geometry = Self {
            height_mm,
            width_mm,
            height_px,
            width_px,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn validate(&self) -> CalverResult<()> {
        let fields = [
            ("height_mm", self.height_mm),
            ("width_mm", self.width_mm),
            ("height_px", self.height_px),
            ("width_px", self.width_px),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(CalverError::InvalidGeometry(format!(
                    "{name} must be finite and > 0, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Returns `true` when `(x, y)` lies strictly inside the pixel area.
    #[must_use]
    pub fn contains_pixel(&self, x: f64, y: f64) -> bool {
        x > 0.0 && x < self.width_px && y > 0.0 && y < self.height_px
    }

    #[must_use]
    pub fn with_viewer_distance(self, viewer_distance_mm: f64) -> ViewingGeometry {
        ViewingGeometry {
            screen: self,
            viewer_distance_mm,
        }
    }

    /// Parses the four-line values file: height mm, width mm, height px, width px.
    pub fn from_values_text(text: &str) -> CalverResult<Self> {
        let mut values = Vec::with_capacity(4);
        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let value = line.parse::<f64>().map_err(|_| {
                CalverError::InvalidGeometry(format!("`{line}` is not a number"))
            })?;
            values.push(value);
        }
        match values.as_slice() {
            [height_mm, width_mm, height_px, width_px] => {
                Self::new(*height_mm, *width_mm, *height_px, *width_px)
            }
            _ => Err(CalverError::InvalidGeometry(format!(
                "expected 4 values, found {}",
                values.len()
            ))),
        }
    }

    #[must_use]
    pub fn to_values_text(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n",
            self.height_mm, self.width_mm, self.height_px, self.width_px
        )
    }

    pub fn load_values_file(path: &Path) -> CalverResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| CalverError::io(path, err))?;
        Self::from_values_text(&text)
    }

    pub fn save_values_file(&self, path: &Path) -> CalverResult<()> {
        std::fs::write(path, self.to_values_text()).map_err(|err| CalverError::io(path, err))
    }
}

/// Screen geometry paired with one participant's viewing distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewingGeometry {
    pub screen: ScreenGeometry,
    pub viewer_distance_mm: f64,
}

impl ViewingGeometry {
    /// Visual angle of a pixel extent, averaged over the vertical and horizontal axes.
    ///
    /// This is not a true 2D angle: each axis is converted on its own and the two
    /// results are averaged.
    #[must_use]
    pub fn visual_angle(&self, pixels: f64) -> Option<f64> {
        let vertical = pixels_to_degrees(
            pixels,
            self.viewer_distance_mm,
            self.screen.height_px,
            self.screen.height_mm,
        )?;
        let horizontal = pixels_to_degrees(
            pixels,
            self.viewer_distance_mm,
            self.screen.width_px,
            self.screen.width_mm,
        )?;
        Some((vertical + horizontal) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{ScreenGeometry, pixels_to_degrees};

    #[test]
    fn zero_denominator_terms_are_undefined() {
        assert!(pixels_to_degrees(10.0, 0.0, 1920.0, 594.0).is_none());
        assert!(pixels_to_degrees(10.0, 600.0, 0.0, 594.0).is_none());
        assert!(pixels_to_degrees(10.0, 600.0, 1920.0, 0.0).is_none());
    }

    #[test]
    fn values_text_rejects_wrong_line_count() {
        let err = ScreenGeometry::from_values_text("344\n594\n1080\n").expect_err("3 lines");
        assert!(format!("{err}").contains("expected 4 values"));
    }

    #[test]
    fn values_text_rejects_non_positive_dimension() {
        let err = ScreenGeometry::from_values_text("344\n0\n1080\n1920\n").expect_err("zero");
        assert!(format!("{err}").contains("width_mm"));
    }
}
