use crate::coordinates::{PixelPoint, Waypoint};
use serde::{Deserialize, Serialize};

/// Width of the canvas the route backend plots waypoints on.
pub const DEFAULT_REFERENCE_WIDTH: f32 = 800.0;
/// Height of the canvas the route backend plots waypoints on.
pub const DEFAULT_REFERENCE_HEIGHT: f32 = 650.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reference space must be finite and positive, got {width}x{height}")]
    InvalidReference { width: f32, height: f32 },
    #[error("style value `{field}` must be finite and positive, got {value}")]
    InvalidStyle { field: &'static str, value: f32 },
    #[error("unrecognised colour `{0}`")]
    InvalidColor(String),
    #[error("config parse failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Dimensions of the logical coordinate space waypoints are expressed in.
///
/// This must match whatever the route producer used. A mismatch does not fail,
/// it silently misaligns the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceSpace {
    pub width: f32,
    pub height: f32,
}

impl ReferenceSpace {
    pub fn new(width: f32, height: f32) -> Result<Self, ConfigError> {
        let space = Self { width, height };
        space.validate()?;
        Ok(space)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = |value: f32| value.is_finite() && value > 0.0;
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(ConfigError::InvalidReference {
                width: self.width,
                height: self.height,
            })
        }
    }
}

impl Default for ReferenceSpace {
    fn default() -> Self {
        Self {
            width: DEFAULT_REFERENCE_WIDTH,
            height: DEFAULT_REFERENCE_HEIGHT,
        }
    }
}

/// Per-axis factors mapping logical coordinates onto an image's pixel grid.
///
/// The axes scale independently, so an image whose aspect ratio differs from
/// the reference space stretches the route along with the floorplan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

impl Scale {
    pub fn for_image(reference: &ReferenceSpace, width_px: u32, height_px: u32) -> Self {
        Self {
            x: width_px as f32 / reference.width,
            y: height_px as f32 / reference.height,
        }
    }

    pub fn apply(&self, waypoint: Waypoint) -> PixelPoint {
        PixelPoint::new(waypoint.x * self.x, waypoint.y * self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reference_matches_plot_canvas() {
        let reference = ReferenceSpace::default();
        assert_eq!(reference.width, 800.0);
        assert_eq!(reference.height, 650.0);
        assert!(reference.validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_reference() {
        assert!(ReferenceSpace::new(0.0, 650.0).is_err());
        assert!(ReferenceSpace::new(800.0, -1.0).is_err());
        assert!(ReferenceSpace::new(f32::NAN, 650.0).is_err());
        assert!(ReferenceSpace::new(f32::INFINITY, 650.0).is_err());
    }

    #[test]
    fn half_size_image_halves_coordinates() {
        let scale = Scale::for_image(&ReferenceSpace::default(), 400, 325);
        assert_eq!(scale.apply(Waypoint::new(100.0, 100.0)), PixelPoint::new(50.0, 50.0));
        assert_eq!(scale.apply(Waypoint::new(700.0, 600.0)), PixelPoint::new(350.0, 300.0));
    }

    #[test]
    fn axes_scale_independently() {
        // Wide image: x doubles, y stays put.
        let scale = Scale::for_image(&ReferenceSpace::default(), 1600, 650);
        assert_eq!(scale.x, 2.0);
        assert_eq!(scale.y, 1.0);
        assert_eq!(scale.apply(Waypoint::new(400.0, 325.0)), PixelPoint::new(800.0, 325.0));
    }

    #[test]
    fn custom_reference_space_is_respected() {
        let reference = ReferenceSpace::new(100.0, 50.0).unwrap();
        let scale = Scale::for_image(&reference, 1000, 1000);
        assert_eq!(scale.apply(Waypoint::new(10.0, 10.0)), PixelPoint::new(100.0, 200.0));
    }

    #[test]
    fn scaling_matches_ratio_for_random_inputs() {
        let mut rng = fastrand::Rng::with_seed(7);
        let reference = ReferenceSpace::default();

        for _ in 0..200 {
            let width = rng.u32(1..4096);
            let height = rng.u32(1..4096);
            let waypoint = Waypoint::new(rng.f32() * 800.0, rng.f32() * 650.0);
            let scaled = Scale::for_image(&reference, width, height).apply(waypoint);

            let expected_x = waypoint.x * (width as f32 / 800.0);
            let expected_y = waypoint.y * (height as f32 / 650.0);
            assert!((scaled.x - expected_x).abs() <= expected_x.abs() * 1e-6 + 1e-4);
            assert!((scaled.y - expected_y).abs() <= expected_y.abs() * 1e-6 + 1e-4);
        }
    }
}
