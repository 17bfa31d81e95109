use image::{GenericImage, ImageResult, Rgba, RgbaImage};

use crate::plan::OverlayPlan;
use crate::raster;
use crate::style::OverlayStyle;

/// Bitmap the overlay is composited into. Starts out empty (0x0) and is only
/// ever sized to a decoded floorplan.
#[derive(Debug, Clone)]
pub struct RenderSurface {
    image: RgbaImage,
}

impl RenderSurface {
    pub fn new() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn is_blank(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Drops the previous frame entirely.
    pub fn clear(&mut self) {
        self.image = RgbaImage::new(0, 0);
    }

    /// Resizes to `floorplan`'s natural size and copies it in at the origin.
    pub fn draw_background(&mut self, floorplan: &RgbaImage) -> ImageResult<()> {
        let (width, height) = floorplan.dimensions();
        if self.image.dimensions() != (width, height) {
            self.image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
        }
        self.image.copy_from(floorplan, 0, 0)
    }

    /// Path first, marker on top.
    pub fn draw_overlay(&mut self, plan: &OverlayPlan, style: &OverlayStyle) {
        raster::stroke_polyline(&mut self.image, &plan.polyline, style.line_width, style.color);
        if let Some(marker) = plan.marker {
            raster::fill_disc(&mut self.image, marker, style.marker_radius, style.color);
        }
    }
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routemap_core::PixelPoint;

    fn floorplan(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 200, 255]))
    }

    #[test]
    fn starts_blank() {
        let surface = RenderSurface::new();
        assert!(surface.is_blank());
        assert_eq!(surface.dimensions(), (0, 0));
    }

    #[test]
    fn background_sets_natural_size_and_pixels() {
        let mut surface = RenderSurface::new();
        let background = floorplan(64, 32);
        surface.draw_background(&background).unwrap();

        assert_eq!(surface.dimensions(), (64, 32));
        assert_eq!(surface.image(), &background);
    }

    #[test]
    fn background_resize_discards_previous_frame() {
        let mut surface = RenderSurface::new();
        surface.draw_background(&floorplan(64, 32)).unwrap();
        let smaller = floorplan(10, 20);
        surface.draw_background(&smaller).unwrap();

        assert_eq!(surface.dimensions(), (10, 20));
        assert_eq!(surface.image(), &smaller);
    }

    #[test]
    fn marker_is_drawn_over_path() {
        let mut surface = RenderSurface::new();
        surface
            .draw_background(&RgbaImage::from_pixel(50, 50, Rgba([255, 255, 255, 255])))
            .unwrap();

        let style = OverlayStyle {
            color: Rgba([0, 0, 255, 255]),
            ..OverlayStyle::default()
        };
        let plan = OverlayPlan {
            polyline: vec![PixelPoint::new(5.0, 25.0), PixelPoint::new(25.0, 25.0)],
            marker: Some(PixelPoint::new(25.0, 25.0)),
        };
        surface.draw_overlay(&plan, &style);

        assert_eq!(*surface.image().get_pixel(10, 25), Rgba([0, 0, 255, 255]));
        // Marker radius reaches well beyond the 3px line.
        assert_eq!(*surface.image().get_pixel(25, 30), Rgba([0, 0, 255, 255]));
        assert_eq!(*surface.image().get_pixel(10, 30), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn clear_returns_to_blank() {
        let mut surface = RenderSurface::new();
        surface.draw_background(&floorplan(8, 8)).unwrap();
        surface.clear();
        assert!(surface.is_blank());
    }
}
