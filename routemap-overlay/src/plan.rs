use routemap_core::{PixelPoint, ReferenceSpace, RouteDescriptor, Scale};

/// Scaled overlay geometry for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayPlan {
    /// Empty unless the route has at least two waypoints.
    pub polyline: Vec<PixelPoint>,
    pub marker: Option<PixelPoint>,
}

impl OverlayPlan {
    pub fn is_empty(&self) -> bool {
        self.polyline.is_empty() && self.marker.is_none()
    }
}

/// Maps a route onto an image of `image_size` pixels. A malformed route
/// produces an empty plan so the floorplan is still shown without an overlay.
pub fn plan_overlay(
    route: Option<&RouteDescriptor>,
    reference: &ReferenceSpace,
    image_size: (u32, u32),
) -> OverlayPlan {
    let Some(route) = route else {
        return OverlayPlan::default();
    };

    if let Err(err) = route.validate() {
        tracing::warn!(error = %err, "malformed route descriptor; overlay omitted");
        return OverlayPlan::default();
    }

    let scale = Scale::for_image(reference, image_size.0, image_size.1);
    let points: Vec<PixelPoint> = route
        .waypoints()
        .iter()
        .map(|&waypoint| scale.apply(waypoint))
        .collect();
    let marker = points.last().copied();
    let polyline = if points.len() >= 2 { points } else { Vec::new() };

    OverlayPlan { polyline, marker }
}
