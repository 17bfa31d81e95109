use image::{Rgba, RgbaImage};
use routemap_core::PixelPoint;

const AA_SAMPLES_PER_AXIS: u32 = 4;
const AA_SAMPLE_COUNT: u32 = AA_SAMPLES_PER_AXIS * AA_SAMPLES_PER_AXIS;
/// Upper bound on the distance from a pixel centre to any of its samples.
const PIXEL_HALF_DIAGONAL: f32 = 0.71;

/// Pixel rectangle clipped to the image, `max` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PixelBounds {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl PixelBounds {
    fn around(points: &[PixelPoint], pad: f32, (width, height): (u32, u32)) -> Option<Self> {
        let first = points.first()?;
        let (mut lo_x, mut lo_y, mut hi_x, mut hi_y) = (first.x, first.y, first.x, first.y);
        for point in &points[1..] {
            lo_x = lo_x.min(point.x);
            lo_y = lo_y.min(point.y);
            hi_x = hi_x.max(point.x);
            hi_y = hi_y.max(point.y);
        }

        let clamp = |value: f32, limit: u32| value.clamp(0.0, limit as f32) as u32;
        let bounds = Self {
            min_x: clamp((lo_x - pad).floor(), width),
            min_y: clamp((lo_y - pad).floor(), height),
            max_x: clamp((hi_x + pad).ceil(), width),
            max_y: clamp((hi_y + pad).ceil(), height),
        };

        (bounds.min_x < bounds.max_x && bounds.min_y < bounds.max_y).then_some(bounds)
    }

    fn width(&self) -> u32 {
        self.max_x - self.min_x
    }

    fn area(&self) -> usize {
        self.width() as usize * (self.max_y - self.min_y) as usize
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y - self.min_y) as usize * self.width() as usize + (x - self.min_x) as usize
    }
}

/// Strokes straight segments through `points` in order with round ends.
/// Pixels where segments overlap are blended once, at their highest coverage.
pub fn stroke_polyline(image: &mut RgbaImage, points: &[PixelPoint], width: f32, color: Rgba<u8>) {
    if points.len() < 2 || width <= 0.0 {
        return;
    }

    let radius = width * 0.5;
    let reach = radius + PIXEL_HALF_DIAGONAL;
    let dimensions = image.dimensions();
    let Some(bounds) = PixelBounds::around(points, radius, dimensions) else {
        return;
    };
    let mut coverage = vec![0.0f32; bounds.area()];

    for segment in points.windows(2) {
        let (start, end) = (segment[0], segment[1]);
        let Some(segment_bounds) = PixelBounds::around(segment, radius, dimensions) else {
            continue;
        };

        for y in segment_bounds.min_y..segment_bounds.max_y {
            let Some((lo, hi)) = row_span(start, end, y as f32 + 0.5, reach) else {
                continue;
            };
            let clamp_x = |value: f32| {
                value.clamp(segment_bounds.min_x as f32, segment_bounds.max_x as f32) as u32
            };
            let (min_x, max_x) = (clamp_x((lo - 0.5).floor()), clamp_x((hi - 0.5).ceil() + 1.0));

            for x in min_x..max_x {
                let center = distance_sq_to_segment(x as f32 + 0.5, y as f32 + 0.5, start, end);
                let covered = edge_coverage(center, radius, || {
                    pixel_coverage(x, y, |sx, sy| {
                        distance_sq_to_segment(sx, sy, start, end) <= radius * radius
                    })
                });
                let slot = &mut coverage[bounds.index(x, y)];
                *slot = slot.max(covered);
            }
        }
    }

    for y in bounds.min_y..bounds.max_y {
        for x in bounds.min_x..bounds.max_x {
            blend_pixel(image, x, y, color, coverage[bounds.index(x, y)]);
        }
    }
}

pub fn fill_disc(image: &mut RgbaImage, center: PixelPoint, radius: f32, color: Rgba<u8>) {
    if radius <= 0.0 {
        return;
    }

    let Some(bounds) = PixelBounds::around(&[center], radius, image.dimensions()) else {
        return;
    };

    for y in bounds.min_y..bounds.max_y {
        for x in bounds.min_x..bounds.max_x {
            let dx = x as f32 + 0.5 - center.x;
            let dy = y as f32 + 0.5 - center.y;
            let covered = edge_coverage(dx * dx + dy * dy, radius, || {
                pixel_coverage(x, y, |sx, sy| {
                    let dx = sx - center.x;
                    let dy = sy - center.y;
                    dx * dx + dy * dy <= radius * radius
                })
            });
            blend_pixel(image, x, y, color, covered);
        }
    }
}

/// Coverage of a pixel whose centre lies `center_distance_sq` from a shape of
/// the given `radius`. Only pixels straddling the edge are supersampled.
fn edge_coverage(center_distance_sq: f32, radius: f32, sample: impl FnOnce() -> f32) -> f32 {
    let outer = radius + PIXEL_HALF_DIAGONAL;
    if center_distance_sq > outer * outer {
        return 0.0;
    }
    let inner = radius - PIXEL_HALF_DIAGONAL;
    if inner > 0.0 && center_distance_sq <= inner * inner {
        return 1.0;
    }
    sample()
}

/// Horizontal extent of the points on row `row_y` that lie within `reach` of
/// the segment. Conservative: the true span is never wider.
fn row_span(start: PixelPoint, end: PixelPoint, row_y: f32, reach: f32) -> Option<(f32, f32)> {
    let y_lo = (row_y - reach).max(start.y.min(end.y));
    let y_hi = (row_y + reach).min(start.y.max(end.y));
    if y_lo > y_hi {
        return None;
    }

    let dy = end.y - start.y;
    let (a, b) = if dy == 0.0 {
        (start.x, end.x)
    } else {
        let x_at = |y: f32| start.x + (y - start.y) * (end.x - start.x) / dy;
        (x_at(y_lo), x_at(y_hi))
    };
    Some((a.min(b) - reach, a.max(b) + reach))
}

fn pixel_coverage(x: u32, y: u32, inside: impl Fn(f32, f32) -> bool) -> f32 {
    let samples_per_axis = AA_SAMPLES_PER_AXIS as f32;
    let mut hits = 0u32;

    for sy in 0..AA_SAMPLES_PER_AXIS {
        for sx in 0..AA_SAMPLES_PER_AXIS {
            let sample_x = x as f32 + (sx as f32 + 0.5) / samples_per_axis;
            let sample_y = y as f32 + (sy as f32 + 0.5) / samples_per_axis;
            if inside(sample_x, sample_y) {
                hits += 1;
            }
        }
    }

    hits as f32 / AA_SAMPLE_COUNT as f32
}

fn distance_sq_to_segment(x: f32, y: f32, start: PixelPoint, end: PixelPoint) -> f32 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len_sq = dx * dx + dy * dy;

    if len_sq == 0.0 {
        return (x - start.x).powi(2) + (y - start.y).powi(2);
    }

    let t = (((x - start.x) * dx + (y - start.y) * dy) / len_sq).clamp(0.0, 1.0);
    let proj_x = start.x + dx * t;
    let proj_y = start.y + dy * t;
    (x - proj_x).powi(2) + (y - proj_y).powi(2)
}

/// Source-over composite of `color` scaled by `coverage`.
fn blend_pixel(image: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>, coverage: f32) {
    if coverage <= 0.0 {
        return;
    }

    let src_alpha = color.0[3] as f32 / 255.0 * coverage.min(1.0);
    let pixel = image.get_pixel_mut(x, y);
    let dst_alpha = pixel.0[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);

    if out_alpha <= 0.0 {
        *pixel = Rgba([0, 0, 0, 0]);
        return;
    }

    let to_u8 = |channel: f32| -> u8 { channel.clamp(0.0, 255.0).round() as u8 };
    for channel in 0..3 {
        let src = color.0[channel] as f32 * src_alpha;
        let dst = pixel.0[channel] as f32 * dst_alpha * (1.0 - src_alpha);
        pixel.0[channel] = to_u8((src + dst) / out_alpha);
    }
    pixel.0[3] = to_u8(out_alpha * 255.0);
}
