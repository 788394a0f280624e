//! Small-angle rotation detection and correction.
//!
//! Detection slides a virtual rotated line inward from a mask edge and
//! watches the frame-to-frame increase of the summed darkness along the
//! line: the sharpest increase happens when the line's slope matches the
//! slope of the content edge. The per-edge angles are averaged, gated by a
//! deviation limit, and the mask is finally rotated back by resampling.

use tracing::{info, warn};

use crate::imageprocess::image::Image;
use crate::imageprocess::interpolate::{Interpolation, interpolate};
use crate::imageprocess::primitives::{Delta, Edges, FloatPoint, Point, Rectangle};

/// Hard ceiling for the virtual scan line length.
const MAX_ROTATION_SCAN_SIZE: i32 = 10000;

#[derive(Debug, Clone)]
pub struct DeskewParameters {
    pub scan_range_rad: f32,
    pub scan_step_rad: f32,
    pub scan_deviation_rad: f32,
    /// Length of the virtual scan line; -1 selects the mask extent.
    pub scan_size: i32,
    pub scan_depth: f32,
    pub scan_edges: Edges,
}

pub fn degrees_to_radians(d: f32) -> f32 {
    d * std::f32::consts::PI / 180.0
}

/// Returns the maximum blackness-increase peak that occurs while shifting a
/// rotated virtual line from one edge of the mask towards its middle.
///
/// `m` is the slope of the virtual line (`tan` of the tested angle), which
/// is negative for negative angles.
fn detect_edge_rotation_peak(
    image: &Image,
    mask: Rectangle,
    params: &DeskewParameters,
    shift: Delta,
    m: f32,
) -> i32 {
    let size = mask.size();

    let scan_size;
    let max_depth;
    let mut x;
    let mut y;
    let step_x;
    let step_y;

    if shift.vertical == 0 {
        // horizontal shifting, scanning for a vertical edge
        scan_size = resolve_scan_size(params.scan_size, size.height);
        max_depth = size.width / 2;
        let half = scan_size / 2;
        let outer_offset = (m.abs() * half as f32) as i32;
        let mid = size.height / 2;
        let side_offset = if shift.horizontal > 0 {
            mask.vertex[0].x - outer_offset
        } else {
            mask.vertex[1].x + outer_offset
        };
        x = side_offset as f32 + half as f32 * m;
        y = (mask.vertex[0].y + mid - half) as f32;
        step_x = -m;
        step_y = 1.0;
    } else {
        // vertical shifting, scanning for a horizontal edge
        scan_size = resolve_scan_size(params.scan_size, size.width);
        max_depth = size.height / 2;
        let half = scan_size / 2;
        let outer_offset = (m.abs() * half as f32) as i32;
        let mid = size.width / 2;
        let side_offset = if shift.vertical > 0 {
            mask.vertex[0].y - outer_offset
        } else {
            mask.vertex[1].y + outer_offset
        };
        x = (mask.vertex[0].x + mid - half) as f32;
        // the line ascends for negative angles
        y = side_offset as f32 - half as f32 * m;
        step_x = 1.0;
        step_y = -m;
    }

    let max_blackness_abs = (255.0 * scan_size as f32 * params.scan_depth) as i32;

    // coordinates of the rotated line in its first, unshifted position
    let mut line: Vec<Point> = Vec::with_capacity(scan_size as usize);
    for _ in 0..scan_size {
        line.push(Point::new(x as i32, y as i32));
        x += step_x;
        y += step_y;
    }

    // Shift the line inward step by step, accumulating blackness. Stop when
    // enough accumulated blackness shows the content was crossed, or when
    // the middle of the mask is reached without finding anything.
    let mut last_blackness = 0;
    let mut max_diff = 0;
    let mut accumulated_blackness = 0;
    let mut depth = 0;
    while accumulated_blackness < max_blackness_abs && depth < max_depth {
        let mut blackness = 0;
        for point in line.iter_mut() {
            let pt = *point;
            *point = pt.shift(shift);
            if pt.in_rectangle(mask) {
                blackness += 255 - image.darkness_inverse_at(pt) as i32;
            }
        }
        let diff = blackness - last_blackness;
        last_blackness = blackness;
        if diff >= max_diff {
            max_diff = diff;
        }
        accumulated_blackness += blackness;
        depth += 1;
    }

    if depth < max_depth {
        max_diff
    } else {
        0 // no peak, the line reached the middle of the mask
    }
}

fn resolve_scan_size(configured: i32, mask_extent: i32) -> i32 {
    let scan_size = if configured == -1 {
        mask_extent
    } else {
        configured
    };
    scan_size.min(MAX_ROTATION_SCAN_SIZE).min(mask_extent)
}

/// Detects the rotation at one edge of the mask. Which edge depends on the
/// sign and axis of `shift`.
fn detect_edge_rotation(
    image: &Image,
    mask: Rectangle,
    params: &DeskewParameters,
    shift: Delta,
) -> f32 {
    let mut max_peak = 0;
    let mut detected_rotation = 0.0;

    // Iteratively increase the test angle, alternating between positive
    // and negative values while growing the absolute value.
    let mut rotation: f32 = 0.0;
    while rotation <= params.scan_range_rad {
        let m = rotation.tan();
        let peak = detect_edge_rotation_peak(image, mask, params, shift, m);
        if peak > max_peak {
            detected_rotation = rotation;
            max_peak = peak;
        }
        rotation = if rotation >= 0.0 {
            -(rotation + params.scan_step_rad)
        } else {
            -rotation
        };
    }

    detected_rotation
}

/// Detects the rotation of the content inside a mask by scanning the
/// enabled edges and averaging the per-edge angles. Returns 0 when the
/// deviation between the edges exceeds the configured limit.
pub fn detect_rotation(image: &Image, mask: Rectangle, params: &DeskewParameters) -> f32 {
    let mut rotation: Vec<f32> = Vec::with_capacity(4);

    if params.scan_edges.left {
        let detected = detect_edge_rotation(image, mask, params, Delta::RIGHTWARD);
        info!(
            "detected rotation left: [{},{},{},{}]: {}",
            mask.vertex[0].x, mask.vertex[0].y, mask.vertex[1].x, mask.vertex[1].y, detected
        );
        rotation.push(detected);
    }
    if params.scan_edges.top {
        let detected = -detect_edge_rotation(image, mask, params, Delta::DOWNWARD);
        info!(
            "detected rotation top: [{},{},{},{}]: {}",
            mask.vertex[0].x, mask.vertex[0].y, mask.vertex[1].x, mask.vertex[1].y, detected
        );
        rotation.push(detected);
    }
    if params.scan_edges.right {
        let detected = detect_edge_rotation(image, mask, params, Delta::LEFTWARD);
        info!(
            "detected rotation right: [{},{},{},{}]: {}",
            mask.vertex[0].x, mask.vertex[0].y, mask.vertex[1].x, mask.vertex[1].y, detected
        );
        rotation.push(detected);
    }
    if params.scan_edges.bottom {
        let detected = -detect_edge_rotation(image, mask, params, Delta::UPWARD);
        info!(
            "detected rotation bottom: [{},{},{},{}]: {}",
            mask.vertex[0].x, mask.vertex[0].y, mask.vertex[1].x, mask.vertex[1].y, detected
        );
        rotation.push(detected);
    }

    if rotation.is_empty() {
        return 0.0;
    }

    let average = rotation.iter().sum::<f32>() / rotation.len() as f32;
    let deviation = rotation
        .iter()
        .map(|r| (r - average).powi(2))
        .sum::<f32>()
        .sqrt();
    info!(
        "rotation average: {}  deviation: {}  rotation-scan-deviation (maximum): {}  [{},{},{},{}]",
        average,
        deviation,
        params.scan_deviation_rad,
        mask.vertex[0].x,
        mask.vertex[0].y,
        mask.vertex[1].x,
        mask.vertex[1].y
    );

    if deviation <= params.scan_deviation_rad {
        average
    } else {
        warn!("out of deviation range - NO ROTATING");
        0.0
    }
}

/// Rotates the whole source buffer around its middle point into the target
/// buffer, sampling through the configured interpolation. To rotate a part
/// of an image, extract it first and paste the result back.
pub fn rotate(source: &Image, target: &mut Image, radians: f32, interpolation: Interpolation) {
    let source_area = source.full_rect();
    let source_size = source.size();

    // the 2-D rotation matrix, applied around the middle point
    let sinval = radians.sin();
    let cosval = radians.cos();
    let mid_x = source_size.width as f32 / 2.0;
    let mid_y = source_size.height as f32 / 2.0;

    for p in source_area.scan() {
        let dx = p.x as f32 - mid_x;
        let dy = p.y as f32 - mid_y;
        let src_x = mid_x + dx * cosval + dy * sinval;
        let src_y = mid_y + dy * cosval - dx * sinval;
        let pxl = interpolate(source, FloatPoint { x: src_x, y: src_y }, interpolation);
        target.set_pixel(p, pxl);
    }
}
