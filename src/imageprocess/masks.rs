//! Mask detection and application.
//!
//! A mask is a rectangle believed to hold page content. Masks are detected
//! by sliding a scan bar from a starting point towards each edge until the
//! bar's blackness drops below a fraction of the running average. Detected
//! or manually given masks can then be applied (everything outside is
//! cleared), centred, or aligned inside an outer area. Borders are the
//! white margins between the sheet edges and the content; they are detected
//! by moving a stripe inward until it meets enough dark pixels.

use tracing::{debug, info};

use crate::imageprocess::blit::{
    copy_rectangle, count_pixels_within_brightness, inverse_brightness_rect, wipe_rectangle,
};
use crate::imageprocess::image::Image;
use crate::imageprocess::primitives::{Delta, Edges, Pixel, Point, Rectangle, RectangleSize};

#[derive(Debug, Clone)]
pub struct MaskDetectionParameters {
    pub scan_size: RectangleSize,
    pub scan_step: Delta,
    /// Extent of the scan bar perpendicular to the scan direction;
    /// -1 selects the full image extent.
    pub scan_depth: Delta,
    pub scan_threshold_horizontal: f32,
    pub scan_threshold_vertical: f32,
    pub scan_horizontal: bool,
    pub scan_vertical: bool,
    /// Size limits for detected masks; -1 disables a limit.
    pub minimum_width: i32,
    pub maximum_width: i32,
    pub minimum_height: i32,
    pub maximum_height: i32,
}

/// A detected or manually specified content mask. An invalid mask had its
/// detected size outside the configured limits and was replaced by a
/// maximum-sized box around the scan point; the geometry is still usable
/// as a full-page fallback.
#[derive(Debug, Clone, Copy)]
pub struct Mask {
    pub area: Rectangle,
    pub valid: bool,
}

/// Finds one edge of non-dark pixels heading from a starting point towards
/// the edge direction. Returns the number of scan-bar shifts until the bar
/// turned blank relative to the running average.
fn detect_edge(
    image: &Image,
    origin: Point,
    step: Delta,
    scan_size: i32,
    scan_depth: i32,
    threshold: f32,
) -> i32 {
    let image_size = image.size();

    // either the horizontal or the vertical step is zero
    let mut scan_area = if step.vertical == 0 {
        // vertical edge, horizontal shifting of the scan bar
        let depth = if scan_depth == -1 {
            image_size.height
        } else {
            scan_depth
        };
        Rectangle::from_size(
            origin.shift(Delta::new(-scan_size / 2, -depth / 2)),
            RectangleSize::new(scan_size, depth),
        )
    } else {
        // horizontal edge, vertical shifting of the scan bar
        let depth = if scan_depth == -1 {
            image_size.width
        } else {
            scan_depth
        };
        Rectangle::from_size(
            origin.shift(Delta::new(-depth / 2, -scan_size / 2)),
            RectangleSize::new(depth, scan_size),
        )
    };

    let mut total: u32 = 0;
    let mut count: i32 = 0;
    loop {
        let blackness = inverse_brightness_rect(image, scan_area);
        total += blackness as u32;
        count += 1;
        scan_area = scan_area.shift(step);
        // Is the blackness below threshold times the average? This always
        // becomes true once the bar leaves the image, where every pixel
        // reads as white.
        if (blackness as f32) < (threshold * total as f32) / count as f32 || blackness == 0 {
            return count;
        }
    }
}

/// Detects the white borders around a starting point. Returns the mask and
/// whether its size was within the configured limits.
fn detect_mask(image: &Image, params: &MaskDetectionParameters, origin: Point) -> Mask {
    let image_size = image.size();
    let mut mask = Rectangle::new(Point::ORIGIN, Point::ORIGIN);

    if params.scan_horizontal {
        let left_edge = detect_edge(
            image,
            origin,
            Delta::new(-params.scan_step.horizontal, 0),
            params.scan_size.width,
            params.scan_depth.horizontal,
            params.scan_threshold_horizontal,
        );
        let right_edge = detect_edge(
            image,
            origin,
            Delta::new(params.scan_step.horizontal, 0),
            params.scan_size.width,
            params.scan_depth.horizontal,
            params.scan_threshold_horizontal,
        );
        mask.vertex[0].x = origin.x - params.scan_step.horizontal * left_edge
            - params.scan_size.width / 2;
        mask.vertex[1].x = origin.x + params.scan_step.horizontal * right_edge
            + params.scan_size.width / 2;
    } else {
        // full range of the sheet
        mask.vertex[0].x = 0;
        mask.vertex[1].x = image_size.width - 1;
    }

    if params.scan_vertical {
        let top_edge = detect_edge(
            image,
            origin,
            Delta::new(0, -params.scan_step.vertical),
            params.scan_size.height,
            params.scan_depth.vertical,
            params.scan_threshold_vertical,
        );
        let bottom_edge = detect_edge(
            image,
            origin,
            Delta::new(0, params.scan_step.vertical),
            params.scan_size.height,
            params.scan_depth.vertical,
            params.scan_threshold_vertical,
        );
        mask.vertex[0].y = origin.y - params.scan_step.vertical * top_edge
            - params.scan_size.height / 2;
        mask.vertex[1].y = origin.y + params.scan_step.vertical * bottom_edge
            + params.scan_size.height / 2;
    } else {
        mask.vertex[0].y = 0;
        mask.vertex[1].y = image_size.height - 1;
    }

    // Clip to the maximum if below the minimum or above the maximum.
    let size = mask.size();
    let mut valid = true;

    if (params.minimum_width != -1 && size.width < params.minimum_width)
        || (params.maximum_width != -1 && size.width > params.maximum_width)
    {
        debug!(
            "mask width ({}) not within min/max ({} / {})",
            size.width, params.minimum_width, params.maximum_width
        );
        mask.vertex[0].x = origin.x - params.maximum_width / 2;
        mask.vertex[1].x = origin.x + params.maximum_width / 2;
        valid = false;
    }

    if (params.minimum_height != -1 && size.height < params.minimum_height)
        || (params.maximum_height != -1 && size.height > params.maximum_height)
    {
        debug!(
            "mask height ({}) not within min/max ({} / {})",
            size.height, params.minimum_height, params.maximum_height
        );
        mask.vertex[0].y = origin.y - params.maximum_height / 2;
        mask.vertex[1].y = origin.y + params.maximum_height / 2;
        valid = false;
    }

    Mask { area: mask, valid }
}

/// Detects masks around the given scan points, one mask per point.
pub fn detect_masks(
    image: &Image,
    params: &MaskDetectionParameters,
    points: &[Point],
) -> Vec<Mask> {
    if !params.scan_horizontal && !params.scan_vertical {
        return Vec::new();
    }

    points
        .iter()
        .map(|&point| {
            let mask = detect_mask(image, params, point);
            info!(
                "auto-masking ({},{}): {},{},{},{}{}",
                point.x,
                point.y,
                mask.area.vertex[0].x,
                mask.area.vertex[0].y,
                mask.area.vertex[1].x,
                mask.area.vertex[1].y,
                if mask.valid {
                    ""
                } else {
                    " (invalid detection, using full page size)"
                }
            );
            mask
        })
        .collect()
}

/// Permanently applies the masks: every pixel not covered by at least one
/// mask is set to `color`.
pub fn apply_masks(image: &mut Image, masks: &[Rectangle], color: Pixel) {
    if masks.is_empty() {
        return;
    }

    let image_area = image.full_rect();
    for p in image_area.scan() {
        if !p.in_any_rectangle(masks) {
            image.set_pixel(p, color);
        }
    }
}

/// Permanently wipes the given areas: every pixel covered by a wipe area is
/// set to `color`.
pub fn apply_wipes(image: &mut Image, wipes: &[Rectangle], color: Pixel) {
    for wipe in wipes {
        let mut count = 0u64;
        for p in wipe.scan() {
            if image.set_pixel(p, color) {
                count += 1;
            }
        }

        debug!(
            "wipe [{},{},{},{}]: {} pixels",
            wipe.vertex[0].x, wipe.vertex[0].y, wipe.vertex[1].x, wipe.vertex[1].y, count
        );
    }
}

/// Moves a rectangular area of pixels to be centred on `center`, filling
/// the vacated area with the background. Skipped when the move would push
/// the area outside the visible image.
pub fn center_mask(image: &mut Image, center: Point, area: Rectangle) {
    let size = area.size();
    let image_area = image.full_rect();

    let target = center.shift(Delta::new(-size.width / 2, -size.height / 2));
    let new_area = Rectangle::from_size(target, size);

    if image_area.encloses(new_area) {
        info!(
            "centering mask [{},{},{},{}] ({},{}): {}, {}",
            area.vertex[0].x,
            area.vertex[0].y,
            area.vertex[1].x,
            area.vertex[1].y,
            center.x,
            center.y,
            target.x - area.vertex[0].x,
            target.y - area.vertex[0].y
        );
        let mut scratch = image.compatible(size, false);
        copy_rectangle(image, &mut scratch, area, Point::ORIGIN);
        let background = image.background;
        wipe_rectangle(image, area, background);
        let full = scratch.full_rect();
        copy_rectangle(&scratch, image, full, target);
    } else {
        info!(
            "centering mask [{},{},{},{}] ({},{}): {}, {} - NO CENTERING \
             (would shift area outside visible image)",
            area.vertex[0].x,
            area.vertex[0].y,
            area.vertex[1].x,
            area.vertex[1].y,
            center.x,
            center.y,
            target.x - area.vertex[0].x,
            target.y - area.vertex[0].y
        );
    }
}

#[derive(Debug, Clone)]
pub struct MaskAlignmentParameters {
    /// Edges to align the mask towards; centred on an axis when neither of
    /// its edges is selected.
    pub alignment: Edges,
    pub margin: Delta,
}

/// Moves a rectangular area of pixels to its aligned position inside the
/// `outside` area, filling the vacated area with the background.
pub fn align_mask(
    image: &mut Image,
    inside_area: Rectangle,
    outside: Rectangle,
    params: &MaskAlignmentParameters,
) {
    let inside_size = inside_area.size();

    let target_x = if params.alignment.left {
        outside.vertex[0].x + params.margin.horizontal
    } else if params.alignment.right {
        outside.vertex[1].x - inside_size.width - params.margin.horizontal
    } else {
        (outside.vertex[0].x + outside.vertex[1].x - inside_size.width) / 2
    };
    let target_y = if params.alignment.top {
        outside.vertex[0].y + params.margin.vertical
    } else if params.alignment.bottom {
        outside.vertex[1].y - inside_size.height - params.margin.vertical
    } else {
        (outside.vertex[0].y + outside.vertex[1].y - inside_size.height) / 2
    };
    let target = Point::new(target_x, target_y);

    info!(
        "aligning mask [{},{},{},{}] ({},{}): {}, {}",
        inside_area.vertex[0].x,
        inside_area.vertex[0].y,
        inside_area.vertex[1].x,
        inside_area.vertex[1].y,
        target.x,
        target.y,
        target.x - inside_area.vertex[0].x,
        target.y - inside_area.vertex[0].y
    );

    let mut scratch = image.compatible(inside_size, true);
    copy_rectangle(image, &mut scratch, inside_area, Point::ORIGIN);
    let background = image.background;
    wipe_rectangle(image, inside_area, background);
    let full = scratch.full_rect();
    copy_rectangle(&scratch, image, full, target);
}

/// White margins at the four sheet edges, each measured inward from its
/// edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Border {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Border {
    pub const NULL: Border = Border {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Border {
        Border {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// The content rectangle that remains inside a border.
pub fn border_to_mask(image: &Image, border: Border) -> Rectangle {
    let image_size = image.size();

    let mask = Rectangle::new(
        Point::new(border.left, border.top),
        Point::new(
            image_size.width - border.right - 1,
            image_size.height - border.bottom - 1,
        ),
    );
    debug!(
        "border [{},{},{},{}] -> mask [{},{},{},{}]",
        border.left,
        border.top,
        border.right,
        border.bottom,
        mask.vertex[0].x,
        mask.vertex[0].y,
        mask.vertex[1].x,
        mask.vertex[1].y
    );

    mask
}

/// Applies a border to the whole image: every pixel in the border strips at
/// the sheet edges is cleared to `color`.
pub fn apply_border(image: &mut Image, border: Border, color: Pixel) {
    if border == Border::NULL {
        return;
    }

    let mask = border_to_mask(image, border);
    info!(
        "applying border ({},{},{},{}) [{},{},{},{}]",
        border.left,
        border.top,
        border.right,
        border.bottom,
        mask.vertex[0].x,
        mask.vertex[0].y,
        mask.vertex[1].x,
        mask.vertex[1].y
    );
    apply_masks(image, &[mask], color);
}

#[derive(Debug, Clone)]
pub struct BorderScanParameters {
    pub scan_size: RectangleSize,
    pub scan_step: Delta,
    pub scan_threshold_horizontal: i32,
    pub scan_threshold_vertical: i32,
    pub scan_horizontal: bool,
    pub scan_vertical: bool,
}

/// Finds the size of one border edge by moving an inward-pointing stripe
/// until it holds at least `threshold` dark pixels.
fn detect_border_edge(
    image: &mut Image,
    outside_mask: Rectangle,
    step: Delta,
    size: i32,
    threshold: i32,
) -> i32 {
    let mask_size = outside_mask.size();
    let mut area = outside_mask;
    let max_step;

    if step.vertical == 0 {
        // horizontal detection
        if step.horizontal > 0 {
            area.vertex[1].x = outside_mask.vertex[0].x + size - 1;
        } else {
            area.vertex[0].x = outside_mask.vertex[1].x - size + 1;
        }
        max_step = mask_size.width;
    } else {
        // vertical detection
        if step.vertical > 0 {
            area.vertex[1].y = outside_mask.vertex[0].y + size - 1;
        } else {
            area.vertex[0].y = outside_mask.vertex[1].y - size + 1;
        }
        max_step = mask_size.height;
    }

    let mut result = 0;
    while result < max_step {
        let abs_black_threshold = image.abs_black_threshold;
        let cnt = count_pixels_within_brightness(image, area, 0, abs_black_threshold, false);
        if cnt >= threshold as u64 {
            return result; // border has been found
        }

        area = area.shift(step);
        // either the horizontal or the vertical step is zero
        result += (step.horizontal + step.vertical).abs();
    }

    0 // no border found between 0..max_step
}

/// Detects the border of non-dark pixels inside the given outside mask.
pub fn detect_border(
    image: &mut Image,
    params: &BorderScanParameters,
    outside_mask: Rectangle,
) -> Border {
    let image_size = image.size();

    let mut border = Border::new(
        outside_mask.vertex[0].x,
        outside_mask.vertex[0].y,
        image_size.width - outside_mask.vertex[1].x - 1,
        image_size.height - outside_mask.vertex[1].y - 1,
    );

    if params.scan_horizontal {
        border.left += detect_border_edge(
            image,
            outside_mask,
            Delta::new(params.scan_step.horizontal, 0),
            params.scan_size.width,
            params.scan_threshold_horizontal,
        );
        border.right += detect_border_edge(
            image,
            outside_mask,
            Delta::new(-params.scan_step.horizontal, 0),
            params.scan_size.width,
            params.scan_threshold_horizontal,
        );
    }
    if params.scan_vertical {
        border.top += detect_border_edge(
            image,
            outside_mask,
            Delta::new(0, params.scan_step.vertical),
            params.scan_size.height,
            params.scan_threshold_vertical,
        );
        border.bottom += detect_border_edge(
            image,
            outside_mask,
            Delta::new(0, -params.scan_step.vertical),
            params.scan_size.height,
            params.scan_threshold_vertical,
        );
    }

    info!(
        "border detected: ({},{},{},{}) in [{},{},{},{}]",
        border.left,
        border.top,
        border.right,
        border.bottom,
        outside_mask.vertex[0].x,
        outside_mask.vertex[0].y,
        outside_mask.vertex[1].x,
        outside_mask.vertex[1].y
    );

    border
}
