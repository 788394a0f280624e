//! The four scan filters that remove scanning artefacts from a sheet:
//! solid black areas, blurred speckle areas, gray spots and isolated noise
//! clusters.

use tracing::{debug, info};

use crate::imageprocess::blit::{
    count_pixels_within_brightness, darkness_rect, inverse_lightness_rect, wipe_rectangle,
};
use crate::imageprocess::fill::flood_fill;
use crate::imageprocess::image::Image;
use crate::imageprocess::primitives::{Delta, Pixel, Point, Rectangle, RectangleSize};

#[derive(Debug, Clone)]
pub struct BlackfilterParameters {
    pub scan_size: RectangleSize,
    pub scan_step: Delta,
    pub scan_depth: Delta,
    pub scan_horizontal: bool,
    pub scan_vertical: bool,
    /// Absolute darkness a scan window must reach to trigger the fill.
    pub abs_threshold: u8,
    pub intensity: u64,
    pub exclusions: Vec<Rectangle>,
}

/// Slides a scan window across the sheet in stripes, flood-filling every
/// window that is solidly black. `step` advances the window inside a
/// stripe, `stripe_shift` advances to the next stripe.
fn blackfilter_scan(
    image: &mut Image,
    params: &BlackfilterParameters,
    step: Delta,
    window: RectangleSize,
    stripe_shift: Delta,
) -> u64 {
    let mut result = 0;
    let mut stripe = Rectangle::from_size(Point::ORIGIN, window);

    while stripe.vertex[0].x < image.width() && stripe.vertex[0].y < image.height() {
        let mut area = stripe;

        // keep the last stripe inside the sheet, the next shift exits the loop
        let diff_x = (area.vertex[1].x - image.width() + 1).max(0);
        let diff_y = (area.vertex[1].y - image.height() + 1).max(0);
        area = area.shift(Delta::new(-diff_x, -diff_y));

        let mut already_excluded_message = false;
        while area.vertex[0].x < image.width() && area.vertex[0].y < image.height() {
            let blackness = darkness_rect(image, area);
            if blackness >= params.abs_threshold {
                // found a solidly black area
                if !area.overlaps_any(&params.exclusions) {
                    info!(
                        "black-area flood-fill: [{},{},{},{}]",
                        area.vertex[0].x, area.vertex[0].y, area.vertex[1].x, area.vertex[1].y
                    );
                    already_excluded_message = false;
                    // Start flood-filling from every pixel of the window; in
                    // most cases the first fill already cleared the rest.
                    let abs_black_threshold = image.abs_black_threshold;
                    for p in area.scan() {
                        result += flood_fill(
                            image,
                            p,
                            Pixel::WHITE,
                            0,
                            abs_black_threshold,
                            params.intensity,
                        );
                    }
                } else if !already_excluded_message {
                    info!(
                        "black-area EXCLUDED: [{},{},{},{}]",
                        area.vertex[0].x, area.vertex[0].y, area.vertex[1].x, area.vertex[1].y
                    );
                    // report only once per scan stripe
                    already_excluded_message = true;
                }
            }
            area = area.shift(step);
        }

        stripe = stripe.shift(stripe_shift);
    }

    result
}

/// Filters out solidly black areas as they appear on bad photocopies.
/// Returns the number of dark pixels cleared.
pub fn blackfilter(image: &mut Image, params: &BlackfilterParameters) -> u64 {
    let mut result = 0;

    if params.scan_horizontal {
        // left-to-right scan
        result += blackfilter_scan(
            image,
            params,
            Delta::new(params.scan_step.horizontal, 0),
            RectangleSize::new(params.scan_size.width, params.scan_depth.horizontal),
            Delta::new(0, params.scan_depth.horizontal),
        );
    }
    if params.scan_vertical {
        // top-to-bottom scan
        result += blackfilter_scan(
            image,
            params,
            Delta::new(0, params.scan_step.vertical),
            RectangleSize::new(params.scan_depth.vertical, params.scan_size.height),
            Delta::new(params.scan_depth.vertical, 0),
        );
    }

    result
}

#[derive(Debug, Clone)]
pub struct BlurfilterParameters {
    pub scan_size: RectangleSize,
    pub scan_step: Delta,
    pub intensity: f32,
}

/// Removes spots of isolated dark pixels by counting them in a block grid:
/// a block is erased when neither it nor any of its four diagonal
/// neighbours holds enough dark pixels relative to the block population.
/// Returns the number of dark pixels erased.
pub fn blurfilter(image: &mut Image, params: &BlurfilterParameters, abs_white_threshold: u8) -> u64 {
    let blocks_per_row = image.width() / params.scan_size.width;
    if blocks_per_row < 1 || image.height() < params.scan_size.height {
        return 0;
    }

    // number of pixels in a block
    let total = (params.scan_size.width as u64) * (params.scan_size.height as u64);
    let max_left = image.width() - params.scan_size.width;
    let max_top = image.height() - params.scan_size.height;
    let len = blocks_per_row as usize + 2;
    let mut result = 0;

    let count_block = |image: &mut Image, left: i32, top: i32| {
        let area = Rectangle::from_size(Point::new(left, top), params.scan_size);
        count_pixels_within_brightness(image, area, 0, abs_white_threshold, false)
    };

    // The outer block columns never qualify for erasure: their sentinel
    // neighbours carry the full block population.
    let mut prev_counts = vec![0u64; len];
    let mut cur_counts = vec![0u64; len];
    cur_counts[0] = total;
    cur_counts[len - 1] = total;
    let mut block = 1;
    let mut left = 0;
    while left <= max_left {
        cur_counts[block] = count_block(image, left, 0);
        block += 1;
        left += params.scan_size.width;
    }

    let mut top = 0;
    while top <= max_top {
        // Counts one scan step below the current block row; scanning the
        // grid slightly shaken keeps split clusters from being missed.
        let mut next_counts = vec![0u64; len];
        next_counts[0] = total;
        next_counts[len - 1] = total;
        let mut block = 1;
        let mut left = 0;
        while left <= max_left {
            next_counts[block] = count_block(image, left, top + params.scan_step.vertical);
            block += 1;
            left += params.scan_size.width;
        }

        let mut block = 1;
        let mut left = 0;
        while left <= max_left {
            let max = cur_counts[block]
                .max(prev_counts[block - 1])
                .max(prev_counts[block + 1])
                .max(next_counts[block - 1])
                .max(next_counts[block + 1]);

            if (max as f32 / total as f32) <= params.intensity {
                // not enough dark pixels in the neighbourhood
                let area = Rectangle::from_size(Point::new(left, top), params.scan_size);
                wipe_rectangle(image, area, Pixel::WHITE);
                result += cur_counts[block];
                cur_counts[block] = total;
            }

            block += 1;
            left += params.scan_size.width;
        }

        top += params.scan_size.height;
        prev_counts = std::mem::replace(&mut cur_counts, next_counts);
    }

    result
}

#[derive(Debug, Clone)]
pub struct GrayfilterParameters {
    pub scan_size: RectangleSize,
    pub scan_step: Delta,
    /// Absolute inverse-lightness below which a black-free window is wiped.
    pub abs_threshold: u8,
}

/// Erases areas that contain gray shades but not a single black pixel.
/// Returns the number of pixels wiped.
pub fn grayfilter(image: &mut Image, params: &GrayfilterParameters) -> u64 {
    let mut area = Rectangle::from_size(Point::ORIGIN, params.scan_size);
    let mut result = 0;

    loop {
        let abs_black_threshold = image.abs_black_threshold;
        let count = count_pixels_within_brightness(image, area, 0, abs_black_threshold, false);
        if count == 0 {
            let lightness = inverse_lightness_rect(image, area);
            // a lower threshold erases more
            if lightness < params.abs_threshold {
                result += wipe_rectangle(image, area, Pixel::WHITE);
            }
        }

        // continue on the same row unless we reached its end
        if area.vertex[0].x < image.width() {
            area = area.shift(Delta::new(params.scan_step.horizontal, 0));
        } else {
            area = area.shift(Delta::new(-area.vertex[0].x, params.scan_step.vertical));
        }

        if area.vertex[0].y > image.height() {
            return result;
        }
    }
}

fn noisefilter_compare_and_clear(
    image: &mut Image,
    p: Point,
    clear: bool,
    min_white_level: u8,
) -> bool {
    if image.lightness_at(p) >= min_white_level {
        return false;
    }

    if clear {
        image.set_pixel(p, Pixel::WHITE);
    }
    true
}

/// Counts (and optionally clears) the dark pixels on the ring with
/// Chebyshev distance `level` around `p`.
fn noisefilter_count_pixel_neighbors_level(
    image: &mut Image,
    p: Point,
    level: i32,
    clear: bool,
    min_white_level: u8,
) -> u64 {
    let mut count = 0;

    // upper and lower rows
    for xx in (p.x - level)..=(p.x + level) {
        let upper = Point::new(xx, p.y - level);
        let lower = Point::new(xx, p.y + level);
        if noisefilter_compare_and_clear(image, upper, clear, min_white_level) {
            count += 1;
        }
        if noisefilter_compare_and_clear(image, lower, clear, min_white_level) {
            count += 1;
        }
    }

    // middle rows
    for yy in (p.y - (level - 1))..=(p.y + (level - 1)) {
        let first = Point::new(p.x - level, yy);
        let last = Point::new(p.x + level, yy);
        if noisefilter_compare_and_clear(image, first, clear, min_white_level) {
            count += 1;
        }
        if noisefilter_compare_and_clear(image, last, clear, min_white_level) {
            count += 1;
        }
    }

    count
}

/// Counts all dark pixels reachable from `p` ring by ring, stopping once a
/// whole ring is empty or the intensity limit is reached.
fn noisefilter_count_pixel_neighbors(
    image: &mut Image,
    p: Point,
    intensity: u64,
    min_white_level: u8,
) -> u64 {
    let mut count = 1; // assume self as set
    let mut level = 1;

    loop {
        let l_count = noisefilter_count_pixel_neighbors_level(image, p, level, false, min_white_level);
        count += l_count;
        level += 1;
        if l_count == 0 || level as u64 > intensity {
            return count;
        }
    }
}

fn noisefilter_clear_pixel_neighbors(image: &mut Image, p: Point, min_white_level: u8) {
    image.set_pixel(p, Pixel::WHITE);

    // The ring count reaches zero eventually, otherwise the caller's
    // neighbour count would have exceeded the intensity.
    let mut level = 1;
    loop {
        let l_count = noisefilter_count_pixel_neighbors_level(image, p, level, true, min_white_level);
        level += 1;
        if l_count == 0 {
            return;
        }
    }
}

/// Removes dark pixel clusters of at most `intensity` pixels.
/// Returns the number of clusters cleared.
pub fn noisefilter(image: &mut Image, intensity: u64, min_white_level: u8) -> u64 {
    let mut count = 0;

    let full = image.full_rect();
    for p in full.scan() {
        if image.darkness_inverse_at(p) < min_white_level {
            // one dark pixel found, check the cluster size around it
            let neighbors = noisefilter_count_pixel_neighbors(image, p, intensity, min_white_level);
            if neighbors <= intensity {
                noisefilter_clear_pixel_neighbors(image, p, min_white_level);
                count += 1;
            }
        }
    }

    debug!("noisefilter deleted {} clusters", count);
    count
}
