//! Bounded flood fill.
//!
//! The fill grows a cross of four filled lines from the seed, then seeds the
//! perpendicular neighbours of every filled line pixel. Pending seeds are
//! kept on an explicit queue so the recursion depth stays constant on large
//! uniform regions. A countdown budget (`intensity`) bounds how many
//! non-matching pixels a line may cross before it gives up.

use std::collections::VecDeque;

use crate::imageprocess::image::Image;
use crate::imageprocess::primitives::{Delta, Pixel, Point};

/// Solidly fills a line of pixels heading towards `step` until the count of
/// non-matching pixels exceeds the intensity budget or the line leaves the
/// image. Returns the walked distance and how many written pixels matched
/// the mask range.
fn fill_line(
    image: &mut Image,
    mut p: Point,
    step: Delta,
    color: Pixel,
    mask_min: u8,
    mask_max: u8,
    intensity: u64,
) -> (u64, u64) {
    let mut distance = 0;
    let mut matched = 0;
    // first pixel must match, otherwise directly exit
    let mut budget: i64 = 1;

    let area = image.full_rect();

    loop {
        p = p.shift(step);
        let pixel = image.grayscale_at(p);
        let matches = pixel >= mask_min && pixel <= mask_max;

        if matches {
            budget = intensity as i64; // reset counter
        } else {
            budget -= 1;
        }

        if budget <= 0 || !p.in_rectangle(area) {
            return (distance, matched);
        }

        image.set_pixel(p, color);
        distance += 1;
        if matches {
            matched += 1;
        }
    }
}

/// Enqueues the perpendicular neighbours of every pixel of a previously
/// filled line as new fill seeds.
fn seed_around_line(pending: &mut VecDeque<Point>, mut p: Point, step: Delta, distance: u64) {
    for _ in 0..distance {
        p = p.shift(step);
        if step.horizontal != 0 {
            pending.push_back(p.shift(Delta::DOWNWARD));
            pending.push_back(p.shift(Delta::UPWARD));
        } else {
            pending.push_back(p.shift(Delta::RIGHTWARD));
            pending.push_back(p.shift(Delta::LEFTWARD));
        }
    }
}

/// Flood-fills the connected area around `p` whose grayscale values lie in
/// `[mask_min, mask_max]` with `color`. Returns the number of matching
/// pixels that were overwritten.
pub fn flood_fill(
    image: &mut Image,
    p: Point,
    color: Pixel,
    mask_min: u8,
    mask_max: u8,
    intensity: u64,
) -> u64 {
    let mut written = 0;
    let mut pending = VecDeque::new();
    pending.push_back(p);

    while let Some(p) = pending.pop_front() {
        let pixel = image.grayscale_at(p);
        if pixel < mask_min || pixel > mask_max {
            continue;
        }

        // fill a cross of four lines around the seed first
        image.set_pixel(p, color);
        written += 1;
        for step in [
            Delta::LEFTWARD,
            Delta::UPWARD,
            Delta::RIGHTWARD,
            Delta::DOWNWARD,
        ] {
            let (distance, matched) =
                fill_line(image, p, step, color, mask_min, mask_max, intensity);
            written += matched;
            seed_around_line(&mut pending, p, step, distance);
        }
    }

    written
}
