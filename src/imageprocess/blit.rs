//! Rectangle-level operations on images: wiping, copying, brightness
//! metrics, centring, stretching, resizing, shifting, mirroring and
//! 90-degree rotation.

use tracing::{debug, info};

use crate::imageprocess::image::Image;
use crate::imageprocess::interpolate::{Interpolation, interpolate};
use crate::imageprocess::primitives::{Delta, FloatPoint, Pixel, Point, Rectangle, RectangleSize};

/// Wipe a rectangular area of pixels with the defined colour.
/// Returns the number of pixels actually written.
pub fn wipe_rectangle(image: &mut Image, input_area: Rectangle, color: Pixel) -> u64 {
    let mut count = 0;

    let area = image.clip(input_area);
    for p in area.scan() {
        if image.set_pixel(p, color) {
            count += 1;
        }
    }

    count
}

/// Copies a source rectangle to the target image, with the destination
/// bounds checked per pixel.
pub fn copy_rectangle(
    source: &Image,
    target: &mut Image,
    source_area: Rectangle,
    target_coords: Point,
) {
    let area = source.clip(source_area);

    // naive but generic implementation
    for p in area.scan() {
        let t = Point::new(
            target_coords.x + (p.x - area.vertex[0].x),
            target_coords.y + (p.y - area.vertex[0].y),
        );
        target.set_pixel(t, source.get_pixel(p));
    }
}

/// Returns the inverse average brightness of a rectangular area.
pub fn inverse_brightness_rect(image: &Image, input_area: Rectangle) -> u8 {
    let area = image.clip(input_area);
    let count = area.count_pixels();
    if count == 0 {
        return 0;
    }

    let mut grayscale: u64 = 0;
    for p in area.scan() {
        grayscale += image.grayscale_at(p) as u64;
    }

    0xFF - (grayscale / count) as u8
}

/// Returns the inverse average lightness of a rectangular area.
pub fn inverse_lightness_rect(image: &Image, input_area: Rectangle) -> u8 {
    let area = image.clip(input_area);
    let count = area.count_pixels();
    if count == 0 {
        return 0;
    }

    let mut lightness: u64 = 0;
    for p in area.scan() {
        lightness += image.lightness_at(p) as u64;
    }

    0xFF - (lightness / count) as u8
}

/// Returns the average darkness of a rectangular area.
pub fn darkness_rect(image: &Image, input_area: Rectangle) -> u8 {
    let area = image.clip(input_area);
    let count = area.count_pixels();
    if count == 0 {
        return 0;
    }

    let mut darkness: u64 = 0;
    for p in area.scan() {
        darkness += image.darkness_inverse_at(p) as u64;
    }

    0xFF - (darkness / count) as u8
}

/// Counts the pixels in `area` whose grayscale value lies in
/// `[min_brightness, max_brightness]`. With `clear` set, qualifying pixels
/// are overwritten with white while counting.
pub fn count_pixels_within_brightness(
    image: &mut Image,
    area: Rectangle,
    min_brightness: u8,
    max_brightness: u8,
    clear: bool,
) -> u64 {
    let mut count = 0;

    for p in area.scan() {
        let brightness = image.grayscale_at(p);
        if brightness < min_brightness || brightness > max_brightness {
            continue;
        }

        if clear {
            image.set_pixel(p, Pixel::WHITE);
        }
        count += 1;
    }

    count
}

/// Centers the whole source image inside an area of the target image.
/// A smaller source is surrounded by the background, a bigger one is
/// cropped equally at both edges of the oversized dimension.
pub fn center_image(
    source: &Image,
    target: &mut Image,
    target_origin: Point,
    target_size: RectangleSize,
) {
    let mut size = source.size();
    let mut source_origin = Point::ORIGIN;
    let mut to = target_origin;

    if size.width < target_size.width || size.height < target_size.height {
        // a border of the background colour will remain, clear it first
        let background = target.background;
        wipe_rectangle(
            target,
            Rectangle::from_size(target_origin, target_size),
            background,
        );
    }

    if size.width < target_size.width {
        to.x += (target_size.width - size.width) / 2;
    }
    if size.height < target_size.height {
        to.y += (target_size.height - size.height) / 2;
    }
    if size.width > target_size.width {
        source_origin.x += (size.width - target_size.width) / 2;
        size.width = target_size.width;
    }
    if size.height > target_size.height {
        source_origin.y += (size.height - target_size.height) / 2;
        size.height = target_size.height;
    }

    copy_rectangle(
        source,
        target,
        Rectangle::from_size(source_origin, size),
        to,
    );
}

fn stretch_to(source: &Image, target: &mut Image, interpolation: Interpolation) {
    if target.width() <= 0 || target.height() <= 0 {
        return;
    }

    let x_ratio = source.width() as f32 / target.width() as f32;
    let y_ratio = source.height() as f32 / target.height() as f32;

    debug!(
        "stretching {}x{} -> {}x{}",
        source.width(),
        source.height(),
        target.width(),
        target.height()
    );

    for p in target.full_rect().scan() {
        let pxl = interpolate(
            source,
            FloatPoint {
                x: p.x as f32 * x_ratio,
                y: p.y as f32 * y_ratio,
            },
            interpolation,
        );
        target.set_pixel(p, pxl);
    }
}

/// Stretches the image to the exact target size, resampling every
/// destination pixel.
pub fn stretch_and_replace(image: &mut Image, size: RectangleSize, interpolation: Interpolation) {
    if image.size() == size {
        return;
    }

    let mut target = image.compatible(size, false);
    stretch_to(image, &mut target, interpolation);
    *image = target;
}

/// Resizes so that the content is zoomed to fit best into the new sheet
/// size while keeping its aspect ratio, then centres it on the sheet.
pub fn resize_and_replace(image: &mut Image, size: RectangleSize, interpolation: Interpolation) {
    let current = image.size();

    info!(
        "resizing {}x{} -> {}x{}",
        current.width, current.height, size.width, size.height
    );

    let w_ratio = size.width as f32 / current.width as f32;
    let h_ratio = size.height as f32 / current.height as f32;

    let stretched_size = if w_ratio < h_ratio {
        // fill the width fully, adjust the height
        RectangleSize {
            width: size.width,
            height: current.height * size.width / current.width,
        }
    } else if h_ratio < w_ratio {
        RectangleSize {
            width: current.width * size.height / current.height,
            height: size.height,
        }
    } else {
        size
    };

    let mut stretched = image.compatible(stretched_size, true);
    stretch_to(image, &mut stretched, interpolation);

    if stretched_size == size {
        *image = stretched;
        return;
    }

    let mut resized = image.compatible(size, true);
    center_image(&stretched, &mut resized, Point::ORIGIN, size);
    *image = resized;
}

/// Shifts the image content, filling the uncovered area with the
/// background colour.
pub fn shift_image(image: &mut Image, d: Delta) {
    let mut target = image.compatible(image.size(), true);
    let full = image.full_rect();
    copy_rectangle(image, &mut target, full, Point::ORIGIN.shift(d));
    *image = target;
}

/// Mirrors an image horizontally, vertically, or both, in place.
pub fn mirror(image: &mut Image, horizontal: bool, vertical: bool) {
    let w = image.width();
    let h = image.height();
    let mut until_x = if horizontal && !vertical {
        (w - 1) / 2
    } else {
        w - 1
    };
    let until_y = if vertical { (h - 1) / 2 } else { h - 1 };

    for y in 0..=until_y {
        let yy = if vertical { h - y - 1 } else { y };
        // The last middle line in odd-lined images that are mirrored both
        // horizontally and vertically must only be swapped half-way.
        if vertical && horizontal && y == yy {
            until_x = (w - 1) / 2;
        }

        for x in 0..=until_x {
            let xx = if horizontal { w - x - 1 } else { x };
            let point1 = Point::new(x, y);
            let point2 = Point::new(xx, yy);
            let pixel1 = image.get_pixel(point1);
            let pixel2 = image.get_pixel(point2);
            image.set_pixel(point1, pixel2);
            image.set_pixel(point2, pixel1);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    Clockwise,
    Anticlockwise,
}

impl RotationDirection {
    fn sign(self) -> i32 {
        match self {
            RotationDirection::Clockwise => 1,
            RotationDirection::Anticlockwise => -1,
        }
    }
}

/// Rotates an image by 90 degrees, exchanging width and height.
pub fn flip_rotate_90(image: &mut Image, direction: RotationDirection) {
    let dir = direction.sign();
    let mut target = image.compatible(
        RectangleSize {
            width: image.height(),
            height: image.width(),
        },
        false,
    );

    for y in 0..image.height() {
        let xx = if dir > 0 { image.height() - 1 } else { 0 } - y * dir;
        for x in 0..image.width() {
            let yy = if dir < 0 { image.width() - 1 } else { 0 } + x * dir;
            target.set_pixel(Point::new(xx, yy), image.get_pixel(Point::new(x, y)));
        }
    }

    *image = target;
}
