//! Resampling of pixels at fractional coordinates.

use crate::imageprocess::image::Image;
use crate::imageprocess::primitives::{FloatPoint, Pixel, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    Nearest,
    Linear,
    #[default]
    Cubic,
}

pub fn interp_nearest_neighbour(image: &Image, coords: FloatPoint) -> Pixel {
    // Round to nearest location.
    let p = Point::new(coords.x.round() as i32, coords.y.round() as i32);
    image.get_pixel(p)
}

/// 1-D Catmull-Rom interpolation. Clamps the return value between 0 and 255
/// to support 8-bit colour images.
fn cubic_scale(factor: f32, a: u8, b: u8, c: u8, d: u8) -> u8 {
    let (a, b, c, d) = (a as f32, b as f32, c as f32, d as f32);
    let result = b + 0.5
        * factor
        * (c - a + factor * (2.0 * a - 5.0 * b + 4.0 * c - d + factor * (3.0 * (b - c) + d - a)));

    (result as i32).clamp(0, 255) as u8
}

// 1-D cubic interpolation
fn cubic_pixel_interpolation(factor: f32, pxls: [Pixel; 4]) -> Pixel {
    Pixel {
        r: cubic_scale(factor, pxls[0].r, pxls[1].r, pxls[2].r, pxls[3].r),
        g: cubic_scale(factor, pxls[0].g, pxls[1].g, pxls[2].g, pxls[3].g),
        b: cubic_scale(factor, pxls[0].b, pxls[1].b, pxls[2].b, pxls[3].b),
    }
}

// 2-D bicubic interpolation
pub fn interp_bicubic(image: &Image, coords: FloatPoint) -> Pixel {
    let p = Point::new(coords.x as i32, coords.y as i32);

    let mut pxls = [Pixel::WHITE; 4];
    for i in -1..3 {
        let quad = [
            image.get_pixel(Point::new(p.x - 1, p.y + i)),
            image.get_pixel(Point::new(p.x, p.y + i)),
            image.get_pixel(Point::new(p.x + 1, p.y + i)),
            image.get_pixel(Point::new(p.x + 2, p.y + i)),
        ];
        pxls[(i + 1) as usize] = cubic_pixel_interpolation(coords.x - p.x as f32, quad);
    }

    cubic_pixel_interpolation(coords.y - p.y as f32, pxls)
}

fn linear_scale(x: f32, a: u8, b: u8) -> u8 {
    ((1.0 - x) * a as f32 + x * b as f32) as u8
}

// 1-D linear interpolation
fn linear_pixel_interpolation(factor: f32, a: Pixel, b: Pixel) -> Pixel {
    Pixel {
        r: linear_scale(factor, a.r, b.r),
        g: linear_scale(factor, a.g, b.g),
        b: linear_scale(factor, a.b, b.b),
    }
}

// 2-D linear interpolation
pub fn interp_bilinear(image: &Image, coords: FloatPoint) -> Pixel {
    let image_area = image.clip(image.full_rect());

    let p1 = Point::new(coords.x.floor() as i32, coords.y.floor() as i32);
    let p2 = Point::new(coords.x.ceil() as i32, coords.y.ceil() as i32);

    // Check edge conditions to avoid divide-by-zero.
    if !p2.in_rectangle(image_area) {
        return image.get_pixel(p1);
    }

    // Single pixel.
    if p1 == p2 {
        return image.get_pixel(p1);
    }

    // 1-D vertical interpolation.
    if p1.x == p2.x {
        let pxl1 = image.get_pixel(p1);
        let pxl2 = image.get_pixel(p2);
        return linear_pixel_interpolation(coords.y - p1.y as f32, pxl1, pxl2);
    }

    // 1-D horizontal interpolation.
    if p1.y == p2.y {
        let pxl1 = image.get_pixel(p1);
        let pxl2 = image.get_pixel(p2);
        return linear_pixel_interpolation(coords.x - p1.x as f32, pxl1, pxl2);
    }

    // Blend the four pixels in a square, along x first, then along y.
    let pxl1 = image.get_pixel(Point::new(p1.x, p1.y));
    let pxl2 = image.get_pixel(Point::new(p2.x, p1.y));
    let pxl3 = image.get_pixel(Point::new(p1.x, p2.y));
    let pxl4 = image.get_pixel(Point::new(p2.x, p2.y));

    let pxl_h1 = linear_pixel_interpolation(coords.x - p1.x as f32, pxl1, pxl2);
    let pxl_h2 = linear_pixel_interpolation(coords.x - p1.x as f32, pxl3, pxl4);
    linear_pixel_interpolation(coords.y - p1.y as f32, pxl_h1, pxl_h2)
}

pub fn interpolate(image: &Image, coords: FloatPoint, interpolation: Interpolation) -> Pixel {
    match interpolation {
        Interpolation::Nearest => interp_nearest_neighbour(image, coords),
        Interpolation::Linear => interp_bilinear(image, coords),
        Interpolation::Cubic => interp_bicubic(image, coords),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imageprocess::image::PixelFormat;
    use crate::imageprocess::primitives::RectangleSize;

    fn gradient_image() -> Image {
        let mut image = Image::new(
            RectangleSize::new(4, 4),
            PixelFormat::Gray8,
            true,
            Pixel::WHITE,
            85,
        );
        for p in image.full_rect().scan() {
            let v = (p.x * 40) as u8;
            image.set_pixel(p, Pixel::new(v, v, v));
        }
        image
    }

    #[test]
    fn test_nearest_rounds() {
        let image = gradient_image();
        let pxl = interp_nearest_neighbour(&image, FloatPoint { x: 1.6, y: 0.2 });
        assert_eq!(pxl.r, 80);
    }

    #[test]
    fn test_bilinear_midpoint() {
        let image = gradient_image();
        let pxl = interp_bilinear(&image, FloatPoint { x: 0.5, y: 0.0 });
        assert_eq!(pxl.r, 20);
    }

    #[test]
    fn test_bilinear_on_lattice_is_exact() {
        let image = gradient_image();
        let pxl = interp_bilinear(&image, FloatPoint { x: 2.0, y: 1.0 });
        assert_eq!(pxl.r, 80);
    }

    #[test]
    fn test_bicubic_clamps_channels() {
        let image = gradient_image();
        let pxl = interp_bicubic(&image, FloatPoint { x: 1.5, y: 1.5 });
        assert!(pxl.r <= 255);
        // On a linear ramp Catmull-Rom reproduces the linear value.
        assert_eq!(pxl.r, 60);
    }
}
