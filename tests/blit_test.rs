use descan::imageprocess::blit::{
    RotationDirection, center_image, copy_rectangle, count_pixels_within_brightness,
    darkness_rect, flip_rotate_90, inverse_brightness_rect, mirror, resize_and_replace,
    shift_image, stretch_and_replace, wipe_rectangle,
};
use descan::imageprocess::image::{Image, PixelFormat};
use descan::imageprocess::interpolate::Interpolation;
use descan::imageprocess::primitives::{Delta, Pixel, Point, Rectangle, RectangleSize};

const RED: Pixel = Pixel { r: 255, g: 0, b: 0 };
const GREEN: Pixel = Pixel { r: 0, g: 255, b: 0 };
const BLUE: Pixel = Pixel { r: 0, g: 0, b: 255 };

fn rgb_image(w: i32, h: i32) -> Image {
    Image::new(
        RectangleSize::new(w, h),
        PixelFormat::Rgb24,
        true,
        Pixel::WHITE,
        171,
    )
}

fn snapshot(image: &Image) -> Vec<Pixel> {
    image.full_rect().scan().map(|p| image.get_pixel(p)).collect()
}

#[test]
fn test_wipe_rectangle_is_clipped() {
    let mut image = rgb_image(10, 10);
    let wiped = wipe_rectangle(
        &mut image,
        Rectangle::new(Point::new(-5, -5), Point::new(4, 4)),
        Pixel::BLACK,
    );
    assert_eq!(wiped, 25);
    assert_eq!(image.get_pixel(Point::new(0, 0)), Pixel::BLACK);
    assert_eq!(image.get_pixel(Point::new(5, 5)), Pixel::WHITE);
}

#[test]
fn test_copy_rectangle_translates() {
    let mut source = rgb_image(6, 6);
    wipe_rectangle(
        &mut source,
        Rectangle::new(Point::new(0, 0), Point::new(1, 1)),
        RED,
    );

    let mut target = rgb_image(6, 6);
    copy_rectangle(
        &source,
        &mut target,
        Rectangle::new(Point::new(0, 0), Point::new(1, 1)),
        Point::new(3, 4),
    );

    assert_eq!(target.get_pixel(Point::new(3, 4)), RED);
    assert_eq!(target.get_pixel(Point::new(4, 5)), RED);
    assert_eq!(target.get_pixel(Point::new(2, 4)), Pixel::WHITE);
}

#[test]
fn test_brightness_metrics() {
    let mut image = rgb_image(4, 4);
    // half the area black
    wipe_rectangle(
        &mut image,
        Rectangle::new(Point::new(0, 0), Point::new(3, 1)),
        Pixel::BLACK,
    );

    let full = image.full_rect();
    assert_eq!(inverse_brightness_rect(&image, full), 0xFF - 127);
    assert_eq!(darkness_rect(&image, full), 0xFF - 127);

    // everything outside the image counts as white, not as black
    let oversized = Rectangle::new(Point::new(0, 0), Point::new(7, 7));
    assert_eq!(inverse_brightness_rect(&image, oversized), 0xFF - 127);
}

#[test]
fn test_count_pixels_within_brightness() {
    let mut image = rgb_image(4, 4);
    wipe_rectangle(
        &mut image,
        Rectangle::new(Point::new(0, 0), Point::new(0, 3)),
        Pixel::BLACK,
    );

    let full = image.full_rect();
    assert_eq!(count_pixels_within_brightness(&mut image, full, 0, 100, false), 4);

    // clearing while counting leaves the area white
    assert_eq!(count_pixels_within_brightness(&mut image, full, 0, 100, true), 4);
    assert_eq!(count_pixels_within_brightness(&mut image, full, 0, 100, false), 0);
}

#[test]
fn test_center_image_pads_smaller_source() {
    let mut source = rgb_image(2, 2);
    let full = source.full_rect();
    wipe_rectangle(&mut source, full, GREEN);

    let mut target = rgb_image(10, 10);
    let full = target.full_rect();
    wipe_rectangle(&mut target, full, Pixel::BLACK);
    center_image(&source, &mut target, Point::ORIGIN, RectangleSize::new(10, 10));

    // pasted centred, the rest of the area cleared to the background
    assert_eq!(target.get_pixel(Point::new(4, 4)), GREEN);
    assert_eq!(target.get_pixel(Point::new(5, 5)), GREEN);
    assert_eq!(target.get_pixel(Point::new(3, 4)), Pixel::WHITE);
    assert_eq!(target.get_pixel(Point::new(0, 0)), Pixel::WHITE);
}

#[test]
fn test_center_image_crops_larger_source() {
    let mut source = rgb_image(10, 10);
    wipe_rectangle(
        &mut source,
        Rectangle::new(Point::new(4, 4), Point::new(5, 5)),
        BLUE,
    );

    let mut target = rgb_image(4, 4);
    center_image(&source, &mut target, Point::ORIGIN, RectangleSize::new(4, 4));

    // the middle of the source survives the crop
    assert_eq!(target.get_pixel(Point::new(1, 1)), BLUE);
    assert_eq!(target.get_pixel(Point::new(2, 2)), BLUE);
    assert_eq!(target.get_pixel(Point::new(0, 0)), Pixel::WHITE);
}

#[test]
fn test_mirror_twice_is_identity() {
    let mut image = rgb_image(5, 3);
    for (i, color) in [RED, GREEN, BLUE, Pixel::WHITE, Pixel::BLACK]
        .into_iter()
        .enumerate()
    {
        image.set_pixel(Point::new(i as i32, 0), color);
        image.set_pixel(Point::new(i as i32, 2), color);
    }
    let original = snapshot(&image);

    mirror(&mut image, true, false);
    mirror(&mut image, true, false);
    assert_eq!(snapshot(&image), original);

    mirror(&mut image, false, true);
    mirror(&mut image, false, true);
    assert_eq!(snapshot(&image), original);

    mirror(&mut image, true, true);
    mirror(&mut image, true, true);
    assert_eq!(snapshot(&image), original);
}

#[test]
fn test_mirror_horizontal_moves_pixels() {
    let mut image = rgb_image(5, 3);
    image.set_pixel(Point::new(0, 1), RED);
    mirror(&mut image, true, false);
    assert_eq!(image.get_pixel(Point::new(4, 1)), RED);
    assert_eq!(image.get_pixel(Point::new(0, 1)), Pixel::WHITE);
}

#[test]
fn test_flip_rotate_90_roundtrip() {
    let mut image = rgb_image(5, 3);
    image.set_pixel(Point::new(1, 0), RED);
    image.set_pixel(Point::new(4, 2), GREEN);
    let original = snapshot(&image);

    flip_rotate_90(&mut image, RotationDirection::Clockwise);
    assert_eq!(image.width(), 3);
    assert_eq!(image.height(), 5);
    // clockwise, (x, y) lands on (h-1-y, x)
    assert_eq!(image.get_pixel(Point::new(2, 1)), RED);
    assert_eq!(image.get_pixel(Point::new(0, 4)), GREEN);

    flip_rotate_90(&mut image, RotationDirection::Anticlockwise);
    assert_eq!(image.width(), 5);
    assert_eq!(snapshot(&image), original);
}

#[test]
fn test_shift_image() {
    let mut image = rgb_image(5, 5);
    image.set_pixel(Point::new(1, 1), BLUE);

    shift_image(&mut image, Delta::new(2, 1));

    assert_eq!(image.get_pixel(Point::new(3, 2)), BLUE);
    assert_eq!(image.get_pixel(Point::new(1, 1)), Pixel::WHITE);
}

#[test]
fn test_stretch_keeps_corners() {
    let mut image = rgb_image(2, 2);
    image.set_pixel(Point::new(0, 0), Pixel::BLACK);
    image.set_pixel(Point::new(1, 1), Pixel::BLACK);

    stretch_and_replace(&mut image, RectangleSize::new(4, 4), Interpolation::Linear);

    assert_eq!(image.size(), RectangleSize::new(4, 4));
    assert_eq!(image.get_pixel(Point::new(0, 0)), Pixel::BLACK);
    assert_eq!(image.get_pixel(Point::new(3, 3)), Pixel::BLACK);
    assert_eq!(image.get_pixel(Point::new(3, 0)), Pixel::WHITE);
}

#[test]
fn test_stretch_to_same_size_is_identity() {
    let mut image = rgb_image(3, 3);
    image.set_pixel(Point::new(1, 2), RED);
    let original = snapshot(&image);

    stretch_and_replace(&mut image, RectangleSize::new(3, 3), Interpolation::Cubic);

    assert_eq!(snapshot(&image), original);
}

#[test]
fn test_resize_centers_when_ratios_differ() {
    let mut image = rgb_image(4, 2);
    let full = image.full_rect();
    wipe_rectangle(&mut image, full, Pixel::BLACK);

    resize_and_replace(&mut image, RectangleSize::new(8, 8), Interpolation::Linear);

    assert_eq!(image.size(), RectangleSize::new(8, 8));
    // content fills the width, is 4 rows high, and sits centred vertically
    assert_eq!(image.get_pixel(Point::new(3, 1)), Pixel::WHITE);
    assert_eq!(image.get_pixel(Point::new(3, 3)), Pixel::BLACK);
    assert_eq!(image.get_pixel(Point::new(3, 6)), Pixel::WHITE);
}
