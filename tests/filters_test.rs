use descan::imageprocess::blit::wipe_rectangle;
use descan::imageprocess::filters::{
    BlackfilterParameters, BlurfilterParameters, GrayfilterParameters, blackfilter, blurfilter,
    grayfilter, noisefilter,
};
use descan::imageprocess::image::{Image, PixelFormat};
use descan::imageprocess::primitives::{Delta, Pixel, Point, Rectangle, RectangleSize};

const ABS_BLACK: u8 = 171; // black-threshold 0.33
const ABS_WHITE: u8 = 229; // white-threshold 0.9

fn white_image(w: i32, h: i32) -> Image {
    Image::new(
        RectangleSize::new(w, h),
        PixelFormat::Rgb24,
        true,
        Pixel::WHITE,
        ABS_BLACK,
    )
}

fn count_dark(image: &Image) -> u64 {
    image
        .full_rect()
        .scan()
        .filter(|&p| image.grayscale_at(p) < ABS_BLACK)
        .count() as u64
}

fn blackfilter_params(exclusions: Vec<Rectangle>) -> BlackfilterParameters {
    BlackfilterParameters {
        scan_size: RectangleSize::new(20, 20),
        scan_step: Delta::new(5, 5),
        scan_depth: Delta::new(20, 20),
        scan_horizontal: true,
        scan_vertical: true,
        abs_threshold: 242, // scan-threshold 0.95
        intensity: 20,
        exclusions,
    }
}

#[test]
fn test_blackfilter_removes_solid_block() {
    let mut image = white_image(200, 200);
    wipe_rectangle(
        &mut image,
        Rectangle::new(Point::new(80, 80), Point::new(119, 119)),
        Pixel::BLACK,
    );
    assert_eq!(count_dark(&image), 1600);

    let removed = blackfilter(&mut image, &blackfilter_params(Vec::new()));

    assert_eq!(count_dark(&image), 0);
    assert!(removed >= 1600);
}

#[test]
fn test_blackfilter_honors_exclusions() {
    let mut image = white_image(200, 200);
    wipe_rectangle(
        &mut image,
        Rectangle::new(Point::new(80, 80), Point::new(119, 119)),
        Pixel::BLACK,
    );

    let exclusion = Rectangle::new(Point::new(70, 70), Point::new(130, 130));
    blackfilter(&mut image, &blackfilter_params(vec![exclusion]));

    // the block lies entirely inside the exclusion and survives unchanged
    assert_eq!(count_dark(&image), 1600);
}

#[test]
fn test_blurfilter_erases_isolated_speck() {
    let mut image = white_image(300, 300);
    wipe_rectangle(
        &mut image,
        Rectangle::new(Point::new(150, 150), Point::new(154, 154)),
        Pixel::BLACK,
    );

    let params = BlurfilterParameters {
        scan_size: RectangleSize::new(100, 100),
        scan_step: Delta::new(50, 50),
        intensity: 0.01,
    };
    blurfilter(&mut image, &params, ABS_WHITE);

    assert_eq!(count_dark(&image), 0);
}

#[test]
fn test_blurfilter_keeps_dense_content() {
    let mut image = white_image(300, 300);
    wipe_rectangle(
        &mut image,
        Rectangle::new(Point::new(110, 110), Point::new(189, 189)),
        Pixel::BLACK,
    );

    let params = BlurfilterParameters {
        scan_size: RectangleSize::new(100, 100),
        scan_step: Delta::new(50, 50),
        intensity: 0.01,
    };
    blurfilter(&mut image, &params, ABS_WHITE);

    assert_eq!(count_dark(&image), 6400);
}

#[test]
fn test_grayfilter_wipes_black_free_gray_area() {
    let mut image = white_image(100, 100);
    let gray = Pixel::new(200, 200, 200);
    let full = image.full_rect();
    wipe_rectangle(&mut image, full, gray);

    let params = GrayfilterParameters {
        scan_size: RectangleSize::new(50, 50),
        scan_step: Delta::new(20, 20),
        abs_threshold: 128, // grayfilter-threshold 0.5
    };
    let removed = grayfilter(&mut image, &params);

    assert!(removed >= 100 * 100);
    for p in image.full_rect().scan() {
        assert_eq!(image.get_pixel(p), Pixel::WHITE, "at {p:?}");
    }
}

#[test]
fn test_grayfilter_spares_windows_containing_black() {
    let mut image = white_image(50, 50);
    let gray = Pixel::new(200, 200, 200);
    let full = image.full_rect();
    wipe_rectangle(&mut image, full, gray);
    image.set_pixel(Point::new(25, 25), Pixel::BLACK);

    let params = GrayfilterParameters {
        scan_size: RectangleSize::new(50, 50),
        scan_step: Delta::new(20, 20),
        abs_threshold: 128,
    };
    grayfilter(&mut image, &params);

    // the single black pixel protects every window that sees it
    assert_eq!(image.get_pixel(Point::new(25, 25)), Pixel::BLACK);
    assert_eq!(image.get_pixel(Point::new(10, 10)), gray);
}

#[test]
fn test_noisefilter_clears_small_clusters_only() {
    let mut image = white_image(50, 50);
    image.set_pixel(Point::new(10, 10), Pixel::BLACK);
    wipe_rectangle(
        &mut image,
        Rectangle::new(Point::new(30, 30), Point::new(32, 32)),
        Pixel::BLACK,
    );

    let clusters = noisefilter(&mut image, 4, ABS_WHITE);

    assert_eq!(clusters, 1);
    assert_eq!(image.get_pixel(Point::new(10, 10)), Pixel::WHITE);
    // the 3x3 block holds nine pixels, more than the intensity allows
    assert_eq!(image.get_pixel(Point::new(31, 31)), Pixel::BLACK);
    assert_eq!(count_dark(&image), 9);
}
