use descan::imageprocess::blit::wipe_rectangle;
use descan::imageprocess::image::{Image, PixelFormat};
use descan::imageprocess::masks::{
    Border, BorderScanParameters, MaskAlignmentParameters, MaskDetectionParameters, align_mask,
    apply_border, apply_masks, apply_wipes, border_to_mask, center_mask, detect_border,
    detect_masks,
};
use descan::imageprocess::primitives::{Delta, Edges, Pixel, Point, Rectangle, RectangleSize};

fn white_image(w: i32, h: i32) -> Image {
    Image::new(
        RectangleSize::new(w, h),
        PixelFormat::Rgb24,
        true,
        Pixel::WHITE,
        171,
    )
}

fn black_rect(image: &mut Image, area: Rectangle) {
    wipe_rectangle(image, area, Pixel::BLACK);
}

fn detection_params() -> MaskDetectionParameters {
    MaskDetectionParameters {
        scan_size: RectangleSize::new(50, 50),
        scan_step: Delta::new(5, 5),
        scan_depth: Delta::new(-1, -1),
        scan_threshold_horizontal: 0.1,
        scan_threshold_vertical: 0.1,
        scan_horizontal: true,
        scan_vertical: true,
        minimum_width: 100,
        maximum_width: -1,
        minimum_height: 100,
        maximum_height: -1,
    }
}

#[test]
fn test_detect_mask_around_content() {
    let mut image = white_image(300, 300);
    let content = Rectangle::new(Point::new(100, 100), Point::new(200, 200));
    black_rect(&mut image, content);

    let masks = detect_masks(&image, &detection_params(), &[Point::new(150, 150)]);

    assert_eq!(masks.len(), 1);
    assert!(masks[0].valid);
    assert!(masks[0].area.encloses(content));
    // the detected mask stays in the vicinity of the content
    assert!(masks[0].area.vertex[0].x >= 0);
    assert!(masks[0].area.vertex[1].x <= 299);
}

#[test]
fn test_detect_mask_clips_to_maximum_when_too_small() {
    let mut image = white_image(300, 300);
    // content far too small for the 100-pixel minimum
    black_rect(
        &mut image,
        Rectangle::new(Point::new(148, 148), Point::new(152, 152)),
    );

    let mut params = detection_params();
    params.minimum_width = 150;
    params.minimum_height = 150;
    params.maximum_width = 200;
    params.maximum_height = 200;
    let masks = detect_masks(&image, &params, &[Point::new(150, 150)]);

    assert_eq!(masks.len(), 1);
    assert!(!masks[0].valid);
    // replaced by a maximum-sized box centred on the scan point
    assert_eq!(masks[0].area.size(), RectangleSize::new(201, 201));
    assert_eq!(masks[0].area.vertex[0], Point::new(50, 50));
}

#[test]
fn test_detect_masks_disabled_directions() {
    let image = white_image(100, 100);
    let mut params = detection_params();
    params.scan_horizontal = false;
    params.scan_vertical = false;

    assert!(detect_masks(&image, &params, &[Point::new(50, 50)]).is_empty());
}

#[test]
fn test_apply_masks_clears_everything_outside() {
    let mut image = white_image(40, 40);
    let full = image.full_rect();
    black_rect(&mut image, full);

    let masks = [
        Rectangle::new(Point::new(5, 5), Point::new(10, 10)),
        Rectangle::new(Point::new(20, 20), Point::new(30, 30)),
    ];
    apply_masks(&mut image, &masks, Pixel::WHITE);

    for p in image.full_rect().scan() {
        let expected = if p.in_any_rectangle(&masks) {
            Pixel::BLACK
        } else {
            Pixel::WHITE
        };
        assert_eq!(image.get_pixel(p), expected, "at {p:?}");
    }
}

#[test]
fn test_apply_wipes() {
    let mut image = white_image(20, 20);
    apply_wipes(
        &mut image,
        &[Rectangle::new(Point::new(2, 2), Point::new(4, 4))],
        Pixel::BLACK,
    );

    assert_eq!(image.get_pixel(Point::new(3, 3)), Pixel::BLACK);
    assert_eq!(image.get_pixel(Point::new(5, 5)), Pixel::WHITE);
}

#[test]
fn test_apply_border_clears_strips() {
    let mut image = white_image(50, 50);
    let full = image.full_rect();
    black_rect(&mut image, full);

    let border = Border::new(5, 6, 7, 8);
    apply_border(&mut image, border, Pixel::WHITE);

    for p in image.full_rect().scan() {
        let inside = p.x >= 5 && p.x <= 50 - 7 - 1 && p.y >= 6 && p.y <= 50 - 8 - 1;
        let expected = if inside { Pixel::BLACK } else { Pixel::WHITE };
        assert_eq!(image.get_pixel(p), expected, "at {p:?}");
    }
}

#[test]
fn test_apply_null_border_is_noop() {
    let mut image = white_image(10, 10);
    let full = image.full_rect();
    black_rect(&mut image, full);
    apply_border(&mut image, Border::NULL, Pixel::WHITE);
    assert_eq!(image.get_pixel(Point::new(0, 0)), Pixel::BLACK);
}

#[test]
fn test_border_to_mask() {
    let image = white_image(100, 80);
    let mask = border_to_mask(&image, Border::new(10, 5, 20, 15));
    assert_eq!(mask.vertex[0], Point::new(10, 5));
    assert_eq!(mask.vertex[1], Point::new(79, 64));
}

#[test]
fn test_center_mask_moves_content() {
    let mut image = white_image(100, 100);
    let area = Rectangle::new(Point::new(0, 0), Point::new(9, 9));
    black_rect(&mut image, area);

    center_mask(&mut image, Point::new(50, 50), area);

    assert_eq!(image.get_pixel(Point::new(0, 0)), Pixel::WHITE);
    assert_eq!(image.get_pixel(Point::new(45, 45)), Pixel::BLACK);
    assert_eq!(image.get_pixel(Point::new(54, 54)), Pixel::BLACK);
    assert_eq!(image.get_pixel(Point::new(55, 55)), Pixel::WHITE);
}

#[test]
fn test_center_mask_skips_when_leaving_image() {
    let mut image = white_image(100, 100);
    let area = Rectangle::new(Point::new(0, 0), Point::new(19, 19));
    black_rect(&mut image, area);

    // centring on a corner would shift the area outside the image
    center_mask(&mut image, Point::new(2, 2), area);

    assert_eq!(image.get_pixel(Point::new(0, 0)), Pixel::BLACK);
    assert_eq!(image.get_pixel(Point::new(19, 19)), Pixel::BLACK);
}

#[test]
fn test_align_mask_left_top() {
    let mut image = white_image(100, 100);
    let inside = Rectangle::new(Point::new(40, 40), Point::new(49, 49));
    black_rect(&mut image, inside);

    let params = MaskAlignmentParameters {
        alignment: Edges {
            left: true,
            top: true,
            right: false,
            bottom: false,
        },
        margin: Delta::new(3, 3),
    };
    let outside = image.full_rect();
    align_mask(&mut image, inside, outside, &params);

    assert_eq!(image.get_pixel(Point::new(3, 3)), Pixel::BLACK);
    assert_eq!(image.get_pixel(Point::new(12, 12)), Pixel::BLACK);
    assert_eq!(image.get_pixel(Point::new(45, 45)), Pixel::WHITE);
}

#[test]
fn test_detect_border_finds_margins() {
    let mut image = white_image(300, 300);
    // a 2-pixel dark frame just inside a 10-pixel white margin
    black_rect(
        &mut image,
        Rectangle::new(Point::new(10, 10), Point::new(289, 289)),
    );
    wipe_rectangle(
        &mut image,
        Rectangle::new(Point::new(12, 12), Point::new(287, 287)),
        Pixel::WHITE,
    );

    let params = BorderScanParameters {
        scan_size: RectangleSize::new(5, 5),
        scan_step: Delta::new(5, 5),
        scan_threshold_horizontal: 5,
        scan_threshold_vertical: 5,
        scan_horizontal: true,
        scan_vertical: true,
    };
    let outside = image.full_rect();
    let border = detect_border(&mut image, &params, outside);

    assert_eq!(border, Border::new(10, 10, 10, 10));
}
