//! Per-sheet processing.
//!
//! A sheet is the work buffer holding `input_count` pages side by side.
//! [`process_sheet`] runs the ordered chain of transforms, filters and
//! detectors over it; composition of input pages and splitting into output
//! pages happen here as well so the runner only deals with files.

use tracing::{debug, info};

use crate::config::options::{Layout, Options};
use crate::imageprocess::blit::{
    center_image, copy_rectangle, flip_rotate_90, mirror, resize_and_replace, shift_image,
    stretch_and_replace,
};
use crate::imageprocess::deskew::{detect_rotation, rotate};
use crate::imageprocess::filters::{blackfilter, blurfilter, grayfilter, noisefilter};
use crate::imageprocess::image::{Image, PixelFormat};
use crate::imageprocess::masks::{
    Mask, MaskDetectionParameters, align_mask, apply_border, apply_masks, apply_wipes,
    border_to_mask, center_mask, detect_border, detect_masks,
};
use crate::imageprocess::primitives::{Delta, Point, Rectangle, RectangleSize};

/// Sheet-size-dependent defaults installed by the `--layout` choice.
struct LayoutState {
    points: Vec<Point>,
    mask_detection: MaskDetectionParameters,
    blackfilter_exclusions: Vec<Rectangle>,
    wipes: Vec<Rectangle>,
    outside_border_masks: Vec<Rectangle>,
}

fn layout_state(sheet: &Image, options: &Options) -> LayoutState {
    let w = sheet.width();
    let h = sheet.height();

    let mut points = options.points.clone();
    let mut mask_detection = options.mask_detection.clone();
    let mut exclusions = options.blackfilter.exclusions.clone();
    let mut wipes = options.wipes.clone();
    let mut outside_border_masks = Vec::new();

    match options.layout {
        Layout::Single => {
            // the middle of the sheet is the one starting point for mask
            // detection
            if points.is_empty() {
                points.push(Point::new(w / 2, h / 2));
            }
            if mask_detection.maximum_width == -1 {
                mask_detection.maximum_width = w;
            }
            if mask_detection.maximum_height == -1 {
                mask_detection.maximum_height = h;
            }
            // keep the inner half of the sheet out of the blackfilter's reach
            if exclusions.is_empty() {
                exclusions.push(Rectangle::new(
                    Point::new(w / 4, h / 4),
                    Point::new(w / 2 + w / 4, h / 2 + h / 4),
                ));
            }
            outside_border_masks.push(sheet.clip(sheet.full_rect()));
        }
        Layout::Double => {
            // the middle of each half is a starting point for mask detection
            if points.is_empty() {
                points.push(Point::new(w / 4, h / 2));
                points.push(Point::new(w - w / 4, h / 2));
            }
            if mask_detection.maximum_width == -1 {
                mask_detection.maximum_width = w / 2;
            }
            if mask_detection.maximum_height == -1 {
                mask_detection.maximum_height = h;
            }
            if options.middle_wipe.0 > 0 || options.middle_wipe.1 > 0 {
                wipes.push(Rectangle::new(
                    Point::new(w / 2 - options.middle_wipe.0, 0),
                    Point::new(w / 2 + options.middle_wipe.1, h - 1),
                ));
            }
            // keep the inner half of each page out of the blackfilter's reach
            if exclusions.is_empty() {
                exclusions.push(Rectangle::new(
                    Point::new(w / 8, h / 4),
                    Point::new(w / 4 + w / 8, h / 2 + h / 4),
                ));
                exclusions.push(Rectangle::new(
                    Point::new(w / 2 + w / 8, h / 4),
                    Point::new(w / 2 + w / 4 + w / 8, h / 2 + h / 4),
                ));
            }
            outside_border_masks.push(Rectangle::new(Point::ORIGIN, Point::new(w / 2, h - 1)));
            outside_border_masks.push(Rectangle::new(
                Point::new(w / 2, 0),
                Point::new(w - 1, h - 1),
            ));
        }
        Layout::None => {}
    }

    LayoutState {
        points,
        mask_detection,
        blackfilter_exclusions: exclusions,
        wipes,
        outside_border_masks,
    }
}

/// Pastes a loaded page into its slot on the sheet.
pub fn place_page(sheet: &mut Image, page: &Image, index: i32, input_count: i32) {
    let w = sheet.width();
    let h = sheet.height();
    center_image(
        page,
        sheet,
        Point::new(w * index / input_count, 0),
        RectangleSize::new(w / input_count, h),
    );
}

/// Cuts the processed sheet into `output_count` equally wide pages.
pub fn split_sheet(sheet: &Image, output_count: i32) -> Vec<Image> {
    let page_size = RectangleSize::new(sheet.width() / output_count, sheet.height());

    (0..output_count)
        .map(|j| {
            let mut page = sheet.compatible(page_size, false);
            copy_rectangle(
                sheet,
                &mut page,
                Rectangle::from_size(Point::new(page_size.width * j, 0), page_size),
                Point::ORIGIN,
            );
            page
        })
        .collect()
}

fn detect_sheet_masks(sheet: &Image, layout: &LayoutState) -> Vec<Mask> {
    detect_masks(sheet, &layout.mask_detection, &layout.points)
}

/// Runs the ordered processing chain over a composed sheet.
pub fn process_sheet(sheet: &mut Image, nr: i32, options: &Options) {
    // pre-mirroring
    if options.pre_mirror.any() {
        info!("pre-mirroring");
        mirror(
            sheet,
            options.pre_mirror.horizontal,
            options.pre_mirror.vertical,
        );
    }

    // pre-shifting
    if options.pre_shift != Delta::default() {
        info!(
            "pre-shifting [{},{}]",
            options.pre_shift.horizontal, options.pre_shift.vertical
        );
        shift_image(sheet, options.pre_shift);
    }

    // pre-masking
    if !options.pre_masks.is_empty() {
        info!("pre-masking");
        apply_masks(sheet, &options.pre_masks, options.mask_color);
    }

    // stretch, with zoom applied on top
    let stretch_base = options.stretch_size.unwrap_or(sheet.size());
    stretch_and_replace(
        sheet,
        RectangleSize::new(
            (stretch_base.width as f32 * options.zoom) as i32,
            (stretch_base.height as f32 * options.zoom) as i32,
        ),
        options.interpolation,
    );

    // size
    if let Some(size) = options.size {
        resize_and_replace(sheet, size, options.interpolation);
    }

    // layout-dependent defaults need the final sheet geometry
    let layout = layout_state(sheet, options);

    // pre-wipe
    if !options.is_excluded(nr, &options.no_wipe) {
        apply_wipes(sheet, &options.pre_wipes, options.mask_color);
    }

    // pre-border
    if !options.is_excluded(nr, &options.no_border) {
        apply_border(sheet, options.pre_border, options.mask_color);
    }

    // black area filter
    if !options.is_excluded(nr, &options.no_blackfilter) {
        let mut params = options.blackfilter.clone();
        params.exclusions = layout.blackfilter_exclusions.clone();
        blackfilter(sheet, &params);
    } else {
        debug!("+ blackfilter DISABLED for sheet {nr}");
    }

    // noise filter
    if !options.is_excluded(nr, &options.no_noisefilter) {
        info!("noise-filter ...");
        let removed = noisefilter(
            sheet,
            options.noisefilter_intensity,
            options.abs_white_threshold,
        );
        info!("deleted {removed} clusters");
    } else {
        debug!("+ noisefilter DISABLED for sheet {nr}");
    }

    // blur filter
    if !options.is_excluded(nr, &options.no_blurfilter) {
        info!("blur-filter...");
        let removed = blurfilter(sheet, &options.blurfilter, options.abs_white_threshold);
        info!("deleted {removed} pixels");
    } else {
        debug!("+ blurfilter DISABLED for sheet {nr}");
    }

    // mask detection
    let mut detected: Vec<Mask> = Vec::new();
    if !options.is_excluded(nr, &options.no_mask_scan) {
        detected = detect_sheet_masks(sheet, &layout);
    } else {
        debug!("+ mask-scan DISABLED for sheet {nr}");
    }

    // permanently apply masks
    let working_masks: Vec<Rectangle> = options
        .manual_masks
        .iter()
        .copied()
        .chain(detected.iter().map(|m| m.area))
        .collect();
    if !working_masks.is_empty() {
        apply_masks(sheet, &working_masks, options.mask_color);
    }

    // gray filter
    if !options.is_excluded(nr, &options.no_grayfilter) {
        info!("gray-filter...");
        let removed = grayfilter(sheet, &options.grayfilter);
        info!("deleted {removed} pixels");
    } else {
        debug!("+ grayfilter DISABLED for sheet {nr}");
    }

    // rotation detection, then per-mask correction
    if !options.is_excluded(nr, &options.no_deskew) {
        // detect masks again: the first masking and the grayfilter may
        // give more precise results now
        if !options.is_excluded(nr, &options.no_mask_scan) {
            detected = detect_sheet_masks(sheet, &layout);
        } else {
            debug!("(mask-scan before deskewing disabled)");
        }

        for mask in &detected {
            let rotation = detect_rotation(sheet, mask.area, &options.deskew);
            info!(
                "rotate [{},{}]: {rotation}",
                mask.area.vertex[0].x, mask.area.vertex[0].y
            );

            if rotation != 0.0 {
                let size = mask.area.size();
                let mut source = sheet.compatible(size, false);
                let mut target = sheet.compatible(size, true);

                // lift the mask area out, rotate it, paste it back
                copy_rectangle(
                    sheet,
                    &mut source,
                    Rectangle::new(mask.area.vertex[0], Point::INFINITY),
                    Point::ORIGIN,
                );
                rotate(&source, &mut target, -rotation, options.interpolation);
                let full = target.full_rect();
                copy_rectangle(&target, sheet, full, mask.area.vertex[0]);
            }
        }
    } else {
        debug!("+ deskewing DISABLED for sheet {nr}");
    }

    // auto-center masks on the sheet, one per layout starting point
    if !options.is_excluded(nr, &options.no_mask_center) {
        // masks moved during deskewing, detect them once more
        if !options.is_excluded(nr, &options.no_mask_scan) {
            detected = detect_sheet_masks(sheet, &layout);
        } else {
            debug!("(mask-scan before centering disabled)");
        }

        for (point, mask) in layout.points.iter().zip(&detected) {
            center_mask(sheet, *point, mask.area);
        }
    } else {
        debug!("+ auto-centering DISABLED for sheet {nr}");
    }

    // explicit wipe
    if !options.is_excluded(nr, &options.no_wipe) {
        apply_wipes(sheet, &layout.wipes, options.mask_color);
    } else {
        debug!("+ wipe DISABLED for sheet {nr}");
    }

    // explicit border
    if !options.is_excluded(nr, &options.no_border) {
        apply_border(sheet, options.border, options.mask_color);
    } else {
        debug!("+ border DISABLED for sheet {nr}");
    }

    // border detection
    if !options.is_excluded(nr, &options.no_border_scan) {
        let border_masks: Vec<Rectangle> = layout
            .outside_border_masks
            .iter()
            .map(|&outside| {
                let border = detect_border(sheet, &options.border_scan, outside);
                border_to_mask(sheet, border)
            })
            .collect();
        apply_masks(sheet, &border_masks, options.mask_color);

        for (i, &outside) in layout.outside_border_masks.iter().enumerate() {
            if !options.is_excluded(nr, &options.no_border_align) {
                align_mask(sheet, border_masks[i], outside, &options.mask_alignment);
            } else {
                debug!("+ border-centering DISABLED for sheet {nr}");
            }
        }
    } else {
        debug!("+ border-scan DISABLED for sheet {nr}");
    }

    // post-wipe
    if !options.is_excluded(nr, &options.no_wipe) {
        apply_wipes(sheet, &options.post_wipes, options.mask_color);
    }

    // post-border
    if !options.is_excluded(nr, &options.no_border) {
        apply_border(sheet, options.post_border, options.mask_color);
    }

    // post-mirroring
    if options.post_mirror.any() {
        info!("post-mirroring");
        mirror(
            sheet,
            options.post_mirror.horizontal,
            options.post_mirror.vertical,
        );
    }

    // post-shifting
    if options.post_shift != Delta::default() {
        info!(
            "post-shifting [{},{}]",
            options.post_shift.horizontal, options.post_shift.vertical
        );
        shift_image(sheet, options.post_shift);
    }

    // post-rotating
    if let Some(direction) = options.post_rotate {
        info!("post-rotating 90 degrees");
        flip_rotate_90(sheet, direction);
    }

    // post-stretch, with post-zoom applied on top
    let stretch_base = options.post_stretch_size.unwrap_or(sheet.size());
    stretch_and_replace(
        sheet,
        RectangleSize::new(
            (stretch_base.width as f32 * options.post_zoom) as i32,
            (stretch_base.height as f32 * options.post_zoom) as i32,
        ),
        options.interpolation,
    );

    // post-size
    if let Some(size) = options.post_size {
        resize_and_replace(sheet, size, options.interpolation);
    }
}

/// Allocates the RGB sheet buffer every page gets composed onto.
pub fn create_sheet(size: RectangleSize, options: &Options) -> Image {
    Image::new(
        size,
        PixelFormat::Rgb24,
        true,
        options.sheet_background,
        options.abs_black_threshold,
    )
}
