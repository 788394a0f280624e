//! The resolved option set for one run.
//!
//! Everything the command line configures is validated once and collected
//! here, then threaded immutably through the per-sheet pipeline. Absolute
//! thresholds are derived from the relative ones at construction time.

use crate::config::multi_index::MultiIndex;
use crate::imageprocess::blit::RotationDirection;
use crate::imageprocess::deskew::DeskewParameters;
use crate::imageprocess::filters::{
    BlackfilterParameters, BlurfilterParameters, GrayfilterParameters,
};
use crate::imageprocess::image::PixelFormat;
use crate::imageprocess::interpolate::Interpolation;
use crate::imageprocess::masks::{
    Border, BorderScanParameters, MaskAlignmentParameters, MaskDetectionParameters,
};
use crate::imageprocess::primitives::{Delta, Direction, Pixel, Point, Rectangle, RectangleSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    None,
    #[default]
    Single,
    Double,
}

/// Converts a `[0, 1]` threshold into an absolute grayscale value.
pub fn absolute_threshold(threshold: f32) -> u8 {
    (threshold * 255.0).round().clamp(0.0, 255.0) as u8
}

pub struct Options {
    pub layout: Layout,
    pub start_sheet: i32,
    pub end_sheet: Option<i32>,
    pub input_count: i32,
    pub output_count: i32,
    pub sheet_size: Option<RectangleSize>,
    pub sheet_background: Pixel,

    pub pre_rotate: Option<RotationDirection>,
    pub post_rotate: Option<RotationDirection>,
    pub pre_mirror: Direction,
    pub post_mirror: Direction,
    pub pre_shift: Delta,
    pub post_shift: Delta,
    pub pre_masks: Vec<Rectangle>,
    pub size: Option<RectangleSize>,
    pub post_size: Option<RectangleSize>,
    pub stretch_size: Option<RectangleSize>,
    pub post_stretch_size: Option<RectangleSize>,
    pub zoom: f32,
    pub post_zoom: f32,

    pub points: Vec<Point>,
    pub manual_masks: Vec<Rectangle>,
    pub mask_color: Pixel,
    pub wipes: Vec<Rectangle>,
    pub pre_wipes: Vec<Rectangle>,
    pub post_wipes: Vec<Rectangle>,
    /// Extent of the wipe stripe left and right of the sheet spine.
    pub middle_wipe: (i32, i32),
    pub border: Border,
    pub pre_border: Border,
    pub post_border: Border,

    pub abs_black_threshold: u8,
    pub abs_white_threshold: u8,
    pub interpolation: Interpolation,

    pub mask_detection: MaskDetectionParameters,
    pub mask_alignment: MaskAlignmentParameters,
    pub border_scan: BorderScanParameters,
    pub deskew: DeskewParameters,
    pub blackfilter: BlackfilterParameters,
    pub blurfilter: BlurfilterParameters,
    pub grayfilter: GrayfilterParameters,
    pub noisefilter_intensity: u64,

    pub sheet_multi_index: MultiIndex,
    pub exclude_multi_index: MultiIndex,
    pub ignore_multi_index: MultiIndex,
    pub insert_blank: MultiIndex,
    pub replace_blank: MultiIndex,
    pub no_blackfilter: MultiIndex,
    pub no_noisefilter: MultiIndex,
    pub no_blurfilter: MultiIndex,
    pub no_grayfilter: MultiIndex,
    pub no_mask_scan: MultiIndex,
    pub no_mask_center: MultiIndex,
    pub no_deskew: MultiIndex,
    pub no_wipe: MultiIndex,
    pub no_border: MultiIndex,
    pub no_border_scan: MultiIndex,
    pub no_border_align: MultiIndex,

    pub start_input: Option<i32>,
    pub start_output: Option<i32>,
    pub write_output: bool,
    pub multisheets: bool,
    pub overwrite: bool,
    pub dpi: i32,
    pub output_format: Option<PixelFormat>,
}

impl Options {
    /// Whether a step guarded by `no_multi_index` is disabled for sheet
    /// `nr`, either individually or through `--no-processing`.
    pub fn is_excluded(&self, nr: i32, no_multi_index: &MultiIndex) -> bool {
        no_multi_index.contains(nr) || self.ignore_multi_index.contains(nr)
    }
}
