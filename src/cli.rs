//! The command-line surface and its translation into the resolved
//! [`Options`] handed to the pipeline.

use clap::{Parser, ValueEnum};
use tracing::warn;

use crate::config::multi_index::MultiIndex;
use crate::config::options::{Layout, Options, absolute_threshold};
use crate::config::papersize::{parse_delta, parse_size};
use crate::error::{DescanError, Result};
use crate::imageprocess::blit::RotationDirection;
use crate::imageprocess::deskew::{DeskewParameters, degrees_to_radians};
use crate::imageprocess::filters::{
    BlackfilterParameters, BlurfilterParameters, GrayfilterParameters,
};
use crate::imageprocess::image::PixelFormat;
use crate::imageprocess::interpolate::Interpolation;
use crate::imageprocess::masks::{
    Border, BorderScanParameters, MaskAlignmentParameters, MaskDetectionParameters,
};
use crate::imageprocess::primitives::{
    Delta, Direction, Edges, Pixel, Point, Rectangle, RectangleSize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    None,
    Single,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackgroundArg {
    White,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputTypeArg {
    Pbm,
    Pgm,
    Ppm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InterpolationArg {
    Nearest,
    Linear,
    Cubic,
}

/// Post-processing tool for scanned sheets of paper.
#[derive(Debug, Parser)]
#[command(
    name = "descan",
    version,
    about = "Post-processing tool for scanned sheets of paper",
    after_help = "Filenames may contain a placeholder starting with '%' to insert a page \
                  counter for multi-page processing, e.g. 'scan%03d.pbm'."
)]
pub struct Cli {
    /// Layout of the sheets to process.
    #[arg(short = 'l', long, value_enum, default_value = "single")]
    pub layout: LayoutArg,

    /// Sheets to process (multi-index, e.g. 1,3,5-10); all when unset.
    #[arg(long)]
    pub sheet: Option<String>,

    /// First sheet to process.
    #[arg(long, alias = "start", default_value_t = 1)]
    pub start_sheet: i32,

    /// Last sheet to process; open-ended when unset.
    #[arg(long, alias = "end")]
    pub end_sheet: Option<i32>,

    /// Input page number the first sheet starts at.
    #[arg(long, alias = "si")]
    pub start_input: Option<i32>,

    /// Output page number the first sheet starts at.
    #[arg(long, alias = "so")]
    pub start_output: Option<i32>,

    /// Sheet size: WxH in pixels or physical units, or a paper name.
    #[arg(short = 'S', long)]
    pub sheet_size: Option<String>,

    /// Colour the sheet buffer is filled with.
    #[arg(long, value_enum, default_value = "white")]
    pub sheet_background: BackgroundArg,

    /// Sheets to exclude from processing (multi-index).
    #[arg(short = 'x', long, num_args = 0..=1, require_equals = true)]
    pub exclude: Option<Option<String>>,

    /// Sheets to pass through without any optional processing step.
    #[arg(short = 'n', long)]
    pub no_processing: Option<String>,

    /// Rotate each input page by -90 or 90 degrees before composition.
    #[arg(long, default_value_t = 0)]
    pub pre_rotate: i32,

    /// Rotate the sheet by -90 or 90 degrees after processing.
    #[arg(long, default_value_t = 0)]
    pub post_rotate: i32,

    /// Mirror the sheet before processing (h, v or h,v).
    #[arg(short = 'M', long)]
    pub pre_mirror: Option<String>,

    /// Mirror the sheet after processing (h, v or h,v).
    #[arg(long)]
    pub post_mirror: Option<String>,

    /// Shift the sheet content before processing (pair, physical units allowed).
    #[arg(long)]
    pub pre_shift: Option<String>,

    /// Shift the sheet content after processing.
    #[arg(long)]
    pub post_shift: Option<String>,

    /// Mask applied before processing (x1,y1,x2,y2; repeatable).
    #[arg(long)]
    pub pre_mask: Vec<String>,

    /// Zoom-fit the sheet to this size after the filters.
    #[arg(short = 's', long)]
    pub size: Option<String>,

    /// Zoom-fit the sheet to this size at the very end.
    #[arg(long)]
    pub post_size: Option<String>,

    /// Stretch the sheet to this size before processing.
    #[arg(long)]
    pub stretch: Option<String>,

    /// Stretch the sheet to this size after processing.
    #[arg(long)]
    pub post_stretch: Option<String>,

    /// Zoom factor applied with --stretch.
    #[arg(short = 'z', long, default_value_t = 1.0)]
    pub zoom: f32,

    /// Zoom factor applied with --post-stretch.
    #[arg(long, default_value_t = 1.0)]
    pub post_zoom: f32,

    /// Starting point for mask detection (x,y; repeatable).
    #[arg(short = 'p', long)]
    pub mask_scan_point: Vec<String>,

    /// Manually set mask (x1,y1,x2,y2; repeatable).
    #[arg(short = 'm', long)]
    pub mask: Vec<String>,

    /// Area to wipe between the filters (x1,y1,x2,y2; repeatable).
    #[arg(short = 'W', long)]
    pub wipe: Vec<String>,

    /// Area to wipe before processing.
    #[arg(long)]
    pub pre_wipe: Vec<String>,

    /// Area to wipe after processing.
    #[arg(long)]
    pub post_wipe: Vec<String>,

    /// Wipe stripe around the sheet spine on double layouts (left,right).
    #[arg(long, alias = "mw")]
    pub middle_wipe: Option<String>,

    /// Explicit border to clear (left,top,right,bottom).
    #[arg(short = 'B', long)]
    pub border: Option<String>,

    /// Border cleared before processing.
    #[arg(long)]
    pub pre_border: Option<String>,

    /// Border cleared after processing.
    #[arg(long)]
    pub post_border: Option<String>,

    /// Disable the blackfilter, optionally only for the given sheets.
    #[arg(long, num_args = 0..=1, require_equals = true)]
    pub no_blackfilter: Option<Option<String>>,

    /// Axes the blackfilter scans.
    #[arg(long, default_value = "h,v")]
    pub blackfilter_scan_direction: String,

    /// Blackfilter scan-bar size (pair).
    #[arg(long, default_value = "20")]
    pub blackfilter_scan_size: String,

    /// Blackfilter stripe depth (pair).
    #[arg(long, default_value = "500")]
    pub blackfilter_scan_depth: String,

    /// Blackfilter scan step (pair).
    #[arg(long, default_value = "5")]
    pub blackfilter_scan_step: String,

    /// Darkness ratio a scan bar must reach to count as solidly black.
    #[arg(long, default_value_t = 0.95)]
    pub blackfilter_scan_threshold: f32,

    /// Area the blackfilter must not touch (x1,y1,x2,y2; repeatable).
    #[arg(long)]
    pub blackfilter_scan_exclude: Vec<String>,

    /// Bright pixels the blackfilter fill may cross.
    #[arg(long, default_value_t = 20)]
    pub blackfilter_intensity: u64,

    /// Disable the noisefilter, optionally only for the given sheets.
    #[arg(long, num_args = 0..=1, require_equals = true)]
    pub no_noisefilter: Option<Option<String>>,

    /// Maximum size of dark clusters the noisefilter removes.
    #[arg(long, default_value_t = 4)]
    pub noisefilter_intensity: u64,

    /// Disable the blurfilter, optionally only for the given sheets.
    #[arg(long, num_args = 0..=1, require_equals = true)]
    pub no_blurfilter: Option<Option<String>>,

    /// Blurfilter block size (pair).
    #[arg(long, default_value = "100")]
    pub blurfilter_size: String,

    /// Blurfilter shaking step (pair).
    #[arg(long, default_value = "50")]
    pub blurfilter_step: String,

    /// Highest dark-pixel ratio the blurfilter still erases.
    #[arg(long, default_value_t = 0.01)]
    pub blurfilter_intensity: f32,

    /// Disable the grayfilter, optionally only for the given sheets.
    #[arg(long, num_args = 0..=1, require_equals = true)]
    pub no_grayfilter: Option<Option<String>>,

    /// Grayfilter window size (pair).
    #[arg(long, default_value = "50")]
    pub grayfilter_size: String,

    /// Grayfilter step (pair).
    #[arg(long, default_value = "20")]
    pub grayfilter_step: String,

    /// Darkness ratio below which a black-free window is wiped.
    #[arg(long, default_value_t = 0.5)]
    pub grayfilter_threshold: f32,

    /// Disable mask detection, optionally only for the given sheets.
    #[arg(long, num_args = 0..=1, require_equals = true)]
    pub no_mask_scan: Option<Option<String>>,

    /// Axes the mask detection scans.
    #[arg(long, default_value = "h")]
    pub mask_scan_direction: String,

    /// Mask-scan bar size (pair).
    #[arg(long, default_value = "50")]
    pub mask_scan_size: String,

    /// Mask-scan bar depth (pair); -1 covers the full sheet extent.
    #[arg(long, default_value = "-1")]
    pub mask_scan_depth: String,

    /// Mask-scan step (pair).
    #[arg(long, default_value = "5")]
    pub mask_scan_step: String,

    /// Blackness fraction of the running average that ends the scan (pair).
    #[arg(long, default_value = "0.1")]
    pub mask_scan_threshold: String,

    /// Minimum width,height of an accepted mask.
    #[arg(long, default_value = "100,100")]
    pub mask_scan_minimum: String,

    /// Maximum width,height of an accepted mask.
    #[arg(long)]
    pub mask_scan_maximum: Option<String>,

    /// Colour written outside the masks, as a 24-bit value.
    #[arg(long, default_value_t = 0xffffff)]
    pub mask_color: u32,

    /// Disable mask centering, optionally only for the given sheets.
    #[arg(long, num_args = 0..=1, require_equals = true)]
    pub no_mask_center: Option<Option<String>>,

    /// Disable deskewing, optionally only for the given sheets.
    #[arg(long, num_args = 0..=1, require_equals = true)]
    pub no_deskew: Option<Option<String>>,

    /// Mask edges the deskew scan starts from (left,top,right,bottom).
    #[arg(long, default_value = "left,right")]
    pub deskew_scan_direction: String,

    /// Length of the virtual deskew scan line; -1 covers the mask extent.
    #[arg(long, default_value_t = 1500)]
    pub deskew_scan_size: i32,

    /// Accumulated-darkness factor that ends the deskew scan.
    #[arg(long, default_value_t = 0.5)]
    pub deskew_scan_depth: f32,

    /// Maximum rotation angle scanned, in degrees.
    #[arg(long, default_value_t = 5.0)]
    pub deskew_scan_range: f32,

    /// Test-angle step, in degrees.
    #[arg(long, default_value_t = 0.1)]
    pub deskew_scan_step: f32,

    /// Maximum per-edge deviation before rotation is rejected, in degrees.
    #[arg(long, default_value_t = 1.0)]
    pub deskew_scan_deviation: f32,

    /// Disable border detection, optionally only for the given sheets.
    #[arg(long, num_args = 0..=1, require_equals = true)]
    pub no_border_scan: Option<Option<String>>,

    /// Axes the border scan moves along.
    #[arg(long, default_value = "v")]
    pub border_scan_direction: String,

    /// Border-scan stripe size (pair).
    #[arg(long, default_value = "5")]
    pub border_scan_size: String,

    /// Border-scan step (pair).
    #[arg(long, default_value = "5")]
    pub border_scan_step: String,

    /// Dark pixels a stripe must hold to end the border scan (pair).
    #[arg(long, default_value = "5")]
    pub border_scan_threshold: String,

    /// Edges to align the detected content towards; centred when unset.
    #[arg(long)]
    pub border_align: Option<String>,

    /// Margin kept when aligning (pair, physical units allowed).
    #[arg(long)]
    pub border_margin: Option<String>,

    /// Disable border aligning, optionally only for the given sheets.
    #[arg(long, num_args = 0..=1, require_equals = true)]
    pub no_border_align: Option<Option<String>>,

    /// Disable wiping, optionally only for the given sheets.
    #[arg(long, num_args = 0..=1, require_equals = true)]
    pub no_wipe: Option<Option<String>>,

    /// Disable explicit borders, optionally only for the given sheets.
    #[arg(long, num_args = 0..=1, require_equals = true)]
    pub no_border: Option<Option<String>>,

    /// Brightness ratio above which a pixel counts as white.
    #[arg(short = 'w', long, default_value_t = 0.9)]
    pub white_threshold: f32,

    /// Darkness ratio below which a pixel counts as black.
    #[arg(short = 'b', long, default_value_t = 0.33)]
    pub black_threshold: f32,

    /// Input pages per sheet (1 or 2).
    #[arg(long, alias = "ip", default_value_t = 1)]
    pub input_pages: i32,

    /// Output pages per sheet (1 or 2).
    #[arg(long, alias = "op", default_value_t = 1)]
    pub output_pages: i32,

    /// Input page numbers at which to insert a blank page (multi-index).
    #[arg(long)]
    pub insert_blank: Option<String>,

    /// Input page numbers to replace with a blank page (multi-index).
    #[arg(long)]
    pub replace_blank: Option<String>,

    /// Process normally but write no output files.
    #[arg(short = 'T', long)]
    pub test_only: bool,

    /// Treat the arguments as a single sheet, no wildcard expansion.
    #[arg(long)]
    pub no_multi_pages: bool,

    /// Resolution used to convert physical dimensions to pixels.
    #[arg(long, default_value_t = 300)]
    pub dpi: i32,

    /// Force the output file type.
    #[arg(short = 't', long = "type", value_enum)]
    pub output_type: Option<OutputTypeArg>,

    /// Print only errors.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Overwrite existing output files.
    #[arg(long)]
    pub overwrite: bool,

    /// More verbose output; repeat up to four times.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[arg(long = "vv", hide = true)]
    pub vv: bool,

    #[arg(long = "vvv", hide = true)]
    pub vvv: bool,

    #[arg(long = "vvvv", hide = true)]
    pub vvvv: bool,

    /// Interpolation used by stretching, resizing and rotation.
    #[arg(long, value_enum, default_value = "cubic")]
    pub interpolate: InterpolationArg,

    /// Input files, then output files.
    #[arg(value_name = "FILE")]
    pub files: Vec<String>,
}

impl Cli {
    /// Effective verbosity level, 0 to 4.
    pub fn verbosity(&self) -> u8 {
        let flagged = if self.vvvv {
            4
        } else if self.vvv {
            3
        } else if self.vv {
            2
        } else {
            0
        };
        self.verbose.max(flagged)
    }
}

/// Parses one or two comma-separated integers; a single value stands for
/// both.
fn parse_int_pair(s: &str) -> Result<(i32, i32)> {
    let mut parts = s.splitn(2, ',');
    let first: i32 = parts
        .next()
        .unwrap_or("")
        .trim()
        .parse()
        .map_err(|_| DescanError::config(format!("unable to parse integer pair '{s}'")))?;
    let second = match parts.next() {
        Some(part) => part
            .trim()
            .parse()
            .map_err(|_| DescanError::config(format!("unable to parse integer pair '{s}'")))?,
        None => first,
    };
    Ok((first, second))
}

fn parse_float_pair(s: &str) -> Result<(f32, f32)> {
    let mut parts = s.splitn(2, ',');
    let first: f32 = parts
        .next()
        .unwrap_or("")
        .trim()
        .parse()
        .map_err(|_| DescanError::config(format!("unable to parse float pair '{s}'")))?;
    let second = match parts.next() {
        Some(part) => part
            .trim()
            .parse()
            .map_err(|_| DescanError::config(format!("unable to parse float pair '{s}'")))?,
        None => first,
    };
    Ok((first, second))
}

/// Accepts 'h', 'v' and their long spellings in any combination.
/// There is no 'h' in "vertical" and no 'v' in "horizontal".
fn parse_directions(s: &str) -> Result<Direction> {
    let direction = Direction {
        horizontal: s.contains('h'),
        vertical: s.contains('v'),
    };
    if !direction.any() {
        return Err(DescanError::config(format!(
            "unknown direction name '{s}', expected 'h[orizontal]' or 'v[ertical]'"
        )));
    }
    Ok(direction)
}

fn parse_edges(s: &str) -> Result<Edges> {
    let edges = Edges {
        left: s.contains("left"),
        top: s.contains("top"),
        right: s.contains("right"),
        bottom: s.contains("bottom"),
    };
    if edges == Edges::default() {
        return Err(DescanError::config(format!(
            "unknown edge name '{s}', expected 'left', 'top', 'right' or 'bottom'"
        )));
    }
    Ok(edges)
}

fn parse_point(s: &str) -> Result<Point> {
    let (x, y) = parse_int_pair(s)?;
    Ok(Point::new(x, y))
}

fn parse_rectangle(s: &str) -> Result<Rectangle> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        return Err(DescanError::config(format!(
            "unable to parse rectangle '{s}', expected x1,y1,x2,y2"
        )));
    }
    let mut values = [0i32; 4];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .trim()
            .parse()
            .map_err(|_| DescanError::config(format!("unable to parse rectangle '{s}'")))?;
    }
    Ok(Rectangle::new(
        Point::new(values[0], values[1]),
        Point::new(values[2], values[3]),
    ))
}

fn parse_rectangles(args: &[String]) -> Result<Vec<Rectangle>> {
    args.iter().map(|s| parse_rectangle(s)).collect()
}

fn parse_border_arg(s: &str) -> Result<Border> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        return Err(DescanError::config(format!(
            "unable to parse border '{s}', expected left,top,right,bottom"
        )));
    }
    let mut values = [0i32; 4];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .trim()
            .parse()
            .map_err(|_| DescanError::config(format!("unable to parse border '{s}'")))?;
    }
    Ok(Border::new(values[0], values[1], values[2], values[3]))
}

/// Maps an optional-value disable flag: unset selects no sheet, the bare
/// flag selects every sheet, a value selects the listed sheets.
fn multi_index_arg(arg: &Option<Option<String>>) -> Result<MultiIndex> {
    match arg {
        None => Ok(MultiIndex::none()),
        Some(None) => Ok(MultiIndex::All),
        Some(Some(s)) => MultiIndex::parse(s),
    }
}

fn rotation_arg(value: i32, name: &str) -> Option<RotationDirection> {
    match value {
        0 => None,
        90 => Some(RotationDirection::Clockwise),
        -90 => Some(RotationDirection::Anticlockwise),
        other => {
            warn!("cannot set --{name} value other than -90 or 90, ignoring {other}.");
            None
        }
    }
}

/// Validates the parsed command line and builds the option set for the
/// run, plus the positional file arguments.
pub fn resolve(cli: Cli) -> Result<(Options, Vec<String>)> {
    let dpi = cli.dpi;

    let abs_black_threshold = absolute_threshold(1.0 - cli.black_threshold);
    let abs_white_threshold = absolute_threshold(cli.white_threshold);

    let sheet_background = match cli.sheet_background {
        BackgroundArg::White => Pixel::WHITE,
        BackgroundArg::Black => Pixel::BLACK,
    };

    let mut start_sheet = cli.start_sheet;
    let sheet_multi_index = match &cli.sheet {
        None => MultiIndex::All,
        Some(s) => {
            let mi = MultiIndex::parse(s)?;
            // allow the first listed sheet as start, --start-sheet may
            // still override
            if let Some(first) = mi.first() {
                if start_sheet > first {
                    start_sheet = first;
                }
            }
            mi
        }
    };

    let exclude_multi_index = match &cli.exclude {
        None | Some(None) => MultiIndex::none(), // excluding all makes no sense
        Some(Some(s)) => MultiIndex::parse(s)?,
    };
    let ignore_multi_index = match &cli.no_processing {
        None => MultiIndex::none(),
        Some(s) => MultiIndex::parse(s)?,
    };
    let insert_blank = match &cli.insert_blank {
        None => MultiIndex::none(),
        Some(s) => MultiIndex::parse(s)?,
    };
    let replace_blank = match &cli.replace_blank {
        None => MultiIndex::none(),
        Some(s) => MultiIndex::parse(s)?,
    };

    let mut input_count = cli.input_pages;
    if !(1..=2).contains(&input_count) {
        warn!("cannot set --input-pages value other than 1 or 2, ignoring.");
        input_count = 1;
    }
    let mut output_count = cli.output_pages;
    if !(1..=2).contains(&output_count) {
        warn!("cannot set --output-pages value other than 1 or 2, ignoring.");
        output_count = 1;
    }

    let multisheets = !cli.no_multi_pages;
    let mut end_sheet = cli.end_sheet;
    if !multisheets && end_sheet.is_none() {
        end_sheet = Some(start_sheet);
    }

    let pre_mirror = match &cli.pre_mirror {
        Some(s) => parse_directions(s)?,
        None => Direction::NONE,
    };
    let post_mirror = match &cli.post_mirror {
        Some(s) => parse_directions(s)?,
        None => Direction::NONE,
    };
    let pre_shift = match &cli.pre_shift {
        Some(s) => parse_delta(s, dpi)?,
        None => Delta::default(),
    };
    let post_shift = match &cli.post_shift {
        Some(s) => parse_delta(s, dpi)?,
        None => Delta::default(),
    };

    let parse_opt_size =
        |arg: &Option<String>| arg.as_deref().map(|s| parse_size(s, dpi)).transpose();

    let mask_detection = {
        let direction = parse_directions(&cli.mask_scan_direction)?;
        let (size_h, size_v) = parse_int_pair(&cli.mask_scan_size)?;
        let (depth_h, depth_v) = parse_int_pair(&cli.mask_scan_depth)?;
        let (step_h, step_v) = parse_int_pair(&cli.mask_scan_step)?;
        let (threshold_h, threshold_v) = parse_float_pair(&cli.mask_scan_threshold)?;
        let (minimum_width, minimum_height) = parse_int_pair(&cli.mask_scan_minimum)?;
        let (maximum_width, maximum_height) = match &cli.mask_scan_maximum {
            Some(s) => parse_int_pair(s)?,
            None => (-1, -1),
        };
        MaskDetectionParameters {
            scan_size: RectangleSize::new(size_h, size_v),
            scan_step: Delta::new(step_h, step_v),
            scan_depth: Delta::new(depth_h, depth_v),
            scan_threshold_horizontal: threshold_h,
            scan_threshold_vertical: threshold_v,
            scan_horizontal: direction.horizontal,
            scan_vertical: direction.vertical,
            minimum_width,
            maximum_width,
            minimum_height,
            maximum_height,
        }
    };

    let mask_alignment = MaskAlignmentParameters {
        alignment: match &cli.border_align {
            Some(s) => parse_edges(s)?,
            None => Edges::default(), // center
        },
        margin: match &cli.border_margin {
            Some(s) => parse_delta(s, dpi)?,
            None => Delta::default(),
        },
    };

    let border_scan = {
        let direction = parse_directions(&cli.border_scan_direction)?;
        let (size_h, size_v) = parse_int_pair(&cli.border_scan_size)?;
        let (step_h, step_v) = parse_int_pair(&cli.border_scan_step)?;
        let (threshold_h, threshold_v) = parse_int_pair(&cli.border_scan_threshold)?;
        BorderScanParameters {
            scan_size: RectangleSize::new(size_h, size_v),
            scan_step: Delta::new(step_h, step_v),
            scan_threshold_horizontal: threshold_h,
            scan_threshold_vertical: threshold_v,
            scan_horizontal: direction.horizontal,
            scan_vertical: direction.vertical,
        }
    };

    let deskew = DeskewParameters {
        scan_range_rad: degrees_to_radians(cli.deskew_scan_range),
        scan_step_rad: degrees_to_radians(cli.deskew_scan_step),
        scan_deviation_rad: degrees_to_radians(cli.deskew_scan_deviation),
        scan_size: cli.deskew_scan_size,
        scan_depth: cli.deskew_scan_depth,
        scan_edges: parse_edges(&cli.deskew_scan_direction)?,
    };

    let blackfilter = {
        let direction = parse_directions(&cli.blackfilter_scan_direction)?;
        let (size_h, size_v) = parse_int_pair(&cli.blackfilter_scan_size)?;
        let (depth_h, depth_v) = parse_int_pair(&cli.blackfilter_scan_depth)?;
        let (step_h, step_v) = parse_int_pair(&cli.blackfilter_scan_step)?;
        BlackfilterParameters {
            scan_size: RectangleSize::new(size_h, size_v),
            scan_step: Delta::new(step_h, step_v),
            scan_depth: Delta::new(depth_h, depth_v),
            scan_horizontal: direction.horizontal,
            scan_vertical: direction.vertical,
            abs_threshold: absolute_threshold(cli.blackfilter_scan_threshold),
            intensity: cli.blackfilter_intensity,
            exclusions: parse_rectangles(&cli.blackfilter_scan_exclude)?,
        }
    };

    let blurfilter = {
        let (size_h, size_v) = parse_int_pair(&cli.blurfilter_size)?;
        let (step_h, step_v) = parse_int_pair(&cli.blurfilter_step)?;
        BlurfilterParameters {
            scan_size: RectangleSize::new(size_h, size_v),
            scan_step: Delta::new(step_h, step_v),
            intensity: cli.blurfilter_intensity,
        }
    };

    let grayfilter = {
        let (size_h, size_v) = parse_int_pair(&cli.grayfilter_size)?;
        let (step_h, step_v) = parse_int_pair(&cli.grayfilter_step)?;
        GrayfilterParameters {
            scan_size: RectangleSize::new(size_h, size_v),
            scan_step: Delta::new(step_h, step_v),
            abs_threshold: absolute_threshold(cli.grayfilter_threshold),
        }
    };

    let points = cli
        .mask_scan_point
        .iter()
        .map(|s| parse_point(s))
        .collect::<Result<Vec<_>>>()?;

    let options = Options {
        layout: match cli.layout {
            LayoutArg::None => Layout::None,
            LayoutArg::Single => Layout::Single,
            LayoutArg::Double => Layout::Double,
        },
        start_sheet,
        end_sheet,
        input_count,
        output_count,
        sheet_size: parse_opt_size(&cli.sheet_size)?,
        sheet_background,
        pre_rotate: rotation_arg(cli.pre_rotate, "pre-rotate"),
        post_rotate: rotation_arg(cli.post_rotate, "post-rotate"),
        pre_mirror,
        post_mirror,
        pre_shift,
        post_shift,
        pre_masks: parse_rectangles(&cli.pre_mask)?,
        size: parse_opt_size(&cli.size)?,
        post_size: parse_opt_size(&cli.post_size)?,
        stretch_size: parse_opt_size(&cli.stretch)?,
        post_stretch_size: parse_opt_size(&cli.post_stretch)?,
        zoom: cli.zoom,
        post_zoom: cli.post_zoom,
        points,
        manual_masks: parse_rectangles(&cli.mask)?,
        mask_color: Pixel::from_value(cli.mask_color),
        wipes: parse_rectangles(&cli.wipe)?,
        pre_wipes: parse_rectangles(&cli.pre_wipe)?,
        post_wipes: parse_rectangles(&cli.post_wipe)?,
        middle_wipe: match &cli.middle_wipe {
            Some(s) => parse_int_pair(s)?,
            None => (0, 0),
        },
        border: match &cli.border {
            Some(s) => parse_border_arg(s)?,
            None => Border::NULL,
        },
        pre_border: match &cli.pre_border {
            Some(s) => parse_border_arg(s)?,
            None => Border::NULL,
        },
        post_border: match &cli.post_border {
            Some(s) => parse_border_arg(s)?,
            None => Border::NULL,
        },
        abs_black_threshold,
        abs_white_threshold,
        interpolation: match cli.interpolate {
            InterpolationArg::Nearest => Interpolation::Nearest,
            InterpolationArg::Linear => Interpolation::Linear,
            InterpolationArg::Cubic => Interpolation::Cubic,
        },
        mask_detection,
        mask_alignment,
        border_scan,
        deskew,
        blackfilter,
        blurfilter,
        grayfilter,
        noisefilter_intensity: cli.noisefilter_intensity,
        sheet_multi_index,
        exclude_multi_index,
        ignore_multi_index,
        insert_blank,
        replace_blank,
        no_blackfilter: multi_index_arg(&cli.no_blackfilter)?,
        no_noisefilter: multi_index_arg(&cli.no_noisefilter)?,
        no_blurfilter: multi_index_arg(&cli.no_blurfilter)?,
        no_grayfilter: multi_index_arg(&cli.no_grayfilter)?,
        no_mask_scan: multi_index_arg(&cli.no_mask_scan)?,
        no_mask_center: multi_index_arg(&cli.no_mask_center)?,
        no_deskew: multi_index_arg(&cli.no_deskew)?,
        no_wipe: multi_index_arg(&cli.no_wipe)?,
        no_border: multi_index_arg(&cli.no_border)?,
        no_border_scan: multi_index_arg(&cli.no_border_scan)?,
        no_border_align: multi_index_arg(&cli.no_border_align)?,
        start_input: cli.start_input,
        start_output: cli.start_output,
        write_output: !cli.test_only,
        multisheets,
        overwrite: cli.overwrite,
        dpi,
        output_format: cli.output_type.map(|t| match t {
            OutputTypeArg::Pbm => PixelFormat::MonoWhite,
            OutputTypeArg::Pgm => PixelFormat::Gray8,
            OutputTypeArg::Ppm => PixelFormat::Rgb24,
        }),
    };

    Ok((options, cli.files))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        assert_eq!(parse_int_pair("20").unwrap(), (20, 20));
        assert_eq!(parse_int_pair("20,30").unwrap(), (20, 30));
        assert_eq!(parse_float_pair("0.1").unwrap(), (0.1, 0.1));
        assert!(parse_int_pair("x").is_err());
    }

    #[test]
    fn test_parse_directions_and_edges() {
        assert_eq!(parse_directions("h,v").unwrap(), Direction::BOTH);
        assert_eq!(parse_directions("vertical").unwrap(), Direction::VERTICAL);
        assert!(parse_directions("diagonal").is_err());

        let edges = parse_edges("left,bottom").unwrap();
        assert!(edges.left && edges.bottom && !edges.top && !edges.right);
    }

    #[test]
    fn test_parse_rectangle() {
        let r = parse_rectangle("10,20,30,40").unwrap();
        assert_eq!(r.vertex[0], Point::new(10, 20));
        assert_eq!(r.vertex[1], Point::new(30, 40));
        assert!(parse_rectangle("10,20,30").is_err());
    }

    #[test]
    fn test_defaults_resolve() {
        let cli = Cli::parse_from(["descan", "in.pbm", "out.pbm"]);
        let (options, files) = resolve(cli).unwrap();
        assert_eq!(files, vec!["in.pbm", "out.pbm"]);
        assert_eq!(options.abs_black_threshold, 171);
        assert_eq!(options.abs_white_threshold, 229);
        assert_eq!(options.input_count, 1);
        assert!(options.deskew.scan_edges.left && options.deskew.scan_edges.right);
        assert!(options.blackfilter.scan_horizontal && options.blackfilter.scan_vertical);
        assert!(!options.border_scan.scan_horizontal && options.border_scan.scan_vertical);
        assert_eq!(options.sheet_multi_index, MultiIndex::All);
        assert!(options.no_blackfilter == MultiIndex::none());
    }

    #[test]
    fn test_disable_flags() {
        let cli = Cli::parse_from(["descan", "--no-blackfilter", "in.pbm", "out.pbm"]);
        let (options, _) = resolve(cli).unwrap();
        assert_eq!(options.no_blackfilter, MultiIndex::All);

        let cli = Cli::parse_from(["descan", "--no-blackfilter=2,4", "in.pbm", "out.pbm"]);
        let (options, _) = resolve(cli).unwrap();
        assert!(options.no_blackfilter.contains(2));
        assert!(!options.no_blackfilter.contains(3));
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::parse_from(["descan", "-vv", "in.pbm", "out.pbm"]);
        assert_eq!(cli.verbosity(), 2);
        let cli = Cli::parse_from(["descan", "--vvv", "in.pbm", "out.pbm"]);
        assert_eq!(cli.verbosity(), 3);
    }
}
