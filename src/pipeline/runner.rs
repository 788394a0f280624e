//! The sheet loop: resolve file names, load and compose pages, process the
//! sheet, split it, and save the output pages.

use tracing::{debug, info};

use crate::config::options::Options;
use crate::error::{DescanError, Result};
use crate::fileio::{load_image, save_image};
use crate::imageprocess::blit::flip_rotate_90;
use crate::imageprocess::image::{Image, PixelFormat};
use crate::imageprocess::primitives::RectangleSize;
use crate::pipeline::files::FilePlan;
use crate::pipeline::sheet::{create_sheet, place_page, process_sheet, split_sheet};

/// What a finished run did, mostly of interest to tests.
pub struct RunSummary {
    pub sheets_processed: usize,
}

/// Processes every sheet of the run.
pub fn run(options: &Options, files: Vec<String>) -> Result<RunSummary> {
    if files.len() < 2 {
        return Err(DescanError::config("no input or output files given"));
    }

    let mut plan = FilePlan::new(files, options);
    let mut output_format: Option<PixelFormat> = options.output_format;
    let mut previous_size: Option<RectangleSize> = None;
    let mut sheets_processed = 0;

    let mut nr = options.start_sheet;
    loop {
        if let Some(end) = options.end_sheet {
            if nr > end {
                break;
            }
        }

        let Some(sheet_files) = plan.next_sheet(nr, options)? else {
            break;
        };

        let selected = options.sheet_multi_index.contains(nr)
            && !options.exclude_multi_index.contains(nr);
        if selected {
            info!("Processing sheet #{nr}");

            // load the input pages and compose them onto the sheet
            let mut sheet: Option<Image> = None;
            let mut size: Option<RectangleSize> = None;
            for (j, input) in sheet_files.inputs.iter().enumerate() {
                let page = match input {
                    Some(path) => {
                        info!("loading file {}", path.display());
                        let mut page = load_image(
                            path,
                            options.sheet_background,
                            options.abs_black_threshold,
                        )?;

                        if output_format.is_none() {
                            output_format = Some(page.format());
                        }

                        if let Some(direction) = options.pre_rotate {
                            info!("pre-rotating 90 degrees");
                            flip_rotate_90(&mut page, direction);
                        }

                        // the first loaded page determines the sheet size
                        // unless it was forced
                        if size.is_none() {
                            size = Some(options.sheet_size.unwrap_or(RectangleSize::new(
                                page.width() * options.input_count,
                                page.height(),
                            )));
                        }
                        Some(page)
                    }
                    None => None,
                };

                if sheet.is_none() {
                    if let Some(size) = size {
                        sheet = Some(create_sheet(size, options));
                    }
                }
                if let (Some(sheet), Some(page)) = (&mut sheet, &page) {
                    place_page(sheet, page, j as i32, options.input_count);
                }
            }

            // Only blank insertions reached this sheet: fall back to the
            // forced size or to the previous sheet's size.
            let mut sheet = match sheet {
                Some(sheet) => sheet,
                None => {
                    let size = options.sheet_size.or(previous_size).ok_or_else(|| {
                        DescanError::config(
                            "sheet size unknown, use at least one input file per sheet, \
                             or force using --sheet-size",
                        )
                    })?;
                    debug!(
                        "using sheet size from previous sheet: {}x{}",
                        size.width, size.height
                    );
                    create_sheet(size, options)
                }
            };

            previous_size = Some(sheet.size());
            info!("sheet size: {}x{}", sheet.width(), sheet.height());

            process_sheet(&mut sheet, nr, options);

            if options.write_output {
                info!("writing output.");
                let format = output_format.unwrap_or(sheet.format());
                for (page, path) in split_sheet(&sheet, options.output_count)
                    .iter()
                    .zip(&sheet_files.outputs)
                {
                    info!("saving file {}", path.display());
                    save_image(path, page, format)?;
                }
            }

            sheets_processed += 1;
        }

        // Sequential arguments end the run once consumed; a pair of
        // templates serves sheets until an input file is missing.
        if plan.exhausted() && !sheet_files.input_wildcard {
            break;
        }
        if sheet_files.input_wildcard && sheet_files.output_wildcard {
            plan.rewind_templates();
        }
        nr += 1;
    }

    Ok(RunSummary { sheets_processed })
}
