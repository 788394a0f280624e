//! Image file loading and saving.
//!
//! Loading goes through the `image` crate and accepts anything it decodes;
//! the decoded pixel type is mapped onto the closest internal format and
//! everything else (including palette images, which the decoder expands)
//! is converted to RGB. Output is always one of the binary PNM formats,
//! selected by the output pixel format.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use tracing::debug;

use crate::error::{DescanError, Result};
use crate::imageprocess::blit::copy_rectangle;
use crate::imageprocess::image::{Image, PixelFormat};
use crate::imageprocess::primitives::{Pixel, Point, RectangleSize};

/// Loads an image file into the internal raster representation.
pub fn load_image(path: &Path, background: Pixel, abs_black_threshold: u8) -> Result<Image> {
    let decoded = image::open(path)
        .map_err(|e| DescanError::load(format!("unable to open file {}: {e}", path.display())))?;

    let width = decoded.width() as i32;
    let height = decoded.height() as i32;
    let (format, raw): (PixelFormat, Vec<u8>) = match decoded {
        DynamicImage::ImageLuma8(buf) => (PixelFormat::Gray8, buf.into_raw()),
        DynamicImage::ImageLumaA8(buf) => (PixelFormat::GrayAlpha8, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => (PixelFormat::Rgb24, buf.into_raw()),
        other => (PixelFormat::Rgb24, other.to_rgb8().into_raw()),
    };

    let mut image = Image::new(
        RectangleSize::new(width, height),
        format,
        false,
        background,
        abs_black_threshold,
    );
    if image.bytes().len() != raw.len() {
        return Err(DescanError::format(format!(
            "decoded pixel data of {} has unexpected size",
            path.display()
        )));
    }
    image.bytes_mut().copy_from_slice(&raw);

    debug!("loaded {} ({width}x{height})", path.display());
    Ok(image)
}

/// Saves the image in the binary PNM flavour matching `output_format`,
/// converting the pixel data first when the in-memory format differs.
pub fn save_image(path: &Path, image: &Image, output_format: PixelFormat) -> Result<()> {
    // Alpha-carrying gray saves as plain gray, mono-black as mono-white;
    // both pairs collapse to the same bytes on disk.
    let output_format = match output_format {
        PixelFormat::GrayAlpha8 => PixelFormat::Gray8,
        PixelFormat::MonoBlack => PixelFormat::MonoWhite,
        other => other,
    };

    let converted;
    let output = if image.format() == output_format {
        image
    } else {
        let mut target = Image::new(
            image.size(),
            output_format,
            false,
            image.background,
            image.abs_black_threshold,
        );
        let full = image.full_rect();
        copy_rectangle(image, &mut target, full, Point::ORIGIN);
        converted = target;
        &converted
    };

    let file = File::create(path)
        .map_err(|e| DescanError::save(format!("cannot write {}: {e}", path.display())))?;
    let mut writer = BufWriter::new(file);

    match output.format() {
        PixelFormat::Gray8 => {
            let encoder = PnmEncoder::new(&mut writer)
                .with_subtype(PnmSubtype::Graymap(SampleEncoding::Binary));
            encoder
                .write_image(
                    output.bytes(),
                    output.width() as u32,
                    output.height() as u32,
                    ExtendedColorType::L8,
                )
                .map_err(|e| DescanError::save(format!("cannot write {}: {e}", path.display())))?;
        }
        PixelFormat::Rgb24 => {
            let encoder = PnmEncoder::new(&mut writer)
                .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary));
            encoder
                .write_image(
                    output.bytes(),
                    output.width() as u32,
                    output.height() as u32,
                    ExtendedColorType::Rgb8,
                )
                .map_err(|e| DescanError::save(format!("cannot write {}: {e}", path.display())))?;
        }
        PixelFormat::MonoWhite => {
            // The in-memory layout of the 1-bit formats matches raw PBM
            // rows exactly: packed bits, most significant first, set = black.
            write!(writer, "P4\n{} {}\n", output.width(), output.height())?;
            writer.write_all(output.bytes())?;
        }
        PixelFormat::GrayAlpha8 | PixelFormat::MonoBlack => unreachable!(),
    }

    writer
        .flush()
        .map_err(|e| DescanError::save(format!("cannot write {}: {e}", path.display())))?;

    debug!("saved {}", path.display());
    Ok(())
}
