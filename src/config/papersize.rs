//! Physical dimension parsing.
//!
//! Users may give sizes and shifts either in pixels or in physical units
//! (`in`, `cm`, `mm`, `mils`), or name a well-known paper size. Physical
//! values are normalised to mils (thousandths of an inch) and converted to
//! pixels with the configured resolution; the imperial base makes the
//! pixels-per-inch conversion exact.

use crate::error::{DescanError, Result};
use crate::imageprocess::primitives::{Delta, RectangleSize};

const IN2MILS: f32 = 1000.0;
const MM2MILS: f32 = IN2MILS / 25.4;
const CM2MILS: f32 = MM2MILS * 10.0;

const UNIT_TO_MILS: [(&str, f32); 4] = [
    ("in", IN2MILS),
    ("cm", CM2MILS),
    ("mm", MM2MILS),
    ("mils", 1.0),
];

// The table is scanned linearly, so the more uncommon paper sizes come
// later. Dimensions are millimetres for the ISO sizes, inches for the US
// ones.
const PAPER_SIZES_MM: [(&str, f32, f32); 11] = [
    ("a3", 297.0, 420.0),
    ("a4", 210.0, 297.0),
    ("a5", 148.0, 210.0),
    ("a0", 841.0, 1189.0),
    ("a1", 594.0, 841.0),
    ("a2", 420.0, 594.0),
    ("a6", 105.0, 148.0),
    ("a7", 74.0, 105.0),
    ("a8", 52.0, 74.0),
    ("a9", 37.0, 52.0),
    ("a10", 26.0, 37.0),
];

const PAPER_SIZES_IN: [(&str, f32, f32); 2] = [("letter", 8.5, 11.0), ("legal", 8.5, 14.0)];

fn mils_to_pixels(mils: f32, dpi: i32) -> i32 {
    (mils / 1000.0 * dpi as f32).round() as i32
}

/// One dimension, either in mils (physical) or directly in pixels.
fn parse_dimension(s: &str) -> Result<(f32, bool)> {
    let s = s.trim();
    let unit_start = s
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(s.len());
    let (value_str, unit) = s.split_at(unit_start);

    let value: f32 = value_str
        .trim()
        .parse()
        .map_err(|_| DescanError::config(format!("unable to parse dimension '{s}'")))?;

    if unit.is_empty() {
        // no unit means the value was given in pixels
        return Ok((value, false));
    }

    for (name, factor) in UNIT_TO_MILS {
        if unit.eq_ignore_ascii_case(name) {
            return Ok((value * factor, true));
        }
    }

    Err(DescanError::config(format!(
        "unable to parse dimension '{s}': unknown unit '{unit}'"
    )))
}

/// Two dimensions separated by `x` or `,`; a single value is used for both.
fn parse_two_dimensions(s: &str) -> Result<(f32, f32, bool)> {
    let parts: Vec<&str> = if s.contains('x') {
        s.splitn(2, 'x').collect()
    } else {
        s.splitn(2, ',').collect()
    };

    let (first, first_physical) = parse_dimension(parts[0])?;
    if parts.len() == 1 {
        return Ok((first, first, first_physical));
    }

    let (second, second_physical) = parse_dimension(parts[1])?;
    if first_physical != second_physical {
        return Err(DescanError::config(format!(
            "unable to parse size '{s}': mixed physical and pixel dimensions are not allowed"
        )));
    }

    Ok((first, second, first_physical))
}

fn lookup_paper_size(name: &str) -> Option<(f32, f32)> {
    let (base, landscape) = match name.strip_suffix("-landscape") {
        Some(base) => (base, true),
        None => (name, false),
    };

    let mils = PAPER_SIZES_MM
        .iter()
        .find(|(n, _, _)| base.eq_ignore_ascii_case(n))
        .map(|&(_, w, h)| (w * MM2MILS, h * MM2MILS))
        .or_else(|| {
            PAPER_SIZES_IN
                .iter()
                .find(|(n, _, _)| base.eq_ignore_ascii_case(n))
                .map(|&(_, w, h)| (w * IN2MILS, h * IN2MILS))
        })?;

    Some(if landscape { (mils.1, mils.0) } else { mils })
}

/// Parses a size argument: a named paper size, `WxH`, or `W,H`, with
/// optional physical units.
pub fn parse_size(s: &str, dpi: i32) -> Result<RectangleSize> {
    if let Some((w_mils, h_mils)) = lookup_paper_size(s.trim()) {
        return Ok(RectangleSize::new(
            mils_to_pixels(w_mils, dpi),
            mils_to_pixels(h_mils, dpi),
        ));
    }

    let (w, h, physical) = parse_two_dimensions(s)?;
    if physical {
        Ok(RectangleSize::new(
            mils_to_pixels(w, dpi),
            mils_to_pixels(h, dpi),
        ))
    } else {
        Ok(RectangleSize::new(w.round() as i32, h.round() as i32))
    }
}

/// Parses a displacement argument, same syntax as [`parse_size`] but
/// without paper names.
pub fn parse_delta(s: &str, dpi: i32) -> Result<Delta> {
    let (h, v, physical) = parse_two_dimensions(s)?;
    if physical {
        Ok(Delta::new(mils_to_pixels(h, dpi), mils_to_pixels(v, dpi)))
    } else {
        Ok(Delta::new(h.round() as i32, v.round() as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_sizes() {
        assert_eq!(parse_size("640x480", 300).unwrap(), RectangleSize::new(640, 480));
        assert_eq!(parse_size("100", 300).unwrap(), RectangleSize::new(100, 100));
    }

    #[test]
    fn test_physical_sizes() {
        // 1 inch at 300 dpi
        assert_eq!(parse_size("1in,2in", 300).unwrap(), RectangleSize::new(300, 600));
        // 25.4 mm = 1 inch
        assert_eq!(parse_size("25.4mm", 300).unwrap(), RectangleSize::new(300, 300));
    }

    #[test]
    fn test_paper_names() {
        let a4 = parse_size("a4", 300).unwrap();
        assert_eq!(a4, RectangleSize::new(2480, 3508));

        let a4l = parse_size("a4-landscape", 300).unwrap();
        assert_eq!(a4l, RectangleSize::new(3508, 2480));

        let letter = parse_size("letter", 300).unwrap();
        assert_eq!(letter, RectangleSize::new(2550, 3300));
    }

    #[test]
    fn test_mixed_units_rejected() {
        assert!(parse_size("1in,100", 300).is_err());
        assert!(parse_size("3furlongs", 300).is_err());
    }

    #[test]
    fn test_negative_delta() {
        assert_eq!(parse_delta("-5,12", 300).unwrap(), Delta::new(-5, 12));
    }
}
