//! Per-sheet input and output file resolution.
//!
//! Positional arguments are consumed pairwise per sheet: `input_count`
//! input names, then `output_count` output names. An argument containing a
//! `%d`-style placeholder is a page-number template that serves every
//! sheet; blank insertion and replacement yield pages with no file at all.

use std::path::PathBuf;

use tracing::debug;

use crate::config::options::Options;
use crate::error::{DescanError, Result};

/// Resolved file names for one sheet. An input of `None` is a blank page.
pub struct SheetFiles {
    pub inputs: Vec<Option<PathBuf>>,
    pub outputs: Vec<PathBuf>,
    pub input_wildcard: bool,
    pub output_wildcard: bool,
}

/// Replaces a `%d` or zero-padded `%0Nd` placeholder with a page number.
pub fn format_template(template: &str, number: i32) -> Result<String> {
    let Some(pos) = template.find('%') else {
        return Ok(template.to_string());
    };

    let rest = &template[pos + 1..];
    let digits_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    let (width_str, after) = rest.split_at(digits_len);
    if !after.starts_with('d') {
        return Err(DescanError::config(format!(
            "invalid page-number placeholder in '{template}'"
        )));
    }

    let width: usize = if width_str.is_empty() {
        0
    } else {
        width_str
            .trim_start_matches('0')
            .parse()
            .unwrap_or(width_str.len())
    };

    Ok(format!(
        "{}{:0width$}{}",
        &template[..pos],
        number,
        &after[1..],
    ))
}

/// Walks the positional arguments sheet by sheet.
pub struct FilePlan {
    args: Vec<String>,
    cursor: usize,
    input_nr: i32,
    output_nr: i32,
    /// Blank insertions not performed yet; each fires exactly once.
    pending_inserts: Vec<i32>,
}

impl FilePlan {
    pub fn new(args: Vec<String>, options: &Options) -> FilePlan {
        // Without an explicit start, input and output numbering begins at
        // the page that the start sheet would reach counting from one.
        let input_nr = options
            .start_input
            .unwrap_or((options.start_sheet - 1) * options.input_count + 1);
        let output_nr = options
            .start_output
            .unwrap_or((options.start_sheet - 1) * options.output_count + 1);

        let pending_inserts = match &options.insert_blank {
            crate::config::multi_index::MultiIndex::All => Vec::new(),
            crate::config::multi_index::MultiIndex::List(indexes) => indexes.clone(),
        };

        FilePlan {
            args,
            cursor: 0,
            input_nr,
            output_nr,
            pending_inserts,
        }
    }

    pub fn exhausted(&self) -> bool {
        self.cursor >= self.args.len()
    }

    /// Steps the cursor back to the input/output templates so the next
    /// sheet reuses them.
    pub fn rewind_templates(&mut self) {
        self.cursor -= 2;
    }

    /// Resolves the file names for sheet `nr`. `Ok(None)` reports a normal
    /// end of the run (no input left and no forced end sheet).
    pub fn next_sheet(&mut self, nr: i32, options: &Options) -> Result<Option<SheetFiles>> {
        let input_wildcard = options.multisheets
            && self
                .args
                .get(self.cursor)
                .is_some_and(|a| a.contains('%'));

        let mut inputs: Vec<Option<PathBuf>> = Vec::with_capacity(options.input_count as usize);
        for _ in 0..options.input_count {
            let insert = self.pending_inserts.iter().position(|&i| i == self.input_nr);
            let replace = options.replace_blank.contains(self.input_nr);

            let name = if replace {
                self.input_nr += 1;
                None
            } else if let Some(slot) = insert {
                // the blank takes this slot, the real page keeps its number
                self.pending_inserts.swap_remove(slot);
                None
            } else if input_wildcard {
                let name = format_template(&self.args[self.cursor], self.input_nr)?;
                self.input_nr += 1;
                Some(PathBuf::from(name))
            } else if self.cursor >= self.args.len() {
                if options.end_sheet.is_none() {
                    return Ok(None);
                }
                return Err(DescanError::config("not enough input files given"));
            } else {
                let name = PathBuf::from(&self.args[self.cursor]);
                self.cursor += 1;
                Some(name)
            };

            match &name {
                Some(path) => {
                    debug!("added input file {}", path.display());
                    if !path.exists() {
                        if options.end_sheet.is_none() {
                            return Ok(None);
                        }
                        return Err(DescanError::load(format!(
                            "unable to open file {}",
                            path.display()
                        )));
                    }
                }
                None => debug!("added blank input file"),
            }
            inputs.push(name);
        }
        if input_wildcard {
            self.cursor += 1;
        }

        if self.cursor >= self.args.len() {
            return Err(DescanError::config("not enough output files given"));
        }
        let output_wildcard = options.multisheets && self.args[self.cursor].contains('%');

        let mut outputs: Vec<PathBuf> = Vec::with_capacity(options.output_count as usize);
        for _ in 0..options.output_count {
            let name = if output_wildcard {
                let name = format_template(&self.args[self.cursor], self.output_nr)?;
                self.output_nr += 1;
                PathBuf::from(name)
            } else if self.cursor >= self.args.len() {
                return Err(DescanError::config("not enough output files given"));
            } else {
                let name = PathBuf::from(&self.args[self.cursor]);
                self.cursor += 1;
                name
            };

            debug!("added output file {}", name.display());
            if !options.overwrite && name.exists() {
                return Err(DescanError::config(format!(
                    "output file '{}' already present",
                    name.display()
                )));
            }
            outputs.push(name);
        }
        if output_wildcard {
            self.cursor += 1;
        }

        debug!("resolved files for sheet {nr}");
        Ok(Some(SheetFiles {
            inputs,
            outputs,
            input_wildcard,
            output_wildcard,
        }))
    }
}
