//! Sheet index sets.
//!
//! Most per-sheet switches accept a multi-index: a comma-separated list of
//! sheet numbers and ranges such as `1,3,5-10`. A switch given without a
//! value selects every sheet; an unset switch selects none.

use crate::error::{DescanError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultiIndex {
    /// Matches every index.
    All,
    /// Matches exactly the listed indexes; empty matches none.
    List(Vec<i32>),
}

impl MultiIndex {
    pub fn none() -> MultiIndex {
        MultiIndex::List(Vec::new())
    }

    pub fn contains(&self, index: i32) -> bool {
        match self {
            MultiIndex::All => true,
            MultiIndex::List(indexes) => indexes.contains(&index),
        }
    }

    /// The smallest listed index, if any.
    pub fn first(&self) -> Option<i32> {
        match self {
            MultiIndex::All => None,
            MultiIndex::List(indexes) => indexes.iter().copied().min(),
        }
    }

    /// Parses a multi-index string of numbers and ranges.
    ///
    /// Accepted forms:
    /// - a single index: `"5"`
    /// - a range: `"5-10"` (5, 6, 7, 8, 9, 10)
    /// - a mixed comma-separated list: `"1,3,5-10,15"`
    pub fn parse(s: &str) -> Result<MultiIndex> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(MultiIndex::none());
        }

        let mut indexes = Vec::new();

        for part in trimmed.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            if let Some((start_str, end_str)) = part.split_once('-') {
                let start: i32 = start_str.trim().parse().map_err(|_| {
                    DescanError::config(format!("invalid index in range: '{start_str}'"))
                })?;
                let end: i32 = end_str.trim().parse().map_err(|_| {
                    DescanError::config(format!("invalid index in range: '{end_str}'"))
                })?;

                if start > end {
                    return Err(DescanError::config(format!(
                        "invalid index range: start ({start}) > end ({end})"
                    )));
                }

                indexes.extend(start..=end);
            } else {
                let index: i32 = part
                    .parse()
                    .map_err(|_| DescanError::config(format!("invalid index: '{part}'")))?;
                indexes.push(index);
            }
        }

        Ok(MultiIndex::List(indexes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_and_list() {
        let mi = MultiIndex::parse("3").unwrap();
        assert!(mi.contains(3));
        assert!(!mi.contains(4));

        let mi = MultiIndex::parse("1,4,7").unwrap();
        assert!(mi.contains(1));
        assert!(mi.contains(7));
        assert!(!mi.contains(2));
    }

    #[test]
    fn test_parse_ranges() {
        let mi = MultiIndex::parse("2-5,9").unwrap();
        for i in 2..=5 {
            assert!(mi.contains(i));
        }
        assert!(mi.contains(9));
        assert!(!mi.contains(6));
    }

    #[test]
    fn test_empty_matches_nothing() {
        let mi = MultiIndex::parse("").unwrap();
        assert!(!mi.contains(1));
    }

    #[test]
    fn test_all_matches_everything() {
        assert!(MultiIndex::All.contains(-3));
        assert!(MultiIndex::All.contains(12345));
    }

    #[test]
    fn test_reversed_range_is_an_error() {
        assert!(MultiIndex::parse("7-3").is_err());
        assert!(MultiIndex::parse("a-b").is_err());
    }

    #[test]
    fn test_first() {
        assert_eq!(MultiIndex::parse("8,2,5").unwrap().first(), Some(2));
        assert_eq!(MultiIndex::none().first(), None);
    }
}
