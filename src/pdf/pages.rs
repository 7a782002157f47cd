//! Page selection parsing
//!
//! Turns user text such as `"1,3-5, 7"` into a validated, ascending set of
//! 0-based page indices. Any malformed token rejects the whole expression.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Highest 1-based page number accepted in an expression.
pub const MAX_PAGE_NUMBER: u32 = 1_000_000;

/// A non-empty, strictly ascending set of 0-based page indices
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageSelection {
    indices: Vec<u32>,
}

impl PageSelection {
    /// Parse a page range expression.
    ///
    /// Runs of commas collapse to one, leading and trailing commas are
    /// ignored, and whitespace around tokens and hyphens is insignificant.
    /// Input that selects nothing is an error rather than an empty set.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidPageRange {
            range: text.trim().to_string(),
        };
        let reject = |bad: BadPage| match bad {
            BadPage::Malformed => invalid(),
            BadPage::TooLarge => Error::PageLimitExceeded {
                range: text.trim().to_string(),
                limit: MAX_PAGE_NUMBER,
            },
        };

        let normalized = collapse_commas(text.trim());
        if normalized.is_empty() {
            return Err(invalid());
        }

        let mut indices = Vec::new();
        for token in normalized.split(',').map(str::trim) {
            if token.is_empty() {
                continue;
            }

            let mut bounds = token.split('-');
            match (bounds.next(), bounds.next(), bounds.next()) {
                (Some(single), None, None) => {
                    let page = parse_page(single).map_err(reject)?;
                    indices.push(page - 1);
                }
                (Some(start), Some(end), None) => {
                    let start = parse_page(start).map_err(reject)?;
                    let end = parse_page(end).map_err(reject)?;
                    if start > end {
                        return Err(invalid());
                    }
                    indices.extend((start - 1)..end);
                }
                _ => return Err(invalid()),
            }
        }

        indices.sort_unstable();
        indices.dedup();

        if indices.is_empty() {
            return Err(invalid());
        }
        Ok(Self { indices })
    }

    /// The 0-based indices in ascending order
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Always false; a selection cannot be empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// 1-based page numbers, as a user would type them
    pub fn one_based(&self) -> Vec<u32> {
        self.indices.iter().map(|i| i + 1).collect()
    }

    /// Split into indices that exist in a document of `page_count` pages and
    /// the 1-based numbers of pages that do not.
    pub fn within(&self, page_count: u32) -> (Vec<u32>, Vec<u32>) {
        let split = self.indices.partition_point(|&i| i < page_count);
        let present = self.indices[..split].to_vec();
        let missing = self.indices[split..].iter().map(|i| i + 1).collect();
        (present, missing)
    }
}

impl FromStr for PageSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Canonical 1-based form with consecutive pages written as ranges
impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut iter = self.indices.iter().copied().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end + 1)) {
                end += 1;
                iter.next();
            }
            if !first {
                f.write_str(",")?;
            }
            first = false;
            if start == end {
                write!(f, "{}", start + 1)?;
            } else {
                write!(f, "{}-{}", start + 1, end + 1)?;
            }
        }
        Ok(())
    }
}

/// Parse a page range expression into sorted, unique 0-based indices.
pub fn parse_page_numbers(text: &str) -> Result<Vec<u32>> {
    PageSelection::parse(text).map(|selection| selection.indices)
}

fn collapse_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_comma = true;
    for c in text.chars() {
        if c == ',' {
            if !last_comma {
                out.push(',');
            }
            last_comma = true;
        } else {
            out.push(c);
            last_comma = false;
        }
    }
    if out.ends_with(',') {
        out.pop();
    }
    out
}

enum BadPage {
    Malformed,
    TooLarge,
}

/// A 1-based page number: ASCII digits only, at least 1.
fn parse_page(token: &str) -> std::result::Result<u32, BadPage> {
    let token = token.trim();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BadPage::Malformed);
    }
    // all digits, so a parse failure can only be overflow
    match token.parse::<u32>() {
        Ok(0) => Err(BadPage::Malformed),
        Ok(page) if page <= MAX_PAGE_NUMBER => Ok(page),
        _ => Err(BadPage::TooLarge),
    }
}
