//! Page range expressions
//!
//! A range expression is a comma-separated list of 1-based page numbers and
//! inclusive `start-end` ranges, e.g. `1,3-5,8`. Parsed pages are sorted and
//! de-duplicated.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Parse a page range string (e.g., "1-5,10,15-20") into sorted, distinct
/// 1-based page numbers, all within `1..=max_pages`.
pub fn parse_page_range(range: &str, max_pages: u32) -> Result<Vec<u32>> {
    if max_pages == 0 {
        return Err(Error::InvalidRange {
            range: format!("{} (document has no pages)", range),
        });
    }

    let mut pages = Vec::new();

    for part in range.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start = parse_page_number(start, range)?;
            let end = parse_page_number(end, range)?;

            if start > end {
                return Err(Error::InvalidRange {
                    range: format!("{} (descending range {}-{})", range, start, end),
                });
            }
            check_bounds(start, max_pages, range)?;
            check_bounds(end, max_pages, range)?;

            pages.extend(start..=end);
        } else {
            let page = parse_page_number(part, range)?;
            check_bounds(page, max_pages, range)?;
            pages.push(page);
        }
    }

    if pages.is_empty() {
        return Err(Error::InvalidRange {
            range: range.to_string(),
        });
    }

    // Remove duplicates and sort
    pages.sort_unstable();
    pages.dedup();

    Ok(pages)
}

fn parse_page_number(s: &str, range: &str) -> Result<u32> {
    s.trim().parse().map_err(|_| Error::InvalidRange {
        range: range.to_string(),
    })
}

fn check_bounds(page: u32, max_pages: u32, range: &str) -> Result<()> {
    if page < 1 || page > max_pages {
        return Err(Error::InvalidRange {
            range: format!("{} (page {} out of range 1-{})", range, page, max_pages),
        });
    }
    Ok(())
}

/// Which pages of a document an operation applies to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageSelection {
    /// Every page, in document order
    #[default]
    All,
    /// A range expression resolved against the document's page count
    Expr(String),
}

impl PageSelection {
    /// Resolve to sorted 1-based page numbers for a document of `page_count` pages.
    pub fn resolve(&self, page_count: u32) -> Result<Vec<u32>> {
        match self {
            PageSelection::All => {
                if page_count == 0 {
                    return Err(Error::InvalidPdf {
                        reason: "PDF has no pages".to_string(),
                    });
                }
                Ok((1..=page_count).collect())
            }
            PageSelection::Expr(expr) => parse_page_range(expr, page_count),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, PageSelection::All)
    }
}

impl FromStr for PageSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidRange {
                range: s.to_string(),
            });
        }
        if s.eq_ignore_ascii_case("all") {
            Ok(PageSelection::All)
        } else {
            Ok(PageSelection::Expr(s.to_string()))
        }
    }
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSelection::All => f.write_str("all"),
            PageSelection::Expr(expr) => f.write_str(expr),
        }
    }
}
