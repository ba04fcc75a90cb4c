//! Page selection parsing
//!
//! Turns a free-text expression such as `"1-3, 5"` into a sorted, deduplicated
//! list of 1-based page numbers. An expression is applied whole or not at all.

use crate::settings::{PageSelection, PrintSettings};
use crate::types::RangeParseError;
use std::collections::BTreeSet;

/// Parse a custom page expression against a document of `page_count` pages.
///
/// Tokens are separated by commas and are either `N` or `N-M` with `N <= M`.
/// Whitespace around tokens and around the dash is ignored, and so are empty
/// tokens left by stray commas. Every page must lie in `1..=page_count`.
pub fn parse_page_range(
    expression: &str,
    page_count: usize,
) -> Result<Vec<usize>, RangeParseError> {
    let mut pages = BTreeSet::new();

    for raw in expression.split(',') {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }

        let (first, last) = match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_page_number(start, token)?;
                let end = parse_page_number(end, token)?;
                if start > end {
                    return Err(RangeParseError::ReversedRange(token.to_string()));
                }
                (start, end)
            }
            None => {
                let page = parse_page_number(token, token)?;
                (page, page)
            }
        };

        if first < 1 || last > page_count {
            return Err(RangeParseError::OutOfBounds {
                token: token.to_string(),
                page_count,
            });
        }

        pages.extend(first..=last);
    }

    if pages.is_empty() {
        return Err(RangeParseError::Empty);
    }

    Ok(pages.into_iter().collect())
}

fn parse_page_number(text: &str, token: &str) -> Result<usize, RangeParseError> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeParseError::InvalidToken(token.to_string()));
    }
    text.parse()
        .map_err(|_| RangeParseError::InvalidToken(token.to_string()))
}

/// Resolve the settings' page selection to 1-based page numbers.
///
/// `All` and `Current` never fail; `Current` is clamped into the document.
/// An empty document yields an empty selection for those two modes.
pub fn resolve_selection(
    settings: &PrintSettings,
    page_count: usize,
) -> Result<Vec<usize>, RangeParseError> {
    match settings.page_selection {
        PageSelection::All => Ok((1..=page_count).collect()),
        PageSelection::Current => {
            if page_count == 0 {
                Ok(Vec::new())
            } else {
                Ok(vec![settings.current_page.clamp(1, page_count)])
            }
        }
        PageSelection::Custom => parse_page_range(&settings.custom_range, page_count),
    }
}
