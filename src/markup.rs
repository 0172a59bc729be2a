// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The blog2md contributors

//! HTML to Markdown conversion of post bodies.
//!
//! The extractor only depends on the [`MarkupConverter`] trait, so tests and
//! callers can swap the conversion out. [`MarkdownConverter`] is the real
//! implementation, backed by [`htmd`].

use snafu::prelude::*;

/// Error type for body conversion failures.
#[derive(Debug, Snafu)]
pub enum ConvertError {
    /// The HTML could not be converted.
    #[snafu(display("failed to convert HTML to Markdown: {source}"))]
    Html {
        /// The underlying conversion error.
        source: std::io::Error,
    },
}

/// Converts rich markup into the body text of an output document.
pub trait MarkupConverter {
    /// Converts `html` into lightweight markup.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be converted.
    fn convert(&self, html: &str) -> Result<String, ConvertError>;
}

impl<T: MarkupConverter + ?Sized> MarkupConverter for &T {
    fn convert(&self, html: &str) -> Result<String, ConvertError> {
        (**self).convert(html)
    }
}

/// HTML to Markdown converter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkdownConverter {
    /// Turn hard line breaks into paragraph breaks.
    ///
    /// Blogger posts often separate paragraphs with `<br>` rather than
    /// `<p>`, which renders as one long paragraph full of hard breaks.
    pub paragraph_fix: bool,
}

impl MarkupConverter for MarkdownConverter {
    fn convert(&self, html: &str) -> Result<String, ConvertError> {
        if html.trim().is_empty() {
            return Ok(String::new());
        }

        let mut markdown = htmd::convert(html).context(HtmlSnafu)?;
        if self.paragraph_fix {
            markdown = fix_paragraphs(&markdown);
        }
        Ok(markdown.trim_matches('\n').to_owned())
    }
}

/// Rewrites Markdown hard line breaks as paragraph breaks.
///
/// A line ending in two or more spaces, or in an odd number of backslashes,
/// is a hard break. Runs of blank lines are collapsed to a single blank line.
/// Lines inside fenced code blocks are copied unchanged.
#[must_use]
pub fn fix_paragraphs(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() + 16);
    let mut open_fence: Option<&str> = None;
    let mut last_blank = false;

    for line in markdown.lines() {
        let marker = fence_marker(line);

        if let Some(open) = open_fence {
            if marker.is_some_and(|m| closes_fence(open, m)) {
                open_fence = None;
            }
            out.push_str(line);
            out.push('\n');
            last_blank = false;
            continue;
        }

        if marker.is_some() {
            open_fence = marker;
            out.push_str(line);
            out.push('\n');
            last_blank = false;
        } else if line.trim().is_empty() {
            if !last_blank {
                out.push('\n');
                last_blank = true;
            }
        } else if let Some(text) = hard_break_text(line) {
            out.push_str(text);
            out.push_str("\n\n");
            last_blank = true;
        } else {
            out.push_str(line);
            out.push('\n');
            last_blank = false;
        }
    }

    out
}

/// Returns the run of three or more backticks or tildes opening `line`.
fn fence_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let fence_char = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = trimmed.len() - trimmed.trim_start_matches(fence_char).len();
    (len >= 3).then(|| &trimmed[..len])
}

fn closes_fence(open: &str, marker: &str) -> bool {
    marker.len() >= open.len() && marker.as_bytes()[0] == open.as_bytes()[0]
}

fn hard_break_text(line: &str) -> Option<&str> {
    if line.ends_with("  ") {
        return Some(line.trim_end_matches(' '));
    }
    // an even run of backslashes is escaped text, not a break
    let backslashes = line.len() - line.trim_end_matches('\\').len();
    (backslashes % 2 == 1).then(|| &line[..line.len() - 1])
}
