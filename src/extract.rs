// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The blog2md contributors

//! Normalization of raw export entries into posts.
//!
//! An [`Extractor`] turns one [`RawEntry`] into a [`Post`]: it resolves the
//! title (substituting `Untitled <index>` when there is none), passes dates
//! through, collects tag terms, converts the body and derives the output
//! path from the title.
//!
//! # Output naming
//!
//! The output file name is the title's slug (see [`sanitize_title`]) with an
//! `.md` extension, inside the configured output directory. Names are not
//! deduplicated: two posts whose titles produce the same slug write the same
//! file, and the later one wins.

use crate::feed::{RawEntry, TextValue};
use crate::markup::{ConvertError, MarkupConverter};
use snafu::prelude::*;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Extension of every output file.
pub const EXTENSION: &str = "md";

/// Longest slug produced by [`sanitize_title`].
const MAX_SLUG_LEN: usize = 120;

/// Slug used when a title has no usable characters.
const FALLBACK_SLUG: &str = "untitled";

/// Device names Windows refuses as file names.
const RESERVED_NAMES: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Error type for entries that cannot be normalized.
#[derive(Debug, Snafu)]
pub enum ExtractError {
    /// A category carries no term.
    #[snafu(display("category {position} has no term"))]
    MissingTerm {
        /// Zero-based position of the category within the entry.
        position: usize,
    },

    /// The body could not be converted.
    #[snafu(display("{source}"))]
    Convert {
        /// The underlying conversion error.
        source: ConvertError,
    },
}

/// A normalized post, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// The post title. Never empty.
    pub title: String,
    /// Publication timestamp, verbatim from the export.
    pub published: String,
    /// Last update timestamp, verbatim from the export.
    pub updated: String,
    /// Tag terms in export order.
    pub tags: Vec<String>,
    /// The converted body.
    pub body: String,
    /// Where the rendered post is written.
    pub output_path: PathBuf,
}

/// Turns raw entries into posts.
#[derive(Debug, Clone)]
pub struct Extractor<C> {
    converter: C,
    output_dir: PathBuf,
}

impl<C: MarkupConverter> Extractor<C> {
    /// Creates an extractor that converts bodies with `converter` and places
    /// output files in `output_dir`.
    pub fn new(converter: C, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            converter,
            output_dir: output_dir.into(),
        }
    }

    /// The directory output paths are placed in.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Normalizes the entry at zero-based position `index` of the export.
    ///
    /// A missing or blank title is replaced by `Untitled <index>` and logged
    /// as a warning. Absent content converts as an empty body; absent dates
    /// become empty strings.
    ///
    /// # Errors
    ///
    /// Returns an error if a category has no term or the body cannot be
    /// converted.
    pub fn extract(&self, entry: &RawEntry, index: usize) -> Result<Post, ExtractError> {
        let title = match entry.title.as_ref().and_then(TextValue::resolve) {
            Some(title) if !title.trim().is_empty() => title.to_owned(),
            _ => {
                warn!(index, "entry has no title, using placeholder");
                format!("Untitled {index}")
            }
        };

        let content = entry
            .content
            .as_ref()
            .and_then(TextValue::resolve)
            .unwrap_or_default();

        let tags = entry
            .category
            .iter()
            .enumerate()
            .map(|(position, c)| c.term.clone().context(MissingTermSnafu { position }))
            .collect::<Result<Vec<_>, _>>()?;

        let body = self.converter.convert(content).context(ConvertSnafu)?;
        let output_path = output_path(&self.output_dir, &title);

        Ok(Post {
            title,
            published: first_or_empty(&entry.published),
            updated: first_or_empty(&entry.updated),
            tags,
            body,
            output_path,
        })
    }
}

fn first_or_empty(values: &[String]) -> String {
    values.first().cloned().unwrap_or_default()
}

/// Returns the path a post titled `title` is written to.
#[must_use]
pub fn output_path(output_dir: &Path, title: &str) -> PathBuf {
    output_dir.join(format!("{}.{EXTENSION}", sanitize_title(title)))
}

/// Turns a title into a file-name-safe slug.
///
/// The title is transliterated to ASCII, lowercased, and every run of
/// characters other than ASCII letters and digits becomes a single `-`.
/// Apostrophes are dropped rather than replaced. The result only contains
/// `[a-z0-9-]`, so it can never name a parent directory or contain a path
/// separator. An empty result becomes `untitled`.
///
/// # Example
///
/// ```
/// use blog2md::extract::sanitize_title;
///
/// assert_eq!(sanitize_title("Hello World"), "hello-world");
/// assert_eq!(sanitize_title("Sem Título 3"), "sem-titulo-3");
/// assert_eq!(sanitize_title("../../etc/passwd"), "etc-passwd");
/// ```
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    let ascii = unidecode::unidecode(title);

    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_dash = false;
        } else if c != '\'' {
            pending_dash = true;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else if RESERVED_NAMES.contains(&slug) {
        format!("{slug}-post")
    } else {
        slug.to_owned()
    }
}
