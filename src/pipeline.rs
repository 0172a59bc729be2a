// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The blog2md contributors

//! Batch conversion of export entries.
//!
//! [`run`] feeds every entry through an [`Extractor`] and a [`Writer`], in
//! export order. A failing entry is logged and recorded in the [`Report`];
//! it never stops the entries after it.

use crate::extract::{ExtractError, Extractor};
use crate::feed::RawEntry;
use crate::markup::MarkupConverter;
use crate::renderer::{WriteError, Writer};
use snafu::prelude::*;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, error, info};

/// What to do with Blogger comment entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommentPolicy {
    /// Convert comments like any other entry.
    #[default]
    Keep,
    /// Leave comments out of the output.
    Skip,
}

impl FromStr for CommentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" => Ok(Self::Keep),
            "skip" => Ok(Self::Skip),
            other => Err(format!(
                "unknown comment policy '{other}' (expected keep or skip)"
            )),
        }
    }
}

/// Configuration options for a conversion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Handling of Blogger comment entries.
    pub comments: CommentPolicy,
}

/// Error type for a single entry that could not be converted.
#[derive(Debug, Snafu)]
pub enum EntryError {
    /// The entry could not be normalized.
    #[snafu(display("entry {index}: {source}"))]
    Extract {
        /// Zero-based position of the entry in the export.
        index: usize,
        /// The underlying extraction error.
        source: ExtractError,
    },

    /// The post could not be written.
    #[snafu(display("entry {index}: {source}"))]
    Write {
        /// Zero-based position of the entry in the export.
        index: usize,
        /// The underlying write error.
        source: WriteError,
    },
}

impl EntryError {
    /// Zero-based position of the failed entry in the export.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Extract { index, .. } | Self::Write { index, .. } => *index,
        }
    }
}

/// Outcome of a conversion run.
#[derive(Debug, Default)]
pub struct Report {
    /// Paths written, in export order.
    pub written: Vec<PathBuf>,
    /// Number of entries left out by the comment policy.
    pub skipped: usize,
    /// Entries that failed, in export order.
    pub failures: Vec<EntryError>,
}

/// Extracts and writes a single entry, returning the path written.
///
/// # Errors
///
/// Returns an error if the entry cannot be extracted or its post cannot be
/// written.
pub fn process_entry<C: MarkupConverter>(
    entry: &RawEntry,
    index: usize,
    extractor: &Extractor<C>,
    writer: &Writer,
) -> Result<PathBuf, EntryError> {
    let post = extractor
        .extract(entry, index)
        .context(ExtractSnafu { index })?;
    writer.write(&post).context(WriteSnafu { index })
}

/// Converts every entry, one at a time and in order.
///
/// Each entry is fully extracted and written before the next one starts.
/// Indices passed to the extractor are positions in `entries`, including
/// entries skipped by the comment policy.
pub fn run<C: MarkupConverter>(
    entries: &[RawEntry],
    extractor: &Extractor<C>,
    writer: &Writer,
    opts: &RunOptions,
) -> Report {
    info!(total = entries.len(), "found entries");

    let outcomes: Vec<Result<PathBuf, EntryError>> = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            if opts.comments == CommentPolicy::Skip && entry.is_comment() {
                debug!(index, "skipping comment entry");
                return None;
            }
            let outcome = process_entry(entry, index, extractor, writer);
            if let Err(e) = &outcome {
                error!(index, "failed to process entry: {e}");
            }
            Some(outcome)
        })
        .collect();

    let skipped = entries.len() - outcomes.len();
    let (written, failures): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(Result::is_ok);

    Report {
        written: written.into_iter().filter_map(Result::ok).collect(),
        skipped,
        failures: failures.into_iter().filter_map(Result::err).collect(),
    }
}
