// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The blog2md contributors

//! Convert blog export archives to Markdown posts.
//!
//! This crate turns a Blogger (Atom) or WordPress (WXR) export into one
//! Markdown file per post, each with a YAML front-matter block.
//!
//! # Overview
//!
//! 1. [`feed`] reads the export XML into loosely-typed entries
//! 2. [`extract`] normalizes each entry into a [`extract::Post`], converting
//!    its HTML body with a [`markup::MarkupConverter`]
//! 3. [`renderer`] renders the front matter and writes the file
//! 4. [`pipeline`] drives the whole batch, isolating per-entry failures
//!
//! # Example
//!
//! ```no_run
//! use blog2md::extract::Extractor;
//! use blog2md::feed::{Mode, parse_feed};
//! use blog2md::markup::MarkdownConverter;
//! use blog2md::pipeline::{RunOptions, run};
//! use blog2md::renderer::Writer;
//!
//! let xml = std::fs::read_to_string("blog.xml").unwrap();
//! let entries = parse_feed(&xml, Mode::Blogger).unwrap();
//!
//! let extractor = Extractor::new(MarkdownConverter::default(), "posts");
//! let report = run(&entries, &extractor, &Writer::default(), &RunOptions::default());
//!
//! println!("wrote {} posts", report.written.len());
//! ```
//!
//! # Modules
//!
//! - [`feed`]: XML parsing for Blogger and WordPress exports
//! - [`markup`]: HTML to Markdown conversion of post bodies
//! - [`extract`]: entry normalization and output naming
//! - [`renderer`]: front-matter rendering and file output
//! - [`pipeline`]: batch processing with per-entry error isolation

#![deny(missing_docs)]

pub mod extract;
pub mod feed;
pub mod markup;
pub mod pipeline;
pub mod renderer;

#[cfg(test)]
mod test_log;
