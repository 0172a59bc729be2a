// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The blog2md contributors

//! Markdown rendering and writing of extracted posts.
//!
//! Each [`Post`] becomes a Markdown document with a YAML front-matter block
//! in the shape static site generators such as Hugo expect.
//!
//! # Output Format
//!
//! ```text
//! ---
//! title: "Hello World"
//! date: 2020-01-01
//! draft: false
//! tags:
//! - tech
//! ---
//! Post body
//! ```
//!
//! A post without tags keeps the `tags:` key with nothing beneath it.
//!
//! # Example
//!
//! ```
//! use blog2md::extract::Post;
//! use blog2md::renderer::render_post;
//!
//! let post = Post {
//!     title: "Hello World".into(),
//!     published: "2020-01-01".into(),
//!     updated: String::new(),
//!     tags: vec!["tech".into()],
//!     body: "Hi there!".into(),
//!     output_path: "out/hello-world.md".into(),
//! };
//!
//! let markdown = render_post(&post);
//!
//! assert!(markdown.starts_with("---\ntitle: \"Hello World\"\n"));
//! assert!(markdown.contains("tags:\n- tech\n---\n"));
//! assert!(markdown.ends_with("Hi there!"));
//! ```

use crate::extract::Post;
use snafu::prelude::*;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::info;

/// Error type for output failures.
#[derive(Debug, Snafu)]
pub enum WriteError {
    /// The rendered post could not be written.
    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        /// The path being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Configuration options for writing posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Log what would be written without touching the filesystem.
    pub dry_run: bool,
}

/// Renders a post as a front-matter Markdown document.
#[must_use]
pub fn render_post(post: &Post) -> String {
    let mut out = String::with_capacity(post.body.len() + 128);

    out.push_str("---\n");
    writeln!(out, "title: \"{}\"", escape_quoted(&post.title)).unwrap();
    writeln!(out, "date: {}", post.published).unwrap();
    out.push_str("draft: false\n");
    out.push_str("tags:\n");
    for tag in &post.tags {
        writeln!(out, "- {tag}").unwrap();
    }
    out.push_str("---\n");
    out.push_str(&post.body);

    out
}

/// Escapes a value for use inside a double-quoted YAML scalar.
fn escape_quoted(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Writes rendered posts to their output paths.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    opts: WriteOptions,
}

impl Writer {
    /// Creates a writer with the given options.
    #[must_use]
    pub const fn new(opts: WriteOptions) -> Self {
        Self { opts }
    }

    /// Renders `post` and writes it to `post.output_path`, returning that path.
    ///
    /// Any existing file at that path is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, post: &Post) -> Result<PathBuf, WriteError> {
        let path = &post.output_path;

        if self.opts.dry_run {
            info!("would write {}", path.display());
            return Ok(path.clone());
        }

        std::fs::write(path, render_post(post)).context(WriteFileSnafu { path })?;
        info!("saved post to {}", path.display());
        Ok(path.clone())
    }
}
