// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The blog2md contributors

//! Command-line interface for blog2md.
//!
//! This binary provides the `blog2md` command for converting a Blogger or
//! WordPress export into a directory of Markdown posts.

use blog2md::extract::Extractor;
use blog2md::feed::{self, Mode};
use blog2md::markup::MarkdownConverter;
use blog2md::pipeline::{self, CommentPolicy, RunOptions};
use blog2md::renderer::{WriteOptions, Writer};
use lexopt::prelude::*;
use snafu::prelude::*;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "BLOG2MD_LOG";

#[allow(clippy::struct_excessive_bools)]
struct Cli {
    mode: Mode,
    input: PathBuf,
    output: PathBuf,
    comments: CommentPolicy,
    paragraph_fix: bool,
    dry_run: bool,
    quiet: bool,
    verbose: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse {}: {source}", path.display()))]
    ParseFeed {
        path: PathBuf,
        source: feed::ParseError,
    },

    #[snafu(display("failed to create output directory {}: {source}", path.display()))]
    CreateOutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert Blogger and WordPress export archives to Markdown posts

Usage: {name} [OPTIONS] <MODE> <INPUT> <OUTPUT>

Arguments:
  <MODE>    Export dialect: b (blogger) or w (wordpress)
  <INPUT>   Export XML file
  <OUTPUT>  Output directory (created if missing)

Options:
      --comments <POLICY>   Blogger comment entries: keep or skip (default: keep)
      --paragraph-fix       Turn <br>-separated lines into paragraphs

Other options:
  -n, --dry-run             Show what would be written without writing
  -q, --quiet               Only print warnings and errors
  -v, --verbose             Print debug messages
  -h, --help                Print help
  -V, --version             Print version

The {LOG_ENV} environment variable overrides the log filter.",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    // Show help if no arguments provided
    if std::env::args().len() == 1 {
        print_help();
        std::process::exit(0);
    }

    let mut positional: Vec<OsString> = Vec::new();
    let mut comments = CommentPolicy::default();
    let mut paragraph_fix = false;
    let mut dry_run = false;
    let mut quiet = false;
    let mut verbose = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Long("comments") => comments = parser.value()?.parse()?,
            Long("paragraph-fix") => paragraph_fix = true,
            Short('n') | Long("dry-run") => dry_run = true,
            Short('q') | Long("quiet") => quiet = true,
            Short('v') | Long("verbose") => verbose = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) if positional.len() < 3 => positional.push(val),
            _ => return Err(arg.unexpected()),
        }
    }

    let mut positional = positional.into_iter();
    let mode: Mode = positional
        .next()
        .ok_or("missing required argument: <MODE>")?
        .parse()?;
    let input: PathBuf = positional
        .next()
        .ok_or("missing required argument: <INPUT>")?
        .into();
    let output: PathBuf = positional
        .next()
        .ok_or("missing required argument: <OUTPUT>")?
        .into();

    Ok(Cli {
        mode,
        input,
        output,
        comments,
        paragraph_fix,
        dry_run,
        quiet,
        verbose,
    })
}

/// Installs the stderr log subscriber.
fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    init_logging(&cli);

    let xml = std::fs::read_to_string(&cli.input).context(ReadFileSnafu { path: &cli.input })?;
    let entries = feed::parse_feed(&xml, cli.mode).context(ParseFeedSnafu { path: &cli.input })?;

    prepare_output_dir(&cli)?;

    let extractor = Extractor::new(
        MarkdownConverter {
            paragraph_fix: cli.paragraph_fix,
        },
        &cli.output,
    );
    let writer = Writer::new(WriteOptions {
        dry_run: cli.dry_run,
    });
    let opts = RunOptions {
        comments: cli.comments,
    };

    let report = pipeline::run(&entries, &extractor, &writer, &opts);

    info!(
        written = report.written.len(),
        skipped = report.skipped,
        failed = report.failures.len(),
        "conversion finished"
    );
    Ok(())
}

/// Creates the output directory, or warns that its files will be replaced.
fn prepare_output_dir(cli: &Cli) -> Result<(), Error> {
    let dir = &cli.output;
    if dir.is_dir() {
        warn!(
            "output directory {} already exists, files will be overwritten",
            dir.display()
        );
        return Ok(());
    }

    if cli.dry_run {
        info!("would create output directory {}", dir.display());
        return Ok(());
    }

    std::fs::create_dir_all(dir).context(CreateOutputDirSnafu { path: dir })
}
