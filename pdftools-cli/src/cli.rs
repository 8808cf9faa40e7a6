//! CLI argument parsing for pdftools.
//!
//! This module only describes the command line. It is also compiled by the
//! build script to render the man page, so it depends on nothing but `clap`
//! and the standard library. Conversion into a validated configuration lives
//! in [`crate::config`].

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Merge PDFs, shrink their embedded images, and build PDFs from images.
#[derive(Parser, Debug)]
#[command(name = "pdftools")]
#[command(version)]
#[command(about = "Merge PDFs, shrink their embedded images, and build PDFs from images", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Verbose output - show per-document and per-image details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all non-error output
    ///
    /// Only errors and warnings will be printed.
    /// Useful for scripts and automation.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available operations.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Concatenate two or more PDFs into one document
    ///
    /// Examples:
    ///   pdftools merge a.pdf b.pdf -o both.pdf
    ///   pdftools merge chapter*.pdf -o book.pdf --bookmarks
    ///   pdftools merge a.pdf b.pdf c.pdf --order 3,1,2 -o out.pdf
    Merge(MergeArgs),

    /// Downsample and re-encode the images embedded in a PDF
    ///
    /// Examples:
    ///   pdftools compress scan.pdf -o scan-small.pdf
    ///   pdftools compress scan.pdf -o out.pdf --scale 0.25 --quality 70
    Compress(CompressArgs),

    /// Build a PDF with one page per image
    ///
    /// Examples:
    ///   pdftools convert photo1.jpg photo2.png -o album.pdf
    ///   pdftools convert --input-list pictures.txt -o album.pdf
    Convert(ConvertArgs),
}

/// Input selection shared by `merge` and `convert`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Input files (in order); glob patterns are expanded
    #[arg(value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Read input file list from a file (one path per line)
    ///
    /// Use '-' to read from stdin. Blank lines and lines starting with '#'
    /// are ignored. Paths are appended after the direct inputs.
    #[arg(long, value_name = "FILE")]
    pub input_list: Option<PathBuf>,

    /// Drop the entry at this 1-based position (repeatable)
    ///
    /// Positions refer to the list before any removal.
    #[arg(long, value_name = "N")]
    pub remove: Vec<usize>,

    /// New order as a comma-separated 1-based permutation
    ///
    /// Applied after --remove, e.g. "3,1,2".
    #[arg(long, value_name = "N,N,...", value_delimiter = ',')]
    pub order: Option<Vec<usize>>,
}

/// Output handling shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output PDF file path
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Force overwrite of existing output file without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite existing output file
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Print the operation summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `pdftools merge`.
#[derive(Args, Debug, Clone, Default)]
pub struct MergeArgs {
    #[command(flatten)]
    pub list: ListArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Add one bookmark per merged document, titled with its file name
    #[arg(short, long)]
    pub bookmarks: bool,
}

/// Arguments of `pdftools compress`.
#[derive(Args, Debug, Clone, Default)]
pub struct CompressArgs {
    /// Source PDF file
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Linear scale applied to image dimensions, in (0, 1]
    #[arg(long, value_name = "S", default_value_t = 0.5)]
    pub scale: f64,

    /// JPEG quality of re-encoded images (1-100)
    #[arg(long, value_name = "Q", default_value_t = 50)]
    pub quality: u8,

    /// Resampling filter used when shrinking images
    #[arg(long, value_name = "NAME", default_value = "lanczos3")]
    #[arg(value_parser = ["nearest", "triangle", "catmull-rom", "gaussian", "lanczos3"])]
    pub filter: String,

    /// Keep unreachable objects and original object numbers
    #[arg(long)]
    pub no_gc: bool,

    /// Do not deflate streams that carry no filter
    #[arg(long)]
    pub no_deflate: bool,
}

/// Arguments of `pdftools convert`.
#[derive(Args, Debug, Clone, Default)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub list: ListArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}
