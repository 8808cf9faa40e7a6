//! Validated per-command configuration.
//!
//! [`Config::from_command`] turns parsed arguments into one of three
//! configurations, resolving every input path on the way. Anything that can
//! be rejected without opening a document is rejected here.

use std::path::{Path, PathBuf};

use pdftools::config::{CompressionConfig, MergeOptions, ResampleFilter};
use pdftools::{OrderedFileList, PdfToolsError};

use crate::cli::{Command, CompressArgs, ConvertArgs, MergeArgs, OutputArgs};
use crate::inputs;

/// How to handle an existing output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Ask before overwriting.
    #[default]
    Prompt,
    /// Overwrite without asking.
    Force,
    /// Refuse to overwrite.
    NoClobber,
}

/// How results are reported on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable status lines.
    #[default]
    Text,
    /// A single JSON document with the operation summary.
    Json,
}

/// The output file already exists and may not be replaced.
#[derive(Debug, thiserror::Error)]
#[error("Output file already exists: {}\n  Hint: Use --force to overwrite", path.display())]
pub struct OutputExists {
    /// The existing file.
    pub path: PathBuf,
}

/// Where and how to write the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub overwrite_mode: OverwriteMode,
    pub mode: OutputMode,
}

impl OutputConfig {
    fn from_args(args: &OutputArgs) -> anyhow::Result<Self> {
        let overwrite_mode = if args.force {
            OverwriteMode::Force
        } else if args.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        };

        Ok(Self {
            path: std::path::absolute(&args.output)?,
            overwrite_mode,
            mode: if args.json {
                OutputMode::Json
            } else {
                OutputMode::Text
            },
        })
    }

    /// Reject an output path that is also one of the inputs.
    fn ensure_distinct_from<'a>(
        &self,
        inputs: impl IntoIterator<Item = &'a PathBuf>,
    ) -> pdftools::Result<()> {
        let target = comparable(&self.path);
        for input in inputs {
            if comparable(input) == target {
                return Err(PdfToolsError::invalid_config(format!(
                    "Output file cannot also be an input: {}",
                    self.path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Canonical form when the file exists, the absolute path otherwise.
fn comparable(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub inputs: OrderedFileList,
    pub output: OutputConfig,
    pub options: MergeOptions,
}

#[derive(Debug, Clone)]
pub struct CompressConfig {
    pub input: PathBuf,
    pub output: OutputConfig,
    pub compression: CompressionConfig,
}

#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub inputs: OrderedFileList,
    pub output: OutputConfig,
}

/// Configuration of one CLI invocation.
#[derive(Debug, Clone)]
pub enum Config {
    Merge(MergeConfig),
    Compress(CompressConfig),
    Convert(ConvertConfig),
}

impl Config {
    /// Resolve inputs and validate the arguments of `command`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - an input list cannot be read, or a glob pattern is malformed
    /// - a `--remove` or `--order` position is out of range
    /// - `--order` is not a permutation of the remaining inputs
    /// - compression settings are out of range
    /// - the output path is also an input
    pub async fn from_command(command: &Command) -> anyhow::Result<Self> {
        match command {
            Command::Merge(args) => Self::merge(args).await,
            Command::Compress(args) => Self::compress(args),
            Command::Convert(args) => Self::convert(args).await,
        }
    }

    async fn merge(args: &MergeArgs) -> anyhow::Result<Self> {
        let inputs = inputs::collect(&args.list).await?;
        let output = OutputConfig::from_args(&args.output)?;
        output.ensure_distinct_from(inputs.iter())?;

        Ok(Self::Merge(MergeConfig {
            inputs,
            output,
            options: MergeOptions {
                bookmarks: args.bookmarks,
            },
        }))
    }

    fn compress(args: &CompressArgs) -> anyhow::Result<Self> {
        let compression = CompressionConfig {
            scale: args.scale,
            quality: args.quality,
            filter: args.filter.parse::<ResampleFilter>()?,
            garbage_collect: !args.no_gc,
            deflate: !args.no_deflate,
        };
        compression.validate()?;

        let input = std::path::absolute(&args.input)?;
        let output = OutputConfig::from_args(&args.output)?;
        output.ensure_distinct_from([&input])?;

        Ok(Self::Compress(CompressConfig {
            input,
            output,
            compression,
        }))
    }

    async fn convert(args: &ConvertArgs) -> anyhow::Result<Self> {
        let inputs = inputs::collect(&args.list).await?;
        let output = OutputConfig::from_args(&args.output)?;
        output.ensure_distinct_from(inputs.iter())?;

        Ok(Self::Convert(ConvertConfig { inputs, output }))
    }

    /// Output settings of the command.
    pub fn output(&self) -> &OutputConfig {
        match self {
            Self::Merge(config) => &config.output,
            Self::Compress(config) => &config.output,
            Self::Convert(config) => &config.output,
        }
    }

    /// Resolved inputs, in processing order.
    pub fn sources(&self) -> OrderedFileList {
        match self {
            Self::Merge(config) => config.inputs.clone(),
            Self::Compress(config) => OrderedFileList::from(vec![config.input.clone()]),
            Self::Convert(config) => config.inputs.clone(),
        }
    }
}
