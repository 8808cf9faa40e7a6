//! Input resolution: glob expansion, input lists and list editing.

use anyhow::Context;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use pdftools::{OrderedFileList, PdfToolsError};

use crate::cli::ListArgs;

/// Build the ordered input list described by `args`.
///
/// Direct inputs come first, then the entries of `--input-list`. Every path
/// is made absolute before deduplication. `--remove` positions refer to the
/// deduplicated list; `--order` is applied to what remains.
pub async fn collect(args: &ListArgs) -> anyhow::Result<OrderedFileList> {
    let mut paths = expand_patterns(&args.inputs)?;

    if let Some(list_path) = &args.input_list {
        paths.extend(read_input_list(list_path).await?);
    }

    let mut list = OrderedFileList::new();
    for path in paths {
        let absolute = std::path::absolute(&path)
            .with_context(|| format!("Cannot resolve path: {}", path.display()))?;
        list.add([absolute]);
    }

    if !args.remove.is_empty() {
        let indices = to_indices(&args.remove, list.len(), "--remove")?;
        list.remove(&indices)?;
    }

    if let Some(order) = &args.order {
        let positions = to_indices(order, list.len(), "--order")?;
        list.reorder_by_positions(&positions)?;
    }

    Ok(list)
}

/// Expand glob patterns in argument order.
///
/// Matches of one pattern are sorted by path. A pattern that matches nothing
/// is kept as a literal path, so a missing file is reported when it is opened.
pub fn expand_patterns<S: AsRef<str>>(patterns: &[S]) -> anyhow::Result<Vec<PathBuf>> {
    let mut resolved = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let entries = glob::glob(pattern)
            .with_context(|| format!("Invalid glob pattern: {pattern}"))?;

        let mut matched = Vec::new();
        for entry in entries {
            matched.push(entry.with_context(|| format!("Cannot expand pattern: {pattern}"))?);
        }

        if matched.is_empty() {
            resolved.push(PathBuf::from(pattern));
        } else {
            resolved.extend(matched);
        }
    }

    Ok(resolved)
}

/// Read paths from a file, one per line. `-` reads from stdin.
pub async fn read_input_list(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if path.as_os_str() == "-" {
        return parse_input_list(BufReader::new(tokio::io::stdin()))
            .await
            .context("Failed to read input list from stdin");
    }

    let file = tokio::fs::File::open(path)
        .await
        .map_err(|err| PdfToolsError::from_read_error(path.to_path_buf(), err))?;

    parse_input_list(BufReader::new(file))
        .await
        .map_err(|err| PdfToolsError::from_read_error(path.to_path_buf(), err).into())
}

/// Collect the non-blank, non-comment lines of `reader` as paths.
pub async fn parse_input_list<R>(reader: R) -> std::io::Result<Vec<PathBuf>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut paths = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        paths.push(PathBuf::from(line));
    }

    Ok(paths)
}

/// Convert 1-based positions to 0-based indices into a list of `len` entries.
fn to_indices(positions: &[usize], len: usize, flag: &str) -> pdftools::Result<Vec<usize>> {
    positions
        .iter()
        .map(|&position| {
            if position == 0 || position > len {
                Err(PdfToolsError::invalid_config(format!(
                    "{flag} position {position} is out of range; the list has {len} entries"
                )))
            } else {
                Ok(position - 1)
            }
        })
        .collect()
}
