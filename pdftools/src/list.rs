//! User-ordered, duplicate-free file lists.
//!
//! An [`OrderedFileList`] is what a front-end edits before invoking an
//! operation: its iteration order is exactly the page order of the output.
//! Every mutation is checked so the list can never hold a duplicate or a path
//! the caller did not supply.
//!
//! # Examples
//!
//! ```
//! use pdftools::list::OrderedFileList;
//! use std::path::PathBuf;
//!
//! let mut list = OrderedFileList::new();
//! list.add(["a.pdf", "b.pdf", "a.pdf", "c.pdf"]);
//! assert_eq!(list.len(), 3);
//!
//! list.remove(&[0, 2]).unwrap();
//! assert_eq!(list.snapshot(), &[PathBuf::from("b.pdf")]);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{PdfToolsError, Result};

/// Ordered sequence of unique file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PathBuf>", into = "Vec<PathBuf>")]
pub struct OrderedFileList {
    entries: Vec<PathBuf>,
}

impl OrderedFileList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every path not already present, in first-seen order.
    ///
    /// Duplicates, whether of existing entries or within `paths` itself, are
    /// ignored. Returns the number of entries appended.
    pub fn add<I>(&mut self, paths: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        let before = self.entries.len();
        for path in paths {
            let path = path.into();
            if !self.entries.contains(&path) {
                self.entries.push(path);
            }
        }
        self.entries.len() - before
    }

    /// Remove the entries at `indices` (0-based, against the current state).
    ///
    /// Repeated indices count once. Returns the removed paths in list order.
    ///
    /// # Errors
    ///
    /// Returns [`PdfToolsError::IndexOutOfRange`] if any index does not exist;
    /// the list is left unchanged in that case.
    pub fn remove(&mut self, indices: &[usize]) -> Result<Vec<PathBuf>> {
        let len = self.entries.len();
        if let Some(&index) = indices.iter().find(|&&index| index >= len) {
            return Err(PdfToolsError::IndexOutOfRange { index, len });
        }

        let selected: BTreeSet<usize> = indices.iter().copied().collect();
        let mut removed: Vec<PathBuf> = selected
            .iter()
            .rev()
            .map(|&index| self.entries.remove(index))
            .collect();
        removed.reverse();

        Ok(removed)
    }

    /// Replace the whole sequence with `new_order`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfToolsError::InvalidOrder`] unless `new_order` is a
    /// permutation of the current entries. The list is left unchanged.
    pub fn reorder<I>(&mut self, new_order: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        let candidate: Vec<PathBuf> = new_order.into_iter().map(Into::into).collect();

        let current: HashSet<&Path> = self.entries.iter().map(PathBuf::as_path).collect();
        let mut seen: HashSet<&Path> = HashSet::with_capacity(candidate.len());

        for path in &candidate {
            if !current.contains(path.as_path()) {
                return Err(PdfToolsError::invalid_order(format!(
                    "{} is not in the list",
                    path.display()
                )));
            }
            if !seen.insert(path.as_path()) {
                return Err(PdfToolsError::invalid_order(format!(
                    "{} appears more than once",
                    path.display()
                )));
            }
        }

        if let Some(missing) = self
            .entries
            .iter()
            .find(|path| !seen.contains(path.as_path()))
        {
            return Err(PdfToolsError::invalid_order(format!(
                "{} is missing",
                missing.display()
            )));
        }

        self.entries = candidate;
        Ok(())
    }

    /// Reorder by positions: `positions[i]` is the current index of the entry
    /// that should end up at index `i`.
    ///
    /// # Errors
    ///
    /// Fails like [`reorder`](Self::reorder) when `positions` is not a
    /// permutation of `0..len`.
    pub fn reorder_by_positions(&mut self, positions: &[usize]) -> Result<()> {
        let len = self.entries.len();
        if let Some(&index) = positions.iter().find(|&&index| index >= len) {
            return Err(PdfToolsError::IndexOutOfRange { index, len });
        }

        let mut counts: HashMap<usize, usize> = HashMap::new();
        for &index in positions {
            *counts.entry(index).or_default() += 1;
        }
        if let Some((&index, _)) = counts.iter().find(|&(_, &count)| count > 1) {
            return Err(PdfToolsError::invalid_order(format!(
                "position {} appears more than once",
                index + 1
            )));
        }

        let candidate: Vec<PathBuf> = positions
            .iter()
            .map(|&index| self.entries[index].clone())
            .collect();
        self.reorder(candidate)
    }

    /// Current ordered sequence.
    pub fn snapshot(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `path` is in the list.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.entries.iter().any(|entry| entry == path)
    }

    /// Iterate entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.entries.iter()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Consume the list, returning its entries in order.
    pub fn into_paths(self) -> Vec<PathBuf> {
        self.entries
    }
}

impl From<Vec<PathBuf>> for OrderedFileList {
    fn from(paths: Vec<PathBuf>) -> Self {
        paths.into_iter().collect()
    }
}

impl From<OrderedFileList> for Vec<PathBuf> {
    fn from(list: OrderedFileList) -> Self {
        list.entries
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for OrderedFileList {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut list = Self::new();
        list.add(iter);
        list
    }
}

impl<P: Into<PathBuf>> Extend<P> for OrderedFileList {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        self.add(iter);
    }
}

impl<'a> IntoIterator for &'a OrderedFileList {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl AsRef<[PathBuf]> for OrderedFileList {
    fn as_ref(&self) -> &[PathBuf] {
        self.snapshot()
    }
}
