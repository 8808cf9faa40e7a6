//! Front-end session state.
//!
//! The CLI walks one [`Session`] through `Idle -> SourceSelected -> Running`
//! and back. An operation can only start once sources are selected, and the
//! selection cannot change while an operation runs.

use std::fmt;
use std::path::PathBuf;

use pdftools::OrderedFileList;

/// Document operation offered by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Merge,
    Compress,
    Convert,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Merge => "merge",
            Self::Compress => "compress",
            Self::Convert => "convert",
        })
    }
}

/// Current state of a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing selected.
    #[default]
    Idle,
    /// Sources chosen, ready to run.
    SourceSelected { sources: OrderedFileList },
    /// An operation is in progress on `sources`.
    Running {
        operation: Operation,
        sources: OrderedFileList,
    },
}

/// A transition that is not allowed from the current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("A {0} operation is already running")]
    Busy(Operation),
    #[error("No source files selected")]
    NothingSelected,
    #[error("No operation is running")]
    NotRunning,
}

/// Explicit state machine for one front-end session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Replace the selection. An empty selection returns to `Idle`.
    pub fn select(&mut self, sources: OrderedFileList) -> Result<(), SessionError> {
        if let SessionState::Running { operation, .. } = self.state {
            return Err(SessionError::Busy(operation));
        }

        self.state = if sources.is_empty() {
            SessionState::Idle
        } else {
            SessionState::SourceSelected { sources }
        };
        Ok(())
    }

    /// Start `operation` and hand out a snapshot of the selected sources.
    pub fn start(&mut self, operation: Operation) -> Result<Vec<PathBuf>, SessionError> {
        match std::mem::take(&mut self.state) {
            SessionState::SourceSelected { sources } => {
                let snapshot = sources.snapshot().to_vec();
                self.state = SessionState::Running { operation, sources };
                Ok(snapshot)
            }
            SessionState::Running {
                operation: current,
                sources,
            } => {
                self.state = SessionState::Running {
                    operation: current,
                    sources,
                };
                Err(SessionError::Busy(current))
            }
            SessionState::Idle => Err(SessionError::NothingSelected),
        }
    }

    /// Finish the running operation, keeping the selection for another run.
    pub fn finish(&mut self) -> Result<Operation, SessionError> {
        match std::mem::take(&mut self.state) {
            SessionState::Running { operation, sources } => {
                self.state = SessionState::SourceSelected { sources };
                Ok(operation)
            }
            other => {
                self.state = other;
                Err(SessionError::NotRunning)
            }
        }
    }
}
