//! Error types for document loading and apply runs.

use crate::ledger::{LedgerEntry, ResourceKind};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for provisioning operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a document could not be loaded or an apply run stopped.
#[derive(Error, Debug)]
pub enum Error {
    /// No usable credentials; raised before any remote call is made
    #[error("{0}")]
    Unauthenticated(String),

    #[error("failed to {action}: {source}")]
    Transport {
        action: String,
        #[source]
        source: restkit::Error,
    },

    #[error("{kind} '{name}' not found")]
    ReferenceNotFound { kind: ResourceKind, name: String },

    #[error("service with hash '{hash}' already exists (use --skip-existing to skip it)")]
    Conflict { hash: String },

    #[error("invalid document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The forward pass panicked
    #[error("apply aborted: {0}")]
    Aborted(String),
}

impl Error {
    pub(crate) fn transport(action: impl Into<String>, source: restkit::Error) -> Self {
        Self::Transport {
            action: action.into(),
            source,
        }
    }

    /// HTTP status of a transport failure, if the remote answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// A ledger entry whose delete call failed during rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackFailure {
    pub entry: LedgerEntry,
    pub error: String,
}

/// Outcome of a rollback sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    /// Delete calls issued
    pub attempted: usize,
    /// Delete calls that succeeded
    pub succeeded: usize,
    pub failures: Vec<RollbackFailure>,
}

impl RollbackReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A failed apply: the error that stopped the forward pass plus what the
/// rollback sweep managed to undo.
///
/// Displays as the original error; rollback problems never replace it.
#[derive(Debug)]
pub struct ApplyFailure {
    pub error: Error,
    /// Resources created before the run stopped
    pub created: usize,
    pub rollback: RollbackReport,
}

impl ApplyFailure {
    /// A failure that happened before anything was created.
    pub fn before_start(error: Error) -> Self {
        Self {
            error,
            created: 0,
            rollback: RollbackReport::default(),
        }
    }

    /// Created resources that no rollback delete was issued for.
    pub fn unattempted(&self) -> usize {
        self.created.saturating_sub(self.rollback.attempted)
    }
}

impl fmt::Display for ApplyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for ApplyFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}
