//! Error types for structure parsing and distance runs.
//!
//! Every error here is fatal for a run: a malformed structure invalidates the
//! whole batch, so callers propagate instead of recovering.

use std::io;
use thiserror::Error;

/// Malformed dot-bracket input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("empty structure")]
    Empty,

    #[error("unmatched closing parenthesis in {structure} at position {position}")]
    UnmatchedClose { structure: String, position: usize },

    #[error("invalid character '{character}' in {structure} at position {position}")]
    InvalidCharacter {
        structure: String,
        character: char,
        position: usize,
    },

    #[error("unbalanced parentheses in {structure} ({open} opening, {close} closing)")]
    Unbalanced {
        structure: String,
        open: usize,
        close: usize,
    },
}

impl StructureError {
    /// Position of the offending character, if the error points at one.
    pub fn position(&self) -> Option<usize> {
        match self {
            StructureError::UnmatchedClose { position, .. }
            | StructureError::InvalidCharacter { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Run-level error of the distance tool.
#[derive(Debug, Error)]
pub enum TedError {
    /// Structure `index` (0-based input order) failed to parse.
    #[error("structure {index}: {source}")]
    Structure {
        index: usize,
        #[source]
        source: StructureError,
    },

    #[error("at least {required} structures are required, found {found}")]
    InsufficientInput { required: usize, found: usize },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl TedError {
    /// Process exit code for this error class. Never 0.
    pub fn exit_code(&self) -> i32 {
        match self {
            TedError::InsufficientInput { .. } => 2,
            TedError::Structure { .. } => 3,
            TedError::Io(_) => 4,
            TedError::ThreadPool(_) => 5,
        }
    }
}
