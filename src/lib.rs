//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `structure`: dot-bracket parsing into ordered labeled trees.
//! - `indexed`: postorder / leftmost-leaf / keyroot index of a tree.
//! - `distances`: cost model and Zhang-Shasha tree edit distance.
//! - `pairwise`: parallel full-matrix, row-wise and first-only runs.
//! - `progress`: atomic progress counter and stderr indicator.
//! - `io`: reading structures and writing distances.
//! - `error`: parse and run errors.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).

pub mod distances;
pub mod error;
pub mod indexed;
pub mod io;
pub mod pairwise;
pub mod progress;
pub mod structure;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use distances::{dot_bracket_distance, tree_edit_distance};
pub use error::{StructureError, TedError};
pub use indexed::IndexedTree;
pub use io::{read_structures, write_matrix};
pub use pairwise::{index_structures, Mode, Orchestrator};
pub use structure::{Node, NodeId, NodeKind, Tree};
