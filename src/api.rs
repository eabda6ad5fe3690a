//! Python binding layer for tree edit distance calculations.
//!
//! Provides Python functions for computing distances between RNA secondary
//! structures given in dot-bracket notation.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::sync::Mutex;

use crate::distances::dot_bracket_distance;
use crate::error::TedError;
use crate::indexed::IndexedTree;
use crate::pairwise::{index_structures, Orchestrator};

fn to_py_err(e: TedError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Parse the structures and set up a worker pool.
fn prepare(structures: &[String], threads: Option<usize>) -> PyResult<(Vec<IndexedTree>, Orchestrator)> {
    let trees = index_structures(structures).map_err(to_py_err)?;
    let orchestrator = Orchestrator::new(threads).map_err(to_py_err)?;
    Ok((trees, orchestrator))
}

/// Tree edit distance between two dot-bracket structures.
///
/// Raises:
///     ValueError: If either structure is malformed
#[pyfunction]
fn tree_edit_distance(a: &str, b: &str) -> PyResult<usize> {
    dot_bracket_distance(a, b).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Compute the full pairwise tree edit distance matrix.
///
/// Args:
///     structures: List of dot-bracket strings
///     threads: Number of worker threads (default: available parallelism)
///
/// Returns:
///     A symmetric 2D list of distances with a zero diagonal
///
/// Raises:
///     ValueError: If the list is empty or a structure is malformed
#[pyfunction]
#[pyo3(signature = (structures, threads=None))]
fn pairwise_ted(py: Python<'_>, structures: Vec<String>, threads: Option<usize>) -> PyResult<Vec<Vec<usize>>> {
    let (trees, orchestrator) = prepare(&structures, threads)?;
    Ok(py.detach(|| orchestrator.full_matrix(&trees)))
}

/// Compute the distance matrix row by row.
///
/// Returns:
///     A list of (index, row) tuples in the order the rows finished
#[pyfunction]
#[pyo3(signature = (structures, threads=None))]
fn rowwise_ted(
    py: Python<'_>,
    structures: Vec<String>,
    threads: Option<usize>,
) -> PyResult<Vec<(usize, Vec<usize>)>> {
    let (trees, orchestrator) = prepare(&structures, threads)?;
    let rows = Mutex::new(Vec::with_capacity(trees.len()));

    py.detach(|| {
        orchestrator.for_each_row(&trees, |i, row| -> Result<(), TedError> {
            rows.lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push((i, row.to_vec()));
            Ok(())
        })
    })
    .map_err(to_py_err)?;

    Ok(rows.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner))
}

/// Distances from the first structure to every other structure.
///
/// Returns:
///     A list of len(structures) - 1 distances in input order
///
/// Raises:
///     ValueError: If fewer than two structures are given or one is malformed
#[pyfunction]
#[pyo3(signature = (structures, threads=None))]
fn first_only_ted(py: Python<'_>, structures: Vec<String>, threads: Option<usize>) -> PyResult<Vec<usize>> {
    let (trees, orchestrator) = prepare(&structures, threads)?;
    py.detach(|| orchestrator.first_only(&trees)).map_err(to_py_err)
}

/// Python module definition
#[pymodule]
fn rna_tree_distance(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(tree_edit_distance, m)?)?;
    m.add_function(wrap_pyfunction!(pairwise_ted, m)?)?;
    m.add_function(wrap_pyfunction!(rowwise_ted, m)?)?;
    m.add_function(wrap_pyfunction!(first_only_ted, m)?)?;
    Ok(())
}
