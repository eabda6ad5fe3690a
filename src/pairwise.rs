//! Parallel orchestration of many pairwise tree edit distances.
//!
//! # Modes
//! - **Full matrix**: every unordered pair `i < j` is one unit of work. The
//!   results land in an index-addressed buffer and are mirrored into a
//!   symmetric matrix with a zero diagonal, in input order.
//! - **Row-wise**: every row `d(i, ·)` is one unit of work and is emitted as
//!   soon as it is finished. Rows come out in *completion* order, which need
//!   not match input order; use [`Orchestrator::for_each_row`] when the row
//!   index is needed.
//! - **First-only**: `d(0, j)` for `j = 1..N`, returned in `j` order.
//!
//! # Concurrency
//! Work runs on a dedicated rayon pool. Indexed trees are shared read-only,
//! every distance allocates its own scratch tables, and the only shared
//! mutable state is the progress counter (atomic) and, in row-wise mode, the
//! output writer (behind a mutex).

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::distances::tree_edit_distance;
use crate::error::TedError;
use crate::indexed::IndexedTree;
use crate::io::{write_column, write_matrix, write_row};
use crate::progress::Progress;

/// Which distances to compute and how to report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Full,
    RowWise,
    FirstOnly,
}

/// Schedules distance computations on a fixed-size worker pool.
pub struct Orchestrator {
    pool: ThreadPool,
    show_progress: bool,
}

impl Orchestrator {
    /// Build an orchestrator with `threads` workers.
    ///
    /// `None` or `Some(0)` uses the available hardware parallelism.
    pub fn new(threads: Option<usize>) -> Result<Self, TedError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .thread_name(|i| format!("ted-worker-{i}"))
            .build()?;
        Ok(Orchestrator { pool, show_progress: false })
    }

    /// Draw a progress indicator on stderr while computing.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Compute the full symmetric distance matrix.
    pub fn full_matrix(&self, trees: &[IndexedTree]) -> Vec<Vec<usize>> {
        let n = trees.len();
        let progress = Progress::new(n * n.saturating_sub(1) / 2, self.show_progress);

        let pairs: Vec<(usize, usize, usize)> = self.pool.install(|| {
            (0..n)
                .into_par_iter()
                .flat_map_iter(|i| (i + 1..n).map(move |j| (i, j)))
                .map(|(i, j)| {
                    let dist = tree_edit_distance(&trees[i], &trees[j]);
                    progress.tick();
                    (i, j, dist)
                })
                .collect()
        });
        progress.finish();

        let mut matrix = vec![vec![0usize; n]; n];
        for (i, j, dist) in pairs {
            matrix[i][j] = dist;
            matrix[j][i] = dist;
        }
        matrix
    }

    /// Compute every row `d(i, ·)` independently and hand it to `emit` as
    /// soon as it is complete.
    ///
    /// `emit` runs on the worker that computed the row, so calls arrive in
    /// completion order and may run concurrently. The first error returned by
    /// `emit` stops the run.
    pub fn for_each_row<F, E>(&self, trees: &[IndexedTree], emit: F) -> Result<(), E>
    where
        F: Fn(usize, &[usize]) -> Result<(), E> + Sync,
        E: Send,
    {
        let n = trees.len();
        let progress = Progress::new(n, self.show_progress);

        let result = self.pool.install(|| {
            (0..n).into_par_iter().try_for_each(|i| {
                let row: Vec<usize> = (0..n)
                    .map(|j| if i == j { 0 } else { tree_edit_distance(&trees[i], &trees[j]) })
                    .collect();
                emit(i, &row)?;
                progress.tick();
                Ok(())
            })
        });
        progress.finish();
        result
    }

    /// Row-wise mode over a writer.
    ///
    /// Each finished row is written and flushed while holding a lock shared
    /// by all workers. Rows appear in completion order. Returns the writer.
    pub fn stream_rows<W: Write + Send>(&self, trees: &[IndexedTree], out: W) -> Result<W, TedError> {
        let out = Mutex::new(out);
        self.for_each_row(trees, |_, row| -> Result<(), TedError> {
            let mut guard = out.lock().unwrap_or_else(PoisonError::into_inner);
            write_row(&mut *guard, row)?;
            guard.flush()?;
            Ok(())
        })?;
        Ok(out.into_inner().unwrap_or_else(PoisonError::into_inner))
    }

    /// Distances from the first structure to every other one, in input
    /// order.
    ///
    /// # Errors
    /// `InsufficientInput` with fewer than two structures.
    pub fn first_only(&self, trees: &[IndexedTree]) -> Result<Vec<usize>, TedError> {
        let n = trees.len();
        if n < 2 {
            return Err(TedError::InsufficientInput { required: 2, found: n });
        }
        let progress = Progress::new(n - 1, self.show_progress);

        // Indexed collect keeps `j` order whatever the completion order.
        let distances: Vec<usize> = self.pool.install(|| {
            (1..n)
                .into_par_iter()
                .map(|j| {
                    let dist = tree_edit_distance(&trees[0], &trees[j]);
                    progress.tick();
                    dist
                })
                .collect()
        });
        progress.finish();
        Ok(distances)
    }

    /// Compute the distances selected by `mode` and write them to `out`.
    ///
    /// - `Full`: `N` lines of `N` space-separated integers
    /// - `RowWise`: the same lines, in completion order
    /// - `FirstOnly`: `N - 1` lines of one integer each
    pub fn run<W: Write + Send>(&self, mode: Mode, trees: &[IndexedTree], mut out: W) -> Result<W, TedError> {
        match mode {
            Mode::Full => {
                let matrix = self.full_matrix(trees);
                write_matrix(&mut out, &matrix)?;
            }
            Mode::RowWise => {
                out = self.stream_rows(trees, out)?;
            }
            Mode::FirstOnly => {
                let distances = self.first_only(trees)?;
                write_column(&mut out, &distances)?;
            }
        }
        out.flush()?;
        Ok(out)
    }
}

/// Parse and index every structure, in input order.
///
/// # Errors
/// - `InsufficientInput` if there is nothing to index
/// - the first malformed structure, tagged with its input index
pub fn index_structures<S: AsRef<str>>(structures: &[S]) -> Result<Vec<IndexedTree>, TedError> {
    if structures.is_empty() {
        return Err(TedError::InsufficientInput { required: 1, found: 0 });
    }
    structures
        .iter()
        .enumerate()
        .map(|(index, s)| {
            IndexedTree::from_dot_bracket(s.as_ref()).map_err(|source| TedError::Structure { index, source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distances::dot_bracket_distance;
    use crate::error::StructureError;
    use itertools::Itertools;

    const STRUCTURES: [&str; 7] = [
        "((..((...))..)).(..)",
        "..((((...))))...((...))..",
        ".(.(.(.).).).",
        "(((...)))(((...)))",
        "....................",
        "((((....))))",
        "(.)",
    ];

    fn trees() -> Vec<IndexedTree> {
        index_structures(&STRUCTURES).unwrap()
    }

    fn parse_rows(text: &str) -> Vec<Vec<usize>> {
        text.lines()
            .map(|l| l.split_whitespace().map(|v| v.parse().unwrap()).collect())
            .collect()
    }

    #[test]
    fn test_full_matrix_properties() {
        let orchestrator = Orchestrator::new(Some(4)).unwrap();
        let matrix = orchestrator.full_matrix(&trees());
        let n = STRUCTURES.len();

        assert_eq!(matrix.len(), n);
        for i in 0..n {
            assert_eq!(matrix[i].len(), n);
            assert_eq!(matrix[i][i], 0);
        }
        for (i, j) in (0..n).tuple_combinations() {
            assert_eq!(matrix[i][j], matrix[j][i]);
            assert_eq!(matrix[i][j], dot_bracket_distance(STRUCTURES[i], STRUCTURES[j]).unwrap());
        }
    }

    #[test]
    fn test_full_matrix_independent_of_thread_count() {
        let trees = trees();
        let single = Orchestrator::new(Some(1)).unwrap().full_matrix(&trees);
        let many = Orchestrator::new(Some(8)).unwrap().full_matrix(&trees);
        assert_eq!(single, many);
    }

    #[test]
    fn test_rows_match_full_matrix() {
        let trees = trees();
        let orchestrator = Orchestrator::new(Some(3)).unwrap();
        let matrix = orchestrator.full_matrix(&trees);

        let rows = Mutex::new(Vec::new());
        orchestrator
            .for_each_row(&trees, |i, row| -> Result<(), TedError> {
                rows.lock().unwrap().push((i, row.to_vec()));
                Ok(())
            })
            .unwrap();

        let mut rows = rows.into_inner().unwrap();
        assert_eq!(rows.len(), trees.len());
        rows.sort_by_key(|(i, _)| *i);
        for (i, row) in rows {
            assert_eq!(row, matrix[i]);
        }
    }

    #[test]
    fn test_streamed_rows_are_a_permutation_of_the_matrix() {
        let trees = trees();
        let orchestrator = Orchestrator::new(Some(4)).unwrap();
        let matrix = orchestrator.full_matrix(&trees);

        let out = orchestrator.stream_rows(&trees, Vec::new()).unwrap();
        let mut streamed = parse_rows(&String::from_utf8(out).unwrap());
        let mut expected = matrix.clone();
        streamed.sort();
        expected.sort();
        assert_eq!(streamed, expected);
    }

    #[test]
    fn test_first_only_matches_first_row() {
        let trees = trees();
        let orchestrator = Orchestrator::new(None).unwrap();
        let matrix = orchestrator.full_matrix(&trees);
        let first = orchestrator.first_only(&trees).unwrap();

        assert_eq!(first.len(), trees.len() - 1);
        for j in 1..trees.len() {
            assert_eq!(first[j - 1], matrix[0][j]);
        }
    }

    #[test]
    fn test_first_only_needs_two_structures() {
        let trees = index_structures(&["(.)"]).unwrap();
        let err = Orchestrator::new(Some(1)).unwrap().first_only(&trees).unwrap_err();
        assert!(matches!(err, TedError::InsufficientInput { required: 2, found: 1 }));
    }

    #[test]
    fn test_single_structure_matrix() {
        let trees = index_structures(&["(.)"]).unwrap();
        let orchestrator = Orchestrator::new(Some(2)).unwrap();
        assert_eq!(orchestrator.full_matrix(&trees), vec![vec![0]]);
        let out = orchestrator.run(Mode::RowWise, &trees, Vec::new()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0\n");
    }

    #[test]
    fn test_run_output_formats() {
        let trees = index_structures(&[".", "()", ".."]).unwrap();
        let orchestrator = Orchestrator::new(Some(2)).unwrap();

        let full = orchestrator.run(Mode::Full, &trees, Vec::new()).unwrap();
        assert_eq!(String::from_utf8(full).unwrap(), "0 1 1\n1 0 2\n1 2 0\n");

        let first = orchestrator.run(Mode::FirstOnly, &trees, Vec::new()).unwrap();
        assert_eq!(String::from_utf8(first).unwrap(), "1\n1\n");
    }

    #[test]
    fn test_index_structures_rejects_empty_input() {
        let err = index_structures::<&str>(&[]).unwrap_err();
        assert!(matches!(err, TedError::InsufficientInput { required: 1, found: 0 }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_index_structures_reports_offending_line() {
        let err = index_structures(&[".", "(.)", "(.x)"]).unwrap_err();
        match err {
            TedError::Structure { index, source } => {
                assert_eq!(index, 2);
                assert_eq!(source.position(), Some(2));
                assert!(matches!(source, StructureError::InvalidCharacter { character: 'x', .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
