//! Tree edit distance between secondary structures (Zhang-Shasha).
//!
//! The distance is the minimum total cost of node deletions, insertions and
//! relabelings turning one structure tree into the other, under a fixed
//! cost model:
//!
//! | operation        | Pair | Unpaired | Root |
//! |------------------|------|----------|------|
//! | delete / insert  | 2    | 1        | 1    |
//! | relabel          | 0 if both kinds are equal, 1 otherwise |
//!
//! Opening or breaking a base pair is the larger structural change, so a
//! pair costs twice as much to add or remove as an unpaired position.

use crate::error::StructureError;
use crate::indexed::IndexedTree;
use crate::structure::NodeKind;
use std::ops::{Index, IndexMut};

#[cfg(test)]
use itertools::Itertools;

#[inline]
pub fn cost_delete(kind: NodeKind) -> usize {
    match kind {
        NodeKind::Pair => 2,
        NodeKind::Unpaired | NodeKind::Root => 1,
    }
}

#[inline]
pub fn cost_insert(kind: NodeKind) -> usize {
    cost_delete(kind)
}

#[inline]
pub fn cost_relabel(a: NodeKind, b: NodeKind) -> usize {
    if a == b { 0 } else { 1 }
}

/// Row-major `rows × cols` table of distances.
#[derive(Debug, Clone)]
struct Table {
    cols: usize,
    cells: Vec<usize>,
}

impl Table {
    fn filled(rows: usize, cols: usize, value: usize) -> Self {
        Table { cols, cells: vec![value; rows * cols] }
    }
}

impl Index<(usize, usize)> for Table {
    type Output = usize;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &usize {
        &self.cells[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for Table {
    #[inline]
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut usize {
        &mut self.cells[r * self.cols + c]
    }
}

/// Compute the tree edit distance between two dot-bracket strings.
///
/// # Errors
/// Returns `StructureError` if either string is not valid dot-bracket
/// notation.
///
/// # Example
/// ```
/// # use rna_tree_distance::distances::dot_bracket_distance;
/// assert_eq!(dot_bracket_distance(".", "()").unwrap(), 1);
/// ```
pub fn dot_bracket_distance(a: &str, b: &str) -> Result<usize, StructureError> {
    let ta = IndexedTree::from_dot_bracket(a)?;
    let tb = IndexedTree::from_dot_bracket(b)?;

    Ok(tree_edit_distance(&ta, &tb))
}

/// Compute the tree edit distance between two indexed trees.
///
/// # Algorithm
/// `treedist[x][y]` holds the distance between the subtree at postorder
/// position `x` of `t1` and the subtree at `y` of `t2`. It starts out at a
/// value larger than any real distance and is filled by one forest pass per
/// keyroot pair, keyroots taken in ascending order on both sides. A subtree
/// pair is always finished by an earlier pass than any pass that reads it,
/// so the ordering of the two loops below must not change.
///
/// The answer is the root-to-root cell `treedist[m-1][n-1]`.
///
/// All tables are private to this call; the function touches no shared
/// state and can run on any number of threads at once.
pub fn tree_edit_distance(t1: &IndexedTree, t2: &IndexedTree) -> usize {
    let (m, n) = (t1.len(), t2.len());
    let mut treedist = Table::filled(m, n, 2 * (m + n));

    for &i in t1.keyroots() {
        for &j in t2.keyroots() {
            forest_distance(i, j, t1, t2, &mut treedist);
        }
    }

    treedist[(m - 1, n - 1)]
}

/// One forest pass for keyroots `i` of `t1` and `j` of `t2`.
///
/// # Algorithm
/// `fd[d1][d2]` is the distance between the first `d1` nodes of the forest
/// `l1..=i` and the first `d2` nodes of `l2..=j`, where `l1` and `l2` are
/// the keyroots' leftmost leaves.
/// - Row and column 0: delete (insert) every node of the prefix
/// - If both current nodes share the keyroots' leftmost leaf, both prefixes
///   are whole subtrees: take the best of delete, insert and relabel, and
///   record the result as their subtree distance
/// - Otherwise match the two subtrees as a block, reusing the subtree
///   distance recorded by an earlier pass
fn forest_distance(i: usize, j: usize, t1: &IndexedTree, t2: &IndexedTree, treedist: &mut Table) {
    let lm1 = t1.leftmost();
    let lm2 = t2.leftmost();
    let (l1, l2) = (lm1[i], lm2[j]);
    let rows = i - l1 + 2;
    let cols = j - l2 + 2;

    let mut fd = Table::filled(rows, cols, rows + cols);
    fd[(0, 0)] = 0;
    for d1 in 1..rows {
        fd[(d1, 0)] = fd[(d1 - 1, 0)] + cost_delete(t1.kind(l1 + d1 - 1));
    }
    for d2 in 1..cols {
        fd[(0, d2)] = fd[(0, d2 - 1)] + cost_insert(t2.kind(l2 + d2 - 1));
    }

    for d1 in 1..rows {
        let idx1 = l1 + d1 - 1;
        let kind1 = t1.kind(idx1);
        for d2 in 1..cols {
            let idx2 = l2 + d2 - 1;
            let kind2 = t2.kind(idx2);

            let delete = fd[(d1 - 1, d2)] + cost_delete(kind1);
            let insert = fd[(d1, d2 - 1)] + cost_insert(kind2);

            fd[(d1, d2)] = if lm1[idx1] == l1 && lm2[idx2] == l2 {
                let relabel = fd[(d1 - 1, d2 - 1)] + cost_relabel(kind1, kind2);
                let cost = delete.min(insert).min(relabel);
                treedist[(idx1, idx2)] = cost;
                cost
            } else {
                let subtree = fd[(lm1[idx1] - l1, lm2[idx2] - l2)] + treedist[(idx1, idx2)];
                delete.min(insert).min(subtree)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRUCTURES: [&str; 10] = [
        ".",
        "()",
        "..",
        "(.)",
        "(())",
        "(..)",
        "....",
        "((..((...))..)).(..)",
        "..((((...))))...((...))..",
        ".(.(.(.).).).",
    ];

    fn ted(a: &str, b: &str) -> usize {
        dot_bracket_distance(a, b).unwrap()
    }

    #[test]
    fn test_known_values() {
        assert_eq!(ted(".", "."), 0);
        assert_eq!(ted("()", "()"), 0);
        assert_eq!(ted(".", "()"), 1);
    }

    /// Small cases worked out by hand.
    ///
    /// ```text
    /// "."    vs ".."    insert one unpaired                       1
    /// "()"   vs "(.)"   insert one unpaired under the pair        1
    /// "(())" vs "()"    delete one pair                           2
    /// "."    vs "(())"  relabel U -> P, insert the other pair     3
    /// "(..)" vs "...."  delete the pair, insert two unpaired      4
    /// "(..)" vs "..."   delete the pair, insert one unpaired      3
    /// ```
    #[test]
    fn test_hand_derived_values() {
        assert_eq!(ted(".", ".."), 1);
        assert_eq!(ted("()", "(.)"), 1);
        assert_eq!(ted("(())", "()"), 2);
        assert_eq!(ted(".", "(())"), 3);
        assert_eq!(ted("(..)", "...."), 4);
        assert_eq!(ted("(..)", "..."), 3);
    }

    #[test]
    fn test_self_distance_is_zero() {
        for s in STRUCTURES {
            assert_eq!(ted(s, s), 0, "{s}");
        }
    }

    #[test]
    fn test_symmetry() {
        for pair in STRUCTURES.iter().combinations(2) {
            let (a, b) = (*pair[0], *pair[1]);
            assert_eq!(ted(a, b), ted(b, a), "{a} vs {b}");
        }
    }

    #[test]
    fn test_positive_for_different_structures() {
        for pair in STRUCTURES.iter().combinations(2) {
            assert!(ted(pair[0], pair[1]) > 0, "{} vs {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_triangle_inequality() {
        for triple in STRUCTURES.iter().combinations(3) {
            let (a, b, c) = (*triple[0], *triple[1], *triple[2]);
            assert!(ted(a, c) <= ted(a, b) + ted(b, c), "{a} {b} {c}");
        }
    }

    /// Turning a structure into an unrelated one is never more expensive
    /// than deleting everything below the root and inserting the rest.
    #[test]
    fn test_bounded_by_delete_all_insert_all() {
        let weight = |s: &str| {
            let t = IndexedTree::from_dot_bracket(s).unwrap();
            (0..t.len() - 1).map(|i| cost_delete(t.kind(i))).sum::<usize>()
        };
        for pair in STRUCTURES.iter().combinations(2) {
            let (a, b) = (*pair[0], *pair[1]);
            assert!(ted(a, b) <= weight(a) + weight(b), "{a} vs {b}");
        }
    }

    #[test]
    fn test_invalid_input_is_reported() {
        assert!(dot_bracket_distance(")(", ".").is_err());
        assert!(dot_bracket_distance(".", "((").is_err());
        assert!(dot_bracket_distance("(.x)", "(..)").is_err());
    }
}
