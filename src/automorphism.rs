//! Automorphism orbits of small vertex-colored graphs.
//!
//! Two nodes share an orbit when some adjacency- and color-preserving
//! permutation of the nodes maps one onto the other. [`RefinementSearch`]
//! finds the orbits with the classic individualization–refinement scheme:
//!
//! 1. Refine the input coloring until it is equitable (every node of a color
//!    class sees the same multiset of neighbor colors). Nodes in different
//!    classes can never share an orbit.
//! 2. Inside each class, try to map a known orbit representative onto each
//!    remaining candidate. Both sides are individualized and refined jointly;
//!    when refinement leaves non-singleton cells, one node of the first such
//!    cell is individualized against every partner in turn (backtracking).
//! 3. A discrete joint coloring defines a permutation; it is kept only if it
//!    preserves every edge. Each automorphism found merges the orbits of
//!    `i` and `σ(i)` for all `i`.
//!
//! The search is exponential in the worst case (strongly regular graphs and
//! friends) and has no runtime bound.

use crate::coarsen::disjoint_sets;
use petgraph::unionfind::UnionFind;
use std::collections::BTreeMap;

/// Adjacency + colors in → orbit labels out.
pub trait AutomorphismSolver {
    /// Orbit label per node, numbered `0..` by each orbit's smallest member.
    ///
    /// `adj` holds sorted neighbor lists without self-loops; `colors` has one
    /// entry per node and only nodes of equal color may be exchanged.
    fn orbits(&self, adj: &[Vec<usize>], colors: &[usize]) -> Vec<usize>;
}

/// Color refinement plus backtracking search for automorphisms.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefinementSearch;

type Signature = (usize, Vec<usize>);

impl AutomorphismSolver for RefinementSearch {
    fn orbits(&self, adj: &[Vec<usize>], colors: &[usize]) -> Vec<usize> {
        let n = adj.len();
        let mut base: Vec<usize> = (0..n).map(|v| colors.get(v).copied().unwrap_or(0)).collect();
        let mut mirror = base.clone();
        // Refining a coloring against itself cannot fail.
        let _ = refine_pair(adj, &mut base, &mut mirror);

        let mut cells: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (v, &c) in base.iter().enumerate() {
            cells.entry(c).or_default().push(v);
        }

        let mut orbits = UnionFind::new(n);
        for cell in cells.values().filter(|cell| cell.len() > 1) {
            let mut reps: Vec<usize> = Vec::new();
            for &v in cell {
                if reps.iter().any(|&r| orbits.find_mut(r) == orbits.find_mut(v)) {
                    continue;
                }
                let mut found = false;
                for &r in &reps {
                    let mut left = base.clone();
                    let mut right = base.clone();
                    left[r] = cell_count(&base);
                    right[v] = left[r];
                    if let Some(perm) = search(adj, left, right) {
                        for (i, &j) in perm.iter().enumerate() {
                            orbits.union(i, j);
                        }
                        found = true;
                        break;
                    }
                }
                if !found {
                    reps.push(v);
                }
            }
        }

        let mut labels = vec![0; n];
        for (k, orbit) in disjoint_sets(orbits).into_iter().enumerate() {
            for v in orbit {
                labels[v] = k;
            }
        }
        labels
    }
}

fn cell_count(colors: &[usize]) -> usize {
    colors.iter().max().map_or(0, |&m| m + 1)
}

/// Jointly refine two colorings of the same graph to a stable state.
///
/// Equal signatures get equal colors on both sides. Returns `false` as soon
/// as the two sides have different color histograms, i.e. no color-preserving
/// isomorphism between them exists.
fn refine_pair(adj: &[Vec<usize>], left: &mut Vec<usize>, right: &mut Vec<usize>) -> bool {
    let signature = |colors: &[usize], v: usize| -> Signature {
        let mut seen: Vec<usize> = adj[v].iter().map(|&u| colors[u]).collect();
        seen.sort_unstable();
        (colors[v], seen)
    };

    let mut classes: Option<usize> = None;
    loop {
        let sig_left: Vec<Signature> = (0..adj.len()).map(|v| signature(left, v)).collect();
        let sig_right: Vec<Signature> = (0..adj.len()).map(|v| signature(right, v)).collect();

        let mut rank: BTreeMap<&Signature, usize> = BTreeMap::new();
        for s in sig_left.iter().chain(&sig_right) {
            let _ = rank.insert(s, 0);
        }
        for (i, r) in rank.values_mut().enumerate() {
            *r = i;
        }

        let next_left: Vec<usize> = sig_left.iter().map(|s| rank[s]).collect();
        let next_right: Vec<usize> = sig_right.iter().map(|s| rank[s]).collect();
        if histogram(&next_left, rank.len()) != histogram(&next_right, rank.len()) {
            return false;
        }

        *left = next_left;
        *right = next_right;
        if classes == Some(rank.len()) {
            return true;
        }
        classes = Some(rank.len());
    }
}

fn histogram(colors: &[usize], k: usize) -> Vec<usize> {
    let mut counts = vec![0; k];
    for &c in colors {
        counts[c] += 1;
    }
    counts
}

/// Find a permutation mapping the `left` coloring onto the `right` one.
fn search(adj: &[Vec<usize>], mut left: Vec<usize>, mut right: Vec<usize>) -> Option<Vec<usize>> {
    if !refine_pair(adj, &mut left, &mut right) {
        return None;
    }
    let k = cell_count(&left);
    let sizes = histogram(&left, k);

    let Some(target) = (0..k).find(|&c| sizes[c] > 1) else {
        let mut node_of = vec![0; k];
        for (v, &c) in right.iter().enumerate() {
            node_of[c] = v;
        }
        let perm: Vec<usize> = left.iter().map(|&c| node_of[c]).collect();
        return preserves_edges(adj, &perm).then_some(perm);
    };

    let x = left.iter().position(|&c| c == target)?;
    for y in (0..right.len()).filter(|&y| right[y] == target) {
        let mut l = left.clone();
        let mut r = right.clone();
        l[x] = k;
        r[y] = k;
        if let Some(perm) = search(adj, l, r) {
            return Some(perm);
        }
    }
    None
}

fn preserves_edges(adj: &[Vec<usize>], perm: &[usize]) -> bool {
    adj.iter().enumerate().all(|(u, neighbors)| {
        neighbors
            .iter()
            .all(|&v| adj[perm[u]].binary_search(&perm[v]).is_ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); n];
        for &(u, v) in edges {
            adj[u].push(v);
            adj[v].push(u);
        }
        for list in &mut adj {
            list.sort_unstable();
        }
        adj
    }

    #[test]
    fn test_cycle_is_vertex_transitive() {
        let adj = adjacency(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]);
        assert_eq!(RefinementSearch.orbits(&adj, &[0; 6]), vec![0; 6]);
    }

    #[test]
    fn test_path_reflection() {
        let adj = adjacency(4, &[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(RefinementSearch.orbits(&adj, &[0; 4]), vec![0, 1, 1, 0]);
    }

    #[test]
    fn test_regular_but_not_transitive() {
        // Triangle plus square: refinement alone sees one class of degree-2 nodes.
        let adj = adjacency(
            7,
            &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 6), (6, 3)],
        );
        assert_eq!(RefinementSearch.orbits(&adj, &[0; 7]), vec![0, 0, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_colors_restrict_orbits() {
        let adj = adjacency(3, &[(0, 1), (1, 2), (2, 0)]);
        assert_eq!(RefinementSearch.orbits(&adj, &[1, 0, 0]), vec![0, 1, 1]);
    }

    #[test]
    fn test_refinement_rejects_mismatched_sides() {
        let adj = adjacency(3, &[(0, 1), (1, 2)]);
        // End node against middle node.
        let mut left = vec![1, 0, 0];
        let mut right = vec![0, 1, 0];
        assert!(!refine_pair(&adj, &mut left, &mut right));
    }
}
