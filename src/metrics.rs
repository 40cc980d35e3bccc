//! Partition agreement metrics.
//!
//! Compare two labelings of the same nodes. Label values are arbitrary; only
//! the induced grouping matters, so `[0, 0, 1]` and `[7, 7, 3]` agree fully.
//!
//! | Metric | Range | Best | Properties |
//! |--------|-------|------|------------|
//! | [`ami`] | ≤ 1 | 1 | Adjusted for chance, ≈ 0 for independent labelings |
//! | [`nmi`] | [0, 1] | 1 | Normalized, not chance-corrected |
//! | [`ari`] | [-1, 1] | 1 | Pair counting, adjusted for chance |
//! | [`partition_overlap`] | (0, 1] | 1 | Fraction of nodes agreeing under the best label matching |
//!
//! All four return `0.0` for empty input or labelings of different length.
//!
//! ```rust
//! use coarsen::metrics::{ami, ari, nmi};
//!
//! let a = [0, 0, 1, 1, 2, 2];
//! let b = [1, 1, 0, 0, 2, 2];
//! assert!((ami(&a, &b) - 1.0).abs() < 1e-12);
//! assert!((nmi(&a, &b) - 1.0).abs() < 1e-12);
//! assert!((ari(&a, &b) - 1.0).abs() < 1e-12);
//! ```
//!
//! # References
//!
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)
//! - Strehl & Ghosh (2002). "Cluster ensembles" (NMI)
//! - Vinh, Epps & Bailey (2010). "Information theoretic measures for
//!   clusterings comparison" (AMI)

use std::collections::BTreeMap;

/// Which agreement score the consistency test reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgreementScore {
    /// Adjusted mutual information.
    #[default]
    Ami,
    /// Normalized mutual information.
    Nmi,
    /// Adjusted Rand index.
    Ari,
    /// Maximum-overlap accuracy.
    PartitionOverlap,
}

impl AgreementScore {
    /// Score two labelings.
    pub fn score(self, a: &[usize], b: &[usize]) -> f64 {
        match self {
            AgreementScore::Ami => ami(a, b),
            AgreementScore::Nmi => nmi(a, b),
            AgreementScore::Ari => ari(a, b),
            AgreementScore::PartitionOverlap => partition_overlap(a, b),
        }
    }
}

/// Normalized Mutual Information.
///
/// ```text
/// NMI(U, V) = 2 * I(U; V) / (H(U) + H(V))
/// ```
///
/// Two constant labelings count as identical (1.0).
pub fn nmi(a: &[usize], b: &[usize]) -> f64 {
    let Some(table) = Contingency::new(a, b) else {
        return 0.0;
    };
    let denom = table.entropy_rows() + table.entropy_cols();
    if denom > 0.0 {
        2.0 * table.mutual_information() / denom
    } else {
        1.0
    }
}

/// Adjusted Mutual Information with arithmetic-mean normalization.
///
/// ```text
/// AMI(U, V) = (I(U; V) - E[I]) / ((H(U) + H(V)) / 2 - E[I])
/// ```
///
/// `E[I]` is the expected mutual information of two random labelings with the
/// same group sizes (hypergeometric model). Identical labelings score 1;
/// unrelated ones score around 0 and can go negative.
pub fn ami(a: &[usize], b: &[usize]) -> f64 {
    let Some(table) = Contingency::new(a, b) else {
        return 0.0;
    };

    // One group on both sides, or singletons on both sides: MI equals its expectation.
    let (r, c) = (table.rows.len(), table.cols.len());
    if (r == 1 && c == 1) || (r == table.n && c == table.n) {
        return 1.0;
    }

    let mi = table.mutual_information();
    let emi = table.expected_mutual_information();
    let normalizer = 0.5 * (table.entropy_rows() + table.entropy_cols());

    let mut denom = normalizer - emi;
    if denom < 0.0 {
        denom = denom.min(-f64::EPSILON);
    } else {
        denom = denom.max(f64::EPSILON);
    }
    (mi - emi) / denom
}

/// Adjusted Rand Index.
///
/// ARI score in [-1, 1]. Higher is better. 0 = random, 1 = perfect.
pub fn ari(a: &[usize], b: &[usize]) -> f64 {
    let Some(table) = Contingency::new(a, b) else {
        return 0.0;
    };

    let sum_comb_ij: f64 = table.cells.values().map(|&c| comb2(c)).sum();
    let sum_comb_a: f64 = table.rows.values().map(|&c| comb2(c)).sum();
    let sum_comb_b: f64 = table.cols.values().map(|&c| comb2(c)).sum();
    let comb_n = comb2(table.n);

    if comb_n == 0.0 {
        return 1.0;
    }

    // ARI = (index - expected) / (max - expected)
    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;

    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        return 1.0;
    }
    (sum_comb_ij - expected) / denom
}

/// Maximum overlap between two labelings.
///
/// Labels of `a` are matched one-to-one with labels of `b` so that the most
/// nodes agree; the score is that count over `n`. Unmatched labels count as
/// disagreement.
pub fn partition_overlap(a: &[usize], b: &[usize]) -> f64 {
    let Some(table) = Contingency::new(a, b) else {
        return 0.0;
    };
    let rows: Vec<usize> = table.rows.keys().copied().collect();
    let cols: Vec<usize> = table.cols.keys().copied().collect();
    let overlap: Vec<Vec<f64>> = rows
        .iter()
        .map(|&x| {
            cols.iter()
                .map(|&y| table.cells.get(&(x, y)).copied().unwrap_or(0) as f64)
                .collect()
        })
        .collect();
    max_weight_matching(&overlap) / table.n as f64
}

/// Total weight of the heaviest one-to-one row/column matching.
///
/// Kuhn-Munkres with row and column potentials on the negated weights,
/// padded to a square matrix with zeros.
fn max_weight_matching(weights: &[Vec<f64>]) -> f64 {
    let n_rows = weights.len();
    let n_cols = weights.first().map_or(0, Vec::len);
    let n = n_rows.max(n_cols);
    if n == 0 {
        return 0.0;
    }
    let cost = |i: usize, j: usize| -> f64 {
        -weights
            .get(i)
            .and_then(|row| row.get(j))
            .copied()
            .unwrap_or(0.0)
    };

    // 1-indexed; column 0 is the virtual source.
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; n + 1];
    let mut owner = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        owner[0] = i;
        let mut j0 = 0;
        let mut min_val = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];
        loop {
            used[j0] = true;
            let i0 = owner[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost(i0 - 1, j - 1) - u[i0] - v[j];
                if reduced < min_val[j] {
                    min_val[j] = reduced;
                    way[j] = j0;
                }
                if min_val[j] < delta {
                    delta = min_val[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_val[j] -= delta;
                }
            }
            j0 = j1;
            if owner[j0] == 0 {
                break;
            }
        }
        loop {
            let prev = way[j0];
            owner[j0] = owner[prev];
            j0 = prev;
            if j0 == 0 {
                break;
            }
        }
    }

    (1..=n)
        .filter(|&j| owner[j] > 0)
        .map(|j| -cost(owner[j] - 1, j - 1))
        .sum()
}

/// Joint and marginal label counts.
struct Contingency {
    cells: BTreeMap<(usize, usize), usize>,
    rows: BTreeMap<usize, usize>,
    cols: BTreeMap<usize, usize>,
    n: usize,
}

impl Contingency {
    fn new(a: &[usize], b: &[usize]) -> Option<Self> {
        if a.len() != b.len() || a.is_empty() {
            return None;
        }
        let mut cells = BTreeMap::new();
        let mut rows = BTreeMap::new();
        let mut cols = BTreeMap::new();
        for (&x, &y) in a.iter().zip(b) {
            *cells.entry((x, y)).or_insert(0) += 1;
            *rows.entry(x).or_insert(0) += 1;
            *cols.entry(y).or_insert(0) += 1;
        }
        Some(Self {
            cells,
            rows,
            cols,
            n: a.len(),
        })
    }

    fn entropy_rows(&self) -> f64 {
        entropy(self.rows.values().copied(), self.n)
    }

    fn entropy_cols(&self) -> f64 {
        entropy(self.cols.values().copied(), self.n)
    }

    fn mutual_information(&self) -> f64 {
        let n = self.n as f64;
        let mut mi = 0.0;
        for (&(x, y), &count) in &self.cells {
            let p_joint = count as f64 / n;
            let p_x = self.rows[&x] as f64 / n;
            let p_y = self.cols[&y] as f64 / n;
            mi += p_joint * (p_joint / (p_x * p_y)).ln();
        }
        mi.max(0.0)
    }

    /// Expected mutual information under the hypergeometric model.
    fn expected_mutual_information(&self) -> f64 {
        let n = self.n;
        let nf = n as f64;
        let log_fact = log_factorials(n);

        let mut emi = 0.0;
        for &a in self.rows.values() {
            for &b in self.cols.values() {
                let lo = (a + b).saturating_sub(n).max(1);
                let hi = a.min(b);
                // Terms shared by every n_ij in range.
                let fixed = log_fact[a] + log_fact[b] + log_fact[n - a] + log_fact[n - b]
                    - log_fact[n];
                for nij in lo..=hi {
                    let nijf = nij as f64;
                    let term = nijf / nf * (nf * nijf / (a as f64 * b as f64)).ln();
                    let log_p = fixed
                        - log_fact[nij]
                        - log_fact[a - nij]
                        - log_fact[b - nij]
                        - log_fact[n + nij - a - b];
                    emi += term * log_p.exp();
                }
            }
        }
        emi
    }
}

fn entropy(counts: impl Iterator<Item = usize>, n: usize) -> f64 {
    let n = n as f64;
    counts
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / n;
            -p * p.ln()
        })
        .sum()
}

/// `ln(k!)` for `k = 0..=n`.
fn log_factorials(n: usize) -> Vec<f64> {
    let mut table = Vec::with_capacity(n + 1);
    table.push(0.0);
    for k in 1..=n {
        let prev = table[k - 1];
        table.push(prev + (k as f64).ln());
    }
    table
}

fn comb2(n: usize) -> f64 {
    if n < 2 {
        0.0
    } else {
        (n * (n - 1) / 2) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_nmi_permuted() {
        let a = [1, 1, 0, 0, 2, 2];
        let b = [0, 0, 1, 1, 2, 2];
        assert!((nmi(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ari_perfect() {
        assert!((ari(&[0, 0, 1, 1], &[0, 0, 1, 1]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ami_reference_value() {
        // sklearn: adjusted_mutual_info_score([0,0,1,1], [0,0,1,2]) = 0.5714285714...
        let score = ami(&[0, 0, 1, 1], &[0, 0, 1, 2]);
        assert!((score - 4.0 / 7.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_ami_independent_is_negative() {
        // Every row meets every column exactly once: zero observed MI.
        let a = [0, 0, 1, 1];
        let b = [0, 1, 0, 1];
        assert!((ami(&a, &b) + 0.5).abs() < 1e-9);
        assert!(nmi(&a, &b).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(ami(&[], &[]), 0.0);
        assert_eq!(nmi(&[0, 1], &[0]), 0.0);
        assert_eq!(ami(&[3, 3, 3], &[5, 5, 5]), 1.0);
        assert_eq!(ami(&[0, 1, 2], &[2, 0, 1]), 1.0);
        assert_eq!(AgreementScore::default(), AgreementScore::Ami);
    }

    #[test]
    fn test_expected_mi_matches_enumeration() {
        // Brute force over all relabelings of b for n = 5.
        let a = [0, 0, 0, 1, 1];
        let b = [0, 0, 1, 1, 1];
        let table = Contingency::new(&a, &b).unwrap();

        let mut perms: Vec<Vec<usize>> = vec![vec![]];
        for _ in 0..5 {
            let mut next = Vec::new();
            for p in &perms {
                for i in 0..5 {
                    if !p.contains(&i) {
                        let mut q = p.clone();
                        q.push(i);
                        next.push(q);
                    }
                }
            }
            perms = next;
        }
        let mean: f64 = perms
            .iter()
            .map(|p| {
                let shuffled: Vec<usize> = p.iter().map(|&i| b[i]).collect();
                Contingency::new(&a, &shuffled).unwrap().mutual_information()
            })
            .sum::<f64>()
            / perms.len() as f64;

        assert!((table.expected_mutual_information() - mean).abs() < 1e-10);
    }

    #[test]
    fn test_partition_overlap_matches_labels() {
        assert_eq!(partition_overlap(&[0, 0, 1, 1], &[5, 5, 3, 3]), 1.0);
        // Best matching 0↔0, 1↔1 agrees on 4 of 6.
        let score = partition_overlap(&[0, 0, 0, 1, 1, 1], &[0, 0, 1, 1, 1, 0]);
        assert!((score - 4.0 / 6.0).abs() < 1e-12);
        // Extra labels in b stay unmatched.
        let score = partition_overlap(&[0, 0, 0, 0], &[0, 0, 1, 2]);
        assert!((score - 0.5).abs() < 1e-12);
        assert_eq!(partition_overlap(&[], &[]), 0.0);
        assert_eq!(
            AgreementScore::PartitionOverlap.score(&[1, 2], &[2, 1]),
            1.0
        );
    }

    #[test]
    fn test_matching_beats_greedy_choice() {
        // Greedy picks 5 then 0; the optimum pairs 4 + 4.
        let weights = vec![vec![5.0, 4.0], vec![4.0, 0.0]];
        assert!((max_weight_matching(&weights) - 8.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_overlap_bounded_by_one(
            pair in prop::collection::vec((0usize..4, 0usize..4), 1..30)
        ) {
            let (a, b): (Vec<usize>, Vec<usize>) = pair.into_iter().unzip();
            let score = partition_overlap(&a, &b);
            prop_assert!(score > 0.0 && score <= 1.0 + 1e-12);
            prop_assert!((score - partition_overlap(&b, &a)).abs() < 1e-9);
        }

        #[test]
        fn prop_relabeling_keeps_ami_at_one(labels in prop::collection::vec(0usize..4, 2..40)) {
            let relabeled: Vec<usize> = labels.iter().map(|&l| 10 - l).collect();
            prop_assert!((ami(&labels, &relabeled) - 1.0).abs() < 1e-9);
        }

        #[test]
        fn prop_scores_are_symmetric(
            pair in prop::collection::vec((0usize..3, 0usize..3), 2..30)
        ) {
            let (a, b): (Vec<usize>, Vec<usize>) = pair.into_iter().unzip();
            prop_assert!((ami(&a, &b) - ami(&b, &a)).abs() < 1e-9);
            prop_assert!((nmi(&a, &b) - nmi(&b, &a)).abs() < 1e-9);
            prop_assert!((ari(&a, &b) - ari(&b, &a)).abs() < 1e-9);
        }
    }
}
