//! Scoring approximate search results against exact ground truth.

use std::collections::HashSet;

use crate::{
    error::{Error, Result},
    index::Neighbor,
};

/// Compute recall@k: the mean, over queries, of the fraction of true top-k
/// neighbors the approximate search recovered, rounded to three decimals.
///
/// `ground_truth[i]` and `approximate[i]` hold the stored-vector positions
/// returned for query `i`. Intersection uses set semantics, so duplicate
/// positions within a list count once; a list shorter than `k` simply
/// contributes fewer possible hits. The outer lists must be the same
/// length, `k` must be non-zero, and at least one query is required.
///
/// # Examples
///
/// ```
/// use passfind::eval::recall_at_k;
///
/// let gt = vec![vec![0, 1, 2]];
/// assert_eq!(recall_at_k(&gt, &[vec![0, 1, 2]], 3).unwrap(), 1.0);
/// assert_eq!(recall_at_k(&gt, &[vec![3, 4, 5]], 3).unwrap(), 0.0);
/// ```
pub fn recall_at_k(
    ground_truth: &[Vec<usize>],
    approximate: &[Vec<usize>],
    k: usize,
) -> Result<f64> {
    if k == 0 {
        return Err(Error::Config("recall@k requires k > 0".into()));
    }
    if ground_truth.len() != approximate.len() {
        return Err(Error::Config(format!(
            "ground truth has {} queries but approximate results have {}",
            ground_truth.len(),
            approximate.len()
        )));
    }
    if ground_truth.is_empty() {
        return Err(Error::Config(
            "recall@k requires at least one query".into(),
        ));
    }

    let total: f64 = ground_truth
        .iter()
        .zip(approximate)
        .map(|(gt, ann)| {
            let gt_set: HashSet<usize> = gt.iter().copied().collect();
            let hits = ann
                .iter()
                .copied()
                .collect::<HashSet<usize>>()
                .intersection(&gt_set)
                .count();
            hits as f64 / k as f64
        })
        .sum();

    Ok(round3(total / ground_truth.len() as f64))
}

/// Strip distances from batched search results, keeping only positions.
pub fn positions(results: &[Vec<Neighbor>]) -> Vec<Vec<usize>> {
    results
        .iter()
        .map(|hits| hits.iter().map(|n| n.position).collect())
        .collect()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
