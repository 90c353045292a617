use std::cmp::Ordering;

/// Orders candidates by score descending, then by original index ascending.
///
/// NaN sorts below every other score so a broken output never outranks a real one.
fn rank_order(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    let key = |score: f32| if score.is_nan() { f32::NEG_INFINITY } else { score };
    key(b.1)
        .total_cmp(&key(a.1))
        .then_with(|| a.0.cmp(&b.0))
}

/// Selects the `k` highest scores and returns them as `(index, score)` pairs,
/// highest first.
///
/// `k` is clamped to the number of scores and `k == 0` yields an empty result.
/// Equal scores keep their original index order, so identical inputs always
/// produce identical rankings.
///
/// The k largest are found with a partition in expected linear time; only that
/// prefix is sorted.
///
/// # Example
/// ```
/// use medpredict::select_top_k;
///
/// let top = select_top_k(&[0.1, 0.7, 0.2, 0.7], 3);
/// assert_eq!(top, vec![(1, 0.7), (3, 0.7), (2, 0.2)]);
/// ```
pub fn select_top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let k = k.min(scores.len());
    if k == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    if k < candidates.len() {
        candidates.select_nth_unstable_by(k - 1, rank_order);
        candidates.truncate(k);
    }
    candidates.sort_unstable_by(rank_order);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_is_clamped() {
        let scores = [0.3, 0.1, 0.9];
        assert_eq!(select_top_k(&scores, 2).len(), 2);
        assert_eq!(select_top_k(&scores, 3).len(), 3);
        assert_eq!(select_top_k(&scores, 10).len(), 3);
        assert!(select_top_k(&scores, 0).is_empty());
        assert!(select_top_k(&[], 3).is_empty());
    }

    #[test]
    fn test_descending_order() {
        let scores = [0.05, 0.4, 0.15, 0.3, 0.1];
        let top = select_top_k(&scores, 3);
        assert_eq!(top, vec![(1, 0.4), (3, 0.3), (2, 0.15)]);
    }

    #[test]
    fn test_ties_keep_index_order() {
        let scores = [0.5, 0.2, 0.5, 0.5, 0.2];
        let top = select_top_k(&scores, 4);
        let indices: Vec<usize> = top.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let scores: Vec<f32> = (0..200).map(|i| ((i * 37) % 11) as f32 / 10.0).collect();
        let first = select_top_k(&scores, 17);
        for _ in 0..20 {
            let again = select_top_k(&scores, 17);
            assert_eq!(first.len(), again.len());
            for (a, b) in first.iter().zip(again.iter()) {
                assert_eq!(a.0, b.0);
                assert_eq!(a.1.to_bits(), b.1.to_bits());
            }
        }
    }

    #[test]
    fn test_scores_are_non_increasing() {
        let scores: Vec<f32> = (0..64).map(|i| ((i * 53) % 29) as f32 - 14.0).collect();
        for k in 0..=scores.len() + 2 {
            let top = select_top_k(&scores, k);
            assert_eq!(top.len(), k.min(scores.len()));
            assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        }
    }

    #[test]
    fn test_nan_ranks_last() {
        let scores = [f32::NAN, 0.2, 0.1];
        let top = select_top_k(&scores, 2);
        let indices: Vec<usize> = top.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 2]);
    }
}
