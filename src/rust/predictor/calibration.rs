/// Converts ranked scores into confidences.
///
/// If every score already lies in [0, 1] the scores are treated as probabilities
/// and returned unchanged, without renormalizing. Otherwise a numerically stable
/// softmax is applied (the maximum is subtracted before exponentiating). When
/// every exponential underflows the result falls back to a uniform distribution.
///
/// # Example
/// ```
/// use medpredict::normalize_confidence;
///
/// assert_eq!(normalize_confidence(&[0.6, 0.3]), vec![0.6f32 as f64, 0.3f32 as f64]);
///
/// let probs = normalize_confidence(&[4.0, 4.0]);
/// assert!((probs[0] - 0.5).abs() < 1e-12);
/// ```
pub fn normalize_confidence(scores: &[f32]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }

    let bounded = scores.iter().all(|&s| (0.0..=1.0).contains(&s));
    if bounded {
        if scores.len() == 1 {
            return vec![1.0];
        }
        return scores.iter().map(|&s| s as f64).collect();
    }

    softmax(scores)
}

fn softmax(scores: &[f32]) -> Vec<f64> {
    let uniform = || vec![1.0 / scores.len() as f64; scores.len()];

    let max = scores
        .iter()
        .map(|&s| s as f64)
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return uniform();
    }

    let exps: Vec<f64> = scores.iter().map(|&s| (s as f64 - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return uniform();
    }

    exps.into_iter().map(|e| e / total).collect()
}

/// Renders a confidence in [0, 1] as a percentage rounded to two decimals
pub fn to_percent(confidence: f64) -> f64 {
    (confidence * 100.0 * 100.0).round() / 100.0
}
