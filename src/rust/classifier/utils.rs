use ndarray::Array1;

/// True when `values` already look like a probability distribution.
pub(crate) fn is_probability_distribution(values: &Array1<f32>) -> bool {
    if values.is_empty() || values.iter().any(|&x| !(0.0..=1.0).contains(&x)) {
        return false;
    }
    (values.sum() - 1.0).abs() < 1e-3
}

/// Non-finite scores yield non-finite probabilities rather than a made-up distribution.
pub(crate) fn softmax(values: &Array1<f32>) -> Array1<f32> {
    if values.is_empty() {
        return Array1::zeros(0);
    }
    let max = values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps = values.mapv(|x| (x - max).exp());
    let sum = exps.sum();
    if sum.is_nan() || sum > 1e-10 {
        exps / sum
    } else {
        Array1::from_elem(values.len(), 1.0 / values.len() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&array![2.0, -1.0, 0.5]);
        assert!((probs.sum() - 1.0).abs() < 1e-6);
        assert!(probs[0] > probs[2] && probs[2] > probs[1]);
    }

    #[test]
    fn test_softmax_keeps_nan() {
        let probs = softmax(&array![f32::NAN, 1.0]);
        assert!(probs.iter().any(|p| p.is_nan()));

        let probs = softmax(&array![f32::INFINITY, 1.0]);
        assert!(probs.iter().any(|p| !p.is_finite()));
    }

    #[test]
    fn test_probability_detection() {
        assert!(is_probability_distribution(&array![0.93, 0.07]));
        assert!(!is_probability_distribution(&array![3.1, -0.4]));
        assert!(!is_probability_distribution(&array![0.2, 0.2]));
        assert!(!is_probability_distribution(&array![f32::NAN, 1.0]));
    }
}
