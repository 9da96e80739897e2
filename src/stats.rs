//! Two-sample Kolmogorov–Smirnov test used by drift detection.

/// Result of a two-sample KS test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsTest {
    pub statistic: f64,
    pub p_value: f64,
}

/// Two-sided two-sample KS test with the asymptotic p-value.
///
/// Returns `None` when either sample is empty. NaN values must be filtered
/// by the caller.
pub fn ks_2samp(sample_a: &[f64], sample_b: &[f64]) -> Option<KsTest> {
    if sample_a.is_empty() || sample_b.is_empty() {
        return None;
    }

    let mut a = sample_a.to_vec();
    let mut b = sample_b.to_vec();
    a.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
    b.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));

    let (n_a, n_b) = (a.len(), b.len());
    let mut i = 0;
    let mut j = 0;
    let mut statistic: f64 = 0.0;
    while i < n_a && j < n_b {
        let value = a[i].min(b[j]);
        while i < n_a && a[i] <= value {
            i += 1;
        }
        while j < n_b && b[j] <= value {
            j += 1;
        }
        let cdf_a = i as f64 / n_a as f64;
        let cdf_b = j as f64 / n_b as f64;
        statistic = statistic.max((cdf_a - cdf_b).abs());
    }

    let en = ((n_a as f64 * n_b as f64) / (n_a + n_b) as f64).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * statistic;
    let p_value = kolmogorov_sf(lambda).clamp(0.0, 1.0);

    Some(KsTest { statistic, p_value })
}

/// Survival function of the Kolmogorov distribution,
/// `Q(λ) = 2 Σ_{j≥1} (-1)^{j-1} exp(-2 j² λ²)`.
fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let a2 = -2.0 * lambda * lambda;
    let mut sign = 1.0;
    let mut sum = 0.0;
    let mut previous_term = 0.0_f64;
    for j in 1..=100 {
        let term = sign * 2.0 * (a2 * (j * j) as f64).exp();
        sum += term;
        if term.abs() <= 0.001 * previous_term || term.abs() <= 1e-10 * sum.abs() {
            return sum;
        }
        sign = -sign;
        previous_term = term.abs();
    }
    // Series failed to converge; no decision possible.
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_samples_have_high_p() {
        let sample: Vec<f64> = (0..200).map(|i| (i % 17) as f64 * 0.3).collect();
        let result = ks_2samp(&sample, &sample).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert!(result.p_value >= 0.999);
    }

    #[test]
    fn test_disjoint_samples_have_tiny_p() {
        let low: Vec<f64> = (0..150).map(|i| i as f64 / 150.0).collect();
        let high: Vec<f64> = (0..150).map(|i| 100.0 + i as f64 / 150.0).collect();
        let result = ks_2samp(&low, &high).unwrap();
        assert_eq!(result.statistic, 1.0);
        assert!(result.p_value < 1e-6);
    }

    #[test]
    fn test_same_distribution_two_draws() {
        // Two interleaved halves of the same grid: close CDFs, no drift.
        let a: Vec<f64> = (0..500).map(|i| (2 * i) as f64).collect();
        let b: Vec<f64> = (0..500).map(|i| (2 * i + 1) as f64).collect();
        let result = ks_2samp(&a, &b).unwrap();
        assert!(result.p_value >= 0.05, "p = {}", result.p_value);
    }

    #[test]
    fn test_empty_sample_is_none() {
        assert!(ks_2samp(&[], &[1.0]).is_none());
        assert!(ks_2samp(&[1.0], &[]).is_none());
    }
}
