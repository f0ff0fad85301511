//! Statistical helper functions shared by the trous crates.

/// Consistency constant turning a Gaussian median absolute deviation into a
/// standard deviation (`Phi^{-1}(0.75)`).
pub const MAD_GAUSSIAN: f64 = 0.6745;

/// Mean squared difference between two equally long slices.
///
/// # Panics
///
/// Panics if the slices differ in length.
pub fn mse(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "mse: slices must have equal length");
    if a.is_empty() {
        return 0.0;
    }
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>() / a.len() as f64
}

/// Median of pre-sorted data. For even length, averages the middle two values.
///
/// # Panics
///
/// Panics if `sorted` is empty.
pub fn median(sorted: &[f64]) -> f64 {
    assert!(!sorted.is_empty(), "median: input must not be empty");
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Robust standard deviation of zero-mean data: `median(|x|) / 0.6745`.
///
/// This is the Donoho-Johnstone estimator used on fine-scale wavelet detail
/// coefficients, where the signal is sparse and the noise dominates.
/// Non-finite values are skipped. Returns 0.0 if nothing finite remains.
pub fn mad_sigma(data: &[f64]) -> f64 {
    let mut abs: Vec<f64> = data
        .iter()
        .filter(|x| x.is_finite())
        .map(|x| x.abs())
        .collect();
    if abs.is_empty() {
        return 0.0;
    }
    abs.sort_by(|a, b| a.total_cmp(b));
    median(&abs) / MAD_GAUSSIAN
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mse() {
        assert_relative_eq!(mse(&[1.0, 2.0, 3.0], &[1.0, 4.0, 0.0]), 13.0 / 3.0);
        assert_eq!(mse(&[], &[]), 0.0);
    }

    #[test]
    #[should_panic(expected = "equal length")]
    fn test_mse_length_mismatch() {
        mse(&[1.0], &[1.0, 2.0]);
    }

    #[test]
    fn test_median_odd() {
        assert_relative_eq!(median(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_median_even() {
        assert_relative_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn test_median_empty() {
        median(&[]);
    }

    #[test]
    fn test_mad_sigma_symmetric() {
        // median(|x|) = 0.6745 -> sigma = 1
        let data = [-0.6745, 0.6745, -0.1, 0.1, 2.0, -2.0, 0.6745];
        assert_relative_eq!(mad_sigma(&data), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mad_sigma_skips_non_finite() {
        let data = [f64::NAN, 0.6745, f64::INFINITY];
        assert_relative_eq!(mad_sigma(&data), 1.0, epsilon = 1e-12);
        assert_eq!(mad_sigma(&[f64::NAN]), 0.0);
        assert_eq!(mad_sigma(&[]), 0.0);
    }
}
