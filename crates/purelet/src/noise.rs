//! Robust noise estimation from the finest detail band.

use tracing::debug;
use trous_wavelet::PyramidTransform;

use crate::kernels::OperatorKernels;

/// Estimates the pixel-domain Gaussian noise variance of the image behind
/// `pyramid`.
///
/// The finest diagonal band is dominated by noise, so its spread is measured
/// with the median absolute value (`sigma = median(|D_0|) / 0.6745`) and
/// mapped back through the energy of the level-0 diagonal analysis filter.
/// Returns 0.0 for a pyramid without levels.
pub fn estimate_noise_variance(pyramid: &PyramidTransform, kernels: &OperatorKernels) -> f64 {
    let (Some(level), Some(kernel)) = (
        pyramid.level(0),
        kernels.level(0).and_then(|l| l.band(trous_wavelet::Band::Diagonal)),
    ) else {
        return 0.0;
    };
    let coeffs: Vec<f64> = level.diagonal().iter().copied().collect();
    let sigma = trous_stats::mad_sigma(&coeffs);
    let energy = kernel.energy();
    if energy <= 0.0 {
        return 0.0;
    }
    let variance = sigma * sigma / energy;
    debug!(sigma, energy, variance, "noise variance estimated");
    variance
}
