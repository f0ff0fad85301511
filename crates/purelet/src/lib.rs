//! # trous-purelet
//!
//! PURE-LET denoising on top of the undecimated wavelet pyramid. Every level
//! contributes a plain and a thresholded candidate image; their weights
//! minimise an unbiased estimate of the mean squared error under a
//! Poisson-Gaussian noise model, so no clean reference is needed.
//!
//! ## Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["Image"] -->|"decompose"| B["PyramidTransform"]
//!     B -->|"OperatorKernels::measure"| C["kernels"]
//!     B -->|"estimate_noise_variance"| D["sigma^2"]
//!     B --> E["PureLetSolver::solve"]
//!     C --> E
//!     D --> E
//!     E --> F["Denoised"]
//! ```
//!
//! ## Level Modes
//!
//! | Mode | Weights | When |
//! |------|---------|------|
//! | [`LevelMode::Suppressed`] | `(0, 0)` | level below the threshold cutoff |
//! | [`LevelMode::Identity`] | `(1, 0)` | `identity_only`, or noise-free input |
//! | [`LevelMode::Free`] | solved | otherwise |
//!
//! ## Quick Start
//!
//! ```ignore
//! use trous_purelet::{DenoiseConfig, denoise};
//! use trous_wavelet::{Image, TransformConfig, WaveletFilter};
//!
//! let img = Image::new(noisy)?;
//! let config = DenoiseConfig::new(TransformConfig::new().with_wavelet(WaveletFilter::Db2))
//!     .with_noise_variance(4.0);
//! let result = denoise(&img, &config)?;
//! let clean = result.into_image();
//! ```

mod config;
mod error;
mod kernels;
mod noise;
mod solver;
mod threshold;

use tracing::info;
use trous_wavelet::{Image, decompose};

pub use config::DenoiseConfig;
pub use error::DenoiseError;
pub use kernels::{BandKernel, LevelKernels, OperatorKernels};
pub use noise::estimate_noise_variance;
pub use solver::{DenoiseDiagnostic, Denoised, LevelMode, LevelWeights, PureLetSolver};
pub use threshold::{ThresholdDerivatives, ThresholdParameters, VARIANCE_FLOOR};

/// Denoises `image`.
///
/// The image is decomposed with `config.transform()`, the noise variance is
/// taken from the configuration or estimated from the finest diagonal band,
/// and the per-level weights are solved. The result is always at the source
/// resolution.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`DenoiseError::Wavelet`] | invalid transform configuration |
/// | [`DenoiseError::InvalidNoiseVariance`] | negative or non-finite variance |
/// | [`DenoiseError::InvalidPoissonGain`] | negative or non-finite gain |
/// | [`DenoiseError::InvalidThreshold`] | bad threshold shape |
#[tracing::instrument(
    skip_all,
    fields(
        rows = image.shape().0,
        cols = image.shape().1,
        wavelet = config.transform().wavelet().name()
    )
)]
pub fn denoise(image: &Image, config: &DenoiseConfig) -> Result<Denoised, DenoiseError> {
    config.validate()?;
    let pyramid = decompose(image, config.transform())?;
    let kernels = OperatorKernels::measure(
        pyramid.filter_bank(),
        pyramid.engine(),
        pyramid.shape(),
        pyramid.n_levels(),
        config.poisson_gain() > 0.0,
    )?;
    let noise_variance = match config.noise_variance() {
        Some(v) => v,
        None => estimate_noise_variance(&pyramid, &kernels),
    };

    let solver = PureLetSolver::new(noise_variance, config.poisson_gain())
        .with_threshold_cutoff(config.threshold_cutoff().unwrap_or(0))
        .with_identity_only(config.identity_only())
        .with_threshold_shape(*config.threshold_shape());
    let result = solver.solve(image, &pyramid, &kernels)?;
    info!(
        levels = pyramid.n_levels(),
        noise_variance,
        diagnostics = result.diagnostics().len(),
        "denoising complete"
    );
    Ok(result)
}
