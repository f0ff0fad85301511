//! Denoising configuration.

use trous_wavelet::TransformConfig;

use crate::error::DenoiseError;
use crate::threshold::ThresholdParameters;

/// Configuration for [`denoise`](crate::denoise).
///
/// # Example
///
/// ```ignore
/// use trous_purelet::DenoiseConfig;
/// use trous_wavelet::{TransformConfig, WaveletFilter};
///
/// let transform = TransformConfig::new().with_wavelet(WaveletFilter::Db2).with_levels(4);
/// let config = DenoiseConfig::new(transform)
///     .with_noise_variance(2.5)
///     .with_threshold_cutoff(1);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DenoiseConfig {
    transform: TransformConfig,
    noise_variance: Option<f64>,
    threshold_cutoff: Option<usize>,
    poisson_gain: f64,
    identity_only: bool,
    shape: ThresholdParameters,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self::new(TransformConfig::default())
    }
}

impl DenoiseConfig {
    /// Creates a configuration around a transform configuration.
    ///
    /// Defaults: `noise_variance = None` (estimated from the finest diagonal
    /// band), no threshold cutoff, `poisson_gain = 0` (pure Gaussian noise),
    /// weights solved rather than forced to identity, default threshold
    /// shape (see [`ThresholdParameters::new`]).
    pub fn new(transform: TransformConfig) -> Self {
        Self {
            transform,
            noise_variance: None,
            threshold_cutoff: None,
            poisson_gain: 0.0,
            identity_only: false,
            shape: ThresholdParameters::default(),
        }
    }

    /// Replaces the transform configuration.
    pub fn with_transform(mut self, transform: TransformConfig) -> Self {
        self.transform = transform;
        self
    }

    /// Fixes the pixel-domain Gaussian noise variance.
    pub fn with_noise_variance(mut self, variance: f64) -> Self {
        self.noise_variance = Some(variance);
        self
    }

    /// Sets or clears the noise variance.
    pub fn with_noise_variance_opt(mut self, variance: Option<f64>) -> Self {
        self.noise_variance = variance;
        self
    }

    /// Zeroes every level below `cutoff` (levels `0..cutoff`).
    pub fn with_threshold_cutoff(mut self, cutoff: usize) -> Self {
        self.threshold_cutoff = Some(cutoff);
        self
    }

    /// Sets or clears the threshold cutoff.
    pub fn with_threshold_cutoff_opt(mut self, cutoff: Option<usize>) -> Self {
        self.threshold_cutoff = cutoff;
        self
    }

    /// Sets the Poisson gain `alpha` of the noise model
    /// `y = alpha * Poisson(x / alpha) + N(0, sigma^2)`.
    pub fn with_poisson_gain(mut self, gain: f64) -> Self {
        self.poisson_gain = gain;
        self
    }

    /// Forces weights `(1, 0)` on every level: the output is the plain
    /// reconstruction (apart from any cutoff).
    pub fn with_identity_only(mut self, identity_only: bool) -> Self {
        self.identity_only = identity_only;
        self
    }

    /// Overrides the threshold shape (steepness, ratio, exponent). Variance
    /// and scale are filled in per band.
    pub fn with_threshold_shape(mut self, shape: ThresholdParameters) -> Self {
        self.shape = shape;
        self
    }

    /// Returns the transform configuration.
    pub fn transform(&self) -> &TransformConfig {
        &self.transform
    }

    /// Returns the fixed noise variance, if any.
    pub fn noise_variance(&self) -> Option<f64> {
        self.noise_variance
    }

    /// Returns the threshold cutoff, if any.
    pub fn threshold_cutoff(&self) -> Option<usize> {
        self.threshold_cutoff
    }

    /// Returns the Poisson gain.
    pub fn poisson_gain(&self) -> f64 {
        self.poisson_gain
    }

    /// Returns whether weights are forced to identity.
    pub fn identity_only(&self) -> bool {
        self.identity_only
    }

    /// Returns the threshold shape template.
    pub fn threshold_shape(&self) -> &ThresholdParameters {
        &self.shape
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`DenoiseError::Wavelet`] | the transform configuration is invalid |
    /// | [`DenoiseError::InvalidNoiseVariance`] | negative or non-finite variance |
    /// | [`DenoiseError::InvalidPoissonGain`] | negative or non-finite gain |
    /// | [`DenoiseError::InvalidThreshold`] | bad threshold shape |
    pub fn validate(&self) -> Result<(), DenoiseError> {
        self.transform.validate()?;
        if let Some(v) = self.noise_variance
            && (!v.is_finite() || v < 0.0)
        {
            return Err(DenoiseError::InvalidNoiseVariance(v));
        }
        if !self.poisson_gain.is_finite() || self.poisson_gain < 0.0 {
            return Err(DenoiseError::InvalidPoissonGain(self.poisson_gain));
        }
        self.shape.validate()
    }
}
