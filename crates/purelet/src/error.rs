//! Error types for the trous-purelet crate.

use trous_wavelet::WaveletError;

/// Error type for all fallible operations in the trous-purelet crate.
///
/// Singular risk systems and degenerate threshold derivatives are not
/// errors; they are recovered and reported as
/// [`DenoiseDiagnostic`](crate::DenoiseDiagnostic)s.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DenoiseError {
    /// Wraps a [`WaveletError`] from the transform layer.
    #[error(transparent)]
    Wavelet(#[from] WaveletError),

    /// Returned when the noise variance is negative or non-finite.
    #[error("noise variance must be finite and non-negative, got {0}")]
    InvalidNoiseVariance(f64),

    /// Returned when the Poisson gain is negative or non-finite.
    #[error("poisson gain must be finite and non-negative, got {0}")]
    InvalidPoissonGain(f64),

    /// Returned when a Poisson gain is set but the operator kernels were
    /// measured without their correlation weights.
    #[error("level {level} ({band}) kernel has no correlation weights; measure with keep_weights")]
    MissingKernelWeights {
        /// First level whose kernels were needed.
        level: usize,
        /// Band name.
        band: &'static str,
    },

    /// Returned when a threshold parameter is out of range.
    #[error("invalid threshold parameters: {0}")]
    InvalidThreshold(String),
}
