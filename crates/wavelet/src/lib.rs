//! # trous-wavelet
//!
//! Translation-invariant ("a trous", undecimated) 2-D wavelet transform.
//! Filters are dilated instead of the data being subsampled, so every subband
//! at every level keeps the source image's shape.
//!
//! ## Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["Image::new(array)?"] -->|"validate"| B["Image"]
//!     B -->|"decompose(&img, &config)?"| C["PyramidTransform"]
//!     C -->|"reconstruct(&pyramid, None)?"| D["Array2"]
//!     C --> E[".level(k).band(Band::Diagonal)"]
//!     C --> F[".component(k)?"]
//!     B -->|"Decomposer::step()"| G["DecompositionLevel"]
//! ```
//!
//! ## Engines
//!
//! | Engine | Method |
//! |--------|--------|
//! | [`Engine::Spatial`] | separable circular convolution, lane-parallel |
//! | [`Engine::Frequency`] | per-axis transfer functions on the unit circle, batched FFT |
//!
//! Both produce the same subbands to round-off; perfect reconstruction holds
//! for either.
//!
//! ## Supported Filters
//!
//! | Filter | Length | Family |
//! |--------|--------|--------|
//! | [`WaveletFilter::Haar`] | 2 | Haar (`db1`) |
//! | [`WaveletFilter::Db2`] | 4 | Daubechies |
//! | [`WaveletFilter::Db3`] | 6 | Daubechies |
//! | [`WaveletFilter::Db4`] | 8 | Daubechies |
//! | [`WaveletFilter::Sym4`] | 8 | Symlet |
//! | [`WaveletFilter::Coif1`] | 6 | Coiflet |
//!
//! Any other perfect-reconstruction bank can be supplied through
//! [`FilterPair::new`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use trous_wavelet::{Image, TransformConfig, WaveletFilter, decompose, reconstruct};
//!
//! let img = Image::new(data)?;
//! let config = TransformConfig::new().with_wavelet(WaveletFilter::Db2);
//! let pyramid = decompose(&img, &config)?;
//! let back = reconstruct(&pyramid, None)?;
//! ```

mod bank;
mod config;
mod engine;
mod error;
mod filter;
mod frequency;
mod image;
mod pyramid;
mod spatial;
mod spectral;

use ndarray::Array2;
use tracing::info;

pub use bank::{CapacityExceeded, FilterBank, LevelFilters, TapRole, Taps};
pub use config::TransformConfig;
pub use engine::{Decomposer, DetailBands, Engine, synthesize};
pub use error::WaveletError;
pub use filter::{FilterPair, WaveletFilter};
pub use image::Image;
pub use pyramid::{Band, DecompositionLevel, Diagnostic, PyramidTransform};
pub use spectral::Fft2;

/// Decomposes `image` into an undecimated pyramid.
///
/// Requesting more levels than the image supports is not an error: the
/// count is capped and a [`Diagnostic::LevelsCapped`] is recorded.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`WaveletError::InvalidConfig`] | `config.validate()` fails |
#[tracing::instrument(
    skip_all,
    fields(rows = image.shape().0, cols = image.shape().1, wavelet = config.wavelet().name())
)]
pub fn decompose(
    image: &Image,
    config: &TransformConfig,
) -> Result<PyramidTransform, WaveletError> {
    config.validate()?;
    let pyramid = Decomposer::new(image, config).finish();
    info!(
        levels = pyramid.n_levels(),
        diagnostics = pyramid.diagnostics().len(),
        "decomposition complete"
    );
    Ok(pyramid)
}

/// Inverse transform down to `level` (default 0, the source resolution).
///
/// Diagnostics raised by the inverse are logged; use
/// [`PyramidTransform::reconstruct_with_diagnostics`] to receive them.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`WaveletError::ReconstructionLevel`] | `level` exceeds the pyramid depth |
pub fn reconstruct(
    pyramid: &PyramidTransform,
    level: Option<usize>,
) -> Result<Array2<f64>, WaveletError> {
    pyramid.reconstruct(level)
}

/// Inverse transform down to `config.reconstruction_level()`.
///
/// # Errors
///
/// Same as [`reconstruct`].
pub fn reconstruct_to_configured(
    pyramid: &PyramidTransform,
    config: &TransformConfig,
) -> Result<Array2<f64>, WaveletError> {
    pyramid.reconstruct(Some(config.reconstruction_level()))
}
