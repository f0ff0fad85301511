//! Transform configuration.

use crate::engine::Engine;
use crate::error::WaveletError;
use crate::filter::FilterPair;

/// Configuration for [`decompose`](crate::decompose) and
/// [`reconstruct`](crate::reconstruct).
///
/// # Example
///
/// ```ignore
/// use trous_wavelet::{Engine, TransformConfig, WaveletFilter};
///
/// let config = TransformConfig::new()
///     .with_wavelet(WaveletFilter::Db2)
///     .with_levels(4)
///     .with_engine(Engine::Frequency);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformConfig {
    wavelet: FilterPair,
    levels: Option<usize>,
    reconstruction_level: usize,
    engine: Engine,
}

impl TransformConfig {
    /// Creates a configuration with defaults.
    ///
    /// Defaults: Haar wavelet, `levels = None` (as many as the image
    /// supports), `reconstruction_level = 0`, spatial engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wavelet: a [`WaveletFilter`](crate::WaveletFilter) preset or
    /// an explicit [`FilterPair`].
    pub fn with_wavelet(mut self, wavelet: impl Into<FilterPair>) -> Self {
        self.wavelet = wavelet.into();
        self
    }

    /// Requests a level count. Counts beyond what the image supports are
    /// capped at decomposition time.
    pub fn with_levels(mut self, levels: usize) -> Self {
        self.levels = Some(levels);
        self
    }

    /// Sets or clears the requested level count.
    pub fn with_levels_opt(mut self, levels: Option<usize>) -> Self {
        self.levels = levels;
        self
    }

    /// Sets the level [`reconstruct_to_configured`](crate::reconstruct_to_configured)
    /// stops at.
    pub fn with_reconstruction_level(mut self, level: usize) -> Self {
        self.reconstruction_level = level;
        self
    }

    /// Selects the convolution engine.
    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Returns the wavelet filter pair.
    pub fn wavelet(&self) -> &FilterPair {
        &self.wavelet
    }

    /// Returns the requested level count.
    pub fn levels(&self) -> Option<usize> {
        self.levels
    }

    /// Returns the reconstruction level.
    pub fn reconstruction_level(&self) -> usize {
        self.reconstruction_level
    }

    /// Returns the engine.
    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`WaveletError::InvalidConfig`] when `levels` is `Some(0)` or
    /// `reconstruction_level` exceeds an explicit `levels`.
    pub fn validate(&self) -> Result<(), WaveletError> {
        if self.levels == Some(0) {
            return Err(WaveletError::InvalidConfig("levels must be >= 1".to_string()));
        }
        if let Some(levels) = self.levels
            && self.reconstruction_level > levels
        {
            return Err(WaveletError::InvalidConfig(format!(
                "reconstruction_level {} exceeds levels {levels}",
                self.reconstruction_level
            )));
        }
        Ok(())
    }
}
