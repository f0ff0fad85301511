use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::TransformArgs;

/// Top-level trous configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TrousConfig {
    /// Transform settings.
    #[serde(default)]
    pub transform: TransformToml,

    /// Denoising settings.
    #[serde(default)]
    pub denoise: DenoiseToml,
}

impl TrousConfig {
    /// Reads `path`, or returns the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse config: {}", path.display()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformToml {
    #[serde(default = "default_wavelet")]
    pub wavelet: String,
    /// Explicit filter taps; take precedence over `wavelet`.
    #[serde(default)]
    pub custom_filter: Option<CustomFilterToml>,
    #[serde(default)]
    pub levels: Option<usize>,
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default)]
    pub reconstruction_level: usize,
}

impl Default for TransformToml {
    fn default() -> Self {
        Self {
            wavelet: default_wavelet(),
            custom_filter: None,
            levels: None,
            engine: default_engine(),
            reconstruction_level: 0,
        }
    }
}

impl TransformToml {
    /// CLI flags override file values.
    pub fn apply_overrides(&mut self, args: &TransformArgs) {
        if let Some(ref wavelet) = args.wavelet {
            self.wavelet = wavelet.clone();
            self.custom_filter = None;
        }
        if let Some(levels) = args.levels {
            self.levels = Some(levels);
        }
        if let Some(ref engine) = args.engine {
            self.engine = engine.clone();
        }
    }
}

fn default_wavelet() -> String {
    "haar".to_string()
}
fn default_engine() -> String {
    "spatial".to_string()
}

/// A perfect-reconstruction bank given tap by tap.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomFilterToml {
    pub dec_lo: Vec<f64>,
    pub dec_hi: Vec<f64>,
    pub rec_lo: Vec<f64>,
    pub rec_hi: Vec<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DenoiseToml {
    #[serde(default)]
    pub noise_variance: Option<f64>,
    #[serde(default)]
    pub threshold_cutoff: Option<usize>,
    #[serde(default)]
    pub poisson_gain: f64,
    #[serde(default)]
    pub identity_only: bool,
}
